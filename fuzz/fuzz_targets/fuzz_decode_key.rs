//! Fuzz target for `decode_key` - storage key parsing.
//!
//! This fuzzer tests that:
//! 1. No input causes a panic
//! 2. Every accepted key re-encodes to a key that decodes to the same value
//! 3. Accepted keys never contain path separators or traversal sequences
//!
//! Run with: `cargo +nightly fuzz run fuzz_decode_key`

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tempdrop::store::{decode_key, encode_key};

/// Structured input that starts from a well-formed key and mutates it.
#[derive(Arbitrary, Debug)]
struct KeyInput {
    /// Raw bytes for the identifier
    id_bytes: [u8; 16],
    /// Expiry suffix
    expires_at: i64,
    /// Optional byte to overwrite
    patch: Option<(u8, u8)>,
    /// Trailing garbage
    suffix: String,
}

impl KeyInput {
    fn build(&self) -> String {
        let id = uuid::Builder::from_random_bytes(self.id_bytes)
            .with_version(uuid::Version::SortRand)
            .into_uuid();
        let mut key = encode_key(id, self.expires_at).into_bytes();
        if let Some((pos, byte)) = self.patch {
            let pos = usize::from(pos) % key.len();
            key[pos] = byte;
        }
        let mut key = String::from_utf8_lossy(&key).into_owned();
        key.push_str(&self.suffix);
        key
    }
}

fn check(input: &str) {
    if let Ok(key) = decode_key(input) {
        assert_eq!(decode_key(&key.to_string()), Ok(key), "accepted key must round-trip");
        assert!(!input.contains('/'));
        assert!(!input.contains('\\'));
        assert!(!input.contains(".."));
        assert!(!input.contains('\0'));
    }
}

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        check(s);
    }

    if let Ok(input) = arbitrary::Unstructured::new(data).arbitrary::<KeyInput>() {
        check(&input.build());
    }
});
