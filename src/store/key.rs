//! Storage key codec.
//!
//! Every stored file is named by its storage key, which packs the object's
//! identifier and its absolute expiration into one filename:
//!
//! ```text
//! 0190b6c4-5e2a-7c3d-9f41-2b8e6a1d0c57-1735689600
//! \___________ UUIDv7 identifier ____/ \_expires_at (unix seconds)
//! ```
//!
//! The grammar is strict. Anything that is not exactly a hyphenated
//! version 7 UUID, one `-`, and one or more ASCII digits is rejected with a
//! [`KeyFormatError`]; callers treat that as "not one of ours".

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Length of a hyphenated UUID (`8-4-4-4-12`).
const UUID_LEN: usize = 36;

/// Byte offsets of the hyphens inside a hyphenated UUID.
const UUID_HYPHENS: [usize; 4] = [8, 13, 18, 23];

/// Byte offset of the version nibble inside a hyphenated UUID.
const UUID_VERSION_POS: usize = 14;

/// Why a string is not a storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum KeyFormatError {
    #[error("storage key is empty")]
    Empty,

    #[error("storage key is too short")]
    TooShort,

    #[error("identifier is not a hyphenated UUID")]
    MalformedIdentifier,

    #[error("identifier is not a version 7 UUID")]
    WrongVersion,

    #[error("expected '-' between identifier and expiration")]
    MissingSeparator,

    #[error("expiration is not a decimal number")]
    InvalidExpiry,

    #[error("expiration does not fit in a 64-bit timestamp")]
    ExpiryOverflow,
}

/// Generates a fresh time-ordered identifier.
///
/// Identifiers produced by the same process sort in creation order, both as
/// UUIDs and as their hyphenated string rendering.
#[must_use]
pub fn generate_id() -> Uuid {
    Uuid::now_v7()
}

/// Decoded form of a storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageKey {
    id: Uuid,
    expires_at: i64,
}

impl StorageKey {
    /// Builds a key from an identifier and a non-negative unix timestamp.
    #[must_use]
    pub const fn new(id: Uuid, expires_at: i64) -> Self {
        Self { id, expires_at }
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Absolute expiration as unix seconds.
    #[must_use]
    pub const fn expires_at(&self) -> i64 {
        self.expires_at
    }

    /// Expiration as a UTC instant, `None` if outside chrono's range.
    #[must_use]
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }

    /// Returns true once `now` is strictly past the expiration.
    ///
    /// A timestamp chrono cannot represent lies too far in the future to
    /// have passed.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at_utc().is_some_and(|expires| expires < now)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.id.hyphenated(), self.expires_at)
    }
}

impl FromStr for StorageKey {
    type Err = KeyFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_key(s)
    }
}

impl Serialize for StorageKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StorageKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        decode_key(&raw).map_err(serde::de::Error::custom)
    }
}

/// Renders `<id>-<expires_at>`.
#[must_use]
pub fn encode_key(id: Uuid, expires_at: i64) -> String {
    StorageKey::new(id, expires_at).to_string()
}

/// Parses a storage key, accepting nothing but the exact grammar.
///
/// Hex digits in the identifier may be upper or lower case. The expiration
/// must be plain ASCII digits: no sign, no whitespace, no trailing text.
///
/// # Errors
///
/// Returns a [`KeyFormatError`] describing the first deviation found.
pub fn decode_key(s: &str) -> Result<StorageKey, KeyFormatError> {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return Err(KeyFormatError::Empty);
    }
    if bytes.len() < UUID_LEN + 2 {
        return Err(KeyFormatError::TooShort);
    }

    let (uuid_bytes, rest) = bytes.split_at(UUID_LEN);
    for (pos, &b) in uuid_bytes.iter().enumerate() {
        let ok = if UUID_HYPHENS.contains(&pos) {
            b == b'-'
        } else {
            b.is_ascii_hexdigit()
        };
        if !ok {
            return Err(KeyFormatError::MalformedIdentifier);
        }
    }
    if uuid_bytes[UUID_VERSION_POS] != b'7' {
        return Err(KeyFormatError::WrongVersion);
    }

    if rest[0] != b'-' {
        return Err(KeyFormatError::MissingSeparator);
    }
    let digits = &rest[1..];
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(KeyFormatError::InvalidExpiry);
    }

    // Both halves are pure ASCII at this point, so slicing on these offsets
    // cannot split a character.
    let id = Uuid::try_parse(&s[..UUID_LEN]).map_err(|_| KeyFormatError::MalformedIdentifier)?;
    let expires_at = s[UUID_LEN + 1..]
        .parse::<i64>()
        .map_err(|_| KeyFormatError::ExpiryOverflow)?;

    Ok(StorageKey { id, expires_at })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    const SAMPLE: &str = "0190b6c4-5e2a-7c3d-9f41-2b8e6a1d0c57-1735689600";

    #[test]
    fn test_decode_valid_key() {
        let key = decode_key(SAMPLE).unwrap();
        assert_eq!(
            key.id(),
            Uuid::parse_str("0190b6c4-5e2a-7c3d-9f41-2b8e6a1d0c57").unwrap()
        );
        assert_eq!(key.expires_at(), 1_735_689_600);
        assert_eq!(key.to_string(), SAMPLE);
    }

    #[test]
    fn test_decode_accepts_uppercase_hex() {
        let key = decode_key("0190B6C4-5E2A-7C3D-9F41-2B8E6A1D0C57-42").unwrap();
        assert_eq!(key.expires_at(), 42);
    }

    #[test]
    fn test_decode_rejects_malformed_keys() {
        let cases = [
            ("", KeyFormatError::Empty),
            ("0190b6c4-5e2a-7c3d", KeyFormatError::TooShort),
            (
                "0190b6c4-5e2a-7c3d-9f41-2b8e6a1d0c57",
                KeyFormatError::TooShort,
            ),
            (
                "0190b6c4-5e2a-7c3d-9f41-2b8e6a1d0c57-",
                KeyFormatError::TooShort,
            ),
            (
                "0190b6c4-5e2a-4c3d-9f41-2b8e6a1d0c57-1735689600",
                KeyFormatError::WrongVersion,
            ),
            (
                "0190b6c45e2a7c3d9f412b8e6a1d0c57-1735689600abcd",
                KeyFormatError::MalformedIdentifier,
            ),
            (
                "0190b6c4-5e2a-7c3d-9f41-2b8e6a1d0cz7-1735689600",
                KeyFormatError::MalformedIdentifier,
            ),
            (
                "0190b6c4-5e2a-7c3d-9f41-2b8e6a1d0c57_1735689600",
                KeyFormatError::MissingSeparator,
            ),
            (
                "0190b6c4-5e2a-7c3d-9f41-2b8e6a1d0c57-17356x9600",
                KeyFormatError::InvalidExpiry,
            ),
            (
                "0190b6c4-5e2a-7c3d-9f41-2b8e6a1d0c57--1735689600",
                KeyFormatError::InvalidExpiry,
            ),
            (
                "0190b6c4-5e2a-7c3d-9f41-2b8e6a1d0c57-1735689600-5",
                KeyFormatError::InvalidExpiry,
            ),
            (
                "0190b6c4-5e2a-7c3d-9f41-2b8e6a1d0c57-1735689600.bak",
                KeyFormatError::InvalidExpiry,
            ),
            (
                "0190b6c4-5e2a-7c3d-9f41-2b8e6a1d0c57-99999999999999999999",
                KeyFormatError::ExpiryOverflow,
            ),
        ];

        for (input, expected) in cases {
            assert_eq!(decode_key(input), Err(expected), "input: {input:?}");
        }
    }

    #[test]
    fn test_decode_rejects_path_like_input() {
        for input in [
            "../../etc/passwd",
            "../0190b6c4-5e2a-7c3d-9f41-2b8e6a1d0c57-1",
            "0190b6c4-5e2a-7c3d-9f41-2b8e6a1d0c57-1/../../x",
            "0190b6c4-5e2a-7c3d-9f41-2b8e6a1d0c57-1\\x",
        ] {
            assert!(decode_key(input).is_err(), "accepted {input:?}");
        }
    }

    #[test]
    fn test_decode_non_ascii_does_not_panic() {
        assert!(decode_key("é190b6c4-5e2a-7c3d-9f41-2b8e6a1d0c57-1735689600").is_err());
        assert!(decode_key("0190b6c4-5e2a-7c3d-9f41-2b8e6a1d0c57é1735689600").is_err());
        assert!(decode_key("0190b6c4-5e2a-7c3d-9f41-2b8e6a1d0c57-١٢٣").is_err());
    }

    #[test]
    fn test_generated_ids_are_version_7() {
        let id = generate_id();
        assert_eq!(id.get_version_num(), 7);
        assert!(decode_key(&encode_key(id, 0)).is_ok());
    }

    #[test]
    fn test_generated_ids_are_unique_and_ordered() {
        let ids: Vec<String> = (0..10_000)
            .map(|_| generate_id().hyphenated().to_string())
            .collect();

        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());

        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_expiry_comparison() {
        let key = StorageKey::new(generate_id(), 1_000);
        let at = |secs| DateTime::from_timestamp(secs, 0).unwrap();

        assert!(!key.is_expired_at(at(999)));
        assert!(!key.is_expired_at(at(1_000)));
        assert!(key.is_expired_at(at(1_001)));
    }

    #[test]
    fn test_unrepresentable_expiry_never_expires() {
        let key = StorageKey::new(generate_id(), i64::MAX);
        assert!(key.expires_at_utc().is_none());
        assert!(!key.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_serde_as_string() {
        let key = decode_key(SAMPLE).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{SAMPLE}\""));

        let back: StorageKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);

        assert!(serde_json::from_str::<StorageKey>("\"not-a-key\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_encode_decode_round_trip(
            bytes in any::<[u8; 16]>(),
            expires_at in 0i64..=i64::MAX,
        ) {
            let id = uuid::Builder::from_random_bytes(bytes)
                .with_version(uuid::Version::SortRand)
                .into_uuid();
            let key = decode_key(&encode_key(id, expires_at)).unwrap();
            prop_assert_eq!(key.id(), id);
            prop_assert_eq!(key.expires_at(), expires_at);
        }

        #[test]
        fn prop_decode_never_panics(input in ".*") {
            let _ = decode_key(&input);
        }

        #[test]
        fn prop_decode_rejects_suffixed_keys(suffix in "[^0-9]+") {
            let input = format!("{SAMPLE}{suffix}");
            prop_assert!(decode_key(&input).is_err());
        }
    }
}
