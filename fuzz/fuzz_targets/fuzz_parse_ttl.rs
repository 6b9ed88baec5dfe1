//! Fuzz target for `parse_ttl` - client supplied TTL expressions.
//!
//! This fuzzer tests that:
//! 1. No input causes a panic, including overflowing numbers
//! 2. Any accepted duration fits in an `i64` of nanoseconds
//!
//! Run with: `cargo +nightly fuzz run fuzz_parse_ttl`

#![no_main]

use libfuzzer_sys::fuzz_target;
use tempdrop::store::parse_ttl;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(ttl) = parse_ttl(input) {
        assert!(ttl.as_nanos() <= i64::MAX as u128);
    }
});
