//! Fuzz target for codec::decode_value
//!
//! Exercises the typed-value decoder with arbitrary byte sequences to find:
//! - Panics on truncated or malformed markers and struct signatures
//! - Integer overflows in size-prefixed string/list/map/struct lengths
//! - Over-reads past the end of the input buffer
//!
//! The fuzzer should NEVER panic. All invalid input should return an error.

#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use mgbolt_proto::codec::decode_value;
use mgbolt_proto::Arena;

fuzz_target!(|data: &[u8]| {
    let arena = Arena::new();
    let mut src = Bytes::copy_from_slice(data);
    let _ = decode_value(&mut src, &arena);
});
