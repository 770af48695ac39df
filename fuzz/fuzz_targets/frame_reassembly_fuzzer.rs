//! Fuzz target for ChunkReader::feed
//!
//! Exercises chunk reassembly with arbitrary byte sequences to find:
//! - Panics on malformed or truncated chunk-length prefixes
//! - Infinite loops or unbounded allocation from a crafted length field
//! - Off-by-one errors around the zero-length message terminator
//!
//! The fuzzer should NEVER panic. All invalid input should return an error
//! or simply produce no complete message.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mgbolt_proto::ChunkReader;

fuzz_target!(|data: &[u8]| {
    let mut reader = ChunkReader::new();
    if reader.feed(data).is_err() {
        return;
    }
    while reader.next_message().is_some() {}
});
