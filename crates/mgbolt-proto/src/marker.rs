//! Wire marker constants and struct signatures.
//!
//! The protocol is big-endian throughout; Rust's `to_be_bytes`/`from_be_bytes`
//! cover byte-swapping, so this module only holds the marker byte ranges and
//! struct signature bytes the codec switches on.

/// Smallest value representable by a single-byte tiny integer marker.
pub const TINY_INT_MIN: i64 = -16;

/// Largest value representable by a single-byte tiny integer marker.
pub const TINY_INT_MAX: i64 = 127;

/// Null marker.
pub const NULL: u8 = 0xC0;
/// Boolean false marker.
pub const FALSE: u8 = 0xC2;
/// Boolean true marker.
pub const TRUE: u8 = 0xC3;
/// Float64 marker, followed by a big-endian IEEE-754 double.
pub const FLOAT64: u8 = 0xC1;
/// Signed 8-bit integer marker.
pub const INT8: u8 = 0xC8;
/// Signed 16-bit integer marker.
pub const INT16: u8 = 0xC9;
/// Signed 32-bit integer marker.
pub const INT32: u8 = 0xCA;
/// Signed 64-bit integer marker.
pub const INT64: u8 = 0xCB;

/// Low bound of the tiny string marker range (size encoded in the low
/// nibble).
pub const TINY_STRING_LO: u8 = 0x80;
/// High bound of the tiny string marker range.
pub const TINY_STRING_HI: u8 = 0x8F;
/// 8-bit sized string marker.
pub const STRING_8: u8 = 0xD0;
/// 16-bit sized string marker.
pub const STRING_16: u8 = 0xD1;
/// 32-bit sized string marker.
pub const STRING_32: u8 = 0xD2;

/// Low bound of the tiny list marker range.
pub const TINY_LIST_LO: u8 = 0x90;
/// High bound of the tiny list marker range.
pub const TINY_LIST_HI: u8 = 0x9F;
/// 8-bit sized list marker.
pub const LIST_8: u8 = 0xD4;
/// 16-bit sized list marker.
pub const LIST_16: u8 = 0xD5;
/// 32-bit sized list marker.
pub const LIST_32: u8 = 0xD6;

/// Low bound of the tiny map marker range.
pub const TINY_MAP_LO: u8 = 0xA0;
/// High bound of the tiny map marker range.
pub const TINY_MAP_HI: u8 = 0xAF;
/// 8-bit sized map marker.
pub const MAP_8: u8 = 0xD8;
/// 16-bit sized map marker.
pub const MAP_16: u8 = 0xD9;
/// 32-bit sized map marker.
pub const MAP_32: u8 = 0xDA;

/// Low bound of the tiny struct marker range.
pub const TINY_STRUCT_LO: u8 = 0xB0;
/// High bound of the tiny struct marker range.
pub const TINY_STRUCT_HI: u8 = 0xBF;
/// 8-bit sized struct marker.
pub const STRUCT_8: u8 = 0xDC;
/// 16-bit sized struct marker.
pub const STRUCT_16: u8 = 0xDD;

/// Struct signature bytes identifying which protocol object a struct carries.
pub mod signature {
    /// Node: `(id, labels, properties)`.
    pub const NODE: u8 = 0x4E;
    /// Relationship: `(id, start, end, type, properties)`.
    pub const RELATIONSHIP: u8 = 0x52;
    /// `UnboundRelationship`: `(id, type, properties)`.
    pub const UNBOUND_RELATIONSHIP: u8 = 0x72;
    /// Path: `(nodes, relationships, sequence)`.
    pub const PATH: u8 = 0x50;
    /// Date: `(days,)`.
    pub const DATE: u8 = 0x44;
    /// Time: `(nanoseconds, tz_offset_seconds)`.
    pub const TIME: u8 = 0x54;
    /// `LocalTime`: `(nanoseconds,)`.
    pub const LOCAL_TIME: u8 = 0x74;
    /// `DateTime`: `(seconds, nanoseconds, tz_offset_minutes)`.
    pub const DATE_TIME: u8 = 0x46;
    /// `DateTimeZoneId`: `(seconds, nanoseconds, tz_id)`.
    pub const DATE_TIME_ZONE_ID: u8 = 0x66;
    /// `LocalDateTime`: `(seconds, nanoseconds)`.
    pub const LOCAL_DATE_TIME: u8 = 0x64;
    /// Duration: `(months, days, seconds, nanoseconds)`.
    pub const DURATION: u8 = 0x45;
    /// Point2D: `(srid, x, y)`.
    pub const POINT_2D: u8 = 0x58;
    /// Point3D: `(srid, x, y, z)`.
    pub const POINT_3D: u8 = 0x59;

    /// Message signature: INIT.
    pub const MSG_INIT: u8 = 0x01;
    /// Message signature: RUN.
    pub const MSG_RUN: u8 = 0x10;
    /// Message signature: `PULL_ALL` (protocol version 1).
    pub const MSG_PULL_ALL: u8 = 0x3F;
    /// Message signature: PULL (protocol version 4, `extra` map field).
    pub const MSG_PULL: u8 = 0x3F;
    /// Message signature: `ACK_FAILURE`.
    pub const MSG_ACK_FAILURE: u8 = 0x0E;
    /// Message signature: RESET.
    pub const MSG_RESET: u8 = 0x0F;
    /// Message signature: RECORD.
    pub const MSG_RECORD: u8 = 0x71;
    /// Message signature: SUCCESS.
    pub const MSG_SUCCESS: u8 = 0x70;
    /// Message signature: FAILURE.
    pub const MSG_FAILURE: u8 = 0x7F;
    /// Message signature: HELLO (protocol version 4).
    pub const MSG_HELLO: u8 = 0x01;
}

/// Handshake magic bytes sent as the first four bytes on the wire.
pub const HANDSHAKE_MAGIC: [u8; 4] = [0x60, 0x60, 0xB0, 0x17];

/// Maximum size of a single chunk's payload.
pub const MAX_CHUNK_SIZE: usize = 65_535;
