//! Errors produced while framing, encoding, or decoding wire data.

use thiserror::Error;

/// Failure modes for the marker/value codec and the chunked framing layer.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The buffer ended before a complete value or frame could be read.
    #[error("unexpected end of input while decoding {context}")]
    UnexpectedEof {
        /// What the decoder was in the middle of reading.
        context: &'static str,
    },

    /// A marker byte did not match any known encoding.
    #[error("unrecognized marker byte {marker:#04x}")]
    UnknownMarker {
        /// The offending byte.
        marker: u8,
    },

    /// A struct signature byte did not match any known protocol object.
    #[error("unrecognized struct signature {signature:#04x}")]
    UnknownSignature {
        /// The offending byte.
        signature: u8,
    },

    /// A struct carried a field count that does not match its signature.
    #[error("struct {signature:#04x} expected {expected} fields, got {actual}")]
    FieldCountMismatch {
        /// The struct's signature byte.
        signature: u8,
        /// Field count the signature requires.
        expected: usize,
        /// Field count actually present on the wire.
        actual: usize,
    },

    /// A decoded string was not valid UTF-8.
    #[error("invalid utf-8 in decoded string")]
    InvalidUtf8(#[from] core::str::Utf8Error),

    /// A size-prefixed container or string declared a size too large to be
    /// represented in the target platform's `usize`, or larger than the
    /// protocol permits.
    #[error("size {size} out of range for {context}")]
    SizeOutOfRange {
        /// The declared size.
        size: u64,
        /// What was being sized (a string, list, map, or struct).
        context: &'static str,
    },

    /// A chunk declared a payload length of zero outside of the
    /// message-terminator position, or exceeded the maximum chunk size.
    #[error("invalid chunk length {length}")]
    InvalidChunkLength {
        /// The offending length.
        length: usize,
    },

    /// The handshake response did not select one of the versions offered.
    #[error("server selected unsupported protocol version {version}")]
    UnsupportedVersion {
        /// The version the server echoed back.
        version: u32,
    },

    /// The four-byte handshake magic was missing or incorrect.
    #[error("invalid handshake magic")]
    InvalidHandshakeMagic,

    /// Attempted to insert a key that already exists into a `ValueMap`.
    #[error("duplicate key in map")]
    DuplicateKey,

    /// Attempted to encode a value kind the server only ever sends, never
    /// accepts as a query parameter (graph entities, `Time`, `DateTime`,
    /// `DateTimeZoneId`, and the spatial points).
    #[error("{kind} cannot be encoded as a query parameter")]
    InvalidValueKind {
        /// Name of the rejected value kind.
        kind: &'static str,
    },
}

/// Convenience alias for results produced by this crate.
pub type Result<T> = core::result::Result<T, ProtocolError>;
