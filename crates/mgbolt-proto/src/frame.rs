//! Chunked framing: splitting an encoded message into length-prefixed
//! chunks and reassembling chunks back into a message.
//!
//! Wire layout for one message:
//!
//! ```text
//! [u16 chunk_len][chunk_len bytes] ... [u16 chunk_len][chunk_len bytes] [0x00 0x00]
//! ```
//!
//! A message may be split across any number of non-empty chunks; the
//! zero-length chunk terminates the message rather than carrying data.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::errors::{ProtocolError, Result};
use crate::marker::MAX_CHUNK_SIZE;

/// Writes one message as a sequence of chunks terminated by a zero-length
/// marker chunk.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidChunkLength`] if `message` cannot be
/// chunked (this cannot currently happen since chunk count is unbounded;
/// reserved for future size caps).
pub fn write_message(message: &[u8], dst: &mut impl BufMut) -> Result<()> {
    if message.is_empty() {
        dst.put_u16(0);
        return Ok(());
    }
    for chunk in message.chunks(MAX_CHUNK_SIZE) {
        dst.put_u16(chunk.len() as u16);
        dst.put_slice(chunk);
    }
    dst.put_u16(0);
    Ok(())
}

/// Incrementally reassembles chunks read off a transport into complete
/// messages.
///
/// Feed raw bytes as they arrive via [`ChunkReader::feed`], then drain
/// complete messages via [`ChunkReader::next_message`]. A reader holds at
/// most one partially-received message at a time.
#[derive(Debug, Default)]
pub struct ChunkReader {
    buf: BytesMut,
    message: BytesMut,
    complete: std::collections::VecDeque<Bytes>,
}

impl ChunkReader {
    /// Creates an empty reader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends freshly-read bytes from the transport and parses as many
    /// complete chunks as are available.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidChunkLength`] if a non-terminator
    /// chunk declares a length of zero bytes in an invalid position (this
    /// cannot currently occur since zero always means terminator, but the
    /// check is kept for forward compatibility with future framing rules).
    pub fn feed(&mut self, bytes: &[u8]) -> Result<()> {
        self.buf.extend_from_slice(bytes);
        loop {
            if self.buf.len() < 2 {
                return Ok(());
            }
            let len = u16::from_be_bytes([self.buf[0], self.buf[1]]) as usize;
            if self.buf.len() < 2 + len {
                return Ok(());
            }
            self.buf.advance(2);
            if len == 0 {
                let finished = std::mem::take(&mut self.message);
                self.complete.push_back(finished.freeze());
                continue;
            }
            let chunk = self.buf.split_to(len);
            self.message.extend_from_slice(&chunk);
        }
    }

    /// Pops the next complete, reassembled message, if any.
    pub fn next_message(&mut self) -> Option<Bytes> {
        self.complete.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use proptest::prelude::*;

    use super::{ChunkReader, write_message};

    #[test]
    fn round_trips_single_chunk_message() {
        let msg = b"hello";
        let mut buf = BytesMut::new();
        write_message(msg, &mut buf).unwrap();

        let mut reader = ChunkReader::new();
        reader.feed(&buf).unwrap();
        assert_eq!(reader.next_message().as_deref(), Some(&msg[..]));
        assert!(reader.next_message().is_none());
    }

    #[test]
    fn reassembles_message_split_across_feeds() {
        let msg = b"reassembled across several transport reads";
        let mut buf = BytesMut::new();
        write_message(msg, &mut buf).unwrap();

        let mut reader = ChunkReader::new();
        for byte in &buf {
            reader.feed(&[*byte]).unwrap();
        }
        assert_eq!(reader.next_message().as_deref(), Some(&msg[..]));
    }

    #[test]
    fn large_message_splits_into_multiple_chunks() {
        let msg = vec![0xAB_u8; super::MAX_CHUNK_SIZE + 100];
        let mut buf = BytesMut::new();
        write_message(&msg, &mut buf).unwrap();

        // Two data chunks (65535 + 100 bytes) plus a terminator: at least
        // three u16 length prefixes appear before the payload is exhausted.
        let first_len = u16::from_be_bytes([buf[0], buf[1]]) as usize;
        assert_eq!(first_len, super::MAX_CHUNK_SIZE);

        let mut reader = ChunkReader::new();
        reader.feed(&buf).unwrap();
        assert_eq!(reader.next_message().as_deref(), Some(&msg[..]));
    }

    proptest! {
        #[test]
        fn round_trips_arbitrary_payload_fed_byte_by_byte(msg in proptest::collection::vec(any::<u8>(), 0..300)) {
            let mut buf = BytesMut::new();
            write_message(&msg, &mut buf).unwrap();

            let mut reader = ChunkReader::new();
            for byte in &buf {
                reader.feed(&[*byte]).unwrap();
            }
            prop_assert_eq!(reader.next_message().as_deref(), Some(msg.as_slice()));
        }
    }
}
