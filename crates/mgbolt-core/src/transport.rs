//! The byte-stream seam a [`crate::session::Session`] drives.
//!
//! `mgbolt-core` knows nothing about sockets or TLS; it only needs something
//! that can send and receive bytes, block until the handshake completes, and
//! be shut down. Concrete transports (raw TCP, TLS) live in `mgbolt-client`
//! and implement this trait.

use std::io;

/// A blocking, ordered byte stream used by a session to reach the server.
///
/// The default `suspend_until_ready_to_read`/`suspend_until_ready_to_write`
/// hooks are no-ops appropriate for a thread that can simply block in the
/// OS. Hosts that cannot block a whole OS thread (a single-threaded runtime,
/// a WASM host cooperating with an event loop) override them to yield
/// control instead of calling into a syscall that would never return.
pub trait Transport {
    /// Writes all of `buf` to the transport, blocking until the whole
    /// buffer has been accepted or an error occurs.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error on write failure.
    fn send(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Reads until `buf` is completely filled, blocking as needed.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error on read failure, including an
    /// unexpected end of stream.
    fn recv_exact(&mut self, buf: &mut [u8]) -> io::Result<()>;

    /// Reads whatever is immediately available into `buf`, returning the
    /// number of bytes read (zero at end of stream).
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error on read failure.
    fn recv_some(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Shuts the transport down, signaling to the peer that no more data
    /// will be sent.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error on shutdown failure.
    fn shutdown(&mut self) -> io::Result<()>;

    /// Called before a blocking read on hosts that cannot block an OS
    /// thread. The default no-op is correct for ordinary blocking sockets.
    fn suspend_until_ready_to_read(&mut self) {}

    /// Called before a blocking write on hosts that cannot block an OS
    /// thread. The default no-op is correct for ordinary blocking sockets.
    fn suspend_until_ready_to_write(&mut self) {}
}

impl Transport for Box<dyn Transport> {
    fn send(&mut self, buf: &[u8]) -> io::Result<()> {
        (**self).send(buf)
    }

    fn recv_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        (**self).recv_exact(buf)
    }

    fn recv_some(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).recv_some(buf)
    }

    fn shutdown(&mut self) -> io::Result<()> {
        (**self).shutdown()
    }

    fn suspend_until_ready_to_read(&mut self) {
        (**self).suspend_until_ready_to_read();
    }

    fn suspend_until_ready_to_write(&mut self) {
        (**self).suspend_until_ready_to_write();
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::VecDeque;
    use std::io;

    use super::Transport;

    /// An in-memory transport over two byte queues, used by session tests
    /// to script server responses without a real socket.
    #[derive(Debug, Default)]
    pub struct LoopbackTransport {
        pub inbound: VecDeque<u8>,
        pub outbound: Vec<u8>,
    }

    impl LoopbackTransport {
        pub fn with_inbound(bytes: &[u8]) -> Self {
            Self {
                inbound: bytes.iter().copied().collect(),
                outbound: Vec::new(),
            }
        }

        pub fn queue_inbound(&mut self, bytes: &[u8]) {
            self.inbound.extend(bytes.iter().copied());
        }
    }

    impl Transport for LoopbackTransport {
        fn send(&mut self, buf: &[u8]) -> io::Result<()> {
            self.outbound.extend_from_slice(buf);
            Ok(())
        }

        fn recv_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
            if self.inbound.len() < buf.len() {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "loopback transport exhausted",
                ));
            }
            for slot in buf.iter_mut() {
                *slot = self.inbound.pop_front().expect("checked length above");
            }
            Ok(())
        }

        fn recv_some(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(self.inbound.len());
            for slot in buf.iter_mut().take(n) {
                *slot = self.inbound.pop_front().expect("checked length above");
            }
            Ok(n)
        }

        fn shutdown(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
