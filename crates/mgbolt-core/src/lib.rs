//! Session state machine for the mgbolt graph database protocol.
//!
//! This crate drives the connection lifecycle on top of `mgbolt-proto`'s
//! wire format: handshake, authentication, query submission, record
//! streaming, and failure recovery. It knows nothing about sockets or TLS —
//! it is generic over anything implementing [`transport::Transport`]; the
//! concrete raw-TCP and TLS transports live in `mgbolt-client`.

pub mod error;
pub mod session;
pub mod transport;

pub use error::{FailureClassification, SessionError};
pub use session::{PullOutcome, RunOutcome, Session, SessionState};
pub use transport::Transport;
