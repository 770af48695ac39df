//! Session-level errors.

use std::io;

use mgbolt_proto::ProtocolError;
use thiserror::Error;

/// Failure modes surfaced by [`crate::session::Session`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session attempted an operation not valid in its current state
    /// (e.g. `run` while a previous result is still streaming).
    #[error("invalid session state: {0}")]
    InvalidState(&'static str),

    /// The handshake did not select a protocol version this client
    /// implements.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The underlying transport returned an I/O error.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// The server responded with `FAILURE`.
    #[error("server reported failure: {classification:?} {code}: {message}")]
    ServerFailure {
        /// Coarse classification derived from the error code's first
        /// component.
        classification: FailureClassification,
        /// The dotted error code as reported by the server (e.g.
        /// `Memgraph.ClientError.MemgraphError.MemgraphError`).
        code: String,
        /// Human-readable error message.
        message: String,
    },

    /// The session entered `BAD` state after a transport or protocol error
    /// that no `RESET` can recover from; the session must be dropped and a
    /// new connection established.
    #[error("session is in an unrecoverable state")]
    Bad,
}

impl SessionError {
    /// Whether retrying the same operation against a fresh session is
    /// likely to succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SessionError::ServerFailure {
                classification: FailureClassification::Transient,
                ..
            }
        )
    }
}

/// Coarse classification of a `FAILURE` message's dotted error code,
/// derived from its second dotted component (e.g. `Memgraph.ClientError...`
/// classifies as [`FailureClassification::Client`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClassification {
    /// The client sent a malformed or invalid request; retrying identically
    /// will fail again.
    Client,
    /// A transient condition (e.g. serialization conflict, deadlock
    /// detection); retrying may succeed.
    Transient,
    /// An internal database error unrelated to the request's validity.
    Database,
    /// The code did not match any known classification.
    Unknown,
}

impl FailureClassification {
    /// Classifies a dotted error code by its second component.
    #[must_use]
    pub fn classify(code: &str) -> Self {
        match code.split('.').nth(1) {
            Some("ClientError") => FailureClassification::Client,
            Some("TransientError") => FailureClassification::Transient,
            Some("DatabaseError") => FailureClassification::Database,
            _ => FailureClassification::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FailureClassification;

    #[test]
    fn classifies_client_error_code() {
        assert_eq!(
            FailureClassification::classify("Memgraph.ClientError.MemgraphError.MemgraphError"),
            FailureClassification::Client
        );
    }

    #[test]
    fn classifies_transient_error_code() {
        assert_eq!(
            FailureClassification::classify("Memgraph.TransientError.MemgraphError.MemgraphError"),
            FailureClassification::Transient
        );
    }

    #[test]
    fn unrecognized_code_classifies_unknown() {
        assert_eq!(
            FailureClassification::classify("totally.unstructured"),
            FailureClassification::Unknown
        );
    }
}
