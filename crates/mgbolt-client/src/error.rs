//! Client-facing errors: configuration validation, transport setup, and
//! everything [`mgbolt_core::SessionError`] can already raise.

use std::io;

use mgbolt_core::SessionError;
use thiserror::Error;

/// Failure modes surfaced by the public `mgbolt-client` surface.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A session-level error: handshake, query lifecycle, or a server
    /// `FAILURE`. See [`SessionError`] for the specific cause.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Socket creation, connection, or option configuration failed before a
    /// session could be established.
    #[error("network failure: {0}")]
    NetworkFailure(#[from] io::Error),

    /// The TLS context, handshake, or a subsequent read/write failed.
    #[error("ssl error: {0}")]
    Ssl(String),

    /// The application-supplied trust callback rejected the peer's
    /// certificate.
    #[error("trust callback rejected the connection")]
    TrustCallbackRejected,

    /// [`crate::config::Config`] validation failed before any I/O was
    /// attempted.
    #[error("bad parameter: {0}")]
    BadParameter(String),
}

impl From<rustls::Error> for ClientError {
    fn from(err: rustls::Error) -> Self {
        if matches!(
            err,
            rustls::Error::InvalidCertificate(
                rustls::CertificateError::ApplicationVerificationFailure
            )
        ) {
            return ClientError::TrustCallbackRejected;
        }
        ClientError::Ssl(err.to_string())
    }
}
