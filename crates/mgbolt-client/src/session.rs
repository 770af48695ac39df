//! The public, non-generic session handle and its query result view.
//!
//! `mgbolt_core::Session` is generic over [`mgbolt_core::Transport`] so it
//! can be driven by a loopback in tests; applications don't need that
//! flexibility, so this module erases it behind `Box<dyn Transport>` and
//! re-exposes the same operations under a concrete type.

use mgbolt_proto::value::{DecodedValue, ValueMap};

use crate::config::Config;
use crate::error::ClientError;
use crate::transport;

/// A single connection to a graph database server.
///
/// Thin wrapper around [`mgbolt_core::Session`] that fixes its transport to
/// `Box<dyn mgbolt_core::Transport>`, so the type is nameable without a
/// generic parameter.
pub struct Session {
    inner: mgbolt_core::Session<Box<dyn mgbolt_core::Transport>>,
}

/// Connects to the server named by `config`, performs the handshake and
/// authentication, and returns a `READY` session.
///
/// # Errors
///
/// Returns [`ClientError::NetworkFailure`] if the target cannot be
/// resolved or connected to, a TLS error if `config` requests
/// [`crate::config::SslMode::Require`] and the handshake fails, or
/// [`ClientError::Session`] if the protocol handshake or `INIT`
/// authentication is rejected.
pub fn connect(config: &Config) -> Result<Session, ClientError> {
    tracing::debug!(target = config.target(), port = config.port(), "connecting");
    let transport = transport::connect(config)?;
    let inner = mgbolt_core::Session::connect(transport, config.client_name(), config.credentials())?;
    Ok(Session { inner })
}

impl Session {
    /// Submits `statement` with `parameters` for execution.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Session`] if the session is not `READY` or a
    /// protocol/I/O failure occurs.
    pub fn run(
        &mut self,
        statement: &str,
        parameters: &ValueMap,
    ) -> Result<mgbolt_core::RunOutcome, ClientError> {
        self.inner.run(statement, parameters).map_err(ClientError::from)
    }

    /// Advances the result stream by one step and returns a view onto
    /// whatever became current.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Session`] if the session is not `EXECUTING`
    /// or a protocol/I/O failure occurs.
    pub fn pull(&mut self) -> Result<mgbolt_core::PullOutcome, ClientError> {
        self.inner.pull().map_err(ClientError::from)
    }

    /// A view onto the current result: the column names installed by the
    /// last successful `run`, together with a handle back to this session
    /// for reading the current row or summary.
    #[must_use]
    pub fn result(&self) -> QueryResult<'_> {
        QueryResult { session: &self.inner }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> mgbolt_core::SessionState {
        self.inner.state()
    }

    /// The human-readable message from the most recent server `FAILURE`.
    #[must_use]
    pub fn last_error(&self) -> &str {
        self.inner.last_error()
    }

    /// Shuts the transport down. The session must not be used afterward.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error on shutdown failure.
    pub fn destroy(self) -> Result<(), ClientError> {
        self.inner.destroy().map_err(ClientError::from)
    }
}

/// A tuple of the last successful `run`'s column names, the current inbound
/// message, and a pointer back to the owning session.
///
/// Columns survive until the next `run`; the message view is replaced on
/// every `pull` step, as in the session's own `row`/`summary` contract.
pub struct QueryResult<'a> {
    session: &'a mgbolt_core::Session<Box<dyn mgbolt_core::Transport>>,
}

impl QueryResult<'_> {
    /// Column names from the last successful `run`.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        self.session.columns()
    }

    /// The current row's field values, in column order.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Session`] unless the most recent `pull`
    /// returned a row.
    pub fn row(&self) -> Result<&[DecodedValue<'_>], ClientError> {
        self.session.row().map_err(ClientError::from)
    }

    /// The summary metadata from the `SUCCESS` that ended the last result
    /// stream.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Session`] unless the most recent call
    /// observed a `SUCCESS`.
    pub fn summary(&self) -> Result<&[(&str, DecodedValue<'_>)], ClientError> {
        self.session.summary().map_err(ClientError::from)
    }
}
