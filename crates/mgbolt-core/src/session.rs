//! Connection lifecycle, query lifecycle, and failure recovery.
//!
//! # State machine
//!
//! ```text
//! ┌───────┐   run() -> SUCCESS    ┌────────────┐
//! │ READY │ ─────────────────────>│ EXECUTING  │
//! └───────┘                       └────────────┘
//!      ^                                │
//!      │  pull() -> SUCCESS (done)      │ pull() -> RECORD
//!      └────────────────────────────────┘ (stays EXECUTING)
//!
//! Any I/O failure or protocol violation, from either state, moves to BAD.
//! BAD is terminal: every subsequent call fails without touching the wire.
//! A server FAILURE is not fatal — ACK_FAILURE/SUCCESS returns the session
//! to READY and the classified error is handed back to the caller.
//! ```
//!
//! Every inbound message is decoded from the session's [`Arena`], which is
//! reset at the start of each `read_next_message`. To avoid a
//! self-referential struct (the arena and its borrowed output living in the
//! same value), [`Session`] keeps only the most recent message's raw,
//! reassembled bytes (`last_message`) and re-decodes them on demand via
//! [`Session::decode_last`] — once internally to drive the state machine,
//! and again, lazily, whenever [`Session::row`] or [`Session::summary`] is
//! called. This is the "expose decoded values only within a callback that
//! holds the arena alive" option noted for the per-message arena design,
//! specialized to retained bytes instead of a caller-supplied closure.

use bytes::{Bytes, BytesMut};
use mgbolt_proto::frame::ChunkReader;
use mgbolt_proto::marker::HANDSHAKE_MAGIC;
use mgbolt_proto::value::{DecodedValue, ValueMap};
use mgbolt_proto::{ClientMessage, HelloDialect, ProtocolError, RunDialect, ServerMessage};

use crate::error::{FailureClassification, SessionError};
use crate::transport::Transport;

/// Protocol versions offered during the handshake, highest first. Only
/// version 1 is exercised by [`Session::connect`]; see the module docs on
/// [`ClientMessage::Hello`] for the latent version-4 dialect this client
/// also knows how to encode but never negotiates.
const OFFERED_VERSIONS: [u32; 4] = [1, 0, 0, 0];

/// Maximum length, in bytes, of the session's retained human-readable error
/// message.
const ERROR_BUFFER_CAP: usize = 1024;

/// Size of the scratch buffer used for each `recv_some` call while
/// reassembling an inbound message.
const RECV_SCRATCH_SIZE: usize = 8192;

/// A session's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No query in flight; `run` is valid.
    Ready,
    /// A query's result is streaming; `pull` is valid.
    Executing,
    /// Unrecoverable: every operation fails immediately without I/O.
    Bad,
}

/// Outcome of [`Session::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The server accepted the query; columns are available via
    /// [`Session::columns`] and the session is now `EXECUTING`.
    Ok,
    /// The server rejected the query; the session recovered to `READY`.
    Failure(FailureClassification),
}

/// Outcome of [`Session::pull`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// A row is available via [`Session::row`]; still `EXECUTING`.
    Row,
    /// The result stream is exhausted; the summary is available via
    /// [`Session::summary`] and the session is now `READY`.
    Done,
    /// The query failed mid-stream; the session recovered to `READY`.
    Failure(FailureClassification),
}

/// What the most recently reassembled inbound message turned out to be,
/// cached so [`Session::row`]/[`Session::summary`] can validate a call
/// without redundantly walking the whole message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastMessageKind {
    Record,
    Success,
    Failure,
}

/// A single, single-threaded connection to a graph database server.
///
/// Generic over [`Transport`] so the same state machine drives a raw TCP
/// socket, a TLS-wrapped socket, or (in tests) an in-memory loopback.
pub struct Session<T: Transport> {
    transport: T,
    reader: ChunkReader,
    recv_scratch: [u8; RECV_SCRATCH_SIZE],
    arena: mgbolt_proto::Arena,
    state: SessionState,
    columns: Vec<String>,
    last_message: Bytes,
    last_kind: Option<LastMessageKind>,
    last_error: String,
}

impl<T: Transport> Session<T> {
    /// Performs the magic/version handshake and `INIT` authentication over
    /// an already-open `transport`, returning a `READY` session.
    ///
    /// `credentials` is `(username, password)`; absent, the auth map sends
    /// `scheme = "none"`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the handshake magic is rejected, the
    /// server selects a version this client didn't offer, or `INIT` fails.
    /// No `Session` is returned on failure — there is nothing for the
    /// caller to hold in a `BAD` state, since the connection never reached
    /// `READY`.
    pub fn connect(
        mut transport: T,
        client_name: &str,
        credentials: Option<(&str, &str)>,
    ) -> Result<Self, SessionError> {
        Self::handshake(&mut transport)?;

        let mut session = Session {
            transport,
            reader: ChunkReader::new(),
            recv_scratch: [0; RECV_SCRATCH_SIZE],
            arena: mgbolt_proto::Arena::new(),
            state: SessionState::Ready,
            columns: Vec::new(),
            last_message: Bytes::new(),
            last_kind: None,
            last_error: String::new(),
        };

        session.init(client_name, credentials)?;
        Ok(session)
    }

    fn handshake(transport: &mut T) -> Result<(), SessionError> {
        tracing::debug!(offered = ?OFFERED_VERSIONS, "sending handshake magic and version list");
        let mut out = Vec::with_capacity(HANDSHAKE_MAGIC.len() + OFFERED_VERSIONS.len() * 4);
        out.extend_from_slice(&HANDSHAKE_MAGIC);
        for version in OFFERED_VERSIONS {
            out.extend_from_slice(&version.to_be_bytes());
        }
        transport.suspend_until_ready_to_write();
        transport.send(&out)?;

        let mut reply = [0u8; 4];
        transport.suspend_until_ready_to_read();
        transport.recv_exact(&mut reply)?;
        let version = u32::from_be_bytes(reply);
        if !OFFERED_VERSIONS.contains(&version) {
            tracing::warn!(version, "server selected a version we never offered");
            return Err(SessionError::Protocol(ProtocolError::UnsupportedVersion {
                version,
            }));
        }
        tracing::debug!(version, "handshake agreed");
        Ok(())
    }

    fn init(&mut self, client_name: &str, credentials: Option<(&str, &str)>) -> Result<(), SessionError> {
        let mut auth = ValueMap::new();
        match credentials {
            Some((username, password)) => {
                let _ = auth.insert("scheme".to_owned(), "basic".into());
                let _ = auth.insert("principal".to_owned(), username.into());
                let _ = auth.insert("credentials".to_owned(), password.into());
            }
            None => {
                let _ = auth.insert("scheme".to_owned(), "none".into());
            }
        }

        self.send(&ClientMessage::Hello {
            user_agent: client_name.to_owned(),
            auth,
            dialect: HelloDialect::InitV1,
        })?;

        if let Err(err) = self.read_next_message() {
            self.state = SessionState::Bad;
            return Err(err);
        }

        match self.decode_last()? {
            ServerMessage::Success { .. } => {
                self.last_kind = Some(LastMessageKind::Success);
                tracing::debug!("INIT accepted, session ready");
                Ok(())
            }
            ServerMessage::Failure { metadata } => {
                let (code, message) = extract_failure(metadata);
                tracing::warn!(%code, %message, "INIT rejected");
                self.state = SessionState::Bad;
                Err(SessionError::ServerFailure {
                    classification: FailureClassification::classify(&code),
                    code,
                    message,
                })
            }
            ServerMessage::Record { .. } => {
                self.state = SessionState::Bad;
                Err(SessionError::Protocol(ProtocolError::UnknownSignature {
                    signature: mgbolt_proto::marker::signature::MSG_RECORD,
                }))
            }
        }
    }

    /// Submits `statement` with `parameters` for execution.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] if not `READY`. Transitions
    /// to `BAD` on any I/O or protocol failure; a server-rejected query
    /// (`FAILURE`) is recoverable and returns `READY`.
    pub fn run(&mut self, statement: &str, parameters: &ValueMap) -> Result<RunOutcome, SessionError> {
        self.require_state(SessionState::Ready, "run")?;
        tracing::debug!(statement, "RUN");

        self.send(&ClientMessage::Run {
            statement: statement.to_owned(),
            parameters: parameters.clone(),
            extra: ValueMap::new(),
            dialect: RunDialect::RunV1,
        })?;

        if let Err(err) = self.read_next_message() {
            self.state = SessionState::Bad;
            return Err(err);
        }

        match self.decode_last()? {
            ServerMessage::Success { metadata } => {
                self.columns = extract_columns(metadata);
                self.last_kind = Some(LastMessageKind::Success);
                self.send(&ClientMessage::PullAll)?;
                self.state = SessionState::Executing;
                Ok(RunOutcome::Ok)
            }
            ServerMessage::Failure { metadata } => {
                let (code, message) = extract_failure(metadata);
                tracing::warn!(%code, %message, "RUN rejected");
                self.set_last_error(&message);
                let classification = FailureClassification::classify(&code);
                self.recover_from_failure()?;
                Ok(RunOutcome::Failure(classification))
            }
            ServerMessage::Record { .. } => {
                self.state = SessionState::Bad;
                Err(SessionError::Protocol(ProtocolError::UnknownSignature {
                    signature: mgbolt_proto::marker::signature::MSG_RECORD,
                }))
            }
        }
    }

    /// Advances the result stream by one step.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] if not `EXECUTING`.
    /// Transitions to `BAD` on any I/O or protocol failure.
    pub fn pull(&mut self) -> Result<PullOutcome, SessionError> {
        self.require_state(SessionState::Executing, "pull")?;

        if let Err(err) = self.read_next_message() {
            self.state = SessionState::Bad;
            return Err(err);
        }

        match self.decode_last()? {
            ServerMessage::Record { .. } => {
                self.last_kind = Some(LastMessageKind::Record);
                Ok(PullOutcome::Row)
            }
            ServerMessage::Success { .. } => {
                self.last_kind = Some(LastMessageKind::Success);
                self.state = SessionState::Ready;
                tracing::debug!("PULL exhausted, stream done");
                Ok(PullOutcome::Done)
            }
            ServerMessage::Failure { metadata } => {
                let (code, message) = extract_failure(metadata);
                tracing::warn!(%code, %message, "PULL failed mid-stream");
                self.set_last_error(&message);
                let classification = FailureClassification::classify(&code);
                self.recover_from_failure()?;
                Ok(PullOutcome::Failure(classification))
            }
        }
    }

    /// The column names from the most recent successful `run`.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The current result row's field values, in column order.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] unless the most recent
    /// [`Session::pull`] returned [`PullOutcome::Row`].
    pub fn row(&self) -> Result<&[DecodedValue<'_>], SessionError> {
        if self.last_kind != Some(LastMessageKind::Record) {
            return Err(SessionError::InvalidState("no current record row"));
        }
        match self.decode_last()? {
            ServerMessage::Record { fields } => Ok(fields),
            _ => unreachable!("last_kind guarantees the cached message is a Record"),
        }
    }

    /// The summary metadata from the `SUCCESS` that ended the last result
    /// stream (for `run`: the FAILURE/SUCCESS that answered it; for `pull`:
    /// counters and timing).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] unless the most recent call
    /// observed a `SUCCESS`.
    pub fn summary(&self) -> Result<&[(&str, DecodedValue<'_>)], SessionError> {
        if self.last_kind != Some(LastMessageKind::Success) {
            return Err(SessionError::InvalidState("no summary available"));
        }
        match self.decode_last()? {
            ServerMessage::Success { metadata } => Ok(metadata),
            _ => unreachable!("last_kind guarantees the cached message is a Success"),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The human-readable message from the most recent server `FAILURE`,
    /// overwritten on every new failure; empty if none has occurred.
    #[must_use]
    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    /// Shuts the transport down. The session must not be used afterward.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error on shutdown failure.
    pub fn destroy(mut self) -> Result<(), SessionError> {
        self.transport.shutdown().map_err(SessionError::from)
    }

    /// Sends `ACK_FAILURE` and awaits the acknowledging `SUCCESS`. Any
    /// deviation is a protocol violation and moves the session to `BAD`.
    fn recover_from_failure(&mut self) -> Result<(), SessionError> {
        tracing::debug!("sending ACK_FAILURE");
        let outcome = self.try_recover_from_failure();
        match outcome {
            Ok(()) => {
                self.state = SessionState::Ready;
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, "ACK_FAILURE recovery failed, session is BAD");
                self.state = SessionState::Bad;
                Err(err)
            }
        }
    }

    fn try_recover_from_failure(&mut self) -> Result<(), SessionError> {
        self.send(&ClientMessage::AckFailure)?;
        self.read_next_message()?;
        match self.decode_last()? {
            ServerMessage::Success { .. } => Ok(()),
            ServerMessage::Failure { .. } | ServerMessage::Record { .. } => {
                Err(SessionError::Protocol(ProtocolError::UnknownSignature {
                    signature: mgbolt_proto::marker::signature::MSG_ACK_FAILURE,
                }))
            }
        }
    }

    fn require_state(&self, expected: SessionState, operation: &'static str) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else if self.state == SessionState::Bad {
            Err(SessionError::Bad)
        } else {
            Err(SessionError::InvalidState(operation))
        }
    }

    fn send(&mut self, message: &ClientMessage) -> Result<(), SessionError> {
        let mut body = BytesMut::new();
        message.encode(&mut body)?;
        let mut framed = BytesMut::new();
        mgbolt_proto::frame::write_message(&body, &mut framed)?;
        self.transport.suspend_until_ready_to_write();
        self.transport.send(&framed)?;
        Ok(())
    }

    /// Resets the arena, reassembles the next inbound message from the
    /// transport, and stores its raw bytes for [`Session::decode_last`].
    fn read_next_message(&mut self) -> Result<(), SessionError> {
        self.arena.reset();
        self.last_kind = None;
        loop {
            if let Some(message) = self.reader.next_message() {
                self.last_message = message;
                return Ok(());
            }
            self.transport.suspend_until_ready_to_read();
            let n = self.transport.recv_some(&mut self.recv_scratch)?;
            if n == 0 {
                return Err(SessionError::Transport(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "peer closed the connection mid-message",
                )));
            }
            self.reader.feed(&self.recv_scratch[..n])?;
        }
    }

    /// Re-decodes `last_message` against `arena`. Never stored on `self` —
    /// the arena is reset on the next `read_next_message`, so a decoded
    /// value can only be allowed to outlive a single borrow of the session.
    fn decode_last(&self) -> Result<ServerMessage<'_>, SessionError> {
        let mut cursor = self.last_message.clone();
        Ok(ServerMessage::decode(&mut cursor, &self.arena)?)
    }

    fn set_last_error(&mut self, message: &str) {
        self.last_error = truncate_to_byte_cap(message, ERROR_BUFFER_CAP);
    }
}

fn truncate_to_byte_cap(s: &str, cap: usize) -> String {
    if s.len() <= cap {
        return s.to_owned();
    }
    let mut end = cap;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_owned()
}

fn extract_columns(metadata: &[(&str, DecodedValue<'_>)]) -> Vec<String> {
    for &(key, value) in metadata {
        if key == "fields" {
            if let DecodedValue::List(items) = value {
                return items
                    .iter()
                    .filter_map(|item| match item {
                        DecodedValue::String(s) => Some((*s).to_owned()),
                        _ => None,
                    })
                    .collect();
            }
        }
    }
    Vec::new()
}

fn extract_failure(metadata: &[(&str, DecodedValue<'_>)]) -> (String, String) {
    let mut code = String::new();
    let mut message = String::new();
    for &(key, value) in metadata {
        match (key, value) {
            ("code", DecodedValue::String(s)) => code = s.to_owned(),
            ("message", DecodedValue::String(s)) => message = s.to_owned(),
            _ => {}
        }
    }
    (code, message)
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use mgbolt_proto::frame::write_message;
    use mgbolt_proto::value::Value;
    use mgbolt_proto::{ClientMessage, marker};

    use super::*;
    use crate::transport::test_support::LoopbackTransport;

    fn handshake_reply() -> Vec<u8> {
        1u32.to_be_bytes().to_vec()
    }

    fn success_message(fields: &[(&str, Value)]) -> Vec<u8> {
        let mut map = ValueMap::new();
        for (k, v) in fields {
            map.insert((*k).to_owned(), v.clone()).unwrap();
        }
        let mut body = BytesMut::new();
        mgbolt_proto::codec::encode_value(
            &Value::Unknown {
                signature: marker::signature::MSG_SUCCESS,
                fields: vec![Value::Map(map)],
            },
            &mut body,
        )
        .unwrap();
        let mut framed = BytesMut::new();
        write_message(&body, &mut framed).unwrap();
        framed.to_vec()
    }

    fn failure_message(code: &str, message: &str) -> Vec<u8> {
        let mut map = ValueMap::new();
        map.insert("code".to_owned(), Value::String(code.to_owned())).unwrap();
        map.insert("message".to_owned(), Value::String(message.to_owned())).unwrap();
        let mut body = BytesMut::new();
        mgbolt_proto::codec::encode_value(
            &Value::Unknown {
                signature: marker::signature::MSG_FAILURE,
                fields: vec![Value::Map(map)],
            },
            &mut body,
        )
        .unwrap();
        let mut framed = BytesMut::new();
        write_message(&body, &mut framed).unwrap();
        framed.to_vec()
    }

    fn record_message(values: Vec<Value>) -> Vec<u8> {
        let mut body = BytesMut::new();
        mgbolt_proto::codec::encode_value(
            &Value::Unknown {
                signature: marker::signature::MSG_RECORD,
                fields: vec![Value::List(values)],
            },
            &mut body,
        )
        .unwrap();
        let mut framed = BytesMut::new();
        write_message(&body, &mut framed).unwrap();
        framed.to_vec()
    }

    fn connected_session() -> Session<LoopbackTransport> {
        let mut transport = LoopbackTransport::with_inbound(&handshake_reply());
        transport.queue_inbound(&success_message(&[]));
        Session::connect(transport, "mgbolt-test/0.1", None).unwrap()
    }

    #[test]
    fn connect_performs_handshake_and_init() {
        let session = connected_session();
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn connect_rejects_unoffered_version() {
        let transport = LoopbackTransport::with_inbound(&99u32.to_be_bytes());
        let err = Session::connect(transport, "mgbolt-test/0.1", None).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Protocol(ProtocolError::UnsupportedVersion { version: 99 })
        ));
    }

    #[test]
    fn run_success_transitions_to_executing_and_sends_pull_all() {
        let mut session = connected_session();
        session.transport.queue_inbound(&success_message(&[(
            "fields",
            Value::List(vec![Value::String("1".to_owned())]),
        )]));

        let outcome = session.run("RETURN 1", &ValueMap::new()).unwrap();
        assert_eq!(outcome, RunOutcome::Ok);
        assert_eq!(session.state(), SessionState::Executing);
        assert_eq!(session.columns(), &["1".to_owned()]);
    }

    #[test]
    fn run_failure_recovers_to_ready_without_going_bad() {
        let mut session = connected_session();
        session
            .transport
            .queue_inbound(&failure_message("Memgraph.ClientError.Syntax", "bad syntax"));
        session.transport.queue_inbound(&success_message(&[]));

        let outcome = session.run("INVALID SYNTAX", &ValueMap::new()).unwrap();
        assert_eq!(outcome, RunOutcome::Failure(FailureClassification::Client));
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.last_error(), "bad syntax");
    }

    #[test]
    fn pull_streams_n_records_then_done() {
        let mut session = connected_session();
        session.transport.queue_inbound(&success_message(&[(
            "fields",
            Value::List(vec![Value::String("n".to_owned())]),
        )]));
        session.run("MATCH (n) RETURN n", &ValueMap::new()).unwrap();

        for i in 0..3 {
            session
                .transport
                .queue_inbound(&record_message(vec![Value::Integer(i)]));
        }
        session.transport.queue_inbound(&success_message(&[]));

        for i in 0..3 {
            let outcome = session.pull().unwrap();
            assert_eq!(outcome, PullOutcome::Row);
            assert_eq!(session.row().unwrap(), &[DecodedValue::Integer(i)]);
        }
        let outcome = session.pull().unwrap();
        assert_eq!(outcome, PullOutcome::Done);
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn pull_from_ready_is_bad_call() {
        let mut session = connected_session();
        let err = session.pull().unwrap_err();
        assert!(matches!(err, SessionError::InvalidState("pull")));
    }

    #[test]
    fn run_from_executing_is_bad_call() {
        let mut session = connected_session();
        session.transport.queue_inbound(&success_message(&[]));
        session.run("RETURN 1", &ValueMap::new()).unwrap();

        let err = session.run("RETURN 2", &ValueMap::new()).unwrap_err();
        assert!(matches!(err, SessionError::InvalidState("run")));
    }

    #[test]
    fn transport_failure_mid_stream_moves_session_to_bad() {
        let mut session = connected_session();
        session.transport.queue_inbound(&success_message(&[]));
        session.run("RETURN 1", &ValueMap::new()).unwrap();

        // No further bytes queued: the next pull's recv_some starves, and the
        // loopback transport reports peer-closed (0 bytes read).
        let err = session.pull().unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));
        assert_eq!(session.state(), SessionState::Bad);

        let err = session.pull().unwrap_err();
        assert!(matches!(err, SessionError::Bad));
    }
}
