//! Protocol messages exchanged after the handshake.
//!
//! Each message is a single struct on the wire (tiny-struct marker, field
//! count, signature byte) whose fields are encoded with [`crate::codec`].
//! Client-to-server messages implement [`ClientMessage::encode`]; the two
//! server-to-client messages the session loop must distinguish by signature
//! up front ([`ServerMessage`]) are decoded via [`ServerMessage::decode`].

use bytes::{Buf, BufMut};

use crate::arena::Arena;
use crate::codec::{decode_value, encode_value};
use crate::errors::{ProtocolError, Result};
use crate::marker::{self, signature};
use crate::value::{DecodedValue, Value, ValueMap};

/// A message sent from client to server.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// `HELLO` / `INIT`: negotiates the session and authenticates.
    ///
    /// Protocol versions 1-3 use the `INIT` signature with a bare
    /// `(user_agent, auth_token)` pair; version 4 and later use `HELLO` with
    /// a single extra map carrying `user_agent` plus auth fields. Both are
    /// retained behind [`HelloDialect`] even though only one dialect is
    /// exercised against a given server in a single connection.
    Hello {
        /// Client identification string.
        user_agent: String,
        /// Authentication fields (`scheme`, `principal`, `credentials`, ...).
        auth: ValueMap,
        /// Which wire dialect to encode with.
        dialect: HelloDialect,
    },
    /// `RUN`: submits a query for execution.
    ///
    /// Protocol versions 1-3 encode a 2-field struct
    /// `RUN(statement, parameters)`; version 4 and later add a third `extra`
    /// metadata field. Both are retained behind [`RunDialect`], mirroring
    /// [`HelloDialect`], even though only one dialect is exercised against a
    /// given server in a single connection.
    Run {
        /// Cypher query text.
        statement: String,
        /// Query parameters.
        parameters: ValueMap,
        /// Per-query metadata, encoded only in [`RunDialect::RunV4`].
        extra: ValueMap,
        /// Which wire dialect to encode with.
        dialect: RunDialect,
    },
    /// `PULL_ALL` (protocol version 1-3): streams every remaining result
    /// row.
    PullAll,
    /// `PULL` (protocol version 4+): streams up to `n` rows, or every
    /// remaining row when `n` is absent.
    Pull {
        /// Row limit, or `None` for unlimited.
        n: Option<i64>,
    },
    /// `ACK_FAILURE`: acknowledges a `FAILURE` response so the session can
    /// return to `READY`.
    AckFailure,
    /// `RESET`: forces the session back to `READY`, discarding any
    /// in-flight result.
    Reset,
}

/// Selects which `HELLO`/`INIT` wire encoding to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelloDialect {
    /// Protocol versions 1-3: `INIT(user_agent, auth_token)`.
    InitV1,
    /// Protocol version 4 and later: `HELLO(extra)` with `user_agent`
    /// folded into the extra map.
    HelloV4,
}

/// Selects which `RUN` wire encoding to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunDialect {
    /// Protocol versions 1-3: `RUN(statement, parameters)`, a 2-field
    /// struct with no `extra` metadata field.
    RunV1,
    /// Protocol version 4 and later: `RUN(statement, parameters, extra)`,
    /// a 3-field struct.
    RunV4,
}

impl ClientMessage {
    /// Encodes this message's struct representation onto `dst`.
    ///
    /// # Errors
    ///
    /// Propagates [`ProtocolError::SizeOutOfRange`] from the value codec if
    /// a field is too large to size-prefix.
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        match self {
            ClientMessage::Hello {
                user_agent,
                auth,
                dialect: HelloDialect::InitV1,
            } => {
                write_struct_header(2, signature::MSG_INIT, dst)?;
                encode_value(&Value::String(user_agent.clone()), dst)?;
                encode_value(&Value::Map(auth.clone()), dst)?;
            }
            ClientMessage::Hello {
                user_agent,
                auth,
                dialect: HelloDialect::HelloV4,
            } => {
                let mut extra = auth.clone();
                // `insert` fails only on a duplicate key; `user_agent` is
                // never present in caller-supplied auth fields by
                // construction, so this cannot fail in practice. Any
                // failure here indicates a caller bug, not a protocol
                // condition, so it is folded into the encode error path.
                extra
                    .insert("user_agent".to_owned(), Value::String(user_agent.clone()))
                    .map_err(|_| ProtocolError::DuplicateKey)?;
                write_struct_header(1, signature::MSG_HELLO, dst)?;
                encode_value(&Value::Map(extra), dst)?;
            }
            ClientMessage::Run {
                statement,
                parameters,
                extra: _,
                dialect: RunDialect::RunV1,
            } => {
                write_struct_header(2, signature::MSG_RUN, dst)?;
                encode_value(&Value::String(statement.clone()), dst)?;
                encode_value(&Value::Map(parameters.clone()), dst)?;
            }
            ClientMessage::Run {
                statement,
                parameters,
                extra,
                dialect: RunDialect::RunV4,
            } => {
                write_struct_header(3, signature::MSG_RUN, dst)?;
                encode_value(&Value::String(statement.clone()), dst)?;
                encode_value(&Value::Map(parameters.clone()), dst)?;
                encode_value(&Value::Map(extra.clone()), dst)?;
            }
            ClientMessage::PullAll => {
                write_struct_header(0, signature::MSG_PULL_ALL, dst)?;
            }
            ClientMessage::Pull { n } => {
                let mut extra = ValueMap::new();
                if let Some(n) = n {
                    extra
                        .insert("n".to_owned(), Value::Integer(*n))
                        .map_err(|_| ProtocolError::DuplicateKey)?;
                }
                write_struct_header(1, signature::MSG_PULL, dst)?;
                encode_value(&Value::Map(extra), dst)?;
            }
            ClientMessage::AckFailure => {
                write_struct_header(0, signature::MSG_ACK_FAILURE, dst)?;
            }
            ClientMessage::Reset => {
                write_struct_header(0, signature::MSG_RESET, dst)?;
            }
        }
        Ok(())
    }
}

fn write_struct_header(field_count: usize, sig: u8, dst: &mut impl BufMut) -> Result<()> {
    if field_count <= usize::from(marker::TINY_STRUCT_HI - marker::TINY_STRUCT_LO) {
        dst.put_u8(marker::TINY_STRUCT_LO + field_count as u8);
        dst.put_u8(sig);
        Ok(())
    } else {
        Err(ProtocolError::SizeOutOfRange {
            size: field_count as u64,
            context: "struct",
        })
    }
}

/// A message received from the server.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ServerMessage<'a> {
    /// `RECORD`: one result row.
    Record {
        /// The row's field values, in query column order.
        fields: &'a [DecodedValue<'a>],
    },
    /// `SUCCESS`: the prior request completed; carries summary metadata.
    Success {
        /// Summary metadata (for `RUN`: `fields`; for `PULL`/`PULL_ALL`:
        /// counters and timing).
        metadata: &'a [(&'a str, DecodedValue<'a>)],
    },
    /// `FAILURE`: the prior request failed; carries an error code and
    /// message.
    Failure {
        /// Structured failure metadata, containing at least `code` and
        /// `message` string entries.
        metadata: &'a [(&'a str, DecodedValue<'a>)],
    },
}

impl<'a> ServerMessage<'a> {
    /// Decodes one server message struct from `src`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownSignature`] if the struct signature
    /// is not `RECORD`, `SUCCESS`, or `FAILURE`, and propagates any codec
    /// error encountered while decoding the struct's fields.
    pub fn decode(src: &mut impl Buf, arena: &'a Arena) -> Result<Self> {
        let value = decode_value(src, arena)?;
        match value {
            DecodedValue::Unknown { signature, fields } if signature == signature::MSG_RECORD => {
                if fields.len() != 1 {
                    return Err(ProtocolError::FieldCountMismatch {
                        signature,
                        expected: 1,
                        actual: fields.len(),
                    });
                }
                let DecodedValue::List(row) = fields[0] else {
                    return Err(ProtocolError::UnknownSignature { signature });
                };
                Ok(ServerMessage::Record { fields: row })
            }
            DecodedValue::Unknown { signature, fields } if signature == signature::MSG_SUCCESS => {
                let metadata = single_map_field(signature, fields)?;
                Ok(ServerMessage::Success { metadata })
            }
            DecodedValue::Unknown { signature, fields } if signature == signature::MSG_FAILURE => {
                let metadata = single_map_field(signature, fields)?;
                Ok(ServerMessage::Failure { metadata })
            }
            DecodedValue::Unknown { signature, .. } => {
                Err(ProtocolError::UnknownSignature { signature })
            }
            _ => Err(ProtocolError::UnknownSignature { signature: 0 }),
        }
    }
}

fn single_map_field<'a>(
    signature: u8,
    fields: &'a [DecodedValue<'a>],
) -> Result<&'a [(&'a str, DecodedValue<'a>)]> {
    if fields.len() != 1 {
        return Err(ProtocolError::FieldCountMismatch {
            signature,
            expected: 1,
            actual: fields.len(),
        });
    }
    match fields[0] {
        DecodedValue::Map(entries) => Ok(entries),
        _ => Err(ProtocolError::UnknownSignature { signature }),
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::{ClientMessage, HelloDialect, RunDialect, ServerMessage};
    use crate::arena::Arena;
    use crate::value::{Value, ValueMap};

    #[test]
    fn encodes_pull_all_as_zero_field_struct() {
        let mut buf = BytesMut::new();
        ClientMessage::PullAll.encode(&mut buf).unwrap();
        assert_eq!(buf.as_ref(), &[0xB0, 0x3F]);
    }

    #[test]
    fn encodes_reset() {
        let mut buf = BytesMut::new();
        ClientMessage::Reset.encode(&mut buf).unwrap();
        assert_eq!(buf.as_ref(), &[0xB0, 0x0F]);
    }

    #[test]
    fn encodes_run_v1_as_two_field_struct() {
        let mut buf = BytesMut::new();
        ClientMessage::Run {
            statement: "RETURN 1".to_owned(),
            parameters: ValueMap::new(),
            extra: ValueMap::new(),
            dialect: RunDialect::RunV1,
        }
        .encode(&mut buf)
        .unwrap();
        assert_eq!(buf[0], 0xB2);
        assert_eq!(buf[1], crate::marker::signature::MSG_RUN);
    }

    #[test]
    fn encodes_run_v4_as_three_field_struct() {
        let mut buf = BytesMut::new();
        ClientMessage::Run {
            statement: "RETURN 1".to_owned(),
            parameters: ValueMap::new(),
            extra: ValueMap::new(),
            dialect: RunDialect::RunV4,
        }
        .encode(&mut buf)
        .unwrap();
        assert_eq!(buf[0], 0xB3);
        assert_eq!(buf[1], crate::marker::signature::MSG_RUN);
    }

    #[test]
    fn decodes_success_metadata() {
        let mut meta = ValueMap::new();
        meta.insert(
            "fields".to_owned(),
            Value::List(vec![Value::String("n".to_owned())]),
        )
        .unwrap();

        let mut buf = BytesMut::new();
        ClientMessage::Run {
            statement: String::new(),
            parameters: ValueMap::new(),
            extra: ValueMap::new(),
            dialect: RunDialect::RunV1,
        }
        .encode(&mut buf)
        .unwrap();

        // Build a SUCCESS message by hand to exercise decode independent of
        // the client-side encoder.
        let mut success_buf = BytesMut::new();
        crate::codec::encode_value(&Value::Unknown {
            signature: crate::marker::signature::MSG_SUCCESS,
            fields: vec![Value::Map(meta)],
        }, &mut success_buf)
        .unwrap();

        let arena = Arena::new();
        let mut src = success_buf.freeze();
        let msg = ServerMessage::decode(&mut src, &arena).unwrap();
        match msg {
            ServerMessage::Success { metadata } => {
                assert_eq!(metadata.len(), 1);
                assert_eq!(metadata[0].0, "fields");
            }
            other => panic!("expected Success, got {other:?}"),
        }
    }

    #[test]
    fn hello_v4_folds_user_agent_into_extra() {
        let mut buf = BytesMut::new();
        ClientMessage::Hello {
            user_agent: "mgbolt/0.1".to_owned(),
            auth: ValueMap::new(),
            dialect: HelloDialect::HelloV4,
        }
        .encode(&mut buf)
        .unwrap();
        assert_eq!(buf[0], 0xB1);
        assert_eq!(buf[1], crate::marker::signature::MSG_HELLO);
    }
}
