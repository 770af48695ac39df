//! Wire format for the mgbolt graph database protocol.
//!
//! This crate owns everything below the session state machine: marker byte
//! constants, the bump-allocated decoder arena, the dynamically-typed value
//! algebra and its codec, chunked message framing, and the message layer
//! built on top of them. It has no notion of sockets, TLS, or session
//! state — see `mgbolt-core` for that.

pub mod arena;
pub mod codec;
pub mod errors;
pub mod frame;
pub mod marker;
pub mod message;
pub mod value;

pub use arena::Arena;
pub use errors::{ProtocolError, Result};
pub use frame::ChunkReader;
pub use message::{ClientMessage, HelloDialect, RunDialect, ServerMessage};
pub use value::{
    DecodedNode, DecodedPath, DecodedRelationship, DecodedUnboundRelationship, DecodedValue,
    Node, Path, Relationship, UnboundRelationship, Value, ValueMap,
};
