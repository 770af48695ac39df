//! Transport and public surface for a graph database Bolt-protocol client.
//!
//! [`Config`] describes how to reach a server; [`connect`] dials it and
//! authenticates, producing a [`Session`] ready to [`Session::run`]
//! statements and [`Session::pull`] their results.

pub mod config;
pub mod error;
pub mod session;
pub mod transport;

pub use config::{Config, ConfigBuilder, SslMode, TrustCallback, TrustContext};
pub use error::ClientError;
pub use session::{connect, QueryResult, Session};
