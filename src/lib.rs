//! Core runtime for the Agent Client Protocol: a JSON-RPC 2.0 session
//! engine, pluggable message transports, a method dispatcher, and a
//! turn controller enforcing one active `session/prompt` per session.
//!
//! [`schema`] defines the wire types and is free of any runtime
//! dependency; [`transport`] frames messages over stdio, WebSocket, or an
//! in-memory channel pair; [`session`] correlates outbound requests with
//! their responses and routes inbound ones to [`dispatcher`]; [`turn`]
//! enforces the single-active-prompt invariant and cooperative
//! cancellation; [`endpoint`] assembles all of the above into the two
//! connection facades applications actually construct,
//! [`endpoint::AgentSideConnection`] and [`endpoint::ClientSideConnection`].

pub mod dispatcher;
pub mod endpoint;
pub mod error;
pub mod schema;
pub mod session;
pub mod transport;
pub mod turn;

pub use endpoint::{Agent, AgentSideConnection, Client, ClientSideConnection, SessionUpdateSender};
pub use error::{Error, Result};
pub use session::{Session, SessionConfig};
