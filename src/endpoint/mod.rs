//! The two connection facades built on [`crate::session::Session`]: one
//! per side of an ACP connection.

pub mod agent;
pub mod client;
pub mod traits;
pub mod update_sender;

pub use agent::AgentSideConnection;
pub use client::ClientSideConnection;
pub use traits::{Agent, Client};
pub use update_sender::SessionUpdateSender;
