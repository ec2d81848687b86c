//! Event-driven message transports: stdio, WebSocket, and in-memory.

pub mod context;
pub mod error;
pub mod memory;
pub mod stdio;
pub mod traits;
pub mod websocket;

pub use context::MessageContext;
pub use error::TransportError;
pub use memory::InMemoryTransport;
pub use stdio::{StdioTransport, StdioTransportConfig};
pub use traits::{MessageHandler, Transport};
pub use websocket::WebSocketTransport;
