//! Event-driven transport abstraction.
//!
//! Rather than a blocking `receive()` call, a transport is handed a
//! [`MessageHandler`] once and calls it back for every inbound message,
//! transport error, or closure. This keeps a [`crate::session::Session`]
//! decoupled from whichever concrete wire format carries its bytes.

use std::sync::Arc;

use async_trait::async_trait;

use crate::schema::Message;

use super::context::MessageContext;
use super::error::TransportError;

/// Callback interface invoked by a transport for every inbound event.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Called for every successfully decoded inbound message.
    async fn handle_message(&self, message: Message, context: MessageContext);

    /// Called when the transport hits an error that did not yield a
    /// decodable message (a malformed frame, a connection reset).
    async fn handle_error(&self, error: TransportError);

    /// Called once, when the transport shuts down.
    async fn handle_close(&self);
}

/// A bidirectional channel that moves [`Message`]s between this process and
/// a peer, decoupled from protocol semantics.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Start the transport's background I/O tasks. Must be called before
    /// `send` and before any messages will be delivered to the handler.
    async fn start(&mut self) -> Result<(), TransportError>;

    /// Close the transport and join its background tasks. Idempotent.
    async fn close(&mut self) -> Result<(), TransportError>;

    /// Send a message to the peer. Backpressures rather than drops when
    /// the outbound queue is full.
    async fn send(&self, message: Message) -> Result<(), TransportError>;

    /// Register the handler that receives inbound messages. Must be set
    /// before `start` for the handler to see the transport's first
    /// inbound messages.
    fn set_message_handler(&mut self, handler: Arc<dyn MessageHandler>);

    /// The transport's session identifier, if it has one (e.g. a
    /// WebSocket connection ID). Stdio transports have none.
    fn session_id(&self) -> Option<String>;

    /// Associate a session identifier with this transport.
    fn set_session_context(&mut self, session_id: Option<String>);

    /// Whether the transport's background tasks are still running.
    fn is_connected(&self) -> bool;

    /// Short identifier for logging and metrics (`"stdio"`, `"websocket"`, `"memory"`).
    fn transport_type(&self) -> &'static str;
}
