//! WebSocket transport, text frames carrying one JSON-RPC message each.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, warn};

use crate::schema::Message;

use super::context::MessageContext;
use super::error::TransportError;
use super::traits::{MessageHandler, Transport};

/// Transport over an already-established WebSocket connection, generic over
/// any duplex byte stream `tokio-tungstenite` can wrap (a TCP stream, a TLS
/// stream, or an in-memory duplex used in tests).
pub struct WebSocketTransport<S> {
    stream: Option<WebSocketStream<S>>,
    handler: Option<Arc<dyn MessageHandler>>,
    outbound_tx: Option<mpsc::Sender<Message>>,
    io_task: Option<JoinHandle<()>>,
    connected: Arc<AtomicBool>,
    session_id: Mutex<Option<String>>,
}

impl<S> WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(stream: WebSocketStream<S>) -> Self {
        Self {
            stream: Some(stream),
            handler: None,
            outbound_tx: None,
            io_task: None,
            connected: Arc::new(AtomicBool::new(false)),
            session_id: Mutex::new(None),
        }
    }
}

#[async_trait]
impl<S> Transport for WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn start(&mut self) -> Result<(), TransportError> {
        let handler = self
            .handler
            .clone()
            .ok_or_else(|| TransportError::transport("no message handler registered"))?;
        let stream = self
            .stream
            .take()
            .ok_or_else(|| TransportError::transport("transport already started"))?;

        let (mut sink, mut stream) = stream.split();
        let (tx, mut rx) = mpsc::channel::<Message>(256);
        self.outbound_tx = Some(tx);

        let connected = self.connected.clone();
        connected.store(true, Ordering::SeqCst);

        self.io_task = Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    outbound = rx.recv() => {
                        match outbound {
                            Some(message) => {
                                let bytes = match message.to_bytes() {
                                    Ok(bytes) => bytes,
                                    Err(err) => {
                                        warn!(target: "acp_core::transport::websocket", %err, "serialize failed");
                                        continue;
                                    }
                                };
                                let text = String::from_utf8_lossy(&bytes).into_owned();
                                if sink.send(WsMessage::Text(text)).await.is_err() {
                                    break;
                                }
                            }
                            None => break,
                        }
                    }
                    inbound = stream.next() => {
                        match inbound {
                            Some(Ok(WsMessage::Text(text))) => {
                                match Message::from_json(&text) {
                                    Ok(message) => {
                                        debug!(target: "acp_core::transport::websocket", "decoded inbound message");
                                        handler
                                            .handle_message(message, MessageContext::new().with_remote_addr("websocket"))
                                            .await;
                                    }
                                    Err(err) => {
                                        handler
                                            .handle_error(TransportError::transport(err.to_string()))
                                            .await;
                                    }
                                }
                            }
                            Some(Ok(WsMessage::Binary(bytes))) => {
                                match Message::from_bytes(&bytes) {
                                    Ok(message) => {
                                        handler
                                            .handle_message(message, MessageContext::new().with_remote_addr("websocket"))
                                            .await;
                                    }
                                    Err(err) => {
                                        handler
                                            .handle_error(TransportError::transport(err.to_string()))
                                            .await;
                                    }
                                }
                            }
                            Some(Ok(WsMessage::Close(_))) | None => break,
                            Some(Ok(_)) => continue,
                            Some(Err(err)) => {
                                handler
                                    .handle_error(TransportError::transport(err.to_string()))
                                    .await;
                                break;
                            }
                        }
                    }
                }
            }
            connected.store(false, Ordering::SeqCst);
            handler.handle_close().await;
        }));

        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.connected.store(false, Ordering::SeqCst);
        self.outbound_tx = None;
        if let Some(task) = self.io_task.take() {
            task.abort();
        }
        Ok(())
    }

    async fn send(&self, message: Message) -> Result<(), TransportError> {
        let tx = self.outbound_tx.as_ref().ok_or(TransportError::Closed)?;
        tx.send(message).await.map_err(|_| TransportError::Closed)
    }

    fn set_message_handler(&mut self, handler: Arc<dyn MessageHandler>) {
        self.handler = Some(handler);
    }

    fn session_id(&self) -> Option<String> {
        self.session_id.try_lock().ok().and_then(|guard| guard.clone())
    }

    fn set_session_context(&mut self, session_id: Option<String>) {
        if let Ok(mut guard) = self.session_id.try_lock() {
            *guard = session_id;
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn transport_type(&self) -> &'static str {
        "websocket"
    }
}
