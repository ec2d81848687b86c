//! Line-delimited JSON-RPC over stdin/stdout.
//!
//! Each message is one line of JSON terminated by `\n`, the framing real
//! ACP agents and editors speak over a child process's standard streams.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::schema::Message;

use super::context::MessageContext;
use super::error::TransportError;
use super::traits::{MessageHandler, Transport};

/// Configuration for [`StdioTransport`].
#[derive(Debug, Clone)]
pub struct StdioTransportConfig {
    /// Capacity of the outbound write queue.
    pub outbound_capacity: usize,
}

impl Default for StdioTransportConfig {
    fn default() -> Self {
        Self {
            outbound_capacity: 256,
        }
    }
}

/// Transport that frames messages as newline-delimited JSON over the
/// process's stdin and stdout.
pub struct StdioTransport {
    config: StdioTransportConfig,
    handler: Option<Arc<dyn MessageHandler>>,
    outbound_tx: Option<mpsc::Sender<Message>>,
    reader_task: Option<JoinHandle<()>>,
    writer_task: Option<JoinHandle<()>>,
    connected: Arc<AtomicBool>,
    session_id: Mutex<Option<String>>,
}

impl StdioTransport {
    pub fn new() -> Self {
        Self::with_config(StdioTransportConfig::default())
    }

    pub fn with_config(config: StdioTransportConfig) -> Self {
        Self {
            config,
            handler: None,
            outbound_tx: None,
            reader_task: None,
            writer_task: None,
            connected: Arc::new(AtomicBool::new(false)),
            session_id: Mutex::new(None),
        }
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn start(&mut self) -> Result<(), TransportError> {
        let handler = self
            .handler
            .clone()
            .ok_or_else(|| TransportError::transport("no message handler registered"))?;

        let (tx, mut rx) = mpsc::channel::<Message>(self.config.outbound_capacity);
        self.outbound_tx = Some(tx);

        let connected = self.connected.clone();
        connected.store(true, Ordering::SeqCst);

        let reader_handler = handler.clone();
        let reader_connected = connected.clone();
        self.reader_task = Some(tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let mut lines = BufReader::new(stdin).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match Message::from_json(&line) {
                            Ok(message) => {
                                debug!(target: "acp_core::transport::stdio", "decoded inbound message");
                                reader_handler
                                    .handle_message(message, MessageContext::new().with_remote_addr("stdio"))
                                    .await;
                            }
                            Err(err) => {
                                warn!(target: "acp_core::transport::stdio", %err, "malformed line");
                                reader_handler
                                    .handle_error(TransportError::transport(err.to_string()))
                                    .await;
                            }
                        }
                    }
                    Ok(None) => {
                        debug!(target: "acp_core::transport::stdio", "stdin closed");
                        break;
                    }
                    Err(err) => {
                        error!(target: "acp_core::transport::stdio", %err, "stdin read error");
                        reader_handler.handle_error(TransportError::Io { source: err }).await;
                        break;
                    }
                }
            }
            reader_connected.store(false, Ordering::SeqCst);
            reader_handler.handle_close().await;
        }));

        self.writer_task = Some(tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(message) = rx.recv().await {
                let bytes = match message.to_bytes() {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        error!(target: "acp_core::transport::stdio", %err, "failed to serialize outbound message");
                        continue;
                    }
                };
                if stdout.write_all(&bytes).await.is_err() {
                    break;
                }
                if stdout.write_all(b"\n").await.is_err() {
                    break;
                }
                if stdout.flush().await.is_err() {
                    break;
                }
            }
        }));

        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.connected.store(false, Ordering::SeqCst);
        self.outbound_tx = None;
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
        if let Some(task) = self.writer_task.take() {
            let _ = tokio::time::timeout(std::time::Duration::from_secs(2), task).await;
        }
        Ok(())
    }

    async fn send(&self, message: Message) -> Result<(), TransportError> {
        let tx = self
            .outbound_tx
            .as_ref()
            .ok_or(TransportError::Closed)?;
        tx.send(message)
            .await
            .map_err(|_| TransportError::Closed)
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
        "stdio"
    }
}
