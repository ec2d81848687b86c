//! In-process transport backed by paired channels.
//!
//! Used to join a client-side and agent-side [`crate::session::Session`]
//! within a single process, for tests and for embedding an agent directly
//! in an editor's process without going over a real pipe.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::schema::Message;

use super::context::MessageContext;
use super::error::TransportError;
use super::traits::{MessageHandler, Transport};

/// One end of an in-memory transport pair.
pub struct InMemoryTransport {
    outbound_tx: mpsc::Sender<Message>,
    inbound_rx: Option<mpsc::Receiver<Message>>,
    handler: Option<Arc<dyn MessageHandler>>,
    dispatch_task: Option<JoinHandle<()>>,
    connected: Arc<AtomicBool>,
}

impl InMemoryTransport {
    /// Build a connected pair: messages sent on one side arrive on the other.
    pub fn pair(capacity: usize) -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::channel(capacity);
        let (b_tx, a_rx) = mpsc::channel(capacity);

        let a = Self {
            outbound_tx: a_tx,
            inbound_rx: Some(a_rx),
            handler: None,
            dispatch_task: None,
            connected: Arc::new(AtomicBool::new(false)),
        };
        let b = Self {
            outbound_tx: b_tx,
            inbound_rx: Some(b_rx),
            handler: None,
            dispatch_task: None,
            connected: Arc::new(AtomicBool::new(false)),
        };
        (a, b)
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn start(&mut self) -> Result<(), TransportError> {
        let handler = self
            .handler
            .clone()
            .ok_or_else(|| TransportError::transport("no message handler registered"))?;
        let mut rx = self
            .inbound_rx
            .take()
            .ok_or_else(|| TransportError::transport("transport already started"))?;

        self.connected.store(true, Ordering::SeqCst);
        let connected = self.connected.clone();
        self.dispatch_task = Some(tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                handler
                    .handle_message(message, MessageContext::new().with_remote_addr("memory"))
                    .await;
            }
            connected.store(false, Ordering::SeqCst);
            handler.handle_close().await;
        }));
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.connected.store(false, Ordering::SeqCst);
        if let Some(task) = self.dispatch_task.take() {
            task.abort();
        }
        Ok(())
    }

    async fn send(&self, message: Message) -> Result<(), TransportError> {
        self.outbound_tx
            .send(message)
            .await
            .map_err(|_| TransportError::Closed)
    }

    fn set_message_handler(&mut self, handler: Arc<dyn MessageHandler>) {
        self.handler = Some(handler);
    }

    fn session_id(&self) -> Option<String> {
        None
    }

    fn set_session_context(&mut self, _session_id: Option<String>) {}

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn transport_type(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CollectingHandler {
        received: Arc<Mutex<Vec<Message>>>,
    }

    #[async_trait]
    impl MessageHandler for CollectingHandler {
        async fn handle_message(&self, message: Message, _context: MessageContext) {
            self.received.lock().unwrap().push(message);
        }
        async fn handle_error(&self, _error: TransportError) {}
        async fn handle_close(&self) {}
    }

    #[tokio::test]
    async fn messages_sent_on_one_side_arrive_on_the_other() {
        let (mut a, mut b) = InMemoryTransport::pair(8);
        let received = Arc::new(Mutex::new(Vec::new()));
        b.set_message_handler(Arc::new(CollectingHandler {
            received: received.clone(),
        }));
        b.start().await.unwrap();

        let notification = Message::Notification(crate::schema::JsonRpcNotification::new(
            "session/cancel",
            None,
        ));
        a.send(notification.clone()).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(received.lock().unwrap().len(), 1);
    }
}
