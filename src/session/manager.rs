//! The JSON-RPC engine that correlates outbound requests with their
//! responses and routes inbound requests/notifications to a [`Dispatcher`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{oneshot, Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, trace, warn};

use crate::dispatcher::Dispatcher;
use crate::schema::{
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, Message, RequestId,
};
use crate::transport::{MessageContext, MessageHandler, Transport, TransportError};
use crate::turn::SharedTurnController;

use super::config::SessionConfig;
use super::error::{CorrelationError, CorrelationResult};
use super::types::{PendingRequest, RequestIdGenerator};

/// One JSON-RPC connection to a peer: owns the transport carrying bytes,
/// the table of requests awaiting a response, and the dispatcher that
/// answers whatever the peer sends us.
pub struct Session {
    transport: RwLock<Box<dyn Transport>>,
    pending: DashMap<RequestId, PendingRequest>,
    id_generator: RequestIdGenerator,
    dispatcher: Arc<Dispatcher>,
    turn_controller: SharedTurnController,
    config: SessionConfig,
    cleanup_task: RwLock<Option<JoinHandle<()>>>,
    shutdown_signal: AtomicBool,
    is_terminated: AtomicBool,
    terminated: Notify,
}

/// Bridges a transport's [`MessageHandler`] callbacks to a [`Session`]
/// without the transport holding a strong reference back to it — the
/// transport lives inside the `Session` it calls back into, so a strong
/// `Arc<Session>` here would leak both forever.
struct SessionMessageHandler(Weak<Session>);

#[async_trait]
impl MessageHandler for SessionMessageHandler {
    async fn handle_message(&self, message: Message, context: MessageContext) {
        if let Some(session) = self.0.upgrade() {
            Session::on_message(session, message, context).await;
        }
    }

    async fn handle_error(&self, error: TransportError) {
        if let Some(session) = self.0.upgrade() {
            session.on_transport_error(error).await;
        }
    }

    async fn handle_close(&self) {
        if let Some(session) = self.0.upgrade() {
            session.on_transport_closed().await;
        }
    }
}

impl Session {
    /// Build a session over `transport`, start its background tasks, and
    /// return it ready to send and receive. The transport's message
    /// handler is wired up before `start` so no inbound message can arrive
    /// before the session is prepared to receive it.
    pub async fn new(
        mut transport: Box<dyn Transport>,
        dispatcher: Arc<Dispatcher>,
        turn_controller: SharedTurnController,
        config: SessionConfig,
    ) -> CorrelationResult<Arc<Self>> {
        let session = Arc::new_cyclic(|weak| {
            transport.set_message_handler(Arc::new(SessionMessageHandler(weak.clone())));
            Self {
                transport: RwLock::new(transport),
                pending: DashMap::new(),
                id_generator: RequestIdGenerator::new(),
                dispatcher,
                turn_controller,
                config,
                cleanup_task: RwLock::new(None),
                shutdown_signal: AtomicBool::new(false),
                is_terminated: AtomicBool::new(false),
                terminated: Notify::new(),
            }
        });

        session
            .transport
            .write()
            .await
            .start()
            .await
            .map_err(|err| CorrelationError::Internal {
                message: format!("failed to start transport: {err}"),
            })?;

        let cleanup_handle = session.clone().spawn_cleanup_task();
        *session.cleanup_task.write().await = Some(cleanup_handle);

        Ok(session)
    }

    /// Shared turn controller this session's dispatcher-registered handlers
    /// claim and release against.
    pub fn turn_controller(&self) -> &SharedTurnController {
        &self.turn_controller
    }

    /// Send `method` with `params` and await the peer's response, decoding
    /// its `result` into `Res`. A peer-returned error becomes
    /// [`CorrelationError::Remote`]; a `result` that doesn't decode into
    /// `Res` becomes [`CorrelationError::ResultDecode`].
    pub async fn send_request<Req, Res>(
        &self,
        method: &str,
        params: Req,
        timeout: Option<chrono::TimeDelta>,
    ) -> CorrelationResult<Res>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        if self.shutdown_signal.load(Ordering::SeqCst) {
            return Err(CorrelationError::SessionClosed);
        }

        if self.config.max_pending_requests > 0 && self.pending.len() >= self.config.max_pending_requests {
            return Err(CorrelationError::Internal {
                message: "maximum pending requests exceeded".to_string(),
            });
        }

        let params = serde_json::to_value(params).map_err(|err| CorrelationError::Internal {
            message: format!("failed to serialize params for '{method}': {err}"),
        })?;

        let id = self.id_generator.next_id();
        let timeout = timeout.unwrap_or(self.config.default_timeout);
        let (sender, receiver) = oneshot::channel();
        self.pending.insert(
            id.clone(),
            PendingRequest::new(sender, timeout, method.to_string()),
        );

        let request = JsonRpcRequest::new(method, Some(params), id.clone());
        if let Err(err) = self.transport.read().await.send(Message::Request(request)).await {
            self.pending.remove(&id);
            return Err(CorrelationError::ChannelClosed {
                id,
                details: err.to_string(),
            });
        }

        debug!(target: "acp_core::session", %method, %id, "request sent, awaiting response");

        let response = receiver.await.map_err(|_| CorrelationError::ChannelClosed {
            id: id.clone(),
            details: "response sender dropped".to_string(),
        })??;

        match (response.result, response.error) {
            (_, Some(error)) => Err(CorrelationError::Remote { id, error }),
            (Some(result), None) => serde_json::from_value(result).map_err(|err| {
                CorrelationError::ResultDecode {
                    id,
                    details: err.to_string(),
                }
            }),
            (None, None) => Err(CorrelationError::Internal {
                message: format!("response for '{method}' had neither result nor error"),
            }),
        }
    }

    /// Send a fire-and-forget notification. There is no response to await
    /// and therefore nothing to correlate.
    pub async fn send_notification<Params>(&self, method: &str, params: Option<Params>) -> CorrelationResult<()>
    where
        Params: Serialize,
    {
        let params = params
            .map(|p| serde_json::to_value(p))
            .transpose()
            .map_err(|err| CorrelationError::Internal {
                message: format!("failed to serialize params for '{method}': {err}"),
            })?;
        let notification = JsonRpcNotification::new(method, params);
        self.transport
            .read()
            .await
            .send(Message::Notification(notification))
            .await
            .map_err(|err| CorrelationError::Internal {
                message: err.to_string(),
            })
    }

    /// Close the transport gracefully: wait up to
    /// `config.shutdown_drain_timeout` for in-flight requests to drain on
    /// their own, then force-fail whatever remains.
    pub async fn close_gracefully(&self) -> CorrelationResult<()> {
        self.shutdown_signal.store(true, Ordering::SeqCst);

        let deadline = tokio::time::Instant::now() + self.config.shutdown_drain_timeout;
        while !self.pending.is_empty() && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(tokio::time::Duration::from_millis(25)).await;
        }

        self.fail_all_pending();
        self.stop_cleanup_task().await;

        self.transport
            .write()
            .await
            .close()
            .await
            .map_err(|err| CorrelationError::Internal {
                message: err.to_string(),
            })
    }

    /// Close the transport immediately, failing every in-flight request
    /// without waiting for a drain window.
    pub async fn close_abrupt(&self) -> CorrelationResult<()> {
        self.shutdown_signal.store(true, Ordering::SeqCst);
        self.fail_all_pending();
        self.stop_cleanup_task().await;

        self.transport
            .write()
            .await
            .close()
            .await
            .map_err(|err| CorrelationError::Internal {
                message: err.to_string(),
            })
    }

    /// Suspend until the underlying transport reports closure.
    pub async fn await_termination(&self) {
        if self.is_terminated.load(Ordering::SeqCst) {
            return;
        }
        let notified = self.terminated.notified();
        if self.is_terminated.load(Ordering::SeqCst) {
            return;
        }
        notified.await;
    }

    pub fn is_connected(&self) -> bool {
        !self.is_terminated.load(Ordering::SeqCst)
    }

    pub async fn pending_count(&self) -> usize {
        self.pending.len()
    }

    async fn on_message(self: Arc<Self>, message: Message, context: MessageContext) {
        match message {
            Message::Response(response) => self.correlate_response(response).await,
            Message::Request(request) => {
                // Dispatch runs on its own task, never inline on the
                // transport's I/O worker, so a slow handler can't stall
                // inbound delivery or block the next message from decoding.
                let session = self.clone();
                tokio::spawn(async move {
                    let response = session.dispatcher.dispatch_request(request).await;
                    if let Err(err) = session
                        .transport
                        .read()
                        .await
                        .send(Message::Response(response))
                        .await
                    {
                        warn!(target: "acp_core::session", %err, "failed to send response");
                    }
                });
            }
            Message::Notification(notification) => {
                let dispatcher = self.dispatcher.clone();
                tokio::spawn(async move {
                    dispatcher.dispatch_notification(notification).await;
                });
            }
        }
        let _ = context;
    }

    async fn correlate_response(&self, response: JsonRpcResponse) {
        let Some(id) = response.id.clone() else {
            warn!(target: "acp_core::session", "dropping response with no id");
            return;
        };
        let Some((_, pending)) = self.pending.remove(&id) else {
            warn!(target: "acp_core::session", %id, "dropping response for unknown or already-completed request");
            return;
        };
        trace!(target: "acp_core::session", %id, method = %pending.request_method, "correlating response");
        let _ = pending.sender.send(Ok(response));
    }

    async fn on_transport_error(&self, error: TransportError) {
        warn!(target: "acp_core::session", %error, "transport error");
    }

    async fn on_transport_closed(&self) {
        debug!(target: "acp_core::session", "transport closed");
        self.is_terminated.store(true, Ordering::SeqCst);
        self.terminated.notify_waiters();
        self.fail_all_pending();
    }

    fn fail_all_pending(&self) {
        let ids: Vec<RequestId> = self.pending.iter().map(|entry| entry.key().clone()).collect();
        for id in ids {
            if let Some((_, pending)) = self.pending.remove(&id) {
                let _ = pending.sender.send(Err(CorrelationError::Cancelled { id }));
            }
        }
    }

    fn spawn_cleanup_task(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.config.cleanup_interval);
            while !self.shutdown_signal.load(Ordering::SeqCst) {
                ticker.tick().await;
                let now = chrono::Utc::now();
                let expired: Vec<RequestId> = self
                    .pending
                    .iter()
                    .filter_map(|entry| entry.value().is_expired_at(&now).then(|| entry.key().clone()))
                    .collect();
                for id in expired {
                    if let Some((_, pending)) = self.pending.remove(&id) {
                        let _ = pending.sender.send(Err(CorrelationError::Timeout {
                            id: id.clone(),
                            duration: pending.timeout,
                        }));
                        trace!(target: "acp_core::session", %id, "request timed out");
                    }
                }
            }
        })
    }

    async fn stop_cleanup_task(&self) {
        self.shutdown_signal.store(true, Ordering::SeqCst);
        if let Some(handle) = self.cleanup_task.write().await.take() {
            let _ = handle.await;
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("pending", &self.pending.len())
            .field("terminated", &self.is_terminated.load(Ordering::SeqCst))
            .finish()
    }
}
