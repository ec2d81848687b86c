//! The agent-side facade: answers requests from a client, issues requests
//! to it.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dispatcher::{
    Dispatcher, DispatcherConfig, HandlerError, RequestHandler, TypedNotificationHandler,
    TypedRequestHandler,
};
use crate::schema::{
    CancelNotification, ClientCapabilities, CreateTerminalRequest, CreateTerminalResponse,
    JsonRpcError, KillTerminalRequest, KillTerminalResponse, PromptRequest, ReadTextFileRequest,
    ReadTextFileResponse, ReleaseTerminalRequest, ReleaseTerminalResponse, RequestId,
    TerminalOutputRequest, TerminalOutputResponse, WaitForTerminalExitRequest,
    WaitForTerminalExitResponse, WriteTextFileRequest, WriteTextFileResponse, AGENT_METHOD_NAMES,
    CLIENT_METHOD_NAMES,
};
use crate::session::{CorrelationError, CorrelationResult, Session, SessionConfig};
use crate::transport::Transport;
use crate::turn::{SharedTurnController, TurnController};

use super::traits::Agent;
use super::update_sender::SessionUpdateSender;

/// Cell holding a `Weak<Session>` that isn't populated until after the
/// `Session` owning this dispatcher exists — handlers registered before
/// that point read through it lazily rather than needing the `Session`
/// up front.
type SessionCell = Arc<RwLock<Weak<Session>>>;

/// Agent-side endpoint: the half of a connection that answers
/// `initialize`, `session/new`, `session/prompt`, etc., and calls back
/// into the client for `fs/*`, `terminal/*`, and `session/request_permission`.
pub struct AgentSideConnection {
    session: Arc<Session>,
    turn_controller: SharedTurnController,
    client_capabilities: Arc<RwLock<Option<ClientCapabilities>>>,
}

impl AgentSideConnection {
    pub async fn new(
        transport: Box<dyn Transport>,
        agent: Arc<dyn Agent>,
        config: SessionConfig,
    ) -> CorrelationResult<Arc<Self>> {
        let dispatcher = Arc::new(Dispatcher::new(DispatcherConfig::default()));
        let turn_controller: SharedTurnController = Arc::new(TurnController::new());
        let client_capabilities: Arc<RwLock<Option<ClientCapabilities>>> = Arc::new(RwLock::new(None));
        let session_cell: SessionCell = Arc::new(RwLock::new(Weak::new()));

        register_handlers(&dispatcher, agent, turn_controller.clone(), client_capabilities.clone(), session_cell.clone());

        let session = Session::new(transport, dispatcher, turn_controller.clone(), config).await?;
        *session_cell.write().await = Arc::downgrade(&session);

        Ok(Arc::new(Self {
            session,
            turn_controller,
            client_capabilities,
        }))
    }

    pub fn turn_controller(&self) -> &SharedTurnController {
        &self.turn_controller
    }

    pub async fn await_termination(&self) {
        self.session.await_termination().await;
    }

    pub async fn close_gracefully(&self) -> CorrelationResult<()> {
        self.session.close_gracefully().await
    }

    async fn capabilities(&self) -> CorrelationResult<ClientCapabilities> {
        self.client_capabilities
            .read()
            .await
            .clone()
            .ok_or(CorrelationError::NotInitialized)
    }

    pub async fn read_text_file(&self, request: ReadTextFileRequest) -> CorrelationResult<ReadTextFileResponse> {
        if !self.capabilities().await?.fs.read_text_file {
            return Err(CorrelationError::CapabilityNotSupported {
                capability: "fs.readTextFile".to_string(),
            });
        }
        self.session
            .send_request(CLIENT_METHOD_NAMES.fs_read_text_file, request, None)
            .await
    }

    pub async fn write_text_file(&self, request: WriteTextFileRequest) -> CorrelationResult<WriteTextFileResponse> {
        if !self.capabilities().await?.fs.write_text_file {
            return Err(CorrelationError::CapabilityNotSupported {
                capability: "fs.writeTextFile".to_string(),
            });
        }
        self.session
            .send_request(CLIENT_METHOD_NAMES.fs_write_text_file, request, None)
            .await
    }

    pub async fn request_permission(
        &self,
        request: crate::schema::RequestPermissionRequest,
    ) -> CorrelationResult<crate::schema::RequestPermissionResponse> {
        self.session
            .send_request(CLIENT_METHOD_NAMES.session_request_permission, request, None)
            .await
    }

    pub async fn create_terminal(&self, request: CreateTerminalRequest) -> CorrelationResult<CreateTerminalResponse> {
        self.require_terminal_capability().await?;
        self.session.send_request(CLIENT_METHOD_NAMES.terminal_create, request, None).await
    }

    pub async fn terminal_output(&self, request: TerminalOutputRequest) -> CorrelationResult<TerminalOutputResponse> {
        self.require_terminal_capability().await?;
        self.session.send_request(CLIENT_METHOD_NAMES.terminal_output, request, None).await
    }

    pub async fn release_terminal(&self, request: ReleaseTerminalRequest) -> CorrelationResult<ReleaseTerminalResponse> {
        self.require_terminal_capability().await?;
        self.session.send_request(CLIENT_METHOD_NAMES.terminal_release, request, None).await
    }

    pub async fn wait_for_terminal_exit(
        &self,
        request: WaitForTerminalExitRequest,
    ) -> CorrelationResult<WaitForTerminalExitResponse> {
        self.require_terminal_capability().await?;
        self.session.send_request(CLIENT_METHOD_NAMES.terminal_wait_for_exit, request, None).await
    }

    pub async fn kill_terminal(&self, request: KillTerminalRequest) -> CorrelationResult<KillTerminalResponse> {
        self.require_terminal_capability().await?;
        self.session.send_request(CLIENT_METHOD_NAMES.terminal_kill, request, None).await
    }

    async fn require_terminal_capability(&self) -> CorrelationResult<()> {
        if !self.capabilities().await?.terminal {
            return Err(CorrelationError::CapabilityNotSupported {
                capability: "terminal".to_string(),
            });
        }
        Ok(())
    }
}

fn register_handlers(
    dispatcher: &Dispatcher,
    agent: Arc<dyn Agent>,
    turn_controller: SharedTurnController,
    client_capabilities: Arc<RwLock<Option<ClientCapabilities>>>,
    session_cell: SessionCell,
) {
    {
        let agent = agent.clone();
        let client_capabilities = client_capabilities.clone();
        let _ = dispatcher.register_request(
            AGENT_METHOD_NAMES.initialize,
            Arc::new(TypedRequestHandler::new(
                AGENT_METHOD_NAMES.initialize,
                move |request: crate::schema::InitializeRequest| {
                    let agent = agent.clone();
                    let client_capabilities = client_capabilities.clone();
                    async move {
                        let advertised = request.client_capabilities.clone();
                        let response = agent.initialize(request).await?;
                        *client_capabilities.write().await = Some(advertised);
                        Ok(response)
                    }
                },
            )),
        );
    }

    {
        let agent = agent.clone();
        let _ = dispatcher.register_request(
            AGENT_METHOD_NAMES.authenticate,
            Arc::new(TypedRequestHandler::new(
                AGENT_METHOD_NAMES.authenticate,
                move |request| {
                    let agent = agent.clone();
                    async move { agent.authenticate(request).await }
                },
            )),
        );
    }

    {
        let agent = agent.clone();
        let _ = dispatcher.register_request(
            AGENT_METHOD_NAMES.session_new,
            Arc::new(TypedRequestHandler::new(
                AGENT_METHOD_NAMES.session_new,
                move |request| {
                    let agent = agent.clone();
                    async move { agent.new_session(request).await }
                },
            )),
        );
    }

    {
        let agent = agent.clone();
        let _ = dispatcher.register_request(
            AGENT_METHOD_NAMES.session_load,
            Arc::new(TypedRequestHandler::new(
                AGENT_METHOD_NAMES.session_load,
                move |request| {
                    let agent = agent.clone();
                    async move { agent.load_session(request).await }
                },
            )),
        );
    }

    {
        let agent = agent.clone();
        let _ = dispatcher.register_request(
            AGENT_METHOD_NAMES.session_set_mode,
            Arc::new(TypedRequestHandler::new(
                AGENT_METHOD_NAMES.session_set_mode,
                move |request| {
                    let agent = agent.clone();
                    async move { agent.set_session_mode(request).await }
                },
            )),
        );
    }

    {
        let agent = agent.clone();
        let _ = dispatcher.register_request(
            AGENT_METHOD_NAMES.session_set_model,
            Arc::new(TypedRequestHandler::new(
                AGENT_METHOD_NAMES.session_set_model,
                move |request| {
                    let agent = agent.clone();
                    async move { agent.set_session_model(request).await }
                },
            )),
        );
    }

    let _ = dispatcher.register_request(
        AGENT_METHOD_NAMES.session_prompt,
        Arc::new(PromptHandler {
            agent,
            turn_controller: turn_controller.clone(),
            session_cell,
        }),
    );

    let _ = dispatcher.register_notification(
        AGENT_METHOD_NAMES.session_cancel,
        Arc::new(TypedNotificationHandler::new(
            AGENT_METHOD_NAMES.session_cancel,
            move |notification: CancelNotification| {
                let turn_controller = turn_controller.clone();
                async move {
                    turn_controller.cancel(&notification.session_id);
                }
            },
        )),
    );
}

/// Custom (not [`TypedRequestHandler`]) because claiming the turn slot
/// needs an identifier for the in-flight prompt distinct from its
/// decoded params, and the slot must be released however `prompt`
/// resolves.
struct PromptHandler {
    agent: Arc<dyn Agent>,
    turn_controller: SharedTurnController,
    session_cell: SessionCell,
}

#[async_trait]
impl RequestHandler for PromptHandler {
    async fn handle(&self, params: Option<Value>) -> Result<Value, HandlerError> {
        let params = params.unwrap_or(Value::Null);
        let request: PromptRequest = serde_json::from_value(params).map_err(|err| {
            HandlerError::with_code(
                JsonRpcError::INVALID_PARAMS,
                format!("invalid params for session/prompt: {err}"),
            )
        })?;

        let session_id = request.session_id.clone();
        let turn_token = RequestId::new_string(Uuid::new_v4().to_string());
        let guard = self
            .turn_controller
            .try_claim(session_id.clone(), turn_token)
            .map_err(|conflict| {
                HandlerError::with_code(
                    JsonRpcError::CONCURRENT_PROMPT,
                    format!(
                        "already an active prompt execution for session '{}'",
                        conflict.session_id
                    ),
                )
            })?;

        let weak_session = self.session_cell.read().await.clone();
        let sender = SessionUpdateSender::new(weak_session, session_id);
        let cancellation = guard.cancellation().clone();

        let result = self.agent.prompt(request, sender, cancellation).await;
        self.turn_controller.release(guard);

        let response = result?;
        serde_json::to_value(response)
            .map_err(|err| HandlerError::new(format!("failed to serialize prompt response: {err}")))
    }
}
