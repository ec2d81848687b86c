//! The client-side facade: answers `fs/*`, `terminal/*`, and
//! `session/request_permission` for an agent, and drives `initialize`,
//! `session/new`, `session/prompt`, etc. as the outbound caller.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::dispatcher::{Dispatcher, DispatcherConfig, TypedNotificationHandler, TypedRequestHandler};
use crate::schema::{
    AgentCapabilities, AuthenticateRequest, AuthenticateResponse, InitializeRequest,
    InitializeResponse, LoadSessionRequest, LoadSessionResponse, NewSessionRequest,
    NewSessionResponse, PromptRequest, PromptResponse, SessionNotification, SetSessionModeRequest,
    SetSessionModeResponse, SetSessionModelRequest, SetSessionModelResponse, AGENT_METHOD_NAMES,
    CLIENT_METHOD_NAMES,
};
use crate::session::{CorrelationError, CorrelationResult, Session, SessionConfig};
use crate::transport::Transport;

use super::traits::Client;

/// Client-side endpoint: the half of a connection that answers `fs/*`,
/// `terminal/*`, and `session/request_permission`, and calls out to the
/// agent for `initialize`, `session/new`, `session/prompt`, etc.
pub struct ClientSideConnection {
    session: Arc<Session>,
    agent_capabilities: Arc<RwLock<Option<AgentCapabilities>>>,
}

impl ClientSideConnection {
    pub async fn new(
        transport: Box<dyn Transport>,
        client: Arc<dyn Client>,
        config: SessionConfig,
    ) -> CorrelationResult<Arc<Self>> {
        let dispatcher = Arc::new(Dispatcher::new(DispatcherConfig::default()));
        let turn_controller = Arc::new(crate::turn::TurnController::new());

        register_handlers(&dispatcher, client);

        let session = Session::new(transport, dispatcher, turn_controller, config).await?;

        Ok(Arc::new(Self {
            session,
            agent_capabilities: Arc::new(RwLock::new(None)),
        }))
    }

    pub async fn await_termination(&self) {
        self.session.await_termination().await;
    }

    pub async fn close_gracefully(&self) -> CorrelationResult<()> {
        self.session.close_gracefully().await
    }

    pub async fn initialize(&self, request: InitializeRequest) -> CorrelationResult<InitializeResponse> {
        let response: InitializeResponse = self
            .session
            .send_request(AGENT_METHOD_NAMES.initialize, request, None)
            .await?;
        *self.agent_capabilities.write().await = Some(response.agent_capabilities.clone());
        Ok(response)
    }

    pub async fn authenticate(&self, request: AuthenticateRequest) -> CorrelationResult<AuthenticateResponse> {
        self.session
            .send_request(AGENT_METHOD_NAMES.authenticate, request, None)
            .await
    }

    pub async fn new_session(&self, request: NewSessionRequest) -> CorrelationResult<NewSessionResponse> {
        self.session
            .send_request(AGENT_METHOD_NAMES.session_new, request, None)
            .await
    }

    pub async fn load_session(&self, request: LoadSessionRequest) -> CorrelationResult<LoadSessionResponse> {
        if !self.capabilities().await?.load_session {
            return Err(CorrelationError::CapabilityNotSupported {
                capability: "loadSession".to_string(),
            });
        }
        self.session
            .send_request(AGENT_METHOD_NAMES.session_load, request, None)
            .await
    }

    pub async fn set_session_mode(&self, request: SetSessionModeRequest) -> CorrelationResult<SetSessionModeResponse> {
        self.session
            .send_request(AGENT_METHOD_NAMES.session_set_mode, request, None)
            .await
    }

    pub async fn set_session_model(&self, request: SetSessionModelRequest) -> CorrelationResult<SetSessionModelResponse> {
        self.session
            .send_request(AGENT_METHOD_NAMES.session_set_model, request, None)
            .await
    }

    pub async fn prompt(&self, request: PromptRequest) -> CorrelationResult<PromptResponse> {
        self.session
            .send_request(AGENT_METHOD_NAMES.session_prompt, request, None)
            .await
    }

    /// Ask the agent to stop the active turn for `session_id`. Fire-and-forget:
    /// the agent resolves the in-flight `session/prompt` with
    /// `stopReason: cancelled` rather than answering this call directly.
    pub async fn cancel(&self, session_id: crate::schema::SessionId) -> CorrelationResult<()> {
        let notification = crate::schema::CancelNotification { session_id };
        self.session
            .send_notification(AGENT_METHOD_NAMES.session_cancel, Some(notification))
            .await
    }

    async fn capabilities(&self) -> CorrelationResult<AgentCapabilities> {
        self.agent_capabilities
            .read()
            .await
            .clone()
            .ok_or(CorrelationError::NotInitialized)
    }
}

fn register_handlers(dispatcher: &Dispatcher, client: Arc<dyn Client>) {
    {
        let client = client.clone();
        let _ = dispatcher.register_request(
            CLIENT_METHOD_NAMES.fs_read_text_file,
            Arc::new(TypedRequestHandler::new(
                CLIENT_METHOD_NAMES.fs_read_text_file,
                move |request| {
                    let client = client.clone();
                    async move { client.read_text_file(request).await }
                },
            )),
        );
    }

    {
        let client = client.clone();
        let _ = dispatcher.register_request(
            CLIENT_METHOD_NAMES.fs_write_text_file,
            Arc::new(TypedRequestHandler::new(
                CLIENT_METHOD_NAMES.fs_write_text_file,
                move |request| {
                    let client = client.clone();
                    async move { client.write_text_file(request).await }
                },
            )),
        );
    }

    {
        let client = client.clone();
        let _ = dispatcher.register_request(
            CLIENT_METHOD_NAMES.session_request_permission,
            Arc::new(TypedRequestHandler::new(
                CLIENT_METHOD_NAMES.session_request_permission,
                move |request| {
                    let client = client.clone();
                    async move { client.request_permission(request).await }
                },
            )),
        );
    }

    {
        let client = client.clone();
        let _ = dispatcher.register_request(
            CLIENT_METHOD_NAMES.terminal_create,
            Arc::new(TypedRequestHandler::new(
                CLIENT_METHOD_NAMES.terminal_create,
                move |request| {
                    let client = client.clone();
                    async move { client.create_terminal(request).await }
                },
            )),
        );
    }

    {
        let client = client.clone();
        let _ = dispatcher.register_request(
            CLIENT_METHOD_NAMES.terminal_output,
            Arc::new(TypedRequestHandler::new(
                CLIENT_METHOD_NAMES.terminal_output,
                move |request| {
                    let client = client.clone();
                    async move { client.terminal_output(request).await }
                },
            )),
        );
    }

    {
        let client = client.clone();
        let _ = dispatcher.register_request(
            CLIENT_METHOD_NAMES.terminal_release,
            Arc::new(TypedRequestHandler::new(
                CLIENT_METHOD_NAMES.terminal_release,
                move |request| {
                    let client = client.clone();
                    async move { client.release_terminal(request).await }
                },
            )),
        );
    }

    {
        let client = client.clone();
        let _ = dispatcher.register_request(
            CLIENT_METHOD_NAMES.terminal_wait_for_exit,
            Arc::new(TypedRequestHandler::new(
                CLIENT_METHOD_NAMES.terminal_wait_for_exit,
                move |request| {
                    let client = client.clone();
                    async move { client.wait_for_terminal_exit(request).await }
                },
            )),
        );
    }

    {
        let client = client.clone();
        let _ = dispatcher.register_request(
            CLIENT_METHOD_NAMES.terminal_kill,
            Arc::new(TypedRequestHandler::new(
                CLIENT_METHOD_NAMES.terminal_kill,
                move |request| {
                    let client = client.clone();
                    async move { client.kill_terminal(request).await }
                },
            )),
        );
    }

    let _ = dispatcher.register_notification(
        CLIENT_METHOD_NAMES.session_update,
        Arc::new(TypedNotificationHandler::new(
            CLIENT_METHOD_NAMES.session_update,
            move |notification: SessionNotification| {
                let client = client.clone();
                async move { client.session_update(notification).await }
            },
        )),
    );
}
