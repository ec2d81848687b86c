//! The two user-implementable roles: what an agent answers for a client,
//! and what a client answers for an agent.

use async_trait::async_trait;

use crate::dispatcher::HandlerError;
use crate::schema::{
    AuthenticateRequest, AuthenticateResponse, CreateTerminalRequest, CreateTerminalResponse,
    InitializeRequest, InitializeResponse, KillTerminalRequest, KillTerminalResponse,
    LoadSessionRequest, LoadSessionResponse, NewSessionRequest, NewSessionResponse, PromptRequest,
    PromptResponse, ReadTextFileRequest, ReadTextFileResponse, ReleaseTerminalRequest,
    ReleaseTerminalResponse, RequestPermissionRequest, RequestPermissionResponse,
    SessionNotification, SetSessionModeRequest, SetSessionModeResponse, SetSessionModelRequest,
    SetSessionModelResponse, TerminalOutputRequest, TerminalOutputResponse,
    WaitForTerminalExitRequest, WaitForTerminalExitResponse, WriteTextFileRequest,
    WriteTextFileResponse,
};
use crate::turn::CancellationSignal;

use super::update_sender::SessionUpdateSender;

/// Methods an agent implementation answers for the client it's connected to.
///
/// `prompt` alone receives a [`SessionUpdateSender`] (to stream
/// `session/update` notifications mid-turn) and a [`CancellationSignal`]
/// (to race against, per a `session/cancel`) — every other method
/// completes in one shot and needs neither.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn initialize(&self, request: InitializeRequest) -> Result<InitializeResponse, HandlerError>;

    async fn authenticate(&self, request: AuthenticateRequest) -> Result<AuthenticateResponse, HandlerError>;

    async fn new_session(&self, request: NewSessionRequest) -> Result<NewSessionResponse, HandlerError>;

    async fn load_session(&self, request: LoadSessionRequest) -> Result<LoadSessionResponse, HandlerError>;

    async fn set_session_mode(&self, request: SetSessionModeRequest) -> Result<SetSessionModeResponse, HandlerError>;

    /// Unstable: the wire shape of `session/set_model` is not yet fixed
    /// across protocol revisions; callers should not assume `model_id`'s
    /// format is final.
    async fn set_session_model(&self, request: SetSessionModelRequest) -> Result<SetSessionModelResponse, HandlerError>;

    async fn prompt(
        &self,
        request: PromptRequest,
        updates: SessionUpdateSender,
        cancellation: CancellationSignal,
    ) -> Result<PromptResponse, HandlerError>;
}

/// Methods a client implementation answers for the agent it's connected to.
#[async_trait]
pub trait Client: Send + Sync {
    async fn read_text_file(&self, request: ReadTextFileRequest) -> Result<ReadTextFileResponse, HandlerError>;

    async fn write_text_file(&self, request: WriteTextFileRequest) -> Result<WriteTextFileResponse, HandlerError>;

    async fn request_permission(&self, request: RequestPermissionRequest) -> Result<RequestPermissionResponse, HandlerError>;

    async fn create_terminal(&self, request: CreateTerminalRequest) -> Result<CreateTerminalResponse, HandlerError>;

    async fn terminal_output(&self, request: TerminalOutputRequest) -> Result<TerminalOutputResponse, HandlerError>;

    async fn release_terminal(&self, request: ReleaseTerminalRequest) -> Result<ReleaseTerminalResponse, HandlerError>;

    async fn wait_for_terminal_exit(&self, request: WaitForTerminalExitRequest) -> Result<WaitForTerminalExitResponse, HandlerError>;

    async fn kill_terminal(&self, request: KillTerminalRequest) -> Result<KillTerminalResponse, HandlerError>;

    /// Receive a `session/update` streamed mid-turn. Never produces a
    /// response; the agent does not wait on it.
    async fn session_update(&self, notification: SessionNotification);
}
