//! Wire types for the Agent Client Protocol: JSON-RPC envelopes, content
//! blocks, capability sets, session updates, and the request/response pair
//! for every method in the protocol.
//!
//! This module has no dependency on [`crate::transport`], [`crate::session`],
//! or [`crate::dispatcher`] — it is the foundational, side-effect-free layer
//! the rest of the crate builds on.

pub mod capabilities;
pub mod content;
pub mod error;
pub mod ids;
pub mod jsonrpc;
pub mod mcp_server;
pub mod methods;
pub mod permission;
pub mod session_update;

pub use capabilities::{AgentCapabilities, ClientCapabilities, FileSystemCapability, McpCapabilities, PromptCapabilities};
pub use content::{Annotations, ContentBlock, EmbeddedResource, ResourceLink, Role};
pub use error::ErrorCode;
pub use ids::{ModelId, SessionId, SessionModeId, TerminalId};
pub use jsonrpc::{
    JsonRpcError, JsonRpcNotification, JsonRpcPayload, JsonRpcRequest, JsonRpcResponse, Message,
    MessageDecodeError, RequestId,
};
pub use mcp_server::{EnvVariable, HttpMcpServer, McpServer, SseMcpServer, StdioMcpServer};
pub use methods::{
    AgentMethodNames, AuthMethod, AuthenticateRequest, AuthenticateResponse, CancelNotification,
    ClientMethodNames, CreateTerminalRequest, CreateTerminalResponse, InitializeRequest,
    InitializeResponse, KillTerminalRequest, KillTerminalResponse, LoadSessionRequest,
    LoadSessionResponse, NewSessionRequest, NewSessionResponse, PromptRequest, PromptResponse,
    ModelInfo, ReadTextFileRequest, ReadTextFileResponse, ReleaseTerminalRequest,
    ReleaseTerminalResponse, SessionMode, SessionModeState, SessionModelState,
    SetSessionModeRequest, SetSessionModeResponse, SetSessionModelRequest,
    SetSessionModelResponse, StopReason, TerminalExitStatus, TerminalOutputRequest,
    TerminalOutputResponse, WaitForTerminalExitRequest, WaitForTerminalExitResponse,
    WriteTextFileRequest, WriteTextFileResponse, AGENT_METHOD_NAMES, AUTHENTICATE_METHOD_NAME,
    CLIENT_METHOD_NAMES, FS_READ_TEXT_FILE_METHOD_NAME, FS_WRITE_TEXT_FILE_METHOD_NAME,
    INITIALIZE_METHOD_NAME, PROTOCOL_VERSION, SESSION_CANCEL_METHOD_NAME,
    SESSION_LOAD_METHOD_NAME, SESSION_NEW_METHOD_NAME, SESSION_PROMPT_METHOD_NAME,
    SESSION_REQUEST_PERMISSION_METHOD_NAME, SESSION_SET_MODE_METHOD_NAME,
    SESSION_SET_MODEL_METHOD_NAME, SESSION_UPDATE_NOTIFICATION, TERMINAL_CREATE_METHOD_NAME,
    TERMINAL_KILL_METHOD_NAME, TERMINAL_OUTPUT_METHOD_NAME, TERMINAL_RELEASE_METHOD_NAME,
    TERMINAL_WAIT_FOR_EXIT_METHOD_NAME, missing_handler_hint,
};
pub use permission::{
    PermissionOption, PermissionOptionId, PermissionOptionKind, RequestPermissionOutcome,
    RequestPermissionRequest, RequestPermissionResponse,
};
pub use session_update::{
    AvailableCommand, AvailableCommandsUpdate, CurrentModeUpdate, Plan, PlanEntry,
    PlanEntryPriority, PlanEntryStatus, SessionNotification, SessionUpdate, ToolCall,
    ToolCallContent, ToolCallId, ToolCallLocation, ToolCallStatus, ToolCallUpdate, ToolKind,
};
