use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use acp_core::dispatcher::HandlerError;
use acp_core::schema::{
    AgentCapabilities, AuthenticateRequest, AuthenticateResponse, ClientCapabilities,
    ContentBlock, CreateTerminalRequest, CreateTerminalResponse, FileSystemCapability,
    InitializeRequest, InitializeResponse, KillTerminalRequest, KillTerminalResponse,
    LoadSessionRequest, LoadSessionResponse, McpServer, NewSessionRequest, NewSessionResponse,
    PromptRequest, PromptResponse, ReadTextFileRequest, ReadTextFileResponse,
    ReleaseTerminalRequest, ReleaseTerminalResponse, RequestPermissionRequest,
    RequestPermissionResponse, SessionId, SessionNotification, SessionUpdate,
    SetSessionModeRequest, SetSessionModeResponse, SetSessionModelRequest,
    SetSessionModelResponse, StopReason, TerminalOutputRequest, TerminalOutputResponse,
    WaitForTerminalExitRequest, WaitForTerminalExitResponse, WriteTextFileRequest,
    WriteTextFileResponse,
};
use acp_core::session::SessionConfig;
use acp_core::transport::InMemoryTransport;
use acp_core::{Agent, AgentSideConnection, Client, ClientSideConnection, SessionUpdateSender};

/// Agent half of every scenario: echoes back capabilities, hands out a
/// fixed session id, and streams two chunks before finishing.
struct TestAgent {
    prompt_started: tokio::sync::Notify,
    release_prompt: Mutex<Option<tokio::sync::oneshot::Receiver<()>>>,
}

impl TestAgent {
    fn new() -> Self {
        Self {
            prompt_started: tokio::sync::Notify::new(),
            release_prompt: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Agent for TestAgent {
    async fn initialize(&self, _request: InitializeRequest) -> Result<InitializeResponse, HandlerError> {
        Ok(InitializeResponse {
            protocol_version: 1,
            agent_capabilities: AgentCapabilities {
                load_session: true,
                ..Default::default()
            },
            auth_methods: Some(vec![]),
        })
    }

    async fn authenticate(&self, _request: AuthenticateRequest) -> Result<AuthenticateResponse, HandlerError> {
        Ok(AuthenticateResponse {})
    }

    async fn new_session(&self, _request: NewSessionRequest) -> Result<NewSessionResponse, HandlerError> {
        Ok(NewSessionResponse {
            session_id: SessionId::new("s1"),
            modes: None,
            models: None,
        })
    }

    async fn load_session(&self, _request: LoadSessionRequest) -> Result<LoadSessionResponse, HandlerError> {
        Ok(LoadSessionResponse::default())
    }

    async fn set_session_mode(&self, _request: SetSessionModeRequest) -> Result<SetSessionModeResponse, HandlerError> {
        Ok(SetSessionModeResponse {})
    }

    async fn set_session_model(&self, _request: SetSessionModelRequest) -> Result<SetSessionModelResponse, HandlerError> {
        Ok(SetSessionModelResponse {})
    }

    async fn prompt(
        &self,
        _request: PromptRequest,
        updates: SessionUpdateSender,
        cancellation: acp_core::turn::CancellationSignal,
    ) -> Result<PromptResponse, HandlerError> {
        self.prompt_started.notify_waiters();

        updates
            .send(SessionUpdate::AgentMessageChunk {
                content: ContentBlock::text("Work"),
            })
            .await
            .map_err(|err| HandlerError::new(err.to_string()))?;
        updates
            .send(SessionUpdate::AgentMessageChunk {
                content: ContentBlock::text("ing"),
            })
            .await
            .map_err(|err| HandlerError::new(err.to_string()))?;

        let wait_for_cancel = self.release_prompt.lock().await.take();
        if let Some(gate) = wait_for_cancel {
            tokio::select! {
                _ = cancellation.cancelled() => {
                    return Ok(PromptResponse { stop_reason: StopReason::Cancelled });
                }
                _ = gate => {}
            }
        }

        Ok(PromptResponse {
            stop_reason: StopReason::EndTurn,
        })
    }
}

/// Client half: records streamed updates, answers `fs/read_text_file`
/// only when `allow_fs_read` is set.
struct TestClient {
    updates: Mutex<Vec<SessionNotification>>,
    allow_fs_read: bool,
}

impl TestClient {
    fn new(allow_fs_read: bool) -> Self {
        Self {
            updates: Mutex::new(Vec::new()),
            allow_fs_read,
        }
    }
}

#[async_trait]
impl Client for TestClient {
    async fn read_text_file(&self, _request: ReadTextFileRequest) -> Result<ReadTextFileResponse, HandlerError> {
        if !self.allow_fs_read {
            return Err(HandlerError::new("fs read disabled for this test"));
        }
        Ok(ReadTextFileResponse {
            content: "file contents".to_string(),
        })
    }

    async fn write_text_file(&self, _request: WriteTextFileRequest) -> Result<WriteTextFileResponse, HandlerError> {
        Ok(WriteTextFileResponse {})
    }

    async fn request_permission(&self, _request: RequestPermissionRequest) -> Result<RequestPermissionResponse, HandlerError> {
        unimplemented!("not exercised by these scenarios")
    }

    async fn create_terminal(&self, _request: CreateTerminalRequest) -> Result<CreateTerminalResponse, HandlerError> {
        unimplemented!("not exercised by these scenarios")
    }

    async fn terminal_output(&self, _request: TerminalOutputRequest) -> Result<TerminalOutputResponse, HandlerError> {
        unimplemented!("not exercised by these scenarios")
    }

    async fn release_terminal(&self, _request: ReleaseTerminalRequest) -> Result<ReleaseTerminalResponse, HandlerError> {
        unimplemented!("not exercised by these scenarios")
    }

    async fn wait_for_terminal_exit(&self, _request: WaitForTerminalExitRequest) -> Result<WaitForTerminalExitResponse, HandlerError> {
        unimplemented!("not exercised by these scenarios")
    }

    async fn kill_terminal(&self, _request: KillTerminalRequest) -> Result<KillTerminalResponse, HandlerError> {
        unimplemented!("not exercised by these scenarios")
    }

    async fn session_update(&self, notification: SessionNotification) {
        self.updates.lock().await.push(notification);
    }
}

async fn connected_pair(
    client: Arc<TestClient>,
) -> (Arc<AgentSideConnection>, Arc<ClientSideConnection>) {
    let (agent_transport, client_transport) = InMemoryTransport::pair(16);
    let agent = Arc::new(TestAgent::new());

    let agent_conn = AgentSideConnection::new(Box::new(agent_transport), agent, SessionConfig::default())
        .await
        .unwrap();
    let client_conn = ClientSideConnection::new(Box::new(client_transport), client, SessionConfig::default())
        .await
        .unwrap();

    (agent_conn, client_conn)
}

#[tokio::test]
async fn scenario_1_handshake() {
    let client = Arc::new(TestClient::new(true));
    let (_agent_conn, client_conn) = connected_pair(client).await;

    let response = client_conn
        .initialize(InitializeRequest {
            protocol_version: 1,
            client_capabilities: ClientCapabilities {
                fs: FileSystemCapability {
                    read_text_file: true,
                    write_text_file: false,
                },
                terminal: false,
            },
        })
        .await
        .unwrap();

    assert_eq!(response.protocol_version, 1);
    assert!(response.agent_capabilities.load_session);
    assert_eq!(response.auth_methods, Some(vec![]));
}

#[tokio::test]
async fn scenario_2_single_prompt_streaming() {
    let client = Arc::new(TestClient::new(true));
    let (_agent_conn, client_conn) = connected_pair(client.clone()).await;

    client_conn
        .initialize(InitializeRequest {
            protocol_version: 1,
            client_capabilities: ClientCapabilities::default(),
        })
        .await
        .unwrap();

    let new_session = client_conn
        .new_session(NewSessionRequest {
            cwd: "/w".into(),
            mcp_servers: Vec::<McpServer>::new(),
        })
        .await
        .unwrap();
    assert_eq!(new_session.session_id, SessionId::new("s1"));

    let response = client_conn
        .prompt(PromptRequest {
            session_id: new_session.session_id,
            prompt: vec![ContentBlock::text("hi")],
        })
        .await
        .unwrap();

    assert_eq!(response.stop_reason, StopReason::EndTurn);

    let updates = client.updates.lock().await;
    assert_eq!(updates.len(), 2);
    match &updates[0].update {
        SessionUpdate::AgentMessageChunk { content: ContentBlock::Text { text, .. } } => {
            assert_eq!(text, "Work")
        }
        other => panic!("unexpected update: {other:?}"),
    }
    match &updates[1].update {
        SessionUpdate::AgentMessageChunk { content: ContentBlock::Text { text, .. } } => {
            assert_eq!(text, "ing")
        }
        other => panic!("unexpected update: {other:?}"),
    }
}

#[tokio::test]
async fn scenario_3_concurrent_prompt_rejected() {
    let client = Arc::new(TestClient::new(true));
    let (agent_conn, client_conn) = connected_pair(client).await;

    client_conn
        .initialize(InitializeRequest {
            protocol_version: 1,
            client_capabilities: ClientCapabilities::default(),
        })
        .await
        .unwrap();

    assert_eq!(agent_conn.turn_controller().active_count(), 0);

    let session_id = SessionId::new("s1");
    let first = {
        let client_conn = client_conn.clone();
        let session_id = session_id.clone();
        tokio::spawn(async move {
            client_conn
                .prompt(PromptRequest {
                    session_id,
                    prompt: vec![ContentBlock::text("hi")],
                })
                .await
        })
    };

    // Give the first prompt a moment to claim its turn slot before firing
    // the second; the test agent streams two updates before finishing,
    // leaving a window where exactly one prompt should be active.
    let claimed = tokio::time::timeout(std::time::Duration::from_millis(200), async {
        while agent_conn.turn_controller().active_count() == 0 {
            tokio::task::yield_now().await;
        }
    })
    .await;
    assert!(claimed.is_ok(), "first prompt never claimed its turn slot");

    let second = client_conn
        .prompt(PromptRequest {
            session_id,
            prompt: vec![ContentBlock::text("hi, again")],
        })
        .await;

    let err = second.expect_err("second concurrent prompt must be rejected");
    let message = err.to_string();
    assert!(message.contains("already an active prompt"), "{message}");

    let first_result = first.await.unwrap().unwrap();
    assert_eq!(first_result.stop_reason, StopReason::EndTurn);
}

#[tokio::test]
async fn scenario_4_capability_gated_method_rejected_without_handler() {
    let client = Arc::new(TestClient::new(false));
    let (agent_conn, client_conn) = connected_pair(client).await;

    client_conn
        .initialize(InitializeRequest {
            protocol_version: 1,
            client_capabilities: ClientCapabilities {
                fs: FileSystemCapability {
                    read_text_file: false,
                    write_text_file: false,
                },
                terminal: false,
            },
        })
        .await
        .unwrap();

    let err = agent_conn
        .read_text_file(ReadTextFileRequest {
            session_id: SessionId::new("s1"),
            path: "/x".into(),
            line: None,
            limit: None,
        })
        .await
        .expect_err("fs.readTextFile was not negotiated");

    assert!(matches!(
        err,
        acp_core::session::CorrelationError::CapabilityNotSupported { .. }
    ));
}

#[tokio::test]
async fn scenario_5_cancel_during_prompt() {
    // Force the agent's prompt handler to block until cancelled: a gate
    // that never sends, so the `select!` in `TestAgent::prompt` only
    // resolves via cooperative cancellation.
    let (_never_sends, gate) = tokio::sync::oneshot::channel::<()>();

    let (agent_transport, client_transport) = InMemoryTransport::pair(16);
    let agent = Arc::new(TestAgent::new());
    *agent.release_prompt.lock().await = Some(gate);

    let agent_conn = AgentSideConnection::new(Box::new(agent_transport), agent.clone(), SessionConfig::default())
        .await
        .unwrap();
    let client = Arc::new(TestClient::new(true));
    let client_conn = ClientSideConnection::new(Box::new(client_transport), client, SessionConfig::default())
        .await
        .unwrap();

    client_conn
        .initialize(InitializeRequest {
            protocol_version: 1,
            client_capabilities: ClientCapabilities::default(),
        })
        .await
        .unwrap();

    let session_id = SessionId::new("s1");
    let prompt_task = {
        let client_conn = client_conn.clone();
        let session_id = session_id.clone();
        tokio::spawn(async move {
            client_conn
                .prompt(PromptRequest {
                    session_id,
                    prompt: vec![ContentBlock::text("hi")],
                })
                .await
        })
    };

    agent.prompt_started.notified().await;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    client_conn.cancel(session_id.clone()).await.unwrap();

    let response = tokio::time::timeout(std::time::Duration::from_millis(500), prompt_task)
        .await
        .expect("prompt should resolve promptly after cancel")
        .unwrap()
        .unwrap();
    assert_eq!(response.stop_reason, StopReason::Cancelled);

    assert_eq!(agent_conn.turn_controller().active_count(), 0);

    // A subsequent prompt to the same session must succeed now that the
    // slot is clear.
    let second = client_conn
        .prompt(PromptRequest {
            session_id,
            prompt: vec![ContentBlock::text("hi again")],
        })
        .await
        .unwrap();
    assert_eq!(second.stop_reason, StopReason::EndTurn);
}

#[tokio::test]
async fn scenario_6_mcp_server_round_trip() {
    let json = serde_json::json!([
        {"name": "local", "command": "node", "args": [], "env": []},
        {"type": "http", "name": "remote", "url": "https://example.com/mcp"},
        {"type": "sse", "name": "events", "url": "https://example.com/sse"},
    ]);

    let servers: Vec<McpServer> = serde_json::from_value(json).unwrap();
    assert_eq!(servers.len(), 3);

    let re_encoded = serde_json::to_value(&servers).unwrap();
    assert!(re_encoded[0].get("type").is_none(), "stdio entry must stay untagged");
    assert_eq!(re_encoded[1]["type"], "http");
    assert_eq!(re_encoded[2]["type"], "sse");
}
