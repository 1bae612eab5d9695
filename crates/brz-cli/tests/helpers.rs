//! Test helpers: an in-process bridge server.

#![allow(dead_code)]

use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use brz_proto::{error_codes, BridgeRequest, BridgeResponse, RequestEnvelope, ResponseEnvelope};
use futures::{SinkExt, StreamExt};
use tempfile::NamedTempFile;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Default test timeout.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Version the mock bridge reports in its welcome.
pub const BRIDGE_VERSION: &str = "mock-bridge";

/// Agent address the standard handler reports.
pub const AGENT_ADDRESS: &str = "ws://agent.test:7402";

/// Decides the answer to each request; `None` drops the connection.
pub type Handler = Arc<dyn Fn(&BridgeRequest) -> Option<BridgeResponse> + Send + Sync>;

/// A mock bridge bound to an ephemeral port.
pub struct MockBridge {
    addr: SocketAddr,
    accept_loop: JoinHandle<()>,
}

impl MockBridge {
    /// Start a bridge answering with [`standard_handler`].
    pub async fn start() -> Self {
        Self::with_handler(Arc::new(standard_handler)).await
    }

    /// Start a bridge answering with `handler`.
    pub async fn with_handler(handler: Handler) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let accept_loop = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, Arc::clone(&handler)));
            }
        });
        Self { addr, accept_loop }
    }

    /// WebSocket URL of this bridge.
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }
}

impl Drop for MockBridge {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

async fn serve(stream: TcpStream, handler: Handler) {
    let Ok(mut ws) = accept_async(stream).await else {
        return;
    };

    while let Some(Ok(message)) = ws.next().await {
        let Message::Text(text) = message else {
            continue;
        };
        let Ok(envelope) = RequestEnvelope::from_json(&text) else {
            continue;
        };

        let response = match &envelope.request {
            BridgeRequest::Hello { .. } => BridgeResponse::welcome(BRIDGE_VERSION),
            request => match handler(request) {
                Some(response) => response,
                None => return,
            },
        };

        let reply = ResponseEnvelope::new(envelope.id, response)
            .to_json()
            .expect("encode response");
        if ws.send(Message::Text(reply)).await.is_err() {
            return;
        }
    }
}

/// A healthy cluster: agent and channel known, status as JSON,
/// schema missing, indexing assigns sequence 17.
pub fn standard_handler(request: &BridgeRequest) -> Option<BridgeResponse> {
    Some(match request {
        BridgeRequest::FindAgent { .. } => BridgeResponse::Located {
            address: Some(AGENT_ADDRESS.to_string()),
        },
        BridgeRequest::FindChannel { .. } => BridgeResponse::Located { address: None },
        BridgeRequest::GetStatus { cluster } => BridgeResponse::Text {
            text: format!("{{\"cluster\":\"{cluster}\",\"docs\":10}}"),
        },
        BridgeRequest::GetSchema { .. } => {
            BridgeResponse::error(error_codes::CLUSTER_NOT_FOUND, "no such cluster")
        }
        BridgeRequest::PostIndexingCommand { .. } => BridgeResponse::Sequence { sn: 17 },
        BridgeRequest::PostControlCommand { command, payload, .. } => BridgeResponse::Text {
            text: format!("{command}:{payload}"),
        },
        _ => BridgeResponse::Ack,
    })
}

/// A cluster whose agent never registers.
pub fn agentless_handler(request: &BridgeRequest) -> Option<BridgeResponse> {
    match request {
        BridgeRequest::FindAgent { .. } => Some(BridgeResponse::NotFound),
        other => standard_handler(other),
    }
}

/// Write a temporary file with `content`.
pub fn temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file
}

/// Write a bridge config pointing at `endpoints`.
pub fn bridge_config(endpoints: &[&str], contact_file: &std::path::Path) -> NamedTempFile {
    let endpoints: Vec<String> = endpoints.iter().map(|e| format!("{e:?}")).collect();
    temp_file(&format!(
        "endpoints = [{}]\nconnect_timeout_secs = 2\nrequest_timeout_secs = 5\npoll_interval_ms = 100\ncontact_file = {:?}\n",
        endpoints.join(", "),
        contact_file.display().to_string(),
    ))
}
