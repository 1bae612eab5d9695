//! Transport session with the bridge service.
//!
//! A [`Session`] owns one WebSocket connection and the pump task that drives
//! it. Callers submit requests through [`Session::call`]; the pump writes
//! them to the socket and routes each response back to its caller by
//! correlation id through the request adaptor (the table of in-flight
//! requests).
//!
//! Teardown happens only through [`Session::close`], which consumes the
//! session:
//!
//! 1. signal shutdown to the pump,
//! 2. deactivate the request adaptor (pending callers fail, new calls are
//!    refused),
//! 3. await the pump task.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use brz_proto::{
    BRIDGE_PROTOCOL_VERSION, BridgeRequest, BridgeResponse, RequestEnvelope, ResponseEnvelope,
};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::address_book::ContactList;
use crate::config::{BridgeConfig, is_ws_url};
use crate::error::CliError;

type BridgeSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Reply = oneshot::Sender<Result<BridgeResponse, CliError>>;

/// Id reserved for the handshake; regular requests start at 1.
const HELLO_REQUEST_ID: u64 = 0;

/// Outbound queue depth between callers and the pump.
const OUTBOUND_QUEUE_DEPTH: usize = 32;

/// Table of in-flight requests awaiting responses.
#[derive(Debug, Default)]
pub(crate) struct RequestAdaptor {
    state: Mutex<AdaptorState>,
}

#[derive(Debug, Default)]
struct AdaptorState {
    deactivated: bool,
    pending: HashMap<u64, Reply>,
}

impl RequestAdaptor {
    fn register(&self, id: u64, reply: Reply) -> Result<(), CliError> {
        let mut state = self.state.lock();
        if state.deactivated {
            return Err(CliError::Connection("session is shut down".into()));
        }
        state.pending.insert(id, reply);
        Ok(())
    }

    fn forget(&self, id: u64) {
        self.state.lock().pending.remove(&id);
    }

    fn complete(&self, id: u64, result: Result<BridgeResponse, CliError>) {
        let reply = self.state.lock().pending.remove(&id);
        match reply {
            // The caller may have timed out and gone away.
            Some(reply) => {
                let _ = reply.send(result);
            }
            None => debug!(id, "response for unknown request"),
        }
    }

    fn fail_all(&self, reason: &str) {
        let pending: Vec<Reply> = self.state.lock().pending.drain().map(|(_, r)| r).collect();
        for reply in pending {
            let _ = reply.send(Err(CliError::Connection(reason.to_string())));
        }
    }

    fn deactivate(&self) {
        self.shut_down("session closed");
    }

    /// Refuse new requests and fail the pending ones with `reason`.
    fn shut_down(&self, reason: &str) {
        self.state.lock().deactivated = true;
        self.fail_all(reason);
    }

    fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }
}

/// The process-wide connection to the bridge.
pub struct Session {
    endpoint: String,
    server_version: String,
    request_timeout: Duration,
    next_id: AtomicU64,
    outbound: mpsc::Sender<RequestEnvelope>,
    adaptor: Arc<RequestAdaptor>,
    shutdown: CancellationToken,
    pump: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint)
            .field("server_version", &self.server_version)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Open a session to the first reachable bridge endpoint.
    ///
    /// Loaded contacts replace the configured endpoints when present.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Connection`] if no endpoint accepts the
    /// connection and handshake.
    pub async fn open(config: &BridgeConfig, contacts: &ContactList) -> Result<Self, CliError> {
        let candidates: Vec<&str> = if contacts.is_empty() {
            config.endpoints.iter().map(String::as_str).collect()
        } else {
            contacts.iter().collect()
        };

        let mut last_error = None;
        for endpoint in candidates {
            if !is_ws_url(endpoint) {
                warn!(endpoint, "skipping contact that is not a ws:// or wss:// URL");
                continue;
            }
            match Self::connect(endpoint, config.connect_timeout(), config.request_timeout()).await {
                Ok(session) => return Ok(session),
                Err(e) => {
                    warn!(endpoint, error = %e, "bridge endpoint unreachable");
                    last_error = Some(e);
                }
            }
        }

        Err(CliError::Connection(match last_error {
            Some(e) => format!("no bridge endpoint reachable, last error: {e}"),
            None => "no usable bridge endpoint".to_string(),
        }))
    }

    /// Connect to one endpoint, handshake, and start the pump.
    ///
    /// # Errors
    ///
    /// Returns an error if connection or handshake fails.
    pub async fn connect(
        endpoint: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, CliError> {
        debug!(endpoint, "connecting to bridge");

        let (mut ws, _response) = timeout(connect_timeout, connect_async(endpoint))
            .await
            .map_err(|_| CliError::Connection(format!("connection to {endpoint} timed out")))?
            .map_err(|e| CliError::Connection(e.to_string()))?;

        let server_version = handshake(&mut ws, request_timeout).await?;
        debug!(endpoint, version = %server_version, "handshake complete");

        let (outbound, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_DEPTH);
        let adaptor = Arc::new(RequestAdaptor::default());
        let shutdown = CancellationToken::new();

        let pump = tokio::spawn(run_pump(
            ws,
            outbound_rx,
            Arc::clone(&adaptor),
            shutdown.clone(),
        ));

        Ok(Self {
            endpoint: endpoint.to_string(),
            server_version,
            request_timeout,
            next_id: AtomicU64::new(HELLO_REQUEST_ID + 1),
            outbound,
            adaptor,
            shutdown,
            pump: Some(pump),
        })
    }

    /// Endpoint this session is connected to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Version reported by the bridge during the handshake.
    #[must_use]
    pub fn server_version(&self) -> &str {
        &self.server_version
    }

    /// Number of requests awaiting a response.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.adaptor.pending_count()
    }

    /// Send a request and wait for its response.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Remote`] if the bridge answers with an error,
    /// [`CliError::RequestTimeout`] if no answer arrives in time, and
    /// [`CliError::Connection`] if the session is gone.
    pub async fn call(&self, request: BridgeRequest) -> Result<BridgeResponse, CliError> {
        let request_type = request.request_type();
        let cluster = request.cluster();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply_tx, reply_rx) = oneshot::channel();

        self.adaptor.register(id, reply_tx)?;

        trace!(id, request_type, cluster = ?cluster, "sending request");
        if self
            .outbound
            .send(RequestEnvelope::new(id, request))
            .await
            .is_err()
        {
            self.adaptor.forget(id);
            return Err(CliError::Connection("session pump has stopped".into()));
        }

        let response = match timeout(self.request_timeout, reply_rx).await {
            Ok(Ok(result)) => result?,
            Ok(Err(_)) => return Err(CliError::Connection("session closed".into())),
            Err(_) => {
                self.adaptor.forget(id);
                return Err(CliError::RequestTimeout(format!(
                    "request '{request_type}' timed out"
                )));
            }
        };

        trace!(id, request_type, cluster = ?cluster, "received response");
        match response {
            BridgeResponse::Error { code, message } => Err(CliError::Remote { code, message }),
            other => Ok(other),
        }
    }

    /// Tear the session down: signal, deactivate, join.
    pub async fn close(mut self) {
        self.shutdown.cancel();
        self.adaptor.deactivate();
        if let Some(pump) = self.pump.take() {
            if let Err(e) = pump.await {
                warn!(error = %e, "session pump ended abnormally");
            }
        }
        debug!(endpoint = %self.endpoint, "session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.pump.is_some() {
            debug!(endpoint = %self.endpoint, "session dropped without close");
            self.shutdown.cancel();
            self.adaptor.deactivate();
        }
    }
}

async fn handshake(ws: &mut BridgeSocket, request_timeout: Duration) -> Result<String, CliError> {
    let hello = RequestEnvelope::new(
        HELLO_REQUEST_ID,
        BridgeRequest::hello(env!("CARGO_PKG_VERSION")),
    );
    ws.send(Message::Text(hello.to_json()?))
        .await
        .map_err(|e| CliError::Connection(e.to_string()))?;

    loop {
        let frame = timeout(request_timeout, ws.next())
            .await
            .map_err(|_| CliError::RequestTimeout("request 'hello' timed out".into()))?
            .ok_or_else(|| CliError::Connection("connection closed".into()))?
            .map_err(|e| CliError::Connection(e.to_string()))?;

        let text = match frame {
            Message::Text(text) => text,
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(_) => {
                return Err(CliError::Connection("connection closed by bridge".into()));
            }
            _ => return Err(CliError::Protocol("unexpected message type".into())),
        };

        let envelope = ResponseEnvelope::from_json(&text)?;
        return match envelope.response {
            BridgeResponse::Welcome {
                server_version,
                protocol_version,
            } => {
                if protocol_version != BRIDGE_PROTOCOL_VERSION {
                    warn!(
                        server = protocol_version,
                        client = BRIDGE_PROTOCOL_VERSION,
                        "protocol version mismatch"
                    );
                }
                Ok(server_version)
            }
            BridgeResponse::Error { code, message } => Err(CliError::Remote { code, message }),
            other => Err(CliError::Protocol(format!(
                "unexpected response to hello: {other:?}"
            ))),
        };
    }
}

/// Moves requests to the socket and responses to their callers until
/// shutdown, socket close or socket error.
async fn run_pump(
    mut ws: BridgeSocket,
    mut outbound: mpsc::Receiver<RequestEnvelope>,
    adaptor: Arc<RequestAdaptor>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                if let Err(e) = ws.close(None).await {
                    debug!(error = %e, "close handshake failed");
                }
                break;
            }
            Some(envelope) = outbound.recv() => {
                let id = envelope.id;
                let json = match envelope.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        adaptor.complete(id, Err(e.into()));
                        continue;
                    }
                };
                if let Err(e) = ws.send(Message::Text(json)).await {
                    warn!(error = %e, "failed to send request");
                    adaptor.complete(id, Err(CliError::Connection(e.to_string())));
                    break;
                }
            }
            frame = ws.next() => match frame {
                Some(Ok(Message::Text(text))) => match ResponseEnvelope::from_json(&text) {
                    Ok(envelope) => adaptor.complete(envelope.id, Ok(envelope.response)),
                    Err(e) => warn!(error = %e, "discarding undecodable frame"),
                },
                Some(Ok(Message::Close(_))) | None => {
                    debug!("bridge closed the connection");
                    break;
                }
                Some(Ok(Message::Binary(_))) => warn!("discarding unexpected binary frame"),
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "bridge connection failed");
                    break;
                }
            },
        }
    }

    adaptor.shut_down("connection to bridge lost");
    trace!("session pump stopped");
}
