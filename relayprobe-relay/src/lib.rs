use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub mod config;
use config::{DEFAULT_ADDRESS, UNSUPPORTED_NOTICE};

/// Stub relay configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub address: SocketAddr,
    /// Pause before answering each subscription request.
    pub response_delay: Duration,
    /// Accept connections and read requests but never answer.
    pub silent: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self { address: DEFAULT_ADDRESS, response_delay: Duration::ZERO, silent: false }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    /// WebSocket connections accepted since startup.
    pub connections: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Self {
        Self { config: Arc::new(config), connections: Arc::new(AtomicU64::new(0)) }
    }

    pub fn connection_count(&self) -> u64 {
        self.connections.load(Ordering::Relaxed)
    }
}

/// Minimal relay that answers every subscription with end-of-stored-events.
pub struct Relay {
    state: AppState,
}

impl Relay {
    pub fn new(config: RelayConfig) -> Self {
        Self { state: AppState::new(config) }
    }

    /// Get the relay's configured address
    pub fn address(&self) -> SocketAddr {
        self.state.config.address
    }

    /// Shared state; clones observe the running relay.
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    pub fn create_router(state: AppState) -> Router {
        Router::new().route("/", get(handle_upgrade)).with_state(state)
    }

    /// Run the relay, signalling `ready_tx` with the bound address once accepting connections
    pub async fn run(self, ready_tx: tokio::sync::oneshot::Sender<SocketAddr>) -> Result<(), Box<dyn std::error::Error>> {
        let app = Self::create_router(self.state.clone());
        let listener = tokio::net::TcpListener::bind(self.state.config.address).await?;
        let local_addr = listener.local_addr()?;
        ready_tx.send(local_addr).ok();
        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Handler for GET / — upgrades to a WebSocket session.
pub async fn handle_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, state))
}

async fn serve_socket(mut socket: WebSocket, state: AppState) {
    let id = state.connections.fetch_add(1, Ordering::Relaxed) + 1;
    debug!(connection = id, "connection opened");

    while let Some(frame) = socket.recv().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            // After a Close frame the next recv flushes our reply and ends the stream.
            Ok(_) => continue,
            Err(_) => break,
        };
        if state.config.silent {
            continue;
        }
        let Some(reply) = reply_for(&text) else {
            continue;
        };
        if !state.config.response_delay.is_zero() {
            tokio::time::sleep(state.config.response_delay).await;
        }
        if socket.send(Message::Text(reply)).await.is_err() {
            break;
        }
    }
    debug!(connection = id, "connection closed");
}

/// Reply for one client text frame.
///
/// `["REQ", id, ...]` gets `["EOSE", id]`, `["CLOSE", ...]` gets nothing, and
/// anything else gets a NOTICE.
pub fn reply_for(text: &str) -> Option<String> {
    let parsed: Result<Vec<Value>, _> = serde_json::from_str(text);
    match parsed.as_deref() {
        Ok([Value::String(verb), Value::String(id), ..]) if verb == "REQ" => {
            Some(json!(["EOSE", id]).to_string())
        }
        Ok([Value::String(verb), ..]) if verb == "CLOSE" => None,
        _ => Some(json!(["NOTICE", UNSUPPORTED_NOTICE]).to_string()),
    }
}
