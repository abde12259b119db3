//! HTTP API Server
//!
//! Exactly five endpoints: `GET /`, `GET /heartbeat`, `POST /new_node`,
//! `POST /vote`, and `POST /new_master`. Anything else falls through to
//! axum's default 404.

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};

use crate::network::{GREETING, PONG};
use crate::node::{JoinRequestOutcome, Node};
use crate::peer::PeerDto;
use crate::state::VoteMessage;

/// Shared application state for the inbound API.
pub struct AppState {
    pub node: Arc<Node>,
}

pub struct HttpServer {
    state: Arc<AppState>,
}

impl HttpServer {
    pub fn new(node: Arc<Node>) -> Self {
        Self {
            state: Arc::new(AppState { node }),
        }
    }

    fn router(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/", get(handle_root))
            .route("/heartbeat", get(handle_heartbeat))
            .route("/new_node", post(handle_new_node))
            .route("/vote", post(handle_vote))
            .route("/new_master", post(handle_new_master))
            .with_state(state)
    }

    /// Serve on an already-bound listener. Binding is done by the caller so
    /// startup failures can be reported with a clear address, as in
    /// `crate::main`.
    pub async fn serve(self, listener: tokio::net::TcpListener) -> std::io::Result<()> {
        let app = Self::router(self.state);
        axum::serve(listener, app).await
    }
}

async fn handle_root() -> &'static str {
    GREETING
}

async fn handle_heartbeat() -> &'static str {
    PONG
}

async fn handle_new_node(
    State(state): State<Arc<AppState>>,
    Json(dto): Json<PeerDto>,
) -> impl IntoResponse {
    match state.node.handle_join_request(dto).await {
        JoinRequestOutcome::NoMaster => {
            (StatusCode::SERVICE_UNAVAILABLE, "Service temporarily unavailable.").into_response()
        }
        JoinRequestOutcome::Duplicate => {
            (StatusCode::SERVICE_UNAVAILABLE, "Duplicate ID detected.").into_response()
        }
        JoinRequestOutcome::Accepted { is_master: true } => {
            (StatusCode::OK, "master").into_response()
        }
        JoinRequestOutcome::Accepted { is_master: false } => {
            (StatusCode::OK, "not master").into_response()
        }
    }
}

async fn handle_vote(
    State(state): State<Arc<AppState>>,
    Json(msg): Json<VoteMessage>,
) -> impl IntoResponse {
    // Detached: the caller gets an immediate 200 and the relay happens
    // afterwards, so the ring never deadlocks waiting on its own reply.
    let node = Arc::clone(&state.node);
    tokio::spawn(async move {
        node.handle_vote(msg).await;
    });
    StatusCode::OK
}

async fn handle_new_master(
    State(state): State<Arc<AppState>>,
    Json(dto): Json<PeerDto>,
) -> impl IntoResponse {
    state.node.handle_master_announcement(dto).await;
    StatusCode::OK
}
