//! JSON HTTP API over a running explorer.
//!
//! Front-ends poll `/api/graph`, `/api/search`, and `/api/toasts` and post
//! user intents (toggle, add root, search keystrokes). All mutation goes
//! through the [`ExplorerHandle`], so requests never touch the graph
//! directly.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::HttpWikiApi;
use crate::config::schema::ExplorerConfig;
use crate::error::{Result, WikiGraphError};
use crate::explorer::{Explorer, ExplorerHandle, ExplorerOptions, SearchPanel};
use crate::notify::ToastBoard;
use crate::title::{article_url, normalize_title};
use crate::types::{GraphAction, Link, Node};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

pub struct ServerState {
    pub explorer: ExplorerHandle,
    pub toasts: ToastBoard,
}

// ---------------------------------------------------------------------------
// JSON request/response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct GraphJson {
    layout: String,
    loading: bool,
    nodes: Vec<Node>,
    links: Vec<Link>,
}

#[derive(Serialize)]
struct NodeDetailJson {
    node: Node,
    url: String,
    outgoing: Vec<Link>,
    incoming: Vec<Link>,
}

#[derive(Deserialize)]
struct RootRequest {
    title: String,
}

#[derive(Serialize)]
struct RootJson {
    id: String,
    created: bool,
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
}

#[derive(Serialize)]
struct SelectJson {
    selected: Option<String>,
}

fn error_json(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

fn explorer_error(err: WikiGraphError) -> Response {
    match err {
        WikiGraphError::QueueFull { .. } => error_json(StatusCode::TOO_MANY_REQUESTS, err.to_string()),
        WikiGraphError::NodeNotFound(_) => error_json(StatusCode::NOT_FOUND, err.to_string()),
        other => error_json(StatusCode::SERVICE_UNAVAILABLE, other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_graph(State(state): State<Arc<ServerState>>) -> Json<GraphJson> {
    let snapshot = state.explorer.graph();
    Json(GraphJson {
        layout: state.explorer.layout().to_string(),
        loading: state.explorer.view().loading,
        nodes: snapshot.nodes,
        links: snapshot.links,
    })
}

async fn get_node_detail(
    State(state): State<Arc<ServerState>>,
    Path(node_id): Path<String>,
) -> Response {
    let snapshot = state.explorer.graph();
    let Some(node) = snapshot.node(&node_id).cloned() else {
        return error_json(StatusCode::NOT_FOUND, "node not found");
    };
    let outgoing = snapshot
        .links
        .iter()
        .filter(|l| l.source == node_id)
        .cloned()
        .collect();
    let incoming = snapshot
        .links
        .iter()
        .filter(|l| l.target == node_id)
        .cloned()
        .collect();
    let url = article_url(&node.display_title);
    Json(NodeDetailJson {
        node,
        url,
        outgoing,
        incoming,
    })
    .into_response()
}

async fn toggle_node(
    State(state): State<Arc<ServerState>>,
    Path(node_id): Path<String>,
) -> Response {
    match state.explorer.toggle(&node_id).await {
        Ok(action) => (StatusCode::ACCEPTED, Json::<GraphAction>(action)).into_response(),
        Err(err) => explorer_error(err),
    }
}

async fn add_root(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<RootRequest>,
) -> Response {
    if body.title.trim().is_empty() {
        return error_json(StatusCode::BAD_REQUEST, "title is empty");
    }
    match state.explorer.add_root(&body.title).await {
        Ok(created) => {
            let status = if created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            let id = normalize_title(&body.title);
            (status, Json(RootJson { id, created })).into_response()
        }
        Err(err) => explorer_error(err),
    }
}

async fn submit_search(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<SearchRequest>,
) -> Response {
    match state.explorer.submit_search(&body.query).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(err) => explorer_error(err),
    }
}

async fn get_search(State(state): State<Arc<ServerState>>) -> Json<SearchPanel> {
    Json(state.explorer.search_panel())
}

async fn select_first(State(state): State<Arc<ServerState>>) -> Response {
    match state.explorer.select_first().await {
        Ok(selected) => Json(SelectJson { selected }).into_response(),
        Err(err) => explorer_error(err),
    }
}

async fn clear_graph(State(state): State<Arc<ServerState>>) -> Response {
    match state.explorer.clear().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => explorer_error(err),
    }
}

async fn load_demo(State(state): State<Arc<ServerState>>) -> Response {
    match state.explorer.load_demo().await {
        Ok(()) => get_graph(State(state)).await.into_response(),
        Err(err) => explorer_error(err),
    }
}

async fn get_toasts(State(state): State<Arc<ServerState>>) -> Response {
    Json(state.toasts.active()).into_response()
}

async fn dismiss_toast(
    State(state): State<Arc<ServerState>>,
    Path(toast_id): Path<String>,
) -> StatusCode {
    if state.toasts.dismiss(&toast_id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn get_stats(State(state): State<Arc<ServerState>>) -> Json<serde_json::Value> {
    let view = state.explorer.view();
    let pending = state.explorer.pending_actions();
    Json(serde_json::json!({
        "graph": view.stats,
        "loading": view.loading,
        "queue": pending,
        "metrics": state.explorer.metrics().to_json(),
    }))
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Build the API Router (extracted for testability).
pub fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/api/graph", get(get_graph))
        .route("/api/node/{id}", get(get_node_detail))
        .route("/api/node/{id}/toggle", post(toggle_node))
        .route("/api/roots", post(add_root))
        .route("/api/search", get(get_search).post(submit_search))
        .route("/api/search/select", post(select_first))
        .route("/api/clear", post(clear_graph))
        .route("/api/demo", post(load_demo))
        .route("/api/toasts", get(get_toasts))
        .route("/api/toasts/{id}", delete(dismiss_toast))
        .route("/api/stats", get(get_stats))
        .with_state(state)
}

/// Start the explorer and serve the JSON API on `addr` until Ctrl-C.
pub async fn run_server(config: &ExplorerConfig, addr: SocketAddr, demo: bool) -> Result<()> {
    let api = Arc::new(HttpWikiApi::from_config(&config.api)?);
    let toasts = ToastBoard::new();
    let explorer = Explorer::new(api, Arc::new(toasts.clone()), ExplorerOptions::from(config))
        .with_demo(demo)
        .spawn();
    let app = build_router(Arc::new(ServerState { explorer, toasts }));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(backend = %config.api.base_url, "wikigraph API: http://{}", addr);
    eprintln!("wikigraph API: http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down wikigraph API");
            eprintln!("\nShutting down wikigraph API");
        })
        .await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
