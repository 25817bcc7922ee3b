// src/server/mod.rs

//! Local dev server over the output tree.
//!
//! - Static files are served with `tower-http`'s `ServeDir`.
//! - HTML pages get the reload client injected.
//! - `GET /__assetpipe/reload` is a server-sent-events stream fed by the
//!   [`ReloadNotifier`].

pub mod inject;
pub mod notifier;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::{Request, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

pub use inject::{RELOAD_CLIENT, RELOAD_ENDPOINT, inject_reload_client};
pub use notifier::{ReloadKind, ReloadNotifier};

#[derive(Debug, Clone)]
struct ServerState {
    root: Arc<PathBuf>,
    notifier: ReloadNotifier,
}

/// Build the dev server router over `root`.
pub fn router(root: impl Into<PathBuf>, notifier: ReloadNotifier) -> Router {
    let state = ServerState {
        root: Arc::new(root.into()),
        notifier,
    };

    Router::new()
        .route(RELOAD_ENDPOINT, get(reload_events))
        .fallback(serve_asset)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until the process exits.
pub async fn serve(addr: SocketAddr, root: PathBuf, notifier: ReloadNotifier) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding dev server to {addr}"))?;
    info!(address = %addr, root = ?root, "dev server listening on http://{addr}");

    axum::serve(listener, router(root, notifier))
        .await
        .context("dev server stopped")
}

/// Resolve `host:port` to the first socket address it names.
pub async fn resolve_addr(host: &str, port: u16) -> Result<SocketAddr> {
    tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("resolving dev server address {host}:{port}"))?
        .next()
        .with_context(|| format!("no address found for {host}:{port}"))
}

async fn reload_events(
    State(state): State<ServerState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.notifier.subscribe();
    debug!(clients = state.notifier.client_count(), "reload client connected");

    // A lagged receiver missed notifications; a full reload covers them.
    let stream = BroadcastStream::new(rx).map(|msg| {
        let kind = msg.unwrap_or(ReloadKind::Reload);
        Ok(Event::default().event(kind.event_name()).data(kind.event_name()))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn serve_asset(State(state): State<ServerState>, req: Request) -> Response {
    if let Some(page) = html_target(&state.root, req.uri().path()) {
        if let Ok(body) = tokio::fs::read_to_string(&page).await {
            return Html(inject_reload_client(&body)).into_response();
        }
    }

    match ServeDir::new(state.root.as_path()).oneshot(req).await {
        Ok(res) => res.into_response(),
        Err(never) => match never {},
    }
}

/// Map a request path to an HTML file under `root`, if it names one.
///
/// Directory paths resolve to their `index.html`. Paths with `..` or other
/// non-normal components are rejected.
fn html_target(root: &Path, uri_path: &str) -> Option<PathBuf> {
    let trimmed = uri_path.trim_start_matches('/');
    let rel = Path::new(trimmed);
    if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
        return None;
    }

    let candidate = root.join(rel);
    if trimmed.is_empty() || uri_path.ends_with('/') || candidate.is_dir() {
        return Some(candidate.join("index.html"));
    }
    crate::fs::has_extension(&candidate, "html").then_some(candidate)
}
