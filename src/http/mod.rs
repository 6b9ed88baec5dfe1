//! HTTP API.
//!
//! # Routes
//!
//! - `POST /api/v1/parts` - upload (multipart `file` + `deadline`), needs `X-Tempdrop-Key`
//! - `GET /api/v1/part/{id}` - download by storage key
//! - `GET /health` - liveness probe

pub mod audit;
mod auth;
mod error;
mod handlers;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub use auth::AccessKey;
pub use error::AppError;

use crate::store::ObjectStore;

/// State shared by all handlers.
#[derive(Debug)]
pub struct AppState {
    pub store: ObjectStore,
    pub access_key: AccessKey,
}

pub type SharedState = Arc<AppState>;

/// Builds the application router.
pub fn router(state: SharedState) -> Router {
    // The upload handler enforces the configured ceiling while spooling.
    let uploads = Router::new()
        .route("/api/v1/parts", post(handlers::upload))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_access_key,
        ))
        .layer(DefaultBodyLimit::disable());

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/part/{id}", get(handlers::download))
        .merge(uploads)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the API on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the server fails while accepting connections.
pub async fn serve<F>(listener: TcpListener, state: SharedState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")
}
