//! Upload, download and health handlers.

use std::io::{Seek, SeekFrom};
use std::net::SocketAddr;

use axum::Json;
use axum::body::Body;
use axum::extract::multipart::Field;
use axum::extract::{ConnectInfo, Multipart, Path, Request, State};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::debug;

use super::audit::{AuditEvent, log_audit_event};
use super::{AppError, SharedState};
use crate::store::{StoreError, StoredObject, looks_like_traversal};

/// Multipart field carrying the file bytes.
const FILE_FIELD: &str = "file";

/// Multipart field carrying the TTL expression.
const DEADLINE_FIELD: &str = "deadline";

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// GET /health
pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Upload spooled to an anonymous temp file.
struct Spooled {
    file: std::fs::File,
    size: u64,
}

/// Streams a multipart field into a temp file, giving up as soon as it
/// grows past `max` bytes.
async fn spool_field(field: &mut Field<'_>, max: u64) -> Result<Spooled, AppError> {
    let tmp = tokio::task::spawn_blocking(tempfile::tempfile)
        .await
        .map_err(|e| AppError::Internal(format!("Spool task failed: {e}")))??;
    let mut out = tokio::fs::File::from_std(tmp);

    let mut size: u64 = 0;
    while let Some(chunk) = field.chunk().await? {
        size += chunk.len() as u64;
        if size > max {
            return Err(StoreError::TooLarge { size, max }.into());
        }
        out.write_all(&chunk).await?;
    }
    out.flush().await?;

    let mut file = out.into_std().await;
    file.seek(SeekFrom::Start(0))?;
    Ok(Spooled { file, size })
}

/// POST /api/v1/parts
///
/// Multipart form with a `file` field and a `deadline` field (e.g. `24h`).
pub(crate) async fn upload(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<StoredObject>, AppError> {
    let max = state.store.config().max_file_size_bytes;
    let mut spooled = None;
    let mut deadline = None;

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(FILE_FIELD) => spooled = Some(spool_field(&mut field, max).await?),
            Some(DEADLINE_FIELD) => deadline = Some(field.text().await?),
            other => debug!(field = ?other, "Ignoring unknown form field"),
        }
    }

    let Spooled { file, size } = spooled
        .ok_or_else(|| AppError::BadRequest(format!("Missing '{FILE_FIELD}' field")))?;
    let deadline = deadline.unwrap_or_default();

    let admission = state.store.admit_async(size, deadline).await?;
    let object = state.store.persist_async(admission, file).await?;

    Ok(Json(object))
}

/// GET /api/v1/part/{id}
pub(crate) async fn download(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    request: Request,
) -> Result<Response, AppError> {
    if looks_like_traversal(&id) {
        let remote_addr = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0);
        log_audit_event(AuditEvent::PathTraversalBlocked {
            id: id.clone(),
            remote_addr,
        });
    }

    let resolved = state.store.resolve_async(id).await?;
    debug!(key = %resolved.key, size = resolved.size, "Serving file");

    let response = ServeFile::new(&resolved.path)
        .oneshot(request)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to serve file: {e}")))?;

    Ok(response.map(Body::new).into_response())
}
