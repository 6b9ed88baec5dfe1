//! Upload access key.
//!
//! Uploads must carry the server's access key in the `X-Tempdrop-Key`
//! header. Downloads are open to anyone who knows a storage key.

use std::fmt;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use rand::RngCore;
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;

use super::audit::{AuditEvent, log_audit_event};
use super::{AppError, SharedState};
use crate::constants;

/// Shared secret required for uploads.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessKey(String);

impl AccessKey {
    /// Generates a key from 16 bytes of OS randomness, rendered as 32
    /// lowercase hex characters.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; constants::ACCESS_KEY_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key in clear, for showing to the operator.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against a presented key.
    #[must_use]
    pub fn verify(&self, candidate: &str) -> bool {
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

impl fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessKey(<redacted>)")
    }
}

/// Middleware rejecting requests without the right access key.
pub(crate) async fn require_access_key(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = request
        .headers()
        .get(constants::ACCESS_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    let reason = match presented {
        None => Some("missing key"),
        Some(key) if !state.access_key.verify(key) => Some("invalid key"),
        Some(_) => None,
    };

    if let Some(reason) = reason {
        let remote_addr = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0);
        log_audit_event(AuditEvent::AuthFailure {
            remote_addr,
            reason,
        });
        return Err(AppError::Unauthorized(format!("Unauthorized: {reason}")));
    }

    Ok(next.run(request).await)
}
