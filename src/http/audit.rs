//! Security audit logging for HTTP events.
//!
//! Provides structured audit logging for security-relevant events like
//! rejected upload keys and download identifiers that try to leave the
//! storage directory.

use std::net::SocketAddr;
use tracing::warn;

/// Security audit events that should be logged for monitoring and alerting.
#[derive(Debug, Clone)]
pub enum AuditEvent {
    /// Upload attempted with a missing or wrong access key
    AuthFailure {
        remote_addr: Option<SocketAddr>,
        reason: &'static str,
    },
    /// Download identifier containing path components
    PathTraversalBlocked {
        id: String,
        remote_addr: Option<SocketAddr>,
    },
}

fn addr_field(addr: Option<SocketAddr>) -> String {
    addr.map_or_else(|| "unknown".to_string(), |a| a.to_string())
}

/// Log a security audit event with structured fields.
pub fn log_audit_event(event: AuditEvent) {
    match event {
        AuditEvent::AuthFailure {
            remote_addr,
            reason,
        } => {
            warn!(
                target: "audit",
                event_type = "auth_failure",
                remote_addr = %addr_field(remote_addr),
                reason,
                "Authentication failed"
            );
        },
        AuditEvent::PathTraversalBlocked { id, remote_addr } => {
            warn!(
                target: "audit",
                event_type = "path_traversal_blocked",
                %id,
                remote_addr = %addr_field(remote_addr),
                "Path traversal attempt blocked"
            );
        },
    }
}
