//! Security audit logging
//!
//! Authentication and ownership events are logged at INFO level with the
//! `audit` target, so they can be filtered and routed apart from regular
//! application logs (`RUST_LOG=audit=info`).
//!
//! Passwords, password hashes and tokens never appear in an event.

use axum::http::{header, HeaderMap};
use chrono::Utc;
use mt_core::{TransactionId, UserId};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Security audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    RegistrationSuccess {
        user_id: UserId,
        email: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    RegistrationFailure {
        email: String,
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    LoginSuccess {
        user_id: UserId,
        email: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// `reason` distinguishes unknown email from wrong password here only;
    /// the client always sees the same answer.
    LoginFailure {
        email: String,
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Protected request rejected by the identity middleware
    InvalidToken {
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Delete of a transaction that is missing or owned by someone else
    DeleteDenied {
        user_id: UserId,
        transaction_id: TransactionId,
        ip_address: Option<String>,
    },
}

impl AuditEvent {
    fn message(&self) -> &'static str {
        match self {
            AuditEvent::RegistrationSuccess { .. } => "Registration successful",
            AuditEvent::RegistrationFailure { .. } => "Registration failed",
            AuditEvent::LoginSuccess { .. } => "Login successful",
            AuditEvent::LoginFailure { .. } => "Login failed",
            AuditEvent::InvalidToken { .. } => "Invalid token",
            AuditEvent::DeleteDenied { .. } => "Transaction delete denied",
        }
    }

    fn ip_address(&self) -> Option<&str> {
        match self {
            AuditEvent::RegistrationSuccess { ip_address, .. }
            | AuditEvent::RegistrationFailure { ip_address, .. }
            | AuditEvent::LoginSuccess { ip_address, .. }
            | AuditEvent::LoginFailure { ip_address, .. }
            | AuditEvent::InvalidToken { ip_address, .. }
            | AuditEvent::DeleteDenied { ip_address, .. } => ip_address.as_deref(),
        }
    }
}

/// Log a security audit event
///
/// The whole event is attached as a JSON string under `event`, next to the
/// client address, so log aggregators can index either.
pub fn audit_log(event: &AuditEvent) {
    let timestamp = Utc::now();

    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    info!(
        target: "audit",
        timestamp = %timestamp,
        event = %event_json,
        ip_address = ?event.ip_address(),
        "{}",
        event.message()
    );
}

/// Client address from `X-Forwarded-For` (first hop) or `X-Real-IP`
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(first_ip) = headers
        .get("x-forwarded-for")
        .and_then(|xff| xff.to_str().ok())
        .and_then(|xff| xff.split(',').next())
    {
        return Some(first_ip.trim().to_string());
    }

    headers
        .get("x-real-ip")
        .and_then(|ip| ip.to_str().ok())
        .map(|ip| ip.to_string())
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|s| s.to_string())
}
