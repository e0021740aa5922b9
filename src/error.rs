//! Unified application error model and mapping helpers.
//! This module provides the common error enum used across the identity gate,
//! the account linker and store adapters, along with a helper mapper for the
//! transport layer sitting above this crate.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    /// Missing, malformed, expired or revoked credential. Never retried here;
    /// a rejected token is a client-correctable condition.
    Auth { code: String, message: String },
    /// Lookup miss surfaced as an error by the transport layer. Within this
    /// crate a miss is usually the normal `Ok(None)` outcome instead.
    NotFound { code: String, message: String },
    /// Store uniqueness violation (duplicate subject id or email). Inside
    /// `reconcile` this is a signal to re-enter the idempotent path, not a
    /// hard failure.
    Conflict { code: String, message: String },
    /// Transient I/O fault on the document store or provider. Safe to retry
    /// the whole call from the top.
    Io { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::Auth { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Conflict { code, .. }
            | AppError::Io { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Auth { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Conflict { message, .. }
            | AppError::Io { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn auth<S: Into<String>>(code: S, msg: S) -> Self { AppError::Auth { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn conflict<S: Into<String>>(code: S, msg: S) -> Self { AppError::Conflict { code: code.into(), message: msg.into() } }
    pub fn io<S: Into<String>>(code: S, msg: S) -> Self { AppError::Io { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// True for store uniqueness violations (the duplicate-key recovery path).
    pub fn is_conflict(&self) -> bool { matches!(self, AppError::Conflict { .. }) }

    pub fn is_auth(&self) -> bool { matches!(self, AppError::Auth { .. }) }

    /// Map to HTTP status code. The transport layer maps Auth to an
    /// access-denied response and everything else to a generic failure
    /// without leaking internal store diagnostics.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::Auth { .. } => 401,
            AppError::NotFound { .. } => 404,
            AppError::Conflict { .. } => 409,
            AppError::Io { .. } => 503,
            AppError::Internal { .. } => 500,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Default mapping: treat as Internal unless downcasted elsewhere
        AppError::Internal { code: "internal_error".into(), message: err.to_string() }
    }
}
