//! Error taxonomy shared by the client, the tool façade and the CLI
//!
//! Nothing in this crate retries on its own. `ErrorKind::is_retryable` tells a
//! caller which failures are safe to repeat.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum PriorError {
    /// Local config state is unreadable or corrupt. Recover by re-registering.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// First-use registration did not complete; nothing was persisted.
    #[error("auto-registration failed: {0}")]
    Registration(String),

    /// The server rejected the credentials.
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// The request payload is malformed and must be fixed by the caller.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Out of credits or throttled. `balance` is the server-reported balance.
    #[error("{message}{}", .balance.map(|b| format!(" (balance: {})", b)).unwrap_or_default())]
    RateLimitOrCredit {
        message: String,
        balance: Option<f64>,
    },

    /// The claim/verify handshake was rejected (expired or reused code, ...).
    #[error("verification failed: {0}")]
    Verification(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
}

/// Stable discriminant of [`PriorError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Config,
    Registration,
    Auth,
    Validation,
    RateLimitOrCredit,
    Verification,
    Transport,
    NotFound,
    Server,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Config => "config_error",
            ErrorKind::Registration => "registration_error",
            ErrorKind::Auth => "auth_error",
            ErrorKind::Validation => "validation_error",
            ErrorKind::RateLimitOrCredit => "rate_limit_or_credit_error",
            ErrorKind::Verification => "verification_error",
            ErrorKind::Transport => "transport_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Server => "server_error",
        }
    }

    /// Only network-level failures are safe for a caller to repeat blindly
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Transport)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PriorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PriorError::Config(_) => ErrorKind::Config,
            PriorError::Registration(_) => ErrorKind::Registration,
            PriorError::Auth(_) => ErrorKind::Auth,
            PriorError::Validation(_) => ErrorKind::Validation,
            PriorError::RateLimitOrCredit { .. } => ErrorKind::RateLimitOrCredit,
            PriorError::Verification(_) => ErrorKind::Verification,
            PriorError::Transport(_) => ErrorKind::Transport,
            PriorError::NotFound(_) => ErrorKind::NotFound,
            PriorError::Server { .. } => ErrorKind::Server,
        }
    }

    /// Short follow-up advice for a human, if there is one
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            PriorError::Config(_) => Some("run `prior config --reset` to register a fresh agent"),
            PriorError::Auth(_) => Some("check PRIOR_API_KEY or run `prior config --reset`"),
            PriorError::RateLimitOrCredit { .. } => {
                Some("give feedback on results you used to earn refunds")
            }
            PriorError::Transport(_) => Some("the request can be retried"),
            _ => None,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        PriorError::Validation(message.into())
    }
}
