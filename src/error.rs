//! Error types for reg-intake.

use std::time::Duration;

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Export failed: {0}")]
    Export(String),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

/// How a delivery attempt failed, as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryErrorKind {
    /// The transport asked us to back off; `retry_after` carries the wait.
    RateLimited,
    /// The bot lacks rights in the target chat (kicked, blocked, restricted).
    Forbidden,
    /// The request itself was rejected (bad chat id, malformed text).
    BadRequest,
    /// Network failures and anything the transport did not classify.
    Other,
}

impl std::fmt::Display for DeliveryErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::RateLimited => "rate_limited",
            Self::Forbidden => "forbidden",
            Self::BadRequest => "bad_request",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// A failed message delivery, tagged by kind.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct DeliveryError {
    pub kind: DeliveryErrorKind,
    pub retry_after: Option<Duration>,
    pub message: String,
}

impl DeliveryError {
    pub fn rate_limited(retry_after: Duration, message: impl Into<String>) -> Self {
        Self {
            kind: DeliveryErrorKind::RateLimited,
            retry_after: Some(retry_after),
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::of_kind(DeliveryErrorKind::Forbidden, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::of_kind(DeliveryErrorKind::BadRequest, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::of_kind(DeliveryErrorKind::Other, message)
    }

    fn of_kind(kind: DeliveryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            retry_after: None,
            message: message.into(),
        }
    }
}
