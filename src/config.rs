//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Bot configuration, built once at startup and passed into each component.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram Bot API token.
    pub bot_token: SecretString,
    /// Chat that receives the summary of every completed registration.
    pub group_chat_id: i64,
    /// Admin user: may run `/export` and receives broadcasts that failed.
    pub admin_id: Option<i64>,
    /// Path to the registrations database.
    pub db_path: PathBuf,
    /// Workers idle for longer than this are pruned (their session is dropped).
    pub session_idle_timeout: Duration,
}

impl BotConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup (environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup("BOT_TOKEN")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("BOT_TOKEN".into()))?;

        let group_chat_id = lookup("GROUP_CHAT_ID")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("GROUP_CHAT_ID".into()))
            .and_then(|s| parse_i64("GROUP_CHAT_ID", &s))?;

        // ADMIN_ID=0 is the conventional "no admin" value.
        let admin_id = match lookup("ADMIN_ID").filter(|s| !s.trim().is_empty()) {
            Some(s) => Some(parse_i64("ADMIN_ID", &s)?).filter(|id| *id != 0),
            None => None,
        };

        let db_path = lookup("REG_INTAKE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/registrations.db"));

        let idle_secs: u64 = match lookup("REG_INTAKE_SESSION_IDLE_SECS") {
            Some(s) => s.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "REG_INTAKE_SESSION_IDLE_SECS".into(),
                message: format!("expected seconds, got {s:?}"),
            })?,
            None => 3600,
        };

        Ok(Self {
            bot_token: SecretString::from(bot_token),
            group_chat_id,
            admin_id,
            db_path,
            session_idle_timeout: Duration::from_secs(idle_secs),
        })
    }
}

fn parse_i64(key: &str, raw: &str) -> Result<i64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("expected an integer chat/user id, got {raw:?}"),
    })
}
