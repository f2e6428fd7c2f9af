//! Registration data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether the participant has played any of the event's games before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamesAnswer {
    Yes,
    No,
    Unknown,
}

impl GamesAnswer {
    /// Canonical storage value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Unknown => "unknown",
        }
    }

    /// Ukrainian label shown to users and in the group summary.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Yes => "так",
            Self::No => "ні",
            Self::Unknown => "не знаю",
        }
    }
}

impl std::fmt::Display for GamesAnswer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GamesAnswer {
    type Err = String;

    /// Parses the canonical value, or the label older databases stored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yes" | "так" => Ok(Self::Yes),
            "no" | "ні" => Ok(Self::No),
            "unknown" | "не знаю" => Ok(Self::Unknown),
            other => Err(format!("unknown games answer: {other}")),
        }
    }
}

/// The four validated answers of a finished conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answers {
    pub first_name: String,
    pub last_name_or_nick: String,
    pub age: u8,
    pub games_answer: GamesAnswer,
}

/// A stored registration, one per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub user_id: i64,
    pub handle: Option<String>,
    pub first_name: String,
    pub last_name_or_nick: String,
    pub age: u8,
    /// Nullable in the schema; unreadable legacy values load as `None`.
    pub games_answer: Option<GamesAnswer>,
    pub updated_at: DateTime<Utc>,
}
