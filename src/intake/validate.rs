//! Input normalization and per-step answer validation.

use std::sync::LazyLock;

use regex::Regex;

use super::model::GamesAnswer;

/// Letters (Latin, Cyrillic incl. Ukrainian), apostrophes, hyphen, space.
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-zА-Яа-яЁёІіЇїЄєҐґ'’\- ]{2,50}$").expect("valid name pattern")
});

pub const MIN_TEXT_LEN: usize = 2;
pub const MAX_TEXT_LEN: usize = 50;
pub const MIN_AGE: u8 = 5;
pub const MAX_AGE: u8 = 120;

/// Why an answer was not accepted. Each variant has its own re-prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("name must be 2-50 letters, apostrophes, hyphens or spaces")]
    InvalidName,

    #[error("last name or nickname must be 2-50 characters")]
    InvalidLength,

    #[error("age must be a number")]
    AgeNotANumber,

    #[error("age must be between 5 and 120")]
    AgeOutOfRange,

    #[error("answer must be yes, no or don't know")]
    UnrecognizedGamesAnswer,
}

/// Trim and collapse internal whitespace runs to a single space.
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First name: restricted character class, 2-50 characters.
pub fn valid_name(raw: &str) -> Result<String, Rejection> {
    let name = normalize(raw);
    if NAME_PATTERN.is_match(&name) {
        Ok(name)
    } else {
        Err(Rejection::InvalidName)
    }
}

/// Last name or nickname: any characters, 2-50 of them.
pub fn valid_nick_or_last_name(raw: &str) -> Result<String, Rejection> {
    let value = normalize(raw);
    let len = value.chars().count();
    if (MIN_TEXT_LEN..=MAX_TEXT_LEN).contains(&len) {
        Ok(value)
    } else {
        Err(Rejection::InvalidLength)
    }
}

/// Age: ASCII digits only, within [`MIN_AGE`, `MAX_AGE`].
pub fn parse_age(raw: &str) -> Result<u8, Rejection> {
    let text = normalize(raw);
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return Err(Rejection::AgeNotANumber);
    }

    // All digits, so a parse failure can only be overflow.
    let age: u32 = text.parse().map_err(|_| Rejection::AgeOutOfRange)?;
    match u8::try_from(age) {
        Ok(age) if (MIN_AGE..=MAX_AGE).contains(&age) => Ok(age),
        _ => Err(Rejection::AgeOutOfRange),
    }
}

/// Map a free-text reply onto the tri-state games answer.
pub fn normalize_games_answer(raw: &str) -> Result<GamesAnswer, Rejection> {
    let text = normalize(raw).to_lowercase().replace('ё', "е");
    match text.as_str() {
        "так" | "да" | "yes" | "y" => Ok(GamesAnswer::Yes),
        "ні" | "ни" | "нет" | "no" | "n" => Ok(GamesAnswer::No),
        "не знаю" | "незнаю" | "не знаю." | "не знаю!" | "не знаю?" => {
            Ok(GamesAnswer::Unknown)
        }
        _ => Err(Rejection::UnrecognizedGamesAnswer),
    }
}
