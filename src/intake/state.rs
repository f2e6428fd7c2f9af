//! Intake steps — which question the user is answering.

/// The steps of the registration conversation, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeStep {
    Idle,
    AwaitingFirstName,
    AwaitingLastNameOrNick,
    AwaitingAge,
    AwaitingGamesAnswer,
}

impl std::fmt::Display for IntakeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::AwaitingFirstName => "awaiting_first_name",
            Self::AwaitingLastNameOrNick => "awaiting_last_name_or_nick",
            Self::AwaitingAge => "awaiting_age",
            Self::AwaitingGamesAnswer => "awaiting_games_answer",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_snake_case() {
        assert_eq!(IntakeStep::Idle.to_string(), "idle");
        assert_eq!(
            IntakeStep::AwaitingLastNameOrNick.to_string(),
            "awaiting_last_name_or_nick"
        );
    }
}
