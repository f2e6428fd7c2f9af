//! Submission types for the registration bot.
//!
//! Every inbound message is either one of the bot's commands or free text
//! answering the current question.

/// Parses message content into a Submission.
pub struct SubmissionParser;

impl SubmissionParser {
    /// Parse message content into a Submission.
    ///
    /// Commands are matched on the first word, case-insensitively, with an
    /// optional `@botname` suffix. Trailing arguments are ignored. Unknown
    /// slash commands fall through as user input.
    pub fn parse(content: &str) -> Submission {
        let trimmed = content.trim();
        let first_word = trimmed.split_whitespace().next().unwrap_or_default();
        let command = first_word
            .split_once('@')
            .map_or(first_word, |(cmd, _bot)| cmd)
            .to_lowercase();

        match command.as_str() {
            "/start" => Submission::Start,
            "/cancel" => Submission::Cancel,
            "/export" => Submission::Export,
            _ => Submission::UserInput {
                content: content.to_string(),
            },
        }
    }
}

/// A parsed inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Begin (or restart) a registration.
    Start,
    /// Abandon the registration in progress.
    Cancel,
    /// Admin-only CSV export.
    Export,
    /// Anything else.
    UserInput { content: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(SubmissionParser::parse("/start"), Submission::Start);
        assert_eq!(SubmissionParser::parse("/cancel"), Submission::Cancel);
        assert_eq!(SubmissionParser::parse("/export"), Submission::Export);
    }

    #[test]
    fn test_parse_is_case_insensitive_and_trims() {
        assert_eq!(SubmissionParser::parse("  /START  "), Submission::Start);
        assert_eq!(SubmissionParser::parse("/Cancel"), Submission::Cancel);
    }

    #[test]
    fn test_parse_bot_suffix_and_arguments() {
        assert_eq!(SubmissionParser::parse("/start@event_bot"), Submission::Start);
        assert_eq!(SubmissionParser::parse("/export@event_bot now"), Submission::Export);
        assert_eq!(SubmissionParser::parse("/start ref123"), Submission::Start);
    }

    #[test]
    fn test_parse_user_input() {
        let sub = SubmissionParser::parse("Ann");
        assert_eq!(
            sub,
            Submission::UserInput {
                content: "Ann".into()
            }
        );
    }

    #[test]
    fn test_unknown_command_is_user_input() {
        assert!(matches!(
            SubmissionParser::parse("/help"),
            Submission::UserInput { .. }
        ));
        // Not a command when it is not the first word.
        assert!(matches!(
            SubmissionParser::parse("please /start"),
            Submission::UserInput { .. }
        ));
    }

    #[test]
    fn test_empty_message_is_user_input() {
        assert!(matches!(
            SubmissionParser::parse("   "),
            Submission::UserInput { .. }
        ));
    }
}
