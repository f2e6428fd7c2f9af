//! Per-user conversation session.
//!
//! A session holds the current step together with the answers collected so
//! far. Each partial answer lives inside the step that needs it, so a session
//! can never reach the games question without a name, nickname and age.

use super::model::Answers;
use super::state::IntakeStep;
use super::validate::{
    Rejection, normalize_games_answer, parse_age, valid_name, valid_nick_or_last_name,
};

/// One turn of user input, after command parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    /// `/start`: begin (or restart) the registration.
    Start,
    /// `/cancel`: drop everything and go idle.
    Cancel,
    /// Free text, answering the current question.
    Text(&'a str),
}

/// What the session wants said to the user next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    AskFirstName,
    AskLastNameOrNick,
    AskAge,
    AskGamesAnswer,
    /// The answer was not accepted; ask again.
    Rejected(Rejection),
    Cancelled,
}

/// Result of feeding one input to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Text outside a registration; nothing to say.
    Ignored,
    Prompt(Prompt),
    /// All answers are in. The session keeps them until [`IntakeSession::finish`].
    Complete(Answers),
}

/// Conversation state with the partial answers it has accumulated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum Progress {
    #[default]
    Idle,
    AwaitingFirstName,
    AwaitingLastNameOrNick {
        first_name: String,
    },
    AwaitingAge {
        first_name: String,
        last_name_or_nick: String,
    },
    AwaitingGamesAnswer {
        first_name: String,
        last_name_or_nick: String,
        age: u8,
    },
}

/// One user's registration conversation.
#[derive(Debug, Clone, Default)]
pub struct IntakeSession {
    progress: Progress,
}

impl IntakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// The step the session is on.
    pub fn step(&self) -> IntakeStep {
        match self.progress {
            Progress::Idle => IntakeStep::Idle,
            Progress::AwaitingFirstName => IntakeStep::AwaitingFirstName,
            Progress::AwaitingLastNameOrNick { .. } => IntakeStep::AwaitingLastNameOrNick,
            Progress::AwaitingAge { .. } => IntakeStep::AwaitingAge,
            Progress::AwaitingGamesAnswer { .. } => IntakeStep::AwaitingGamesAnswer,
        }
    }

    /// Feed one input to the session.
    pub fn handle(&mut self, input: Input<'_>) -> Transition {
        match input {
            Input::Start => {
                self.progress = Progress::AwaitingFirstName;
                Transition::Prompt(Prompt::AskFirstName)
            }
            Input::Cancel => {
                self.progress = Progress::Idle;
                Transition::Prompt(Prompt::Cancelled)
            }
            Input::Text(text) => self.answer(text),
        }
    }

    /// Drop the collected answers once they are safely stored.
    pub fn finish(&mut self) {
        self.progress = Progress::Idle;
    }

    fn answer(&mut self, text: &str) -> Transition {
        let (next, prompt) = match &self.progress {
            Progress::Idle => return Transition::Ignored,

            Progress::AwaitingFirstName => match valid_name(text) {
                Ok(first_name) => (
                    Progress::AwaitingLastNameOrNick { first_name },
                    Prompt::AskLastNameOrNick,
                ),
                Err(rejection) => return Transition::Prompt(Prompt::Rejected(rejection)),
            },

            Progress::AwaitingLastNameOrNick { first_name } => match valid_nick_or_last_name(text)
            {
                Ok(last_name_or_nick) => (
                    Progress::AwaitingAge {
                        first_name: first_name.clone(),
                        last_name_or_nick,
                    },
                    Prompt::AskAge,
                ),
                Err(rejection) => return Transition::Prompt(Prompt::Rejected(rejection)),
            },

            Progress::AwaitingAge {
                first_name,
                last_name_or_nick,
            } => match parse_age(text) {
                Ok(age) => (
                    Progress::AwaitingGamesAnswer {
                        first_name: first_name.clone(),
                        last_name_or_nick: last_name_or_nick.clone(),
                        age,
                    },
                    Prompt::AskGamesAnswer,
                ),
                Err(rejection) => return Transition::Prompt(Prompt::Rejected(rejection)),
            },

            Progress::AwaitingGamesAnswer {
                first_name,
                last_name_or_nick,
                age,
            } => {
                return match normalize_games_answer(text) {
                    Ok(games_answer) => Transition::Complete(Answers {
                        first_name: first_name.clone(),
                        last_name_or_nick: last_name_or_nick.clone(),
                        age: *age,
                        games_answer,
                    }),
                    Err(rejection) => Transition::Prompt(Prompt::Rejected(rejection)),
                };
            }
        };

        self.progress = next;
        Transition::Prompt(prompt)
    }
}
