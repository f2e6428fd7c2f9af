//! Registration intake — the five-step conversational flow.
//!
//! `/start` opens a session that asks for first name, last name or nickname,
//! age, and whether the participant has played the event's games. Each answer
//! is normalized and validated before the session advances; a rejected answer
//! re-prompts without touching the collected data. The finished answers are
//! handed back to the caller, which stores and announces them.

pub mod model;
pub mod prompts;
pub mod session;
pub mod state;
pub mod validate;

pub use model::{Answers, GamesAnswer, Registration};
pub use session::{Input, IntakeSession, Prompt, Transition};
pub use state::IntakeStep;
pub use validate::Rejection;
