//! Bot glue — command parsing, per-user workers and the dispatch loop.

pub mod commands;
pub mod export;
pub mod router;
pub mod worker;

pub use commands::{Submission, SubmissionParser};
pub use router::Registrar;
pub use worker::{BotDeps, UserWorker};
