//! Reg Intake — conversational event-registration bot.

pub mod bot;
pub mod channels;
pub mod config;
pub mod error;
pub mod intake;
pub mod notify;
pub mod store;
