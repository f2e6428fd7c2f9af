//! `RegistrationStore` trait — async interface for registration persistence.

use async_trait::async_trait;

use crate::error::DatabaseError;
use crate::intake::model::{Answers, Registration};

/// Backend-agnostic registration storage.
///
/// Exactly one row per user id. Every write replaces the whole row and
/// refreshes `updated_at`; there is no history.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Run all pending schema migrations.
    async fn init_schema(&self) -> Result<(), DatabaseError>;

    /// Insert or fully overwrite the registration for `user_id`.
    async fn upsert(
        &self,
        user_id: i64,
        handle: Option<&str>,
        answers: &Answers,
    ) -> Result<(), DatabaseError>;

    /// Get one user's registration.
    async fn get(&self, user_id: i64) -> Result<Option<Registration>, DatabaseError>;

    /// All registrations, most recently updated first.
    async fn fetch_all(&self) -> Result<Vec<Registration>, DatabaseError>;

    /// Number of stored registrations.
    async fn count(&self) -> Result<usize, DatabaseError>;
}
