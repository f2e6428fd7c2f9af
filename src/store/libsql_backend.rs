//! libSQL backend — async `RegistrationStore` implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::intake::model::{Answers, GamesAnswer, Registration};
use crate::store::migrations;
use crate::store::traits::RegistrationStore;

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
/// Every write is a single statement, so each upsert is atomic on its own.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db)?;
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        backend.init_schema().await?;
        Ok(backend)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    /// Get the connection.
    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Timestamp format written to `updated_at`: fixed width, so text order is
/// time order.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    // Try RFC 3339 first (our canonical write format)
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    // Try SQLite datetime() output with fractional seconds
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// Convert `Option<&str>` to libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

/// Map a libsql Row to a Registration.
///
/// Column order matches REGISTRATION_COLUMNS.
fn row_to_registration(row: &libsql::Row) -> Result<Registration, DatabaseError> {
    let user_id: i64 = row
        .get(0)
        .map_err(|e| DatabaseError::Query(format!("user_id: {e}")))?;
    let age: i64 = row
        .get(4)
        .map_err(|e| DatabaseError::Query(format!("age: {e}")))?;
    let games_str: Option<String> = row.get(5).ok();
    let updated_str: String = row.get(6).unwrap_or_default();

    Ok(Registration {
        user_id,
        handle: row.get(1).ok(),
        first_name: row
            .get(2)
            .map_err(|e| DatabaseError::Query(format!("first_name: {e}")))?,
        last_name_or_nick: row
            .get(3)
            .map_err(|e| DatabaseError::Query(format!("last_name_or_nick: {e}")))?,
        age: u8::try_from(age).map_err(|_| {
            DatabaseError::Query(format!("age {age} out of range for user {user_id}"))
        })?,
        games_answer: games_str.and_then(|s| s.parse::<GamesAnswer>().ok()),
        updated_at: parse_datetime(&updated_str),
    })
}

// ── Trait implementation ────────────────────────────────────────────

const REGISTRATION_COLUMNS: &str =
    "user_id, handle, first_name, last_name_or_nick, age, games_answer, updated_at";

#[async_trait]
impl RegistrationStore for LibSqlBackend {
    async fn init_schema(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    async fn upsert(
        &self,
        user_id: i64,
        handle: Option<&str>,
        answers: &Answers,
    ) -> Result<(), DatabaseError> {
        let conn = self.conn();
        let now = format_timestamp(Utc::now());

        conn.execute(
            "INSERT INTO registrations (user_id, handle, first_name, last_name_or_nick, age, games_answer, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (user_id) DO UPDATE SET
                handle = excluded.handle,
                first_name = excluded.first_name,
                last_name_or_nick = excluded.last_name_or_nick,
                age = excluded.age,
                games_answer = excluded.games_answer,
                updated_at = excluded.updated_at",
            params![
                user_id,
                opt_text(handle),
                answers.first_name.as_str(),
                answers.last_name_or_nick.as_str(),
                i64::from(answers.age),
                answers.games_answer.as_str(),
                now,
            ],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("upsert: {e}")))?;

        debug!(user_id, "Registration upserted");
        Ok(())
    }

    async fn get(&self, user_id: i64) -> Result<Option<Registration>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE user_id = ?1"),
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_registration(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get: {e}"))),
        }
    }

    async fn fetch_all(&self) -> Result<Vec<Registration>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {REGISTRATION_COLUMNS} FROM registrations ORDER BY updated_at DESC, user_id"
                ),
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("fetch_all: {e}")))?;

        let mut registrations = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("fetch_all: {e}")))?
        {
            registrations.push(row_to_registration(&row)?);
        }
        Ok(registrations)
    }

    async fn count(&self) -> Result<usize, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query("SELECT COUNT(*) FROM registrations", ())
            .await
            .map_err(|e| DatabaseError::Query(format!("count: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let count: i64 = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("count: {e}")))?;
                usize::try_from(count)
                    .map_err(|_| DatabaseError::Query(format!("count: negative value {count}")))
            }
            Ok(None) => Ok(0),
            Err(e) => Err(DatabaseError::Query(format!("count: {e}"))),
        }
    }
}
