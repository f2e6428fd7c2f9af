//! Version-tracked database migrations for the libSQL backend.
//!
//! Each migration has a version number and SQL. `run_migrations()` checks
//! the current version and applies only the new ones sequentially.
//! On first run against a database written by the earlier bot (a
//! `registrations` table keyed by `tg_user_id`, no `_migrations` table), it
//! renames the columns in place and seeds V1 without re-creating the table.

use libsql::Connection;

use crate::error::DatabaseError;

/// A single migration step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. Add new versions to the end.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        sql: r#"
            CREATE TABLE IF NOT EXISTS registrations (
                user_id INTEGER PRIMARY KEY,
                handle TEXT,
                first_name TEXT NOT NULL,
                last_name_or_nick TEXT NOT NULL,
                age INTEGER NOT NULL,
                games_answer TEXT,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%S', 'now') || '.000000Z')
            );
            CREATE INDEX IF NOT EXISTS idx_registrations_updated_at ON registrations(updated_at);
        "#,
    },
    Migration {
        version: 2,
        name: "fixed_width_timestamps",
        sql: r#"
            UPDATE registrations
               SET updated_at = strftime('%Y-%m-%dT%H:%M:%S', updated_at) || '.000000Z'
             WHERE updated_at NOT LIKE '%T%';
        "#,
    },
    Migration {
        version: 3,
        name: "canonical_games_answers",
        sql: r#"
            UPDATE registrations
               SET games_answer = CASE games_answer
                   WHEN 'так' THEN 'yes'
                   WHEN 'ні' THEN 'no'
                   WHEN 'не знаю' THEN 'unknown'
                   ELSE games_answer
               END;
        "#,
    },
];

/// Run all pending migrations against the given connection.
///
/// Creates the `_migrations` table if it doesn't exist.
pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("Failed to create _migrations table: {e}")))?;

    let current_version = get_current_version(conn).await?;

    if current_version == 0 && legacy_table_exists(conn).await? {
        // Databases from before the games question lack games_answer.
        if !column_exists(conn, "registrations", "games_answer").await? {
            conn.execute("ALTER TABLE registrations ADD COLUMN games_answer TEXT", ())
                .await
                .map_err(|e| {
                    DatabaseError::Migration(format!("Failed to add games_answer column: {e}"))
                })?;
        }

        conn.execute_batch(
            "ALTER TABLE registrations RENAME COLUMN tg_user_id TO user_id;
             ALTER TABLE registrations RENAME COLUMN tg_username TO handle;
             CREATE INDEX IF NOT EXISTS idx_registrations_updated_at ON registrations(updated_at);",
        )
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to adopt legacy table: {e}")))?;

        seed_version(conn, 1, "initial_schema").await?;
        tracing::info!("Legacy registrations table detected — seeded migration V1");
        // Fall through to apply V2+ migrations
    }

    let current_version = get_current_version(conn).await?;
    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            conn.execute_batch(migration.sql).await.map_err(|e| {
                DatabaseError::Migration(format!(
                    "Migration V{} ({}) failed: {e}",
                    migration.version, migration.name
                ))
            })?;
            seed_version(conn, migration.version, migration.name).await?;
        }
    }

    let version = get_current_version(conn).await?;
    tracing::info!(version, "Database migrations complete");

    Ok(())
}

/// Get the highest applied migration version, or 0 if none.
async fn get_current_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to query migration version: {e}")))?;

    let row = rows
        .next()
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to read migration version: {e}")))?;

    match row {
        Some(row) => {
            let version: i64 = row.get(0).map_err(|e| {
                DatabaseError::Migration(format!("Failed to parse migration version: {e}"))
            })?;
            Ok(version)
        }
        None => Ok(0),
    }
}

/// Check for a `registrations` table still using the old column names.
async fn legacy_table_exists(conn: &Connection) -> Result<bool, DatabaseError> {
    column_exists(conn, "registrations", "tg_user_id").await
}

/// Whether `table` has a column named `column`.
async fn column_exists(
    conn: &Connection,
    table: &str,
    column: &str,
) -> Result<bool, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
            libsql::params![table, column],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("Failed to inspect {table}.{column}: {e}")))?;

    let row = rows
        .next()
        .await
        .map_err(|e| DatabaseError::Query(format!("Failed to inspect {table}.{column}: {e}")))?;

    match row {
        Some(row) => {
            let count: i64 = row.get(0).map_err(|e| {
                DatabaseError::Query(format!("Failed to inspect {table}.{column}: {e}"))
            })?;
            Ok(count > 0)
        }
        None => Ok(false),
    }
}

/// Insert a version record into `_migrations`.
async fn seed_version(conn: &Connection, version: i64, name: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR IGNORE INTO _migrations (version, name) VALUES (?1, ?2)",
        libsql::params![version, name],
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("Failed to record migration V{version}: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_conn() -> Connection {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .unwrap();
        db.connect().unwrap()
    }

    async fn query_string(conn: &Connection, sql: &str) -> Option<String> {
        let mut rows = conn.query(sql, ()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        row.get::<String>(0).ok()
    }

    #[tokio::test]
    async fn migrations_create_registrations_table() {
        let conn = test_conn().await;
        run_migrations(&conn).await.unwrap();

        for table in &["registrations", "_migrations"] {
            let mut rows = conn
                .query(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    libsql::params![*table],
                )
                .await
                .unwrap();
            let row = rows.next().await.unwrap().unwrap();
            let count: i64 = row.get(0).unwrap();
            assert_eq!(count, 1, "Table '{}' should exist", table);
        }
    }

    #[tokio::test]
    async fn migration_future_is_send() {
        fn assert_send<T: Send>(_: &T) {}

        let conn = test_conn().await;
        let fut = run_migrations(&conn);
        assert_send(&fut);
        fut.await.unwrap();
    }

    #[tokio::test]
    async fn column_exists_inspects_schema() {
        let conn = test_conn().await;
        run_migrations(&conn).await.unwrap();

        assert!(column_exists(&conn, "registrations", "games_answer").await.unwrap());
        assert!(!column_exists(&conn, "registrations", "tg_user_id").await.unwrap());
        assert!(!column_exists(&conn, "missing_table", "user_id").await.unwrap());
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let conn = test_conn().await;
        run_migrations(&conn).await.unwrap();
        run_migrations(&conn).await.unwrap();

        let version = get_current_version(&conn).await.unwrap();
        assert_eq!(version, MIGRATIONS.last().unwrap().version);
    }

    #[tokio::test]
    async fn legacy_table_is_adopted() {
        let conn = test_conn().await;
        // Shape of the earliest bot's table: no games_answer column yet.
        conn.execute_batch(
            "CREATE TABLE registrations (
                tg_user_id INTEGER PRIMARY KEY,
                tg_username TEXT,
                first_name TEXT NOT NULL,
                last_name_or_nick TEXT NOT NULL,
                age INTEGER NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            INSERT INTO registrations (tg_user_id, tg_username, first_name, last_name_or_nick, age, updated_at)
            VALUES (42, 'ann_s', 'Ann', 'Smith', 17, '2025-03-01 10:20:30');",
        )
        .await
        .unwrap();

        run_migrations(&conn).await.unwrap();

        let handle = query_string(
            &conn,
            "SELECT handle FROM registrations WHERE user_id = 42",
        )
        .await;
        assert_eq!(handle.as_deref(), Some("ann_s"));

        let updated = query_string(
            &conn,
            "SELECT updated_at FROM registrations WHERE user_id = 42",
        )
        .await;
        assert_eq!(updated.as_deref(), Some("2025-03-01T10:20:30.000000Z"));

        let games = query_string(
            &conn,
            "SELECT games_answer FROM registrations WHERE user_id = 42",
        )
        .await;
        assert_eq!(games, None);
    }

    #[tokio::test]
    async fn legacy_games_labels_become_canonical() {
        let conn = test_conn().await;
        conn.execute_batch(
            "CREATE TABLE registrations (
                tg_user_id INTEGER PRIMARY KEY,
                tg_username TEXT,
                first_name TEXT NOT NULL,
                last_name_or_nick TEXT NOT NULL,
                age INTEGER NOT NULL,
                games_answer TEXT,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            INSERT INTO registrations (tg_user_id, first_name, last_name_or_nick, age, games_answer)
            VALUES (1, 'A', 'Aa', 10, 'так'), (2, 'B', 'Bb', 20, 'ні'), (3, 'C', 'Cc', 30, 'не знаю');",
        )
        .await
        .unwrap();

        run_migrations(&conn).await.unwrap();

        for (id, expected) in [(1, "yes"), (2, "no"), (3, "unknown")] {
            let value = query_string(
                &conn,
                &format!("SELECT games_answer FROM registrations WHERE user_id = {id}"),
            )
            .await;
            assert_eq!(value.as_deref(), Some(expected));
        }
    }
}
