use std::path::Path;

use rusqlite::Connection;

use super::DatabaseError;

/// Open (or create) the credential database at `path` and run migrations.
///
/// The parent directory is created if it does not exist yet.
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing)
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

fn configure_pragmas(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "PRAGMA journal_mode=DELETE;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}

/// Run all pending migrations.
///
/// A database created by an earlier tool without `schema_version` but with
/// a `users(username, password)` table is adopted as-is: the `CREATE TABLE
/// IF NOT EXISTS` in migration 1 leaves the existing table untouched.
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current_version = get_current_version(conn);

    let migrations: Vec<(i64, &str)> = vec![(
        1,
        include_str!("../../resources/migrations/001_users.sql"),
    )];

    for (version, sql) in migrations {
        if version > current_version {
            tracing::info!("Running migration v{version}");
            conn.execute_batch(sql).map_err(|e| DatabaseError::MigrationFailed {
                version,
                reason: e.to_string(),
            })?;
        }
    }

    adopt_legacy_users(conn)
}

/// Get the current schema version (0 if no schema exists yet)
fn get_current_version(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get::<_, Option<i64>>(0),
    )
    .ok()
    .flatten()
    .unwrap_or(0)
}

/// Give an adopted legacy `users` table the `created_at` column.
/// Existing rows keep a NULL timestamp.
fn adopt_legacy_users(conn: &Connection) -> Result<(), DatabaseError> {
    let has_created_at = conn
        .prepare("SELECT 1 FROM pragma_table_info('users') WHERE name = 'created_at'")?
        .exists([])?;
    if !has_created_at {
        tracing::info!("Adding created_at to legacy users table");
        conn.execute_batch("ALTER TABLE users ADD COLUMN created_at TEXT")?;
    }
    Ok(())
}
