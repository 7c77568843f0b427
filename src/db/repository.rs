use chrono::NaiveDateTime;
use rusqlite::{params, Connection, ErrorCode};

use super::DatabaseError;
use crate::models::UserRecord;

// ═══════════════════════════════════════════
// User Repository
// ═══════════════════════════════════════════

/// Insert a new user row. A duplicate username surfaces as
/// `DatabaseError::ConstraintViolation` carrying the username.
pub fn insert_user(
    conn: &Connection,
    username: &str,
    password_hash: &str,
) -> Result<(), DatabaseError> {
    let result = conn.execute(
        "INSERT INTO users (username, password, created_at) VALUES (?1, ?2, datetime('now'))",
        params![username, password_hash],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
            Err(DatabaseError::ConstraintViolation(username.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn get_user(conn: &Connection, username: &str) -> Result<Option<UserRecord>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT username, password, created_at FROM users WHERE username = ?1")?;

    let result = stmt.query_row(params![username], |row| {
        Ok(UserRecord {
            username: row.get::<_, String>(0)?,
            password_hash: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            created_at: row
                .get::<_, Option<String>>(2)?
                .and_then(|s| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").ok()),
        })
    });

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Replace a user's stored hash (legacy record upgrade).
pub fn update_password_hash(
    conn: &Connection,
    username: &str,
    password_hash: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE users SET password = ?2 WHERE username = ?1",
        params![username, password_hash],
    )?;
    Ok(())
}

pub fn count_users(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get::<_, i64>(0))?;
    Ok(count)
}
