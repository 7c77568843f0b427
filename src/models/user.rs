use chrono::NaiveDateTime;

/// A registered account. `password_hash` is either a PBKDF2 record or a
/// legacy unsalted SHA-256 hex digest awaiting upgrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    pub password_hash: String,
    /// `None` for rows adopted from a legacy table without timestamps.
    pub created_at: Option<NaiveDateTime>,
}
