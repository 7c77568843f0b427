//! Credential store: registration and login over the `users` table.
//!
//! Holds the process's single SQLite connection behind a mutex and the
//! configured password hasher. Duplicate registrations and malformed input
//! are recoverable errors; bad credentials are simply "no match".

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use regex::Regex;
use rusqlite::Connection;
use thiserror::Error;

use crate::crypto::{PasswordHasher, Verification};
use crate::db::{self, DatabaseError};
use crate::models::UserRecord;

/// Longest accepted username.
pub const MAX_USERNAME_LENGTH: usize = 64;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Username already exists: {0}")]
    DuplicateUser(String),

    #[error("Invalid input: {0}")]
    Invalid(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Credential store lock poisoned")]
    LockPoisoned,
}

impl CredentialError {
    /// Whether the error is the user's to fix (shown inline, not a 500).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CredentialError::DuplicateUser(_) | CredentialError::Invalid(_))
    }
}

pub struct CredentialStore {
    conn: Mutex<Connection>,
    hasher: PasswordHasher,
    username_pattern: Regex,
}

impl CredentialStore {
    /// Open (or create) the on-disk store.
    pub fn open(path: &Path, hasher: PasswordHasher) -> Result<Self, CredentialError> {
        let conn = db::open_database(path)?;
        Self::with_connection(conn, hasher)
    }

    /// In-memory store (for testing).
    pub fn open_in_memory(hasher: PasswordHasher) -> Result<Self, CredentialError> {
        let conn = db::open_memory_database()?;
        Self::with_connection(conn, hasher)
    }

    pub fn with_connection(conn: Connection, hasher: PasswordHasher) -> Result<Self, CredentialError> {
        let username_pattern = Regex::new(r"^[A-Za-z0-9_.\-]+$")
            .map_err(|_| CredentialError::Invalid("username pattern"))?;
        Ok(Self {
            conn: Mutex::new(conn),
            hasher,
            username_pattern,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CredentialError> {
        self.conn.lock().map_err(|_| CredentialError::LockPoisoned)
    }

    /// Register a new user. Fails with `DuplicateUser` if the name is taken.
    pub fn create_user(&self, username: &str, password: &str) -> Result<(), CredentialError> {
        let username = self.validate(username, password)?;
        let password_hash = self.hasher.hash(password);

        let conn = self.lock()?;
        match db::insert_user(&conn, username, &password_hash) {
            Ok(()) => {
                tracing::info!(username, "User registered");
                Ok(())
            }
            Err(DatabaseError::ConstraintViolation(_)) => {
                tracing::info!(username, "Registration rejected: username taken");
                Err(CredentialError::DuplicateUser(username.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Return the user's record if `password` verifies, `None` otherwise.
    ///
    /// Legacy or under-strength hashes are re-hashed on a successful login.
    pub fn login_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, CredentialError> {
        let username = username.trim();
        // Released before hashing; only the rehash write re-locks.
        let found = {
            let conn = self.lock()?;
            db::get_user(&conn, username)?
        };

        let Some(mut user) = found else {
            tracing::info!(username, "Login failed: unknown user");
            return Ok(None);
        };

        let verification = self
            .hasher
            .verify(password, &user.password_hash)
            .unwrap_or_else(|e| {
                tracing::warn!(username, error = %e, "Stored credential unreadable");
                Verification::Mismatch
            });

        match verification {
            Verification::Mismatch => {
                tracing::info!(username, "Login failed: wrong password");
                Ok(None)
            }
            Verification::Match => {
                tracing::info!(username, created_at = ?user.created_at, "Login succeeded");
                Ok(Some(user))
            }
            Verification::MatchNeedsRehash => {
                let upgraded = self.hasher.hash(password);
                {
                    let conn = self.lock()?;
                    db::update_password_hash(&conn, username, &upgraded)?;
                }
                user.password_hash = upgraded;
                tracing::info!(username, "Login succeeded, password hash upgraded");
                Ok(Some(user))
            }
        }
    }

    pub fn user_count(&self) -> Result<i64, CredentialError> {
        let conn = self.lock()?;
        Ok(db::count_users(&conn)?)
    }

    fn validate<'a>(&self, username: &'a str, password: &str) -> Result<&'a str, CredentialError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(CredentialError::Invalid("username must not be empty"));
        }
        if username.chars().count() > MAX_USERNAME_LENGTH {
            return Err(CredentialError::Invalid("username is too long"));
        }
        if !self.username_pattern.is_match(username) {
            return Err(CredentialError::Invalid(
                "username may only contain letters, digits, '.', '_' and '-'",
            ));
        }
        if password.is_empty() {
            return Err(CredentialError::Invalid("password must not be empty"));
        }
        Ok(username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::make_hashes;

    fn test_store() -> CredentialStore {
        CredentialStore::open_in_memory(PasswordHasher::new(1_000)).unwrap()
    }

    #[test]
    fn register_then_login() {
        let store = test_store();
        store.create_user("alice", "secret123").unwrap();

        let user = store.login_user("alice", "secret123").unwrap();
        assert_eq!(user.map(|u| u.username), Some("alice".to_string()));
        assert!(store.login_user("alice", "wrongpass").unwrap().is_none());
    }

    #[test]
    fn unknown_user_gets_nothing() {
        let store = test_store();
        assert!(store.login_user("ghost", "secret123").unwrap().is_none());
    }

    #[test]
    fn password_is_not_stored_in_plaintext() {
        let store = test_store();
        store.create_user("alice", "secret123").unwrap();
        let conn = store.lock().unwrap();
        let user = db::get_user(&conn, "alice").unwrap().unwrap();
        assert_ne!(user.password_hash, "secret123");
        assert_ne!(user.password_hash, make_hashes("secret123"));
    }

    #[test]
    fn duplicate_registration_is_recoverable() {
        let store = test_store();
        store.create_user("alice", "secret123").unwrap();

        let err = store.create_user("alice", "other").unwrap_err();
        assert!(matches!(err, CredentialError::DuplicateUser(ref u) if u == "alice"));
        assert!(err.is_recoverable());

        // First registration still wins
        assert!(store.login_user("alice", "secret123").unwrap().is_some());
        assert!(store.login_user("alice", "other").unwrap().is_none());
        assert_eq!(store.user_count().unwrap(), 1);
    }

    #[test]
    fn invalid_input_rejected() {
        let store = test_store();
        assert!(matches!(
            store.create_user("   ", "pw"),
            Err(CredentialError::Invalid(_))
        ));
        assert!(matches!(
            store.create_user("alice", ""),
            Err(CredentialError::Invalid(_))
        ));
        assert!(matches!(
            store.create_user("al ice", "pw"),
            Err(CredentialError::Invalid(_))
        ));
        let long = "a".repeat(MAX_USERNAME_LENGTH + 1);
        assert!(matches!(
            store.create_user(&long, "pw"),
            Err(CredentialError::Invalid(_))
        ));
        assert_eq!(store.user_count().unwrap(), 0);
    }

    #[test]
    fn username_is_trimmed() {
        let store = test_store();
        store.create_user("  bob ", "pw").unwrap();
        assert!(store.login_user("bob", "pw").unwrap().is_some());
    }

    #[test]
    fn legacy_record_logs_in_and_is_upgraded() {
        let store = test_store();
        {
            let conn = store.lock().unwrap();
            db::insert_user(&conn, "carol", &make_hashes("hunter2")).unwrap();
        }

        let user = store.login_user("carol", "hunter2").unwrap().unwrap();
        assert!(user.password_hash.starts_with("pbkdf2-sha256$"));

        // Upgraded record still verifies
        assert!(store.login_user("carol", "hunter2").unwrap().is_some());
        assert!(store.login_user("carol", "hunter3").unwrap().is_none());
    }

    #[test]
    fn unreadable_stored_hash_is_a_failed_login() {
        let store = test_store();
        {
            let conn = store.lock().unwrap();
            db::insert_user(&conn, "erin", "garbage").unwrap();
        }
        assert!(store.login_user("erin", "garbage").unwrap().is_none());
    }

    #[test]
    fn connection_is_free_while_password_verifies() {
        let store = CredentialStore::open_in_memory(PasswordHasher::new(100_000)).unwrap();
        store.create_user("frank", "pw").unwrap();

        let acquired = std::thread::scope(|scope| {
            let login = scope.spawn(|| store.login_user("frank", "pw"));
            let mut acquired = 0;
            while !login.is_finished() {
                if store.conn.try_lock().is_ok() {
                    acquired += 1;
                }
                std::thread::sleep(std::time::Duration::from_millis(1));
            }
            assert!(login.join().unwrap().unwrap().is_some());
            acquired
        });
        assert!(acquired > 0);
    }

    #[test]
    fn store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.db");
        {
            let store = CredentialStore::open(&path, PasswordHasher::new(1_000)).unwrap();
            store.create_user("dave", "pw").unwrap();
        }
        let store = CredentialStore::open(&path, PasswordHasher::new(1_000)).unwrap();
        assert!(store.login_user("dave", "pw").unwrap().is_some());
    }
}
