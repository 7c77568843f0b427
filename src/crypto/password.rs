//! Password hashing for the credential store.
//!
//! New records use PBKDF2-HMAC-SHA256 with a random per-record salt,
//! encoded as `pbkdf2-sha256$<iterations>$<salt b64>$<hash b64>`.
//! Records written by the earlier tool are bare lowercase SHA-256 hex
//! digests; they still verify and are flagged for upgrade.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::CryptoError;

pub const HASH_LENGTH: usize = 32;
pub const SALT_LENGTH: usize = 16;

const SCHEME: &str = "pbkdf2-sha256";
const LEGACY_HEX_LENGTH: usize = 64;

/// Unsalted SHA-256 hex digest of `password`.
///
/// Only used to recognize legacy records; never written for new users.
pub fn make_hashes(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Compare `password` against a legacy SHA-256 hex digest.
pub fn check_hashes(password: &str, hashed_text: &str) -> bool {
    make_hashes(password).as_bytes().ct_eq(hashed_text.as_bytes()).into()
}

/// Generate a cryptographically random salt
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// Outcome of checking a password against a stored hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Mismatch,
    Match,
    /// Matched a legacy or weaker record; caller should store a fresh hash.
    MatchNeedsRehash,
}

/// PBKDF2 password hasher with a fixed work factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Hash `password` with a fresh random salt.
    pub fn hash(&self, password: &str) -> String {
        self.hash_with_salt(password, &generate_salt())
    }

    fn hash_with_salt(&self, password: &str, salt: &[u8]) -> String {
        let key = derive(password, salt, self.iterations);
        format!(
            "{SCHEME}${}${}${}",
            self.iterations,
            STANDARD_NO_PAD.encode(salt),
            STANDARD_NO_PAD.encode(&key[..])
        )
    }

    /// Check `password` against `stored`, in constant time for the final comparison.
    pub fn verify(&self, password: &str, stored: &str) -> Result<Verification, CryptoError> {
        if is_legacy_hash(stored) {
            return Ok(if check_hashes(password, stored) {
                Verification::MatchNeedsRehash
            } else {
                Verification::Mismatch
            });
        }

        let parsed = ParsedHash::parse(stored)?;
        let key = derive(password, &parsed.salt, parsed.iterations);
        if !bool::from(key[..].ct_eq(&parsed.hash[..])) {
            return Ok(Verification::Mismatch);
        }

        if parsed.iterations < self.iterations {
            Ok(Verification::MatchNeedsRehash)
        } else {
            Ok(Verification::Match)
        }
    }
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> Zeroizing<[u8; HASH_LENGTH]> {
    let mut key = Zeroizing::new([0u8; HASH_LENGTH]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key[..]);
    key
}

/// A stored hash is legacy when it is exactly a 64-char hex digest.
pub fn is_legacy_hash(stored: &str) -> bool {
    stored.len() == LEGACY_HEX_LENGTH && stored.bytes().all(|b| b.is_ascii_hexdigit())
}

struct ParsedHash {
    iterations: u32,
    salt: Vec<u8>,
    hash: Vec<u8>,
}

impl ParsedHash {
    fn parse(stored: &str) -> Result<Self, CryptoError> {
        let mut parts = stored.split('$');
        if parts.next() != Some(SCHEME) {
            return Err(CryptoError::UnknownHashFormat);
        }

        let iterations = parts
            .next()
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .ok_or(CryptoError::CorruptedHash("iterations"))?;
        let salt = parts
            .next()
            .and_then(|s| STANDARD_NO_PAD.decode(s).ok())
            .ok_or(CryptoError::CorruptedHash("salt"))?;
        let hash = parts
            .next()
            .and_then(|s| STANDARD_NO_PAD.decode(s).ok())
            .filter(|h| h.len() == HASH_LENGTH)
            .ok_or(CryptoError::CorruptedHash("hash"))?;

        if parts.next().is_some() {
            return Err(CryptoError::CorruptedHash("trailing fields"));
        }

        Ok(Self {
            iterations,
            salt,
            hash,
        })
    }
}
