pub mod password;

pub use password::*;

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Unrecognized password hash format")]
    UnknownHashFormat,

    #[error("Corrupted password hash: {0}")]
    CorruptedHash(&'static str),
}
