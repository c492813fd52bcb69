//! Peppermill error types

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PeppermillError {
    #[error("{0} is empty")]
    EmptyInput(&'static str),

    #[error("{field} is {len} bytes, limit is {max}")]
    InputTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("Key generation failed: {0}")]
    KeyGenerationFailure(String),

    #[error("Entropy unavailable")]
    EntropyUnavailable,

    #[error("Invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("Invalid hex encoding")]
    InvalidEncoding,

    #[error("Invalid password policy: {0}")]
    InvalidPolicy(String),

    #[error("Malformed password hash")]
    MalformedHash,

    #[error("Password hashing failed: {0}")]
    HashFailure(String),
}

pub type Result<T> = std::result::Result<T, PeppermillError>;
