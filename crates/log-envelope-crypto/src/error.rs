//! Envelope errors.

use logsync_config_and_utils::FailureKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("Envelope delimiter not found")]
    MissingDelimiter,

    #[error("Encrypted envelope is missing header field {0:?}")]
    MissingField(&'static str),

    #[error("Header field {field:?} is not valid base64")]
    InvalidBase64 { field: &'static str },

    #[error("Invalid public key id {0:?}")]
    InvalidKeyId(String),

    #[error("No private key for key id {key_id:?} at {path}")]
    KeyNotFound { key_id: String, path: PathBuf },

    #[error("Cannot load private key {key_id:?}: {reason}")]
    InvalidPrivateKey { key_id: String, reason: String },

    #[error("Key unwrap failed: {0}")]
    Unwrap(String),

    #[error("Unwrapped key has unsupported length {0}")]
    InvalidKeyLength(usize),

    #[error("Ciphertext length {0} is not a positive multiple of the block size")]
    InvalidCiphertextLength(usize),

    #[error("Decompression failed: {0}")]
    Decompress(String),

    #[error("Checksum mismatch: header {expected}, computed {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Encryption failed: {0}")]
    Seal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EnvelopeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            EnvelopeError::KeyNotFound { .. } => FailureKind::KeyNotFound,
            EnvelopeError::ChecksumMismatch { .. } => FailureKind::Integrity,
            _ => FailureKind::Format,
        }
    }
}

pub type EnvelopeResult<T> = Result<T, EnvelopeError>;
