//! Private key lookup by `publicKeyId`.

use crate::{EnvelopeError, EnvelopeResult};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;
use std::io;
use std::path::PathBuf;

/// File name of the private key inside each key directory.
pub const PRIVATE_KEY_FILE_NAME: &str = "Private.key";

/// Resolves the private half of the key pair named in an envelope header.
pub trait KeyRepository: Send + Sync {
    fn private_key(&self, key_id: &str) -> EnvelopeResult<RsaPrivateKey>;
}

/// Keys stored as `<root>/<publicKeyId>/Private.key` (PKCS#1 or PKCS#8 PEM).
#[derive(Debug, Clone)]
pub struct DirectoryKeyRepository {
    root: PathBuf,
}

impl DirectoryKeyRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn key_path(&self, key_id: &str) -> PathBuf {
        self.root.join(key_id).join(PRIVATE_KEY_FILE_NAME)
    }
}

impl KeyRepository for DirectoryKeyRepository {
    fn private_key(&self, key_id: &str) -> EnvelopeResult<RsaPrivateKey> {
        // Key ids name a directory; anything that could escape the root is rejected.
        if key_id.is_empty()
            || !key_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(EnvelopeError::InvalidKeyId(key_id.to_string()));
        }

        let path = self.key_path(key_id);
        let pem = match std::fs::read_to_string(&path) {
            Ok(pem) => pem,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(EnvelopeError::KeyNotFound {
                    key_id: key_id.to_string(),
                    path,
                })
            }
            Err(err) => return Err(err.into()),
        };

        RsaPrivateKey::from_pkcs1_pem(&pem)
            .or_else(|_| RsaPrivateKey::from_pkcs8_pem(&pem))
            .map_err(|e| EnvelopeError::InvalidPrivateKey {
                key_id: key_id.to_string(),
                reason: e.to_string(),
            })
    }
}
