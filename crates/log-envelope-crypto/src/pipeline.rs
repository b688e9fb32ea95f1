//! Hybrid decryption, decompression and checksum validation.

use crate::{split_envelope, EnvelopeError, EnvelopeHeader, EnvelopeResult, KeyRepository};
use aes::{Aes128, Aes192, Aes256};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cbc::cipher::{block_padding::NoPadding, BlockDecryptMut, KeyIvInit};
use flate2::read::ZlibDecoder;
use md5::{Digest, Md5};
use rsa::Pkcs1v15Encrypt;
use std::io::Read;
use std::sync::Arc;
use sync_cursor_store::FileId;
use tracing::{debug, warn};

/// AES block size; also the length of the (all-zero) CBC IV.
pub(crate) const BLOCK_SIZE: usize = 16;

/// Plaintext ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedContent {
    bytes: Vec<u8>,
    encrypted: bool,
}

impl DecryptedContent {
    /// Content that never went through an envelope.
    pub fn from_plaintext(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            encrypted: false,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Whether the content came from an encrypted envelope.
    pub fn was_encrypted(&self) -> bool {
        self.encrypted
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Non-empty lines, lossily decoded.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.bytes
            .split(|b| *b == b'\n')
            .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
            .filter(|line| !line.is_empty())
            .map(|line| String::from_utf8_lossy(line).into_owned())
    }
}

/// Lowercase hex MD5 digest.
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

/// Turns a raw envelope into verified plaintext.
#[derive(Clone)]
pub struct DecryptPipeline {
    keys: Arc<dyn KeyRepository>,
}

impl DecryptPipeline {
    pub fn new(keys: Arc<dyn KeyRepository>) -> Self {
        Self { keys }
    }

    /// Decrypt and verify one downloaded file.
    ///
    /// 1. Split the envelope at the first delimiter
    /// 2. Without a `key` header: inflate the body, or pass it through as-is
    /// 3. Resolve the private key named by `publicKeyId`
    /// 4. Unwrap the symmetric key (RSA PKCS#1 v1.5)
    /// 5. AES-CBC decrypt with a zero IV, then inflate
    /// 6. Compare the MD5 of the plaintext with `checksum`
    pub fn decrypt(&self, id: &FileId, raw: &[u8]) -> EnvelopeResult<DecryptedContent> {
        // 1. Split
        let (header, body) = split_envelope(raw)?;
        let header = EnvelopeHeader::parse(header);

        // 2. Plaintext envelope
        let Some(wrapped_key) = header.key.as_deref() else {
            let bytes = match inflate(body) {
                Ok(inflated) => inflated,
                Err(e) => {
                    debug!(file = %id, error = %e, "Body is not compressed, using as-is");
                    body.to_vec()
                }
            };
            return Ok(DecryptedContent {
                bytes,
                encrypted: false,
            });
        };

        let key_id = header
            .public_key_id
            .as_deref()
            .ok_or(EnvelopeError::MissingField("publicKeyId"))?;
        let expected = header
            .checksum
            .as_deref()
            .ok_or(EnvelopeError::MissingField("checksum"))?;

        // 3. Resolve key
        let private_key = self.keys.private_key(key_id)?;

        // 4. Unwrap
        let wrapped = STANDARD
            .decode(wrapped_key)
            .map_err(|_| EnvelopeError::InvalidBase64 { field: "key" })?;
        let unwrapped = private_key
            .decrypt(Pkcs1v15Encrypt, &wrapped)
            .map_err(|e| EnvelopeError::Unwrap(e.to_string()))?;
        let symmetric_key = resolve_symmetric_key(&unwrapped)?;

        // 5. Decrypt + inflate
        let compressed = aes_cbc_zero_iv_decrypt(&symmetric_key, body)?;
        let plaintext = inflate(&compressed)?;

        // 6. Checksum
        let actual = md5_hex(&plaintext);
        if actual != expected {
            warn!(file = %id, expected, actual = %actual, "Checksum mismatch");
            return Err(EnvelopeError::ChecksumMismatch {
                expected: expected.to_string(),
                actual,
            });
        }

        debug!(file = %id, key_id, bytes = plaintext.len(), "Decrypted");
        Ok(DecryptedContent {
            bytes: plaintext,
            encrypted: true,
        })
    }
}

fn is_aes_key_length(len: usize) -> bool {
    matches!(len, 16 | 24 | 32)
}

/// The unwrapped material is normally base64 text of the AES key; raw key
/// bytes are accepted too.
fn resolve_symmetric_key(unwrapped: &[u8]) -> EnvelopeResult<Vec<u8>> {
    if let Ok(decoded) = STANDARD.decode(unwrapped) {
        if is_aes_key_length(decoded.len()) {
            return Ok(decoded);
        }
    }
    if is_aes_key_length(unwrapped.len()) {
        return Ok(unwrapped.to_vec());
    }
    Err(EnvelopeError::InvalidKeyLength(unwrapped.len()))
}

/// AES-CBC decryption with a fixed all-zero IV and no unpadding.
///
/// The zero IV is part of the existing wire format and is only accepted on
/// the read side.
fn aes_cbc_zero_iv_decrypt(key: &[u8], ciphertext: &[u8]) -> EnvelopeResult<Vec<u8>> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(EnvelopeError::InvalidCiphertextLength(ciphertext.len()));
    }
    let iv = [0u8; BLOCK_SIZE];

    let result = match key.len() {
        16 => cbc::Decryptor::<Aes128>::new_from_slices(key, &iv)
            .map(|d| d.decrypt_padded_vec_mut::<NoPadding>(ciphertext)),
        24 => cbc::Decryptor::<Aes192>::new_from_slices(key, &iv)
            .map(|d| d.decrypt_padded_vec_mut::<NoPadding>(ciphertext)),
        32 => cbc::Decryptor::<Aes256>::new_from_slices(key, &iv)
            .map(|d| d.decrypt_padded_vec_mut::<NoPadding>(ciphertext)),
        other => return Err(EnvelopeError::InvalidKeyLength(other)),
    };

    result
        .map_err(|_| EnvelopeError::InvalidKeyLength(key.len()))?
        .map_err(|_| EnvelopeError::InvalidCiphertextLength(ciphertext.len()))
}

/// Inflate one zlib stream. Bytes after the end of the stream are ignored.
pub(crate) fn inflate(data: &[u8]) -> EnvelopeResult<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| EnvelopeError::Decompress(e.to_string()))?;
    Ok(out)
}
