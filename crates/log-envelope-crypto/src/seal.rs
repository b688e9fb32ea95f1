//! Producer side of the envelope format.
//!
//! Used by tests and by tooling that needs sample files the agent can read.
//! It reproduces the existing format exactly, including the all-zero CBC IV,
//! which is a reused-IV weakness: nothing that produces real traffic should
//! be built on this.

use crate::pipeline::{md5_hex, BLOCK_SIZE};
use crate::{EnvelopeError, EnvelopeResult, ENVELOPE_DELIMITER};
use aes::Aes256;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockEncryptMut, KeyIvInit};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use rand::RngCore;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};
use std::io::Write;

/// Build an encrypted envelope for `plaintext`.
///
/// A random AES-256 key is generated, its base64 text is wrapped with
/// `public_key`, and the zlib-compressed plaintext is encrypted under it.
pub fn seal_envelope(
    plaintext: &[u8],
    public_key: &RsaPublicKey,
    public_key_id: &str,
) -> EnvelopeResult<Vec<u8>> {
    let mut rng = rand::thread_rng();

    let mut symmetric_key = [0u8; 32];
    rng.fill_bytes(&mut symmetric_key);

    let wrapped = public_key
        .encrypt(
            &mut rng,
            Pkcs1v15Encrypt,
            STANDARD.encode(symmetric_key).as_bytes(),
        )
        .map_err(|e| EnvelopeError::Seal(e.to_string()))?;

    let compressed = deflate(plaintext)?;
    let body = cbc::Encryptor::<Aes256>::new_from_slices(&symmetric_key, &[0u8; BLOCK_SIZE])
        .map_err(|e| EnvelopeError::Seal(e.to_string()))?
        .encrypt_padded_vec_mut::<Pkcs7>(&compressed);

    let header = format!(
        "key:{}\npublicKeyId:{}\nchecksum:{}\n",
        STANDARD.encode(wrapped),
        public_key_id,
        md5_hex(plaintext)
    );
    Ok(assemble(header.as_bytes(), &body))
}

/// Build an unencrypted envelope, optionally zlib-compressing the body.
pub fn seal_plain_envelope(plaintext: &[u8], compress: bool) -> Vec<u8> {
    let body = if compress {
        // Writing into a Vec cannot fail.
        deflate(plaintext).unwrap_or_else(|_| plaintext.to_vec())
    } else {
        plaintext.to_vec()
    };
    assemble(b"format:plain\n", &body)
}

fn assemble(header: &[u8], body: &[u8]) -> Vec<u8> {
    let mut raw = Vec::with_capacity(header.len() + ENVELOPE_DELIMITER.len() + body.len());
    raw.extend_from_slice(header);
    raw.extend_from_slice(ENVELOPE_DELIMITER);
    raw.extend_from_slice(body);
    raw
}

fn deflate(data: &[u8]) -> EnvelopeResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
