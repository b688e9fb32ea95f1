use crate::{EnvelopeError, EnvelopeResult};

/// Separates the header block from the body.
pub const ENVELOPE_DELIMITER: &[u8] = b"|==|\n";

/// Split raw bytes at the first delimiter into `(header, body)`.
pub fn split_envelope(raw: &[u8]) -> EnvelopeResult<(&[u8], &[u8])> {
    let at = raw
        .windows(ENVELOPE_DELIMITER.len())
        .position(|window| window == ENVELOPE_DELIMITER)
        .ok_or(EnvelopeError::MissingDelimiter)?;
    Ok((&raw[..at], &raw[at + ENVELOPE_DELIMITER.len()..]))
}

/// Recognized header fields. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvelopeHeader {
    /// Base64 RSA-wrapped symmetric key; absent for plaintext files.
    pub key: Option<String>,
    pub public_key_id: Option<String>,
    /// Hex MD5 of the final plaintext.
    pub checksum: Option<String>,
}

impl EnvelopeHeader {
    /// Parse `name:value` lines. Values are trimmed; the first occurrence of a
    /// field wins.
    pub fn parse(header: &[u8]) -> Self {
        let text = String::from_utf8_lossy(header);
        let mut parsed = Self::default();

        for line in text.lines() {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let slot = match name.trim() {
                "key" => &mut parsed.key,
                "publicKeyId" => &mut parsed.public_key_id,
                "checksum" => &mut parsed.checksum,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.trim().to_string());
            }
        }
        parsed
    }

    pub fn is_encrypted(&self) -> bool {
        self.key.is_some()
    }
}
