//! Decrypt & verify pipeline for downloaded log files.
//!
//! A file is an envelope: header lines, the delimiter `|==|\n`, then the body.
//! Encrypted bodies carry an RSA-wrapped AES key in the header and a checksum
//! of the final plaintext:
//!
//! ```text
//! key:<base64 RSA PKCS#1 v1.5 wrapped key>
//! publicKeyId:<id of the key pair>
//! checksum:<md5 hex of plaintext>
//! |==|
//! <AES-CBC(zlib(plaintext))>
//! ```
//!
//! Unencrypted files have no `key` header and a zlib (or plain) body.

mod envelope;
mod error;
mod keys;
mod pipeline;
mod seal;

pub use envelope::{split_envelope, EnvelopeHeader, ENVELOPE_DELIMITER};
pub use error::{EnvelopeError, EnvelopeResult};
pub use keys::{DirectoryKeyRepository, KeyRepository, PRIVATE_KEY_FILE_NAME};
pub use pipeline::{md5_hex, DecryptPipeline, DecryptedContent};
pub use seal::{seal_envelope, seal_plain_envelope};
