//! Secret generation and digests for client credentials.
//!
//! SECURITY: secrets come from `OsRng`, the operating system's CSPRNG.
//! Only digests are stored; the encoded secret is returned once on create.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use provisio_core::ClientId;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Draws `byte_length` random bytes.
#[must_use]
pub fn generate_secret(byte_length: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; byte_length];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Standard base64, the form handed to clients.
#[must_use]
pub fn encode_secret(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_secret(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(encoded.trim())
}

/// SHA-256 over the client id bytes followed by the secret bytes, hex encoded.
#[must_use]
pub fn digest_credentials(client_id: &ClientId, secret: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(client_id.as_bytes());
    hasher.update(secret);
    hex::encode(hasher.finalize())
}

/// SHA-256 of an encoded secret, hex encoded.
#[must_use]
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}
