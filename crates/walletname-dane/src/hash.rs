//! Digests used for fingerprints and TLSA matching, via `ring::digest`.

use ring::digest::{digest, SHA256, SHA512};

/// SHA-256 of raw bytes (certificate DER, SPKI).
#[must_use]
pub fn sha256(data: &[u8]) -> Vec<u8> {
    digest(&SHA256, data).as_ref().to_vec()
}

/// SHA-512 of raw bytes.
#[must_use]
pub fn sha512(data: &[u8]) -> Vec<u8> {
    digest(&SHA512, data).as_ref().to_vec()
}

/// Lowercase hex SHA-256, used as a certificate fingerprint.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}
