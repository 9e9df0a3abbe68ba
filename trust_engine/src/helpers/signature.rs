//! HMAC-SHA256 signature primitives.
//!
//! Every inbound request from the platform is signed with HMAC-SHA256 over the exact bytes the
//! platform sent, so the data handed to [`verify_signature`] must be the raw body or query string
//! as received. Any normalization (re-serializing a query, trimming whitespace) desynchronizes
//! the two sides and verification fails. The digest travels hex-encoded.

use hmac::{Hmac, Mac};
use rand::{distributions::Alphanumeric, Rng};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Length of generated tenant shared secrets. The platform requires at least 16 bytes from a
/// URL-safe alphabet.
const SHARED_SECRET_LENGTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("empty data")]
    EmptyData,
    #[error("empty signature")]
    EmptySignature,
    #[error("empty key")]
    EmptyKey,
    #[error("signature mismatch")]
    SignatureMismatch,
}

/// Calculate the hex-encoded HMAC-SHA256 of `data` under `key`.
pub fn calculate_hmac(key: &str, data: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(data);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify that `signature` is the HMAC-SHA256 of `data` under `key`.
///
/// The comparison is constant-time. Each degenerate input fails with its own error so that
/// callers (and tests) can tell a misconfigured key apart from a forged signature; the HTTP
/// layer collapses all of them into one opaque message before anything leaves the process.
pub fn verify_signature(data: &[u8], signature: &[u8], key: &str) -> Result<(), SignatureError> {
    if data.is_empty() {
        return Err(SignatureError::EmptyData);
    }
    if signature.is_empty() {
        return Err(SignatureError::EmptySignature);
    }
    if key.is_empty() {
        return Err(SignatureError::EmptyKey);
    }
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.verify_slice(signature).map_err(|_| SignatureError::SignatureMismatch)
}

/// Generate a fresh random shared secret for a tenant.
pub fn generate_shared_secret() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(SHARED_SECRET_LENGTH).map(char::from).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    const KEY: &str = "correct horse battery staple";
    // HMAC-SHA256(KEY, "hello world")
    const HELLO_SIG: &str = "f4ed9b8ecf06f7e5a863e1e0f6138be3afab7c286f0b16d8b6b5ba546aba8da3";

    #[test]
    fn known_vector() {
        assert_eq!(calculate_hmac(KEY, b"hello world"), HELLO_SIG);
    }

    #[test]
    fn round_trip_verifies() {
        let data = b"some payload bytes";
        let sig = hex::decode(calculate_hmac(KEY, data)).unwrap();
        verify_signature(data, &sig, KEY).unwrap();
    }

    #[test]
    fn bit_flip_fails() {
        let data = b"some payload bytes";
        let mut sig = hex::decode(calculate_hmac(KEY, data)).unwrap();
        sig[0] ^= 0x01;
        assert_eq!(verify_signature(data, &sig, KEY), Err(SignatureError::SignatureMismatch));
    }

    #[test]
    fn wrong_key_fails() {
        let data = b"some payload bytes";
        let sig = hex::decode(calculate_hmac(KEY, data)).unwrap();
        assert_eq!(verify_signature(data, &sig, "other key"), Err(SignatureError::SignatureMismatch));
    }

    #[test]
    fn degenerate_inputs_fail_with_distinct_errors() {
        let sig = hex::decode(HELLO_SIG).unwrap();
        assert_eq!(verify_signature(b"", &sig, KEY), Err(SignatureError::EmptyData));
        assert_eq!(verify_signature(b"hello world", &[], KEY), Err(SignatureError::EmptySignature));
        assert_eq!(verify_signature(b"hello world", &sig, ""), Err(SignatureError::EmptyKey));
    }

    #[test]
    fn generated_secrets_are_long_and_url_safe() {
        let secret = generate_shared_secret();
        assert_eq!(secret.len(), 32);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(secret, generate_shared_secret());
    }
}
