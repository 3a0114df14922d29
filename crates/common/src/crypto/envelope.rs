//! The hybrid envelope: an RSA-OAEP wrapped AES-256-GCM secret plus the payload
//! it encrypted.
//!
//! The JSON form of [`Envelope`] is the wire format shared with browser clients, so
//! field names are fixed and every field is kept as the exact string that was
//! received. Byte values are standard base64 with padding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::keys::{KeyError, PublicKey, SecretKey};
use super::secret::{Nonce, Secret, SecretError};

/// Algorithm tag written by 2048-bit keys, and assumed when a client omits the tag
pub const DEFAULT_ALGORITHM: &str = "AES-256-GCM with RSA-2048-OAEP";

const ALGORITHM_PREFIX: &str = "AES-256-GCM with RSA-";
const ALGORITHM_SUFFIX: &str = "-OAEP";

fn default_algorithm() -> String {
    DEFAULT_ALGORITHM.to_string()
}

fn algorithm_for(bits: usize) -> String {
    format!("{}{}{}", ALGORITHM_PREFIX, bits, ALGORITHM_SUFFIX)
}

fn is_supported_algorithm(tag: &str) -> bool {
    tag.strip_prefix(ALGORITHM_PREFIX)
        .and_then(|rest| rest.strip_suffix(ALGORITHM_SUFFIX))
        .map(|bits| bits.parse::<usize>().is_ok())
        .unwrap_or(false)
}

/// Errors that can occur while sealing, opening or validating an envelope
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The recipient key could not be used to wrap the secret
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    /// Random generation or encryption failed while sealing
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),
    /// The plaintext could not be represented as requested
    #[error("encoding error: {0}")]
    Encoding(String),
    /// The envelope is structurally invalid (missing or non-base64 fields)
    #[error("malformed envelope: {0}")]
    Malformed(String),
    /// The envelope names a scheme this implementation does not speak
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    /// Opening failed. Deliberately carries no detail about which step failed.
    #[error("unable to decrypt envelope")]
    Crypto,
}

/// A sealed message addressed to one RSA public key
///
/// # Wire Format
///
/// ```text
/// {
///   "algorithm": "AES-256-GCM with RSA-2048-OAEP",
///   "encryptedSymmetricKey": "<base64 RSA-OAEP(secret)>",
///   "iv": "<base64 12-byte nonce>",
///   "ciphertext": "<base64 AES-GCM output || tag>",
///   "timestamp": "2024-01-01T00:00:00.000Z"
/// }
/// ```
///
/// # Examples
///
/// ```ignore
/// let recipient = SecretKey::generate()?;
///
/// let envelope = Envelope::seal(&recipient.public(), b"meet at noon")?;
/// let plaintext = envelope.open(&recipient)?;
/// assert_eq!(plaintext, b"meet at noon");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    #[serde(default)]
    pub encrypted_symmetric_key: String,
    #[serde(default)]
    pub iv: String,
    #[serde(default)]
    pub ciphertext: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Envelope {
    /// Encrypt `plaintext` so that only the holder of `recipient`'s private key can read it
    ///
    /// A fresh secret and nonce are generated for every call; neither is reused or
    /// returned except inside the envelope.
    pub fn seal(recipient: &PublicKey, plaintext: impl AsRef<[u8]>) -> Result<Self, EnvelopeError> {
        let secret = Secret::generate()?;
        let nonce = Nonce::generate()?;

        let ciphertext = secret.encrypt(&nonce, plaintext.as_ref())?;
        let wrapped = recipient.wrap_key(secret.bytes())?;

        Ok(Self {
            algorithm: algorithm_for(recipient.bits()),
            encrypted_symmetric_key: STANDARD.encode(wrapped),
            iv: STANDARD.encode(nonce.bytes()),
            ciphertext: STANDARD.encode(ciphertext),
            timestamp: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        })
    }

    /// Decrypt the envelope with the recipient's private key
    ///
    /// Returns the plaintext only if the secret unwraps and the authentication tag
    /// verifies. Calling this repeatedly yields the same result.
    ///
    /// # Errors
    ///
    /// - `UnsupportedAlgorithm` if the tag names a different scheme
    /// - `Crypto` for everything else: bad base64, wrong key, or tampered data
    pub fn open(&self, recipient: &SecretKey) -> Result<Vec<u8>, EnvelopeError> {
        if !is_supported_algorithm(&self.algorithm) {
            return Err(EnvelopeError::UnsupportedAlgorithm(self.algorithm.clone()));
        }

        let wrapped = STANDARD
            .decode(&self.encrypted_symmetric_key)
            .map_err(|_| EnvelopeError::Crypto)?;
        let nonce = STANDARD.decode(&self.iv).map_err(|_| EnvelopeError::Crypto)?;
        let ciphertext = STANDARD
            .decode(&self.ciphertext)
            .map_err(|_| EnvelopeError::Crypto)?;

        let nonce = Nonce::from_slice(&nonce).map_err(|_| EnvelopeError::Crypto)?;
        let unwrapped = recipient
            .unwrap_key(&wrapped)
            .map_err(|_| EnvelopeError::Crypto)?;
        let secret = Secret::from_slice(&unwrapped).map_err(|_| EnvelopeError::Crypto)?;

        secret
            .decrypt(&nonce, &ciphertext)
            .map_err(|_| EnvelopeError::Crypto)
    }

    /// Like [`Envelope::open`], for messages that were sealed from text
    pub fn open_to_string(&self, recipient: &SecretKey) -> Result<String, EnvelopeError> {
        let plaintext = self.open(recipient)?;
        String::from_utf8(plaintext)
            .map_err(|_| EnvelopeError::Encoding("plaintext is not valid UTF-8".to_string()))
    }

    /// Check the envelope's shape without decrypting it
    ///
    /// The wrapped key, nonce and ciphertext must be present and valid base64. Used by
    /// the server, which never holds a private key.
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        let fields = [
            ("encryptedSymmetricKey", &self.encrypted_symmetric_key),
            ("iv", &self.iv),
            ("ciphertext", &self.ciphertext),
        ];
        for (name, value) in fields {
            if value.is_empty() {
                return Err(EnvelopeError::Malformed(format!(
                    "missing required field {}",
                    name
                )));
            }
            if STANDARD.decode(value).is_err() {
                return Err(EnvelopeError::Malformed(format!(
                    "field {} is not valid base64",
                    name
                )));
            }
        }
        if self.algorithm.is_empty() {
            return Err(EnvelopeError::Malformed("empty algorithm".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::keys::test::{alice, bob};
    use crate::crypto::secret::NONCE_SIZE;

    fn flip_bit(field: &str, byte: usize) -> String {
        let mut bytes = STANDARD.decode(field).unwrap();
        let idx = byte % bytes.len();
        bytes[idx] ^= 0x01;
        STANDARD.encode(bytes)
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let messages: [&[u8]; 3] = [b"", b"hello, world!", &[0xAB; 100_000]];
        for message in messages {
            let envelope = Envelope::seal(&alice().public(), message).unwrap();
            assert_eq!(envelope.open(alice()).unwrap(), message);
        }
    }

    #[test]
    fn test_open_is_repeatable() {
        let envelope = Envelope::seal(&alice().public(), "same every time").unwrap();
        let first = envelope.open_to_string(alice()).unwrap();
        let second = envelope.open_to_string(alice()).unwrap();
        assert_eq!(first, "same every time");
        assert_eq!(first, second);
    }

    #[test]
    fn test_seal_metadata() {
        let envelope = Envelope::seal(&alice().public(), b"hi").unwrap();
        assert_eq!(envelope.algorithm, DEFAULT_ALGORITHM);
        assert_eq!(STANDARD.decode(&envelope.iv).unwrap().len(), NONCE_SIZE);

        let timestamp = envelope.timestamp.as_deref().unwrap();
        assert!(timestamp.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
        assert!(envelope.validate().is_ok());
    }

    #[test]
    fn test_wrong_key_rejected() {
        let envelope = Envelope::seal(&alice().public(), b"for alice only").unwrap();
        assert!(matches!(envelope.open(bob()), Err(EnvelopeError::Crypto)));
    }

    #[test]
    fn test_tampered_ciphertext_rejected() {
        let envelope = Envelope::seal(&alice().public(), b"integrity matters").unwrap();
        let len = STANDARD.decode(&envelope.ciphertext).unwrap().len();
        for byte in 0..len {
            let mut tampered = envelope.clone();
            tampered.ciphertext = flip_bit(&envelope.ciphertext, byte);
            assert!(matches!(tampered.open(alice()), Err(EnvelopeError::Crypto)));
        }
    }

    #[test]
    fn test_tampered_nonce_rejected() {
        let envelope = Envelope::seal(&alice().public(), b"integrity matters").unwrap();
        for byte in 0..NONCE_SIZE {
            let mut tampered = envelope.clone();
            tampered.iv = flip_bit(&envelope.iv, byte);
            assert!(matches!(tampered.open(alice()), Err(EnvelopeError::Crypto)));
        }
    }

    #[test]
    fn test_tampered_wrapped_key_rejected() {
        let envelope = Envelope::seal(&alice().public(), b"integrity matters").unwrap();
        for byte in [0, 1, 64, 128, 255] {
            let mut tampered = envelope.clone();
            tampered.encrypted_symmetric_key = flip_bit(&envelope.encrypted_symmetric_key, byte);
            assert!(matches!(tampered.open(alice()), Err(EnvelopeError::Crypto)));
        }
    }

    #[test]
    fn test_malformed_fields_are_opaque() {
        let envelope = Envelope::seal(&alice().public(), b"hi").unwrap();

        let mut bad_base64 = envelope.clone();
        bad_base64.ciphertext = "%%%".to_string();
        assert!(matches!(bad_base64.open(alice()), Err(EnvelopeError::Crypto)));

        let mut short_nonce = envelope.clone();
        short_nonce.iv = STANDARD.encode([0u8; 8]);
        assert!(matches!(short_nonce.open(alice()), Err(EnvelopeError::Crypto)));

        // Validly wrapped, but an AES-128 sized key
        let mut short_key = envelope.clone();
        short_key.encrypted_symmetric_key =
            STANDARD.encode(alice().public().wrap_key(&[7u8; 16]).unwrap());
        assert!(matches!(short_key.open(alice()), Err(EnvelopeError::Crypto)));
    }

    #[test]
    fn test_unsupported_algorithm() {
        let mut envelope = Envelope::seal(&alice().public(), b"hi").unwrap();
        envelope.algorithm = "ChaCha20-Poly1305 with X25519".to_string();
        assert!(matches!(
            envelope.open(alice()),
            Err(EnvelopeError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_nonce_uniqueness() {
        let public_key = alice().public();
        let mut nonces = std::collections::HashSet::new();
        let mut keys = std::collections::HashSet::new();
        for _ in 0..64 {
            let envelope = Envelope::seal(&public_key, b"same plaintext").unwrap();
            assert!(nonces.insert(envelope.iv.clone()));
            assert!(keys.insert(envelope.encrypted_symmetric_key.clone()));
        }
    }

    #[test]
    fn test_open_to_string_rejects_binary() {
        let envelope = Envelope::seal(&alice().public(), [0xFFu8, 0xFE]).unwrap();
        assert!(matches!(
            envelope.open_to_string(alice()),
            Err(EnvelopeError::Encoding(_))
        ));
    }

    #[test]
    fn test_json_field_names() {
        let envelope = Envelope::seal(&alice().public(), b"hi").unwrap();
        let json = serde_json::to_value(&envelope).unwrap();
        let object = json.as_object().unwrap();
        for key in [
            "algorithm",
            "encryptedSymmetricKey",
            "iv",
            "ciphertext",
            "timestamp",
        ] {
            assert!(object.contains_key(key), "missing {}", key);
        }
        assert_eq!(object.len(), 5);
    }

    #[test]
    fn test_json_preserves_foreign_strings() {
        // Produced by a browser client; must come back out exactly as it went in
        let raw = r#"{"algorithm":"AES-256-GCM with RSA-2048-OAEP","encryptedSymmetricKey":"AAEC","iv":"AAECAwQFBgcICQoL","ciphertext":"3q2+7w==","timestamp":"2024-05-01T12:00:00.123Z"}"#;
        let envelope: Envelope = serde_json::from_str(raw).unwrap();
        assert_eq!(serde_json::to_string(&envelope).unwrap(), raw);
    }

    #[test]
    fn test_missing_algorithm_defaults() {
        let raw = r#"{"encryptedSymmetricKey":"AAEC","iv":"AAECAwQFBgcICQoL","ciphertext":"3q2+7w=="}"#;
        let envelope: Envelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.algorithm, DEFAULT_ALGORITHM);
        assert!(envelope.timestamp.is_none());
        assert!(envelope.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_and_bad_fields() {
        let raw = r#"{"iv":"AAECAwQFBgcICQoL","ciphertext":"3q2+7w=="}"#;
        let envelope: Envelope = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            envelope.validate(),
            Err(EnvelopeError::Malformed(_))
        ));

        let raw = r#"{"encryptedSymmetricKey":"not base64!","iv":"AAECAwQFBgcICQoL","ciphertext":"3q2+7w=="}"#;
        let envelope: Envelope = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            envelope.validate(),
            Err(EnvelopeError::Malformed(_))
        ));
    }
}
