//! Content encryption using AES-256-GCM
//!
//! Each sealed message gets its own `Secret` and `Nonce`. Both are generated from the
//! operating system's CSPRNG and used for exactly one encryption.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of an AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;
/// Size of an AES-256 key in bytes (256 bits)
pub const SECRET_SIZE: usize = 32;
/// Size of the GCM authentication tag appended to every ciphertext
pub const TAG_SIZE: usize = 16;

/// Errors that can occur during encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("secret error: {0}")]
    Default(#[from] anyhow::Error),
}

/// A 256-bit symmetric key for a single message
///
/// The key material is zeroized when the value is dropped. Ciphertexts produced by
/// [`Secret::encrypt`] are `encrypted(plaintext) || auth_tag (16 bytes)`; the nonce is
/// carried separately.
///
/// # Examples
///
/// ```ignore
/// let secret = Secret::generate()?;
/// let nonce = Nonce::generate()?;
///
/// let ciphertext = secret.encrypt(&nonce, b"sensitive data")?;
/// let recovered = secret.decrypt(&nonce, &ciphertext)?;
/// assert_eq!(b"sensitive data", &recovered[..]);
/// ```
#[derive(PartialEq, Eq, Clone, Zeroize, ZeroizeOnDrop)]
pub struct Secret([u8; SECRET_SIZE]);

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(..)")
    }
}

impl From<[u8; SECRET_SIZE]> for Secret {
    fn from(bytes: [u8; SECRET_SIZE]) -> Self {
        Secret(bytes)
    }
}

impl Secret {
    /// Generate a new random secret using a cryptographically secure RNG
    pub fn generate() -> Result<Self, SecretError> {
        let mut buff = [0; SECRET_SIZE];
        getrandom::getrandom(&mut buff)
            .map_err(|e| anyhow::anyhow!("failed to generate secret: {}", e))?;
        Ok(Self(buff))
    }

    /// Create a secret from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not exactly `SECRET_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        if data.len() != SECRET_SIZE {
            return Err(anyhow::anyhow!(
                "invalid secret size, expected {}, got {}",
                SECRET_SIZE,
                data.len()
            )
            .into());
        }
        let mut buff = [0; SECRET_SIZE];
        buff.copy_from_slice(data);
        Ok(buff.into())
    }

    /// Get a reference to the secret key bytes
    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.bytes()))
    }

    /// Encrypt data using AES-256-GCM
    ///
    /// The caller is responsible for never reusing `nonce` with this secret.
    pub fn encrypt(&self, nonce: &Nonce, data: &[u8]) -> Result<Vec<u8>, SecretError> {
        let ciphertext = self
            .cipher()
            .encrypt(aes_gcm::Nonce::from_slice(nonce.bytes()), data)
            .map_err(|_| anyhow::anyhow!("encrypt error"))?;
        Ok(ciphertext)
    }

    /// Decrypt and verify data using AES-256-GCM
    ///
    /// # Errors
    ///
    /// Returns an error if the authentication tag does not verify, i.e. the ciphertext
    /// or nonce was modified, or the wrong secret is used.
    pub fn decrypt(&self, nonce: &Nonce, data: &[u8]) -> Result<Vec<u8>, SecretError> {
        if data.len() < TAG_SIZE {
            return Err(anyhow::anyhow!("data too short for auth tag").into());
        }
        let plaintext = self
            .cipher()
            .decrypt(aes_gcm::Nonce::from_slice(nonce.bytes()), data)
            .map_err(|_| anyhow::anyhow!("decrypt error"))?;
        Ok(plaintext)
    }
}

/// A 96-bit AES-GCM nonce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nonce([u8; NONCE_SIZE]);

impl From<[u8; NONCE_SIZE]> for Nonce {
    fn from(bytes: [u8; NONCE_SIZE]) -> Self {
        Nonce(bytes)
    }
}

impl Nonce {
    /// Generate a fresh random nonce
    pub fn generate() -> Result<Self, SecretError> {
        let mut buff = [0; NONCE_SIZE];
        getrandom::getrandom(&mut buff)
            .map_err(|e| anyhow::anyhow!("failed to generate nonce: {}", e))?;
        Ok(Self(buff))
    }

    /// Create a nonce from a byte slice of exactly `NONCE_SIZE` bytes
    pub fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        if data.len() != NONCE_SIZE {
            return Err(anyhow::anyhow!(
                "invalid nonce size, expected {}, got {}",
                NONCE_SIZE,
                data.len()
            )
            .into());
        }
        let mut buff = [0; NONCE_SIZE];
        buff.copy_from_slice(data);
        Ok(buff.into())
    }

    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }
}
