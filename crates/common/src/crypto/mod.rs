//! Cryptographic primitives for sealdrop
//!
//! This module provides the hybrid encryption scheme used to hand a message to a
//! single recipient:
//!
//! - **Identity**: RSA keypairs (`SecretKey`/`PublicKey`), 2048-bit by default.
//!   The private key never leaves the holder; the public key is shared as a JWK or PEM.
//! - **Content Encryption**: every message gets its own AES-256-GCM `Secret` and a
//!   fresh 96-bit `Nonce`.
//! - **Key Wrapping**: the per-message secret is encrypted to the recipient with
//!   RSA-OAEP (SHA-256), so the long-term key only ever touches 32 bytes.
//!
//! # Sealing
//!
//! 1. Generate a random `Secret` and `Nonce`
//! 2. Encrypt the plaintext with AES-256-GCM (the tag is appended to the ciphertext)
//! 3. Wrap the secret under the recipient's public key
//! 4. Package the three byte strings, base64 encoded, as an `Envelope`
//!
//! # Opening
//!
//! 1. Unwrap the secret with the recipient's private key
//! 2. Decrypt and verify the ciphertext with the recovered secret and the nonce
//!
//! Every failure while opening is reported as the same opaque error, whichever
//! stage it happened in.

mod envelope;
mod keys;
mod secret;

pub use envelope::{Envelope, EnvelopeError, DEFAULT_ALGORITHM};
pub use keys::{Jwk, KeyError, PublicKey, SecretKey, DEFAULT_MODULUS_BITS};
pub use secret::{Nonce, Secret, SecretError, NONCE_SIZE, SECRET_SIZE, TAG_SIZE};
