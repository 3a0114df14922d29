/**
 * Cryptographic types and operations.
 *  - RSA key pairs and their export formats
 *  - Per-message AES-256-GCM secrets
 *  - The hybrid envelope that ties the two together
 */
pub mod crypto;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::crypto::{Envelope, EnvelopeError, PublicKey, SecretKey};
    pub use crate::version::build_info;
}
