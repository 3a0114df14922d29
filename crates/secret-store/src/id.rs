use std::borrow::Borrow;
use std::fmt;

use rand::distr::{Alphanumeric, SampleString};

/// Number of characters in a secret id
pub const ID_LENGTH: usize = 32;
/// Characters a secret id is drawn from
pub const ID_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

const SHORT_LENGTH: usize = 6;

/// Opaque identifier of a stored secret
///
/// Knowing an id is enough to read the secret once, so ids are generated from
/// `rand::rng()`, a CSPRNG seeded and periodically reseeded from the operating system.
/// `Debug` output only shows a short prefix; use `Display` or [`SecretId::as_str`] when
/// the full value is needed (e.g. to build a link).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SecretId(String);

impl SecretId {
    /// Generate a new random id
    pub fn generate() -> Self {
        Self(Alphanumeric.sample_string(&mut rand::rng(), ID_LENGTH))
    }

    /// Parse an id received from a client
    ///
    /// Returns `None` if the string could not have been produced by
    /// [`SecretId::generate`].
    pub fn parse(s: &str) -> Option<Self> {
        Self::is_well_formed(s).then(|| Self(s.to_string()))
    }

    pub fn is_well_formed(s: &str) -> bool {
        s.len() == ID_LENGTH && s.bytes().all(|b| b.is_ascii_alphanumeric())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix of the id, safe to put in logs
    pub fn short(&self) -> &str {
        &self.0[..SHORT_LENGTH.min(self.0.len())]
    }
}

impl Borrow<str> for SecretId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SecretId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretId({}..)", self.short())
    }
}
