//! One-time secret registry
//!
//! This crate provides an in-memory store that hands each stored payload to at most
//! one reader, and to nobody once its time-to-live has passed.
//!
//! # Guarantees
//!
//! - **At-most-once delivery**: lookup, expiry check and removal of a record happen
//!   under a single lock acquisition, so concurrent readers racing on the same id see
//!   exactly one success.
//! - **Expiry**: a record is unreachable from the moment its deadline passes. Every
//!   access re-checks the deadline; background reapers and sweeps only reclaim memory.
//! - **Unguessable ids**: 32 alphanumeric characters (~190 bits) drawn from a CSPRNG.
//!
//! The store never inspects its payloads. It is process-lifetime only; nothing is
//! persisted.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use secret_store::{SecretStore, StoreConfig, StoreError};
//!
//! let store = SecretStore::new(StoreConfig::default());
//! let receipt = store.create("opaque payload", Duration::from_secs(3600)).unwrap();
//!
//! assert_eq!(store.consume(receipt.id.as_str()).unwrap(), "opaque payload");
//! assert!(matches!(store.consume(receipt.id.as_str()), Err(StoreError::NotFound)));
//! ```

mod error;
mod id;
mod store;

pub use error::{Result, StoreError};
pub use id::{SecretId, ID_ALPHABET, ID_LENGTH};
pub use store::{Receipt, SecretStore, StoreConfig};
