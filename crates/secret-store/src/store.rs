use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::error::{Result, StoreError};
use crate::id::SecretId;

/// Shortest accepted time-to-live (1 minute)
pub const DEFAULT_MIN_TTL: Duration = Duration::from_secs(60);
/// Longest accepted time-to-live (7 days)
pub const DEFAULT_MAX_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
/// How many fresh ids to try before giving up on a collision streak
pub const DEFAULT_MAX_ID_ATTEMPTS: usize = 8;

/// Limits and behaviour of a [`SecretStore`]
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Shortest accepted time-to-live
    pub min_ttl: Duration,
    /// Longest accepted time-to-live
    pub max_ttl: Duration,
    /// Id regeneration attempts on collision
    pub max_id_attempts: usize,
    /// Spawn a reaper task per record that frees it at its deadline.
    ///  Expiry is enforced on access either way.
    pub active_expiry: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            min_ttl: DEFAULT_MIN_TTL,
            max_ttl: DEFAULT_MAX_TTL,
            max_id_attempts: DEFAULT_MAX_ID_ATTEMPTS,
            active_expiry: true,
        }
    }
}

/// Returned to the creator of a secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub id: SecretId,
    pub expires_at: DateTime<Utc>,
}

struct Record<T> {
    payload: T,
    deadline: Instant,
    reaper: Option<AbortHandle>,
}

impl<T> Record<T> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    fn cancel_reaper(&self) {
        if let Some(reaper) = &self.reaper {
            reaper.abort();
        }
    }
}

struct Inner<T> {
    records: Mutex<HashMap<SecretId, Record<T>>>,
    config: StoreConfig,
}

impl<T> Inner<T> {
    /// Remove `id` if its deadline has passed. Called by the record's reaper task.
    fn reap(&self, id: &SecretId) {
        let now = Instant::now();
        let mut records = self.records.lock();
        let expired = records
            .get(id)
            .map(|record| record.is_expired(now))
            .unwrap_or(false);
        if expired {
            records.remove(id);
            tracing::debug!(id = %id.short(), "expired secret reaped");
        }
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        for record in self.records.get_mut().values() {
            record.cancel_reaper();
        }
    }
}

/// In-memory registry of one-time secrets
///
/// Each record moves from pending to either consumed or expired, and is removed from
/// the table on that transition. Handles are cheap to clone and share one table.
///
/// Creating a secret from inside a tokio runtime also spawns a reaper task that frees
/// the record at its deadline; the task is aborted if the record is consumed first.
/// Outside a runtime, expired records are only removed on access or by
/// [`SecretStore::purge_expired`].
pub struct SecretStore<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for SecretStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> fmt::Debug for SecretStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretStore")
            .field("records", &self.inner.records.lock().len())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl<T> Default for SecretStore<T>
where
    T: Send + 'static,
{
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl<T> SecretStore<T>
where
    T: Send + 'static,
{
    pub fn new(config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                records: Mutex::new(HashMap::new()),
                config,
            }),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Store `payload` for at most `ttl` and return its fresh id
    ///
    /// # Errors
    ///
    /// - `InvalidTtl` if `ttl` is zero or outside `[min_ttl, max_ttl]`
    /// - `IdSpaceExhausted` if no unused id could be generated
    pub fn create(&self, payload: T, ttl: Duration) -> Result<Receipt> {
        self.check_ttl(ttl)?;
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| self.invalid_ttl(ttl))?;
        let deadline = Instant::now() + ttl;

        let mut records = self.inner.records.lock();
        let id = self.fresh_id(&records)?;
        let reaper = self.spawn_reaper(&id, deadline);
        records.insert(
            id.clone(),
            Record {
                payload,
                deadline,
                reaper,
            },
        );
        drop(records);

        tracing::info!(id = %id.short(), ttl_secs = ttl.as_secs(), %expires_at, "secret created");
        Ok(Receipt { id, expires_at })
    }

    /// Remove and return the payload stored under `id`
    ///
    /// Lookup and removal happen under one lock acquisition, so of any number of
    /// concurrent callers for the same id at most one receives the payload.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no record exists (never created, already consumed, or reaped)
    /// - `Gone` if the record existed but its deadline had passed; it is removed
    pub fn consume(&self, id: &str) -> Result<T> {
        if !SecretId::is_well_formed(id) {
            return Err(StoreError::NotFound);
        }

        let now = Instant::now();
        let (id, record) = self
            .inner
            .records
            .lock()
            .remove_entry(id)
            .ok_or(StoreError::NotFound)?;
        record.cancel_reaper();

        if record.is_expired(now) {
            tracing::debug!(id = %id.short(), "expired secret requested");
            return Err(StoreError::Gone);
        }

        tracing::info!(id = %id.short(), "secret consumed");
        Ok(record.payload)
    }

    /// Remove every expired record, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut records = self.inner.records.lock();
        let before = records.len();
        records.retain(|_, record| {
            let expired = record.is_expired(now);
            if expired {
                record.cancel_reaper();
            }
            !expired
        });
        let purged = before - records.len();
        drop(records);

        if purged > 0 {
            tracing::debug!(purged, "purged expired secrets");
        }
        purged
    }

    /// Whether a record for `id` is still held, expired or not
    pub fn contains(&self, id: &str) -> bool {
        self.inner.records.lock().contains_key(id)
    }

    /// Number of records held, including expired ones not yet reclaimed
    pub fn len(&self) -> usize {
        self.inner.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn invalid_ttl(&self, ttl: Duration) -> StoreError {
        StoreError::InvalidTtl {
            ttl,
            min: self.inner.config.min_ttl,
            max: self.inner.config.max_ttl,
        }
    }

    fn check_ttl(&self, ttl: Duration) -> Result<()> {
        let config = &self.inner.config;
        if ttl.is_zero() || ttl < config.min_ttl || ttl > config.max_ttl {
            return Err(self.invalid_ttl(ttl));
        }
        Ok(())
    }

    fn fresh_id(&self, records: &HashMap<SecretId, Record<T>>) -> Result<SecretId> {
        for _ in 0..self.inner.config.max_id_attempts.max(1) {
            let id = SecretId::generate();
            if !records.contains_key(&id) {
                return Ok(id);
            }
            tracing::warn!("secret id collision, regenerating");
        }
        Err(StoreError::IdSpaceExhausted)
    }

    fn spawn_reaper(&self, id: &SecretId, deadline: Instant) -> Option<AbortHandle> {
        if !self.inner.config.active_expiry {
            return None;
        }
        let runtime = tokio::runtime::Handle::try_current().ok()?;

        let inner = Arc::downgrade(&self.inner);
        let id = id.clone();
        let task = runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(inner) = inner.upgrade() {
                inner.reap(&id);
            }
        });
        Some(task.abort_handle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> StoreConfig {
        StoreConfig {
            min_ttl: Duration::from_secs(1),
            ..StoreConfig::default()
        }
    }

    async fn settle<T: Send + 'static>(store: &SecretStore<T>) {
        for _ in 0..16 {
            if store.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_create_and_consume() {
        let store = SecretStore::new(test_config());
        let receipt = store.create(vec![1u8, 2, 3], Duration::from_secs(60)).unwrap();

        assert!(store.contains(receipt.id.as_str()));
        assert_eq!(store.consume(receipt.id.as_str()).unwrap(), vec![1u8, 2, 3]);
        assert!(store.is_empty());
    }

    #[test]
    fn test_second_consume_is_not_found() {
        let store = SecretStore::new(test_config());
        let receipt = store.create("payload", Duration::from_secs(60)).unwrap();

        assert!(store.consume(receipt.id.as_str()).is_ok());
        assert!(matches!(
            store.consume(receipt.id.as_str()),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn test_unknown_and_malformed_ids() {
        let store: SecretStore<&str> = SecretStore::new(test_config());
        let unknown = SecretId::generate();

        assert!(matches!(
            store.consume(unknown.as_str()),
            Err(StoreError::NotFound)
        ));
        assert!(matches!(store.consume(""), Err(StoreError::NotFound)));
        assert!(matches!(
            store.consume("../../etc/passwd"),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn test_ttl_bounds() {
        let store = SecretStore::new(StoreConfig {
            min_ttl: Duration::from_secs(60),
            max_ttl: Duration::from_secs(3600),
            ..StoreConfig::default()
        });

        for ttl in [
            Duration::ZERO,
            Duration::from_secs(59),
            Duration::from_secs(3601),
            Duration::MAX,
        ] {
            assert!(matches!(
                store.create("payload", ttl),
                Err(StoreError::InvalidTtl { .. })
            ));
        }
        assert!(store.is_empty());

        assert!(store.create("payload", Duration::from_secs(60)).is_ok());
        assert!(store.create("payload", Duration::from_secs(3600)).is_ok());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_expires_at_matches_ttl() {
        let store = SecretStore::new(test_config());
        let before = Utc::now();
        let receipt = store.create("payload", Duration::from_secs(3600)).unwrap();
        let after = Utc::now();

        assert!(receipt.expires_at >= before + chrono::Duration::seconds(3600));
        assert!(receipt.expires_at <= after + chrono::Duration::seconds(3600));
    }

    #[test]
    fn test_ids_are_distinct() {
        let store = SecretStore::new(test_config());
        let a = store.create("a", Duration::from_secs(60)).unwrap();
        let b = store.create("b", Duration::from_secs(60)).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.consume(b.id.as_str()).unwrap(), "b");
        assert_eq!(store.consume(a.id.as_str()).unwrap(), "a");
    }

    #[test]
    fn test_clones_share_table() {
        let store = SecretStore::new(test_config());
        let other = store.clone();
        let receipt = store.create("shared", Duration::from_secs(60)).unwrap();
        assert_eq!(other.consume(receipt.id.as_str()).unwrap(), "shared");
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lazy_expiry_reports_gone() {
        let store = SecretStore::new(StoreConfig {
            active_expiry: false,
            ..test_config()
        });
        let receipt = store.create("payload", Duration::from_secs(60)).unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(store.contains(receipt.id.as_str()));
        assert!(matches!(
            store.consume(receipt.id.as_str()),
            Err(StoreError::Gone)
        ));
        assert!(!store.contains(receipt.id.as_str()));
        assert!(matches!(
            store.consume(receipt.id.as_str()),
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_is_exclusive() {
        let store = SecretStore::new(StoreConfig {
            active_expiry: false,
            ..test_config()
        });
        let early = store.create("early", Duration::from_secs(60)).unwrap();
        let exact = store.create("exact", Duration::from_secs(60)).unwrap();

        tokio::time::advance(Duration::from_millis(59_999)).await;
        assert_eq!(store.consume(early.id.as_str()).unwrap(), "early");

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(matches!(
            store.consume(exact.id.as_str()),
            Err(StoreError::Gone)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaper_frees_expired_record() {
        let store = SecretStore::new(test_config());
        let receipt = store.create("payload", Duration::from_secs(60)).unwrap();

        tokio::time::advance(Duration::from_secs(30)).await;
        settle(&store).await;
        assert!(store.contains(receipt.id.as_str()));

        tokio::time::advance(Duration::from_secs(31)).await;
        settle(&store).await;
        assert!(store.is_empty());
        assert!(matches!(
            store.consume(receipt.id.as_str()),
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_consume_cancels_reaper() {
        let store = SecretStore::new(test_config());
        let consumed = store.create("consumed", Duration::from_secs(60)).unwrap();
        let pending = store.create("pending", Duration::from_secs(600)).unwrap();

        assert_eq!(store.consume(consumed.id.as_str()).unwrap(), "consumed");

        tokio::time::advance(Duration::from_secs(120)).await;
        settle(&store).await;
        assert_eq!(store.len(), 1);
        assert!(store.contains(pending.id.as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store = SecretStore::new(StoreConfig {
            active_expiry: false,
            ..test_config()
        });
        store.create("short", Duration::from_secs(60)).unwrap();
        store.create("short", Duration::from_secs(60)).unwrap();
        let long = store.create("long", Duration::from_secs(600)).unwrap();

        assert_eq!(store.purge_expired(), 0);
        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(store.purge_expired(), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.consume(long.id.as_str()).unwrap(), "long");
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_store_stops_reapers() {
        let store = SecretStore::new(test_config());
        store.create("payload", Duration::from_secs(60)).unwrap();
        drop(store);

        // Reapers hold only a weak reference; advancing past the deadline must not panic
        tokio::time::advance(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;
    }
}
