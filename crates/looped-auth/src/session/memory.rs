//! In-process session registry using the moka crate.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use moka::notification::RemovalCause;
use tracing::{debug, warn};

use looped_core::config::SessionConfig;
use looped_core::result::AppResult;
use looped_core::types::{SessionId, StaffId};

use super::store::{SessionRecord, SessionStore};

/// Session registry held in a bounded moka cache.
///
/// The cache-level TTL matches the token TTL, so entries also fall out on
/// their own if pruning never runs.
///
/// The cache holds at most `session.max_sessions` entries. Beyond that moka
/// evicts sessions that are still live, and their holders are logged out.
/// Each such eviction is logged at warn level and counted.
#[derive(Debug, Clone)]
pub struct MemorySessionStore {
    cache: Cache<SessionId, SessionRecord>,
    evicted: Arc<AtomicU64>,
}

impl MemorySessionStore {
    /// Create a session registry from configuration.
    pub fn new(config: &SessionConfig) -> Self {
        let evicted = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&evicted);
        let cache = Cache::builder()
            .max_capacity(config.max_sessions)
            .time_to_live(Duration::from_secs(config.ttl_minutes * 60))
            .eviction_listener(
                move |session_id: Arc<SessionId>, record: SessionRecord, cause| {
                    if cause == RemovalCause::Size {
                        counter.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            session_id = %session_id,
                            staff_id = %record.staff_id,
                            "Live session evicted, session capacity reached"
                        );
                    }
                },
            )
            .build();

        Self { cache, evicted }
    }

    /// Number of sessions dropped because the store was full.
    pub fn evicted_by_capacity(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    async fn remove_matching<F>(&self, predicate: F) -> u64
    where
        F: Fn(&SessionRecord) -> bool + Send,
    {
        // Collect first; invalidating while iterating is not supported.
        let doomed: Vec<SessionId> = self
            .cache
            .iter()
            .filter(|(_, record)| predicate(record))
            .map(|(id, _)| *id)
            .collect();

        for id in &doomed {
            self.cache.invalidate(id).await;
        }
        doomed.len() as u64
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, record: SessionRecord) -> AppResult<()> {
        debug!(
            session_id = %record.session_id,
            staff_id = %record.staff_id,
            "Registering session"
        );
        self.cache.insert(record.session_id, record).await;
        Ok(())
    }

    async fn is_active(&self, session_id: SessionId, now: DateTime<Utc>) -> AppResult<bool> {
        Ok(self
            .cache
            .get(&session_id)
            .await
            .is_some_and(|record| record.is_live_at(now)))
    }

    async fn get(&self, session_id: SessionId) -> AppResult<Option<SessionRecord>> {
        Ok(self.cache.get(&session_id).await)
    }

    async fn rebind(&self, session_id: SessionId, credential_tag: String) -> AppResult<bool> {
        let Some(mut record) = self.cache.get(&session_id).await else {
            return Ok(false);
        };
        record.credential_tag = credential_tag;
        self.cache.insert(session_id, record).await;
        Ok(true)
    }

    async fn revoke(&self, session_id: SessionId) -> AppResult<bool> {
        Ok(self.cache.remove(&session_id).await.is_some())
    }

    async fn revoke_all_for_staff(
        &self,
        staff_id: StaffId,
        keep: Option<SessionId>,
    ) -> AppResult<u64> {
        let removed = self
            .remove_matching(|record| {
                record.staff_id == staff_id && Some(record.session_id) != keep
            })
            .await;
        debug!(staff_id = %staff_id, removed, "Revoked staff sessions");
        Ok(removed)
    }

    async fn prune(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let removed = self.remove_matching(|record| !record.is_live_at(now)).await;
        self.cache.run_pending_tasks().await;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use super::*;

    fn record(staff_id: StaffId, now: DateTime<Utc>, minutes: i64) -> SessionRecord {
        SessionRecord {
            session_id: SessionId::new(),
            staff_id,
            created_at: now,
            expires_at: now + ChronoDuration::minutes(minutes),
            credential_tag: SessionRecord::tag_for("$argon2id$v=19$stub"),
        }
    }

    #[tokio::test]
    async fn test_create_and_revoke() {
        let store = MemorySessionStore::new(&SessionConfig::default());
        let now = Utc::now();
        let session = record(StaffId::new(), now, 60);
        store.create(session.clone()).await.unwrap();

        assert!(store.is_active(session.session_id, now).await.unwrap());
        assert!(store.revoke(session.session_id).await.unwrap());
        assert!(!store.revoke(session.session_id).await.unwrap());
        assert!(!store.is_active(session.session_id, now).await.unwrap());
    }

    #[tokio::test]
    async fn test_lapsed_session_is_inactive_and_pruned() {
        let store = MemorySessionStore::new(&SessionConfig::default());
        let now = Utc::now();
        let session = record(StaffId::new(), now, 10);
        store.create(session.clone()).await.unwrap();

        let later = now + ChronoDuration::minutes(10);
        assert!(!store.is_active(session.session_id, later).await.unwrap());
        assert_eq!(store.prune(later).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_revoke_all_keeps_requested_session() {
        let store = MemorySessionStore::new(&SessionConfig::default());
        let now = Utc::now();
        let alice = StaffId::new();
        let bob = StaffId::new();

        let keep = record(alice, now, 60);
        let other = record(alice, now, 60);
        let bobs = record(bob, now, 60);
        for r in [&keep, &other, &bobs] {
            store.create(r.clone()).await.unwrap();
        }

        let removed = store
            .revoke_all_for_staff(alice, Some(keep.session_id))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.is_active(keep.session_id, now).await.unwrap());
        assert!(!store.is_active(other.session_id, now).await.unwrap());
        assert!(store.is_active(bobs.session_id, now).await.unwrap());
    }

    #[tokio::test]
    async fn test_rebind_replaces_credential_tag() {
        let store = MemorySessionStore::new(&SessionConfig::default());
        let now = Utc::now();
        let session = record(StaffId::new(), now, 60);
        store.create(session.clone()).await.unwrap();

        assert!(store.rebind(session.session_id, "fresh".to_string()).await.unwrap());
        let stored = store.get(session.session_id).await.unwrap().unwrap();
        assert_eq!(stored.credential_tag, "fresh");
        assert!(!store.rebind(SessionId::new(), "fresh".to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn test_capacity_eviction_is_counted() {
        let config = SessionConfig {
            max_sessions: 1,
            ..SessionConfig::default()
        };
        let store = MemorySessionStore::new(&config);
        let now = Utc::now();
        for _ in 0..4 {
            store.create(record(StaffId::new(), now, 60)).await.unwrap();
            store.cache.run_pending_tasks().await;
        }

        assert!(store.cache.entry_count() <= 1);
        assert!(store.evicted_by_capacity() >= 1);
    }
}
