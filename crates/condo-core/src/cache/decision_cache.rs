use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::ResolvedAccess;

struct CacheEntry {
    access: Arc<ResolvedAccess>,
    stored_at: Instant,
}

/// Snapshot of a user's invalidation state, taken before resolving from the
/// store. `set_if_current` refuses the write if an invalidation happened since.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTicket {
    epoch: u64,
    generation: u64,
}

/// Thread-safe, TTL-bounded cache of each user's resolved access.
/// Uses DashMap for sharded concurrent access; expiry is checked lazily on read.
pub struct DecisionCache {
    /// Entries: user_id -> resolved access
    storage: DashMap<Uuid, CacheEntry>,
    /// Bumped by every `invalidate`; one counter per user ever invalidated
    generations: DashMap<Uuid, u64>,
    /// Bumped by `clear`; the write lock excludes in-flight `set_if_current`
    epoch: RwLock<u64>,
    ttl: Duration,
}

impl DecisionCache {
    pub fn new(ttl: Duration) -> Self {
        info!("Initializing decision cache (ttl: {:?})", ttl);
        Self {
            storage: DashMap::new(),
            generations: DashMap::new(),
            epoch: RwLock::new(0),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns None if not found or expired; an expired entry is evicted.
    pub fn get(&self, user_id: &Uuid) -> Option<Arc<ResolvedAccess>> {
        let entry = self.storage.get(user_id)?;

        if entry.stored_at.elapsed() >= self.ttl {
            drop(entry); // Release read lock
            self.evict_if_stale(user_id);
            return None;
        }

        Some(entry.access.clone())
    }

    pub fn set(&self, user_id: Uuid, access: Arc<ResolvedAccess>) {
        self.storage.insert(
            user_id,
            CacheEntry {
                access,
                stored_at: Instant::now(),
            },
        );
        debug!("Cached resolved access for user {}", user_id);
    }

    /// Re-checks age under the shard lock, so an entry stored after the
    /// caller's read survives.
    fn evict_if_stale(&self, user_id: &Uuid) {
        if self
            .storage
            .remove_if(user_id, |_, e| e.stored_at.elapsed() >= self.ttl)
            .is_some()
        {
            debug!("Access entry for user {} expired, removed from cache", user_id);
        }
    }

    pub fn ticket(&self, user_id: &Uuid) -> CacheTicket {
        let epoch = self.epoch.read();
        CacheTicket {
            epoch: *epoch,
            generation: self.generations.get(user_id).map_or(0, |g| *g),
        }
    }

    /// Stores `access` only if `user_id` was not invalidated (and the cache not
    /// cleared) since `ticket` was taken. Returns whether the entry was stored.
    pub fn set_if_current(&self, user_id: Uuid, access: Arc<ResolvedAccess>, ticket: CacheTicket) -> bool {
        let epoch = self.epoch.read();
        // Holding the generation shard lock orders this write against `invalidate`
        let generation = self.generations.entry(user_id).or_insert(0);
        if *epoch != ticket.epoch || *generation != ticket.generation {
            debug!("Discarding stale resolution for user {}", user_id);
            return false;
        }

        self.storage.insert(
            user_id,
            CacheEntry {
                access,
                stored_at: Instant::now(),
            },
        );
        debug!("Cached resolved access for user {}", user_id);
        true
    }

    pub fn invalidate(&self, user_id: &Uuid) {
        *self.generations.entry(*user_id).or_insert(0) += 1;
        if self.storage.remove(user_id).is_some() {
            debug!("Invalidated cached access for user {}", user_id);
        }
    }

    pub fn invalidate_many<'a, I>(&self, user_ids: I)
    where
        I: IntoIterator<Item = &'a Uuid>,
    {
        for user_id in user_ids {
            self.invalidate(user_id);
        }
    }

    pub fn clear(&self) {
        let mut epoch = self.epoch.write();
        *epoch += 1;
        self.storage.clear();
        info!("Decision cache cleared");
    }

    /// Sweep every expired entry. Returns number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let start_len = self.storage.len();
        let ttl = self.ttl;
        self.storage.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        let count = start_len.saturating_sub(self.storage.len());

        if count > 0 {
            info!("Purged {} expired access entries", count);
        }

        count
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

impl Default for DecisionCache {
    fn default() -> Self {
        Self::new(Duration::from_millis(condo_shared::constants::DEFAULT_CACHE_TTL_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn access_with(module: &str) -> Arc<ResolvedAccess> {
        let mut access = ResolvedAccess::default();
        access.add_module(module);
        Arc::new(access)
    }

    #[test]
    fn test_get_after_set_returns_payload() {
        let cache = DecisionCache::default();
        let user_id = Uuid::new_v4();

        assert!(cache.get(&user_id).is_none());
        cache.set(user_id, access_with("objetivos"));

        let cached = cache.get(&user_id).unwrap();
        assert!(cached.has_module("objetivos"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let cache = DecisionCache::new(Duration::from_millis(20));
        let user_id = Uuid::new_v4();
        cache.set(user_id, access_with("objetivos"));

        std::thread::sleep(Duration::from_millis(40));
        assert!(cache.get(&user_id).is_none());
        // Lazy eviction happened as part of the read
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_and_invalidate_many() {
        let cache = DecisionCache::default();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        for id in [a, b, c] {
            cache.set(id, access_with("reportes"));
        }

        cache.invalidate(&a);
        assert!(cache.get(&a).is_none());

        cache.invalidate_many(&[b, c]);
        assert!(cache.is_empty());

        // Unknown keys are a no-op
        cache.invalidate(&Uuid::new_v4());
    }

    #[test]
    fn test_clear_drops_everything() {
        let cache = DecisionCache::default();
        cache.set(Uuid::new_v4(), access_with("objetivos"));
        cache.set(Uuid::new_v4(), access_with("reportes"));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_resolution_started_before_invalidate_is_not_cached() {
        let cache = DecisionCache::default();
        let user_id = Uuid::new_v4();

        let ticket = cache.ticket(&user_id);
        cache.invalidate(&user_id);
        assert!(!cache.set_if_current(user_id, access_with("objetivos"), ticket));
        assert!(cache.get(&user_id).is_none());

        let ticket = cache.ticket(&user_id);
        assert!(cache.set_if_current(user_id, access_with("objetivos"), ticket));
        assert!(cache.get(&user_id).is_some());
    }

    #[test]
    fn test_resolution_started_before_clear_is_not_cached() {
        let cache = DecisionCache::default();
        let user_id = Uuid::new_v4();

        let ticket = cache.ticket(&user_id);
        cache.clear();
        assert!(!cache.set_if_current(user_id, access_with("reportes"), ticket));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidating_another_user_keeps_ticket_valid() {
        let cache = DecisionCache::default();
        let (user_id, other) = (Uuid::new_v4(), Uuid::new_v4());

        let ticket = cache.ticket(&user_id);
        cache.invalidate(&other);
        assert!(cache.set_if_current(user_id, access_with("reportes"), ticket));
    }

    #[test]
    fn test_stale_read_does_not_evict_newer_entry() {
        let cache = DecisionCache::new(Duration::from_millis(20));
        let user_id = Uuid::new_v4();
        cache.set(user_id, access_with("objetivos"));
        std::thread::sleep(Duration::from_millis(40));

        // A reader saw the stale entry; a writer refreshes it before eviction runs
        cache.set(user_id, access_with("reportes"));
        cache.evict_if_stale(&user_id);

        let cached = cache.get(&user_id).unwrap();
        assert!(cached.has_module("reportes"));

        std::thread::sleep(Duration::from_millis(40));
        cache.evict_if_stale(&user_id);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_purge_expired_only_removes_stale_entries() {
        let cache = DecisionCache::new(Duration::from_millis(30));
        let stale = Uuid::new_v4();
        cache.set(stale, access_with("objetivos"));
        std::thread::sleep(Duration::from_millis(50));

        let fresh = Uuid::new_v4();
        cache.set(fresh, access_with("reportes"));

        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.get(&fresh).is_some());
    }
}
