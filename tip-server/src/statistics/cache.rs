//! Short-lived snapshot cache
//!
//! Entries expire after the configured TTL and are ignored as soon as the
//! restaurant's ledger version moves past the one they were computed at.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use shared::models::{StatisticsQuery, StatisticsSnapshot};

/// Entry count that triggers a sweep of expired entries
const SWEEP_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub restaurant_id: i64,
    pub query: StatisticsQuery,
}

#[derive(Debug, Clone)]
struct CachedSnapshot {
    ledger_version: u64,
    stored_at: Instant,
    snapshot: StatisticsSnapshot,
}

#[derive(Debug)]
pub struct SnapshotCache {
    ttl: Duration,
    entries: DashMap<CacheKey, CachedSnapshot>,
}

impl SnapshotCache {
    /// A zero TTL disables caching
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub fn get(&self, key: &CacheKey, ledger_version: u64) -> Option<StatisticsSnapshot> {
        if !self.is_enabled() {
            return None;
        }
        let entry = self.entries.get(key)?;
        if entry.ledger_version == ledger_version && entry.stored_at.elapsed() < self.ttl {
            return Some(entry.snapshot.clone());
        }
        drop(entry);
        self.entries.remove(key);
        None
    }

    pub fn insert(&self, key: CacheKey, ledger_version: u64, snapshot: StatisticsSnapshot) {
        if !self.is_enabled() {
            return;
        }
        if self.entries.len() >= SWEEP_THRESHOLD {
            self.sweep();
        }
        self.entries.insert(
            key,
            CachedSnapshot {
                ledger_version,
                stored_at: Instant::now(),
                snapshot,
            },
        );
    }

    /// Drop expired entries
    pub fn sweep(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, v| v.stored_at.elapsed() < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::models::{Dimension, TimeWindow};
    use std::collections::BTreeMap;

    fn snapshot(restaurant_id: i64) -> StatisticsSnapshot {
        StatisticsSnapshot {
            restaurant_id,
            dimension: Dimension::Time,
            window: TimeWindow::LastWeek,
            window_start: 0,
            generated_at: 0,
            grand_total: Decimal::ZERO,
            payment_count: 0,
            settled_total: Decimal::ZERO,
            pending_total: Decimal::ZERO,
            deposit_total: Decimal::ZERO,
            transfer_total: Decimal::ZERO,
            average_rating: None,
            rating_count: 0,
            groups: BTreeMap::new(),
            ranking_top5: None,
            others: None,
            page: None,
        }
    }

    fn key(restaurant_id: i64) -> CacheKey {
        CacheKey {
            restaurant_id,
            query: StatisticsQuery::new(Dimension::Time, TimeWindow::LastWeek),
        }
    }

    #[test]
    fn test_hit_then_version_miss() {
        let cache = SnapshotCache::new(Duration::from_secs(30));
        cache.insert(key(1), 3, snapshot(1));

        assert!(cache.get(&key(1), 3).is_some());
        // Ledger written since
        assert!(cache.get(&key(1), 4).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_ttl_disables() {
        let cache = SnapshotCache::new(Duration::ZERO);
        cache.insert(key(1), 0, snapshot(1));
        assert!(cache.get(&key(1), 0).is_none());
        assert_eq!(cache.len(), 0);
    }
}
