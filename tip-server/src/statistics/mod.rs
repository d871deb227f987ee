//! Statistics Service
//!
//! Builds [`StatisticsSnapshot`]s for one restaurant, or two side by side
//! under identical filters. Snapshots are derived on demand and cached for a
//! short TTL.

mod cache;

pub use cache::{CacheKey, SnapshotCache};

use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    ComparisonSnapshot, Dimension, PageInfo, Payment, StatisticsQuery, StatisticsSnapshot,
};
use shared::util::now_millis;
use thiserror::Error;

use crate::aggregation::{GroupingContext, group_by, rank_waiters, sort_newest_first, totals};
use crate::directory::EmployeeDirectory;
use crate::ledger::{PaymentFilter, PaymentLedger};
use crate::utils::validation::MAX_PER_PAGE;

/// Statistics errors
#[derive(Debug, Error)]
pub enum StatisticsError {
    #[error("Cannot compare restaurant {0} with itself")]
    SameRestaurant(i64),

    #[error("{0}")]
    InvalidQuery(String),
}

pub type StatisticsResult<T> = Result<T, StatisticsError>;

impl From<StatisticsError> for AppError {
    fn from(err: StatisticsError) -> Self {
        let message = err.to_string();
        match err {
            StatisticsError::SameRestaurant(id) => {
                AppError::with_message(ErrorCode::ComparisonSameRestaurant, message)
                    .with_detail("restaurant_id", id)
            }
            StatisticsError::InvalidQuery(_) => AppError::with_message(ErrorCode::ValueOutOfRange, message),
        }
    }
}

/// Page metadata for `total` items
///
/// `has_previous` = page > 1, `has_next` = page * per_page < total.
pub fn page_info(page: u32, per_page: u32, total: usize) -> PageInfo {
    let seen = page as usize * per_page as usize;
    PageInfo {
        page,
        per_page,
        total,
        has_next: seen < total,
        has_previous: page > 1,
    }
}

/// Slice of `items` for a 1-based page (empty past the end)
pub fn page_slice<T>(items: &[T], page: u32, per_page: u32) -> &[T] {
    let offset = (page as usize - 1) * per_page as usize;
    if offset >= items.len() {
        return &[];
    }
    let end = (offset + per_page as usize).min(items.len());
    &items[offset..end]
}

pub struct StatisticsService {
    ledger: Arc<PaymentLedger>,
    directory: Arc<dyn EmployeeDirectory>,
    tz: Tz,
    default_per_page: u32,
    cache: SnapshotCache,
}

impl std::fmt::Debug for StatisticsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticsService")
            .field("tz", &self.tz)
            .field("default_per_page", &self.default_per_page)
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl StatisticsService {
    pub fn new(
        ledger: Arc<PaymentLedger>,
        directory: Arc<dyn EmployeeDirectory>,
        tz: Tz,
        cache_ttl: Duration,
        default_per_page: u32,
    ) -> Self {
        Self {
            ledger,
            directory,
            tz,
            default_per_page: default_per_page.clamp(1, MAX_PER_PAGE),
            cache: SnapshotCache::new(cache_ttl),
        }
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// Fill in defaults and reject impossible values
    fn normalize(&self, query: &StatisticsQuery) -> StatisticsResult<StatisticsQuery> {
        let mut q = query.clone();
        if let (Some(start), Some(end)) = (q.start, q.end)
            && start >= end
        {
            return Err(StatisticsError::InvalidQuery(format!(
                "start ({start}) must be before end ({end})"
            )));
        }
        if q.page.is_some() || q.per_page.is_some() {
            let page = q.page.unwrap_or(1);
            let per_page = q.per_page.unwrap_or(self.default_per_page);
            if page == 0 {
                return Err(StatisticsError::InvalidQuery("page starts at 1".to_string()));
            }
            if per_page == 0 || per_page > MAX_PER_PAGE {
                return Err(StatisticsError::InvalidQuery(format!(
                    "per_page must be between 1 and {MAX_PER_PAGE}, got {per_page}"
                )));
            }
            q.page = Some(page);
            q.per_page = Some(per_page);
        }
        q.waiter_ids.sort_unstable();
        q.waiter_ids.dedup();
        Ok(q)
    }

    /// Snapshot for one restaurant (served from cache when fresh)
    pub fn get_snapshot(
        &self,
        restaurant_id: i64,
        query: &StatisticsQuery,
    ) -> StatisticsResult<StatisticsSnapshot> {
        let query = self.normalize(query)?;
        Ok(self.cached_snapshot(restaurant_id, query, now_millis()))
    }

    /// Snapshots for two restaurants under identical filters and the same "now"
    pub fn get_comparison(
        &self,
        main_restaurant_id: i64,
        comparison_restaurant_id: i64,
        query: &StatisticsQuery,
    ) -> StatisticsResult<ComparisonSnapshot> {
        if main_restaurant_id == comparison_restaurant_id {
            return Err(StatisticsError::SameRestaurant(main_restaurant_id));
        }
        let query = self.normalize(query)?;
        let main_key = CacheKey {
            restaurant_id: main_restaurant_id,
            query: query.clone(),
        };
        let comparison_key = CacheKey {
            restaurant_id: comparison_restaurant_id,
            query,
        };

        // Both sides must share one "now"; a lone hit is recomputed with its peer
        if let (Some(main), Some(comparison)) = (self.lookup(&main_key), self.lookup(&comparison_key))
            && main.generated_at == comparison.generated_at
        {
            return Ok(ComparisonSnapshot { main, comparison });
        }

        let now = now_millis();
        Ok(ComparisonSnapshot {
            main: self.compute_and_store(main_key, now),
            comparison: self.compute_and_store(comparison_key, now),
        })
    }

    /// Uncached snapshot against an explicit "now"
    pub fn snapshot_at(
        &self,
        restaurant_id: i64,
        query: &StatisticsQuery,
        now: i64,
    ) -> StatisticsResult<StatisticsSnapshot> {
        let query = self.normalize(query)?;
        Ok(self.compute(restaurant_id, &query, now))
    }

    fn cached_snapshot(&self, restaurant_id: i64, query: StatisticsQuery, now: i64) -> StatisticsSnapshot {
        let key = CacheKey {
            restaurant_id,
            query,
        };
        match self.lookup(&key) {
            Some(snapshot) => snapshot,
            None => self.compute_and_store(key, now),
        }
    }

    fn lookup(&self, key: &CacheKey) -> Option<StatisticsSnapshot> {
        let version = self.ledger.version(key.restaurant_id);
        let hit = self.cache.get(key, version);
        tracing::debug!(
            restaurant_id = key.restaurant_id,
            version,
            hit = hit.is_some(),
            "Statistics cache lookup"
        );
        hit
    }

    /// Compute against `now` and cache under the version read beforehand
    fn compute_and_store(&self, key: CacheKey, now: i64) -> StatisticsSnapshot {
        let version = self.ledger.version(key.restaurant_id);
        let snapshot = self.compute(key.restaurant_id, &key.query, now);
        self.cache.insert(key, version, snapshot.clone());
        snapshot
    }

    fn compute(&self, restaurant_id: i64, query: &StatisticsQuery, now: i64) -> StatisticsSnapshot {
        let window_start = query.window.start_millis(now);
        let filter = PaymentFilter {
            restaurant_id,
            start: Some(query.start.map_or(window_start, |s| s.max(window_start))),
            end: query.end,
            waiter_ids: query.waiter_ids.clone(),
            table: query.table.clone(),
        };
        let mut payments: Vec<Payment> = self.ledger.find(filter).to_vec();
        sort_newest_first(&mut payments);

        let ctx = GroupingContext::new(self.tz, self.directory.as_ref());
        let totals = totals(&payments);
        let ranking = match query.dimension {
            Dimension::Waiter => Some(rank_waiters(&payments, &ctx)),
            Dimension::Time | Dimension::Table => None,
        };

        // Paging cuts the sorted sequence before grouping
        let (visible, page) = match (query.page, query.per_page) {
            (Some(page), Some(per_page)) => (
                page_slice(&payments, page, per_page),
                Some(page_info(page, per_page, payments.len())),
            ),
            _ => (payments.as_slice(), None),
        };
        let groups = group_by(visible, query.dimension, &ctx);

        tracing::debug!(
            restaurant_id,
            dimension = ?query.dimension,
            window = ?query.window,
            payments = totals.payment_count,
            groups = groups.len(),
            "Statistics snapshot computed"
        );

        let (ranking_top5, others) = match ranking {
            Some(r) => (Some(r.top), Some(r.others)),
            None => (None, None),
        };

        StatisticsSnapshot {
            restaurant_id,
            dimension: query.dimension,
            window: query.window,
            window_start,
            generated_at: now,
            grand_total: totals.grand_total,
            payment_count: totals.payment_count,
            settled_total: totals.settled_total,
            pending_total: totals.pending_total,
            deposit_total: totals.deposit_total,
            transfer_total: totals.transfer_total,
            average_rating: totals.average_rating,
            rating_count: totals.rating_count,
            groups,
            ranking_top5,
            others,
            page,
        }
    }
}
