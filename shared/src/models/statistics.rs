//! Statistics Model (derived snapshots, never persisted)

use super::payment::Payment;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of payments shown per group before "expand for more"
pub const GROUP_PREVIEW_LEN: usize = 5;

/// Number of waiters in the ranking before the "Others" bucket
pub const RANKING_LEN: usize = 5;

/// Group key used when the table or waiter is missing
pub const UNKNOWN_GROUP: &str = "Unknown";

/// Aggregation dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Grouped by ISO day
    Time,
    Table,
    Waiter,
}

/// Rolling time window, measured back from the moment of the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    LastWeek,
    LastMonth,
    LastYear,
}

impl TimeWindow {
    pub fn days(&self) -> i64 {
        match self {
            Self::LastWeek => 7,
            Self::LastMonth => 30,
            Self::LastYear => 365,
        }
    }

    /// Inclusive lower bound of the window (Unix millis)
    pub fn start_millis(&self, now: i64) -> i64 {
        now - self.days() * 24 * 60 * 60 * 1000
    }
}

/// One group of the grouped totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentGroup {
    pub key: String,
    pub total: Decimal,
    pub count: usize,
    pub average_rating: Option<f64>,
    pub rating_count: usize,
    /// Newest first
    pub payments: Vec<Payment>,
}

impl PaymentGroup {
    /// First payments of the group, for collapsed display
    pub fn preview(&self) -> &[Payment] {
        let end = self.payments.len().min(GROUP_PREVIEW_LEN);
        &self.payments[..end]
    }

    /// Whether the group has more payments than the preview shows
    pub fn has_more(&self) -> bool {
        self.payments.len() > GROUP_PREVIEW_LEN
    }
}

/// Waiter ranking entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub key: String,
    pub waiter_id: Option<i64>,
    pub display_name: String,
    pub total: Decimal,
    pub count: usize,
}

/// Every waiter outside the top of the ranking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OthersBucket {
    pub total: Decimal,
    pub count: usize,
    pub waiter_count: usize,
}

impl OthersBucket {
    pub fn is_empty(&self) -> bool {
        self.waiter_count == 0
    }
}

/// Pagination metadata for the history view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: u32,
    pub per_page: u32,
    /// Filtered payment count before paging
    pub total: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Statistics query parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatisticsQuery {
    pub dimension: Dimension,
    pub window: TimeWindow,
    /// Restrict to these waiters (empty = all)
    pub waiter_ids: Vec<i64>,
    pub table: Option<String>,
    /// Extra `[start, end)` range (Unix millis)
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl StatisticsQuery {
    pub fn new(dimension: Dimension, window: TimeWindow) -> Self {
        Self {
            dimension,
            window,
            waiter_ids: Vec::new(),
            table: None,
            start: None,
            end: None,
            page: None,
            per_page: None,
        }
    }

    pub fn with_waiters(mut self, waiter_ids: Vec<i64>) -> Self {
        self.waiter_ids = waiter_ids;
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_range(mut self, start: Option<i64>, end: Option<i64>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_page(mut self, page: u32, per_page: u32) -> Self {
        self.page = Some(page);
        self.per_page = Some(per_page);
        self
    }
}

/// Statistics for one restaurant under one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub restaurant_id: i64,
    pub dimension: Dimension,
    pub window: TimeWindow,
    /// Inclusive lower bound used for the window (Unix millis)
    pub window_start: i64,
    /// "now" the snapshot was computed against
    pub generated_at: i64,
    pub grand_total: Decimal,
    pub payment_count: usize,
    pub settled_total: Decimal,
    /// Pending + Approved
    pub pending_total: Decimal,
    pub deposit_total: Decimal,
    pub transfer_total: Decimal,
    pub average_rating: Option<f64>,
    pub rating_count: usize,
    pub groups: BTreeMap<String, PaymentGroup>,
    /// Waiter dimension only
    pub ranking_top5: Option<Vec<RankingEntry>>,
    /// Waiter dimension only
    pub others: Option<OthersBucket>,
    pub page: Option<PageInfo>,
}

/// Side-by-side snapshots under identical filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSnapshot {
    pub main: StatisticsSnapshot,
    pub comparison: StatisticsSnapshot,
}
