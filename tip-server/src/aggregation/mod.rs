//! Aggregation Engine
//!
//! Stateless functions that filter, group, total and rank payments.
//! Same input always yields the same output: groups live in a `BTreeMap`,
//! payments inside a group are newest first (ties by id) and ranking ties
//! resolve by ascending waiter id.

pub mod grouping;
pub mod ranking;

pub use grouping::{GroupingContext, group_by, group_key, sort_newest_first, waiter_key};
pub use ranking::{Ranking, rank_waiters};

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use shared::models::{Dimension, Payment, PaymentGroup, PaymentStatus, RailType, TimeWindow};

/// Monetary totals over a payment set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Totals {
    pub grand_total: Decimal,
    pub payment_count: usize,
    pub settled_total: Decimal,
    /// Pending + Approved
    pub pending_total: Decimal,
    pub deposit_total: Decimal,
    pub transfer_total: Decimal,
    pub average_rating: Option<f64>,
    pub rating_count: usize,
}

/// Result of [`aggregate`]
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub totals: Totals,
    pub groups: BTreeMap<String, PaymentGroup>,
    /// Waiter dimension only
    pub ranking: Option<Ranking>,
}

/// Average and count over payments that carry a rating
pub fn rating_stats<'a>(payments: impl Iterator<Item = &'a Payment>) -> (Option<f64>, usize) {
    let (sum, count) = payments
        .filter_map(|p| p.rating)
        .fold((0u32, 0usize), |(s, c), r| (s + u32::from(r), c + 1));
    if count == 0 {
        (None, 0)
    } else {
        (Some(f64::from(sum) / count as f64), count)
    }
}

/// Totals over every payment given
pub fn totals(payments: &[Payment]) -> Totals {
    let mut t = Totals {
        payment_count: payments.len(),
        ..Default::default()
    };
    for p in payments {
        t.grand_total += p.amount;
        match p.status {
            PaymentStatus::Settled => t.settled_total += p.amount,
            PaymentStatus::Pending | PaymentStatus::Approved => t.pending_total += p.amount,
        }
        match p.rail_type {
            RailType::Deposit => t.deposit_total += p.amount,
            RailType::Transfer => t.transfer_total += p.amount,
        }
    }
    let (average_rating, rating_count) = rating_stats(payments.iter());
    t.average_rating = average_rating;
    t.rating_count = rating_count;
    t
}

/// Rolling window: `occurred_at >= now - days`
pub fn within_window(payment: &Payment, window: TimeWindow, now: i64) -> bool {
    payment.occurred_at >= window.start_millis(now)
}

/// Window-filter, total, group and (for waiters) rank
pub fn aggregate<'a>(
    payments: impl IntoIterator<Item = &'a Payment>,
    dimension: Dimension,
    window: TimeWindow,
    now: i64,
    ctx: &GroupingContext<'_>,
) -> Aggregation {
    let mut filtered: Vec<Payment> = payments
        .into_iter()
        .filter(|p| within_window(p, window, now))
        .cloned()
        .collect();
    sort_newest_first(&mut filtered);
    summarize(&filtered, dimension, ctx)
}

/// Total, group and rank payments that are already filtered
pub fn summarize(payments: &[Payment], dimension: Dimension, ctx: &GroupingContext<'_>) -> Aggregation {
    let ranking = match dimension {
        Dimension::Waiter => Some(rank_waiters(payments, ctx)),
        Dimension::Time | Dimension::Table => None,
    };
    Aggregation {
        totals: totals(payments),
        groups: group_by(payments, dimension, ctx),
        ranking,
    }
}
