//! Waiter ranking (top 5 + "Others")

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rust_decimal::Decimal;
use shared::models::{OthersBucket, Payment, RANKING_LEN, RankingEntry, UNKNOWN_GROUP};

use super::grouping::{GroupingContext, waiter_key};

/// Top waiters and everyone else
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub top: Vec<RankingEntry>,
    pub others: OthersBucket,
}

/// Total descending, then waiter id ascending (unknown last), then key
fn rank_order(a: &RankingEntry, b: &RankingEntry) -> Ordering {
    b.total
        .cmp(&a.total)
        .then_with(|| match (a.waiter_id, b.waiter_id) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.key.cmp(&b.key))
}

/// Rank waiter groups by summed amount
pub fn rank_waiters(payments: &[Payment], ctx: &GroupingContext<'_>) -> Ranking {
    let mut entries: BTreeMap<String, RankingEntry> = BTreeMap::new();
    for payment in payments {
        let key = waiter_key(payment, ctx);
        // Unresolved waiters pool under "Unknown" without an id
        let waiter_id = payment.waiter_id.filter(|_| key != UNKNOWN_GROUP);
        let entry = entries.entry(key.clone()).or_insert_with(|| RankingEntry {
            key,
            waiter_id: None,
            display_name: String::new(),
            total: Decimal::ZERO,
            count: 0,
        });
        entry.total += payment.amount;
        entry.count += 1;
        // Lowest id wins when several waiters share a key
        entry.waiter_id = match (entry.waiter_id, waiter_id) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
    }

    let mut ranked: Vec<RankingEntry> = entries
        .into_values()
        .map(|mut e| {
            e.display_name = ctx.waiter_name(e.waiter_id);
            e
        })
        .collect();
    ranked.sort_by(rank_order);

    let rest = if ranked.len() > RANKING_LEN {
        ranked.split_off(RANKING_LEN)
    } else {
        Vec::new()
    };
    let others = OthersBucket {
        total: rest.iter().map(|e| e.total).sum(),
        count: rest.iter().map(|e| e.count).sum(),
        waiter_count: rest.len(),
    };

    Ranking {
        top: ranked,
        others,
    }
}
