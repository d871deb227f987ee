//! Group keys and grouped totals

use std::collections::BTreeMap;

use chrono_tz::Tz;
use rust_decimal::Decimal;
use shared::models::{Dimension, Payment, PaymentGroup, UNKNOWN_GROUP};

use super::rating_stats;
use crate::directory::EmployeeDirectory;
use crate::utils::time::date_key;

/// Everything grouping needs besides the payments
#[derive(Clone, Copy)]
pub struct GroupingContext<'a> {
    /// Business time zone for day keys
    pub tz: Tz,
    /// Waiter tax ids / display names
    pub directory: &'a dyn EmployeeDirectory,
}

impl<'a> GroupingContext<'a> {
    pub fn new(tz: Tz, directory: &'a dyn EmployeeDirectory) -> Self {
        Self { tz, directory }
    }

    /// Display name of a waiter, "Unknown" when absent
    pub fn waiter_name(&self, waiter_id: Option<i64>) -> String {
        waiter_id
            .and_then(|id| self.directory.get(id))
            .map(|e| e.name)
            .unwrap_or_else(|| UNKNOWN_GROUP.to_string())
    }
}

/// Tax id, else display name, else "Unknown"
pub fn waiter_key(payment: &Payment, ctx: &GroupingContext<'_>) -> String {
    let Some(employee) = payment.waiter_id.and_then(|id| ctx.directory.get(id)) else {
        return UNKNOWN_GROUP.to_string();
    };
    if let Some(tax_id) = employee.tax_id.filter(|t| !t.is_empty()) {
        return tax_id;
    }
    if !employee.name.trim().is_empty() {
        return employee.name;
    }
    UNKNOWN_GROUP.to_string()
}

/// Group key of a payment along a dimension
pub fn group_key(payment: &Payment, dimension: Dimension, ctx: &GroupingContext<'_>) -> String {
    match dimension {
        Dimension::Time => date_key(payment.occurred_at, ctx.tz),
        Dimension::Table => payment
            .table
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNKNOWN_GROUP.to_string()),
        Dimension::Waiter => waiter_key(payment, ctx),
    }
}

/// Newest first, ties by id descending
pub fn sort_newest_first(payments: &mut [Payment]) {
    payments.sort_by(|a, b| {
        b.occurred_at
            .cmp(&a.occurred_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// Group payments by key; payments inside each group are newest first
pub fn group_by(
    payments: &[Payment],
    dimension: Dimension,
    ctx: &GroupingContext<'_>,
) -> BTreeMap<String, PaymentGroup> {
    let mut buckets: BTreeMap<String, Vec<Payment>> = BTreeMap::new();
    for payment in payments {
        buckets
            .entry(group_key(payment, dimension, ctx))
            .or_default()
            .push(payment.clone());
    }

    buckets
        .into_iter()
        .map(|(key, mut payments)| {
            sort_newest_first(&mut payments);
            let total = payments.iter().map(|p| p.amount).sum::<Decimal>();
            let (average_rating, rating_count) = rating_stats(payments.iter());
            let group = PaymentGroup {
                key: key.clone(),
                total,
                count: payments.len(),
                average_rating,
                rating_count,
                payments,
            };
            (key, group)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::tests::{TestDirectory, payment};
    use rust_decimal_macros::dec;

    #[test]
    fn test_waiter_key_precedence() {
        let dir = TestDirectory::with(&[(1, "Ana", Some("TAX-A")), (2, "Luis", None)]);
        let ctx = GroupingContext::new(chrono_tz::UTC, &dir);

        assert_eq!(waiter_key(&payment(1, dec!(1), Some(1), 0), &ctx), "TAX-A");
        assert_eq!(waiter_key(&payment(2, dec!(1), Some(2), 0), &ctx), "Luis");
        assert_eq!(waiter_key(&payment(3, dec!(1), Some(99), 0), &ctx), "Unknown");
        assert_eq!(waiter_key(&payment(4, dec!(1), None, 0), &ctx), "Unknown");
    }

    #[test]
    fn test_table_key() {
        let dir = TestDirectory::default();
        let ctx = GroupingContext::new(chrono_tz::UTC, &dir);
        let mut p = payment(1, dec!(1), None, 0);
        assert_eq!(group_key(&p, Dimension::Table, &ctx), "Unknown");
        p.table = Some("12".to_string());
        assert_eq!(group_key(&p, Dimension::Table, &ctx), "12");
    }

    #[test]
    fn test_group_by_time_sorts_newest_first() {
        let dir = TestDirectory::default();
        let ctx = GroupingContext::new(chrono_tz::UTC, &dir);
        let day = 1_704_067_200_000; // 2024-01-01
        let payments = vec![
            payment(1, dec!(5), None, day + 1_000),
            payment(2, dec!(7), None, day + 9_000),
            payment(3, dec!(3), None, day + 86_400_000),
            payment(4, dec!(1), None, day + 9_000),
        ];

        let groups = group_by(&payments, Dimension::Time, &ctx);
        assert_eq!(groups.len(), 2);

        let first = &groups["2024-01-01"];
        assert_eq!(first.total, dec!(13));
        let ids: Vec<i64> = first.payments.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![4, 2, 1]);

        assert_eq!(groups["2024-01-02"].count, 1);
    }
}
