//! Payment Ledger
//!
//! Authoritative, append-mostly set of payments and the status state machine.
//!
//! ```text
//! Deposit:   Pending ──► Approved ──► Settled
//!               └────────────────────────▲      (instant clear)
//! Transfer:  Pending ──► Approved ══► Settled   (only via TransferValidator)
//! ```
//!
//! Payments are never deleted and Settled is terminal. Each payment entry is
//! locked for the duration of a status change, so two racing settlements of
//! the same payment see one success and one [`LedgerError::AlreadySettled`].

mod error;

pub use error::{LedgerError, LedgerResult};

use dashmap::DashMap;
use rust_decimal::Decimal;
use shared::models::{Payment, PaymentCreate, PaymentStatus, RailType, TransferDetails};
use shared::util::snowflake_id;

use crate::utils::validation::{MAX_PAYMENT_AMOUNT, MAX_SHORT_TEXT_LEN, validate_optional_text};

/// Whether `set_status` may move a payment of this rail from `from` to `to`
///
/// Transfer payments never reach Settled here; that edge belongs to the
/// transfer validation workflow.
pub fn is_allowed_transition(rail: RailType, from: PaymentStatus, to: PaymentStatus) -> bool {
    use PaymentStatus::*;
    matches!(
        (rail, from, to),
        (_, Pending, Approved) | (RailType::Deposit, Approved, Settled) | (RailType::Deposit, Pending, Settled)
    )
}

/// Query over one restaurant's payments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentFilter {
    pub restaurant_id: i64,
    /// Inclusive lower bound (Unix millis)
    pub start: Option<i64>,
    /// Exclusive upper bound (Unix millis)
    pub end: Option<i64>,
    /// Empty = every waiter
    pub waiter_ids: Vec<i64>,
    pub table: Option<String>,
}

impl PaymentFilter {
    pub fn for_restaurant(restaurant_id: i64) -> Self {
        Self {
            restaurant_id,
            ..Default::default()
        }
    }

    pub fn matches(&self, payment: &Payment) -> bool {
        payment.restaurant_id == self.restaurant_id
            && self.start.is_none_or(|s| payment.occurred_at >= s)
            && self.end.is_none_or(|e| payment.occurred_at < e)
            && (self.waiter_ids.is_empty()
                || payment
                    .waiter_id
                    .is_some_and(|w| self.waiter_ids.contains(&w)))
            && self
                .table
                .as_deref()
                .is_none_or(|t| payment.table.as_deref() == Some(t))
    }
}

/// Result of [`PaymentLedger::find`]
///
/// Holds a point-in-time copy of the restaurant's payments; [`PaymentSet::iter`]
/// applies the filter lazily and may be called any number of times.
/// Ordering is unspecified.
#[derive(Debug, Clone)]
pub struct PaymentSet {
    payments: Vec<Payment>,
    filter: PaymentFilter,
}

impl PaymentSet {
    pub fn iter(&self) -> impl Iterator<Item = &Payment> + '_ {
        self.payments.iter().filter(|p| self.filter.matches(p))
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn filter(&self) -> &PaymentFilter {
        &self.filter
    }

    pub fn to_vec(&self) -> Vec<Payment> {
        self.iter().cloned().collect()
    }
}

/// Payment ledger for every restaurant
#[derive(Debug, Default)]
pub struct PaymentLedger {
    payments: DashMap<i64, Payment>,
    /// restaurant id → payment ids, append order
    by_restaurant: DashMap<i64, Vec<i64>>,
    /// restaurant id → write counter
    versions: DashMap<i64, u64>,
}

impl PaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump_version(&self, restaurant_id: i64) {
        *self.versions.entry(restaurant_id).or_insert(0) += 1;
    }

    /// Write counter of a restaurant's payments (0 if never written)
    pub fn version(&self, restaurant_id: i64) -> u64 {
        self.versions.get(&restaurant_id).map(|v| *v).unwrap_or(0)
    }

    /// Append a new payment
    ///
    /// Transfer payments may arrive without `transaction_ref`/`creditor_tax_id`
    /// and be completed later, but never arrive Settled.
    pub fn append(&self, restaurant_id: i64, data: PaymentCreate) -> LedgerResult<Payment> {
        if data.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(format!(
                "amount must be positive, got {}",
                data.amount
            )));
        }
        if data.amount > MAX_PAYMENT_AMOUNT {
            return Err(LedgerError::InvalidAmount(format!(
                "amount exceeds maximum allowed ({}), got {}",
                MAX_PAYMENT_AMOUNT, data.amount
            )));
        }
        if let Some(rating) = data.rating
            && !(1..=5).contains(&rating)
        {
            return Err(LedgerError::InvalidRating(rating));
        }
        if data.occurred_at < 0 {
            return Err(LedgerError::Validation(format!(
                "occurred_at must be a Unix millis timestamp, got {}",
                data.occurred_at
            )));
        }
        validate_optional_text(&data.table, "table", MAX_SHORT_TEXT_LEN)
            .and_then(|_| {
                validate_optional_text(&data.transaction_ref, "transaction_ref", MAX_SHORT_TEXT_LEN)
            })
            .and_then(|_| {
                validate_optional_text(&data.creditor_tax_id, "creditor_tax_id", MAX_SHORT_TEXT_LEN)
            })
            .map_err(|e| LedgerError::Validation(e.message))?;

        let status = data.status.unwrap_or(PaymentStatus::Pending);
        if data.rail_type == RailType::Transfer && status == PaymentStatus::Settled {
            tracing::warn!(restaurant_id, "Transfer payment submitted as settled");
            return Err(LedgerError::Validation(
                "transfer payments must be validated before they are settled".to_string(),
            ));
        }

        let payment = Payment {
            id: snowflake_id(),
            restaurant_id,
            amount: data.amount,
            occurred_at: data.occurred_at,
            rail_type: data.rail_type,
            status,
            table: data.table.filter(|t| !t.trim().is_empty()),
            waiter_id: data.waiter_id,
            rating: data.rating,
            transaction_ref: data.transaction_ref.filter(|r| !r.trim().is_empty()),
            creditor_tax_id: data.creditor_tax_id.filter(|c| !c.trim().is_empty()),
        };

        self.payments.insert(payment.id, payment.clone());
        self.by_restaurant
            .entry(restaurant_id)
            .or_default()
            .push(payment.id);
        self.bump_version(restaurant_id);

        tracing::info!(
            restaurant_id,
            payment_id = payment.id,
            rail = ?payment.rail_type,
            status = %payment.status,
            amount = %payment.amount,
            "Payment appended"
        );
        Ok(payment)
    }

    pub fn get(&self, payment_id: i64) -> LedgerResult<Payment> {
        self.payments
            .get(&payment_id)
            .map(|p| p.value().clone())
            .ok_or(LedgerError::NotFound(payment_id))
    }

    /// Payments of `filter.restaurant_id` matching the filter
    pub fn find(&self, filter: PaymentFilter) -> PaymentSet {
        let ids = self
            .by_restaurant
            .get(&filter.restaurant_id)
            .map(|ids| ids.value().clone())
            .unwrap_or_default();
        let payments = ids
            .iter()
            .filter_map(|id| self.payments.get(id).map(|p| p.value().clone()))
            .collect();
        PaymentSet { payments, filter }
    }

    /// Change the status of a payment following the state machine
    pub fn set_status(&self, payment_id: i64, new_status: PaymentStatus) -> LedgerResult<Payment> {
        let mut entry = self
            .payments
            .get_mut(&payment_id)
            .ok_or(LedgerError::NotFound(payment_id))?;
        let payment = entry.value_mut();
        let from = payment.status;

        if from.is_terminal() && new_status == PaymentStatus::Settled {
            return Err(LedgerError::AlreadySettled(payment_id));
        }
        if !is_allowed_transition(payment.rail_type, from, new_status) {
            tracing::warn!(
                payment_id,
                rail = ?payment.rail_type,
                from = %from,
                to = %new_status,
                "Rejected payment status transition"
            );
            return Err(LedgerError::InvalidTransition {
                payment_id,
                from,
                to: new_status,
            });
        }

        payment.status = new_status;
        let payment = payment.clone();
        drop(entry);
        self.bump_version(payment.restaurant_id);

        tracing::info!(
            restaurant_id = payment.restaurant_id,
            payment_id,
            from = %from,
            to = %new_status,
            "Payment status changed"
        );
        Ok(payment)
    }

    /// Fill in missing Transfer reconciliation fields
    pub fn attach_transfer_details(
        &self,
        payment_id: i64,
        details: TransferDetails,
    ) -> LedgerResult<Payment> {
        validate_optional_text(&details.transaction_ref, "transaction_ref", MAX_SHORT_TEXT_LEN)
            .and_then(|_| {
                validate_optional_text(&details.creditor_tax_id, "creditor_tax_id", MAX_SHORT_TEXT_LEN)
            })
            .map_err(|e| LedgerError::Validation(e.message))?;

        let mut entry = self
            .payments
            .get_mut(&payment_id)
            .ok_or(LedgerError::NotFound(payment_id))?;
        let payment = entry.value_mut();

        if !payment.is_transfer() {
            return Err(LedgerError::Validation(format!(
                "payment {} is not a transfer",
                payment_id
            )));
        }
        if payment.status.is_terminal() {
            return Err(LedgerError::AlreadySettled(payment_id));
        }

        if let Some(r) = details.transaction_ref.filter(|r| !r.trim().is_empty()) {
            payment.transaction_ref = Some(r);
        }
        if let Some(c) = details.creditor_tax_id.filter(|c| !c.trim().is_empty()) {
            payment.creditor_tax_id = Some(c);
        }
        let payment = payment.clone();
        drop(entry);
        self.bump_version(payment.restaurant_id);

        tracing::info!(
            restaurant_id = payment.restaurant_id,
            payment_id,
            has_ref = payment.transaction_ref.is_some(),
            has_creditor = payment.creditor_tax_id.is_some(),
            "Transfer details attached"
        );
        Ok(payment)
    }

    /// Approved → Settled for a Transfer payment whose reference was confirmed
    ///
    /// Re-checks everything under the entry lock; a racing second caller
    /// gets [`LedgerError::AlreadySettled`].
    pub(crate) fn settle_transfer(
        &self,
        payment_id: i64,
        operation_number: &str,
    ) -> LedgerResult<Payment> {
        let mut entry = self
            .payments
            .get_mut(&payment_id)
            .ok_or(LedgerError::NotFound(payment_id))?;
        let payment = entry.value_mut();

        if !payment.is_transfer() {
            return Err(LedgerError::Validation(format!(
                "payment {} is not a transfer",
                payment_id
            )));
        }
        if payment.status.is_terminal() {
            return Err(LedgerError::AlreadySettled(payment_id));
        }
        if payment.status != PaymentStatus::Approved {
            return Err(LedgerError::InvalidTransition {
                payment_id,
                from: payment.status,
                to: PaymentStatus::Settled,
            });
        }
        if let Some(ref existing) = payment.transaction_ref
            && existing != operation_number
        {
            return Err(LedgerError::Validation(format!(
                "transaction reference of payment {} does not match",
                payment_id
            )));
        }

        payment.transaction_ref = Some(operation_number.to_string());
        payment.status = PaymentStatus::Settled;
        let payment = payment.clone();
        drop(entry);
        self.bump_version(payment.restaurant_id);

        tracing::info!(
            restaurant_id = payment.restaurant_id,
            payment_id,
            "Transfer settled"
        );
        Ok(payment)
    }
}
