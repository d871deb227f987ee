//! Transfer Validator
//!
//! Reconciles an Approved Transfer-rail payment against an operator-supplied
//! operation number and settles it. This is the only path that moves a
//! Transfer payment to Settled.
//!
//! # Flow
//!
//! ```text
//! validate(payment_id, operation_number)
//!   ├─ pre-checks on a ledger copy (rail, status, reference, creditor)
//!   ├─ gateway.confirm(claim)  ── bounded by timeout, no lock held
//!   └─ ledger.settle_transfer() ── re-checks under the entry lock
//! ```

mod error;
mod gateway;

pub use error::{TransferError, TransferResult, ValidationFailure};
pub use gateway::{GatewayRejection, ManualSettlementGateway, SettlementGateway, TransferClaim};

use std::sync::Arc;
use std::time::Duration;

use shared::models::{Payment, PaymentStatus};

use crate::ledger::{LedgerError, PaymentLedger};

pub struct TransferValidator {
    ledger: Arc<PaymentLedger>,
    gateway: Arc<dyn SettlementGateway>,
    timeout: Duration,
}

impl std::fmt::Debug for TransferValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferValidator")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl TransferValidator {
    pub fn new(ledger: Arc<PaymentLedger>, gateway: Arc<dyn SettlementGateway>, timeout: Duration) -> Self {
        Self {
            ledger,
            gateway,
            timeout,
        }
    }

    /// Everything that can be decided without the gateway
    fn precheck(payment: &Payment, operation_number: &str) -> TransferResult<String> {
        if !payment.is_transfer() {
            return Err(TransferError::failed(payment.id, ValidationFailure::NotTransfer));
        }
        if payment.status.is_terminal() {
            return Err(LedgerError::AlreadySettled(payment.id).into());
        }
        if payment.status != PaymentStatus::Approved {
            return Err(LedgerError::InvalidTransition {
                payment_id: payment.id,
                from: payment.status,
                to: PaymentStatus::Settled,
            }
            .into());
        }
        if operation_number.is_empty() {
            return Err(TransferError::failed(
                payment.id,
                ValidationFailure::MissingOperationNumber,
            ));
        }
        if let Some(ref existing) = payment.transaction_ref
            && existing != operation_number
        {
            return Err(TransferError::failed(payment.id, ValidationFailure::ReferenceMismatch));
        }
        payment
            .creditor_tax_id
            .clone()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| TransferError::failed(payment.id, ValidationFailure::MissingCreditorTaxId))
    }

    /// Validate a transfer and settle it
    ///
    /// A second call on a settled payment fails with `AlreadySettled`.
    /// Gateway rejection or timeout leaves the ledger untouched.
    pub async fn validate(&self, payment_id: i64, operation_number: &str) -> TransferResult<Payment> {
        let operation_number = operation_number.trim();
        let payment = self.ledger.get(payment_id)?;

        let creditor_tax_id = match Self::precheck(&payment, operation_number) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(payment_id, error = %e, "Transfer validation rejected");
                return Err(e);
            }
        };

        let claim = TransferClaim {
            payment_id,
            restaurant_id: payment.restaurant_id,
            amount: payment.amount,
            operation_number: operation_number.to_string(),
            creditor_tax_id,
        };

        match tokio::time::timeout(self.timeout, self.gateway.confirm(&claim)).await {
            Ok(Ok(())) => {}
            Ok(Err(rejection)) => {
                tracing::warn!(payment_id, reason = %rejection.reason, "Settlement gateway rejected transfer");
                return Err(TransferError::failed(
                    payment_id,
                    ValidationFailure::Rejected(rejection.reason),
                ));
            }
            Err(_) => {
                tracing::warn!(
                    payment_id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Settlement gateway timed out"
                );
                return Err(TransferError::failed(payment_id, ValidationFailure::GatewayTimeout));
            }
        }

        let settled = self
            .ledger
            .settle_transfer(payment_id, operation_number)
            .map_err(|e| match e {
                LedgerError::Validation(_) => {
                    TransferError::failed(payment_id, ValidationFailure::ReferenceMismatch)
                }
                other => other.into(),
            })?;

        tracing::info!(
            restaurant_id = settled.restaurant_id,
            payment_id,
            operation_number = %operation_number,
            "Transfer validated"
        );
        Ok(settled)
    }
}
