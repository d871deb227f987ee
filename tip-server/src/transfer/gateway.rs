//! Settlement gateway boundary
//!
//! The external settlement collaborator decides whether an operator-supplied
//! operation number really matches a bank transfer. Calls are bounded by a
//! timeout at the validator; the ledger is never touched while waiting.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What the validator asks the gateway to confirm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferClaim {
    pub payment_id: i64,
    pub restaurant_id: i64,
    pub amount: Decimal,
    pub operation_number: String,
    pub creditor_tax_id: String,
}

/// Gateway verdict when the claim does not hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRejection {
    pub reason: String,
}

impl GatewayRejection {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
pub trait SettlementGateway: Send + Sync {
    async fn confirm(&self, claim: &TransferClaim) -> Result<(), GatewayRejection>;
}

/// Accepts the operator's confirmation as-is
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualSettlementGateway;

#[async_trait]
impl SettlementGateway for ManualSettlementGateway {
    async fn confirm(&self, claim: &TransferClaim) -> Result<(), GatewayRejection> {
        tracing::debug!(
            payment_id = claim.payment_id,
            operation_number = %claim.operation_number,
            "Manual settlement confirmation"
        );
        Ok(())
    }
}
