//! Payment Model (tips received through QR payments)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payment channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RailType {
    /// Direct digital tip
    Deposit,
    /// Bank transfer that needs manual reconciliation
    Transfer,
}

/// Payment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Approved,
    /// Money reached the destination account
    #[serde(alias = "transferido")]
    Settled,
}

impl PaymentStatus {
    /// Settled is the only terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Settled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Settled => "settled",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment record held by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub restaurant_id: i64,
    pub amount: Decimal,
    /// Approval/creation time (Unix millis)
    pub occurred_at: i64,
    pub rail_type: RailType,
    pub status: PaymentStatus,
    /// Present for dine-in QR payments
    pub table: Option<String>,
    pub waiter_id: Option<i64>,
    /// 1..=5, only when the payer left a review
    pub rating: Option<u8>,
    pub transaction_ref: Option<String>,
    pub creditor_tax_id: Option<String>,
}

impl Payment {
    pub fn is_transfer(&self) -> bool {
        self.rail_type == RailType::Transfer
    }
}

/// Payload the settlement feed submits to append a payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCreate {
    pub amount: Decimal,
    pub occurred_at: i64,
    pub rail_type: RailType,
    /// Defaults to `Pending`
    pub status: Option<PaymentStatus>,
    pub table: Option<String>,
    pub waiter_id: Option<i64>,
    pub rating: Option<u8>,
    pub transaction_ref: Option<String>,
    pub creditor_tax_id: Option<String>,
}

/// Late fill-in of Transfer reconciliation fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferDetails {
    pub transaction_ref: Option<String>,
    pub creditor_tax_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_accepts_source_alias() {
        let status: PaymentStatus = serde_json::from_str("\"transferido\"").unwrap();
        assert_eq!(status, PaymentStatus::Settled);

        let json = serde_json::to_string(&PaymentStatus::Settled).unwrap();
        assert_eq!(json, "\"settled\"");
    }

    #[test]
    fn test_only_settled_is_terminal() {
        assert!(PaymentStatus::Settled.is_terminal());
        assert!(!PaymentStatus::Approved.is_terminal());
        assert!(!PaymentStatus::Pending.is_terminal());
    }
}
