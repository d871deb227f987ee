//! Employee Model

use serde::{Deserialize, Serialize};

/// Whether the employee has connected a payout account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentLinkStatus {
    #[default]
    Unlinked,
    Linked,
}

/// Employee record as supplied by the employee directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Unique per restaurant
    pub tax_id: Option<String>,
    /// `None` is the flagged "No role assigned" state
    pub role_id: Option<i64>,
    #[serde(default)]
    pub payment_link_status: PaymentLinkStatus,
}

impl Employee {
    /// Whether the employee sits in the "No role assigned" state
    pub fn has_no_role(&self) -> bool {
        self.role_id.is_none()
    }
}

/// Create employee payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeCreate {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
    pub role_id: Option<i64>,
}
