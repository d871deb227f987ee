//! Role Model (tip-share roles)

use serde::{Deserialize, Serialize};

/// Upper bound for the sum of all role percentages in a restaurant
pub const ROLE_BUDGET_TOTAL: i32 = 100;

/// Staff role with its share of the restaurant tip pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub restaurant_id: i64,
    /// Unique per restaurant
    pub name: String,
    /// Display-only color (`#RRGGBB`)
    pub color: String,
    /// Share of the tip pool, 0..=100
    pub percentage: i32,
}

/// Create role payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleCreate {
    pub name: String,
    pub color: String,
    pub percentage: i32,
}

/// Update role payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    pub percentage: Option<i32>,
}

/// Budget summary for a restaurant's roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBudgetSummary {
    pub restaurant_id: i64,
    pub allocated: i32,
    pub remaining: i32,
    pub role_count: usize,
}
