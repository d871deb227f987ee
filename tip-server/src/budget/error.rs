use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use crate::directory::DirectoryError;

/// Role budget errors
#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("percentage available: {remaining}%")]
    BudgetExceeded { remaining: i32, requested: i32 },

    #[error("Role {role_id} is assigned to {employee_count} employee(s)")]
    HasEmployees { role_id: i64, employee_count: usize },

    #[error("Role {0} is the only remaining role")]
    SoleRemainingRole(i64),

    #[error("Role not found: {0}")]
    NotFound(i64),

    #[error("Role name already exists: {0}")]
    NameExists(String),

    #[error("Percentage must be between 0 and 100, got {0}")]
    InvalidPercentage(i32),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

pub type BudgetResult<T> = Result<T, BudgetError>;

impl From<BudgetError> for AppError {
    fn from(err: BudgetError) -> Self {
        let message = err.to_string();
        match err {
            BudgetError::BudgetExceeded {
                remaining,
                requested,
            } => AppError::with_message(ErrorCode::RoleBudgetExceeded, message)
                .with_detail("remaining", remaining)
                .with_detail("requested", requested),
            BudgetError::HasEmployees {
                role_id,
                employee_count,
            } => AppError::with_message(ErrorCode::RoleInUse, message)
                .with_detail("role_id", role_id)
                .with_detail("employee_count", employee_count),
            BudgetError::SoleRemainingRole(role_id) => {
                AppError::with_message(ErrorCode::RoleSoleRemaining, message)
                    .with_detail("role_id", role_id)
            }
            BudgetError::NotFound(role_id) => {
                AppError::with_message(ErrorCode::RoleNotFound, message)
                    .with_detail("role_id", role_id)
            }
            BudgetError::NameExists(name) => {
                AppError::with_message(ErrorCode::RoleNameExists, message).with_detail("name", name)
            }
            BudgetError::InvalidPercentage(p) => {
                AppError::with_message(ErrorCode::RoleInvalidPercentage, message)
                    .with_detail("percentage", p)
            }
            BudgetError::Validation(_) => AppError::validation(message),
            BudgetError::Directory(e) => e.into(),
        }
    }
}
