//! Employee Directory
//!
//! Employees are read by the role deletion guard and by the waiter
//! grouping (tax id / display name). The in-memory directory also owns the
//! explicit "unassign employees from a role" step that must precede a
//! role deletion.
//!
//! Writes that point an employee at a role are crate-private: outside
//! callers go through [`crate::budget::RoleBudget`], which checks the role
//! under its lock.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use shared::error::{AppError, ErrorCode};
use shared::models::{Employee, EmployeeCreate, PaymentLinkStatus};
use shared::util::snowflake_id;
use thiserror::Error;

use crate::utils::validation::{
    MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text,
    validate_required_text,
};

/// Directory errors
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Employee not found: {0}")]
    NotFound(i64),

    #[error("Tax id already registered: {0}")]
    TaxIdExists(String),

    #[error("{0}")]
    Validation(String),
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotFound(id) => {
                AppError::with_message(ErrorCode::EmployeeNotFound, format!("Employee {} not found", id))
                    .with_detail("employee_id", id)
            }
            DirectoryError::TaxIdExists(tax_id) => AppError::with_message(
                ErrorCode::EmployeeTaxIdExists,
                format!("Tax id {} is already registered", tax_id),
            )
            .with_detail("tax_id", tax_id),
            DirectoryError::Validation(msg) => AppError::validation(msg),
        }
    }
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Read-only view of the employee directory
pub trait EmployeeDirectory: Send + Sync {
    /// Employees of a restaurant currently referencing the role
    fn count_by_role(&self, restaurant_id: i64, role_id: i64) -> usize;

    fn get(&self, employee_id: i64) -> Option<Employee>;
}

/// In-memory employee directory
#[derive(Clone, Default)]
pub struct InMemoryDirectory {
    employees: Arc<RwLock<HashMap<i64, Employee>>>,
}

impl std::fmt::Debug for InMemoryDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDirectory")
            .field("employees", &self.employees.read().len())
            .finish()
    }
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new employee (role may be unassigned)
    pub(crate) fn register(&self, restaurant_id: i64, data: EmployeeCreate) -> DirectoryResult<Employee> {
        validate_required_text(&data.name, "name", MAX_NAME_LEN)
            .and_then(|_| validate_optional_text(&data.email, "email", MAX_EMAIL_LEN))
            .and_then(|_| validate_optional_text(&data.phone, "phone", MAX_SHORT_TEXT_LEN))
            .and_then(|_| validate_optional_text(&data.tax_id, "tax_id", MAX_SHORT_TEXT_LEN))
            .map_err(|e| DirectoryError::Validation(e.message))?;

        let tax_id = data
            .tax_id
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let mut employees = self.employees.write();
        if let Some(ref tax_id) = tax_id {
            let taken = employees
                .values()
                .any(|e| e.restaurant_id == restaurant_id && e.tax_id.as_deref() == Some(tax_id));
            if taken {
                tracing::warn!(restaurant_id, tax_id = %tax_id, "Duplicate employee tax id");
                return Err(DirectoryError::TaxIdExists(tax_id.clone()));
            }
        }

        let employee = Employee {
            id: snowflake_id(),
            restaurant_id,
            name: data.name.trim().to_string(),
            email: data.email,
            phone: data.phone,
            tax_id,
            role_id: data.role_id,
            payment_link_status: PaymentLinkStatus::Unlinked,
        };
        employees.insert(employee.id, employee.clone());

        tracing::info!(
            restaurant_id,
            employee_id = employee.id,
            role_id = ?employee.role_id,
            "Employee registered"
        );
        Ok(employee)
    }

    /// Point an employee at a role, or clear it with `None`
    pub(crate) fn assign_role(&self, employee_id: i64, role_id: Option<i64>) -> DirectoryResult<Employee> {
        let mut employees = self.employees.write();
        let employee = employees
            .get_mut(&employee_id)
            .ok_or(DirectoryError::NotFound(employee_id))?;
        employee.role_id = role_id;
        tracing::info!(employee_id, role_id = ?role_id, "Employee role assigned");
        Ok(employee.clone())
    }

    /// First step of a role deletion: move every referencing employee to "No role".
    ///
    /// Returns the number of employees that were unassigned.
    pub fn unassign_role(&self, restaurant_id: i64, role_id: i64) -> usize {
        let mut employees = self.employees.write();
        let mut count = 0;
        for employee in employees
            .values_mut()
            .filter(|e| e.restaurant_id == restaurant_id && e.role_id == Some(role_id))
        {
            employee.role_id = None;
            count += 1;
        }
        tracing::info!(restaurant_id, role_id, count, "Employees unassigned from role");
        count
    }

    /// Mark the employee's payout account as connected
    pub fn link_payment_account(&self, employee_id: i64) -> DirectoryResult<Employee> {
        let mut employees = self.employees.write();
        let employee = employees
            .get_mut(&employee_id)
            .ok_or(DirectoryError::NotFound(employee_id))?;
        employee.payment_link_status = PaymentLinkStatus::Linked;
        tracing::info!(employee_id, "Employee payment account linked");
        Ok(employee.clone())
    }

    /// Employees of a restaurant, ordered by name
    pub fn list(&self, restaurant_id: i64) -> Vec<Employee> {
        let mut list: Vec<Employee> = self
            .employees
            .read()
            .values()
            .filter(|e| e.restaurant_id == restaurant_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        list
    }
}

impl EmployeeDirectory for InMemoryDirectory {
    fn count_by_role(&self, restaurant_id: i64, role_id: i64) -> usize {
        self.employees
            .read()
            .values()
            .filter(|e| e.restaurant_id == restaurant_id && e.role_id == Some(role_id))
            .count()
    }

    fn get(&self, employee_id: i64) -> Option<Employee> {
        self.employees.read().get(&employee_id).cloned()
    }
}
