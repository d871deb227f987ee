//! Unified error codes for the tipping platform
//!
//! This module defines all error codes used across tip-server and its clients.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 3xxx: Restaurant errors
//! - 5xxx: Payment errors
//! - 8xxx: Employee and role errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 3xxx: Restaurant ====================
    /// Restaurant not found
    RestaurantNotFound = 3002,
    /// Comparison requires two distinct restaurants
    ComparisonSameRestaurant = 3101,

    // ==================== 5xxx: Payment ====================
    /// Payment not found
    PaymentNotFound = 5001,
    /// Payment amount must be positive
    PaymentInvalidAmount = 5002,
    /// Payment status change not allowed by the lifecycle
    PaymentInvalidTransition = 5003,
    /// Payment is already settled
    PaymentAlreadySettled = 5004,
    /// Payment rating outside 1..=5
    PaymentInvalidRating = 5005,
    /// Transfer reconciliation rejected
    TransferValidationFailed = 5101,
    /// Transfer is missing its creditor tax id
    TransferMissingDetails = 5102,

    // ==================== 8xxx: Employee ====================
    /// Employee not found
    EmployeeNotFound = 8001,
    /// Employee tax id already registered in this restaurant
    EmployeeTaxIdExists = 8002,
    /// Role not found
    RoleNotFound = 8101,
    /// Role name already exists
    RoleNameExists = 8102,
    /// Role is still assigned to employees
    RoleInUse = 8103,
    /// Role percentages would exceed 100%
    RoleBudgetExceeded = 8104,
    /// The last remaining role cannot be deleted
    RoleSoleRemaining = 8105,
    /// Role percentage outside 0..=100
    RoleInvalidPercentage = 8106,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Storage error
    StorageError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Timeout error
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Restaurant
            ErrorCode::RestaurantNotFound => "Restaurant not found",
            ErrorCode::ComparisonSameRestaurant => {
                "Comparison requires two different restaurants"
            }

            // Payment
            ErrorCode::PaymentNotFound => "Payment not found",
            ErrorCode::PaymentInvalidAmount => "Payment amount must be positive",
            ErrorCode::PaymentInvalidTransition => "Payment status change is not allowed",
            ErrorCode::PaymentAlreadySettled => "Payment is already settled",
            ErrorCode::PaymentInvalidRating => "Rating must be between 1 and 5",
            ErrorCode::TransferValidationFailed => "Transfer validation failed",
            ErrorCode::TransferMissingDetails => "Transfer details are incomplete",

            // Employee
            ErrorCode::EmployeeNotFound => "Employee not found",
            ErrorCode::EmployeeTaxIdExists => "Employee tax id already exists",
            ErrorCode::RoleNotFound => "Role not found",
            ErrorCode::RoleNameExists => "Role name already exists",
            ErrorCode::RoleInUse => "Role is assigned to employees",
            ErrorCode::RoleBudgetExceeded => "Role percentages exceed 100%",
            ErrorCode::RoleSoleRemaining => "Cannot delete the only remaining role",
            ErrorCode::RoleInvalidPercentage => "Role percentage must be between 0 and 100",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::StorageError => "Storage error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Restaurant
            3002 => Ok(ErrorCode::RestaurantNotFound),
            3101 => Ok(ErrorCode::ComparisonSameRestaurant),

            // Payment
            5001 => Ok(ErrorCode::PaymentNotFound),
            5002 => Ok(ErrorCode::PaymentInvalidAmount),
            5003 => Ok(ErrorCode::PaymentInvalidTransition),
            5004 => Ok(ErrorCode::PaymentAlreadySettled),
            5005 => Ok(ErrorCode::PaymentInvalidRating),
            5101 => Ok(ErrorCode::TransferValidationFailed),
            5102 => Ok(ErrorCode::TransferMissingDetails),

            // Employee
            8001 => Ok(ErrorCode::EmployeeNotFound),
            8002 => Ok(ErrorCode::EmployeeTaxIdExists),
            8101 => Ok(ErrorCode::RoleNotFound),
            8102 => Ok(ErrorCode::RoleNameExists),
            8103 => Ok(ErrorCode::RoleInUse),
            8104 => Ok(ErrorCode::RoleBudgetExceeded),
            8105 => Ok(ErrorCode::RoleSoleRemaining),
            8106 => Ok(ErrorCode::RoleInvalidPercentage),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::StorageError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
