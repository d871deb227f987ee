use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use crate::ledger::LedgerError;

/// Why a transfer could not be reconciled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    /// Payment is on the Deposit rail
    NotTransfer,
    /// Operation number is empty
    MissingOperationNumber,
    /// Creditor tax id was never filled in
    MissingCreditorTaxId,
    /// Operation number differs from the recorded transaction reference
    ReferenceMismatch,
    /// Gateway said no
    Rejected(String),
    /// Gateway did not answer in time
    GatewayTimeout,
}

impl ValidationFailure {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotTransfer => "not_transfer",
            Self::MissingOperationNumber => "missing_operation_number",
            Self::MissingCreditorTaxId => "missing_creditor_tax_id",
            Self::ReferenceMismatch => "reference_mismatch",
            Self::Rejected(_) => "rejected",
            Self::GatewayTimeout => "gateway_timeout",
        }
    }
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(reason) => write!(f, "rejected: {}", reason),
            other => f.write_str(other.code()),
        }
    }
}

/// Transfer validation errors
#[derive(Debug, Error)]
pub enum TransferError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Transfer validation failed for payment {payment_id}: {reason}")]
    ValidationFailed {
        payment_id: i64,
        reason: ValidationFailure,
    },
}

pub type TransferResult<T> = Result<T, TransferError>;

impl TransferError {
    pub fn failed(payment_id: i64, reason: ValidationFailure) -> Self {
        Self::ValidationFailed { payment_id, reason }
    }

    pub fn is_already_settled(&self) -> bool {
        matches!(self, Self::Ledger(LedgerError::AlreadySettled(_)))
    }
}

impl From<TransferError> for AppError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::Ledger(e) => e.into(),
            TransferError::ValidationFailed { payment_id, reason } => {
                let code = match reason {
                    ValidationFailure::MissingCreditorTaxId
                    | ValidationFailure::MissingOperationNumber => ErrorCode::TransferMissingDetails,
                    _ => ErrorCode::TransferValidationFailed,
                };
                let message = format!(
                    "Transfer validation failed for payment {}: {}",
                    payment_id, reason
                );
                AppError::with_message(code, message)
                    .with_detail("payment_id", payment_id)
                    .with_detail("reason", reason.code())
            }
        }
    }
}
