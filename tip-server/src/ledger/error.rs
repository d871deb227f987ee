use shared::error::{AppError, ErrorCode};
use shared::models::PaymentStatus;
use thiserror::Error;

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Payment not found: {0}")]
    NotFound(i64),

    #[error("Invalid status transition for payment {payment_id}: {from} -> {to}")]
    InvalidTransition {
        payment_id: i64,
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("Payment {0} is already settled")]
    AlreadySettled(i64),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("{0}")]
    Validation(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::NotFound(id) => AppError::with_message(ErrorCode::PaymentNotFound, message)
                .with_detail("payment_id", id),
            LedgerError::InvalidTransition {
                payment_id,
                from,
                to,
            } => AppError::with_message(ErrorCode::PaymentInvalidTransition, message)
                .with_detail("payment_id", payment_id)
                .with_detail("from", from.as_str())
                .with_detail("to", to.as_str()),
            LedgerError::AlreadySettled(id) => {
                AppError::with_message(ErrorCode::PaymentAlreadySettled, message)
                    .with_detail("payment_id", id)
            }
            LedgerError::InvalidAmount(_) => {
                AppError::with_message(ErrorCode::PaymentInvalidAmount, message)
            }
            LedgerError::InvalidRating(rating) => {
                AppError::with_message(ErrorCode::PaymentInvalidRating, message)
                    .with_detail("rating", rating)
            }
            LedgerError::Validation(_) => AppError::validation(message),
        }
    }
}
