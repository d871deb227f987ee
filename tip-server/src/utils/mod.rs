//! Utility module
//!
//! - [`AppError`] / [`ApiResponse`] re-exported from `shared::error`
//! - logger, business time zone helpers, input validation

pub mod logger;
pub mod time;
pub mod validation;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

/// Wrap data in a success envelope
pub fn ok<T>(data: T) -> axum::Json<ApiResponse<T>> {
    axum::Json(ApiResponse::success(data))
}
