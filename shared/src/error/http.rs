//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::RestaurantNotFound
            | Self::PaymentNotFound
            | Self::EmployeeNotFound
            | Self::RoleNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict (state of the resource blocks the request)
            Self::AlreadyExists
            | Self::EmployeeTaxIdExists
            | Self::RoleNameExists
            | Self::RoleInUse
            | Self::RoleBudgetExceeded
            | Self::RoleSoleRemaining
            | Self::PaymentInvalidTransition
            | Self::PaymentAlreadySettled => StatusCode::CONFLICT,

            // 422 Unprocessable (external reconciliation said no)
            Self::TransferValidationFailed | Self::TransferMissingDetails => {
                StatusCode::UNPROCESSABLE_ENTITY
            }

            // 503 Service Unavailable (transient errors, client can retry)
            Self::NetworkError | Self::TimeoutError => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::Unknown | Self::InternalError | Self::StorageError | Self::ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (default for validation errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_status() {
        assert_eq!(ErrorCode::Success.http_status(), StatusCode::OK);
    }

    #[test]
    fn test_not_found_status() {
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::PaymentNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ErrorCode::RoleNotFound.http_status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_conflict_status() {
        assert_eq!(
            ErrorCode::RoleBudgetExceeded.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(ErrorCode::RoleInUse.http_status(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::PaymentAlreadySettled.http_status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_unprocessable_status() {
        assert_eq!(
            ErrorCode::TransferValidationFailed.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_service_unavailable_status() {
        assert_eq!(
            ErrorCode::TimeoutError.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_bad_request_status() {
        assert_eq!(
            ErrorCode::ValidationFailed.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::PaymentInvalidRating.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::ComparisonSameRestaurant.http_status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_error_status() {
        assert_eq!(
            ErrorCode::StorageError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
