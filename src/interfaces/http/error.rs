use crate::error::PaymentError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

/// Errors surfaced at the HTTP boundary.
///
/// Provider and internal failures are logged in full but answered with a
/// fixed, high-level message.
#[derive(Debug)]
pub enum ApiError {
    Payment(PaymentError),
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    error: &'static str,
}

impl From<PaymentError> for ApiError {
    fn from(e: PaymentError) -> Self {
        Self::Payment(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn parts(self) -> (StatusCode, &'static str, String) {
        match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message),
            Self::Payment(PaymentError::ValidationError(message)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message)
            }
            Self::Payment(PaymentError::ParcelNotFound(_)) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Parcel not found.".to_string(),
            ),
            Self::Payment(PaymentError::AlreadyPaid(_)) => (
                StatusCode::CONFLICT,
                "ALREADY_PAID",
                "Parcel has already been paid.".to_string(),
            ),
            Self::Payment(e @ PaymentError::ProviderError(_)) => {
                error!(error = %e, "Payment provider failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "PAYMENT_PROVIDER_ERROR",
                    "The payment provider could not complete the request.".to_string(),
                )
            }
            Self::Payment(e) => {
                error!(error = %e, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Unable to process the request at the moment.".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let body = ErrorBody {
            success: false,
            message,
            error: code,
        };
        (status, Json(body)).into_response()
    }
}
