use super::error::ApiError;
use super::{AppState, EmailFilter, Envelope};
use crate::application::reconciler::{ReconciledPayment, Reconciliation};
use crate::domain::checkout::CheckoutRequest;
use crate::domain::payment::Payment;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct PaymentSuccessQuery {
    pub session_id: Option<String>,
}

/// Body of `PATCH /payment-success`.
///
/// Identical for a fresh and a repeated confirmation of the same session,
/// since both are read from the ledger entry.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationResponse {
    pub success: bool,
    #[serde(flatten)]
    pub confirmed: Option<ReconciledPayment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<String>,
}

impl From<Reconciliation> for ConfirmationResponse {
    fn from(outcome: Reconciliation) -> Self {
        match outcome {
            Reconciliation::Reconciled(confirmed)
            | Reconciliation::AlreadyReconciled(confirmed) => Self {
                success: true,
                confirmed: Some(confirmed),
                payment_status: None,
            },
            Reconciliation::NotYetPaid { payment_status } => Self {
                success: false,
                confirmed: None,
                payment_status: Some(payment_status),
            },
        }
    }
}

pub async fn create_checkout_session(
    State(state): State<AppState>,
    body: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let Json(request) = body?;
    let handle = state.checkout.start(request).await?;
    Ok(Json(CheckoutResponse { url: handle.url }))
}

pub async fn payment_success(
    State(state): State<AppState>,
    query: Result<Query<PaymentSuccessQuery>, QueryRejection>,
) -> Result<Json<ConfirmationResponse>, ApiError> {
    let Query(query) = query?;
    let session_id = query
        .session_id
        .ok_or_else(|| ApiError::BadRequest("session_id is required".to_string()))?;
    let outcome = state.reconciler.confirm(&session_id).await?;
    Ok(Json(outcome.into()))
}

pub async fn list_payments(
    State(state): State<AppState>,
    query: Result<Query<EmailFilter>, QueryRejection>,
) -> Result<Json<Envelope<Vec<Payment>>>, ApiError> {
    let Query(filter) = query?;
    let payments = state.ledger.list(filter.email.as_deref()).await?;
    Ok(Envelope::ok("Payments found successfully.", payments))
}
