//! HTTP surface: parcel CRUD, checkout initiation and payment confirmation.

pub mod error;
pub mod parcels;
pub mod payments;

use crate::application::checkout::{CheckoutInitiator, RedirectUrls};
use crate::application::reconciler::PaymentReconciler;
use crate::domain::ports::{ParcelStoreRef, PaymentLedgerRef, PaymentProviderRef};
use axum::Json;
use axum::Router;
use axum::routing::{get, patch, post};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Handles shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub parcels: ParcelStoreRef,
    pub ledger: PaymentLedgerRef,
    pub checkout: Arc<CheckoutInitiator>,
    pub reconciler: Arc<PaymentReconciler>,
}

impl AppState {
    pub fn new(
        parcels: ParcelStoreRef,
        ledger: PaymentLedgerRef,
        provider: PaymentProviderRef,
        redirects: RedirectUrls,
        currency: &str,
    ) -> Self {
        let checkout = CheckoutInitiator::new(
            Arc::clone(&parcels),
            Arc::clone(&provider),
            redirects,
            currency,
        );
        let reconciler =
            PaymentReconciler::new(Arc::clone(&parcels), Arc::clone(&ledger), provider);

        Self {
            parcels,
            ledger,
            checkout: Arc::new(checkout),
            reconciler: Arc::new(reconciler),
        }
    }
}

/// Success envelope for the CRUD endpoints.
#[derive(Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: &'static str,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn ok(message: &'static str, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message,
            data,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct EmailFilter {
    pub email: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Zap is Shifting..." }))
        .route(
            "/parcels",
            get(parcels::list_parcels).post(parcels::create_parcel),
        )
        .route(
            "/parcels/:id",
            get(parcels::get_parcel).delete(parcels::delete_parcel),
        )
        .route("/payments", get(payments::list_payments))
        .route(
            "/create-checkout-session",
            post(payments::create_checkout_session),
        )
        .route("/payment-success", patch(payments::payment_success))
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "HTTP server listening");
    }
    axum::serve(listener, router(state)).await
}
