#![allow(dead_code)]

use serde_json::json;
use std::sync::Arc;
use zapshift::application::checkout::RedirectUrls;
use zapshift::domain::checkout::{CheckoutRequest, CheckoutSessionHandle};
use zapshift::domain::parcel::{NewParcel, Parcel, PaymentStatus};
use zapshift::domain::ports::ParcelStore;
use zapshift::domain::tracking::TrackingId;
use zapshift::infrastructure::in_memory::{InMemoryParcelStore, InMemoryPaymentLedger};
use zapshift::infrastructure::mock_provider::MockPaymentProvider;
use zapshift::interfaces::http::AppState;

pub const SENDER: &str = "sender@example.com";
pub const SITE: &str = "https://app.example";

/// In-memory wiring of the whole service, with handles kept for assertions.
pub struct Harness {
    pub parcels: InMemoryParcelStore,
    pub ledger: InMemoryPaymentLedger,
    pub provider: MockPaymentProvider,
    pub state: AppState,
}

impl Harness {
    pub fn new() -> Self {
        let parcels = InMemoryParcelStore::new();
        let ledger = InMemoryPaymentLedger::new();
        let provider = MockPaymentProvider::new();
        let state = AppState::new(
            Arc::new(parcels.clone()),
            Arc::new(ledger.clone()),
            Arc::new(provider.clone()),
            RedirectUrls::for_site(SITE),
            "usd",
        );
        Self {
            parcels,
            ledger,
            provider,
            state,
        }
    }

    pub async fn create_parcel(&self, cost: f64) -> Parcel {
        let new: NewParcel = serde_json::from_value(json!({
            "parcelName": "Documents",
            "senderEmail": SENDER,
            "cost": cost,
            "receiverName": "Bob",
        }))
        .unwrap();
        self.parcels.create(new).await.unwrap()
    }

    pub async fn open_checkout(&self, parcel: &Parcel) -> CheckoutSessionHandle {
        self.state
            .checkout
            .start(checkout_request(parcel))
            .await
            .unwrap()
    }
}

pub fn checkout_request(parcel: &Parcel) -> CheckoutRequest {
    serde_json::from_value(json!({
        "cost": parcel.cost,
        "parcelName": parcel.parcel_name,
        "parcelId": parcel.id,
        "senderEmail": parcel.sender_email,
    }))
    .unwrap()
}

/// Every parcel carries a tracking id exactly when it is paid.
pub fn assert_tracking_invariant(parcels: &[Parcel]) {
    for parcel in parcels {
        assert_eq!(
            parcel.tracking_id().is_some(),
            parcel.payment_status() == PaymentStatus::Paid,
            "parcel {} breaks the tracking id invariant",
            parcel.id
        );
    }
}

/// `PRCL-` + 8 digits + `-` + 6 uppercase hex characters, dated today (UTC).
pub fn assert_tracking_format(tracking_id: &str) {
    let parsed: TrackingId = tracking_id.parse().expect("well-formed tracking id");
    let today = chrono::Utc::now().date_naive();
    assert!(
        parsed.date() == today || parsed.date() == today.pred_opt().unwrap(),
        "tracking id {tracking_id} is not dated today"
    );
}
