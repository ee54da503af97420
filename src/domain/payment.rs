use super::parcel::ParcelId;
use super::tracking::TrackingId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An immutable ledger entry for one completed payment.
///
/// Keyed by the provider's `transaction_id`; at most one entry exists per
/// transaction, which is what makes repeated confirmations detectable.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// The provider's identifier for the completed charge.
    pub transaction_id: String,
    /// The parcel this payment was for.
    pub parcel_id: ParcelId,
    /// Amount in major units, as reported by the provider.
    pub amount: Decimal,
    pub currency: String,
    pub customer_email: String,
    /// Tracking id assigned to the parcel when the payment was reconciled.
    pub tracking_id: TrackingId,
    /// The provider's status string at confirmation time.
    pub payment_status: String,
    /// When the payment was reconciled locally.
    pub paid_at: DateTime<Utc>,
}
