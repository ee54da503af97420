use super::money::Cost;
use super::tracking::TrackingId;
use crate::error::PaymentError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Fields the store owns. Clients cannot set them through `extra`.
pub const RESERVED_FIELDS: &[&str] = &["id", "_id", "paymentStatus", "trackingId", "createdAt"];

/// Opaque parcel identifier, assigned by the store on creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParcelId(String);

impl ParcelId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ParcelId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ParcelId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ParcelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
}

/// Outcome of asking a parcel to become paid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkPaid {
    /// The parcel was unpaid and now carries the supplied tracking id.
    Updated(TrackingId),
    /// The parcel was already paid; its existing tracking id is kept.
    AlreadyPaid(TrackingId),
}

impl MarkPaid {
    pub fn tracking_id(&self) -> &TrackingId {
        match self {
            Self::Updated(id) | Self::AlreadyPaid(id) => id,
        }
    }

    pub fn into_tracking_id(self) -> TrackingId {
        match self {
            Self::Updated(id) | Self::AlreadyPaid(id) => id,
        }
    }
}

/// Client input for creating a parcel.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewParcel {
    pub parcel_name: String,
    pub sender_email: String,
    pub cost: Cost,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewParcel {
    pub fn validate(&self) -> Result<(), PaymentError> {
        require_non_empty("parcelName", &self.parcel_name)?;
        require_email(&self.sender_email)
    }
}

/// A parcel record.
///
/// `payment_status` and `tracking_id` are private: a tracking id is present
/// exactly when the parcel is paid, and the only way to reach `Paid` is
/// [`Parcel::mark_paid`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ParcelRecord")]
pub struct Parcel {
    pub id: ParcelId,
    pub parcel_name: String,
    pub sender_email: String,
    pub cost: Cost,
    payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    tracking_id: Option<TrackingId>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Parcel {
    pub fn new(id: ParcelId, new: NewParcel, created_at: DateTime<Utc>) -> Self {
        let mut extra = new.extra;
        for field in RESERVED_FIELDS {
            extra.remove(*field);
        }

        Self {
            id,
            parcel_name: new.parcel_name,
            sender_email: new.sender_email,
            cost: new.cost,
            payment_status: PaymentStatus::Unpaid,
            tracking_id: None,
            created_at,
            extra,
        }
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn tracking_id(&self) -> Option<&TrackingId> {
        self.tracking_id.as_ref()
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    /// Transitions the parcel to `Paid`. Never overwrites an existing tracking id.
    pub fn mark_paid(&mut self, tracking_id: TrackingId) -> MarkPaid {
        if let Some(existing) = &self.tracking_id {
            return MarkPaid::AlreadyPaid(existing.clone());
        }
        self.payment_status = PaymentStatus::Paid;
        self.tracking_id = Some(tracking_id.clone());
        MarkPaid::Updated(tracking_id)
    }
}

/// Wire shape of a stored parcel, checked before it becomes a [`Parcel`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParcelRecord {
    id: ParcelId,
    parcel_name: String,
    sender_email: String,
    cost: Cost,
    #[serde(default)]
    payment_status: PaymentStatus,
    #[serde(default)]
    tracking_id: Option<TrackingId>,
    created_at: DateTime<Utc>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<ParcelRecord> for Parcel {
    type Error = PaymentError;

    fn try_from(record: ParcelRecord) -> Result<Self, Self::Error> {
        if record.tracking_id.is_some() != (record.payment_status == PaymentStatus::Paid) {
            return Err(PaymentError::ValidationError(format!(
                "Parcel {} has a tracking id inconsistent with its payment status",
                record.id
            )));
        }

        Ok(Self {
            id: record.id,
            parcel_name: record.parcel_name,
            sender_email: record.sender_email,
            cost: record.cost,
            payment_status: record.payment_status,
            tracking_id: record.tracking_id,
            created_at: record.created_at,
            extra: record.extra,
        })
    }
}

pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<(), PaymentError> {
    if value.trim().is_empty() {
        return Err(PaymentError::ValidationError(format!("{field} is required")));
    }
    Ok(())
}

pub(crate) fn require_email(value: &str) -> Result<(), PaymentError> {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(PaymentError::ValidationError(
            "A valid email address is required".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn new_parcel(extra: Value) -> NewParcel {
        let mut body = json!({
            "parcelName": "Documents",
            "senderEmail": "sender@example.com",
            "cost": 20,
        });
        if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            body.extend(extra.clone());
        }
        serde_json::from_value(body).unwrap()
    }

    fn tracking(suffix: u8) -> TrackingId {
        TrackingId::from_parts(Utc::now().date_naive(), [0, 0, suffix])
    }

    #[test]
    fn test_new_parcel_starts_unpaid() {
        let parcel = Parcel::new(ParcelId::from("p1"), new_parcel(json!({})), Utc::now());
        assert_eq!(parcel.payment_status(), PaymentStatus::Unpaid);
        assert!(parcel.tracking_id().is_none());
        assert_eq!(parcel.cost.value(), dec!(20));
    }

    #[test]
    fn test_reserved_fields_are_stripped() {
        let input = new_parcel(json!({
            "paymentStatus": "paid",
            "trackingId": "PRCL-20240101-000000",
            "receiverName": "Alice",
        }));
        let parcel = Parcel::new(ParcelId::from("p1"), input, Utc::now());

        assert_eq!(parcel.payment_status(), PaymentStatus::Unpaid);
        assert!(parcel.tracking_id().is_none());
        assert_eq!(parcel.extra.get("receiverName"), Some(&json!("Alice")));
        assert!(!parcel.extra.contains_key("paymentStatus"));
    }

    #[test]
    fn test_mark_paid_is_one_shot() {
        let mut parcel = Parcel::new(ParcelId::from("p1"), new_parcel(json!({})), Utc::now());

        let first = parcel.mark_paid(tracking(1));
        assert_eq!(first, MarkPaid::Updated(tracking(1)));
        assert!(parcel.is_paid());

        let second = parcel.mark_paid(tracking(2));
        assert_eq!(second, MarkPaid::AlreadyPaid(tracking(1)));
        assert_eq!(parcel.tracking_id(), Some(&tracking(1)));
    }

    #[test]
    fn test_serialization_round_trip_keeps_extra_fields() {
        let mut parcel = Parcel::new(
            ParcelId::from("p1"),
            new_parcel(json!({ "weight": 2.5 })),
            Utc::now(),
        );
        parcel.mark_paid(tracking(7));

        let value = serde_json::to_value(&parcel).unwrap();
        assert_eq!(value["paymentStatus"], json!("paid"));
        assert_eq!(value["weight"], json!(2.5));

        let back: Parcel = serde_json::from_value(value).unwrap();
        assert_eq!(back, parcel);
    }

    #[test]
    fn test_unpaid_parcel_omits_tracking_id() {
        let parcel = Parcel::new(ParcelId::from("p1"), new_parcel(json!({})), Utc::now());
        let value = serde_json::to_value(&parcel).unwrap();
        assert!(value.get("trackingId").is_none());
    }

    #[test]
    fn test_deserialization_rejects_inconsistent_record() {
        let record = json!({
            "id": "p1",
            "parcelName": "Documents",
            "senderEmail": "sender@example.com",
            "cost": "20",
            "paymentStatus": "paid",
            "createdAt": "2024-03-07T10:00:00Z",
        });
        assert!(serde_json::from_value::<Parcel>(record).is_err());
    }

    #[test]
    fn test_new_parcel_validation() {
        assert!(new_parcel(json!({})).validate().is_ok());
        assert!(new_parcel(json!({ "senderEmail": "nobody" })).validate().is_err());
        assert!(new_parcel(json!({ "parcelName": "  " })).validate().is_err());
    }
}
