use super::money::Cost;
use super::parcel::{ParcelId, require_email, require_non_empty};
use crate::error::PaymentError;
use serde::Deserialize;
use std::collections::BTreeMap;

/// The provider's payment status for a settled checkout session.
pub const PAID_STATUS: &str = "paid";

pub const METADATA_PARCEL_ID: &str = "parcelId";
pub const METADATA_PARCEL_NAME: &str = "parcelName";

/// Client request to pay for a parcel.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub cost: Cost,
    pub parcel_name: String,
    pub parcel_id: ParcelId,
    pub sender_email: String,
}

impl CheckoutRequest {
    pub fn validate(&self) -> Result<(), PaymentError> {
        require_non_empty("parcelId", self.parcel_id.as_str())?;
        require_non_empty("parcelName", &self.parcel_name)?;
        require_email(&self.sender_email)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub name: String,
    /// Price in the currency's minor units.
    pub unit_amount: i64,
    pub currency: String,
    pub quantity: u32,
}

/// Everything the provider needs to open a hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSessionRequest {
    pub line_items: Vec<LineItem>,
    pub customer_email: String,
    pub metadata: BTreeMap<String, String>,
    pub success_url: String,
    pub cancel_url: String,
}

/// A provider-hosted session the customer is redirected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionHandle {
    pub id: String,
    pub url: String,
}

/// Authoritative session state as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSession {
    pub id: String,
    /// The provider's transaction identifier, once one exists.
    pub payment_intent_id: Option<String>,
    pub payment_status: String,
    /// Total charged, in minor units.
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub customer_email: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl ProviderSession {
    pub fn is_paid(&self) -> bool {
        self.payment_status == PAID_STATUS
    }

    pub fn parcel_id(&self) -> Option<ParcelId> {
        self.metadata
            .get(METADATA_PARCEL_ID)
            .filter(|id| !id.trim().is_empty())
            .map(|id| ParcelId::from(id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_checkout_request_wire_format() {
        let request: CheckoutRequest = serde_json::from_value(json!({
            "cost": 12.5,
            "parcelName": "Books",
            "parcelId": "p1",
            "senderEmail": "sender@example.com",
        }))
        .unwrap();

        assert_eq!(request.parcel_id, ParcelId::from("p1"));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_checkout_request_rejects_non_numeric_cost() {
        let result = serde_json::from_value::<CheckoutRequest>(json!({
            "cost": "a lot",
            "parcelName": "Books",
            "parcelId": "p1",
            "senderEmail": "sender@example.com",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_checkout_request_validation() {
        let request: CheckoutRequest = serde_json::from_value(json!({
            "cost": 1,
            "parcelName": "Books",
            "parcelId": "",
            "senderEmail": "sender@example.com",
        }))
        .unwrap();
        assert!(matches!(
            request.validate(),
            Err(PaymentError::ValidationError(_))
        ));
    }

    #[test]
    fn test_session_parcel_id_from_metadata() {
        let mut session = ProviderSession {
            id: "cs_1".to_string(),
            payment_intent_id: None,
            payment_status: "unpaid".to_string(),
            amount_total: Some(100),
            currency: Some("usd".to_string()),
            customer_email: None,
            metadata: BTreeMap::new(),
        };
        assert!(!session.is_paid());
        assert_eq!(session.parcel_id(), None);

        session
            .metadata
            .insert(METADATA_PARCEL_ID.to_string(), "p9".to_string());
        session.payment_status = PAID_STATUS.to_string();
        assert!(session.is_paid());
        assert_eq!(session.parcel_id(), Some(ParcelId::from("p9")));
    }
}
