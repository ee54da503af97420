use crate::domain::checkout::{CheckoutSessionHandle, CreateSessionRequest, ProviderSession};
use crate::domain::ports::PaymentProvider;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Stripe Checkout client.
///
/// Opens hosted sessions with `POST /v1/checkout/sessions` and reads them back
/// with `GET /v1/checkout/sessions/{id}`.
#[derive(Clone)]
pub struct StripeClient {
    api_base: String,
    secret_key: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    url: Option<String>,
    payment_status: String,
    payment_intent: Option<Expandable>,
    amount_total: Option<i64>,
    currency: Option<String>,
    customer_email: Option<String>,
    customer_details: Option<CustomerDetails>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

/// Stripe returns either the bare id or the expanded object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Expandable {
    Id(String),
    Object { id: String },
}

#[derive(Debug, Deserialize)]
struct CustomerDetails {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl From<StripeSession> for ProviderSession {
    fn from(session: StripeSession) -> Self {
        let customer_email = session
            .customer_email
            .or_else(|| session.customer_details.and_then(|d| d.email));
        Self {
            id: session.id,
            payment_intent_id: session.payment_intent.map(|pi| match pi {
                Expandable::Id(id) | Expandable::Object { id } => id,
            }),
            payment_status: session.payment_status,
            amount_total: session.amount_total,
            currency: session.currency,
            customer_email,
            metadata: session.metadata,
        }
    }
}

impl StripeClient {
    pub fn new(secret_key: String, api_base: String, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PaymentError::InternalError(Box::new(e)))?;

        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key,
            http_client,
        })
    }

    async fn parse<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<StripeErrorBody>(&body)
                .ok()
                .map(|b| {
                    format!(
                        "{}: {}",
                        b.error.kind.unwrap_or_default(),
                        b.error.message.unwrap_or_default()
                    )
                })
                .unwrap_or(body);
            return Err(PaymentError::ProviderError(format!(
                "Stripe returned {status} - {detail}"
            )));
        }

        resp.json()
            .await
            .map_err(|e| PaymentError::ProviderError(format!("Failed to parse Stripe response: {e}")))
    }
}

/// Encodes a session request as Stripe's bracketed form parameters.
fn session_form(request: &CreateSessionRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("customer_email".to_string(), request.customer_email.clone()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
    ];

    for (i, item) in request.line_items.iter().enumerate() {
        let prefix = format!("line_items[{i}]");
        form.push((format!("{prefix}[price_data][currency]"), item.currency.clone()));
        form.push((
            format!("{prefix}[price_data][unit_amount]"),
            item.unit_amount.to_string(),
        ));
        form.push((
            format!("{prefix}[price_data][product_data][name]"),
            item.name.clone(),
        ));
        form.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
    }

    for (key, value) in &request.metadata {
        form.push((format!("metadata[{key}]"), value.clone()));
    }
    form
}

fn is_valid_session_id(session_id: &str) -> bool {
    !session_id.is_empty()
        && session_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_session(&self, request: CreateSessionRequest) -> Result<CheckoutSessionHandle> {
        let url = format!("{}/v1/checkout/sessions", self.api_base);

        let resp = self
            .http_client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&session_form(&request))
            .send()
            .await
            .map_err(|e| PaymentError::ProviderError(format!("Failed to reach Stripe: {e}")))?;

        let session: StripeSession = Self::parse(resp).await?;
        let url = session.url.ok_or_else(|| {
            PaymentError::ProviderError("Stripe session has no redirect url".to_string())
        })?;

        tracing::debug!(session_id = %session.id, "Stripe checkout session opened");
        Ok(CheckoutSessionHandle {
            id: session.id,
            url,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<ProviderSession> {
        if !is_valid_session_id(session_id) {
            return Err(PaymentError::ValidationError(
                "Malformed session id".to_string(),
            ));
        }
        let url = format!("{}/v1/checkout/sessions/{}", self.api_base, session_id);

        let resp = self
            .http_client
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| PaymentError::ProviderError(format!("Failed to reach Stripe: {e}")))?;

        let session: StripeSession = Self::parse(resp).await?;
        Ok(session.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::checkout::LineItem;
    use serde_json::json;

    #[test]
    fn test_session_form_encoding() {
        let request = CreateSessionRequest {
            line_items: vec![LineItem {
                name: "Books".to_string(),
                unit_amount: 1250,
                currency: "usd".to_string(),
                quantity: 1,
            }],
            customer_email: "a@example.com".to_string(),
            metadata: BTreeMap::from([
                ("parcelId".to_string(), "p1".to_string()),
                ("parcelName".to_string(), "Books".to_string()),
            ]),
            success_url: "https://app.example/ok".to_string(),
            cancel_url: "https://app.example/cancel".to_string(),
        };

        let form: BTreeMap<String, String> = session_form(&request).into_iter().collect();
        assert_eq!(form["mode"], "payment");
        assert_eq!(form["line_items[0][price_data][unit_amount]"], "1250");
        assert_eq!(form["line_items[0][price_data][product_data][name]"], "Books");
        assert_eq!(form["line_items[0][quantity]"], "1");
        assert_eq!(form["metadata[parcelId]"], "p1");
        assert_eq!(form["customer_email"], "a@example.com");
    }

    #[test]
    fn test_session_deserialization() {
        let body = json!({
            "id": "cs_test_1",
            "object": "checkout.session",
            "url": null,
            "payment_status": "paid",
            "payment_intent": "pi_123",
            "amount_total": 2000,
            "currency": "usd",
            "customer_email": null,
            "customer_details": { "email": "a@example.com" },
            "metadata": { "parcelId": "p1", "parcelName": "Books" }
        });

        let session: ProviderSession = serde_json::from_value::<StripeSession>(body)
            .unwrap()
            .into();
        assert!(session.is_paid());
        assert_eq!(session.payment_intent_id.as_deref(), Some("pi_123"));
        assert_eq!(session.customer_email.as_deref(), Some("a@example.com"));
        assert_eq!(session.amount_total, Some(2000));
        assert_eq!(session.parcel_id().map(|p| p.to_string()), Some("p1".to_string()));
    }

    #[test]
    fn test_expanded_payment_intent() {
        let body = json!({
            "id": "cs_test_1",
            "payment_status": "unpaid",
            "payment_intent": { "id": "pi_456", "object": "payment_intent" }
        });
        let session: ProviderSession = serde_json::from_value::<StripeSession>(body)
            .unwrap()
            .into();
        assert_eq!(session.payment_intent_id.as_deref(), Some("pi_456"));
        assert!(session.metadata.is_empty());
    }

    #[test]
    fn test_session_id_validation() {
        assert!(is_valid_session_id("cs_test_a1B2"));
        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id("../v1/customers"));
        assert!(!is_valid_session_id("cs test"));
    }
}
