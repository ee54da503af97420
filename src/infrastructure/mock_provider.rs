use crate::domain::checkout::{
    CheckoutSessionHandle, CreateSessionRequest, PAID_STATUS, ProviderSession,
};
use crate::domain::ports::PaymentProvider;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

pub const MOCK_CHECKOUT_BASE: &str = "https://checkout.mock.local/pay";

/// In-memory stand-in for a hosted checkout provider.
///
/// Sessions start `"unpaid"`; tests (or a developer driving the service
/// locally) settle them with [`MockPaymentProvider::complete_payment`].
#[derive(Clone, Default)]
pub struct MockPaymentProvider {
    sessions: Arc<RwLock<HashMap<String, ProviderSession>>>,
    requests: Arc<RwLock<Vec<CreateSessionRequest>>>,
    unavailable: Arc<AtomicBool>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail as if the provider were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Settles a session: the provider now reports it paid under `transaction_id`.
    pub async fn complete_payment(&self, session_id: &str, transaction_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| PaymentError::ProviderError(format!("No such session: {session_id}")))?;
        session.payment_intent_id = Some(transaction_id.to_string());
        session.payment_status = PAID_STATUS.to_string();
        Ok(())
    }

    pub async fn set_payment_status(&self, session_id: &str, status: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| PaymentError::ProviderError(format!("No such session: {session_id}")))?;
        session.payment_status = status.to_string();
        Ok(())
    }

    /// Replaces a session wholesale, e.g. to simulate malformed provider data.
    pub async fn put_session(&self, session: ProviderSession) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session);
    }

    /// Every session creation request received so far, in order.
    pub async fn created_sessions(&self) -> Vec<CreateSessionRequest> {
        self.requests.read().await.clone()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PaymentError::ProviderError(
                "mock provider is unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_session(&self, request: CreateSessionRequest) -> Result<CheckoutSessionHandle> {
        // Yield like a network call would.
        tokio::task::yield_now().await;
        self.check_available()?;

        let amount_total = request
            .line_items
            .iter()
            .map(|item| item.unit_amount * i64::from(item.quantity))
            .sum::<i64>();
        if amount_total < 1 {
            return Err(PaymentError::ProviderError(
                "amount must be at least one minor unit".to_string(),
            ));
        }

        let id = format!("cs_mock_{}", uuid::Uuid::new_v4().simple());
        let session = ProviderSession {
            id: id.clone(),
            payment_intent_id: None,
            payment_status: "unpaid".to_string(),
            amount_total: Some(amount_total),
            currency: request.line_items.first().map(|item| item.currency.clone()),
            customer_email: Some(request.customer_email.clone()),
            metadata: request.metadata.clone(),
        };

        self.sessions.write().await.insert(id.clone(), session);
        self.requests.write().await.push(request);

        Ok(CheckoutSessionHandle {
            url: format!("{MOCK_CHECKOUT_BASE}/{id}"),
            id,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<ProviderSession> {
        tokio::task::yield_now().await;
        self.check_available()?;

        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| PaymentError::ProviderError(format!("No such session: {session_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::checkout::LineItem;
    use std::collections::BTreeMap;

    fn request(unit_amount: i64) -> CreateSessionRequest {
        CreateSessionRequest {
            line_items: vec![LineItem {
                name: "Documents".to_string(),
                unit_amount,
                currency: "usd".to_string(),
                quantity: 1,
            }],
            customer_email: "a@example.com".to_string(),
            metadata: BTreeMap::from([("parcelId".to_string(), "p1".to_string())]),
            success_url: "http://localhost/ok".to_string(),
            cancel_url: "http://localhost/cancel".to_string(),
        }
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let provider = MockPaymentProvider::new();
        let handle = provider.create_session(request(2000)).await.unwrap();
        assert!(handle.url.ends_with(&handle.id));

        let session = provider.retrieve_session(&handle.id).await.unwrap();
        assert!(!session.is_paid());
        assert_eq!(session.amount_total, Some(2000));
        assert_eq!(session.payment_intent_id, None);

        provider.complete_payment(&handle.id, "tx_1").await.unwrap();
        let session = provider.retrieve_session(&handle.id).await.unwrap();
        assert!(session.is_paid());
        assert_eq!(session.payment_intent_id.as_deref(), Some("tx_1"));
        assert_eq!(provider.created_sessions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_zero_amount() {
        let provider = MockPaymentProvider::new();
        let result = provider.create_session(request(0)).await;
        assert!(matches!(result, Err(PaymentError::ProviderError(_))));
    }

    #[tokio::test]
    async fn test_unavailable_and_unknown_sessions() {
        let provider = MockPaymentProvider::new();
        assert!(provider.retrieve_session("cs_nope").await.is_err());

        provider.set_unavailable(true);
        assert!(provider.create_session(request(100)).await.is_err());
    }
}
