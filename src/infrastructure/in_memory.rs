use crate::domain::parcel::{MarkPaid, NewParcel, Parcel, ParcelId};
use crate::domain::payment::Payment;
use crate::domain::ports::{ParcelStore, PaymentLedger};
use crate::domain::tracking::TrackingId;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for parcels.
///
/// Uses `Arc<RwLock<HashMap<ParcelId, Parcel>>>` to allow shared concurrent access.
/// The payment transition runs under the write lock, which makes it atomic.
#[derive(Default, Clone)]
pub struct InMemoryParcelStore {
    parcels: Arc<RwLock<HashMap<ParcelId, Parcel>>>,
}

impl InMemoryParcelStore {
    /// Creates a new, empty in-memory parcel store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ParcelStore for InMemoryParcelStore {
    async fn create(&self, parcel: NewParcel) -> Result<Parcel> {
        let parcel = Parcel::new(ParcelId::generate(), parcel, Utc::now());
        let mut parcels = self.parcels.write().await;
        parcels.insert(parcel.id.clone(), parcel.clone());
        Ok(parcel)
    }

    async fn get(&self, id: &ParcelId) -> Result<Option<Parcel>> {
        let parcels = self.parcels.read().await;
        Ok(parcels.get(id).cloned())
    }

    async fn list(&self, sender_email: Option<&str>) -> Result<Vec<Parcel>> {
        let parcels = self.parcels.read().await;
        let mut found: Vec<Parcel> = parcels
            .values()
            .filter(|p| sender_email.is_none_or(|email| p.sender_email == email))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn delete(&self, id: &ParcelId) -> Result<bool> {
        let mut parcels = self.parcels.write().await;
        Ok(parcels.remove(id).is_some())
    }

    async fn mark_paid(&self, id: &ParcelId, tracking_id: TrackingId) -> Result<MarkPaid> {
        let mut parcels = self.parcels.write().await;
        let parcel = parcels
            .get_mut(id)
            .ok_or_else(|| PaymentError::ParcelNotFound(id.clone()))?;
        Ok(parcel.mark_paid(tracking_id))
    }
}

/// A thread-safe in-memory payment ledger.
///
/// Keyed by transaction id. Inserts check for an existing entry and write
/// under the same write lock, so concurrent duplicates are always rejected.
#[derive(Default, Clone)]
pub struct InMemoryPaymentLedger {
    payments: Arc<RwLock<HashMap<String, Payment>>>,
}

impl InMemoryPaymentLedger {
    /// Creates a new, empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentLedger for InMemoryPaymentLedger {
    async fn insert(&self, payment: Payment) -> Result<()> {
        let mut payments = self.payments.write().await;
        match payments.entry(payment.transaction_id.clone()) {
            Entry::Occupied(slot) => Err(PaymentError::DuplicateTransaction(slot.key().clone())),
            Entry::Vacant(slot) => {
                slot.insert(payment);
                Ok(())
            }
        }
    }

    async fn get(&self, transaction_id: &str) -> Result<Option<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments.get(transaction_id).cloned())
    }

    async fn list(&self, customer_email: Option<&str>) -> Result<Vec<Payment>> {
        let payments = self.payments.read().await;
        let mut found: Vec<Payment> = payments
            .values()
            .filter(|p| customer_email.is_none_or(|email| p.customer_email == email))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.paid_at.cmp(&a.paid_at));
        Ok(found)
    }
}
