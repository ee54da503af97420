use super::checkout::{CheckoutSessionHandle, CreateSessionRequest, ProviderSession};
use super::parcel::{MarkPaid, NewParcel, Parcel, ParcelId};
use super::payment::Payment;
use super::tracking::TrackingId;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait ParcelStore: Send + Sync {
    /// Persists a new parcel under a store-assigned identifier.
    async fn create(&self, parcel: NewParcel) -> Result<Parcel>;
    async fn get(&self, id: &ParcelId) -> Result<Option<Parcel>>;
    /// Lists parcels, oldest first, optionally restricted to one sender.
    async fn list(&self, sender_email: Option<&str>) -> Result<Vec<Parcel>>;
    /// Returns `false` when no such parcel existed.
    async fn delete(&self, id: &ParcelId) -> Result<bool>;
    /// Atomically moves the parcel to `Paid` unless it already is.
    ///
    /// Fails with `ParcelNotFound` for an unknown id.
    async fn mark_paid(&self, id: &ParcelId, tracking_id: TrackingId) -> Result<MarkPaid>;
}

#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Appends a ledger entry.
    ///
    /// Must fail with `PaymentError::DuplicateTransaction` when an entry with
    /// the same transaction id already exists, even under concurrent inserts.
    async fn insert(&self, payment: Payment) -> Result<()>;
    async fn get(&self, transaction_id: &str) -> Result<Option<Payment>>;
    /// Lists entries, newest first, optionally restricted to one customer.
    async fn list(&self, customer_email: Option<&str>) -> Result<Vec<Payment>>;
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_session(&self, request: CreateSessionRequest) -> Result<CheckoutSessionHandle>;
    async fn retrieve_session(&self, session_id: &str) -> Result<ProviderSession>;
}

pub type ParcelStoreRef = Arc<dyn ParcelStore>;
pub type PaymentLedgerRef = Arc<dyn PaymentLedger>;
pub type PaymentProviderRef = Arc<dyn PaymentProvider>;
