use crate::domain::parcel::{MarkPaid, NewParcel, Parcel, ParcelId};
use crate::domain::payment::Payment;
use crate::domain::ports::{ParcelStore, PaymentLedger};
use crate::domain::tracking::TrackingId;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing parcel records.
pub const CF_PARCELS: &str = "parcels";
/// Column Family for storing payment ledger entries.
pub const CF_PAYMENTS: &str = "payments";

/// A persistent store implementation using RocksDB.
///
/// Handles storage for both `Parcel` and `Payment` entities using separate
/// Column Families. Values are JSON; parcels are keyed by id and payments by
/// transaction id.
///
/// Read-modify-write operations (the parcel payment transition and the
/// ledger's uniqueness check) are serialized through `write_lock`, shared by
/// every clone.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("parcels" and "payments") exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_parcels = ColumnFamilyDescriptor::new(CF_PARCELS, Options::default());
        let cf_payments = ColumnFamilyDescriptor::new(CF_PAYMENTS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_parcels, cf_payments])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| PaymentError::internal(format!("{name} column family not found")))
    }

    fn read<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_pinned_cf(cf, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write<T: serde::Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(cf, key, bytes)?;
        Ok(())
    }

    fn scan<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut values = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            values.push(serde_json::from_slice(&value)?);
        }
        Ok(values)
    }
}

#[async_trait]
impl ParcelStore for RocksDBStore {
    async fn create(&self, parcel: NewParcel) -> Result<Parcel> {
        let parcel = Parcel::new(ParcelId::generate(), parcel, Utc::now());
        self.write(CF_PARCELS, parcel.id.as_str().as_bytes(), &parcel)?;
        Ok(parcel)
    }

    async fn get(&self, id: &ParcelId) -> Result<Option<Parcel>> {
        self.read(CF_PARCELS, id.as_str().as_bytes())
    }

    async fn list(&self, sender_email: Option<&str>) -> Result<Vec<Parcel>> {
        let mut parcels: Vec<Parcel> = self
            .scan::<Parcel>(CF_PARCELS)?
            .into_iter()
            .filter(|p| sender_email.is_none_or(|email| p.sender_email == email))
            .collect();
        parcels.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(parcels)
    }

    async fn delete(&self, id: &ParcelId) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let cf = self.cf(CF_PARCELS)?;
        let key = id.as_str().as_bytes();
        if self.db.get_pinned_cf(cf, key)?.is_none() {
            return Ok(false);
        }
        self.db.delete_cf(cf, key)?;
        Ok(true)
    }

    async fn mark_paid(&self, id: &ParcelId, tracking_id: TrackingId) -> Result<MarkPaid> {
        let _guard = self.write_lock.lock().await;
        let mut parcel: Parcel = self
            .read(CF_PARCELS, id.as_str().as_bytes())?
            .ok_or_else(|| PaymentError::ParcelNotFound(id.clone()))?;

        let outcome = parcel.mark_paid(tracking_id);
        if let MarkPaid::Updated(_) = outcome {
            self.write(CF_PARCELS, id.as_str().as_bytes(), &parcel)?;
        }
        Ok(outcome)
    }
}

#[async_trait]
impl PaymentLedger for RocksDBStore {
    async fn insert(&self, payment: Payment) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let cf = self.cf(CF_PAYMENTS)?;
        let key = payment.transaction_id.as_bytes();

        // Just check if the key exists without retrieving the value
        if self.db.get_pinned_cf(cf, key)?.is_some() {
            return Err(PaymentError::DuplicateTransaction(
                payment.transaction_id.clone(),
            ));
        }
        self.write(CF_PAYMENTS, key, &payment)
    }

    async fn get(&self, transaction_id: &str) -> Result<Option<Payment>> {
        self.read(CF_PAYMENTS, transaction_id.as_bytes())
    }

    async fn list(&self, customer_email: Option<&str>) -> Result<Vec<Payment>> {
        let mut payments: Vec<Payment> = self
            .scan::<Payment>(CF_PAYMENTS)?
            .into_iter()
            .filter(|p| customer_email.is_none_or(|email| p.customer_email == email))
            .collect();
        payments.sort_by(|a, b| b.paid_at.cmp(&a.paid_at));
        Ok(payments)
    }
}
