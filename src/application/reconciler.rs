use crate::domain::checkout::ProviderSession;
use crate::domain::money::from_minor_units;
use crate::domain::parcel::{MarkPaid, ParcelId};
use crate::domain::payment::Payment;
use crate::domain::ports::{ParcelStoreRef, PaymentLedgerRef, PaymentProviderRef};
use crate::domain::tracking::TrackingId;
use crate::error::{PaymentError, Result};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

/// Result of one confirmation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// This attempt assigned the tracking id and wrote the ledger entry.
    Reconciled(ReconciledPayment),
    /// A ledger entry already existed; nothing was written.
    AlreadyReconciled(ReconciledPayment),
    /// The provider does not report the session as paid yet.
    NotYetPaid { payment_status: String },
}

impl Reconciliation {
    pub fn payment(&self) -> Option<&ReconciledPayment> {
        match self {
            Self::Reconciled(p) | Self::AlreadyReconciled(p) => Some(p),
            Self::NotYetPaid { .. } => None,
        }
    }
}

/// The confirmed state of a paid parcel, always sourced from a ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledPayment {
    pub tracking_id: TrackingId,
    pub transaction_id: String,
    pub parcel_id: ParcelId,
    pub payment: Payment,
}

impl From<Payment> for ReconciledPayment {
    fn from(payment: Payment) -> Self {
        Self {
            tracking_id: payment.tracking_id.clone(),
            transaction_id: payment.transaction_id.clone(),
            parcel_id: payment.parcel_id.clone(),
            payment,
        }
    }
}

/// Confirms checkout sessions against the provider and applies their
/// effects exactly once.
///
/// The ledger insert is the commit point. The parcel is marked paid first,
/// so a crash between the two writes leaves a paid parcel without a ledger
/// entry; the next attempt finds no entry, reuses the parcel's tracking id
/// and completes the ledger write.
pub struct PaymentReconciler {
    parcels: ParcelStoreRef,
    ledger: PaymentLedgerRef,
    provider: PaymentProviderRef,
}

impl PaymentReconciler {
    pub fn new(
        parcels: ParcelStoreRef,
        ledger: PaymentLedgerRef,
        provider: PaymentProviderRef,
    ) -> Self {
        Self {
            parcels,
            ledger,
            provider,
        }
    }

    pub async fn confirm(&self, session_id: &str) -> Result<Reconciliation> {
        if session_id.trim().is_empty() {
            return Err(PaymentError::ValidationError(
                "session_id is required".to_string(),
            ));
        }

        let session = self.provider.retrieve_session(session_id).await?;

        if let Some(transaction_id) = session.payment_intent_id.as_deref()
            && let Some(existing) = self.ledger.get(transaction_id).await?
        {
            info!(session_id, transaction_id, "Payment already reconciled");
            return Ok(Reconciliation::AlreadyReconciled(existing.into()));
        }

        if !session.is_paid() {
            info!(
                session_id,
                payment_status = %session.payment_status,
                "Checkout session is not paid yet"
            );
            return Ok(Reconciliation::NotYetPaid {
                payment_status: session.payment_status,
            });
        }

        self.commit(session).await
    }

    async fn commit(&self, session: ProviderSession) -> Result<Reconciliation> {
        let malformed = |what: &str| {
            PaymentError::ProviderError(format!("Paid session {} has no {what}", session.id))
        };
        let transaction_id = session
            .payment_intent_id
            .clone()
            .ok_or_else(|| malformed("transaction id"))?;
        let parcel_id = session.parcel_id().ok_or_else(|| malformed("parcel reference"))?;
        let amount_total = session.amount_total.ok_or_else(|| malformed("amount"))?;
        let currency = session.currency.clone().ok_or_else(|| malformed("currency"))?;
        let customer_email = session
            .customer_email
            .clone()
            .ok_or_else(|| malformed("customer email"))?;

        let marked = self
            .parcels
            .mark_paid(&parcel_id, TrackingId::generate())
            .await
            .inspect_err(|e| error!(%parcel_id, %transaction_id, error = %e, "Failed to mark parcel paid"))?;
        if let MarkPaid::AlreadyPaid(tracking_id) = &marked {
            // Either a concurrent attempt got here first or an earlier attempt
            // stopped before its ledger write.
            info!(%parcel_id, %transaction_id, %tracking_id, "Parcel already paid; keeping its tracking id");
        }

        let payment = Payment {
            transaction_id,
            parcel_id,
            amount: from_minor_units(amount_total, &currency),
            currency,
            customer_email,
            tracking_id: marked.into_tracking_id(),
            payment_status: session.payment_status.clone(),
            paid_at: Utc::now(),
        };

        match self.ledger.insert(payment.clone()).await {
            Ok(()) => {
                info!(
                    session_id = %session.id,
                    transaction_id = %payment.transaction_id,
                    parcel_id = %payment.parcel_id,
                    tracking_id = %payment.tracking_id,
                    "Payment reconciled"
                );
                Ok(Reconciliation::Reconciled(payment.into()))
            }
            Err(PaymentError::DuplicateTransaction(transaction_id)) => {
                let existing = self.ledger.get(&transaction_id).await?.ok_or_else(|| {
                    PaymentError::internal(format!(
                        "Ledger reported a duplicate for {transaction_id} but has no entry"
                    ))
                })?;
                warn!(%transaction_id, "Concurrent confirmation lost the ledger race");
                Ok(Reconciliation::AlreadyReconciled(existing.into()))
            }
            Err(e) => {
                error!(
                    transaction_id = %payment.transaction_id,
                    parcel_id = %payment.parcel_id,
                    error = %e,
                    "Ledger write failed after the parcel was marked paid"
                );
                Err(e)
            }
        }
    }
}
