use crate::domain::checkout::{
    CheckoutRequest, CheckoutSessionHandle, CreateSessionRequest, LineItem, METADATA_PARCEL_ID,
    METADATA_PARCEL_NAME,
};
use crate::domain::money::to_minor_units;
use crate::domain::ports::{ParcelStoreRef, PaymentProviderRef};
use crate::error::{PaymentError, Result};
use std::collections::BTreeMap;
use tracing::{error, info};

/// Where the provider sends the customer after checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectUrls {
    pub success_url: String,
    pub cancel_url: String,
}

impl RedirectUrls {
    /// Redirect targets under the application's dashboard.
    ///
    /// `{CHECKOUT_SESSION_ID}` is substituted by the provider, so the success
    /// page receives the session reference it needs to confirm the payment.
    pub fn for_site(site_domain: &str) -> Self {
        let base = site_domain.trim_end_matches('/');
        Self {
            success_url: format!(
                "{base}/dashboard/payment-success?session_id={{CHECKOUT_SESSION_ID}}"
            ),
            cancel_url: format!("{base}/dashboard/payment-cancelled"),
        }
    }
}

/// Opens provider-hosted checkout sessions for unpaid parcels.
///
/// Never writes locally: all state lives with the provider until the
/// payment is confirmed by [`crate::application::reconciler::PaymentReconciler`].
pub struct CheckoutInitiator {
    parcels: ParcelStoreRef,
    provider: PaymentProviderRef,
    redirects: RedirectUrls,
    currency: String,
}

impl CheckoutInitiator {
    pub fn new(
        parcels: ParcelStoreRef,
        provider: PaymentProviderRef,
        redirects: RedirectUrls,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            parcels,
            provider,
            redirects,
            currency: currency.into().to_ascii_lowercase(),
        }
    }

    /// Opens exactly one checkout session and returns its redirect target.
    pub async fn start(&self, request: CheckoutRequest) -> Result<CheckoutSessionHandle> {
        request.validate()?;

        let parcel = self
            .parcels
            .get(&request.parcel_id)
            .await?
            .ok_or_else(|| PaymentError::ParcelNotFound(request.parcel_id.clone()))?;
        if parcel.is_paid() {
            return Err(PaymentError::AlreadyPaid(parcel.id));
        }
        if parcel.cost != request.cost {
            return Err(PaymentError::ValidationError(
                "Cost does not match the parcel record".to_string(),
            ));
        }

        let unit_amount = to_minor_units(request.cost, &self.currency)?;
        let session_request = CreateSessionRequest {
            line_items: vec![LineItem {
                name: request.parcel_name.clone(),
                unit_amount,
                currency: self.currency.clone(),
                quantity: 1,
            }],
            customer_email: request.sender_email.clone(),
            metadata: BTreeMap::from([
                (METADATA_PARCEL_ID.to_string(), request.parcel_id.to_string()),
                (METADATA_PARCEL_NAME.to_string(), request.parcel_name.clone()),
            ]),
            success_url: self.redirects.success_url.clone(),
            cancel_url: self.redirects.cancel_url.clone(),
        };

        let handle = self
            .provider
            .create_session(session_request)
            .await
            .inspect_err(|e| {
                error!(parcel_id = %request.parcel_id, error = %e, "Checkout session creation failed")
            })?;

        info!(
            parcel_id = %request.parcel_id,
            session_id = %handle.id,
            unit_amount,
            currency = %self.currency,
            "Checkout session created"
        );
        Ok(handle)
    }
}
