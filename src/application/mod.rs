//! Application layer containing the payment flow orchestration.
//!
//! [`checkout::CheckoutInitiator`] opens provider-hosted checkout sessions and
//! [`reconciler::PaymentReconciler`] confirms them. Both receive their stores
//! and provider as explicit handles, so any adapter (or a test double) can be
//! plugged in.

pub mod checkout;
pub mod reconciler;
