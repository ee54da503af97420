use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use zapshift::application::checkout::RedirectUrls;
use zapshift::config::Config;
use zapshift::domain::ports::{ParcelStoreRef, PaymentLedgerRef, PaymentProviderRef};
use zapshift::infrastructure::in_memory::{InMemoryParcelStore, InMemoryPaymentLedger};
use zapshift::infrastructure::mock_provider::MockPaymentProvider;
use zapshift::infrastructure::stripe::StripeClient;
use zapshift::interfaces::http::{self, AppState};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn in_memory_stores() -> (ParcelStoreRef, PaymentLedgerRef) {
    (
        Arc::new(InMemoryParcelStore::new()),
        Arc::new(InMemoryPaymentLedger::new()),
    )
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(db_path: Option<&Path>) -> Result<(ParcelStoreRef, PaymentLedgerRef)> {
    use zapshift::infrastructure::rocksdb::RocksDBStore;

    match db_path {
        // Use persistent storage (RocksDB)
        Some(path) => {
            let store = RocksDBStore::open(path).into_diagnostic()?;
            info!(path = %path.display(), "Using RocksDB storage");
            Ok((Arc::new(store.clone()), Arc::new(store)))
        }
        None => Ok(in_memory_stores()),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(db_path: Option<&Path>) -> Result<(ParcelStoreRef, PaymentLedgerRef)> {
    if db_path.is_some() {
        warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(in_memory_stores())
}

fn payment_provider(config: &Config) -> Result<PaymentProviderRef> {
    match &config.stripe_secret_key {
        Some(secret_key) => {
            let client = StripeClient::new(
                secret_key.clone(),
                config.stripe_api_base.clone(),
                config.provider_timeout(),
            )
            .into_diagnostic()?;
            info!(api_base = %config.stripe_api_base, "Using Stripe checkout");
            Ok(Arc::new(client))
        }
        None => {
            warn!("STRIPE_SECRET_KEY not set; using the mock payment provider");
            Ok(Arc::new(MockPaymentProvider::new()))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing();

    let (parcels, ledger) = open_stores(config.db_path.as_deref())?;
    let provider = payment_provider(&config)?;
    let state = AppState::new(
        parcels,
        ledger,
        provider,
        RedirectUrls::for_site(&config.site_domain),
        &config.currency,
    );

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .into_diagnostic()?;
    http::serve(listener, state).await.into_diagnostic()
}
