use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration. Every flag can also be set through the environment.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Parcel shipping backend with checkout reconciliation", long_about = None)]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "BIND_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Public base URL of the web application, used for checkout redirects
    #[arg(long, env = "SITE_DOMAIN", default_value = "http://localhost:5173")]
    pub site_domain: String,

    /// ISO 4217 currency code charged at checkout
    #[arg(long, env = "CHECKOUT_CURRENCY", default_value = "usd", value_parser = parse_currency)]
    pub currency: String,

    /// Stripe secret key. Without it a mock provider is used.
    #[arg(long, env = "STRIPE_SECRET_KEY", hide_env_values = true)]
    pub stripe_secret_key: Option<String>,

    /// Stripe API base URL
    #[arg(long, env = "STRIPE_API_BASE", default_value = crate::infrastructure::stripe::DEFAULT_API_BASE)]
    pub stripe_api_base: String,

    /// Timeout for payment provider requests, in seconds
    #[arg(long, env = "PROVIDER_TIMEOUT_SECS", default_value_t = 30)]
    pub provider_timeout_secs: u64,
}

impl Config {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

fn parse_currency(value: &str) -> Result<String, String> {
    if value.len() == 3 && value.bytes().all(|b| b.is_ascii_alphabetic()) {
        Ok(value.to_ascii_lowercase())
    } else {
        Err(format!("`{value}` is not a three-letter currency code"))
    }
}
