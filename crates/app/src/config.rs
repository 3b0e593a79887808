//! Application configuration

use clap::Args;
use pricebook::lookups::{LookupError, find_currency};
use rusty_money::iso::Currency;

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(
        long,
        env = "LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Compact,
        global = true
    )]
    pub log_format: LogFormat,
}

/// Database settings.
#[derive(Debug, Clone, Args)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,
}

/// Pricing settings.
#[derive(Debug, Clone, Args)]
pub struct PricingConfig {
    /// Currency used when no external price sets one
    #[arg(long, env = "PRICEBOOK_FALLBACK_CURRENCY", default_value = "EUR")]
    pub fallback_currency: String,
}

impl PricingConfig {
    /// Resolve the configured fallback currency.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::UnknownCurrency`] when the code is not an ISO currency.
    pub fn currency(&self) -> Result<&'static Currency, LookupError> {
        find_currency(&self.fallback_currency)
    }
}

/// Load `.env` if present.
pub fn load_dotenv() {
    _ = dotenvy::dotenv();
}
