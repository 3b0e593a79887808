use std::{fs, io, path::PathBuf};

use clap::Args;
use jiff::Timestamp;
use pricebook::{cart::Cart, ids::TenantUuid};
use pricebook_app::{
    config::{DatabaseConfig, PricingConfig},
    domain::pricing::{PgPricingService, PricingService},
};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct QuoteArgs {
    /// Tenant whose catalog and promotions apply
    #[arg(long)]
    tenant_uuid: Uuid,

    /// YAML file describing the cart
    #[arg(long)]
    cart: PathBuf,

    /// Price as of this instant instead of now (RFC 3339)
    #[arg(long)]
    at: Option<Timestamp>,

    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    pricing: PricingConfig,
}

pub(crate) async fn run(args: QuoteArgs) -> Result<(), String> {
    let contents = fs::read_to_string(&args.cart)
        .map_err(|error| format!("failed to read {}: {error}", args.cart.display()))?;

    let cart: Cart = serde_norway::from_str(&contents)
        .map_err(|error| format!("failed to parse {}: {error}", args.cart.display()))?;

    let fallback_currency = args
        .pricing
        .currency()
        .map_err(|error| format!("invalid fallback currency: {error}"))?;

    let db = super::connect(&args.database.database_url).await?;
    let service = PgPricingService::new(db, fallback_currency);

    let quote = service
        .quote(
            TenantUuid::from_uuid(args.tenant_uuid),
            cart,
            args.at.unwrap_or_else(Timestamp::now),
        )
        .await
        .map_err(|error| format!("failed to quote cart ({}): {error}", error.code()))?;

    quote
        .write_to(io::stdout().lock())
        .map_err(|error| format!("failed to write quote: {error}"))
}
