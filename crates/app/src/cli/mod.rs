use clap::{Parser, Subcommand};
use pricebook_app::{config::LoggingConfig, database::Db, observability};

mod db;
mod promotions;
mod quote;
mod tenant;

#[derive(Debug, Parser)]
#[command(name = "pricebook-app", about = "Pricebook CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Db(db::DbCommand),
    Tenant(tenant::TenantCommand),
    Promotions(promotions::PromotionsCommand),
    Quote(quote::QuoteArgs),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        observability::init(&self.logging)
            .map_err(|error| format!("failed to initialise logging: {error}"))?;

        match self.command {
            Commands::Db(command) => db::run(command).await,
            Commands::Tenant(command) => tenant::run(command).await,
            Commands::Promotions(command) => promotions::run(command).await,
            Commands::Quote(args) => quote::run(args).await,
        }
    }
}

async fn connect(database_url: &str) -> Result<Db, String> {
    let pool = pricebook_app::database::connect(database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    Ok(Db::new(pool))
}
