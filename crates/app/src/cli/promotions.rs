use clap::{Args, Subcommand};
use pricebook::ids::TenantUuid;
use pricebook_app::{
    config::DatabaseConfig,
    domain::promotions::{PgPromotionsService, PromotionsService},
};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct PromotionsCommand {
    #[command(subcommand)]
    command: PromotionsSubcommand,
}

#[derive(Debug, Subcommand)]
enum PromotionsSubcommand {
    /// List active, published promotions, highest priority first
    List(ListPromotionsArgs),
}

#[derive(Debug, Args)]
struct ListPromotionsArgs {
    /// Tenant to list promotions for
    #[arg(long)]
    tenant_uuid: Uuid,

    /// Print the promotions as JSON instead of a table
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    database: DatabaseConfig,
}

pub(crate) async fn run(command: PromotionsCommand) -> Result<(), String> {
    match command.command {
        PromotionsSubcommand::List(args) => list(args).await,
    }
}

async fn list(args: ListPromotionsArgs) -> Result<(), String> {
    let db = super::connect(&args.database.database_url).await?;
    let service = PgPromotionsService::new(db);

    let promotions = service
        .list_active_promotions(TenantUuid::from_uuid(args.tenant_uuid))
        .await
        .map_err(|error| format!("failed to list promotions: {error}"))?;

    if args.json {
        let json = serde_json::to_string_pretty(&promotions)
            .map_err(|error| format!("failed to serialise promotions: {error}"))?;

        println!("{json}");

        return Ok(());
    }

    for promotion in promotions {
        println!(
            "{}  {:>4}  {:<6}  {:<14}  {:<10}  {}",
            promotion.uuid,
            promotion.priority,
            promotion.kind.as_str(),
            promotion.stacking_policy.as_str(),
            promotion.code.as_deref().unwrap_or("-"),
            promotion.name,
        );
    }

    Ok(())
}
