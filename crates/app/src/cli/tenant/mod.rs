use clap::{Args, Subcommand};
use pricebook::ids::TenantUuid;
use pricebook_app::{
    config::DatabaseConfig,
    database,
    domain::tenants::{PgTenantsService, TenantsService, data::NewTenant},
};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct TenantCommand {
    #[command(subcommand)]
    command: TenantSubcommand,
}

#[derive(Debug, Subcommand)]
enum TenantSubcommand {
    /// Create a tenant
    Create(CreateTenantArgs),
}

#[derive(Debug, Args)]
struct CreateTenantArgs {
    /// Tenant display name
    #[arg(long)]
    name: String,

    /// Optional tenant UUID; generated when omitted
    #[arg(long)]
    tenant_uuid: Option<Uuid>,

    #[command(flatten)]
    database: DatabaseConfig,
}

pub(crate) async fn run(command: TenantCommand) -> Result<(), String> {
    match command.command {
        TenantSubcommand::Create(args) => create(args).await,
    }
}

async fn create(args: CreateTenantArgs) -> Result<(), String> {
    let pool = database::connect(&args.database.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let service = PgTenantsService::new(pool);
    let uuid = args
        .tenant_uuid
        .map_or_else(TenantUuid::new, TenantUuid::from_uuid);

    let tenant = service
        .create_tenant(NewTenant {
            uuid,
            name: args.name,
        })
        .await
        .map_err(|error| format!("failed to create tenant: {error}"))?;

    println!("tenant_uuid: {}", tenant.uuid);
    println!("tenant_name: {}", tenant.name);

    Ok(())
}
