use bonz_ledger::{
    bot,
    config::{admins::AdminRegistry, catalog, database},
    errors::{Error, Result},
};
use dotenvy::dotenv;
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Shop settings and initial catalogue
    let config = catalog::load_default_config()
        .inspect_err(|e| error!("Failed to load config.toml: {e}"))?;
    let coin_rate = config.shop.coin_rate()?;
    info!(%coin_rate, items = config.items.len(), "Loaded shop configuration");

    // 4. Database: connect, create tables, seed catalogue
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db).await?;
    let seeded = catalog::seed_catalog(&db, &config).await?;
    info!(seeded, "Database initialized successfully.");

    // 5. Admins
    let admins = AdminRegistry::from_env();
    if admins.is_empty() {
        warn!("ADMIN_USER_IDS is empty, only sellers can approve their own orders");
    }

    // 6. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, db, admins, config.shop).await
}
