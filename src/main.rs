use dotenvy::dotenv;
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use xen_affiliates::{
    bot::{self, BotData},
    config,
    errors::{Error, Result},
};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load program rules
    let program_config = config::program::load_default_config()
        .inspect_err(|e| error!("Failed to load program rules: {}", e))?;
    info!(
        "Monthly challenge: ${:.2} for {} qualified referrals",
        program_config.challenge.reward_amount, program_config.challenge.qualifying_referrals
    );

    // 4. Connect to the ledger store and make sure the tables exist
    let db = config::database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    config::database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    let admins = config::admins::get_admin_ids();
    if admins.is_empty() {
        info!("AFFILIATE_ADMIN_IDS is not set; admin commands are disabled");
    }

    // 5. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, BotData::new(db, program_config.challenge, admins)).await
}
