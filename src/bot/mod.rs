//! Bot layer - Discord-specific interface and command handlers
//!
//! This module is the request boundary of the affiliate engine: slash commands call into
//! `core`, and any error they return is reported back to the caller as a readable reply
//! by [`on_error`].

/// Discord command implementations (affiliate, admin, general)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    config::program::ChallengeRules,
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::collections::HashSet;
use tracing::{error, info, warn};

/// Shared data available to all bot commands.
/// This structure holds the database connection, the program rules and the set of
/// Discord user ids allowed to run admin commands.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Monthly challenge rules from config.toml
    pub rules: ChallengeRules,
    /// Discord ids of back-office admins
    pub admins: HashSet<String>,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub const fn new(
        database: DatabaseConnection,
        rules: ChallengeRules,
        admins: HashSet<String>,
    ) -> Self {
        Self {
            database,
            rules,
            admins,
        }
    }

    /// Whether the given Discord user id may run admin commands.
    #[must_use]
    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admins.contains(user_id)
    }
}

/// Poise context type used by every command
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Fails with `Unauthorized` unless the caller is a configured admin.
pub fn ensure_admin(ctx: Context<'_>) -> Result<()> {
    let caller = ctx.author().id.to_string();
    if ctx.data().is_admin(&caller) {
        Ok(())
    } else {
        warn!(
            "User {} tried to run admin command `{}`",
            caller,
            ctx.command().name
        );
        Err(Error::Unauthorized)
    }
}

/// Reads free-form command input as a JSON object, wrapping anything else as `{key: raw}`.
pub(crate) fn json_details(raw: String, key: &str) -> serde_json::Value {
    serde_json::from_str::<serde_json::Value>(&raw)
        .ok()
        .filter(serde_json::Value::is_object)
        .unwrap_or_else(|| serde_json::json!({ key: raw }))
}

/// Reports command errors back to the caller instead of failing silently.
async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
            if let Err(e) = ctx.say(format!("❌ {error}")).await {
                error!("Failed to send error message: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Connects to Discord, registers all slash commands globally and runs until the
/// gateway connection ends.
pub async fn run_bot(token: String, data: BotData) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all_commands(),
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;

    info!("Starting bot client...");
    client.start().await?;
    Ok(())
}
