//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the shop ledger, including all
//! slash commands, autocomplete handlers, the direct-message notifier and bot context.

/// Discord command implementations (general, wallet, shop, orders)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;
/// Buyer notifications delivered as Discord direct messages
pub mod notifier;

use crate::{
    config::{admins::AdminRegistry, catalog::ShopSettings},
    core::{auth::Principal, notify::Dispatcher, pricing::CoinRate},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Shared data available to all bot commands.
/// This structure holds the database connection, the admin registry and the
/// notification dispatcher that commands need to access.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Users with admin capabilities
    pub admins: AdminRegistry,
    /// Buyer notification delivery
    pub dispatcher: Dispatcher,
    /// Currency units per coin
    pub coin_rate: CoinRate,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub const fn new(
        database: DatabaseConnection,
        admins: AdminRegistry,
        dispatcher: Dispatcher,
        coin_rate: CoinRate,
    ) -> Self {
        Self {
            database,
            admins,
            dispatcher,
            coin_rate,
        }
    }

    /// The principal a Discord user acts as.
    #[must_use]
    pub fn principal(&self, user: &serenity::User) -> Principal {
        self.admins.principal_for(&user.id.to_string())
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {error}", ctx.command().name);
            if let Err(e) = ctx.say(error.user_message()).await {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Builds the poise framework and runs the Discord client until it stops.
///
/// Commands are registered globally once the gateway is ready; the notification
/// dispatcher is created at the same time since it needs the client's HTTP handle.
#[instrument(skip_all)]
pub async fn run_bot(
    token: String,
    database: DatabaseConnection,
    admins: AdminRegistry,
    settings: ShopSettings,
) -> Result<()> {
    let coin_rate = settings.coin_rate()?;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::ping(),
                commands::help(),
                commands::balance(),
                commands::history(),
                commands::topup(),
                commands::items(),
                commands::list_item(),
                commands::buy(),
                commands::claim(),
                commands::order_with_receipt(),
                commands::pending(),
                commands::my_orders(),
                commands::approve(),
                commands::reject(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                let dispatcher = Dispatcher::new(
                    Arc::new(notifier::DiscordNotifier::new(Arc::clone(&ctx.http))),
                    settings.notify_timeout(),
                );
                Ok(BotData::new(database, admins, dispatcher, coin_rate))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {e}"))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {e}"))?;
    Ok(())
}
