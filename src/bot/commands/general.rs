//! General Discord commands - ping, help, and other utility commands.
//! This module contains simple commands that don't require database operations
//! and provide basic bot functionality and user assistance.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = format!(
            "**Bonz Shop Help**\n\
            Prices are converted to coins at {} currency units per coin, rounded up.\n\n\
            **Wallet**\n\
            • `/balance [user]` - Shows your coin balance.\n\
            • `/history [limit]` - Shows your latest coin movements.\n\
            • `/topup <user> <amount>` - (admin) Credits coins bought outside the shop.\n\n\
            **Shop**\n\
            • `/items` - Lists everything still for sale.\n\
            • `/list_item <kind> <title> <price> [seller]` - Lists an account or product.\n\
            • `/buy <item>` - Buys an item instantly with coins.\n\
            • `/claim <item>` - Claims a free item.\n\
            • `/order_with_receipt <item> <receipt>` - Orders with an off-platform payment receipt.\n\n\
            **Orders**\n\
            • `/my_orders` - Shows your orders and their status.\n\
            • `/pending` - (admin/seller) Lists orders waiting for review.\n\
            • `/approve <order>` - (admin/seller) Approves a pending order.\n\
            • `/reject <order> [reason]` - (admin/seller) Rejects a pending order.\n\n\
            **Utility**\n\
            • `/ping` - Checks if the bot is responsive.\n\
            • `/help` - Shows this help message.",
            ctx.data().coin_rate.get()
        );

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
