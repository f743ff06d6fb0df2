//! Wallet Discord commands - `balance`, `history` and `topup`.
//!
//! Balances are read straight from the balance store; top-ups are admin-only and go
//! through the same atomic credit as sale proceeds.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        core::{auth, balance, ledger},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    const DEFAULT_HISTORY: u64 = 10;
    const MAX_HISTORY: u64 = 50;

    /// Shows a coin balance. Looking at someone else's balance requires admin rights.
    #[poise::command(slash_command, prefix_command)]
    pub async fn balance(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "User to inspect (admins only, defaults to you)"] user: Option<
            serenity::User,
        >,
    ) -> Result<()> {
        let data = ctx.data();
        let caller = data.principal(ctx.author());
        let target = user.as_ref().unwrap_or_else(|| ctx.author());
        if target.id != ctx.author().id {
            auth::ensure_admin(&caller, "view other balances")?;
        }

        let account = balance::get_account(&data.database, &target.id.to_string()).await?;
        let (coins, earned) = account.map_or((0, 0), |a| (a.balance, a.total_earned));

        ctx.say(format!(
            "💰 **{}** has **{coins}** coins ({earned} earned from sales).",
            target.name
        ))
        .await?;
        Ok(())
    }

    /// Shows your latest coin movements, newest first.
    #[poise::command(slash_command, prefix_command)]
    pub async fn history(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Number of entries to show (default 10, max 50)"] limit: Option<u64>,
    ) -> Result<()> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY).clamp(1, MAX_HISTORY);
        let author_id = ctx.author().id.to_string();
        let entries = ledger::history_for(&ctx.data().database, &author_id, limit).await?;

        if entries.is_empty() {
            ctx.say("No coin movements yet.").await?;
            return Ok(());
        }

        let lines: Vec<String> = entries
            .iter()
            .map(|entry| {
                let order = entry
                    .order_id
                    .map(|id| format!(" (order #{id})"))
                    .unwrap_or_default();
                format!(
                    "`{}` {:+} coins - {}{order}",
                    entry.created_at.format("%Y-%m-%d %H:%M"),
                    entry.delta,
                    entry.kind
                )
            })
            .collect();

        let embed = serenity::CreateEmbed::default()
            .title("**Coin History**")
            .description(lines.join("\n"))
            .color(0x0058_65F2);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Credits coins to a user. Admins only.
    #[poise::command(slash_command, prefix_command)]
    pub async fn topup(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "User receiving the coins"] user: serenity::User,
        #[description = "Number of coins to add"] amount: i64,
    ) -> Result<()> {
        let data = ctx.data();
        let admin = data.principal(ctx.author());

        let account =
            balance::top_up(&data.database, &admin, &user.id.to_string(), amount).await?;

        ctx.say(format!(
            "✅ Added **{amount}** coins to {}. New balance: **{}** coins.",
            user.name, account.balance
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
