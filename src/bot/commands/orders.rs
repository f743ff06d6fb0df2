//! Order Discord commands - `pending`, `my_orders`, `approve` and `reject`.
//!
//! Admins review every pending order; sellers review the orders for their own items.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete},
        core::{approval, order},
        entities::order as order_entity,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    fn describe(o: &order_entity::Model) -> String {
        let receipt = o
            .receipt_reference
            .as_deref()
            .map(|r| format!(", receipt: {r}"))
            .unwrap_or_default();
        format!(
            "{} #{} - {} coins via {}{receipt}",
            o.item_kind, o.item_id, o.amount, o.payment_method
        )
    }

    /// Lists orders waiting for review.
    #[poise::command(slash_command, prefix_command)]
    pub async fn pending(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        let reviewer = data.principal(ctx.author());
        let orders = if reviewer.is_admin {
            order::list_pending_orders(&data.database).await?
        } else {
            order::list_pending_orders_for_seller(&data.database, &reviewer.id).await?
        };

        if orders.is_empty() {
            ctx.say("No orders are waiting for review.").await?;
            return Ok(());
        }

        let fields: Vec<(String, String, bool)> = orders
            .iter()
            .take(25)
            .map(|o| {
                (
                    format!("Order #{} from <@{}>", o.id, o.buyer_id),
                    describe(o),
                    false,
                )
            })
            .collect();

        let embed = serenity::CreateEmbed::default()
            .title("**Pending orders**")
            .color(0x00F1_C40F)
            .fields(fields);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Shows your orders, newest first.
    #[poise::command(slash_command, prefix_command)]
    pub async fn my_orders(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let author_id = ctx.author().id.to_string();
        let orders = order::list_orders_for_buyer(&ctx.data().database, &author_id).await?;

        if orders.is_empty() {
            ctx.say("You have not ordered anything yet.").await?;
            return Ok(());
        }

        let fields: Vec<(String, String, bool)> = orders
            .iter()
            .take(25)
            .map(|o| {
                let reason = o
                    .rejection_reason
                    .as_deref()
                    .map(|r| format!("\nReason: {r}"))
                    .unwrap_or_default();
                (
                    format!("Order #{} - {}", o.id, o.status),
                    format!("{}{reason}", describe(o)),
                    false,
                )
            })
            .collect();

        let embed = serenity::CreateEmbed::default()
            .title("**Your orders**")
            .color(0x0058_65F2)
            .fields(fields);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Approves a pending order, selling the item and crediting the seller.
    #[poise::command(slash_command, prefix_command)]
    pub async fn approve(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Order to approve"]
        #[autocomplete = "autocomplete::autocomplete_pending_order"]
        order_id: i64,
    ) -> Result<()> {
        let data = ctx.data();
        let approver = data.principal(ctx.author());

        let outcome =
            approval::approve_order(&data.database, &data.dispatcher, &approver, order_id).await?;

        let credit = outcome.seller_balance.map_or_else(String::new, |seller| {
            format!(
                " <@{}> received {} coins.",
                seller.principal_id, outcome.order.amount
            )
        });
        ctx.say(format!(
            "✅ Order #{order_id} approved: **{}** is now sold to <@{}>.{credit}",
            outcome.item.title, outcome.order.buyer_id
        ))
        .await?;
        Ok(())
    }

    /// Rejects a pending order. No coins or items move.
    #[poise::command(slash_command, prefix_command)]
    pub async fn reject(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Order to reject"]
        #[autocomplete = "autocomplete::autocomplete_pending_order"]
        order_id: i64,
        #[description = "Reason shown to the buyer"] reason: Option<String>,
    ) -> Result<()> {
        let data = ctx.data();
        let approver = data.principal(ctx.author());
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        let rejected =
            approval::reject_order(&data.database, &data.dispatcher, &approver, order_id, reason)
                .await?;

        ctx.say(format!(
            "❌ Order #{} from <@{}> rejected.",
            rejected.id, rejected.buyer_id
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
