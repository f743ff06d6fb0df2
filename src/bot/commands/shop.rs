//! Shop Discord commands - `items`, `list_item`, `buy`, `claim` and `order_with_receipt`.
//!
//! Buying and claiming are instant and settle in a single transaction. Receipt orders
//! stay pending until an admin or the seller reviews them with `/approve` or `/reject`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete},
        core::{
            auth,
            item::{self, ItemKind, ItemRef},
            purchase,
        },
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Resolves an item ID picked by the user into a typed reference.
    async fn item_ref(data: &BotData, item_id: i64) -> Result<ItemRef> {
        let found = item::get_item_by_id(&data.database, item_id)
            .await?
            .ok_or_else(|| Error::NotFound {
                entity: "Item",
                id: item_id.to_string(),
            })?;
        ItemRef::of(&found)
    }

    /// Lists every item still for sale with its coin price.
    #[poise::command(slash_command, prefix_command)]
    pub async fn items(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        let available = item::list_available_items(&data.database).await?;

        if available.is_empty() {
            ctx.say("Nothing is for sale right now.").await?;
            return Ok(());
        }

        let mut fields = Vec::with_capacity(available.len());
        for listing in available.iter().take(25) {
            let price = if item::is_free(listing) {
                "free, use `/claim`".to_string()
            } else {
                format!("{} coins", data.coin_rate.coins_for(listing.price)?)
            };
            let seller = listing
                .seller_id
                .as_deref()
                .map_or_else(|| "Bonz Shop".to_string(), |id| format!("<@{id}>"));
            fields.push((
                format!("#{} {} ({})", listing.id, listing.title, listing.kind),
                format!("{price} - sold by {seller}"),
                false,
            ));
        }

        let embed = serenity::CreateEmbed::default()
            .title("**Items for sale**")
            .color(0x0058_65F2)
            .fields(fields);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Lists a new account or product for sale.
    ///
    /// Anyone may sell their own items. Only admins may list platform-owned items
    /// (no seller) or items on behalf of another seller.
    #[poise::command(slash_command, prefix_command)]
    pub async fn list_item(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "account or product"]
        #[autocomplete = "autocomplete::autocomplete_item_kind"]
        kind: String,
        #[description = "Listing title"] title: String,
        #[description = "Price in currency units (0 for a free item)"] price: i64,
        #[description = "Seller (admins only, defaults to you)"] seller: Option<serenity::User>,
        #[description = "List as platform-owned (admins only)"] platform: Option<bool>,
    ) -> Result<()> {
        let data = ctx.data();
        let caller = data.principal(ctx.author());
        let kind: ItemKind = kind.parse()?;

        let seller_id = if platform.unwrap_or(false) {
            None
        } else {
            Some(seller.as_ref().unwrap_or_else(|| ctx.author()).id.to_string())
        };
        auth::ensure_can_list(&caller, seller_id.as_deref())?;

        let listed = item::create_item(&data.database, seller_id, kind, title, price).await?;
        let price_text = if item::is_free(&listed) {
            "free".to_string()
        } else {
            format!("{} coins", data.coin_rate.coins_for(listed.price)?)
        };

        ctx.say(format!(
            "✅ Listed {kind} **{}** (#{}) for {price_text}.",
            listed.title, listed.id
        ))
        .await?;
        Ok(())
    }

    /// Buys an item instantly with coins.
    #[poise::command(slash_command, prefix_command)]
    pub async fn buy(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Item to buy"]
        #[autocomplete = "autocomplete::autocomplete_available_item"]
        item_id: i64,
    ) -> Result<()> {
        let data = ctx.data();
        let buyer = data.principal(ctx.author());
        let target = item_ref(data, item_id).await?;

        let receipt = purchase::purchase_with_coins(
            &data.database,
            &data.dispatcher,
            &buyer,
            target,
            data.coin_rate,
        )
        .await?;

        ctx.say(format!(
            "✅ You bought **{}** for {} coins (order #{}). Remaining balance: **{}** coins.",
            receipt.item.title, receipt.order.amount, receipt.order.id, receipt.buyer_balance
        ))
        .await?;
        Ok(())
    }

    /// Claims a free item.
    #[poise::command(slash_command, prefix_command)]
    pub async fn claim(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Free item to claim"]
        #[autocomplete = "autocomplete::autocomplete_available_item"]
        item_id: i64,
    ) -> Result<()> {
        let data = ctx.data();
        let claimant = data.principal(ctx.author());
        let target = item_ref(data, item_id).await?;

        let receipt =
            purchase::claim_free_item(&data.database, &data.dispatcher, &claimant, target).await?;

        ctx.say(format!(
            "🎁 **{}** is yours (order #{}).",
            receipt.item.title, receipt.order.id
        ))
        .await?;
        Ok(())
    }

    /// Orders an item paid outside the shop. The order waits for review.
    #[poise::command(slash_command, prefix_command)]
    pub async fn order_with_receipt(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Item to order"]
        #[autocomplete = "autocomplete::autocomplete_available_item"]
        item_id: i64,
        #[description = "Payment receipt (link or transfer reference)"] receipt: String,
    ) -> Result<()> {
        let data = ctx.data();
        let buyer = data.principal(ctx.author());
        let target = item_ref(data, item_id).await?;

        let placed =
            purchase::submit_receipt_order(&data.database, &buyer, target, receipt, data.coin_rate)
                .await?;

        ctx.say(format!(
            "🧾 Order #{} for {target} ({} coins) is waiting for review. You will get a DM once it is handled.",
            placed.id, placed.amount
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
