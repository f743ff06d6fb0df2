//! Autocomplete handlers for Discord slash command parameters.
//!
//! Item parameters are plain IDs; these handlers let the user pick them by title.

use crate::{
    bot::BotData,
    core::{item, order},
    errors::Error,
};
use poise::serenity_prelude as serenity;

/// Discord autocomplete limit
const MAX_CHOICES: usize = 25;

/// Suggests available items whose title matches the partial input.
///
/// Each choice shows the kind, title and price, and submits the item ID.
pub async fn autocomplete_available_item(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    let db = &ctx.data().database;
    let Ok(items) = item::list_available_items(db).await else {
        return Vec::new();
    };

    let partial_lower = partial.to_lowercase();
    items
        .into_iter()
        .filter(|it| {
            it.title.to_lowercase().contains(&partial_lower) || it.id.to_string() == partial
        })
        .take(MAX_CHOICES)
        .map(|it| {
            serenity::AutocompleteChoice::new(
                format!("{} - {} ({})", it.kind, it.title, it.price),
                it.id,
            )
        })
        .collect()
}

/// Suggests pending orders the caller may resolve.
///
/// Admins see every pending order, sellers only those for their own items.
pub async fn autocomplete_pending_order(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    let data = ctx.data();
    let principal = data.principal(ctx.author());
    let pending = if principal.is_admin {
        order::list_pending_orders(&data.database).await
    } else {
        order::list_pending_orders_for_seller(&data.database, &principal.id).await
    };
    let Ok(pending) = pending else {
        return Vec::new();
    };

    pending
        .into_iter()
        .filter(|o| o.id.to_string().starts_with(partial))
        .take(MAX_CHOICES)
        .map(|o| {
            serenity::AutocompleteChoice::new(
                format!("#{} - {} coins from {}", o.id, o.amount, o.buyer_id),
                o.id,
            )
        })
        .collect()
}

/// Suggests the two item kinds.
pub async fn autocomplete_item_kind(
    _ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    [item::ItemKind::Account, item::ItemKind::Product]
        .iter()
        .map(|kind| kind.as_str())
        .filter(|kind| kind.contains(&partial_lower))
        .map(ToString::to_string)
        .collect()
}
