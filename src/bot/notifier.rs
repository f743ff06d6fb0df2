//! Delivers order notifications to buyers as Discord direct messages.

use crate::{
    core::notify::{Notifier, OrderNotification},
    errors::{Error, Result},
};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::{fmt, sync::Arc};

/// Sends the rendered notification to the buyer's DMs.
pub struct DiscordNotifier {
    http: Arc<serenity::Http>,
}

impl DiscordNotifier {
    /// Wraps the client's HTTP handle.
    #[must_use]
    pub const fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

impl fmt::Debug for DiscordNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordNotifier").finish_non_exhaustive()
    }
}

/// Parses a buyer id into a Discord user id.
fn recipient(buyer_id: &str) -> Result<serenity::UserId> {
    match buyer_id.parse::<u64>() {
        Ok(id) if id != 0 => Ok(serenity::UserId::new(id)),
        _ => Err(Error::Validation(format!(
            "'{buyer_id}' is not a Discord user id"
        ))),
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, notification: &OrderNotification) -> Result<()> {
        let user = recipient(&notification.buyer_id)?;
        user.direct_message(
            self.http.as_ref(),
            serenity::CreateMessage::new().content(notification.render()),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_parsing() {
        assert_eq!(
            recipient("123456789012345678").ok(),
            Some(serenity::UserId::new(123_456_789_012_345_678))
        );
        assert!(matches!(recipient("0"), Err(Error::Validation(_))));
        assert!(matches!(recipient("buyer"), Err(Error::Validation(_))));
    }
}
