//! Unified error type for the ledger.
//!
//! Workflow failures (`InvalidAmount`, `InsufficientBalance`, `AlreadyProcessed`,
//! `ItemAlreadySold`, `NotFound`) are surfaced synchronously to whoever invoked the
//! workflow. Notification failures never show up here; they are logged and dropped.

use poise::serenity_prelude as serenity;
use sea_orm::DbErr;
use thiserror::Error;

/// All errors produced by the ledger, the workflows and the bot layer.
#[derive(Debug, Error)]
pub enum Error {
    /// A balance mutation or price was given a non-positive (or negative) amount.
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: i64,
    },

    /// A debit would take the balance below zero.
    #[error("Insufficient balance: {current} coins available, {required} required")]
    InsufficientBalance {
        /// Balance at the time of the refused debit
        current: i64,
        /// Coins the operation needed
        required: i64,
    },

    /// The order has already left the pending state.
    #[error("Order {order_id} was already {status}")]
    AlreadyProcessed {
        /// Order that was targeted
        order_id: i64,
        /// Its current (terminal) status
        status: String,
    },

    /// Another sale won the race for this item.
    #[error("Item {item_id} has already been sold")]
    ItemAlreadySold {
        /// Item that was targeted
        item_id: i64,
    },

    /// A referenced order, item or principal does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Kind of record that was looked up
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// The item cannot be the target of a new order.
    #[error("Item {item_id} cannot be ordered: {reason}")]
    InvalidItem {
        /// Item that was targeted
        item_id: i64,
        /// Why it was refused
        reason: String,
    },

    /// The caller lacks the capability for this action.
    #[error("{principal} is not allowed to {action}")]
    Unauthorized {
        /// Caller identifier
        principal: String,
        /// Action that was refused
        action: String,
    },

    /// Rejected user input: an empty title or receipt, an unknown item kind, a malformed id.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Invalid deployment configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Underlying database failure.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// A required environment variable is missing.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Discord gateway or HTTP failure.
    #[error("Discord error: {0}")]
    Discord(Box<serenity::Error>),
}

impl From<serenity::Error> for Error {
    fn from(value: serenity::Error) -> Self {
        Self::Discord(Box::new(value))
    }
}

impl Error {
    /// Message shown to the buyer, seller or admin who triggered the failure.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InsufficientBalance { current, required } => format!(
                "❌ Not enough coins: you have {current}, this needs {required}. Please top up coins and try again."
            ),
            Self::AlreadyProcessed { .. } | Self::ItemAlreadySold { .. } => {
                "⚠️ This order/item was already handled, please refresh.".to_string()
            }
            Self::InvalidItem { reason, .. } => format!("❌ This item cannot be ordered: {reason}"),
            Self::NotFound { entity, id } => format!("❌ {entity} '{id}' was not found."),
            Self::InvalidAmount { amount } => format!("❌ Invalid amount: {amount}"),
            Self::Unauthorized { action, .. } => format!("⛔ You are not allowed to {action}."),
            Self::Validation(message) => format!("❌ {message}"),
            Self::Config { .. } | Self::Database(_) | Self::EnvVar(_) | Self::Discord(_) => {
                "❌ Something went wrong on our side. Please try again later.".to_string()
            }
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_balance_asks_for_top_up() {
        let message = Error::InsufficientBalance {
            current: 10,
            required: 30,
        }
        .user_message();
        assert!(message.contains("top up coins"));
        assert!(message.contains("10"));
        assert!(message.contains("30"));
    }

    #[test]
    fn test_races_ask_for_refresh() {
        let processed = Error::AlreadyProcessed {
            order_id: 1,
            status: "approved".to_string(),
        };
        let sold = Error::ItemAlreadySold { item_id: 2 };
        assert_eq!(processed.user_message(), sold.user_message());
        assert!(sold.user_message().contains("please refresh"));
    }

    #[test]
    fn test_display_includes_context() {
        let err = Error::NotFound {
            entity: "Order",
            id: "42".to_string(),
        };
        assert_eq!(err.to_string(), "Order '42' not found");
    }

    #[test]
    fn test_validation_is_shown_to_the_caller() {
        let err = Error::Validation("A payment receipt is required".to_string());
        assert_eq!(err.to_string(), "Invalid input: A payment receipt is required");
        assert_eq!(err.user_message(), "❌ A payment receipt is required");

        // Deployment problems stay internal
        let config = Error::Config {
            message: "coin_rate must be positive".to_string(),
        };
        assert!(!config.user_message().contains("coin_rate"));
    }
}
