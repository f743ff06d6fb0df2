//! Shop configuration loading from config.toml
//!
//! The `[shop]` table holds deployment settings such as the coin conversion rate.
//! The `[[items]]` list is the initial catalogue, seeded into the database on startup
//! for every title that is not listed yet.

use crate::{
    core::{
        item::{self, ItemKind},
        pricing::CoinRate,
    },
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::{path::Path, time::Duration};
use tracing::info;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Deployment settings
    #[serde(default)]
    pub shop: ShopSettings,
    /// Items to seed
    #[serde(default)]
    pub items: Vec<ItemConfig>,
}

/// Deployment settings for the shop
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShopSettings {
    /// Currency units per coin
    pub coin_rate: u32,
    /// Per-attempt timeout for buyer notifications, in seconds
    pub notify_timeout_secs: u64,
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self {
            coin_rate: CoinRate::DEFAULT.get(),
            notify_timeout_secs: 5,
        }
    }
}

impl ShopSettings {
    /// The configured coin rate, validated.
    pub fn coin_rate(&self) -> Result<CoinRate> {
        CoinRate::new(self.coin_rate)
    }

    /// The configured notification timeout.
    #[must_use]
    pub const fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }
}

/// Configuration for a single catalogue item
#[derive(Debug, Deserialize, Clone)]
pub struct ItemConfig {
    /// `"account"` or `"product"`
    pub kind: String,
    /// Listing title, also used to detect already seeded items
    pub title: String,
    /// Price in currency units
    pub price: i64,
    /// Owning seller, omitted for platform-owned items
    #[serde(default)]
    pub seller_id: Option<String>,
}

/// Loads shop configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads shop configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<Config> {
    load_config("config.toml")
}

/// Inserts every configured item whose title is not in the catalogue yet.
///
/// Returns the number of items created.
pub async fn seed_catalog(db: &DatabaseConnection, config: &Config) -> Result<usize> {
    let mut created = 0;
    for entry in &config.items {
        if item::get_item_by_title(db, &entry.title).await?.is_some() {
            continue;
        }
        let kind: ItemKind = entry.kind.parse().map_err(|e| Error::Config {
            message: format!("Catalogue item '{}': {e}", entry.title),
        })?;
        item::create_item(
            db,
            entry.seller_id.clone(),
            kind,
            entry.title.clone(),
            entry.price,
        )
        .await?;
        created += 1;
    }
    info!("Seeded {created} catalogue items");
    Ok(created)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;

    const SAMPLE: &str = r#"
        [shop]
        coin_rate = 500

        [[items]]
        kind = "account"
        title = "Rank 1 account"
        price = 30000
        seller_id = "seller_1"

        [[items]]
        kind = "product"
        title = "Free template"
        price = 0
    "#;

    #[test]
    fn test_parse_shop_config() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.shop.coin_rate, 500);
        assert_eq!(config.shop.notify_timeout_secs, 5);
        assert_eq!(config.items.len(), 2);
        assert_eq!(config.items[0].seller_id.as_deref(), Some("seller_1"));
        assert!(config.items[1].seller_id.is_none());
    }

    #[test]
    fn test_missing_shop_table_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.shop.coin_rate().unwrap(), CoinRate::DEFAULT);
        assert!(config.items.is_empty());
    }

    #[tokio::test]
    async fn test_seed_catalog_skips_existing_titles() -> Result<()> {
        let db = setup_test_db().await?;
        let config: Config = toml::from_str(SAMPLE).unwrap();

        assert_eq!(seed_catalog(&db, &config).await?, 2);
        assert_eq!(seed_catalog(&db, &config).await?, 0);

        let available = item::list_available_items(&db).await?;
        assert_eq!(available.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_catalog_rejects_unknown_kind() -> Result<()> {
        let db = setup_test_db().await?;
        let config: Config = toml::from_str(
            r#"
            [[items]]
            kind = "gift card"
            title = "Bad"
            price = 10
            "#,
        )
        .unwrap();

        let result = seed_catalog(&db, &config).await;
        assert!(matches!(result, Err(Error::Config { .. })));
        Ok(())
    }
}
