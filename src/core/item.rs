//! Item business logic - the catalogue of sellable accounts and products.
//!
//! Items are created available and flip to sold exactly once through [`mark_sold`],
//! a conditional update that succeeds for a single caller even under concurrent claims.

use crate::{
    entities::{Item, item},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};
use std::{fmt, str::FromStr};

/// The two kinds of sellable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// A digital account (game, streaming, ...)
    Account,
    /// A source-code product
    Product,
}

impl ItemKind {
    /// Stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Product => "product",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "account" => Ok(Self::Account),
            "product" => Ok(Self::Product),
            other => Err(Error::Validation(format!(
                "Unknown item kind '{other}', expected 'account' or 'product'"
            ))),
        }
    }
}

/// Reference to exactly one item: an account or a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemRef {
    /// An account listing
    Account(i64),
    /// A product listing
    Product(i64),
}

impl ItemRef {
    /// Builds a reference from its parts.
    #[must_use]
    pub const fn new(kind: ItemKind, id: i64) -> Self {
        match kind {
            ItemKind::Account => Self::Account(id),
            ItemKind::Product => Self::Product(id),
        }
    }

    /// Kind of the referenced item.
    #[must_use]
    pub const fn kind(self) -> ItemKind {
        match self {
            Self::Account(_) => ItemKind::Account,
            Self::Product(_) => ItemKind::Product,
        }
    }

    /// ID of the referenced item.
    #[must_use]
    pub const fn id(self) -> i64 {
        match self {
            Self::Account(id) | Self::Product(id) => id,
        }
    }

    /// Reference for a stored item.
    pub fn of(model: &item::Model) -> Result<Self> {
        Ok(Self::new(model.kind.parse()?, model.id))
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.kind(), self.id())
    }
}

/// Whether the item is given away for free.
#[must_use]
pub const fn is_free(model: &item::Model) -> bool {
    model.price == 0
}

/// Lists a new, available item.
///
/// # Errors
/// - `Validation` if the title is empty or whitespace-only
/// - `InvalidAmount` if the price is negative
pub async fn create_item<C>(
    db: &C,
    seller_id: Option<String>,
    kind: ItemKind,
    title: String,
    price: i64,
) -> Result<item::Model>
where
    C: ConnectionTrait,
{
    if title.trim().is_empty() {
        return Err(Error::Validation("Item title cannot be empty".to_string()));
    }

    if price < 0 {
        return Err(Error::InvalidAmount { amount: price });
    }

    let item = item::ActiveModel {
        kind: Set(kind.as_str().to_string()),
        seller_id: Set(seller_id),
        title: Set(title.trim().to_string()),
        price: Set(price),
        is_sold: Set(false),
        sold_to: Set(None),
        sold_at: Set(None),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    item.insert(db).await.map_err(Into::into)
}

/// Finds an item by ID regardless of kind.
pub async fn get_item_by_id<C>(db: &C, item_id: i64) -> Result<Option<item::Model>>
where
    C: ConnectionTrait,
{
    Item::find_by_id(item_id).one(db).await.map_err(Into::into)
}

/// Finds the item a reference points to.
///
/// # Errors
/// `NotFound` if no item has that ID or the stored kind differs from the reference.
pub async fn get_item<C>(db: &C, item_ref: ItemRef) -> Result<item::Model>
where
    C: ConnectionTrait,
{
    get_item_by_id(db, item_ref.id())
        .await?
        .filter(|model| model.kind == item_ref.kind().as_str())
        .ok_or_else(|| Error::NotFound {
            entity: "Item",
            id: item_ref.to_string(),
        })
}

/// Finds an item by its exact title.
pub async fn get_item_by_title<C>(db: &C, title: &str) -> Result<Option<item::Model>>
where
    C: ConnectionTrait,
{
    Item::find()
        .filter(item::Column::Title.eq(title))
        .one(db)
        .await
        .map_err(Into::into)
}

/// All unsold items, newest listing first.
pub async fn list_available_items<C>(db: &C) -> Result<Vec<item::Model>>
where
    C: ConnectionTrait,
{
    Item::find()
        .filter(item::Column::IsSold.eq(false))
        .order_by_desc(item::Column::CreatedAt)
        .order_by_desc(item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Marks an item sold to `buyer_id`.
///
/// A single `UPDATE items SET is_sold = 1 .. WHERE id = ? AND is_sold = 0`: among any number
/// of concurrent callers exactly one succeeds.
///
/// # Errors
/// - `ItemAlreadySold` if the item was sold before this call
/// - `NotFound` if the item does not exist
pub async fn mark_sold<C>(db: &C, item_id: i64, buyer_id: &str) -> Result<item::Model>
where
    C: ConnectionTrait,
{
    let result = Item::update_many()
        .col_expr(item::Column::IsSold, Expr::value(true))
        .col_expr(item::Column::SoldTo, Expr::value(buyer_id))
        .col_expr(item::Column::SoldAt, Expr::value(chrono::Utc::now()))
        .filter(item::Column::Id.eq(item_id))
        .filter(item::Column::IsSold.eq(false))
        .exec(db)
        .await?;

    let item = get_item_by_id(db, item_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "Item",
            id: item_id.to_string(),
        })?;

    if result.rows_affected == 0 {
        return Err(Error::ItemAlreadySold { item_id });
    }
    Ok(item)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;
    use tokio::task::JoinSet;

    #[tokio::test]
    async fn test_create_item_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_item(&db, None, ItemKind::Account, "  ".to_string(), 10).await;
        assert!(matches!(result, Err(Error::Validation(_))));

        let result = create_item(&db, None, ItemKind::Account, "Acc".to_string(), -1).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: -1 })));
        Ok(())
    }

    #[test]
    fn test_item_kind_parse() {
        assert_eq!("Account".parse::<ItemKind>().unwrap(), ItemKind::Account);
        assert_eq!(" product ".parse::<ItemKind>().unwrap(), ItemKind::Product);
        assert!(matches!(
            "voucher".parse::<ItemKind>(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_item_ref_parts() {
        let item_ref = ItemRef::new(ItemKind::Product, 7);
        assert_eq!(item_ref, ItemRef::Product(7));
        assert_eq!(item_ref.id(), 7);
        assert_eq!(item_ref.to_string(), "product #7");
    }

    #[tokio::test]
    async fn test_create_and_get_item() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_test_account(&db, Some("seller"), 30_000).await?;

        assert!(!created.is_sold);
        assert_eq!(created.kind, "account");
        assert_eq!(ItemRef::of(&created)?, ItemRef::Account(created.id));

        let found = get_item(&db, ItemRef::Account(created.id)).await?;
        assert_eq!(found, created);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_item_kind_mismatch_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let account = create_test_account(&db, None, 1000).await?;

        let result = get_item(&db, ItemRef::Product(account.id)).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "Item", .. })));

        let result = get_item(&db, ItemRef::Account(999)).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_mark_sold_once() -> Result<()> {
        let db = setup_test_db().await?;
        let account = create_test_account(&db, None, 1000).await?;

        let sold = mark_sold(&db, account.id, "buyer_1").await?;
        assert!(sold.is_sold);
        assert_eq!(sold.sold_to.as_deref(), Some("buyer_1"));
        assert!(sold.sold_at.is_some());

        let again = mark_sold(&db, account.id, "buyer_2").await;
        assert!(matches!(again, Err(Error::ItemAlreadySold { item_id }) if item_id == account.id));

        // The first buyer is kept
        let item = get_item_by_id(&db, account.id).await?.unwrap();
        assert_eq!(item.sold_to.as_deref(), Some("buyer_1"));

        assert!(list_available_items(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_mark_sold_missing_item() -> Result<()> {
        let db = setup_test_db().await?;
        let result = mark_sold(&db, 404, "buyer").await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_mark_sold_single_winner() -> Result<()> {
        let db = setup_test_db().await?;
        let account = create_test_account(&db, None, 1000).await?;
        let db = Arc::new(db);

        let mut tasks = JoinSet::new();
        for n in 0..8 {
            let db = Arc::clone(&db);
            let item_id = account.id;
            tasks.spawn(async move { mark_sold(&*db, item_id, &format!("buyer_{n}")).await });
        }

        let mut successes = 0;
        let mut failures = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined.unwrap() {
                Ok(_) => successes += 1,
                Err(Error::ItemAlreadySold { .. }) => failures += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(failures, 7);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_available_items_newest_first() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_test_account(&db, None, 1000).await?;
        let second = create_test_product(&db, None, 2000).await?;

        let available = list_available_items(&db).await?;
        assert_eq!(available.len(), 2);
        assert_eq!(available[0].id, second.id);
        assert_eq!(available[1].id, first.id);

        assert_eq!(
            get_item_by_title(&db, &second.title).await?.map(|i| i.id),
            Some(second.id)
        );
        Ok(())
    }
}
