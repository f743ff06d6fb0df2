//! Item entity - A sellable account or source-code product.
//!
//! Each item has a price in currency units, an optional owning seller (platform-owned
//! when absent) and a sold flag that flips from false to true exactly once.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Item kind: `"account"` or `"product"`
    pub kind: String,
    /// Seller that owns the item, None for platform-owned items
    pub seller_id: Option<String>,
    /// Listing title shown to buyers
    pub title: String,
    /// Listed price in currency units (0 for free items)
    pub price: i64,
    /// Whether the item has been sold
    pub is_sold: bool,
    /// Buyer the item was sold to
    pub sold_to: Option<String>,
    /// When the item was sold
    pub sold_at: Option<DateTimeUtc>,
    /// When the item was listed
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Item and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One item may be the target of many orders (only one of them ever approved)
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
