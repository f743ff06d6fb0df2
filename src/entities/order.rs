//! Order entity - One purchase of exactly one item by one buyer.
//!
//! `item_kind` and `item_id` together form the item reference. `amount` is the price in
//! coins at creation time and is never mutated. `status` is `"pending"`, `"approved"` or
//! `"rejected"`; the typed view lives in `core::order::OrderStatus`.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Buyer who placed the order
    pub buyer_id: String,
    /// Kind of the referenced item: `"account"` or `"product"`
    pub item_kind: String,
    /// ID of the referenced item
    pub item_id: i64,
    /// Price in coins
    pub amount: i64,
    /// Order status: `"pending"`, `"approved"` or `"rejected"`
    pub status: String,
    /// How the buyer paid: `"coins"`, `"receipt"` or `"free"`
    pub payment_method: String,
    /// Storage key of the uploaded payment receipt, if any
    pub receipt_reference: Option<String>,
    /// Reason given when the order was rejected
    pub rejection_reason: Option<String>,
    /// When the order was placed
    pub created_at: DateTimeUtc,
    /// When the order was approved
    pub approved_at: Option<DateTimeUtc>,
    /// Principal who approved the order (the buyer for self-approved purchases)
    pub approved_by: Option<String>,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order targets one item
    #[sea_orm(
        belongs_to = "super::item::Entity",
        from = "Column::ItemId",
        to = "super::item::Column::Id"
    )]
    Item,
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
