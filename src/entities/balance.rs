//! Balance entity - The spendable coin balance of a buyer or seller.
//!
//! Rows are created lazily on the first credit and are never deleted. The balance
//! is a running total maintained by atomic updates, never recomputed from history.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Balance database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "balances")]
pub struct Model {
    /// Buyer user id or seller id owning this balance
    #[sea_orm(primary_key, auto_increment = false)]
    pub principal_id: String,
    /// Spendable coins, never negative
    pub balance: i64,
    /// Cumulative coins earned from sales (sellers only, top-ups excluded)
    pub total_earned: i64,
    /// When the balance last changed
    pub updated_at: DateTimeUtc,
}

/// `Balance` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
