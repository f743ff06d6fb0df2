//! Ledger entry entity - Audit trail of every coin movement.
//!
//! Written in the same database transaction as the balance change it records.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ledger entry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Principal whose balance moved
    pub principal_id: String,
    /// Signed change in coins (negative for debits)
    pub delta: i64,
    /// Type of movement: `"purchase"`, `"sale"` or `"top_up"`
    pub kind: String,
    /// Order that caused the movement, if any
    pub order_id: Option<i64>,
    /// When the movement happened
    pub created_at: DateTimeUtc,
}

/// `LedgerEntry` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
