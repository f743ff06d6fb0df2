//! Coin ledger history - the audit trail written alongside every balance change.
//!
//! Entries are informational only. Balances are running totals in the `balances`
//! table and are never recomputed from this history.

use crate::{
    entities::{LedgerEntry, ledger_entry},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*, sea_query::Expr};
use std::{fmt, str::FromStr};

/// Why a balance moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Buyer spent coins on an item
    Purchase,
    /// Seller earned coins from a sale
    Sale,
    /// Admin credited coins
    TopUp,
}

impl EntryKind {
    /// Stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Sale => "sale",
            Self::TopUp => "top_up",
        }
    }

    /// Whether a credit of this kind also counts towards `total_earned`.
    #[must_use]
    pub const fn counts_as_earnings(self) -> bool {
        matches!(self, Self::Sale)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "purchase" => Ok(Self::Purchase),
            "sale" => Ok(Self::Sale),
            "top_up" => Ok(Self::TopUp),
            other => Err(Error::Config {
                message: format!("Unknown ledger entry kind '{other}'"),
            }),
        }
    }
}

/// Appends an entry. Must run on the same connection or transaction as the balance change.
pub(crate) async fn record_entry<C>(
    db: &C,
    principal_id: &str,
    delta: i64,
    kind: EntryKind,
    order_id: Option<i64>,
) -> Result<ledger_entry::Model>
where
    C: ConnectionTrait,
{
    let entry = ledger_entry::ActiveModel {
        principal_id: Set(principal_id.to_string()),
        delta: Set(delta),
        kind: Set(kind.as_str().to_string()),
        order_id: Set(order_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    entry.insert(db).await.map_err(Into::into)
}

/// Attaches an entry written before its order existed to that order.
pub(crate) async fn link_to_order<C>(db: &C, entry_id: i64, order_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    LedgerEntry::update_many()
        .col_expr(ledger_entry::Column::OrderId, Expr::value(order_id))
        .filter(ledger_entry::Column::Id.eq(entry_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Most recent coin movements for a principal, newest first.
pub async fn history_for<C>(
    db: &C,
    principal_id: &str,
    limit: u64,
) -> Result<Vec<ledger_entry::Model>>
where
    C: ConnectionTrait,
{
    LedgerEntry::find()
        .filter(ledger_entry::Column::PrincipalId.eq(principal_id))
        .order_by_desc(ledger_entry::Column::CreatedAt)
        .order_by_desc(ledger_entry::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Entries caused by one order, oldest first.
pub async fn entries_for_order<C>(db: &C, order_id: i64) -> Result<Vec<ledger_entry::Model>>
where
    C: ConnectionTrait,
{
    LedgerEntry::find()
        .filter(ledger_entry::Column::OrderId.eq(order_id))
        .order_by_asc(ledger_entry::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
