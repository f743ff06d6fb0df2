//! Balance store - per-principal coin balances.
//!
//! Every mutation is a single conditional SQL statement, never a read followed by a
//! separate write. Debits only apply while `balance >= amount`, so two concurrent debits
//! can never both succeed past zero. Credits are an upsert so the row is created lazily,
//! and they refuse to push a counter past `i64::MAX`. Each change writes its ledger entry
//! inside the same transaction.

use crate::{
    core::{
        abort,
        auth::{self, Principal},
        ledger::{self, EntryKind},
    },
    entities::{Balance, balance, ledger_entry},
    errors::{Error, Result},
};
use sea_orm::{
    DatabaseTransaction, Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, OnConflict},
};
use tracing::{info, instrument, warn};

/// Current spendable coins, 0 for a principal without a balance row.
pub async fn get_balance<C>(db: &C, principal_id: &str) -> Result<i64>
where
    C: ConnectionTrait,
{
    Ok(get_account(db, principal_id)
        .await?
        .map_or(0, |account| account.balance))
}

/// The full balance row, if one exists.
pub async fn get_account<C>(db: &C, principal_id: &str) -> Result<Option<balance::Model>>
where
    C: ConnectionTrait,
{
    Balance::find_by_id(principal_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Result of a successful balance mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    /// The balance row after the change
    pub account: balance::Model,
    /// The ledger entry recording it
    pub entry: ledger_entry::Model,
}

async fn fetch_account<C>(db: &C, principal_id: &str) -> Result<balance::Model>
where
    C: ConnectionTrait,
{
    get_account(db, principal_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "Balance",
            id: principal_id.to_string(),
        })
}

/// Adds `amount` coins to a principal's balance.
///
/// Performs `INSERT .. ON CONFLICT(principal_id) DO UPDATE SET balance = balance + amount`,
/// creating the row on first credit. Sale credits also raise `total_earned`. The update only
/// applies while neither counter would pass `i64::MAX`. The upsert, its ledger entry and
/// the re-read share one transaction (a savepoint when `db` is already a transaction).
///
/// # Errors
/// `InvalidAmount` if `amount` is not positive or would overflow the balance.
pub async fn credit<C>(
    db: &C,
    principal_id: &str,
    amount: i64,
    kind: EntryKind,
    order_id: Option<i64>,
) -> Result<BalanceChange>
where
    C: ConnectionTrait + TransactionTrait,
{
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }

    let txn = db.begin().await?;
    match apply_credit(&txn, principal_id, amount, kind, order_id).await {
        Ok(change) => {
            txn.commit().await?;
            Ok(change)
        }
        Err(e) => {
            abort(txn, &e).await;
            Err(e)
        }
    }
}

async fn apply_credit(
    txn: &DatabaseTransaction,
    principal_id: &str,
    amount: i64,
    kind: EntryKind,
    order_id: Option<i64>,
) -> Result<BalanceChange> {
    let earned = if kind.counts_as_earnings() { amount } else { 0 };
    let row = balance::ActiveModel {
        principal_id: Set(principal_id.to_string()),
        balance: Set(amount),
        total_earned: Set(earned),
        updated_at: Set(chrono::Utc::now()),
    };

    let applied = Balance::insert(row)
        .on_conflict(
            OnConflict::column(balance::Column::PrincipalId)
                .value(
                    balance::Column::Balance,
                    Expr::col(balance::Column::Balance).add(amount),
                )
                .value(
                    balance::Column::TotalEarned,
                    Expr::col(balance::Column::TotalEarned).add(earned),
                )
                .update_column(balance::Column::UpdatedAt)
                .action_and_where(
                    Expr::col(balance::Column::Balance)
                        .lte(i64::MAX - amount)
                        .and(Expr::col(balance::Column::TotalEarned).lte(i64::MAX - earned)),
                )
                .to_owned(),
        )
        .exec_without_returning(txn)
        .await?;

    if applied == 0 {
        warn!(
            principal = principal_id,
            amount, "Refusing credit, balance would overflow"
        );
        return Err(Error::InvalidAmount { amount });
    }

    let entry = ledger::record_entry(txn, principal_id, amount, kind, order_id).await?;
    let account = fetch_account(txn, principal_id).await?;
    Ok(BalanceChange { account, entry })
}

/// Removes `amount` coins from a principal's balance.
///
/// Performs `UPDATE balances SET balance = balance - amount WHERE principal_id = ? AND
/// balance >= amount`. No partial debit is ever applied. Like [`credit`], the update and its
/// ledger entry share one transaction.
///
/// # Errors
/// - `InvalidAmount` if `amount` is not positive
/// - `InsufficientBalance` if the balance (possibly absent, i.e. 0) is below `amount`
pub async fn debit<C>(
    db: &C,
    principal_id: &str,
    amount: i64,
    kind: EntryKind,
    order_id: Option<i64>,
) -> Result<BalanceChange>
where
    C: ConnectionTrait + TransactionTrait,
{
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }

    let txn = db.begin().await?;
    match apply_debit(&txn, principal_id, amount, kind, order_id).await {
        Ok(change) => {
            txn.commit().await?;
            Ok(change)
        }
        Err(e) => {
            abort(txn, &e).await;
            Err(e)
        }
    }
}

async fn apply_debit(
    txn: &DatabaseTransaction,
    principal_id: &str,
    amount: i64,
    kind: EntryKind,
    order_id: Option<i64>,
) -> Result<BalanceChange> {
    let result = Balance::update_many()
        .col_expr(
            balance::Column::Balance,
            Expr::col(balance::Column::Balance).sub(amount),
        )
        .col_expr(balance::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(balance::Column::PrincipalId.eq(principal_id))
        .filter(balance::Column::Balance.gte(amount))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        let current = get_balance(txn, principal_id).await?;
        return Err(Error::InsufficientBalance {
            current,
            required: amount,
        });
    }

    let entry = ledger::record_entry(txn, principal_id, -amount, kind, order_id).await?;
    let account = fetch_account(txn, principal_id).await?;
    Ok(BalanceChange { account, entry })
}

/// Admin-only credit of coins bought outside the shop. Does not count as earnings.
#[instrument(skip(db), fields(admin = %admin.id))]
pub async fn top_up(
    db: &DatabaseConnection,
    admin: &Principal,
    principal_id: &str,
    amount: i64,
) -> Result<balance::Model> {
    auth::ensure_admin(admin, "top up balances")?;

    let txn = db.begin().await?;
    let account = credit(&txn, principal_id, amount, EntryKind::TopUp, None)
        .await?
        .account;
    txn.commit().await?;

    info!(
        principal = principal_id,
        amount,
        balance = account.balance,
        "Topped up balance"
    );
    Ok(account)
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
    async fn test_amount_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        for amount in [0, -5] {
            let result = credit(&db, "p", amount, EntryKind::TopUp, None).await;
            assert!(matches!(result, Err(Error::InvalidAmount { amount: a }) if a == amount));

            let result = debit(&db, "p", amount, EntryKind::Purchase, None).await;
            assert!(matches!(result, Err(Error::InvalidAmount { amount: a }) if a == amount));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_principal_has_zero_balance() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(get_balance(&db, "nobody").await?, 0);
        assert!(get_account(&db, "nobody").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_credit_creates_then_accumulates() -> Result<()> {
        let db = setup_test_db().await?;

        let first = credit(&db, "seller", 30, EntryKind::Sale, Some(1)).await?;
        assert_eq!(first.account.balance, 30);
        assert_eq!(first.account.total_earned, 30);
        assert_eq!(first.entry.delta, 30);
        assert_eq!(first.entry.order_id, Some(1));

        let second = credit(&db, "seller", 12, EntryKind::TopUp, None).await?;
        assert_eq!(second.account.balance, 42);
        assert_eq!(second.account.total_earned, 30);

        let history = ledger::history_for(&db, "seller", 10).await?;
        assert_eq!(history.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_debit_within_balance() -> Result<()> {
        let db = setup_test_db().await?;
        credit(&db, "buyer", 50, EntryKind::TopUp, None).await?;

        let change = debit(&db, "buyer", 30, EntryKind::Purchase, None).await?;
        assert_eq!(change.account.balance, 20);
        assert_eq!(change.entry.delta, -30);
        assert_eq!(change.entry.kind, "purchase");

        let change = debit(&db, "buyer", 20, EntryKind::Purchase, None).await?;
        assert_eq!(change.account.balance, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_debit_insufficient_leaves_balance_untouched() -> Result<()> {
        let db = setup_test_db().await?;
        credit(&db, "buyer", 10, EntryKind::TopUp, None).await?;

        let result = debit(&db, "buyer", 30, EntryKind::Purchase, None).await;
        assert!(matches!(
            result,
            Err(Error::InsufficientBalance {
                current: 10,
                required: 30
            })
        ));
        assert_eq!(get_balance(&db, "buyer").await?, 10);

        // Only the top-up was recorded
        assert_eq!(ledger::history_for(&db, "buyer", 10).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_debit_missing_principal() -> Result<()> {
        let db = setup_test_db().await?;
        let result = debit(&db, "ghost", 1, EntryKind::Purchase, None).await;
        assert!(matches!(
            result,
            Err(Error::InsufficientBalance {
                current: 0,
                required: 1
            })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_debits_never_overdraw() -> Result<()> {
        let db = setup_test_db().await?;
        credit(&db, "buyer", 50, EntryKind::TopUp, None).await?;
        let db = Arc::new(db);

        let mut tasks = JoinSet::new();
        for _ in 0..5 {
            let db = Arc::clone(&db);
            tasks.spawn(async move { debit(&*db, "buyer", 20, EntryKind::Purchase, None).await });
        }

        let mut successes = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined.unwrap() {
                Ok(_) => successes += 1,
                Err(e) => assert!(matches!(e, Error::InsufficientBalance { .. })),
            }
        }

        assert_eq!(successes, 2);
        assert_eq!(get_balance(&*db, "buyer").await?, 10);
        Ok(())
    }

    #[tokio::test]
    async fn test_top_up_requires_admin() -> Result<()> {
        let db = setup_test_db().await?;

        let refused = top_up(&db, &Principal::user("buyer"), "buyer", 100).await;
        assert!(matches!(refused, Err(Error::Unauthorized { .. })));
        assert_eq!(get_balance(&db, "buyer").await?, 0);

        let account = top_up(&db, &Principal::admin("root"), "buyer", 100).await?;
        assert_eq!(account.balance, 100);
        assert_eq!(account.total_earned, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_credit_refuses_overflow_and_keeps_row_readable() -> Result<()> {
        let db = setup_test_db().await?;
        credit(&db, "rich", i64::MAX, EntryKind::TopUp, None).await?;

        let result = credit(&db, "rich", 1, EntryKind::TopUp, None).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: 1 })));

        // Row untouched and still decodes as an integer
        assert_eq!(get_balance(&db, "rich").await?, i64::MAX);
        assert_eq!(ledger::history_for(&db, "rich", 10).await?.len(), 1);

        // Spending still works afterwards
        let change = debit(&db, "rich", 1, EntryKind::Purchase, None).await?;
        assert_eq!(change.account.balance, i64::MAX - 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_sale_credit_refuses_earnings_overflow() -> Result<()> {
        let db = setup_test_db().await?;
        credit(&db, "seller", i64::MAX, EntryKind::Sale, None).await?;
        debit(&db, "seller", i64::MAX, EntryKind::Purchase, None).await?;

        // Balance has room again, lifetime earnings do not
        let result = credit(&db, "seller", 5, EntryKind::Sale, None).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: 5 })));
        assert_eq!(get_balance(&db, "seller").await?, 0);

        // A top-up does not count as earnings and still applies
        let change = credit(&db, "seller", 5, EntryKind::TopUp, None).await?;
        assert_eq!(change.account.balance, 5);
        assert_eq!(change.account.total_earned, i64::MAX);
        Ok(())
    }
}
