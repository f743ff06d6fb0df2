//! Approval workflow - an admin or the owning seller resolves a pending order.
//!
//! Approval runs the status transition, the sale of the item and the seller credit in one
//! database transaction: either all three are committed or the order stays pending. The
//! buyer is notified only after commit, and a failed notification never undoes anything.

use crate::{
    core::{
        abort,
        auth::{self, Principal},
        balance, item,
        ledger::EntryKind,
        notify::{Dispatcher, NotificationKind, OrderNotification},
        order::{self, Resolution},
    },
    entities::{balance as balance_entity, item as item_entity, order as order_entity},
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::{error, info, instrument, warn};

/// Everything an approval changed.
#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    /// The order, now approved
    pub order: order_entity::Model,
    /// The item, now sold to the buyer
    pub item: item_entity::Model,
    /// The seller's balance after the credit; None for platform-owned or free items
    pub seller_balance: Option<balance_entity::Model>,
}

/// Loads a still-pending order with its item and checks the approver may resolve it.
async fn load_pending(
    db: &DatabaseConnection,
    approver: &Principal,
    order_id: i64,
    resolution: Resolution,
) -> Result<(order_entity::Model, item_entity::Model)> {
    let order = order::get_order(db, order_id).await?;
    if order::status_of(&order)?.resolve(resolution).is_none() {
        return Err(Error::AlreadyProcessed {
            order_id,
            status: order.status,
        });
    }

    let item = item::get_item_by_id(db, order.item_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "Item",
            id: order.item_id.to_string(),
        })?;

    auth::ensure_can_resolve(approver, &item)?;
    Ok((order, item))
}

async fn settle_approval(
    txn: &DatabaseTransaction,
    approver: &Principal,
    order: &order_entity::Model,
    item: &item_entity::Model,
) -> Result<ApprovalOutcome> {
    let approved =
        order::transition_status(txn, order.id, Resolution::Approve, &approver.id, None).await?;

    let sold = item::mark_sold(txn, item.id, &order.buyer_id)
        .await
        .inspect_err(|e| {
            warn!(
                order_id = order.id,
                item_id = item.id,
                "Item sale failed during approval, order stays pending: {e}"
            );
        })?;

    let seller_balance = match item.seller_id.as_deref() {
        Some(seller) if order.amount > 0 => Some(
            balance::credit(txn, seller, order.amount, EntryKind::Sale, Some(order.id))
                .await
                .inspect_err(|e| {
                    error!(
                        target: "reconciliation",
                        order_id = order.id,
                        seller,
                        amount = order.amount,
                        "Seller credit failed, approval rolled back: {e}"
                    );
                })?
                .account,
        ),
        _ => None,
    };

    Ok(ApprovalOutcome {
        order: approved,
        item: sold,
        seller_balance,
    })
}

/// Approves a pending order.
///
/// 1. Order must still be pending (`AlreadyProcessed` otherwise)
/// 2. Order transitions to approved, stamped with the approver
/// 3. Item is marked sold to the buyer (`ItemAlreadySold` rolls everything back)
/// 4. Seller is credited the order amount and its earnings counter raised
/// 5. Buyer receives an `order_approved` notification (best effort)
///
/// # Errors
/// `NotFound`, `Unauthorized`, `AlreadyProcessed`, `ItemAlreadySold`, `InvalidAmount` when the
/// seller's balance cannot take the credit, or a database error.
#[instrument(skip(db, dispatcher), fields(approver = %approver.id))]
pub async fn approve_order(
    db: &DatabaseConnection,
    dispatcher: &Dispatcher,
    approver: &Principal,
    order_id: i64,
) -> Result<ApprovalOutcome> {
    let (order, item) = load_pending(db, approver, order_id, Resolution::Approve).await?;

    let txn = db.begin().await?;
    let outcome = match settle_approval(&txn, approver, &order, &item).await {
        Ok(outcome) => outcome,
        Err(e) => {
            abort(txn, &e).await;
            return Err(e);
        }
    };
    txn.commit().await?;

    info!(
        order_id,
        item_id = item.id,
        buyer = %order.buyer_id,
        amount = order.amount,
        "Order approved"
    );

    dispatcher.dispatch(OrderNotification {
        kind: NotificationKind::OrderApproved,
        buyer_id: order.buyer_id,
        order_id,
        item_title: outcome.item.title.clone(),
        amount: order.amount,
        reason: None,
    });

    Ok(outcome)
}

/// Rejects a pending order. No balance or item changes.
///
/// # Errors
/// `NotFound`, `Unauthorized`, `AlreadyProcessed` or a database error.
#[instrument(skip(db, dispatcher), fields(approver = %approver.id))]
pub async fn reject_order(
    db: &DatabaseConnection,
    dispatcher: &Dispatcher,
    approver: &Principal,
    order_id: i64,
    reason: Option<String>,
) -> Result<order_entity::Model> {
    let (order, item) = load_pending(db, approver, order_id, Resolution::Reject).await?;

    let rejected =
        order::transition_status(db, order_id, Resolution::Reject, &approver.id, reason.clone())
            .await?;

    info!(order_id, buyer = %order.buyer_id, "Order rejected");

    dispatcher.dispatch(OrderNotification {
        kind: NotificationKind::OrderRejected,
        buyer_id: order.buyer_id,
        order_id,
        item_title: item.title,
        amount: order.amount,
        reason,
    });

    Ok(rejected)
}
