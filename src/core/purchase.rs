//! Purchase workflow - buyer driven orders.
//!
//! Three paths:
//! - coins: instant purchase paid from the buyer's balance, created already approved
//! - free claim: zero-amount order for a free item, also created approved
//! - receipt: off-platform payment, created pending for the approval workflow
//!
//! The coin and free paths create the order, move the coins and sell the item inside one
//! database transaction. If any step fails the whole transaction is rolled back, so the
//! buyer is never charged for a sale that did not happen.

use crate::{
    core::{
        abort,
        auth::Principal,
        balance, item,
        item::ItemRef,
        ledger::{self, EntryKind},
        notify::{Dispatcher, NotificationKind, OrderNotification},
        order::{self, InitialStatus, NewOrder, PaymentMethod},
        pricing::CoinRate,
    },
    entities::{balance as balance_entity, item as item_entity, order as order_entity},
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::{info, instrument, warn};

/// Everything a completed purchase or claim changed.
#[derive(Debug, Clone)]
pub struct PurchaseReceipt {
    /// The new, approved order
    pub order: order_entity::Model,
    /// The item, now sold to the buyer
    pub item: item_entity::Model,
    /// Buyer's coins after the purchase
    pub buyer_balance: i64,
    /// Seller's balance after the credit; None for platform-owned or free items
    pub seller_balance: Option<balance_entity::Model>,
}

fn ensure_orderable(buyer: &Principal, target: &item_entity::Model) -> Result<()> {
    if target.is_sold {
        return Err(Error::InvalidItem {
            item_id: target.id,
            reason: "it has already been sold".to_string(),
        });
    }
    if buyer.owns(target) {
        return Err(Error::InvalidItem {
            item_id: target.id,
            reason: "you cannot buy your own listing".to_string(),
        });
    }
    Ok(())
}

async fn settle_purchase(
    txn: &DatabaseTransaction,
    buyer: &Principal,
    target: &item_entity::Model,
    amount: i64,
    payment: PaymentMethod,
) -> Result<PurchaseReceipt> {
    let debit = if amount > 0 {
        Some(balance::debit(txn, &buyer.id, amount, EntryKind::Purchase, None).await?)
    } else {
        None
    };

    let placed = order::create_order(
        txn,
        NewOrder {
            buyer_id: buyer.id.clone(),
            item: ItemRef::of(target)?,
            amount,
            status: InitialStatus::Approved {
                approver: buyer.id.clone(),
            },
            payment,
            receipt_reference: None,
        },
    )
    .await?;

    let buyer_balance = match debit {
        Some(change) => {
            ledger::link_to_order(txn, change.entry.id, placed.id).await?;
            change.account.balance
        }
        None => balance::get_balance(txn, &buyer.id).await?,
    };

    let sold = item::mark_sold(txn, target.id, &buyer.id).await?;

    let seller_balance = match target.seller_id.as_deref() {
        Some(seller) if amount > 0 => Some(
            balance::credit(txn, seller, amount, EntryKind::Sale, Some(placed.id))
                .await?
                .account,
        ),
        _ => None,
    };

    Ok(PurchaseReceipt {
        order: placed,
        item: sold,
        buyer_balance,
        seller_balance,
    })
}

/// Runs the debit/order/sale/credit steps in one transaction for an already loaded item.
///
/// `target` may be stale: a sale that happened after it was read makes a later step fail
/// and rolls back every earlier one, including the debit.
pub(crate) async fn complete_purchase(
    db: &DatabaseConnection,
    buyer: &Principal,
    target: &item_entity::Model,
    amount: i64,
    payment: PaymentMethod,
) -> Result<PurchaseReceipt> {
    let txn = db.begin().await?;
    match settle_purchase(&txn, buyer, target, amount, payment).await {
        Ok(receipt) => {
            txn.commit().await?;
            Ok(receipt)
        }
        Err(e) => {
            warn!(
                buyer = %buyer.id,
                item_id = target.id,
                "Purchase rolled back: {e}"
            );
            abort(txn, &e).await;
            Err(e)
        }
    }
}

fn approved_notification(receipt: &PurchaseReceipt) -> OrderNotification {
    OrderNotification {
        kind: NotificationKind::OrderApproved,
        buyer_id: receipt.order.buyer_id.clone(),
        order_id: receipt.order.id,
        item_title: receipt.item.title.clone(),
        amount: receipt.order.amount,
        reason: None,
    }
}

/// Buys an item instantly with coins.
///
/// The price is converted with `rate` (rounded up). The buyer's balance is checked before
/// anything is written; the debit itself is still conditional, so a concurrent spend cannot
/// overdraw it.
///
/// # Errors
/// - `NotFound` if the item does not exist
/// - `InvalidItem` if it is sold, free or the buyer's own listing
/// - `InsufficientBalance` if the buyer cannot afford it
/// - `ItemAlreadySold` if another buyer won the race
#[instrument(skip(db, dispatcher), fields(buyer = %buyer.id))]
pub async fn purchase_with_coins(
    db: &DatabaseConnection,
    dispatcher: &Dispatcher,
    buyer: &Principal,
    item_ref: ItemRef,
    rate: CoinRate,
) -> Result<PurchaseReceipt> {
    let target = item::get_item(db, item_ref).await?;
    ensure_orderable(buyer, &target)?;
    if item::is_free(&target) {
        return Err(Error::InvalidItem {
            item_id: target.id,
            reason: "free items must be claimed instead".to_string(),
        });
    }

    let required = rate.coins_for(target.price)?;
    let current = balance::get_balance(db, &buyer.id).await?;
    if current < required {
        warn!(current, required, "Refusing purchase, balance too low");
        return Err(Error::InsufficientBalance { current, required });
    }

    let receipt = complete_purchase(db, buyer, &target, required, PaymentMethod::Coins).await?;
    info!(
        order_id = receipt.order.id,
        item_id = target.id,
        amount = required,
        balance = receipt.buyer_balance,
        "Coin purchase completed"
    );

    dispatcher.dispatch(approved_notification(&receipt));
    Ok(receipt)
}

/// Claims a free item. No balance is checked or moved.
///
/// Exactly one of any number of concurrent claims on the same item succeeds.
///
/// # Errors
/// - `NotFound` if the item does not exist
/// - `InvalidItem` if it is not free, already sold or the claimant's own listing
/// - `ItemAlreadySold` if another claim won the race
#[instrument(skip(db, dispatcher), fields(claimant = %claimant.id))]
pub async fn claim_free_item(
    db: &DatabaseConnection,
    dispatcher: &Dispatcher,
    claimant: &Principal,
    item_ref: ItemRef,
) -> Result<PurchaseReceipt> {
    let target = item::get_item(db, item_ref).await?;
    ensure_orderable(claimant, &target)?;
    if !item::is_free(&target) {
        return Err(Error::InvalidItem {
            item_id: target.id,
            reason: "only free items can be claimed".to_string(),
        });
    }

    let receipt = complete_purchase(db, claimant, &target, 0, PaymentMethod::Free).await?;
    info!(
        order_id = receipt.order.id,
        item_id = target.id,
        "Free item claimed"
    );

    dispatcher.dispatch(approved_notification(&receipt));
    Ok(receipt)
}

/// Places a pending order paid outside the shop, proven by an uploaded receipt.
///
/// The item stays available until an admin or the seller approves the order.
///
/// # Errors
/// - `Validation` if the receipt reference is empty
/// - `NotFound` if the item does not exist
/// - `InvalidItem` if it is sold, free or the buyer's own listing
#[instrument(skip(db), fields(buyer = %buyer.id))]
pub async fn submit_receipt_order(
    db: &DatabaseConnection,
    buyer: &Principal,
    item_ref: ItemRef,
    receipt_reference: String,
    rate: CoinRate,
) -> Result<order_entity::Model> {
    if receipt_reference.trim().is_empty() {
        return Err(Error::Validation(
            "A payment receipt is required".to_string(),
        ));
    }

    let target = item::get_item(db, item_ref).await?;
    ensure_orderable(buyer, &target)?;
    if item::is_free(&target) {
        return Err(Error::InvalidItem {
            item_id: target.id,
            reason: "free items must be claimed instead".to_string(),
        });
    }

    let placed = order::create_order(
        db,
        NewOrder {
            buyer_id: buyer.id.clone(),
            item: item_ref,
            amount: rate.coins_for(target.price)?,
            status: InitialStatus::Pending,
            payment: PaymentMethod::Receipt,
            receipt_reference: Some(receipt_reference.trim().to_string()),
        },
    )
    .await?;

    info!(order_id = placed.id, item_id = target.id, "Receipt order placed");
    Ok(placed)
}
