//! Order ledger - creation, lookup and the pending → approved | rejected state machine.
//!
//! The status column is the single source of truth. Transitions are applied with a
//! conditional update keyed on `status = 'pending'`, so of two concurrent resolutions of the
//! same order exactly one wins and the other gets `AlreadyProcessed`.

use crate::{
    core::item::{self, ItemRef},
    entities::{Item, Order, item as item_entity, order},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};
use std::{fmt, str::FromStr};

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    /// Awaiting an admin or seller decision
    Pending,
    /// Finalized, item sold and seller credited
    Approved,
    /// Refused, nothing moved
    Rejected,
}

/// Decision applied to a pending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Move to `Approved`
    Approve,
    /// Move to `Rejected`
    Reject,
}

impl Resolution {
    /// Status the order ends up in.
    #[must_use]
    pub const fn target(self) -> OrderStatus {
        match self {
            Self::Approve => OrderStatus::Approved,
            Self::Reject => OrderStatus::Rejected,
        }
    }
}

impl OrderStatus {
    /// Stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Approved and rejected orders can never change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Applies a resolution; `None` when the order is already terminal.
    #[must_use]
    pub const fn resolve(self, resolution: Resolution) -> Option<Self> {
        match self {
            Self::Pending => Some(resolution.target()),
            Self::Approved | Self::Rejected => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(Error::Config {
                message: format!("Unknown order status '{other}'"),
            }),
        }
    }
}

/// How the buyer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    /// Instant purchase from the coin balance
    Coins,
    /// Off-platform payment proven by an uploaded receipt
    Receipt,
    /// Free item claim
    Free,
}

impl PaymentMethod {
    /// Stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Coins => "coins",
            Self::Receipt => "receipt",
            Self::Free => "free",
        }
    }
}

/// Status a new order starts in. Orders are never created rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitialStatus {
    /// Waits for the approval workflow
    Pending,
    /// Already paid; `approver` is stamped as `approved_by`
    Approved {
        /// Principal recorded as approver
        approver: String,
    },
}

/// Everything needed to insert an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// Buyer placing the order
    pub buyer_id: String,
    /// Item being bought
    pub item: ItemRef,
    /// Price in coins
    pub amount: i64,
    /// Starting status
    pub status: InitialStatus,
    /// Payment path
    pub payment: PaymentMethod,
    /// Receipt storage key for receipt-based orders
    pub receipt_reference: Option<String>,
}

/// Typed status of a stored order.
pub fn status_of(order: &order::Model) -> Result<OrderStatus> {
    order.status.parse()
}

/// Inserts a new order for an available item.
///
/// # Errors
/// - `InvalidAmount` if the amount is negative
/// - `NotFound` if the item does not exist
/// - `InvalidItem` if the item is already sold
pub async fn create_order<C>(db: &C, new_order: NewOrder) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    if new_order.amount < 0 {
        return Err(Error::InvalidAmount {
            amount: new_order.amount,
        });
    }

    let target = item::get_item(db, new_order.item).await?;
    if target.is_sold {
        return Err(Error::InvalidItem {
            item_id: target.id,
            reason: "it has already been sold".to_string(),
        });
    }

    let now = chrono::Utc::now();
    let (status, approved_at, approved_by) = match new_order.status {
        InitialStatus::Pending => (OrderStatus::Pending, None, None),
        InitialStatus::Approved { approver } => (OrderStatus::Approved, Some(now), Some(approver)),
    };

    let order = order::ActiveModel {
        buyer_id: Set(new_order.buyer_id),
        item_kind: Set(new_order.item.kind().as_str().to_string()),
        item_id: Set(new_order.item.id()),
        amount: Set(new_order.amount),
        status: Set(status.as_str().to_string()),
        payment_method: Set(new_order.payment.as_str().to_string()),
        receipt_reference: Set(new_order.receipt_reference),
        rejection_reason: Set(None),
        created_at: Set(now),
        approved_at: Set(approved_at),
        approved_by: Set(approved_by),
        ..Default::default()
    };
    order.insert(db).await.map_err(Into::into)
}

/// Fetches an order.
///
/// # Errors
/// `NotFound` if no order has this ID.
pub async fn get_order<C>(db: &C, order_id: i64) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "Order",
            id: order_id.to_string(),
        })
}

/// Moves a pending order to its resolved status.
///
/// Approval stamps `approved_at` and `approved_by`; rejection stores the optional reason.
///
/// # Errors
/// - `AlreadyProcessed` if the order is no longer pending
/// - `NotFound` if the order does not exist
pub async fn transition_status<C>(
    db: &C,
    order_id: i64,
    resolution: Resolution,
    approver_id: &str,
    reason: Option<String>,
) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    let mut update = Order::update_many()
        .col_expr(order::Column::Status, Expr::value(resolution.target().as_str()))
        .filter(order::Column::Id.eq(order_id))
        .filter(order::Column::Status.eq(OrderStatus::Pending.as_str()));

    update = match resolution {
        Resolution::Approve => update
            .col_expr(order::Column::ApprovedAt, Expr::value(chrono::Utc::now()))
            .col_expr(order::Column::ApprovedBy, Expr::value(approver_id)),
        Resolution::Reject => update.col_expr(order::Column::RejectionReason, Expr::value(reason)),
    };

    let result = update.exec(db).await?;
    let order = get_order(db, order_id).await?;

    if result.rows_affected == 0 {
        return Err(Error::AlreadyProcessed {
            order_id,
            status: order.status,
        });
    }
    Ok(order)
}

/// All pending orders, oldest first.
pub async fn list_pending_orders<C>(db: &C) -> Result<Vec<order::Model>>
where
    C: ConnectionTrait,
{
    Order::find()
        .filter(order::Column::Status.eq(OrderStatus::Pending.as_str()))
        .order_by_asc(order::Column::CreatedAt)
        .order_by_asc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Pending orders for items owned by one seller, oldest first.
pub async fn list_pending_orders_for_seller<C>(db: &C, seller_id: &str) -> Result<Vec<order::Model>>
where
    C: ConnectionTrait,
{
    Order::find()
        .inner_join(Item)
        .filter(item_entity::Column::SellerId.eq(seller_id))
        .filter(order::Column::Status.eq(OrderStatus::Pending.as_str()))
        .order_by_asc(order::Column::CreatedAt)
        .order_by_asc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// A buyer's orders, newest first.
pub async fn list_orders_for_buyer<C>(db: &C, buyer_id: &str) -> Result<Vec<order::Model>>
where
    C: ConnectionTrait,
{
    Order::find()
        .filter(order::Column::BuyerId.eq(buyer_id))
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
