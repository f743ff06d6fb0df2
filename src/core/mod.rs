//! Core business logic - framework-agnostic ledger, catalogue and order workflows.
//!
//! Leaf modules (`balance`, `item`, `order`, `ledger`) expose the atomic primitives.
//! `approval` and `purchase` compose them inside one database transaction per call.

/// Admin/seller driven resolution of pending orders
pub mod approval;
/// Capability checks
pub mod auth;
/// Per-principal coin balances
pub mod balance;
/// Sellable accounts and products
pub mod item;
/// Audit trail of coin movements
pub mod ledger;
/// Buyer notifications
pub mod notify;
/// Order records and their status machine
pub mod order;
/// Currency to coin conversion
pub mod pricing;
/// Buyer driven purchases and free claims
pub mod purchase;

use crate::errors::Error;
use sea_orm::DatabaseTransaction;
use tracing::error;

/// Rolls back a failed workflow transaction, keeping the original error as the one reported.
pub(crate) async fn abort(txn: DatabaseTransaction, cause: &Error) {
    if let Err(rollback_error) = txn.rollback().await {
        error!("Rollback after '{cause}' failed: {rollback_error}");
    }
}
