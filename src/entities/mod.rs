//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod balance;
pub mod item;
pub mod ledger_entry;
pub mod order;

// Re-export specific types to avoid conflicts
pub use balance::{Column as BalanceColumn, Entity as Balance, Model as BalanceModel};
pub use item::{Column as ItemColumn, Entity as Item, Model as ItemModel};
pub use ledger_entry::{
    Column as LedgerEntryColumn, Entity as LedgerEntry, Model as LedgerEntryModel,
};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
