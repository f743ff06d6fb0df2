//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// General utility commands
pub mod general;

/// Pending order review and buyer order history
pub mod orders;

/// Catalogue browsing, listing and buying
pub mod shop;

/// Balance, ledger history and top-ups
pub mod wallet;

// Export commands
pub use general::*;
pub use orders::*;
pub use shop::*;
pub use wallet::*;
