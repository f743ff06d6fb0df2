//! Authorization - capability checks shared by every workflow.
//!
//! Callers are resolved into a [`Principal`] once at the edge (see
//! `config::admins::AdminRegistry`); workflows only ask the questions below.

use crate::{
    entities::item,
    errors::{Error, Result},
};
use tracing::warn;

/// The caller of a workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Buyer or seller identifier
    pub id: String,
    /// Whether the caller has admin capabilities
    pub is_admin: bool,
}

impl Principal {
    /// Creates a principal.
    pub fn new(id: impl Into<String>, is_admin: bool) -> Self {
        Self {
            id: id.into(),
            is_admin,
        }
    }

    /// A regular buyer or seller.
    pub fn user(id: impl Into<String>) -> Self {
        Self::new(id, false)
    }

    /// An admin.
    pub fn admin(id: impl Into<String>) -> Self {
        Self::new(id, true)
    }

    /// Whether the principal owns the item as its seller.
    #[must_use]
    pub fn owns(&self, item: &item::Model) -> bool {
        item.seller_id.as_deref() == Some(self.id.as_str())
    }
}

fn refuse(principal: &Principal, action: &str) -> Error {
    warn!(principal = %principal.id, action, "Refused unauthorized action");
    Error::Unauthorized {
        principal: principal.id.clone(),
        action: action.to_string(),
    }
}

/// Requires admin capabilities.
pub fn ensure_admin(principal: &Principal, action: &str) -> Result<()> {
    if principal.is_admin {
        Ok(())
    } else {
        Err(refuse(principal, action))
    }
}

/// Only an admin or the item's seller may approve or reject its orders.
pub fn ensure_can_resolve(principal: &Principal, item: &item::Model) -> Result<()> {
    if principal.is_admin || principal.owns(item) {
        Ok(())
    } else {
        Err(refuse(principal, "resolve orders for this item"))
    }
}

/// Only an admin may list platform-owned items; anyone may list their own.
pub fn ensure_can_list(principal: &Principal, seller_id: Option<&str>) -> Result<()> {
    match seller_id {
        Some(seller) if seller == principal.id => Ok(()),
        _ if principal.is_admin => Ok(()),
        _ => Err(refuse(principal, "list items for another seller")),
    }
}
