//! Admin configuration loaded from environment variables.
//!
//! `ADMIN_USER_IDS` holds a comma separated list of user ids that may approve any order,
//! top up balances and list platform-owned items. Everyone else is a regular principal.

use crate::core::auth::Principal;
use std::collections::HashSet;

/// Set of user ids with admin capabilities.
#[derive(Debug, Clone, Default)]
pub struct AdminRegistry {
    admin_ids: HashSet<String>,
}

impl AdminRegistry {
    /// Builds a registry from a comma separated list, ignoring blanks.
    #[must_use]
    pub fn from_list(list: &str) -> Self {
        let admin_ids = list
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(ToString::to_string)
            .collect();
        Self { admin_ids }
    }

    /// Reads `ADMIN_USER_IDS` from the environment. An unset variable means no admins.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var("ADMIN_USER_IDS")
            .map(|list| Self::from_list(&list))
            .unwrap_or_default()
    }

    /// Whether the given user id is an admin.
    #[must_use]
    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admin_ids.contains(user_id)
    }

    /// Resolves a caller id into the principal the workflows check capabilities against.
    #[must_use]
    pub fn principal_for(&self, user_id: &str) -> Principal {
        Principal::new(user_id, self.is_admin(user_id))
    }

    /// Number of configured admins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.admin_ids.len()
    }

    /// Whether no admin is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.admin_ids.is_empty()
    }
}
