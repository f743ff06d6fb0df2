//! Discord interaction handlers
//!
//! This module provides handlers for Discord interactions such as autocomplete.

/// Autocomplete handlers for item ids, pending order ids and item kinds
pub mod autocomplete;
