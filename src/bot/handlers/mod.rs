//! Discord interaction handlers
//!
//! This module provides handlers for Discord interactions such as autocomplete.

/// Autocomplete handlers for payout statuses and purchase kinds
pub mod autocomplete;
