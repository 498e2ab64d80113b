//! Core business logic - framework-agnostic affiliate operations.
//!
//! Everything here talks to the ledger store through `SeaORM` and knows nothing about
//! Discord. Modules are listed leaves first.

/// Platform user records
pub mod user;

/// Referral-count tiers and commission rates
pub mod tier;

/// Affiliate enrollment and lookups
pub mod affiliate;

/// Referral code resolution and referral tracking
pub mod referral;

/// Earnings totals updates
pub mod ledger;

/// Commission creation and verification
pub mod commission;

/// Payout creation and status transitions
pub mod payout;

/// Monthly qualified-referral challenge
pub mod challenge;

/// Affiliate dashboard and earnings consistency reports
pub mod report;
