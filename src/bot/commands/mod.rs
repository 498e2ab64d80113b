//! Discord command implementations organized by audience.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Back-office commands: commission verification, payouts, program status
pub mod admin;

/// Affiliate self-service commands
pub mod affiliate;

/// Platform event intake: signups, purchases, copy-trading starts
pub mod events;

/// General utility commands
pub mod general;

// Export commands
pub use admin::*;
pub use affiliate::*;
pub use events::*;
pub use general::*;

use crate::{bot::BotData, errors::Error};

/// Every slash command the bot registers.
#[must_use]
pub fn all_commands() -> Vec<poise::Command<BotData, Error>> {
    vec![
        ping(),
        help(),
        join_affiliate(),
        affiliate_stats(),
        set_payout_method(),
        challenge_status(),
        claim_challenge(),
        pending_commissions(),
        approve_commission(),
        reject_commission(),
        create_payout(),
        payout_status(),
        set_affiliate_active(),
        earnings_drift(),
        record_signup(),
        track_referral(),
        record_purchase(),
        record_copy_trading(),
    ]
}
