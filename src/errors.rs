//! Unified error type for the affiliate engine and its Discord surface.
//!
//! Domain failures carry enough context to be shown to the caller as-is; the bot's
//! error hook replies with the `Display` text of these variants.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Integer conversion error: {0}")]
    TryFromInt(#[from] std::num::TryFromIntError),

    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: f64 },

    #[error("Invalid referral code: '{code}'")]
    InvalidReferralCode { code: String },

    #[error("User {user_id} is already registered as an affiliate")]
    AlreadyRegisteredAffiliate { user_id: String },

    #[error("Affiliate account not found: {id}")]
    AffiliateNotFound { id: String },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },

    #[error("Users cannot use their own referral code")]
    SelfReferral,

    #[error("User {user_id} was already referred with code '{code}'")]
    AlreadyReferred { user_id: String, code: String },

    #[error("Commission not found: {id}")]
    CommissionNotFound { id: i64 },

    #[error("Commission {id} has already been processed (status: {status})")]
    CommissionAlreadyProcessed { id: i64, status: String },

    #[error("Not eligible for the monthly reward: {count} of {required} qualified referrals")]
    NotEligible { count: i32, required: i32 },

    #[error("Monthly reward for {month} has already been claimed")]
    AlreadyClaimed { month: String },

    #[error("User {user_id} has no affiliate account")]
    NoAffiliateAccount { user_id: String },

    #[error("Payout not found: {id}")]
    PayoutNotFound { id: i64 },

    #[error("Payout cannot move from {from} to {to}")]
    InvalidPayoutTransition { from: String, to: String },

    #[error("Unknown {kind}: '{value}'")]
    InvalidStatus { kind: &'static str, value: String },

    #[error("You are not allowed to run this command")]
    Unauthorized,

    #[error("Serenity/Poise framework error: {0}")]
    #[allow(clippy::enum_variant_names)]
    FrameworkError(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::FrameworkError(Box::new(value))
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
