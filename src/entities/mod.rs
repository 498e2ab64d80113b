//! Entity module - Contains all SeaORM entity definitions for the ledger store.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod affiliate_commission;
pub mod affiliate_payout;
pub mod affiliate_program;
pub mod affiliate_referral;
pub mod monthly_challenge;
pub mod user;

// Re-export specific types to avoid conflicts
pub use affiliate_commission::{
    Column as AffiliateCommissionColumn, Entity as AffiliateCommission,
    Model as AffiliateCommissionModel,
};
pub use affiliate_payout::{
    Column as AffiliatePayoutColumn, Entity as AffiliatePayout, Model as AffiliatePayoutModel,
};
pub use affiliate_program::{
    Column as AffiliateProgramColumn, Entity as AffiliateProgram, Model as AffiliateProgramModel,
};
pub use affiliate_referral::{
    Column as AffiliateReferralColumn, Entity as AffiliateReferral,
    Model as AffiliateReferralModel,
};
pub use monthly_challenge::{
    Column as MonthlyChallengeColumn, Entity as MonthlyChallenge, Model as MonthlyChallengeModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
