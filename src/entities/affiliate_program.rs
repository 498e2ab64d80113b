//! Affiliate program entity - One row per enrolled affiliate.
//!
//! Holds the affiliate's code, tier, commission rate and the three running earnings
//! totals. The totals are only ever written through `core::ledger`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Affiliate program database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "affiliate_programs")]
pub struct Model {
    /// Unique identifier for the program
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user, one program per user
    #[sea_orm(unique)]
    pub user_id: String,
    /// Public referral code in the form `XEN-XXYY-NNNN`
    #[sea_orm(unique)]
    pub affiliate_code: String,
    /// `"BRONZE"`, `"SILVER"`, `"GOLD"` or `"PLATINUM"`
    pub tier: String,
    /// Commission rate in percent, derived from the tier
    pub commission_rate: f64,
    /// Number of users referred so far
    pub total_referrals: i32,
    /// Everything ever credited (approved commissions and rewards)
    pub total_earnings: f64,
    /// Credited but not yet paid out
    pub pending_earnings: f64,
    /// Paid out through completed payouts
    pub paid_earnings: f64,
    /// Inactive programs' codes are refused at signup
    pub is_active: bool,
    pub payout_method: Option<String>,
    pub payout_details: Option<Json>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between an affiliate program and its ledger rows
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One program has many referrals
    #[sea_orm(has_many = "super::affiliate_referral::Entity")]
    Referrals,
    /// One program has many commissions
    #[sea_orm(has_many = "super::affiliate_commission::Entity")]
    Commissions,
    /// One program has many payouts
    #[sea_orm(has_many = "super::affiliate_payout::Entity")]
    Payouts,
}

impl Related<super::affiliate_referral::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Referrals.def()
    }
}

impl Related<super::affiliate_commission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Commissions.def()
    }
}

impl Related<super::affiliate_payout::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payouts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
