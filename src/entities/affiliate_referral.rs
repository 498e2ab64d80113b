//! Affiliate referral entity - Links an affiliate program to a user it referred.
//!
//! Status moves PENDING -> CONVERTED once, when the first commission for the
//! referred user is approved.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Affiliate referral database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "affiliate_referrals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub affiliate_program_id: i64,
    pub referred_user_id: String,
    /// `"PENDING"` or `"CONVERTED"`
    pub status: String,
    pub converted_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

/// Defines relationships between a referral and its program
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each referral belongs to one affiliate program
    #[sea_orm(
        belongs_to = "super::affiliate_program::Entity",
        from = "Column::AffiliateProgramId",
        to = "super::affiliate_program::Column::Id"
    )]
    AffiliateProgram,
}

impl Related<super::affiliate_program::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AffiliateProgram.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
