//! Affiliate commission entity - One row per commissionable event.
//!
//! `related_entity_type`/`related_entity_id` store the flattened form of
//! `core::commission::RelatedEntity`; `commission_type` and `status` are the
//! upper-case names of their `core::commission` enums.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Affiliate commission database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "affiliate_commissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub affiliate_program_id: i64,
    /// User whose purchase or action produced the commission
    pub referred_user_id: String,
    /// Amount the commission was computed from
    pub base_amount: f64,
    /// Commission owed to the affiliate
    pub amount: f64,
    pub commission_type: String,
    pub status: String,
    pub requires_verification: bool,
    /// Free-form evidence attached for manual review (deposit screenshots, account ids)
    pub verification_data: Option<Json>,
    pub related_entity_type: String,
    pub related_entity_id: String,
    pub rejection_reason: Option<String>,
    pub created_at: DateTimeUtc,
    /// Set when the commission leaves PENDING
    pub processed_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each commission belongs to one affiliate program
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
