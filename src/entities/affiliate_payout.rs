//! Affiliate payout entity - A disbursement request and its outcome.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Affiliate payout database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "affiliate_payouts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub affiliate_program_id: i64,
    pub amount: f64,
    /// Payout channel, e.g. `"bank_transfer"` or `"usdt"`
    pub method: String,
    /// `"PENDING"`, `"COMPLETED"` or `"FAILED"`
    pub status: String,
    /// Reference from the payment provider, set on completion
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
    pub paid_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payout belongs to one affiliate program
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
