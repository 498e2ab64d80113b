//! Monthly challenge entity - Per-affiliate, per-month qualified referral progress.
//! Keyed uniquely by (`user_id`, `month`); see `config::database::create_tables`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Monthly challenge database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "monthly_challenges")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// The affiliate's user id
    pub user_id: String,
    /// Calendar month as `"YYYY-MM"`
    pub month: String,
    pub referral_count: i32,
    /// JSON array of referred user ids that qualified this month
    pub qualified_referrals: Json,
    pub reward_claimed: bool,
    /// Fixed when the record is created
    pub reward_amount: f64,
    pub claimed_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

/// Challenges are keyed by user id rather than program id, so no relation is declared
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
