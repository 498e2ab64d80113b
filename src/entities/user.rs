//! User entity - The slice of a platform user the affiliate system needs.
//!
//! Identity and authentication live elsewhere; this table only records who a user is
//! and which referral code (if any) they signed up with.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// External user identifier (the authenticated caller identity)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Display name, also used to derive affiliate codes
    pub name: String,
    pub email: Option<String>,
    /// Affiliate code the user signed up with, if any
    pub referred_by_code: Option<String>,
    pub created_at: DateTimeUtc,
}

/// Users are referenced by string id from the affiliate tables; no foreign keys are declared
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
