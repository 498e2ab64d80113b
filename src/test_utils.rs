//! Shared test utilities for the affiliate engine.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{affiliate, referral, user},
    entities::{AffiliateProgram, affiliate_program},
    errors::Result,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a user that was not referred by anyone.
pub async fn create_test_user(
    db: &DatabaseConnection,
    user_id: &str,
    name: &str,
) -> Result<crate::entities::user::Model> {
    user::create_user(db, user_id.to_string(), name.to_string(), None, None).await
}

/// Signs up a user through the referral flow with the given code.
pub async fn create_referred_user(
    db: &DatabaseConnection,
    user_id: &str,
    code: &str,
) -> Result<crate::entities::user::Model> {
    let (new_user, _) =
        referral::register_referred_user(db, user_id, user_id, None, Some(code)).await?;
    Ok(new_user)
}

/// Sets up a database with one registered affiliate.
///
/// # Defaults
/// * user id: `"affiliate-1"`, name: `"Alice"`
/// * tier: BRONZE at 10%, zero earnings
pub async fn setup_with_affiliate() -> Result<(DatabaseConnection, affiliate_program::Model)> {
    let db = setup_test_db().await?;
    create_test_user(&db, "affiliate-1", "Alice").await?;
    let program = affiliate::register_affiliate(&db, "affiliate-1", None, None).await?;
    Ok((db, program))
}

/// Sets up an affiliate plus one user who signed up with the affiliate's code.
/// Returns the program as it was right after registration.
pub async fn setup_with_referred_user(
    referred_user_id: &str,
) -> Result<(DatabaseConnection, affiliate_program::Model)> {
    let (db, program) = setup_with_affiliate().await?;
    create_referred_user(&db, referred_user_id, &program.affiliate_code).await?;
    Ok((db, program))
}

async fn load_program(
    db: &DatabaseConnection,
    affiliate_program_id: i64,
) -> Result<affiliate_program::ActiveModel> {
    let program = AffiliateProgram::find_by_id(affiliate_program_id)
        .one(db)
        .await?
        .ok_or_else(|| crate::errors::Error::AffiliateNotFound {
            id: affiliate_program_id.to_string(),
        })?;
    Ok(program.into())
}

/// Overwrites the referral counter without touching the tier.
pub async fn set_total_referrals(
    db: &DatabaseConnection,
    affiliate_program_id: i64,
    total_referrals: i32,
) -> Result<affiliate_program::Model> {
    let mut program = load_program(db, affiliate_program_id).await?;
    program.total_referrals = Set(total_referrals);
    program.update(db).await.map_err(Into::into)
}

/// Overwrites the earnings columns directly, for setting up ledger scenarios.
pub async fn set_earnings(
    db: &DatabaseConnection,
    affiliate_program_id: i64,
    total: f64,
    pending: f64,
    paid: f64,
) -> Result<affiliate_program::Model> {
    let mut program = load_program(db, affiliate_program_id).await?;
    program.total_earnings = Set(total);
    program.pending_earnings = Set(pending);
    program.paid_earnings = Set(paid);
    program.update(db).await.map_err(Into::into)
}
