//! Database configuration module for the affiliate ledger.
//!
//! This module handles the `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the database schema always matches the Rust structs. Composite uniqueness
//! (one referral per affiliate/user pair, one challenge per user/month) is added as
//! explicit unique indexes.

use crate::entities::{
    AffiliateCommission, AffiliatePayout, AffiliateProgram, AffiliateReferral, MonthlyChallenge,
    User, affiliate_referral, monthly_challenge,
};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::info;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/xen_affiliates.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    info!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all ledger tables and their unique indexes if they do not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    for mut table in [
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(AffiliateProgram),
        schema.create_table_from_entity(AffiliateReferral),
        schema.create_table_from_entity(AffiliateCommission),
        schema.create_table_from_entity(AffiliatePayout),
        schema.create_table_from_entity(MonthlyChallenge),
    ] {
        table.if_not_exists();
        db.execute(builder.build(&table)).await?;
    }

    let referral_pair = Index::create()
        .name("idx_affiliate_referrals_program_user")
        .table(AffiliateReferral)
        .col(affiliate_referral::Column::AffiliateProgramId)
        .col(affiliate_referral::Column::ReferredUserId)
        .unique()
        .if_not_exists()
        .to_owned();

    let challenge_month = Index::create()
        .name("idx_monthly_challenges_user_month")
        .table(MonthlyChallenge)
        .col(monthly_challenge::Column::UserId)
        .col(monthly_challenge::Column::Month)
        .unique()
        .if_not_exists()
        .to_owned();

    db.execute(builder.build(&referral_pair)).await?;
    db.execute(builder.build(&challenge_month)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{affiliate_program::Model as AffiliateProgramModel, monthly_challenge};
    use sea_orm::{ActiveModelTrait, EntityTrait, QuerySelect, Set};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        let _: Vec<AffiliateProgramModel> = AffiliateProgram::find().limit(1).all(&db).await?;
        let _ = User::find().limit(1).all(&db).await?;
        let _ = AffiliateReferral::find().limit(1).all(&db).await?;
        let _ = AffiliateCommission::find().limit(1).all(&db).await?;
        let _ = AffiliatePayout::find().limit(1).all(&db).await?;
        let _ = MonthlyChallenge::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_repeatable() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_challenge_month_is_unique_per_user() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        let now = chrono::Utc::now();
        let row = || monthly_challenge::ActiveModel {
            user_id: Set("affiliate".to_string()),
            month: Set("2025-10".to_string()),
            referral_count: Set(0),
            qualified_referrals: Set(serde_json::json!([])),
            reward_claimed: Set(false),
            reward_amount: Set(1000.0),
            claimed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        row().insert(&db).await?;
        assert!(row().insert(&db).await.is_err());
        Ok(())
    }
}
