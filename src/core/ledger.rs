//! Earnings ledger updater - the only code that writes an affiliate's earnings totals.
//!
//! Increments are single `UPDATE ... SET col = col + ?` statements so concurrent
//! credits cannot lose updates. Callers that combine a ledger write with other row
//! changes pass a `DatabaseTransaction` so the whole group commits or rolls back.

use crate::{
    core::{affiliate, referral::ReferralStatus},
    entities::{AffiliateProgram, AffiliateReferral, affiliate_program, affiliate_referral},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*, sea_query::Expr};
use tracing::debug;

/// Adds the given deltas to a program's earnings columns in one statement.
async fn increment_earnings<C>(
    db: &C,
    affiliate_program_id: i64,
    total_delta: f64,
    pending_delta: f64,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = AffiliateProgram::update_many()
        .col_expr(
            affiliate_program::Column::TotalEarnings,
            Expr::col(affiliate_program::Column::TotalEarnings).add(total_delta),
        )
        .col_expr(
            affiliate_program::Column::PendingEarnings,
            Expr::col(affiliate_program::Column::PendingEarnings).add(pending_delta),
        )
        .col_expr(
            affiliate_program::Column::UpdatedAt,
            Expr::value(chrono::Utc::now()),
        )
        .filter(affiliate_program::Column::Id.eq(affiliate_program_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::AffiliateNotFound {
            id: affiliate_program_id.to_string(),
        });
    }
    Ok(())
}

/// Flips the PENDING referral for (affiliate, referred user) to CONVERTED, if there is one.
///
/// Returns whether a row was converted.
async fn convert_referral<C>(
    db: &C,
    affiliate_program_id: i64,
    referred_user_id: &str,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = AffiliateReferral::update_many()
        .col_expr(
            affiliate_referral::Column::Status,
            Expr::value(ReferralStatus::Converted.as_str()),
        )
        .col_expr(
            affiliate_referral::Column::ConvertedAt,
            Expr::value(Some(chrono::Utc::now())),
        )
        .filter(affiliate_referral::Column::AffiliateProgramId.eq(affiliate_program_id))
        .filter(affiliate_referral::Column::ReferredUserId.eq(referred_user_id))
        .filter(affiliate_referral::Column::Status.eq(ReferralStatus::Pending.as_str()))
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}

/// Credits an approved commission: `total += amount`, `pending += amount`, and converts
/// the referral of the user who produced it.
pub async fn apply_approved<C>(
    db: &C,
    affiliate_program_id: i64,
    referred_user_id: &str,
    amount: f64,
) -> Result<affiliate_program::Model>
where
    C: ConnectionTrait,
{
    increment_earnings(db, affiliate_program_id, amount, amount).await?;
    if convert_referral(db, affiliate_program_id, referred_user_id).await? {
        debug!(
            "Referral of {} converted for program {}",
            referred_user_id, affiliate_program_id
        );
    }
    affiliate::get_program_by_id(db, affiliate_program_id).await
}

/// Credits a reward that is not tied to a referred user (monthly challenge).
pub async fn credit_reward<C>(
    db: &C,
    affiliate_program_id: i64,
    amount: f64,
) -> Result<affiliate_program::Model>
where
    C: ConnectionTrait,
{
    increment_earnings(db, affiliate_program_id, amount, amount).await?;
    affiliate::get_program_by_id(db, affiliate_program_id).await
}

/// Moves a completed payout's amount from pending to paid.
///
/// Pending earnings are clamped at zero: if earlier drift left less pending than the
/// payout amount, pending ends at 0 rather than going negative. Must run inside the
/// transaction that updates the payout row.
pub async fn settle_payout<C>(
    db: &C,
    affiliate_program_id: i64,
    amount: f64,
) -> Result<affiliate_program::Model>
where
    C: ConnectionTrait,
{
    let program = affiliate::get_program_by_id(db, affiliate_program_id).await?;

    let pending = (program.pending_earnings - amount).max(0.0);
    let paid = program.paid_earnings + amount;

    let mut active: affiliate_program::ActiveModel = program.into();
    active.pending_earnings = Set(pending);
    active.paid_earnings = Set(paid);
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Returns a failed payout's amount to pending earnings.
pub async fn restore_failed_payout<C>(
    db: &C,
    affiliate_program_id: i64,
    amount: f64,
) -> Result<affiliate_program::Model>
where
    C: ConnectionTrait,
{
    increment_earnings(db, affiliate_program_id, 0.0, amount).await?;
    affiliate::get_program_by_id(db, affiliate_program_id).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::referral;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_apply_approved_credits_and_converts() -> Result<()> {
        let (db, program) = setup_with_affiliate().await?;
        referral::register_referred_user(
            &db,
            "buyer",
            "Buyer",
            None,
            Some(&program.affiliate_code),
        )
        .await?;

        let updated = apply_approved(&db, program.id, "buyer", 10.0).await?;
        assert_eq!(updated.total_earnings, 10.0);
        assert_eq!(updated.pending_earnings, 10.0);
        assert_eq!(updated.paid_earnings, 0.0);

        let referral = referral::get_referral(&db, program.id, "buyer")
            .await?
            .unwrap();
        assert_eq!(referral.status, "CONVERTED");
        assert!(referral.converted_at.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_approved_keeps_first_conversion_time() -> Result<()> {
        let (db, program) = setup_with_affiliate().await?;
        referral::register_referred_user(
            &db,
            "buyer",
            "Buyer",
            None,
            Some(&program.affiliate_code),
        )
        .await?;

        apply_approved(&db, program.id, "buyer", 5.0).await?;
        let first = referral::get_referral(&db, program.id, "buyer")
            .await?
            .unwrap();
        let updated = apply_approved(&db, program.id, "buyer", 7.5).await?;
        let second = referral::get_referral(&db, program.id, "buyer")
            .await?
            .unwrap();

        assert_eq!(updated.total_earnings, 12.5);
        assert_eq!(first.converted_at, second.converted_at);
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_approved_without_referral() -> Result<()> {
        let (db, program) = setup_with_affiliate().await?;
        let updated = apply_approved(&db, program.id, "stranger", 3.0).await?;
        assert_eq!(updated.total_earnings, 3.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_approved_missing_program() -> Result<()> {
        let db = setup_test_db().await?;
        let result = apply_approved(&db, 77, "buyer", 3.0).await;
        assert!(matches!(result, Err(Error::AffiliateNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_settle_payout_moves_pending_to_paid() -> Result<()> {
        let (db, program) = setup_with_affiliate().await?;
        set_earnings(&db, program.id, 500.0, 500.0, 0.0).await?;

        let updated = settle_payout(&db, program.id, 500.0).await?;
        assert_eq!(updated.pending_earnings, 0.0);
        assert_eq!(updated.paid_earnings, 500.0);
        assert_eq!(updated.total_earnings, 500.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_settle_payout_clamps_pending_at_zero() -> Result<()> {
        let (db, program) = setup_with_affiliate().await?;
        set_earnings(&db, program.id, 300.0, 300.0, 0.0).await?;

        let updated = settle_payout(&db, program.id, 500.0).await?;
        assert_eq!(updated.pending_earnings, 0.0);
        assert_eq!(updated.paid_earnings, 500.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_restore_failed_payout() -> Result<()> {
        let (db, program) = setup_with_affiliate().await?;
        set_earnings(&db, program.id, 100.0, 40.0, 60.0).await?;

        let updated = restore_failed_payout(&db, program.id, 25.0).await?;
        assert_eq!(updated.pending_earnings, 65.0);
        assert_eq!(updated.total_earnings, 100.0);
        assert_eq!(updated.paid_earnings, 60.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_credit_reward() -> Result<()> {
        let (db, program) = setup_with_affiliate().await?;
        let updated = credit_reward(&db, program.id, 1000.0).await?;
        assert_eq!(updated.total_earnings, 1000.0);
        assert_eq!(updated.pending_earnings, 1000.0);
        Ok(())
    }
}
