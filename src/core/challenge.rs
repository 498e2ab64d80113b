//! Monthly challenge tracker
//!
//! Each affiliate has one challenge record per calendar month (`"YYYY-MM"`), created
//! lazily. Referred users who place a copy-trading subscription during the month are
//! added to that month's qualified set; once the set reaches the configured threshold
//! the affiliate can claim the month's reward exactly once. Months never carry over.

use crate::{
    config::program::ChallengeRules,
    core::{affiliate, ledger, payout, referral, user},
    entities::{
        AffiliatePayoutModel, AffiliateProgramModel, MonthlyChallenge, monthly_challenge,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

/// Payout method recorded when the affiliate has not configured one yet
const UNSET_PAYOUT_METHOD: &str = "pending";

/// Everything a successful claim produced.
#[derive(Debug, Clone)]
pub struct ClaimOutcome {
    /// The challenge, now marked claimed
    pub challenge: monthly_challenge::Model,
    /// The PENDING payout created for the reward
    pub payout: AffiliatePayoutModel,
    /// The affiliate program after the reward was credited
    pub program: AffiliateProgramModel,
}

/// Calendar month key (`"YYYY-MM"`) of a timestamp.
#[must_use]
pub fn month_key(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}

/// Month key of the current UTC month.
#[must_use]
pub fn current_month_key() -> String {
    month_key(&Utc::now())
}

/// Qualified referred-user ids stored on a challenge.
pub fn qualified_referrals(challenge: &monthly_challenge::Model) -> Result<Vec<String>> {
    serde_json::from_value(challenge.qualified_referrals.clone()).map_err(Into::into)
}

/// Whether the month's reward can be claimed now.
#[must_use]
pub fn is_claimable(challenge: &monthly_challenge::Model, rules: &ChallengeRules) -> bool {
    challenge.referral_count >= rules.qualifying_referrals && !challenge.reward_claimed
}

/// Finds the challenge record for a user and month.
pub async fn get_challenge<C>(
    db: &C,
    user_id: &str,
    month: &str,
) -> Result<Option<monthly_challenge::Model>>
where
    C: ConnectionTrait,
{
    MonthlyChallenge::find()
        .filter(monthly_challenge::Column::UserId.eq(user_id))
        .filter(monthly_challenge::Column::Month.eq(month))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns the challenge for a user and month, creating an empty one if needed.
///
/// The reward amount is fixed from `rules` at creation time.
pub async fn get_or_create_challenge<C>(
    db: &C,
    user_id: &str,
    month: &str,
    rules: &ChallengeRules,
) -> Result<monthly_challenge::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = get_challenge(db, user_id, month).await? {
        return Ok(existing);
    }

    let now = Utc::now();
    let challenge = monthly_challenge::ActiveModel {
        user_id: Set(user_id.to_string()),
        month: Set(month.to_string()),
        referral_count: Set(0),
        qualified_referrals: Set(serde_json::json!([])),
        reward_claimed: Set(false),
        reward_amount: Set(rules.reward_amount),
        claimed_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    debug!("Starting {} challenge for user {}", month, user_id);
    challenge.insert(db).await.map_err(Into::into)
}

/// Lists a user's challenge records, most recent month first.
pub async fn challenge_history(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<monthly_challenge::Model>> {
    MonthlyChallenge::find()
        .filter(monthly_challenge::Column::UserId.eq(user_id))
        .order_by_desc(monthly_challenge::Column::Month)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Counts a referred user's copy-trading subscription toward their referrer's challenge.
///
/// The subscription's month decides which record is updated. A user counts at most
/// once per month no matter how many subscriptions they place, and a claimed month is
/// left untouched. Returns `None` when the user was not referred by a known affiliate.
pub async fn record_qualifying_subscription(
    db: &DatabaseConnection,
    referred_user_id: &str,
    subscribed_at: DateTime<Utc>,
    rules: &ChallengeRules,
) -> Result<Option<monthly_challenge::Model>> {
    let txn = db.begin().await?;

    let referred = user::require_user(&txn, referred_user_id).await?;
    let Some(code) = referred.referred_by_code else {
        return Ok(None);
    };
    let Some(program) = referral::find_program_by_code(&txn, &code).await? else {
        return Ok(None);
    };

    let month = month_key(&subscribed_at);
    let challenge = get_or_create_challenge(&txn, &program.user_id, &month, rules).await?;

    if challenge.reward_claimed {
        txn.commit().await?;
        return Ok(Some(challenge));
    }

    let mut qualified = qualified_referrals(&challenge)?;
    if qualified.iter().any(|id| id == referred_user_id) {
        txn.commit().await?;
        return Ok(Some(challenge));
    }
    qualified.push(referred_user_id.to_string());
    let referral_count = i32::try_from(qualified.len())?;

    let mut active: monthly_challenge::ActiveModel = challenge.into();
    active.qualified_referrals = Set(serde_json::to_value(&qualified)?);
    active.referral_count = Set(referral_count);
    active.updated_at = Set(Utc::now());
    let challenge = active.update(&txn).await?;

    txn.commit().await?;

    info!(
        "Affiliate {} has {} qualified referrals for {}",
        program.affiliate_code, challenge.referral_count, month
    );
    Ok(Some(challenge))
}

/// Claims a month's challenge reward.
///
/// In one transaction: marks the challenge claimed, creates a PENDING payout of the
/// challenge's reward amount and credits the same amount to the affiliate's total and
/// pending earnings. Fails with `AlreadyClaimed`, `NotEligible` (fewer qualified
/// referrals than required, including a month with no record yet) or
/// `NoAffiliateAccount`, in that order, and writes nothing when it fails.
pub async fn claim_reward(
    db: &DatabaseConnection,
    user_id: &str,
    month: &str,
    rules: &ChallengeRules,
) -> Result<ClaimOutcome> {
    let txn = db.begin().await?;

    let challenge = get_challenge(&txn, user_id, month).await?;
    let count = challenge.as_ref().map_or(0, |c| c.referral_count);

    if challenge.as_ref().is_some_and(|c| c.reward_claimed) {
        return Err(Error::AlreadyClaimed {
            month: month.to_string(),
        });
    }

    let Some(challenge) = challenge.filter(|c| c.referral_count >= rules.qualifying_referrals)
    else {
        return Err(Error::NotEligible {
            count,
            required: rules.qualifying_referrals,
        });
    };

    let program = affiliate::get_program_by_user(&txn, user_id)
        .await?
        .ok_or_else(|| Error::NoAffiliateAccount {
            user_id: user_id.to_string(),
        })?;

    let reward_amount = challenge.reward_amount;
    let now = Utc::now();

    let mut active: monthly_challenge::ActiveModel = challenge.into();
    active.reward_claimed = Set(true);
    active.claimed_at = Set(Some(now));
    active.updated_at = Set(now);
    let challenge = active.update(&txn).await?;

    let method = program
        .payout_method
        .clone()
        .unwrap_or_else(|| UNSET_PAYOUT_METHOD.to_string());
    let payout = payout::insert_payout(
        &txn,
        program.id,
        reward_amount,
        method,
        Some(format!("Monthly challenge reward for {month}")),
    )
    .await?;

    let program = ledger::credit_reward(&txn, program.id, reward_amount).await?;

    txn.commit().await?;

    info!(
        "Affiliate {} claimed the {} challenge reward of ${:.2} (payout {})",
        program.affiliate_code, month, reward_amount, payout.id
    );
    Ok(ClaimOutcome {
        challenge,
        payout,
        program,
    })
}
