//! Affiliate registry - enrollment, code generation, lookups and payout settings.
//!
//! A user enrolls once; the program row created here is the target of every later
//! commission, referral and payout. Earnings fields start at zero and are only
//! changed by `core::ledger`.

use crate::{
    core::tier::{self, Tier},
    entities::{AffiliateProgram, affiliate_program},
    errors::{Error, Result},
};
use rand::Rng;
use sea_orm::{Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{info, warn};

const CODE_PREFIX: &str = "XEN";
const MAX_CODE_ATTEMPTS: usize = 10;

/// Takes the first two ASCII alphanumerics of `source`, upper-cased and padded with `pad`.
fn code_fragment(source: &str, pad: char) -> String {
    let mut fragment: String = source
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(2)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    while fragment.len() < 2 {
        fragment.push(pad);
    }
    fragment
}

/// Builds an affiliate code `XEN-XXYY-NNNN` from a name, a user id and a numeric suffix.
///
/// `XX` comes from the name, `YY` from the user id and `NNNN` is the suffix modulo 10000,
/// zero-padded.
#[must_use]
pub fn format_affiliate_code(name: &str, user_id: &str, suffix: u16) -> String {
    format!(
        "{CODE_PREFIX}-{}{}-{:04}",
        code_fragment(name, 'X'),
        code_fragment(user_id, '0'),
        suffix % 10_000
    )
}

/// Generates a code with a random four-digit suffix.
#[must_use]
pub fn generate_affiliate_code(name: &str, user_id: &str) -> String {
    let suffix = rand::thread_rng().gen_range(0..10_000);
    format_affiliate_code(name, user_id, suffix)
}

/// Finds the affiliate program owned by a user.
pub async fn get_program_by_user<C>(
    db: &C,
    user_id: &str,
) -> Result<Option<affiliate_program::Model>>
where
    C: ConnectionTrait,
{
    AffiliateProgram::find()
        .filter(affiliate_program::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds an affiliate program by primary key, failing with `AffiliateNotFound` if absent.
pub async fn get_program_by_id<C>(
    db: &C,
    affiliate_program_id: i64,
) -> Result<affiliate_program::Model>
where
    C: ConnectionTrait,
{
    AffiliateProgram::find_by_id(affiliate_program_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::AffiliateNotFound {
            id: affiliate_program_id.to_string(),
        })
}

/// Enrolls a user as an affiliate.
///
/// The program starts at BRONZE with zero referrals and earnings. Registration is
/// one-time per user: a second attempt fails with `AlreadyRegisteredAffiliate`.
pub async fn register_affiliate(
    db: &DatabaseConnection,
    user_id: &str,
    payout_method: Option<String>,
    payout_details: Option<Json>,
) -> Result<affiliate_program::Model> {
    let txn = db.begin().await?;

    let user = crate::core::user::require_user(&txn, user_id).await?;

    if get_program_by_user(&txn, user_id).await?.is_some() {
        return Err(Error::AlreadyRegisteredAffiliate {
            user_id: user_id.to_string(),
        });
    }

    let mut affiliate_code = None;
    for _ in 0..MAX_CODE_ATTEMPTS {
        let candidate = generate_affiliate_code(&user.name, &user.id);
        let taken = AffiliateProgram::find()
            .filter(affiliate_program::Column::AffiliateCode.eq(candidate.as_str()))
            .one(&txn)
            .await?
            .is_some();
        if !taken {
            affiliate_code = Some(candidate);
            break;
        }
        warn!("Affiliate code {} already taken, retrying", candidate);
    }
    let affiliate_code = affiliate_code.ok_or_else(|| Error::Config {
        message: format!("Could not generate a unique affiliate code for user {user_id}"),
    })?;

    let (tier, rate) = tier::tier_for(0);
    let now = chrono::Utc::now();
    let program = affiliate_program::ActiveModel {
        user_id: Set(user.id),
        affiliate_code: Set(affiliate_code),
        tier: Set(tier.as_str().to_string()),
        commission_rate: Set(rate),
        total_referrals: Set(0),
        total_earnings: Set(0.0),
        pending_earnings: Set(0.0),
        paid_earnings: Set(0.0),
        is_active: Set(true),
        payout_method: Set(payout_method),
        payout_details: Set(payout_details),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let program = program.insert(&txn).await?;

    txn.commit().await?;

    info!(
        "Registered affiliate {} for user {}",
        program.affiliate_code, program.user_id
    );
    Ok(program)
}

/// Atomically bumps an affiliate's referral counter and re-applies the tier engine.
pub async fn increment_total_referrals<C>(
    db: &C,
    affiliate_program_id: i64,
) -> Result<affiliate_program::Model>
where
    C: ConnectionTrait,
{
    let result = AffiliateProgram::update_many()
        .col_expr(
            affiliate_program::Column::TotalReferrals,
            Expr::col(affiliate_program::Column::TotalReferrals).add(1),
        )
        .filter(affiliate_program::Column::Id.eq(affiliate_program_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::AffiliateNotFound {
            id: affiliate_program_id.to_string(),
        });
    }

    tier::apply_tier(db, affiliate_program_id).await
}

/// Stores the payout method (and optional details) an affiliate wants to be paid with.
pub async fn update_payout_settings(
    db: &DatabaseConnection,
    user_id: &str,
    payout_method: String,
    payout_details: Option<Json>,
) -> Result<affiliate_program::Model> {
    if payout_method.trim().is_empty() {
        return Err(Error::Config {
            message: "Payout method cannot be empty".to_string(),
        });
    }

    let program = get_program_by_user(db, user_id)
        .await?
        .ok_or_else(|| Error::NoAffiliateAccount {
            user_id: user_id.to_string(),
        })?;

    let mut active: affiliate_program::ActiveModel = program.into();
    active.payout_method = Set(Some(payout_method.trim().to_string()));
    active.payout_details = Set(payout_details);
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Activates or deactivates an affiliate program. Inactive codes are refused at signup.
pub async fn set_program_active(
    db: &DatabaseConnection,
    affiliate_program_id: i64,
    is_active: bool,
) -> Result<affiliate_program::Model> {
    let program = get_program_by_id(db, affiliate_program_id).await?;

    let mut active: affiliate_program::ActiveModel = program.into();
    active.is_active = Set(is_active);
    active.updated_at = Set(chrono::Utc::now());
    let program = active.update(db).await?;

    info!(
        "Affiliate {} is now {}",
        program.affiliate_code,
        if is_active { "active" } else { "inactive" }
    );
    Ok(program)
}

/// Parses the stored tier of a program.
pub fn program_tier(program: &affiliate_program::Model) -> Result<Tier> {
    program.tier.parse()
}
