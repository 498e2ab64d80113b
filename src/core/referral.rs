//! Referral resolver and referral tracking.
//!
//! Two lookups exist on purpose. The signup flow goes through [`resolve_referral_code`],
//! which refuses codes of inactive programs; retroactive attachment of an existing user
//! goes through [`find_program_by_code`], which does not look at the active flag.

use crate::{
    core::{affiliate, user},
    entities::{AffiliateProgram, AffiliateReferral, affiliate_program, affiliate_referral},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Lifecycle of a referral row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferralStatus {
    /// Referred user has not produced an approved commission yet
    Pending,
    /// First commission for the referred user was approved
    Converted,
}

impl ReferralStatus {
    /// Stored representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Converted => "CONVERTED",
        }
    }
}

impl fmt::Display for ReferralStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferralStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "CONVERTED" => Ok(Self::Converted),
            other => Err(Error::InvalidStatus {
                kind: "referral status",
                value: other.to_string(),
            }),
        }
    }
}

/// Looks up the program owning exactly `code`, regardless of its active flag.
pub async fn find_program_by_code<C>(
    db: &C,
    code: &str,
) -> Result<Option<affiliate_program::Model>>
where
    C: ConnectionTrait,
{
    AffiliateProgram::find()
        .filter(affiliate_program::Column::AffiliateCode.eq(code))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Resolves a referral code for a new signup.
///
/// Matching is exact and case-sensitive. Unknown codes and codes of inactive programs
/// both fail with `InvalidReferralCode`.
pub async fn resolve_referral_code<C>(db: &C, code: &str) -> Result<affiliate_program::Model>
where
    C: ConnectionTrait,
{
    match find_program_by_code(db, code).await? {
        Some(program) if program.is_active => Ok(program),
        _ => Err(Error::InvalidReferralCode {
            code: code.to_string(),
        }),
    }
}

/// Finds the referral row for an (affiliate, referred user) pair.
pub async fn get_referral<C>(
    db: &C,
    affiliate_program_id: i64,
    referred_user_id: &str,
) -> Result<Option<affiliate_referral::Model>>
where
    C: ConnectionTrait,
{
    AffiliateReferral::find()
        .filter(affiliate_referral::Column::AffiliateProgramId.eq(affiliate_program_id))
        .filter(affiliate_referral::Column::ReferredUserId.eq(referred_user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists an affiliate's referrals, newest first.
pub async fn list_referrals<C>(
    db: &C,
    affiliate_program_id: i64,
) -> Result<Vec<affiliate_referral::Model>>
where
    C: ConnectionTrait,
{
    AffiliateReferral::find()
        .filter(affiliate_referral::Column::AffiliateProgramId.eq(affiliate_program_id))
        .order_by_desc(affiliate_referral::Column::CreatedAt)
        .order_by_desc(affiliate_referral::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Inserts a PENDING referral and credits the affiliate with one more referral.
async fn create_referral<C>(
    db: &C,
    program: &affiliate_program::Model,
    referred_user_id: &str,
) -> Result<affiliate_referral::Model>
where
    C: ConnectionTrait,
{
    let referral = affiliate_referral::ActiveModel {
        affiliate_program_id: Set(program.id),
        referred_user_id: Set(referred_user_id.to_string()),
        status: Set(ReferralStatus::Pending.as_str().to_string()),
        converted_at: Set(None),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    affiliate::increment_total_referrals(db, program.id).await?;

    info!(
        "User {} referred by affiliate {}",
        referred_user_id, program.affiliate_code
    );
    Ok(referral)
}

/// Signs up a new user, attaching them to the affiliate owning `referral_code` if given.
///
/// The code must resolve to an active program. Returns the new user and, when a code
/// was supplied, the PENDING referral that was created for it.
pub async fn register_referred_user(
    db: &DatabaseConnection,
    user_id: &str,
    name: &str,
    email: Option<String>,
    referral_code: Option<&str>,
) -> Result<(
    crate::entities::user::Model,
    Option<affiliate_referral::Model>,
)> {
    let txn = db.begin().await?;

    let program = match referral_code {
        Some(code) => Some(resolve_referral_code(&txn, code).await?),
        None => None,
    };

    if program.as_ref().is_some_and(|p| p.user_id == user_id) {
        return Err(Error::SelfReferral);
    }

    let new_user = user::create_user(
        &txn,
        user_id.to_string(),
        name.to_string(),
        email,
        program.as_ref().map(|p| p.affiliate_code.clone()),
    )
    .await?;

    let referral = match program {
        Some(program) => Some(create_referral(&txn, &program, &new_user.id).await?),
        None => None,
    };

    txn.commit().await?;
    Ok((new_user, referral))
}

/// Attaches an existing user to the affiliate owning `code`.
///
/// Unlike signup, the program's active flag is not checked. A user belongs to at most
/// one affiliate: if `referred_by_code` already names another code the call fails with
/// `AlreadyReferred` and writes nothing. The call is idempotent: an existing referral
/// row is returned unchanged without bumping the counter.
pub async fn track_referral(
    db: &DatabaseConnection,
    code: &str,
    referred_user_id: &str,
) -> Result<affiliate_referral::Model> {
    let txn = db.begin().await?;

    let program = find_program_by_code(&txn, code)
        .await?
        .ok_or_else(|| Error::InvalidReferralCode {
            code: code.to_string(),
        })?;

    if program.user_id == referred_user_id {
        return Err(Error::SelfReferral);
    }

    let referred = user::require_user(&txn, referred_user_id).await?;

    if let Some(existing) = get_referral(&txn, program.id, referred_user_id).await? {
        debug!(
            "Referral of {} by {} already tracked",
            referred_user_id, program.affiliate_code
        );
        return Ok(existing);
    }

    match referred.referred_by_code.as_deref() {
        Some(owner) if owner != program.affiliate_code => {
            return Err(Error::AlreadyReferred {
                user_id: referred_user_id.to_string(),
                code: owner.to_string(),
            });
        }
        Some(_) => {}
        None => {
            let mut active: crate::entities::user::ActiveModel = referred.into();
            active.referred_by_code = Set(Some(program.affiliate_code.clone()));
            active.update(&txn).await?;
        }
    }

    let referral = create_referral(&txn, &program, referred_user_id).await?;
    txn.commit().await?;
    Ok(referral)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_resolve_referral_code_exact_match() -> Result<()> {
        let (db, program) = setup_with_affiliate().await?;

        let resolved = resolve_referral_code(&db, &program.affiliate_code).await?;
        assert_eq!(resolved.id, program.id);

        let lower = program.affiliate_code.to_lowercase();
        assert!(matches!(
            resolve_referral_code(&db, &lower).await,
            Err(Error::InvalidReferralCode { .. })
        ));
        assert!(matches!(
            resolve_referral_code(&db, "XEN-NOPE-0000").await,
            Err(Error::InvalidReferralCode { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_referral_code_inactive_program() -> Result<()> {
        let (db, program) = setup_with_affiliate().await?;
        affiliate::set_program_active(&db, program.id, false).await?;

        assert!(matches!(
            resolve_referral_code(&db, &program.affiliate_code).await,
            Err(Error::InvalidReferralCode { .. })
        ));
        // The retroactive lookup still sees it
        assert!(
            find_program_by_code(&db, &program.affiliate_code)
                .await?
                .is_some()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_register_referred_user_creates_pending_referral() -> Result<()> {
        let (db, program) = setup_with_affiliate().await?;

        let (new_user, referral) =
            register_referred_user(&db, "new-1", "Newbie", None, Some(&program.affiliate_code))
                .await?;
        let referral = referral.unwrap();

        assert_eq!(
            new_user.referred_by_code.as_deref(),
            Some(program.affiliate_code.as_str())
        );
        assert_eq!(referral.status, "PENDING");
        assert_eq!(referral.referred_user_id, "new-1");

        let program = affiliate::get_program_by_id(&db, program.id).await?;
        assert_eq!(program.total_referrals, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_register_referred_user_rejects_bad_code() -> Result<()> {
        let (db, program) = setup_with_affiliate().await?;
        affiliate::set_program_active(&db, program.id, false).await?;

        let result =
            register_referred_user(&db, "new-1", "Newbie", None, Some(&program.affiliate_code))
                .await;
        assert!(matches!(result, Err(Error::InvalidReferralCode { .. })));

        // Nothing was written
        assert!(user::get_user(&db, "new-1").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_register_referred_user_without_code() -> Result<()> {
        let db = setup_test_db().await?;
        let (new_user, referral) = register_referred_user(&db, "solo", "Solo", None, None).await?;
        assert!(new_user.referred_by_code.is_none());
        assert!(referral.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_register_crosses_tier_boundary() -> Result<()> {
        let (db, program) = setup_with_affiliate().await?;
        set_total_referrals(&db, program.id, 10).await?;

        register_referred_user(&db, "eleventh", "Eleven", None, Some(&program.affiliate_code))
            .await?;

        let program = affiliate::get_program_by_id(&db, program.id).await?;
        assert_eq!(program.total_referrals, 11);
        assert_eq!(program.tier, "SILVER");
        Ok(())
    }

    #[tokio::test]
    async fn test_track_referral_is_idempotent_and_ignores_active_flag() -> Result<()> {
        let (db, program) = setup_with_affiliate().await?;
        create_test_user(&db, "existing", "Existing").await?;
        affiliate::set_program_active(&db, program.id, false).await?;

        let first = track_referral(&db, &program.affiliate_code, "existing").await?;
        let second = track_referral(&db, &program.affiliate_code, "existing").await?;
        assert_eq!(first, second);

        let program = affiliate::get_program_by_id(&db, program.id).await?;
        assert_eq!(program.total_referrals, 1);

        let user = user::get_user(&db, "existing").await?.unwrap();
        assert_eq!(
            user.referred_by_code.as_deref(),
            Some(program.affiliate_code.as_str())
        );
        assert_eq!(list_referrals(&db, program.id).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_track_referral_rejects_self_and_unknown_code() -> Result<()> {
        let (db, program) = setup_with_affiliate().await?;

        assert!(matches!(
            track_referral(&db, &program.affiliate_code, &program.user_id).await,
            Err(Error::SelfReferral)
        ));
        assert!(matches!(
            track_referral(&db, "XEN-NONE-0000", &program.user_id).await,
            Err(Error::InvalidReferralCode { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_track_referral_keeps_first_owner() -> Result<()> {
        let (db, first_owner) = setup_with_affiliate().await?;
        create_test_user(&db, "affiliate-2", "Bob").await?;
        let second_owner = affiliate::register_affiliate(&db, "affiliate-2", None, None).await?;
        create_referred_user(&db, "carol", &first_owner.affiliate_code).await?;

        let result = track_referral(&db, &second_owner.affiliate_code, "carol").await;
        assert!(matches!(result, Err(Error::AlreadyReferred { .. })));

        assert!(get_referral(&db, second_owner.id, "carol").await?.is_none());
        let second_owner = affiliate::get_program_by_id(&db, second_owner.id).await?;
        assert_eq!(second_owner.total_referrals, 0);
        let carol = user::get_user(&db, "carol").await?.unwrap();
        assert_eq!(
            carol.referred_by_code.as_deref(),
            Some(first_owner.affiliate_code.as_str())
        );

        // The owner's own code is still accepted
        let own = track_referral(&db, &first_owner.affiliate_code, "carol").await?;
        assert_eq!(own.affiliate_program_id, first_owner.id);
        Ok(())
    }

    #[test]
    fn test_referral_status_parse() {
        assert_eq!(
            "CONVERTED".parse::<ReferralStatus>().unwrap(),
            ReferralStatus::Converted
        );
        assert!("DONE".parse::<ReferralStatus>().is_err());
    }
}
