//! Tier engine - maps an affiliate's referral count to a tier and commission rate.
//!
//! `tier_for` is pure; `apply_tier` persists the result on an affiliate program and is
//! called after every change to `total_referrals`.

use crate::{
    entities::{AffiliateProgram, affiliate_program},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Referral-count bracket determining an affiliate's commission rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    /// 0 to 10 referrals
    Bronze,
    /// 11 to 25 referrals
    Silver,
    /// 26 to 50 referrals
    Gold,
    /// 51 referrals and up
    Platinum,
}

impl Tier {
    /// Stored representation of the tier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bronze => "BRONZE",
            Self::Silver => "SILVER",
            Self::Gold => "GOLD",
            Self::Platinum => "PLATINUM",
        }
    }

    /// Commission rate in percent paid at this tier.
    #[must_use]
    pub const fn commission_rate(self) -> f64 {
        match self {
            Self::Bronze => 10.0,
            Self::Silver => 12.0,
            Self::Gold => 15.0,
            Self::Platinum => 20.0,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "BRONZE" => Ok(Self::Bronze),
            "SILVER" => Ok(Self::Silver),
            "GOLD" => Ok(Self::Gold),
            "PLATINUM" => Ok(Self::Platinum),
            other => Err(Error::InvalidStatus {
                kind: "tier",
                value: other.to_string(),
            }),
        }
    }
}

/// Returns the tier and commission rate (percent) for a cumulative referral count.
///
/// Boundaries are inclusive: 10 is still BRONZE, 11 is SILVER, 26 GOLD, 51 PLATINUM.
#[must_use]
pub const fn tier_for(total_referrals: i32) -> (Tier, f64) {
    let tier = match total_referrals {
        i32::MIN..=10 => Tier::Bronze,
        11..=25 => Tier::Silver,
        26..=50 => Tier::Gold,
        _ => Tier::Platinum,
    };
    (tier, tier.commission_rate())
}

/// Recomputes an affiliate program's tier from its referral count and stores it.
///
/// Nothing is written when the stored tier and rate already match.
pub async fn apply_tier<C>(db: &C, affiliate_program_id: i64) -> Result<affiliate_program::Model>
where
    C: ConnectionTrait,
{
    let program = AffiliateProgram::find_by_id(affiliate_program_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::AffiliateNotFound {
            id: affiliate_program_id.to_string(),
        })?;

    let (tier, rate) = tier_for(program.total_referrals);
    let unchanged =
        program.tier == tier.as_str() && (program.commission_rate - rate).abs() < f64::EPSILON;
    if unchanged {
        return Ok(program);
    }

    info!(
        "Affiliate {} moves from {} to {} ({}%)",
        program.affiliate_code, program.tier, tier, rate
    );

    let mut active: affiliate_program::ActiveModel = program.into();
    active.tier = Set(tier.as_str().to_string());
    active.commission_rate = Set(rate);
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(tier_for(0), (Tier::Bronze, 10.0));
        assert_eq!(tier_for(10), (Tier::Bronze, 10.0));
        assert_eq!(tier_for(11), (Tier::Silver, 12.0));
        assert_eq!(tier_for(25), (Tier::Silver, 12.0));
        assert_eq!(tier_for(26), (Tier::Gold, 15.0));
        assert_eq!(tier_for(50), (Tier::Gold, 15.0));
        assert_eq!(tier_for(51), (Tier::Platinum, 20.0));
        assert_eq!(tier_for(10_000), (Tier::Platinum, 20.0));
    }

    #[test]
    fn test_tier_round_trips_through_storage_name() {
        for tier in [Tier::Bronze, Tier::Silver, Tier::Gold, Tier::Platinum] {
            assert_eq!(tier.as_str().parse::<Tier>().unwrap(), tier);
        }
        assert!("bronze".parse::<Tier>().is_err());
    }

    #[test]
    fn test_unknown_tier_message() {
        let err = "DIAMOND".parse::<Tier>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown tier: 'DIAMOND'");
    }

    #[tokio::test]
    async fn test_apply_tier_upgrades_program() -> Result<()> {
        let (db, program) = setup_with_affiliate().await?;
        set_total_referrals(&db, program.id, 26).await?;

        let updated = apply_tier(&db, program.id).await?;
        assert_eq!(updated.tier, "GOLD");
        assert_eq!(updated.commission_rate, 15.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_tier_unchanged_skips_write() -> Result<()> {
        let (db, program) = setup_with_affiliate().await?;

        let same = apply_tier(&db, program.id).await?;
        assert_eq!(same, program);
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_tier_missing_program() -> Result<()> {
        let db = setup_test_db().await?;
        let result = apply_tier(&db, 42).await;
        assert!(matches!(result, Err(Error::AffiliateNotFound { .. })));
        Ok(())
    }
}
