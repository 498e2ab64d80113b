//! Report generation business logic.
//!
//! This module builds the affiliate dashboard summary and the earnings-drift report.
//! All functions return structured data or plain strings that the bot layer sends as-is.

use crate::{
    config::program::ChallengeRules,
    core::{
        affiliate, challenge,
        commission::{self, CommissionStatus},
        referral::{self, ReferralStatus},
        tier::{self, Tier},
    },
    entities::{AffiliateProgram, affiliate_program, monthly_challenge},
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use std::fmt::Write;

/// Drift below half a cent is rounding noise
const DRIFT_TOLERANCE: f64 = 0.005;

/// Dashboard data for one affiliate.
#[derive(Debug, Clone)]
pub struct AffiliateSummary {
    /// The affiliate's program row
    pub program: affiliate_program::Model,
    /// Parsed tier of the program
    pub tier: Tier,
    /// Referrals still waiting for a first approved commission
    pub pending_referrals: usize,
    /// Referrals that produced an approved commission
    pub converted_referrals: usize,
    /// Commissions waiting for verification
    pub pending_commissions: usize,
    /// Commissions credited so far
    pub approved_commissions: usize,
    /// Next tier and how many more referrals reach it, if not at the top
    pub next_tier: Option<(Tier, i32)>,
    /// Challenge record for the reported month, if one exists
    pub challenge: Option<monthly_challenge::Model>,
}

/// Returns the next tier above `total_referrals` and the referrals still needed for it.
#[must_use]
pub fn referrals_to_next_tier(total_referrals: i32) -> Option<(Tier, i32)> {
    let (current, _) = tier::tier_for(total_referrals);
    let threshold = match current {
        Tier::Bronze => 11,
        Tier::Silver => 26,
        Tier::Gold => 51,
        Tier::Platinum => return None,
    };
    let (next, _) = tier::tier_for(threshold);
    Some((next, threshold - total_referrals.max(0)))
}

/// `total - (pending + paid)`, rounded to cents. Zero for a consistent program.
#[must_use]
pub fn earnings_drift(program: &affiliate_program::Model) -> f64 {
    commission::round_cents(
        program.total_earnings - (program.pending_earnings + program.paid_earnings),
    )
}

/// Builds the dashboard summary for the affiliate owned by `user_id`.
pub async fn generate_affiliate_summary(
    db: &DatabaseConnection,
    user_id: &str,
    month: &str,
) -> Result<AffiliateSummary> {
    let program = affiliate::get_program_by_user(db, user_id)
        .await?
        .ok_or_else(|| Error::NoAffiliateAccount {
            user_id: user_id.to_string(),
        })?;
    let tier = affiliate::program_tier(&program)?;

    let referrals = referral::list_referrals(db, program.id).await?;
    let converted_referrals = referrals
        .iter()
        .filter(|r| r.status == ReferralStatus::Converted.as_str())
        .count();

    let commissions = commission::list_commissions_for_program(db, program.id).await?;
    let count_status = |status: CommissionStatus| {
        commissions
            .iter()
            .filter(|c| c.status == status.as_str())
            .count()
    };

    let challenge = challenge::get_challenge(db, user_id, month).await?;

    Ok(AffiliateSummary {
        tier,
        pending_referrals: referrals.len() - converted_referrals,
        converted_referrals,
        pending_commissions: count_status(CommissionStatus::Pending),
        approved_commissions: count_status(CommissionStatus::Approved),
        next_tier: referrals_to_next_tier(program.total_referrals),
        challenge,
        program,
    })
}

/// Lists every program whose earnings do not add up, with its drift.
pub async fn find_earnings_drift(
    db: &DatabaseConnection,
) -> Result<Vec<(affiliate_program::Model, f64)>> {
    let programs = AffiliateProgram::find()
        .order_by_asc(affiliate_program::Column::Id)
        .all(db)
        .await?;

    Ok(programs
        .into_iter()
        .filter_map(|program| {
            let drift = earnings_drift(&program);
            (drift.abs() >= DRIFT_TOLERANCE).then_some((program, drift))
        })
        .collect())
}

/// Formats a summary into the text shown by `/affiliate_stats`.
#[must_use]
pub fn format_affiliate_summary(summary: &AffiliateSummary, rules: &ChallengeRules) -> String {
    let program = &summary.program;
    let mut out = format!(
        "**Affiliate {}** ({} tier, {}% commission){}\n",
        program.affiliate_code,
        summary.tier,
        program.commission_rate,
        if program.is_active { "" } else { " - inactive" }
    );

    // write! is infallible when writing to String, so ignoring the result is safe
    let _ = writeln!(
        out,
        "Referrals: {} ({} converted, {} pending)",
        program.total_referrals, summary.converted_referrals, summary.pending_referrals
    );
    if let Some((next, needed)) = summary.next_tier {
        let _ = writeln!(out, "Next tier: {next} in {needed} more referrals");
    }
    let _ = writeln!(
        out,
        "Earnings: ${:.2} total | ${:.2} pending | ${:.2} paid",
        program.total_earnings, program.pending_earnings, program.paid_earnings
    );
    let _ = writeln!(
        out,
        "Commissions: {} approved, {} awaiting verification",
        summary.approved_commissions, summary.pending_commissions
    );

    match &summary.challenge {
        Some(c) if c.reward_claimed => {
            let _ = writeln!(
                out,
                "Monthly challenge {}: reward of ${:.2} claimed",
                c.month, c.reward_amount
            );
        }
        Some(c) => {
            let _ = writeln!(
                out,
                "Monthly challenge {}: {}/{} qualified referrals{}",
                c.month,
                c.referral_count,
                rules.qualifying_referrals,
                if challenge::is_claimable(c, rules) {
                    " - ready to claim!"
                } else {
                    ""
                }
            );
        }
        None => {
            let _ = writeln!(
                out,
                "Monthly challenge: 0/{} qualified referrals",
                rules.qualifying_referrals
            );
        }
    }

    out
}
