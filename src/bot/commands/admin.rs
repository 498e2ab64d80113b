//! Admin Discord commands - commission verification, payouts and program status.
//!
//! Every command here starts with [`ensure_admin`](crate::bot::ensure_admin).

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, ensure_admin, handlers::autocomplete},
        core::{
            affiliate, commission,
            payout::{self, PayoutStatus},
            referral, report,
        },
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Most commissions listed in one reply
    const MAX_LISTED: usize = 20;

    /// Lists commissions waiting for verification.
    #[poise::command(slash_command, prefix_command)]
    pub async fn pending_commissions(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ensure_admin(ctx)?;
        let pending = commission::list_pending_commissions(&ctx.data().database).await?;

        if pending.is_empty() {
            ctx.say("📭 No commissions are waiting for verification.")
                .await?;
            return Ok(());
        }

        let mut message = format!("**{} pending commission(s)**\n", pending.len());
        for c in pending.iter().take(MAX_LISTED) {
            let _ = writeln!(
                message,
                "• #{} {} ${:.2} (on ${:.2}) - program {} / user {} / {} {}",
                c.id,
                c.commission_type,
                c.amount,
                c.base_amount,
                c.affiliate_program_id,
                c.referred_user_id,
                c.related_entity_type,
                c.related_entity_id
            );
        }
        if pending.len() > MAX_LISTED {
            let _ = writeln!(message, "…and {} more", pending.len() - MAX_LISTED);
        }

        ctx.say(message).await?;
        Ok(())
    }

    /// Approves a pending commission and credits the affiliate.
    #[poise::command(slash_command, prefix_command)]
    pub async fn approve_commission(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Commission id"] id: i64,
    ) -> Result<()> {
        ensure_admin(ctx)?;
        let approved = commission::approve_commission(&ctx.data().database, id).await?;
        ctx.say(format!(
            "✅ Commission #{} approved: ${:.2} credited to program {}",
            approved.id, approved.amount, approved.affiliate_program_id
        ))
        .await?;
        Ok(())
    }

    /// Rejects a pending commission.
    #[poise::command(slash_command, prefix_command)]
    pub async fn reject_commission(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Commission id"] id: i64,
        #[description = "Reason shown to the affiliate"] reason: Option<String>,
    ) -> Result<()> {
        ensure_admin(ctx)?;
        let rejected = commission::reject_commission(&ctx.data().database, id, reason).await?;
        ctx.say(format!("🚫 Commission #{} rejected", rejected.id))
            .await?;
        Ok(())
    }

    /// Creates a manual payout for an affiliate.
    #[poise::command(slash_command, prefix_command)]
    pub async fn create_payout(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Affiliate code"] code: String,
        #[description = "Amount in USD"] amount: f64,
        #[description = "Payout method"] method: String,
        #[description = "Internal notes"] notes: Option<String>,
    ) -> Result<()> {
        ensure_admin(ctx)?;
        let db = &ctx.data().database;

        let program = referral::find_program_by_code(db, &code)
            .await?
            .ok_or(Error::AffiliateNotFound { id: code })?;
        let created = payout::create_payout(db, program.id, amount, method, notes).await?;

        ctx.say(format!(
            "💸 Payout #{} of ${:.2} created for `{}` (PENDING)",
            created.id, created.amount, program.affiliate_code
        ))
        .await?;
        Ok(())
    }

    /// Completes or fails a pending payout.
    #[poise::command(slash_command, prefix_command)]
    pub async fn payout_status(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Payout id"] id: i64,
        #[description = "New status"]
        #[autocomplete = "autocomplete::autocomplete_payout_status"]
        status: String,
        #[description = "Provider transaction id"] transaction_id: Option<String>,
    ) -> Result<()> {
        ensure_admin(ctx)?;
        let status: PayoutStatus = status.parse()?;

        let result =
            payout::transition_payout(&ctx.data().database, id, status, transaction_id, None)
                .await?;

        ctx.say(format!(
            "✅ Payout #{} is now {}. Affiliate pending: ${:.2}, paid: ${:.2}",
            result.payout.id,
            result.payout.status,
            result.program.pending_earnings,
            result.program.paid_earnings
        ))
        .await?;
        Ok(())
    }

    /// Enables or disables an affiliate's referral code.
    #[poise::command(slash_command, prefix_command)]
    pub async fn set_affiliate_active(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Affiliate code"] code: String,
        #[description = "Whether the code accepts new signups"] active: bool,
    ) -> Result<()> {
        ensure_admin(ctx)?;
        let db = &ctx.data().database;

        let program = referral::find_program_by_code(db, &code)
            .await?
            .ok_or(Error::AffiliateNotFound { id: code })?;
        let program = affiliate::set_program_active(db, program.id, active).await?;

        ctx.say(format!(
            "✅ `{}` is now {}",
            program.affiliate_code,
            if program.is_active { "active" } else { "inactive" }
        ))
        .await?;
        Ok(())
    }

    /// Lists affiliates whose total earnings differ from pending plus paid.
    #[poise::command(slash_command, prefix_command)]
    pub async fn earnings_drift(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ensure_admin(ctx)?;
        let drifting = report::find_earnings_drift(&ctx.data().database).await?;

        if drifting.is_empty() {
            ctx.say("✅ All affiliate earnings add up.").await?;
            return Ok(());
        }

        let mut message = format!("⚠️ **{} affiliate(s) with drift**\n", drifting.len());
        for (program, drift) in drifting.iter().take(MAX_LISTED) {
            let _ = writeln!(
                message,
                "• `{}`: total ${:.2}, pending ${:.2}, paid ${:.2} (drift {:+.2})",
                program.affiliate_code,
                program.total_earnings,
                program.pending_earnings,
                program.paid_earnings,
                drift
            );
        }

        ctx.say(message).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
