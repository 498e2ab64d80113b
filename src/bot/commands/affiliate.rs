//! Affiliate Discord commands - enrollment, stats, payout settings and the monthly challenge.
//!
//! The caller's Discord id is the affiliate's user id.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, json_details},
        core::{affiliate, challenge, report, user},
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Enrolls the caller in the affiliate program.
    ///
    /// Creates the caller's user record on first use, then registers an affiliate program
    /// and replies with the new referral code.
    #[poise::command(slash_command, prefix_command)]
    pub async fn join_affiliate(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;
        let user_id = ctx.author().id.to_string();

        if user::get_user(db, &user_id).await?.is_none() {
            user::create_user(db, user_id.clone(), ctx.author().name.clone(), None, None)
                .await?;
        }

        let program = affiliate::register_affiliate(db, &user_id, None, None).await?;

        ctx.say(format!(
            "✅ Welcome to the affiliate program! Your referral code is `{}` ({} tier, {}% commission).",
            program.affiliate_code, program.tier, program.commission_rate
        ))
        .await?;
        Ok(())
    }

    /// Shows the caller's tier, referrals, earnings and challenge progress.
    #[poise::command(slash_command, prefix_command)]
    pub async fn affiliate_stats(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        let user_id = ctx.author().id.to_string();
        let month = challenge::current_month_key();

        let summary = report::generate_affiliate_summary(&data.database, &user_id, &month).await?;
        ctx.say(report::format_affiliate_summary(&summary, &data.rules))
            .await?;
        Ok(())
    }

    /// Sets how the caller wants to be paid.
    ///
    /// `details` may be a JSON object; anything else is stored as `{"account": details}`.
    #[poise::command(slash_command, prefix_command)]
    pub async fn set_payout_method(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Payout method, e.g. bank_transfer or usdt"] method: String,
        #[description = "Account details (plain text or JSON)"] details: Option<String>,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let user_id = ctx.author().id.to_string();

        let details = details.map(|raw| json_details(raw, "account"));

        let program = affiliate::update_payout_settings(db, &user_id, method, details).await?;

        ctx.say(format!(
            "✅ Payout method for `{}` set to **{}**",
            program.affiliate_code,
            program.payout_method.as_deref().unwrap_or_default()
        ))
        .await?;
        Ok(())
    }

    /// Shows this month's referral challenge progress.
    #[poise::command(slash_command, prefix_command, rename = "challenge")]
    pub async fn challenge_status(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        let user_id = ctx.author().id.to_string();
        let month = challenge::current_month_key();

        if affiliate::get_program_by_user(&data.database, &user_id)
            .await?
            .is_none()
        {
            return Err(Error::NoAffiliateAccount { user_id });
        }

        let Some(progress) = challenge::get_challenge(&data.database, &user_id, &month).await?
        else {
            ctx.say(format!(
                "🎯 Challenge {month}: 0/{} qualified referrals. Refer users who start copy trading to earn ${:.2}!",
                data.rules.qualifying_referrals, data.rules.reward_amount
            ))
            .await?;
            return Ok(());
        };

        let mut message = format!(
            "🎯 Challenge {}: {}/{} qualified referrals, reward ${:.2}\n",
            progress.month,
            progress.referral_count,
            data.rules.qualifying_referrals,
            progress.reward_amount
        );
        if progress.reward_claimed {
            message.push_str("✅ Reward claimed");
        } else if challenge::is_claimable(&progress, &data.rules) {
            message.push_str("🏆 Ready to claim with `/claim_challenge`!");
        } else {
            let _ = write!(
                message,
                "{} more to go",
                data.rules.qualifying_referrals - progress.referral_count
            );
        }

        ctx.say(message).await?;
        Ok(())
    }

    /// Claims this month's challenge reward.
    #[poise::command(slash_command, prefix_command)]
    pub async fn claim_challenge(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        let user_id = ctx.author().id.to_string();
        let month = challenge::current_month_key();

        let outcome = challenge::claim_reward(&data.database, &user_id, &month, &data.rules).await?;

        ctx.say(format!(
            "🏆 Reward of ${:.2} for {} claimed! Payout #{} is pending. Pending earnings: ${:.2}",
            outcome.payout.amount, month, outcome.payout.id, outcome.program.pending_earnings
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
