//! Platform event commands - feed signups, purchases and copy-trading starts into the engine.
//!
//! The rest of the platform reports its events through these admin-only commands; each
//! one is a thin call into `core`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, ensure_admin, handlers::autocomplete, json_details},
        core::{
            challenge,
            commission::{self, RelatedEntity},
            referral,
        },
        errors::{Error, Result},
    };

    /// Records a new platform signup, optionally with the referral code that was used.
    #[poise::command(slash_command, prefix_command)]
    pub async fn record_signup(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Platform user id"] user_id: String,
        #[description = "Display name"] name: String,
        #[description = "Referral code used at signup"] code: Option<String>,
        #[description = "Email address"] email: Option<String>,
    ) -> Result<()> {
        ensure_admin(ctx)?;

        let (new_user, referral) = referral::register_referred_user(
            &ctx.data().database,
            &user_id,
            &name,
            email,
            code.as_deref(),
        )
        .await?;

        let message = match (referral, code) {
            (Some(referral), Some(code)) => format!(
                "✅ User `{}` signed up with `{}` (referral #{})",
                new_user.id, code, referral.id
            ),
            _ => format!("✅ User `{}` signed up without a referral code", new_user.id),
        };
        ctx.say(message).await?;
        Ok(())
    }

    /// Attaches an existing user to an affiliate after signup.
    #[poise::command(slash_command, prefix_command)]
    pub async fn track_referral(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Affiliate code"] code: String,
        #[description = "Platform user id"] user_id: String,
    ) -> Result<()> {
        ensure_admin(ctx)?;

        let tracked = referral::track_referral(&ctx.data().database, &code, &user_id).await?;

        ctx.say(format!(
            "🔗 `{}` is tracked as a referral of `{}` ({})",
            tracked.referred_user_id, code, tracked.status
        ))
        .await?;
        Ok(())
    }

    /// Records a purchase by a user and creates the commission owed to their affiliate.
    #[poise::command(slash_command, prefix_command)]
    pub async fn record_purchase(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Platform user id of the buyer"] user_id: String,
        #[description = "Amount paid in USD"] amount: f64,
        #[description = "What was bought"]
        #[autocomplete = "autocomplete::autocomplete_related_entity_kind"]
        kind: String,
        #[description = "Id of the registration, subscription or account"] entity_id: String,
        #[description = "Evidence for manual review (plain text or JSON)"] evidence: Option<String>,
    ) -> Result<()> {
        ensure_admin(ctx)?;

        let related = RelatedEntity::from_parts(&kind.trim().to_ascii_uppercase(), &entity_id)?;
        let evidence = evidence.map(|raw| json_details(raw, "note"));

        let recorded = commission::record_commission_for_user(
            &ctx.data().database,
            &user_id,
            amount,
            related,
            evidence,
        )
        .await?;

        let message = match recorded {
            Some(c) => format!(
                "💰 Commission #{} of ${:.2} ({}) for program {} is {}",
                c.id, c.amount, c.commission_type, c.affiliate_program_id, c.status
            ),
            None => format!(
                "ℹ️ `{user_id}` was not referred by an active affiliate, no commission created"
            ),
        };
        ctx.say(message).await?;
        Ok(())
    }

    /// Records that a referred user started copy trading, counting toward the monthly challenge.
    #[poise::command(slash_command, prefix_command)]
    pub async fn record_copy_trading(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Platform user id of the subscriber"] user_id: String,
    ) -> Result<()> {
        ensure_admin(ctx)?;
        let data = ctx.data();

        let progress = challenge::record_qualifying_subscription(
            &data.database,
            &user_id,
            chrono::Utc::now(),
            &data.rules,
        )
        .await?;

        let message = match progress {
            Some(c) => format!(
                "🎯 Challenge {} for `{}`: {}/{} qualified referrals",
                c.month, c.user_id, c.referral_count, data.rules.qualifying_referrals
            ),
            None => format!("ℹ️ `{user_id}` was not referred, no challenge progress recorded"),
        };
        ctx.say(message).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
