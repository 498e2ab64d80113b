//! General Discord commands - ping, help, and other utility commands.
//! These commands don't touch the database.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**XEN Affiliates Help**\n\
        Here is a summary of all available commands.\n\n\
        **Affiliate Commands**\n\
        • `/join_affiliate` - Enrolls you in the affiliate program and gives you a referral code.\n\
        • `/affiliate_stats` - Shows your tier, referrals, earnings and challenge progress.\n\
        • `/set_payout_method <method> [details]` - Sets how you want to be paid.\n\
        • `/challenge` - Shows this month's referral challenge progress.\n\
        • `/claim_challenge` - Claims this month's challenge reward once you qualify.\n\n\
        **Admin Commands**\n\
        • `/pending_commissions` - Lists commissions waiting for verification.\n\
        • `/approve_commission <id>` / `/reject_commission <id> [reason]` - Verifies a commission.\n\
        • `/create_payout <code> <amount> <method> [notes]` - Creates a manual payout.\n\
        • `/payout_status <id> <status> [transaction_id]` - Completes or fails a payout.\n\
        • `/set_affiliate_active <code> <active>` - Enables or disables a referral code.\n\
        • `/earnings_drift` - Lists affiliates whose earnings do not add up.\n\n\
        **Platform Events** (admin)\n\
        • `/record_signup <user_id> <name> [code] [email]` - Registers a signup and its referral.\n\
        • `/track_referral <code> <user_id>` - Attaches an existing user to an affiliate.\n\
        • `/record_purchase <user_id> <amount> <kind> <entity_id> [evidence]` - Creates the commission for a purchase.\n\
        • `/record_copy_trading <user_id>` - Counts a copy-trading start toward the monthly challenge.\n\n\
        **Utility Commands**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
