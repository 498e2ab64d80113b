//! Program rule loading from config.toml
//!
//! The monthly challenge reward and its qualifying threshold are read from the
//! `[challenge]` table of `config.toml`. A missing file or table yields the
//! platform defaults (a 1000 reward for 3 qualified referrals).

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Default reward paid for a completed monthly challenge
pub const DEFAULT_REWARD_AMOUNT: f64 = 1000.0;
/// Default number of qualified referrals needed in a month
pub const DEFAULT_QUALIFYING_REFERRALS: i32 = 3;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ProgramConfig {
    /// Monthly challenge rules
    #[serde(default)]
    pub challenge: ChallengeRules,
}

/// Rules for the monthly referral challenge
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChallengeRules {
    /// Reward credited when the challenge is claimed
    #[serde(default = "default_reward_amount")]
    pub reward_amount: f64,
    /// Qualified referrals needed before the reward can be claimed
    #[serde(default = "default_qualifying_referrals")]
    pub qualifying_referrals: i32,
}

const fn default_reward_amount() -> f64 {
    DEFAULT_REWARD_AMOUNT
}

const fn default_qualifying_referrals() -> i32 {
    DEFAULT_QUALIFYING_REFERRALS
}

impl Default for ChallengeRules {
    fn default() -> Self {
        Self {
            reward_amount: DEFAULT_REWARD_AMOUNT,
            qualifying_referrals: DEFAULT_QUALIFYING_REFERRALS,
        }
    }
}

/// Parses program rules from TOML text and validates them.
///
/// # Errors
/// Returns an error if the TOML is malformed, the reward is not a positive finite
/// amount, or the threshold is below one.
pub fn parse_config(contents: &str) -> Result<ProgramConfig> {
    let config: ProgramConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    let rules = &config.challenge;
    if !rules.reward_amount.is_finite() || rules.reward_amount <= 0.0 {
        return Err(Error::InvalidAmount {
            amount: rules.reward_amount,
        });
    }
    if rules.qualifying_referrals < 1 {
        return Err(Error::Config {
            message: format!(
                "challenge.qualifying_referrals must be at least 1, got {}",
                rules.qualifying_referrals
            ),
        });
    }

    Ok(config)
}

/// Loads program rules from a TOML file, falling back to defaults when the file is absent.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ProgramConfig> {
    let path = path.as_ref();
    if !path.exists() {
        info!("No config file at {:?}, using default program rules", path);
        return Ok(ProgramConfig::default());
    }

    debug!("Loading program rules from {:?}", path);
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;
    parse_config(&contents)
}

/// Loads program rules from the default location (./config.toml)
pub fn load_default_config() -> Result<ProgramConfig> {
    load_config("config.toml")
}
