//! Admin configuration module for loading back-office user ids from the environment.
//!
//! Admin-only commands (commission verification, payouts) check the caller's Discord
//! id against `AFFILIATE_ADMIN_IDS`, a comma-separated list.

use std::collections::HashSet;

const ADMIN_IDS_VAR: &str = "AFFILIATE_ADMIN_IDS";

/// Parses a comma-separated list of ids, ignoring blanks and surrounding whitespace.
#[must_use]
pub fn parse_admin_ids(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Reads the admin id set from `AFFILIATE_ADMIN_IDS`. Empty if the variable is unset.
#[must_use]
pub fn get_admin_ids() -> HashSet<String> {
    std::env::var(ADMIN_IDS_VAR)
        .map(|raw| parse_admin_ids(&raw))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_ids() {
        let ids = parse_admin_ids(" 123, 456 ,,789 ");
        assert_eq!(ids.len(), 3);
        assert!(ids.contains("123"));
        assert!(ids.contains("456"));
        assert!(ids.contains("789"));
    }

    #[test]
    fn test_parse_admin_ids_empty() {
        assert!(parse_admin_ids("").is_empty());
        assert!(parse_admin_ids(" , ").is_empty());
    }
}
