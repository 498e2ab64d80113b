//! Autocomplete handlers for Discord slash command parameters.

use crate::{
    bot::BotData,
    core::{commission::RelatedEntity, payout::PayoutStatus},
    errors::Error,
};

/// Statuses an admin can move a payout to; PENDING is only ever a starting state.
#[must_use]
pub fn matching_payout_statuses(partial: &str) -> Vec<String> {
    let partial_upper = partial.trim().to_ascii_uppercase();
    PayoutStatus::ALL
        .into_iter()
        .filter(|status| *status != PayoutStatus::Pending)
        .map(PayoutStatus::as_str)
        .filter(|name| name.starts_with(&partial_upper))
        .map(ToString::to_string)
        .collect()
}

/// Provides autocomplete suggestions for payout target statuses.
pub async fn autocomplete_payout_status(
    _ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    matching_payout_statuses(partial)
}

/// Related-entity kinds that contain the typed text anywhere.
#[must_use]
pub fn matching_related_entity_kinds(partial: &str) -> Vec<String> {
    let partial_upper = partial.trim().to_ascii_uppercase();
    RelatedEntity::KINDS
        .into_iter()
        .filter(|kind| kind.contains(&partial_upper))
        .map(ToString::to_string)
        .collect()
}

/// Provides autocomplete suggestions for the kind of a purchase event.
pub async fn autocomplete_related_entity_kind(
    _ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    matching_related_entity_kinds(partial)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_payout_statuses() {
        assert_eq!(matching_payout_statuses(""), vec!["COMPLETED", "FAILED"]);
        assert_eq!(matching_payout_statuses("co"), vec!["COMPLETED"]);
        assert_eq!(matching_payout_statuses("f"), vec!["FAILED"]);
        assert!(matching_payout_statuses("pen").is_empty());
    }

    #[test]
    fn test_matching_related_entity_kinds() {
        assert_eq!(matching_related_entity_kinds("").len(), 4);
        assert_eq!(
            matching_related_entity_kinds("copy"),
            vec!["COPY_TRADING_SUBSCRIPTION"]
        );
        assert_eq!(
            matching_related_entity_kinds("subscription"),
            vec!["COPY_TRADING_SUBSCRIPTION", "SUBSCRIPTION"]
        );
        assert!(matching_related_entity_kinds("course").is_empty());
    }
}
