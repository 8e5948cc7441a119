//! Eligibility gate in front of the mint executor.
//!
//! The gate never errors. It hands back a [`GateDecision`] so callers can
//! branch on the reason without unwinding.

use serde::{Deserialize, Serialize};

use crate::models::TokenGroupSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// The operator did not explicitly confirm the mint.
    ConfirmationRequired,
    /// No confirmed allocations to mint.
    NotEligible,
    /// The group has already been minted; minted groups are terminal.
    AlreadyMinted,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfirmationRequired => "confirmation_required",
            Self::NotEligible => "not_eligible",
            Self::AlreadyMinted => "already_minted",
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Mintable,
    Rejected(Rejection),
}

impl GateDecision {
    pub fn is_mintable(&self) -> bool {
        matches!(self, GateDecision::Mintable)
    }
}

/// Decide whether `summary` may be minted. `None` means the token type has no
/// allocations in the project at all, which is treated like a group with no
/// confirmed records.
pub fn check(summary: Option<&TokenGroupSummary>, confirmed: bool) -> GateDecision {
    if !confirmed {
        return GateDecision::Rejected(Rejection::ConfirmationRequired);
    }
    eligibility(summary)
}

/// Eligibility alone, without the operator confirmation flag.
pub fn eligibility(summary: Option<&TokenGroupSummary>) -> GateDecision {
    match summary {
        Some(s) if s.is_minted() => GateDecision::Rejected(Rejection::AlreadyMinted),
        Some(s) if s.ready_to_mint => GateDecision::Mintable,
        _ => GateDecision::Rejected(Rejection::NotEligible),
    }
}

/// Groups an operator could select for minting right now.
pub fn mintable(summaries: &[TokenGroupSummary]) -> impl Iterator<Item = &TokenGroupSummary> {
    summaries
        .iter()
        .filter(|s| eligibility(Some(s)).is_mintable())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::models::AllocationRecord;

    fn alloc(token_type: &str, confirmed: bool, minted: bool) -> AllocationRecord {
        AllocationRecord {
            id: format!("{}-{}-{}", token_type, confirmed, minted),
            investor_id: "inv".into(),
            subscription_id: "sub".into(),
            project_id: "proj".into(),
            token_type: Some(token_type.to_string()),
            token_amount: 25.0,
            confirmed,
            allocated: true,
            minted,
            minting_date: None,
            minting_tx_ref: None,
            distributed: false,
            distribution_date: None,
            distribution_tx_ref: None,
        }
    }

    #[test]
    fn ready_group_with_confirmation_is_mintable() {
        let groups = aggregate(&[alloc("Equity", true, false)]);
        assert_eq!(check(groups.first(), true), GateDecision::Mintable);
    }

    #[test]
    fn missing_confirmation_wins_over_eligibility() {
        let groups = aggregate(&[alloc("Equity", true, false)]);
        assert_eq!(
            check(groups.first(), false),
            GateDecision::Rejected(Rejection::ConfirmationRequired)
        );
    }

    #[test]
    fn minted_group_is_rejected_as_already_minted() {
        let groups = aggregate(&[alloc("Equity", true, true), alloc("Equity", true, false)]);
        assert_eq!(
            check(groups.first(), true),
            GateDecision::Rejected(Rejection::AlreadyMinted)
        );
    }

    #[test]
    fn unconfirmed_group_is_not_eligible() {
        let groups = aggregate(&[alloc("Debt", false, false)]);
        assert_eq!(
            check(groups.first(), true),
            GateDecision::Rejected(Rejection::NotEligible)
        );
    }

    #[test]
    fn unknown_token_type_is_not_eligible() {
        assert_eq!(check(None, true), GateDecision::Rejected(Rejection::NotEligible));
    }

    #[test]
    fn mintable_filters_to_ready_groups() {
        let groups = aggregate(&[
            alloc("Equity", true, false),
            alloc("Debt", false, false),
            alloc("Warrant", true, true),
        ]);
        let names: Vec<&str> = mintable(&groups).map(|g| g.token_type.as_str()).collect();
        assert_eq!(names, vec!["Equity"]);
    }
}
