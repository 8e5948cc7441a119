use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Group key used for allocations whose token type is missing or empty.
pub const UNASSIGNED_TOKEN_TYPE: &str = "Unassigned";

/// One row of the `token_allocations` table, joined with the confirmation
/// flags of its subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub id: String,
    pub investor_id: String,
    pub subscription_id: String,
    pub project_id: String,
    pub token_type: Option<String>,
    pub token_amount: f64,
    pub confirmed: bool,
    pub allocated: bool,
    pub minted: bool,
    pub minting_date: Option<DateTime<Utc>>,
    pub minting_tx_ref: Option<String>,
    pub distributed: bool,
    pub distribution_date: Option<DateTime<Utc>>,
    pub distribution_tx_ref: Option<String>,
}

impl AllocationRecord {
    /// The token group this record belongs to.
    pub fn group_key(&self) -> &str {
        match self.token_type.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => UNASSIGNED_TOKEN_TYPE,
        }
    }

    /// A record counts as confirmed only when its subscription is both
    /// confirmed and allocated.
    pub fn is_confirmed(&self) -> bool {
        self.confirmed && self.allocated
    }

    /// Confirmed and not yet minted.
    pub fn is_mintable(&self) -> bool {
        self.is_confirmed() && !self.minted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    Pending,
    ReadyToMint,
    Minted,
}

impl GroupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::ReadyToMint => "ready_to_mint",
            Self::Minted => "minted",
        }
    }
}

impl std::fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "ready_to_mint" => Ok(Self::ReadyToMint),
            "minted" => Ok(Self::Minted),
            _ => Err(format!("Invalid group status: {}", s)),
        }
    }
}

/// Per-token-type view derived from a project's allocations. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenGroupSummary {
    pub token_type: String,
    pub total_amount: f64,
    pub confirmed_amount: f64,
    pub minted_amount: f64,
    pub distributed_amount: f64,
    pub total_count: usize,
    pub confirmed_count: usize,
    pub minted_count: usize,
    pub distributed_count: usize,
    pub status: GroupStatus,
    pub ready_to_mint: bool,
    pub allocations: Vec<AllocationRecord>,
}

impl TokenGroupSummary {
    pub fn is_minted(&self) -> bool {
        self.minted_count > 0
    }

    /// Records a mint of this group would touch.
    pub fn mintable_records(&self) -> impl Iterator<Item = &AllocationRecord> {
        self.allocations.iter().filter(|a| a.is_mintable())
    }

    /// Share of the total amount that is confirmed, as a whole percentage.
    pub fn confirmation_progress(&self) -> u8 {
        if self.total_amount <= 0.0 {
            return 0;
        }
        let pct = (self.confirmed_amount / self.total_amount * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(token_type: Option<&str>) -> AllocationRecord {
        AllocationRecord {
            id: "a1".into(),
            investor_id: "inv".into(),
            subscription_id: "sub".into(),
            project_id: "proj".into(),
            token_type: token_type.map(String::from),
            token_amount: 10.0,
            confirmed: true,
            allocated: true,
            minted: false,
            minting_date: None,
            minting_tx_ref: None,
            distributed: false,
            distribution_date: None,
            distribution_tx_ref: None,
        }
    }

    #[test]
    fn missing_or_empty_token_type_maps_to_unassigned() {
        assert_eq!(record(None).group_key(), UNASSIGNED_TOKEN_TYPE);
        assert_eq!(record(Some("")).group_key(), UNASSIGNED_TOKEN_TYPE);
        assert_eq!(record(Some("Equity")).group_key(), "Equity");
    }

    #[test]
    fn confirmation_needs_both_flags() {
        let mut r = record(Some("Equity"));
        r.allocated = false;
        assert!(!r.is_confirmed());
        assert!(!r.is_mintable());

        r.allocated = true;
        r.minted = true;
        assert!(r.is_confirmed());
        assert!(!r.is_mintable());
    }

    #[test]
    fn group_status_round_trips_through_str() {
        for status in [GroupStatus::Pending, GroupStatus::ReadyToMint, GroupStatus::Minted] {
            assert_eq!(GroupStatus::from_str(status.as_str()), Ok(status));
        }
        assert!(GroupStatus::from_str("burned").is_err());
    }

    #[test]
    fn group_status_serializes_snake_case() {
        let json = serde_json::to_string(&GroupStatus::ReadyToMint).unwrap();
        assert_eq!(json, "\"ready_to_mint\"");
    }
}
