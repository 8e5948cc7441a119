//! Groups a project's allocations by token type and derives the per-group
//! totals shown on the minting screen.
//!
//! Everything here is a pure function over records that were already
//! fetched; nothing in this module can fail.

use std::collections::BTreeMap;

use crate::models::{AllocationRecord, GroupStatus, TokenGroupSummary};

/// Build one summary per distinct token type.
///
/// Grouping is exact and case-sensitive. Output is ordered by token type, so
/// the same record set always yields the same list regardless of input order.
pub fn aggregate(records: &[AllocationRecord]) -> Vec<TokenGroupSummary> {
    let mut groups: BTreeMap<&str, Vec<&AllocationRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.group_key()).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(token_type, allocations)| summarize(token_type, &allocations))
        .collect()
}

fn summarize(token_type: &str, allocations: &[&AllocationRecord]) -> TokenGroupSummary {
    let mut summary = TokenGroupSummary {
        token_type: token_type.to_string(),
        total_amount: 0.0,
        confirmed_amount: 0.0,
        minted_amount: 0.0,
        distributed_amount: 0.0,
        total_count: allocations.len(),
        confirmed_count: 0,
        minted_count: 0,
        distributed_count: 0,
        status: GroupStatus::Pending,
        ready_to_mint: false,
        allocations: allocations.iter().map(|a| (*a).clone()).collect(),
    };

    for a in allocations {
        summary.total_amount += a.token_amount;
        if a.is_confirmed() {
            summary.confirmed_amount += a.token_amount;
            summary.confirmed_count += 1;
        }
        if a.minted {
            summary.minted_amount += a.token_amount;
            summary.minted_count += 1;
        }
        if a.distributed {
            summary.distributed_amount += a.token_amount;
            summary.distributed_count += 1;
        }
    }

    summary.status = if summary.minted_count > 0 {
        GroupStatus::Minted
    } else if summary.confirmed_count > 0 {
        GroupStatus::ReadyToMint
    } else {
        GroupStatus::Pending
    };
    summary.ready_to_mint = summary.confirmed_count > 0 && summary.minted_count == 0;
    summary
}

/// Case-insensitive substring search over token types. An empty query keeps
/// every summary.
pub fn filter_by_token_type(summaries: Vec<TokenGroupSummary>, query: &str) -> Vec<TokenGroupSummary> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return summaries;
    }
    summaries
        .into_iter()
        .filter(|s| s.token_type.to_lowercase().contains(&needle))
        .collect()
}
