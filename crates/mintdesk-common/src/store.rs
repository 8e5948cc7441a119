use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::AllocationRecord;

/// Update applied to one token group: flag the listed allocations as minted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MintWrite {
    pub project_id: String,
    pub token_type: String,
    pub allocation_ids: Vec<String>,
    pub amount: f64,
    pub minted_at: DateTime<Utc>,
    pub tx_ref: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// Read or write could not be completed (I/O, lock, permission).
    #[error("Allocation store unavailable: {0}")]
    Unavailable(#[source] anyhow::Error),

    /// A conditional write found records that were minted concurrently.
    #[error("Allocations for token type '{token_type}' changed before the mint was written")]
    Conflict { token_type: String },
}

/// Persistent table of allocation records.
///
/// `apply_mint` must be all-or-nothing over the writes it receives: every
/// write updates exactly its listed ids, and only those still unminted, or
/// nothing is written and `Conflict` is returned.
pub trait AllocationStore {
    fn list_allocations(&self, project_id: &str) -> Result<Vec<AllocationRecord>, StoreError>;

    /// Returns the number of rows updated per write, in input order.
    fn apply_mint(&self, writes: &[MintWrite]) -> Result<Vec<usize>, StoreError>;
}
