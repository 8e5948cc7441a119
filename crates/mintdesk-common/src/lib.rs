//! Shared domain types and the token-minting lifecycle for mintdesk.
//!
//! Data flows one way through this crate:
//!
//! ```text
//! AllocationStore::list_allocations ─> aggregate() ─> gate::check()
//!                                                        │
//!            AllocationStore::apply_mint <─ MintExecutor ┘
//! ```
//!
//! Nothing here performs I/O directly; storage is reached only through the
//! [`store::AllocationStore`] trait so the executor can run against SQLite
//! in production and an in-memory table in tests.

pub mod aggregate;
pub mod executor;
pub mod gate;
pub mod models;
pub mod store;
pub mod txref;

pub use aggregate::{aggregate, filter_by_token_type};
pub use executor::{BatchMode, MintError, MintExecutor, MintRequest, MintResult};
pub use models::{AllocationRecord, GroupStatus, TokenGroupSummary, UNASSIGNED_TOKEN_TYPE};
pub use store::{AllocationStore, MintWrite, StoreError};
