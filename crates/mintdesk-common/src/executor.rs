//! Mint executor: read fresh state, gate every requested token type, then
//! write the minted flags back in one conditional update.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::aggregate;
use crate::gate::{self, GateDecision, Rejection};
use crate::models::TokenGroupSummary;
use crate::store::{AllocationStore, MintWrite, StoreError};
use crate::txref::{Clock, SystemClock, TxRefGenerator, UuidTxRefGenerator};

/// How a multi-token-type request behaves when some types cannot be minted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    /// Any rejection aborts the whole request before anything is written.
    #[default]
    Atomic,
    /// Each token type is written on its own; failures are reported per type.
    Partial,
}

impl std::fmt::Display for BatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchMode::Atomic => write!(f, "atomic"),
            BatchMode::Partial => write!(f, "partial"),
        }
    }
}

impl std::str::FromStr for BatchMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "atomic" => Ok(BatchMode::Atomic),
            "partial" => Ok(BatchMode::Partial),
            _ => anyhow::bail!("Invalid batch mode '{}'. Valid values: atomic, partial", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MintRequest {
    pub project_id: String,
    pub token_types: BTreeSet<String>,
    /// Explicit operator confirmation. Never inferred.
    pub confirmed: bool,
}

impl MintRequest {
    pub fn new<I, T>(project_id: impl Into<String>, token_types: I, confirmed: bool) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            project_id: project_id.into(),
            token_types: token_types.into_iter().map(Into::into).collect(),
            confirmed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenMint {
    pub token_type: String,
    pub records_updated: usize,
    pub amount: f64,
    pub tx_ref: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MintResult {
    pub project_id: String,
    pub minted_at: DateTime<Utc>,
    pub mints: Vec<TokenMint>,
}

impl MintResult {
    pub fn records_updated(&self) -> usize {
        self.mints.iter().map(|m| m.records_updated).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MintFailure {
    NotEligible,
    AlreadyMinted,
    StoreUnavailable { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedMint {
    pub token_type: String,
    pub reason: MintFailure,
}

#[derive(Debug, Error)]
pub enum MintError {
    #[error("Minting requires explicit confirmation")]
    ConfirmationRequired,

    #[error("No token types selected for minting")]
    EmptySelection,

    #[error("Token type '{token_type}' has no confirmed allocations to mint")]
    NotEligible { token_type: String },

    #[error("Token type '{token_type}' has already been minted")]
    AlreadyMinted { token_type: String },

    #[error(transparent)]
    StoreUnavailable(StoreError),

    #[error("{}", partial_message(.minted, .failed))]
    PartialBatchFailure {
        minted_at: DateTime<Utc>,
        minted: Vec<TokenMint>,
        failed: Vec<FailedMint>,
    },
}

impl MintError {
    /// Stable identifier for API bodies and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            MintError::ConfirmationRequired => "confirmation_required",
            MintError::EmptySelection => "empty_selection",
            MintError::NotEligible { .. } => "not_eligible",
            MintError::AlreadyMinted { .. } => "already_minted",
            MintError::StoreUnavailable(_) => "store_unavailable",
            MintError::PartialBatchFailure { .. } => "partial_batch_failure",
        }
    }

    /// Only store failures are worth trying again; eligibility rejections
    /// will keep failing until the underlying data changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MintError::StoreUnavailable(_))
    }

    fn rejected(token_type: &str, rejection: Rejection) -> Self {
        let token_type = token_type.to_string();
        match rejection {
            Rejection::ConfirmationRequired => MintError::ConfirmationRequired,
            Rejection::NotEligible => MintError::NotEligible { token_type },
            Rejection::AlreadyMinted => MintError::AlreadyMinted { token_type },
        }
    }
}

fn partial_message(minted: &[TokenMint], failed: &[FailedMint]) -> String {
    format!(
        "{} of {} token types failed to mint",
        failed.len(),
        failed.len() + minted.len()
    )
}

impl From<StoreError> for MintError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { token_type } => MintError::AlreadyMinted { token_type },
            other => MintError::StoreUnavailable(other),
        }
    }
}

impl From<&StoreError> for MintFailure {
    fn from(err: &StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } => MintFailure::AlreadyMinted,
            StoreError::Unavailable(e) => MintFailure::StoreUnavailable {
                message: e.to_string(),
            },
        }
    }
}

impl From<Rejection> for MintFailure {
    fn from(r: Rejection) -> Self {
        match r {
            Rejection::AlreadyMinted => MintFailure::AlreadyMinted,
            Rejection::NotEligible | Rejection::ConfirmationRequired => MintFailure::NotEligible,
        }
    }
}

#[derive(Debug)]
pub struct MintExecutor<G = UuidTxRefGenerator, C = SystemClock> {
    refs: G,
    clock: C,
    mode: BatchMode,
}

impl MintExecutor {
    pub fn new(mode: BatchMode) -> Self {
        Self::with_parts(UuidTxRefGenerator::default(), SystemClock, mode)
    }
}

impl<G: TxRefGenerator, C: Clock> MintExecutor<G, C> {
    pub fn with_parts(refs: G, clock: C, mode: BatchMode) -> Self {
        Self { refs, clock, mode }
    }

    pub fn mode(&self) -> BatchMode {
        self.mode
    }

    pub fn mint<S>(&self, store: &S, request: &MintRequest) -> Result<MintResult, MintError>
    where
        S: AllocationStore + ?Sized,
    {
        if !request.confirmed {
            return Err(MintError::ConfirmationRequired);
        }
        if request.token_types.is_empty() {
            return Err(MintError::EmptySelection);
        }

        let records = store.list_allocations(&request.project_id)?;
        let summaries = aggregate(&records);

        let mut accepted: Vec<&TokenGroupSummary> = Vec::new();
        let mut rejected: Vec<(&str, Rejection)> = Vec::new();
        for token_type in &request.token_types {
            let summary = summaries.iter().find(|s| &s.token_type == token_type);
            match (gate::check(summary, request.confirmed), summary) {
                (GateDecision::Mintable, Some(s)) => accepted.push(s),
                (GateDecision::Mintable, None) => {
                    rejected.push((token_type.as_str(), Rejection::NotEligible))
                }
                (GateDecision::Rejected(r), _) => rejected.push((token_type.as_str(), r)),
            }
        }

        for (token_type, rejection) in &rejected {
            tracing::warn!(
                project_id = %request.project_id,
                token_type = %token_type,
                reason = %rejection,
                "Mint rejected by gate"
            );
        }

        let atomic = self.mode == BatchMode::Atomic || request.token_types.len() == 1;
        if atomic {
            if let Some((token_type, rejection)) = rejected.first() {
                return Err(MintError::rejected(token_type, *rejection));
            }
        }

        // References are only drawn once the batch is going to be written.
        let minted_at = self.clock.now();
        let writes: Vec<MintWrite> = accepted
            .iter()
            .map(|s| self.build_write(&request.project_id, s, minted_at))
            .collect();

        if atomic {
            let counts = store.apply_mint(&writes)?;
            let mints = writes
                .into_iter()
                .zip(counts)
                .map(|(w, n)| self.completed(&request.project_id, w, n))
                .collect();
            return Ok(MintResult {
                project_id: request.project_id.clone(),
                minted_at,
                mints,
            });
        }

        let mut failed: Vec<FailedMint> = rejected
            .into_iter()
            .map(|(token_type, r)| FailedMint {
                token_type: token_type.to_string(),
                reason: r.into(),
            })
            .collect();
        let mut minted = Vec::new();
        for write in writes {
            match store.apply_mint(std::slice::from_ref(&write)) {
                Ok(counts) => {
                    let n = counts.first().copied().unwrap_or(0);
                    minted.push(self.completed(&request.project_id, write, n));
                }
                Err(e) => {
                    tracing::warn!(
                        project_id = %request.project_id,
                        token_type = %write.token_type,
                        error = %e,
                        "Mint write failed"
                    );
                    failed.push(FailedMint {
                        token_type: write.token_type,
                        reason: MintFailure::from(&e),
                    });
                }
            }
        }

        if failed.is_empty() {
            Ok(MintResult {
                project_id: request.project_id.clone(),
                minted_at,
                mints: minted,
            })
        } else {
            failed.sort_by(|a, b| a.token_type.cmp(&b.token_type));
            Err(MintError::PartialBatchFailure {
                minted_at,
                minted,
                failed,
            })
        }
    }

    fn build_write(
        &self,
        project_id: &str,
        summary: &TokenGroupSummary,
        minted_at: DateTime<Utc>,
    ) -> MintWrite {
        let records: Vec<_> = summary.mintable_records().collect();
        MintWrite {
            project_id: project_id.to_string(),
            token_type: summary.token_type.clone(),
            allocation_ids: records.iter().map(|a| a.id.clone()).collect(),
            amount: records.iter().map(|a| a.token_amount).sum(),
            minted_at,
            tx_ref: self.refs.next_ref(project_id, &summary.token_type),
        }
    }

    fn completed(&self, project_id: &str, write: MintWrite, records_updated: usize) -> TokenMint {
        tracing::info!(
            project_id = %project_id,
            token_type = %write.token_type,
            records = records_updated,
            tx_ref = %write.tx_ref,
            "Minted token group"
        );
        TokenMint {
            token_type: write.token_type,
            records_updated,
            amount: write.amount,
            tx_ref: write.tx_ref,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AllocationRecord, GroupStatus};
    use crate::txref::{FixedClock, SequentialTxRefGenerator};
    use chrono::TimeZone;
    use std::sync::Mutex;

    /// Vec-backed store with the same conditional-write rule as SQLite.
    struct MemoryStore {
        rows: Mutex<Vec<AllocationRecord>>,
        fail_writes_for: Option<String>,
    }

    impl MemoryStore {
        fn new(rows: Vec<AllocationRecord>) -> Self {
            Self {
                rows: Mutex::new(rows),
                fail_writes_for: None,
            }
        }

        fn snapshot(&self) -> Vec<AllocationRecord> {
            self.rows.lock().unwrap().clone()
        }
    }

    impl AllocationStore for MemoryStore {
        fn list_allocations(&self, project_id: &str) -> Result<Vec<AllocationRecord>, StoreError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.project_id == project_id)
                .cloned()
                .collect())
        }

        fn apply_mint(&self, writes: &[MintWrite]) -> Result<Vec<usize>, StoreError> {
            let mut rows = self.rows.lock().unwrap();
            let mut staged = rows.clone();
            let mut counts = Vec::new();
            for w in writes {
                if self.fail_writes_for.as_deref() == Some(w.token_type.as_str()) {
                    return Err(StoreError::Unavailable(anyhow::anyhow!("connection reset")));
                }
                let mut n = 0;
                for r in staged.iter_mut() {
                    if w.allocation_ids.contains(&r.id) && !r.minted {
                        r.minted = true;
                        r.minting_date = Some(w.minted_at);
                        r.minting_tx_ref = Some(w.tx_ref.clone());
                        n += 1;
                    }
                }
                if n != w.allocation_ids.len() {
                    return Err(StoreError::Conflict {
                        token_type: w.token_type.clone(),
                    });
                }
                counts.push(n);
            }
            *rows = staged;
            Ok(counts)
        }
    }

    struct DownStore;

    impl AllocationStore for DownStore {
        fn list_allocations(&self, _: &str) -> Result<Vec<AllocationRecord>, StoreError> {
            Err(StoreError::Unavailable(anyhow::anyhow!("timeout")))
        }

        fn apply_mint(&self, _: &[MintWrite]) -> Result<Vec<usize>, StoreError> {
            Err(StoreError::Unavailable(anyhow::anyhow!("timeout")))
        }
    }

    fn alloc(id: &str, token_type: &str, amount: f64, confirmed: bool) -> AllocationRecord {
        AllocationRecord {
            id: id.to_string(),
            investor_id: "inv-1".into(),
            subscription_id: format!("sub-{}", id),
            project_id: "proj-1".into(),
            token_type: Some(token_type.to_string()),
            token_amount: amount,
            confirmed,
            allocated: true,
            minted: false,
            minting_date: None,
            minting_tx_ref: None,
            distributed: false,
            distribution_date: None,
            distribution_tx_ref: None,
        }
    }

    fn executor(mode: BatchMode) -> MintExecutor<SequentialTxRefGenerator, FixedClock> {
        let at = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        MintExecutor::with_parts(SequentialTxRefGenerator::new("mint-test"), FixedClock(at), mode)
    }

    fn equity_store() -> MemoryStore {
        MemoryStore::new(vec![
            alloc("a", "Equity", 100.0, true),
            alloc("b", "Equity", 200.0, true),
        ])
    }

    #[test]
    fn mint_flags_every_confirmed_record_with_shared_ref() {
        let store = equity_store();
        let result = executor(BatchMode::Atomic)
            .mint(&store, &MintRequest::new("proj-1", ["Equity"], true))
            .unwrap();

        assert_eq!(result.mints.len(), 1);
        assert_eq!(result.mints[0].records_updated, 2);
        assert_eq!(result.mints[0].amount, 300.0);
        assert_eq!(result.mints[0].tx_ref, "mint-test-0001");

        let rows = store.snapshot();
        assert!(rows.iter().all(|r| r.minted));
        assert!(rows.iter().all(|r| r.minting_tx_ref.as_deref() == Some("mint-test-0001")));
        assert!(rows.iter().all(|r| r.minting_date == Some(result.minted_at)));

        let groups = aggregate(&rows);
        assert_eq!(groups[0].minted_amount, 300.0);
        assert_eq!(groups[0].status, GroupStatus::Minted);
        assert!(!groups[0].ready_to_mint);
    }

    #[test]
    fn second_mint_is_rejected_and_changes_nothing() {
        let store = equity_store();
        let exec = executor(BatchMode::Atomic);
        let request = MintRequest::new("proj-1", ["Equity"], true);
        exec.mint(&store, &request).unwrap();
        let before = store.snapshot();

        let err = exec.mint(&store, &request).unwrap_err();
        assert!(matches!(err, MintError::AlreadyMinted { ref token_type } if token_type == "Equity"));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn unconfirmed_group_is_not_eligible() {
        let store = MemoryStore::new(vec![alloc("d", "Debt", 50.0, false)]);
        let err = executor(BatchMode::Atomic)
            .mint(&store, &MintRequest::new("proj-1", ["Debt"], true))
            .unwrap_err();
        assert!(matches!(err, MintError::NotEligible { .. }));
        assert_eq!(err.kind(), "not_eligible");
        assert!(!store.snapshot()[0].minted);
    }

    #[test]
    fn missing_confirmation_is_refused_before_reading() {
        let err = executor(BatchMode::Atomic)
            .mint(&DownStore, &MintRequest::new("proj-1", ["Equity"], false))
            .unwrap_err();
        assert!(matches!(err, MintError::ConfirmationRequired));
    }

    #[test]
    fn empty_selection_is_refused() {
        let err = executor(BatchMode::Atomic)
            .mint(&equity_store(), &MintRequest::new("proj-1", Vec::<String>::new(), true))
            .unwrap_err();
        assert!(matches!(err, MintError::EmptySelection));
    }

    #[test]
    fn unconfirmed_records_in_a_ready_group_stay_unminted() {
        let store = MemoryStore::new(vec![
            alloc("a", "Equity", 100.0, true),
            alloc("b", "Equity", 40.0, false),
        ]);
        let result = executor(BatchMode::Atomic)
            .mint(&store, &MintRequest::new("proj-1", ["Equity"], true))
            .unwrap();

        assert_eq!(result.records_updated(), 1);
        let rows = store.snapshot();
        let b = rows.iter().find(|r| r.id == "b").unwrap();
        assert!(!b.minted);
        assert!(b.minting_tx_ref.is_none());
    }

    #[test]
    fn atomic_batch_with_one_bad_type_writes_nothing() {
        let store = MemoryStore::new(vec![
            alloc("a", "Equity", 100.0, true),
            alloc("d", "Debt", 50.0, false),
        ]);
        let err = executor(BatchMode::Atomic)
            .mint(&store, &MintRequest::new("proj-1", ["Equity", "Debt"], true))
            .unwrap_err();

        assert!(matches!(err, MintError::NotEligible { ref token_type } if token_type == "Debt"));
        assert!(store.snapshot().iter().all(|r| !r.minted));
    }

    #[test]
    fn rejected_batch_draws_no_refs() {
        let store = MemoryStore::new(vec![
            alloc("a", "Equity", 100.0, true),
            alloc("d", "Debt", 50.0, false),
        ]);
        let exec = executor(BatchMode::Atomic);
        exec.mint(&store, &MintRequest::new("proj-1", ["Equity", "Debt"], true))
            .unwrap_err();

        let result = exec
            .mint(&store, &MintRequest::new("proj-1", ["Equity"], true))
            .unwrap();
        assert_eq!(result.mints[0].tx_ref, "mint-test-0001");
    }

    #[test]
    fn atomic_batch_uses_one_ref_per_token_type() {
        let store = MemoryStore::new(vec![
            alloc("a", "Equity", 100.0, true),
            alloc("b", "Equity", 10.0, true),
            alloc("c", "Warrant", 5.0, true),
        ]);
        let result = executor(BatchMode::Atomic)
            .mint(&store, &MintRequest::new("proj-1", ["Equity", "Warrant"], true))
            .unwrap();

        let refs: Vec<&str> = result.mints.iter().map(|m| m.tx_ref.as_str()).collect();
        assert_eq!(refs, vec!["mint-test-0001", "mint-test-0002"]);
        assert_eq!(result.records_updated(), 3);
    }

    #[test]
    fn mint_leaves_other_groups_untouched() {
        let store = MemoryStore::new(vec![
            alloc("a", "Equity", 100.0, true),
            alloc("c", "Warrant", 5.0, true),
        ]);
        executor(BatchMode::Atomic)
            .mint(&store, &MintRequest::new("proj-1", ["Equity"], true))
            .unwrap();

        let groups = aggregate(&store.snapshot());
        let warrant = groups.iter().find(|g| g.token_type == "Warrant").unwrap();
        assert_eq!(warrant.minted_count, 0);
        assert!(warrant.ready_to_mint);
    }

    #[test]
    fn partial_batch_reports_successes_and_failures() {
        let store = MemoryStore::new(vec![
            alloc("a", "Equity", 100.0, true),
            alloc("d", "Debt", 50.0, false),
        ]);
        let err = executor(BatchMode::Partial)
            .mint(&store, &MintRequest::new("proj-1", ["Equity", "Debt"], true))
            .unwrap_err();

        match err {
            MintError::PartialBatchFailure { minted, failed, .. } => {
                assert_eq!(minted.len(), 1);
                assert_eq!(minted[0].token_type, "Equity");
                assert_eq!(
                    failed,
                    vec![FailedMint {
                        token_type: "Debt".into(),
                        reason: MintFailure::NotEligible,
                    }]
                );
            }
            other => panic!("Expected PartialBatchFailure, got {:?}", other),
        }
        let rows = store.snapshot();
        assert!(rows.iter().find(|r| r.id == "a").unwrap().minted);
        assert!(!rows.iter().find(|r| r.id == "d").unwrap().minted);
    }

    #[test]
    fn partial_batch_records_store_failures_per_type() {
        let mut store = MemoryStore::new(vec![
            alloc("a", "Equity", 100.0, true),
            alloc("c", "Warrant", 5.0, true),
        ]);
        store.fail_writes_for = Some("Warrant".into());
        let err = executor(BatchMode::Partial)
            .mint(&store, &MintRequest::new("proj-1", ["Equity", "Warrant"], true))
            .unwrap_err();

        let MintError::PartialBatchFailure { minted, failed, .. } = err else {
            panic!("Expected PartialBatchFailure");
        };
        assert_eq!(minted.len(), 1);
        assert!(matches!(failed[0].reason, MintFailure::StoreUnavailable { .. }));
    }

    #[test]
    fn store_outage_is_retryable_and_distinct_from_rejections() {
        let err = executor(BatchMode::Atomic)
            .mint(&DownStore, &MintRequest::new("proj-1", ["Equity"], true))
            .unwrap_err();
        assert!(matches!(err, MintError::StoreUnavailable(_)));
        assert!(err.is_retryable());
        assert!(!MintError::AlreadyMinted { token_type: "x".into() }.is_retryable());
    }

    #[test]
    fn store_conflict_surfaces_as_already_minted() {
        let err: MintError = StoreError::Conflict {
            token_type: "Equity".into(),
        }
        .into();
        assert!(matches!(err, MintError::AlreadyMinted { .. }));
    }

    #[test]
    fn batch_mode_parses_case_insensitively() {
        assert_eq!("Atomic".parse::<BatchMode>().unwrap(), BatchMode::Atomic);
        assert_eq!("partial".parse::<BatchMode>().unwrap(), BatchMode::Partial);
        assert!("eventual".parse::<BatchMode>().is_err());
    }
}
