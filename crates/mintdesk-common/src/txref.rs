//! Injected sources of mint references and timestamps.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

/// Produces the synthetic reference recorded with a mint. Called once per
/// token type per invocation.
pub trait TxRefGenerator: Send + Sync {
    fn next_ref(&self, project_id: &str, token_type: &str) -> String;
}

/// `<prefix>-<uuid>` references. The prefix keeps them visibly distinct from
/// hex transaction hashes.
#[derive(Debug, Clone)]
pub struct UuidTxRefGenerator {
    prefix: String,
}

impl UuidTxRefGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for UuidTxRefGenerator {
    fn default() -> Self {
        Self::new("mint")
    }
}

impl TxRefGenerator for UuidTxRefGenerator {
    fn next_ref(&self, _project_id: &str, _token_type: &str) -> String {
        format!("{}-{}", self.prefix, uuid::Uuid::new_v4().simple())
    }
}

/// Deterministic references (`<prefix>-0001`, `<prefix>-0002`, ...).
#[derive(Debug)]
pub struct SequentialTxRefGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialTxRefGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl TxRefGenerator for SequentialTxRefGenerator {
    fn next_ref(&self, _project_id: &str, _token_type: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{:04}", self.prefix, n)
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_refs_are_prefixed_and_unique() {
        let g = UuidTxRefGenerator::default();
        let a = g.next_ref("p", "Equity");
        let b = g.next_ref("p", "Equity");
        assert!(a.starts_with("mint-"));
        assert!(!a.starts_with("0x"));
        assert_ne!(a, b);
    }

    #[test]
    fn sequential_refs_count_up() {
        let g = SequentialTxRefGenerator::new("test");
        assert_eq!(g.next_ref("p", "A"), "test-0001");
        assert_eq!(g.next_ref("p", "B"), "test-0002");
    }
}
