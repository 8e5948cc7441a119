use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use mintdesk_common::{AllocationRecord, AllocationStore, MintWrite, StoreError};
use rusqlite::{Connection, ToSql, params};

use super::models::*;
use crate::errors::BackofficeError;

/// Async-safe handle to the back-office database.
///
/// Wraps `BackofficeDb` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`, so synchronous SQLite I/O never
/// ties up async worker threads.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<BackofficeDb>>,
}

impl DbHandle {
    pub fn new(db: BackofficeDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&BackofficeDb) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db.lock().map_err(|_| BackofficeError::LockPoisoned)?;
            f(&guard)
        })
        .await
        .context("DB task panicked")?
    }

    /// Acquire the database mutex synchronously. Only for startup, CLI
    /// commands and tests; never from a hot async path.
    pub fn lock_sync(&self) -> Result<std::sync::MutexGuard<'_, BackofficeDb>> {
        self.inner
            .lock()
            .map_err(|_| BackofficeError::LockPoisoned.into())
    }
}

pub struct BackofficeDb {
    conn: Connection,
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn parse_timestamp(value: Option<String>, column: &str) -> Result<Option<DateTime<Utc>>> {
    value
        .map(|v| {
            DateTime::parse_from_rfc3339(&v)
                .map(|dt| dt.with_timezone(&Utc))
                .with_context(|| format!("Failed to parse {} '{}'", column, v))
        })
        .transpose()
}

/// Ids bound per conditional mint update, kept well under SQLite's
/// bound-variable limit.
const MINT_UPDATE_CHUNK: usize = 1000;

const ALLOCATION_COLUMNS: &str = "a.id, a.investor_id, a.subscription_id, a.project_id, a.token_type, a.token_amount,
     s.confirmed, s.allocated, a.minted, a.minting_date, a.minting_tx_ref,
     a.distributed, a.distribution_date, a.distribution_tx_ref,
     i.name, i.email, i.wallet_address
     FROM token_allocations a
     JOIN subscriptions s ON s.id = a.subscription_id
     JOIN investors i ON i.id = a.investor_id";

impl BackofficeDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        self.run_migrations().context("Failed to run migrations")?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS projects (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    description TEXT,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS investors (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    email TEXT NOT NULL,
                    wallet_address TEXT,
                    kyc_status TEXT NOT NULL DEFAULT 'pending',
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS subscriptions (
                    id TEXT PRIMARY KEY,
                    project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                    investor_id TEXT NOT NULL REFERENCES investors(id),
                    fiat_amount REAL NOT NULL,
                    currency TEXT NOT NULL DEFAULT 'USD',
                    confirmed INTEGER NOT NULL DEFAULT 0,
                    allocated INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS token_allocations (
                    id TEXT PRIMARY KEY,
                    project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                    investor_id TEXT NOT NULL REFERENCES investors(id),
                    subscription_id TEXT NOT NULL REFERENCES subscriptions(id),
                    token_type TEXT,
                    token_amount REAL NOT NULL CHECK (token_amount >= 0),
                    minted INTEGER NOT NULL DEFAULT 0,
                    minting_date TEXT,
                    minting_tx_ref TEXT,
                    distributed INTEGER NOT NULL DEFAULT 0,
                    distribution_date TEXT,
                    distribution_tx_ref TEXT,
                    allocation_date TEXT NOT NULL DEFAULT (datetime('now')),
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                    CHECK (minted = 0 OR (minting_date IS NOT NULL AND minting_tx_ref IS NOT NULL))
                );

                CREATE TABLE IF NOT EXISTS audit_logs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    project_id TEXT NOT NULL,
                    action TEXT NOT NULL,
                    details TEXT NOT NULL DEFAULT '{}',
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE INDEX IF NOT EXISTS idx_subscriptions_project ON subscriptions(project_id);
                CREATE INDEX IF NOT EXISTS idx_allocations_project ON token_allocations(project_id);
                CREATE INDEX IF NOT EXISTS idx_allocations_token_type ON token_allocations(project_id, token_type);
                CREATE INDEX IF NOT EXISTS idx_audit_logs_project ON audit_logs(project_id);
                ",
            )
            .context("Failed to create tables")?;

        // Once minted, an allocation stays minted.
        self.conn
            .execute_batch(
                "CREATE TRIGGER IF NOT EXISTS trg_allocations_minted_monotonic
                 BEFORE UPDATE OF minted ON token_allocations
                 WHEN OLD.minted = 1 AND NEW.minted = 0
                 BEGIN
                     SELECT RAISE(ABORT, 'minted flag cannot be cleared');
                 END;",
            )
            .context("Failed to create minted trigger")?;

        Ok(())
    }

    /// Run `f` inside one transaction on this connection. Everything `f`
    /// writes is committed together, or rolled back if it returns an error.
    pub fn in_transaction<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;
        let value = f(self)?;
        tx.commit().context("Failed to commit transaction")?;
        Ok(value)
    }

    // ── Projects ──────────────────────────────────────────────────────

    pub fn create_project(&self, new: &NewProject) -> Result<Project> {
        if new.name.trim().is_empty() {
            return Err(BackofficeError::BadRequest("Project name must not be empty".into()).into());
        }
        let id = new.id.clone().unwrap_or_else(new_id);
        self.conn
            .execute(
                "INSERT INTO projects (id, name, description) VALUES (?1, ?2, ?3)",
                params![id, new.name, new.description],
            )
            .context("Failed to insert project")?;
        self.get_project(&id)?
            .context("Project not found after insert")
    }

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description, created_at, updated_at FROM projects ORDER BY created_at, id")
            .context("Failed to prepare list_projects")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Project {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                })
            })
            .context("Failed to query projects")?;
        let mut projects = Vec::new();
        for row in rows {
            projects.push(row.context("Failed to read project row")?);
        }
        Ok(projects)
    }

    pub fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description, created_at, updated_at FROM projects WHERE id = ?1")
            .context("Failed to prepare get_project")?;
        let mut rows = stmt
            .query_map(params![id], |row| {
                Ok(Project {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                })
            })
            .context("Failed to query project")?;
        match rows.next() {
            Some(row) => Ok(Some(row.context("Failed to read project row")?)),
            None => Ok(None),
        }
    }

    pub fn require_project(&self, id: &str) -> Result<Project> {
        self.get_project(id)?.ok_or_else(|| {
            BackofficeError::ProjectNotFound { id: id.to_string() }.into()
        })
    }

    // ── Investors ─────────────────────────────────────────────────────

    pub fn create_investor(&self, new: &NewInvestor) -> Result<Investor> {
        if new.name.trim().is_empty() || new.email.trim().is_empty() {
            return Err(
                BackofficeError::BadRequest("Investor name and email are required".into()).into(),
            );
        }
        let id = new.id.clone().unwrap_or_else(new_id);
        self.conn
            .execute(
                "INSERT INTO investors (id, name, email, wallet_address) VALUES (?1, ?2, ?3, ?4)",
                params![id, new.name, new.email, new.wallet_address],
            )
            .context("Failed to insert investor")?;
        self.get_investor(&id)?
            .context("Investor not found after insert")
    }

    pub fn list_investors(&self) -> Result<Vec<Investor>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, name, email, wallet_address, kyc_status, created_at
                 FROM investors ORDER BY name, id",
            )
            .context("Failed to prepare list_investors")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Investor {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                    wallet_address: row.get(3)?,
                    kyc_status: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })
            .context("Failed to query investors")?;
        let mut investors = Vec::new();
        for row in rows {
            investors.push(row.context("Failed to read investor row")?);
        }
        Ok(investors)
    }

    pub fn get_investor(&self, id: &str) -> Result<Option<Investor>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, name, email, wallet_address, kyc_status, created_at
                 FROM investors WHERE id = ?1",
            )
            .context("Failed to prepare get_investor")?;
        let mut rows = stmt
            .query_map(params![id], |row| {
                Ok(Investor {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                    wallet_address: row.get(3)?,
                    kyc_status: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })
            .context("Failed to query investor")?;
        match rows.next() {
            Some(row) => Ok(Some(row.context("Failed to read investor row")?)),
            None => Ok(None),
        }
    }

    // ── Subscriptions ─────────────────────────────────────────────────

    pub fn create_subscription(&self, project_id: &str, new: &NewSubscription) -> Result<Subscription> {
        self.require_project(project_id)?;
        if self.get_investor(&new.investor_id)?.is_none() {
            return Err(BackofficeError::InvestorNotFound {
                id: new.investor_id.clone(),
            }
            .into());
        }
        if !new.fiat_amount.is_finite() || new.fiat_amount < 0.0 {
            return Err(BackofficeError::InvalidAmount {
                amount: new.fiat_amount,
            }
            .into());
        }

        let id = new.id.clone().unwrap_or_else(new_id);
        self.conn
            .execute(
                "INSERT INTO subscriptions (id, project_id, investor_id, fiat_amount, currency, confirmed, allocated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id,
                    project_id,
                    new.investor_id,
                    new.fiat_amount,
                    new.currency,
                    new.confirmed,
                    new.allocated
                ],
            )
            .context("Failed to insert subscription")?;
        self.get_subscription(&id)?
            .context("Subscription not found after insert")
    }

    pub fn get_subscription(&self, id: &str) -> Result<Option<Subscription>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, project_id, investor_id, fiat_amount, currency, confirmed, allocated, created_at, updated_at
                 FROM subscriptions WHERE id = ?1",
            )
            .context("Failed to prepare get_subscription")?;
        let mut rows = stmt
            .query_map(params![id], subscription_from_row)
            .context("Failed to query subscription")?;
        match rows.next() {
            Some(row) => Ok(Some(row.context("Failed to read subscription row")?)),
            None => Ok(None),
        }
    }

    pub fn list_subscriptions(&self, project_id: &str) -> Result<Vec<Subscription>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, project_id, investor_id, fiat_amount, currency, confirmed, allocated, created_at, updated_at
                 FROM subscriptions WHERE project_id = ?1 ORDER BY created_at, id",
            )
            .context("Failed to prepare list_subscriptions")?;
        let rows = stmt
            .query_map(params![project_id], subscription_from_row)
            .context("Failed to query subscriptions")?;
        let mut subscriptions = Vec::new();
        for row in rows {
            subscriptions.push(row.context("Failed to read subscription row")?);
        }
        Ok(subscriptions)
    }

    /// Set the operator confirmation flags of a subscription. `None` leaves a
    /// flag unchanged.
    pub fn update_subscription_status(
        &self,
        id: &str,
        confirmed: Option<bool>,
        allocated: Option<bool>,
    ) -> Result<Subscription> {
        if self.get_subscription(id)?.is_none() {
            return Err(BackofficeError::SubscriptionNotFound { id: id.to_string() }.into());
        }

        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;
        if let Some(c) = confirmed {
            tx.execute(
                "UPDATE subscriptions SET confirmed = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![c, id],
            )
            .context("Failed to update subscription confirmed flag")?;
        }
        if let Some(a) = allocated {
            tx.execute(
                "UPDATE subscriptions SET allocated = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![a, id],
            )
            .context("Failed to update subscription allocated flag")?;
        }
        tx.commit().context("Failed to commit subscription update")?;

        self.get_subscription(id)?
            .context("Subscription not found after update")
    }

    // ── Allocations ───────────────────────────────────────────────────

    pub fn create_allocation(&self, project_id: &str, new: &NewAllocation) -> Result<AllocationView> {
        if !new.token_amount.is_finite() || new.token_amount < 0.0 {
            return Err(BackofficeError::InvalidAmount {
                amount: new.token_amount,
            }
            .into());
        }
        let subscription = self.get_subscription(&new.subscription_id)?.ok_or_else(|| {
            BackofficeError::SubscriptionNotFound {
                id: new.subscription_id.clone(),
            }
        })?;
        if subscription.project_id != project_id {
            return Err(BackofficeError::ProjectMismatch {
                subscription_id: subscription.id,
                expected: project_id.to_string(),
                actual: subscription.project_id,
            }
            .into());
        }

        let id = new.id.clone().unwrap_or_else(new_id);
        self.conn
            .execute(
                "INSERT INTO token_allocations (id, project_id, investor_id, subscription_id, token_type, token_amount)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    project_id,
                    subscription.investor_id,
                    subscription.id,
                    new.token_type,
                    new.token_amount
                ],
            )
            .context("Failed to insert token allocation")?;
        self.get_allocation(&id)?
            .context("Allocation not found after insert")
    }

    pub fn get_allocation(&self, id: &str) -> Result<Option<AllocationView>> {
        let sql = format!("SELECT {} WHERE a.id = ?1", ALLOCATION_COLUMNS);
        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("Failed to prepare get_allocation")?;
        let mut rows = stmt
            .query_map(params![id], allocation_row)
            .context("Failed to query allocation")?;
        match rows.next() {
            Some(row) => {
                let r = row.context("Failed to read allocation row")?;
                Ok(Some(r.into_view()?))
            }
            None => Ok(None),
        }
    }

    /// Every allocation of a project, with subscription flags and investor
    /// display fields. An unknown project yields an empty list.
    pub fn list_allocations(&self, project_id: &str) -> Result<Vec<AllocationView>> {
        let sql = format!(
            "SELECT {} WHERE a.project_id = ?1 ORDER BY a.created_at, a.id",
            ALLOCATION_COLUMNS
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("Failed to prepare list_allocations")?;
        let rows = stmt
            .query_map(params![project_id], allocation_row)
            .context("Failed to query allocations")?;
        let mut allocations = Vec::new();
        for row in rows {
            let r = row.context("Failed to read allocation row")?;
            allocations.push(r.into_view()?);
        }
        Ok(allocations)
    }

    // ── Minting ───────────────────────────────────────────────────────

    /// Apply every write in one transaction. Each update only touches rows
    /// that are still unminted; if any write matches fewer rows than it
    /// lists, the whole transaction is rolled back.
    fn apply_mint_writes(&self, writes: &[MintWrite]) -> std::result::Result<Vec<usize>, StoreError> {
        let unavailable = |e: rusqlite::Error| StoreError::Unavailable(e.into());

        let tx = self.conn.unchecked_transaction().map_err(unavailable)?;
        let mut counts = Vec::with_capacity(writes.len());

        for write in writes {
            let minted_at = write.minted_at.to_rfc3339();
            let mut updated = 0;
            for ids in write.allocation_ids.chunks(MINT_UPDATE_CHUNK) {
                let placeholders: Vec<String> =
                    (0..ids.len()).map(|i| format!("?{}", i + 3)).collect();
                let sql = format!(
                    "UPDATE token_allocations
                     SET minted = 1, minting_date = ?1, minting_tx_ref = ?2, updated_at = ?1
                     WHERE minted = 0 AND id IN ({})",
                    placeholders.join(", ")
                );
                let mut values: Vec<&dyn ToSql> = vec![&minted_at, &write.tx_ref];
                for id in ids {
                    values.push(id);
                }
                updated += tx.execute(&sql, values.as_slice()).map_err(unavailable)?;
            }

            if updated != write.allocation_ids.len() {
                tracing::warn!(
                    project_id = %write.project_id,
                    token_type = %write.token_type,
                    expected = write.allocation_ids.len(),
                    updated,
                    "Conditional mint write matched already-minted rows; rolling back"
                );
                return Err(StoreError::Conflict {
                    token_type: write.token_type.clone(),
                });
            }

            let details = serde_json::json!({
                "token_type": write.token_type,
                "tx_ref": write.tx_ref,
                "records": updated,
                "amount": write.amount,
                "minted_at": minted_at,
            });
            tx.execute(
                "INSERT INTO audit_logs (project_id, action, details) VALUES (?1, 'tokens_minted', ?2)",
                params![write.project_id, details.to_string()],
            )
            .map_err(unavailable)?;

            counts.push(updated);
        }

        tx.commit().map_err(unavailable)?;
        Ok(counts)
    }

    // ── Audit log ─────────────────────────────────────────────────────

    /// Audit entries for a project, newest first.
    pub fn list_audit_entries(&self, project_id: &str) -> Result<Vec<AuditEntry>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, project_id, action, details, created_at
                 FROM audit_logs WHERE project_id = ?1 ORDER BY id DESC",
            )
            .context("Failed to prepare list_audit_entries")?;
        let rows = stmt
            .query_map(params![project_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .context("Failed to query audit entries")?;
        let mut entries = Vec::new();
        for row in rows {
            let (id, project_id, action, details, created_at) =
                row.context("Failed to read audit row")?;
            entries.push(AuditEntry {
                id,
                project_id,
                action,
                details: serde_json::from_str(&details)
                    .context("Failed to parse audit details JSON")?,
                created_at,
            });
        }
        Ok(entries)
    }
}

impl AllocationStore for BackofficeDb {
    fn list_allocations(&self, project_id: &str) -> std::result::Result<Vec<AllocationRecord>, StoreError> {
        BackofficeDb::list_allocations(self, project_id)
            .map(|views| views.into_iter().map(|v| v.record).collect())
            .map_err(StoreError::Unavailable)
    }

    fn apply_mint(&self, writes: &[MintWrite]) -> std::result::Result<Vec<usize>, StoreError> {
        self.apply_mint_writes(writes)
    }
}

fn subscription_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Subscription> {
    Ok(Subscription {
        id: row.get(0)?,
        project_id: row.get(1)?,
        investor_id: row.get(2)?,
        fiat_amount: row.get(3)?,
        currency: row.get(4)?,
        confirmed: row.get(5)?,
        allocated: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn allocation_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AllocationRow> {
    Ok(AllocationRow {
        id: row.get(0)?,
        investor_id: row.get(1)?,
        subscription_id: row.get(2)?,
        project_id: row.get(3)?,
        token_type: row.get(4)?,
        token_amount: row.get(5)?,
        confirmed: row.get(6)?,
        allocated: row.get(7)?,
        minted: row.get(8)?,
        minting_date: row.get(9)?,
        minting_tx_ref: row.get(10)?,
        distributed: row.get(11)?,
        distribution_date: row.get(12)?,
        distribution_tx_ref: row.get(13)?,
        investor_name: row.get(14)?,
        investor_email: row.get(15)?,
        wallet_address: row.get(16)?,
    })
}

/// Intermediate row struct for token_allocations joined with subscription
/// and investor columns.
struct AllocationRow {
    id: String,
    investor_id: String,
    subscription_id: String,
    project_id: String,
    token_type: Option<String>,
    token_amount: f64,
    confirmed: bool,
    allocated: bool,
    minted: bool,
    minting_date: Option<String>,
    minting_tx_ref: Option<String>,
    distributed: bool,
    distribution_date: Option<String>,
    distribution_tx_ref: Option<String>,
    investor_name: String,
    investor_email: String,
    wallet_address: Option<String>,
}

impl AllocationRow {
    fn into_view(self) -> Result<AllocationView> {
        let minting_date = parse_timestamp(self.minting_date, "minting_date")?;
        let distribution_date = parse_timestamp(self.distribution_date, "distribution_date")?;
        Ok(AllocationView {
            record: AllocationRecord {
                id: self.id,
                investor_id: self.investor_id,
                subscription_id: self.subscription_id,
                project_id: self.project_id,
                token_type: self.token_type,
                token_amount: self.token_amount,
                confirmed: self.confirmed,
                allocated: self.allocated,
                minted: self.minted,
                minting_date,
                minting_tx_ref: self.minting_tx_ref,
                distributed: self.distributed,
                distribution_date,
                distribution_tx_ref: self.distribution_tx_ref,
            },
            investor_name: self.investor_name,
            investor_email: self.investor_email,
            wallet_address: self.wallet_address,
        })
    }
}
