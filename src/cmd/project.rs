//! Project set-up commands (`mintdesk init`, `mintdesk import`, `mintdesk projects`).

use std::path::Path;

use anyhow::{Context, Result};
use mintdesk::backoffice::BackofficeDb;
use mintdesk::backoffice::models::{NewAllocation, NewInvestor, NewProject, NewSubscription};
use mintdesk::config::{MintdeskConfig, MintdeskToml};
use serde::Deserialize;

use super::open_db;

pub fn cmd_init(config: &MintdeskConfig) -> Result<()> {
    std::fs::create_dir_all(&config.mintdesk_dir).with_context(|| {
        format!("Failed to create {}", config.mintdesk_dir.display())
    })?;

    let config_path = config.config_path();
    if !config_path.exists() {
        MintdeskToml::default().save(&config_path)?;
        println!("Created {}", config_path.display());
    }

    let db_path = config.db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    BackofficeDb::new(&db_path)?;
    tracing::info!(db = %db_path.display(), "Database ready");

    println!("Initialized mintdesk project in {}", config.project_dir.display());
    Ok(())
}

/// JSON seed: one project with its investors, subscriptions and allocations.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub project: NewProject,
    #[serde(default)]
    pub investors: Vec<NewInvestor>,
    #[serde(default)]
    pub subscriptions: Vec<SeedSubscription>,
}

#[derive(Debug, Deserialize)]
pub struct SeedSubscription {
    #[serde(flatten)]
    pub subscription: NewSubscription,
    #[serde(default)]
    pub allocations: Vec<SeedAllocation>,
}

#[derive(Debug, Deserialize)]
pub struct SeedAllocation {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    pub token_amount: f64,
}

#[derive(Debug, Default, PartialEq)]
pub struct ImportCounts {
    pub investors: usize,
    pub subscriptions: usize,
    pub allocations: usize,
}

/// Import a seed in one transaction; a failure leaves nothing behind.
pub fn import_seed(db: &BackofficeDb, seed: &SeedFile) -> Result<(String, ImportCounts)> {
    db.in_transaction(|db| import_rows(db, seed))
}

fn import_rows(db: &BackofficeDb, seed: &SeedFile) -> Result<(String, ImportCounts)> {
    let project = db.create_project(&seed.project)?;
    let mut counts = ImportCounts::default();

    for investor in &seed.investors {
        let existing = match &investor.id {
            Some(id) => db.get_investor(id)?,
            None => None,
        };
        if existing.is_none() {
            db.create_investor(investor)
                .with_context(|| format!("Failed to import investor '{}'", investor.name))?;
            counts.investors += 1;
        }
    }

    for entry in &seed.subscriptions {
        let subscription = db
            .create_subscription(&project.id, &entry.subscription)
            .with_context(|| {
                format!(
                    "Failed to import subscription for investor '{}'",
                    entry.subscription.investor_id
                )
            })?;
        counts.subscriptions += 1;

        for allocation in &entry.allocations {
            db.create_allocation(
                &project.id,
                &NewAllocation {
                    id: allocation.id.clone(),
                    subscription_id: subscription.id.clone(),
                    token_type: allocation.token_type.clone(),
                    token_amount: allocation.token_amount,
                },
            )?;
            counts.allocations += 1;
        }
    }

    Ok((project.id, counts))
}

pub fn cmd_import(config: &MintdeskConfig, file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let seed: SeedFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse seed file {}", file.display()))?;

    let db = open_db(config)?;
    let (project_id, counts) = import_seed(&db, &seed)?;
    tracing::info!(
        project_id = %project_id,
        investors = counts.investors,
        subscriptions = counts.subscriptions,
        allocations = counts.allocations,
        "Seed imported"
    );

    println!(
        "Imported project {} ({} investors, {} subscriptions, {} allocations)",
        project_id, counts.investors, counts.subscriptions, counts.allocations
    );
    Ok(())
}

pub fn cmd_projects(config: &MintdeskConfig) -> Result<()> {
    let db = open_db(config)?;
    let projects = db.list_projects()?;

    if projects.is_empty() {
        println!("No projects. Use 'mintdesk import <file>' to load one.");
        return Ok(());
    }

    println!();
    println!("{}", console::style("Projects").bold().cyan());
    println!();
    for project in projects {
        println!(
            "  {}  {}",
            console::style(&project.id).dim(),
            console::style(&project.name).bold()
        );
        if let Some(description) = &project.description {
            println!("      {}", description);
        }
    }
    println!();
    Ok(())
}
