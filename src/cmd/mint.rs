//! Minting command (`mintdesk mint`).

use anyhow::{Context, Result, bail};
use console::style;
use dialoguer::Confirm;
use mintdesk::config::MintdeskConfig;
use mintdesk_common::executor::{MintFailure, TokenMint};
use mintdesk_common::gate::{self, GateDecision};
use mintdesk_common::{AllocationStore, MintError, MintRequest, TokenGroupSummary, aggregate};

use super::open_db;

/// Which token groups the operator asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum MintSelection {
    TokenTypes(Vec<String>),
    AllReady,
}

impl MintSelection {
    pub fn from_args(token_types: &[String], all_ready: bool) -> Self {
        if all_ready {
            MintSelection::AllReady
        } else {
            MintSelection::TokenTypes(token_types.to_vec())
        }
    }

    fn resolve(&self, groups: &[TokenGroupSummary]) -> Vec<String> {
        match self {
            MintSelection::TokenTypes(types) => types.clone(),
            MintSelection::AllReady => gate::mintable(groups)
                .map(|g| g.token_type.clone())
                .collect(),
        }
    }
}

fn print_preview(token_types: &[String], groups: &[TokenGroupSummary]) {
    println!();
    for token_type in token_types {
        let group = groups.iter().find(|g| &g.token_type == token_type);
        match (gate::eligibility(group), group) {
            (GateDecision::Mintable, Some(g)) => {
                let amount: f64 = g.mintable_records().map(|a| a.token_amount).sum();
                println!(
                    "  {:<16} {:.2} tokens across {} allocations",
                    style(token_type).bold(),
                    amount,
                    g.mintable_records().count()
                );
            }
            (GateDecision::Rejected(reason), _) => {
                println!("  {:<16} {}", style(token_type).bold(), style(reason).red());
            }
            (GateDecision::Mintable, None) => {}
        }
    }
    println!();
}

fn print_mints(mints: &[TokenMint]) {
    for m in mints {
        println!(
            "  {} Minted {} ({} records, {:.2} tokens) tx {}",
            style("✓").green(),
            style(&m.token_type).bold(),
            m.records_updated,
            m.amount,
            m.tx_ref
        );
    }
}

fn confirm(project_id: &str, count: usize, yes: bool) -> Result<bool> {
    confirm_with(yes, console::Term::stderr().is_term(), || {
        Confirm::new()
            .with_prompt(format!(
                "Mint {} token type(s) for project {}? This cannot be undone.",
                count, project_id
            ))
            .default(false)
            .interact()
    })
}

fn confirm_with<F>(yes: bool, is_term: bool, prompt: F) -> Result<bool>
where
    F: FnOnce() -> dialoguer::Result<bool>,
{
    if yes {
        return Ok(true);
    }
    if !is_term {
        bail!("Minting requires confirmation. Re-run with --yes to confirm non-interactively.");
    }
    prompt().context("Failed to read mint confirmation")
}

pub fn cmd_mint(
    config: &MintdeskConfig,
    project_id: &str,
    selection: MintSelection,
    yes: bool,
    json: bool,
) -> Result<()> {
    let db = open_db(config)?;
    db.require_project(project_id)?;

    let groups = aggregate(&AllocationStore::list_allocations(&db, project_id)?);
    let token_types = selection.resolve(&groups);
    if token_types.is_empty() {
        println!("No token groups are ready to mint.");
        return Ok(());
    }

    if !json {
        print_preview(&token_types, &groups);
    }

    let executor = config.mint_executor()?;

    if !confirm(project_id, token_types.len(), yes)? {
        println!("Mint cancelled");
        return Ok(());
    }

    let request = MintRequest::new(project_id, token_types, true);
    match executor.mint(&db, &request) {
        Ok(result) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_mints(&result.mints);
                println!();
                println!("{} records minted", result.records_updated());
            }
            Ok(())
        }
        Err(MintError::PartialBatchFailure { minted, failed, .. }) => {
            print_mints(&minted);
            for f in &failed {
                let reason = match &f.reason {
                    MintFailure::NotEligible => "not eligible".to_string(),
                    MintFailure::AlreadyMinted => "already minted".to_string(),
                    MintFailure::StoreUnavailable { message } => format!("store unavailable: {}", message),
                };
                println!("  {} {} {}", style("✗").red(), style(&f.token_type).bold(), reason);
            }
            bail!(
                "{} of {} token types failed to mint",
                failed.len(),
                failed.len() + minted.len()
            )
        }
        Err(e) => {
            let hint = if e.is_retryable() {
                " (temporary, try again)"
            } else {
                ""
            };
            bail!("{}{} [{}]", e, hint, e.kind())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mintdesk_common::AllocationRecord;

    fn record(id: &str, token_type: &str, confirmed: bool) -> AllocationRecord {
        AllocationRecord {
            id: id.into(),
            investor_id: "inv".into(),
            subscription_id: format!("sub-{}", id),
            project_id: "p".into(),
            token_type: Some(token_type.into()),
            token_amount: 10.0,
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

    #[test]
    fn all_ready_selects_only_mintable_groups() {
        let groups = aggregate(&[
            record("a", "Equity", true),
            record("b", "Debt", false),
            record("c", "Warrant", true),
        ]);
        assert_eq!(
            MintSelection::AllReady.resolve(&groups),
            vec!["Equity".to_string(), "Warrant".to_string()]
        );
    }

    #[test]
    fn explicit_types_pass_through_unchecked() {
        let selection = MintSelection::from_args(&["Debt".to_string()], false);
        assert_eq!(selection.resolve(&[]), vec!["Debt".to_string()]);
    }

    #[test]
    fn yes_flag_confirms_without_prompt() {
        assert!(confirm("p", 1, true).unwrap());
    }

    #[test]
    fn prompt_failure_is_an_error_not_a_cancel() {
        let err = confirm_with(false, true, || {
            Err(dialoguer::Error::IO(std::io::Error::other("terminal closed")))
        })
        .unwrap_err();
        assert!(err.to_string().contains("mint confirmation"));

        assert!(!confirm_with(false, true, || Ok(false)).unwrap());
        assert!(confirm_with(false, false, || Ok(true)).is_err());
    }
}
