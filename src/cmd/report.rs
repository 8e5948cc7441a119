//! Read-only views (`mintdesk summary`, `mintdesk audit`).

use anyhow::Result;
use console::style;
use mintdesk::config::MintdeskConfig;
use mintdesk_common::{AllocationStore, GroupStatus, TokenGroupSummary, aggregate, filter_by_token_type};

use super::open_db;

fn styled_status(status: GroupStatus) -> console::StyledObject<&'static str> {
    match status {
        GroupStatus::Pending => style(status.as_str()).yellow(),
        GroupStatus::ReadyToMint => style(status.as_str()).green().bold(),
        GroupStatus::Minted => style(status.as_str()).cyan(),
    }
}

fn print_group(group: &TokenGroupSummary) {
    println!(
        "  {:<16} {}",
        style(&group.token_type).bold(),
        styled_status(group.status)
    );
    println!(
        "      total {:.2} ({} allocations)  confirmed {:.2} ({}/{}, {}%)",
        group.total_amount,
        group.total_count,
        group.confirmed_amount,
        group.confirmed_count,
        group.total_count,
        group.confirmation_progress()
    );
    println!(
        "      minted {:.2} ({})  distributed {:.2} ({})",
        group.minted_amount, group.minted_count, group.distributed_amount, group.distributed_count
    );
}

pub fn cmd_summary(
    config: &MintdeskConfig,
    project_id: &str,
    search: Option<&str>,
    json: bool,
) -> Result<()> {
    let db = open_db(config)?;
    let project = db.require_project(project_id)?;
    let records = AllocationStore::list_allocations(&db, project_id)?;
    let groups = filter_by_token_type(aggregate(&records), search.unwrap_or(""));

    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }

    println!();
    println!(
        "{} {} ({})",
        style("Token groups for").bold().cyan(),
        style(&project.name).bold(),
        project.id
    );
    println!();

    if groups.is_empty() {
        println!("  No allocations.");
        println!();
        return Ok(());
    }

    for group in &groups {
        print_group(group);
    }

    let ready = groups.iter().filter(|g| g.ready_to_mint).count();
    println!();
    println!("{} of {} token groups ready to mint", ready, groups.len());
    println!();
    Ok(())
}

pub fn cmd_audit(config: &MintdeskConfig, project_id: &str, limit: Option<usize>) -> Result<()> {
    let db = open_db(config)?;
    db.require_project(project_id)?;
    let entries = db.list_audit_entries(project_id)?;

    if entries.is_empty() {
        println!("No audit entries for project {}", project_id);
        return Ok(());
    }

    let shown = limit.unwrap_or(entries.len());
    println!();
    for entry in entries.iter().take(shown) {
        println!(
            "  {}  {}  {}",
            style(&entry.created_at).dim(),
            style(&entry.action).bold(),
            entry.details
        );
    }
    println!();
    Ok(())
}
