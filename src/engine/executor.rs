//! Plan execution with hashistack's UI integration

use anyhow::{Context, Result};
use colored::Colorize;
use declarative::{
    Address, ApplyResult, ErrorCategory, ExecuteOptions, ExecuteSummary, ExecutionPlan,
};

use super::differ::display_plan;
use crate::commands::Session;
use crate::progress::ApplyProgress;
use crate::state::StateStore;

/// Options for applying a plan
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    /// Skip confirmation prompt
    pub yes: bool,
    /// Show the plan without applying it
    pub dry_run: bool,
    /// Resources applied concurrently
    pub jobs: usize,
}

/// Show, confirm and apply a plan, then persist the resulting state
pub fn execute(
    session: &Session,
    plan: &ExecutionPlan,
    state: &mut StateStore,
    opts: &ApplyOptions,
) -> Result<ExecuteSummary> {
    // 1. Display what will change
    display_plan(plan);

    if plan.is_empty() {
        return Ok(ExecuteSummary::default());
    }

    // 2. Confirm (unless --yes)
    if !opts.yes && !opts.dry_run && !confirm_proceed()? {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(ExecuteSummary {
            skipped: plan.pending().count(),
            ..Default::default()
        });
    }

    if opts.dry_run {
        println!();
        println!("  {} Dry run - no changes made", "ℹ".blue());
        return Ok(ExecuteSummary::default());
    }

    // 3. Apply
    println!();
    println!(
        "  {} Applying {} changes...",
        "→".cyan(),
        plan.pending().count()
    );

    let progress = ApplyProgress::new(session.quiet);
    let ctx = session.reconcile_context(&progress);
    let report = declarative::execute(
        &session.registry,
        &ctx,
        plan,
        &ExecuteOptions {
            dry_run: false,
            jobs: opts.jobs,
        },
        &progress,
    );

    // 4. Persist whatever happened, failures included
    for (address, result) in &report.results {
        state.apply(address, result);
    }
    session.save_state(state)?;

    // 5. Summary
    print_summary(&report.summary);
    if let Some(advice) = failure_advice(&report.results, session.cancel.is_cancelled()) {
        println!("  {} {advice}", "⚠".yellow());
    }

    Ok(report.summary)
}

/// Advice when failures left resources behind remotely
fn failure_advice(results: &[(Address, ApplyResult)], cancelled: bool) -> Option<&'static str> {
    let stranded = results
        .iter()
        .any(|(_, result)| matches!(result, ApplyResult::Failed { id: Some(_), .. }));
    if cancelled {
        Some(ErrorCategory::Cancelled.advice())
    } else if stranded {
        Some(ErrorCategory::Poll.advice())
    } else {
        None
    }
}

/// Confirm with user
fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Continue?")
        .default(true)
        .interact()
        .context("Confirmation prompt failed (use --yes in non-interactive sessions)")?;

    Ok(confirmed)
}

/// Print final summary
fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.is_success() {
        println!("  {} Changes applied successfully!", "✓".green().bold());
    } else {
        println!("  {} Changes applied with errors", "⚠".yellow().bold());
    }

    if summary.created > 0 {
        println!("    • {} resources created", summary.created);
    }
    if summary.modified > 0 {
        println!("    • {} resources updated", summary.modified);
    }
    if summary.replaced > 0 {
        println!("    • {} resources replaced", summary.replaced);
    }
    if summary.removed > 0 {
        println!("    • {} resources destroyed", summary.removed);
    }
    if summary.skipped > 0 {
        println!("    • {} resources skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "resources".red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{mock_session, nomad_remote};
    use declarative::{Declared, Method, ResourceSpec};
    use serde_json::json;

    const COLLECTION: &str = "/cloud/project/nomad/cluster";

    fn declared() -> Declared {
        Declared {
            address: Address::new("nomad_cluster", "jobs"),
            spec: ResourceSpec::new()
                .with("name", "jobs")
                .with("region", "GRA")
                .with("server_count", 3)
                .with("client_count", 5),
        }
    }

    fn opts() -> ApplyOptions {
        ApplyOptions {
            yes: true,
            dry_run: false,
            jobs: 2,
        }
    }

    #[test]
    fn test_execute_creates_and_persists() {
        let (session, client, _dir) = mock_session();
        client.on(Method::Post, COLLECTION, json!({"id": "abc123"}));
        client.on(
            Method::Get,
            &format!("{COLLECTION}/abc123"),
            nomad_remote("abc123", "READY", 3),
        );
        let mut state = StateStore::default();
        let plan = ExecutionPlan::build(&session.registry, &[declared()], &[]).unwrap();

        let summary = execute(&session, &plan, &mut state, &opts()).unwrap();

        assert_eq!(summary.created, 1);
        assert!(summary.is_success());
        let saved = StateStore::load(&session.state_path).unwrap();
        assert_eq!(
            saved.get(&Address::new("nomad_cluster", "jobs")).unwrap().id,
            "abc123"
        );
    }

    #[test]
    fn test_dry_run_makes_no_calls() {
        let (session, client, _dir) = mock_session();
        let mut state = StateStore::default();
        let plan = ExecutionPlan::build(&session.registry, &[declared()], &[]).unwrap();

        let summary = execute(
            &session,
            &plan,
            &mut state,
            &ApplyOptions {
                dry_run: true,
                yes: false,
                ..opts()
            },
        )
        .unwrap();

        assert_eq!(summary.total(), 0);
        assert!(client.requests().is_empty());
        assert!(!session.state_path.exists());
    }

    #[test]
    fn test_failed_create_is_reported_and_saved() {
        let (session, client, _dir) = mock_session();
        client.on(Method::Post, COLLECTION, json!({"id": "abc123"}));
        client.on(
            Method::Get,
            &format!("{COLLECTION}/abc123"),
            nomad_remote("abc123", "ERROR", 3),
        );
        let mut state = StateStore::default();
        let plan = ExecutionPlan::build(&session.registry, &[declared()], &[]).unwrap();

        let summary = execute(&session, &plan, &mut state, &opts()).unwrap();

        assert_eq!(summary.failed, 1);
        assert!(!summary.is_success());
        let saved = StateStore::load(&session.state_path).unwrap();
        assert!(saved.get(&Address::new("nomad_cluster", "jobs")).is_some());
    }

    #[test]
    fn test_failure_advice() {
        let address = Address::new("nomad_cluster", "jobs");
        let stranded = vec![(
            address.clone(),
            ApplyResult::Failed {
                error: "did not become ready".to_string(),
                id: Some("abc123".to_string()),
            },
        )];
        let rejected = vec![(
            address,
            ApplyResult::Failed {
                error: "bad request".to_string(),
                id: None,
            },
        )];

        assert_eq!(
            failure_advice(&stranded, false),
            Some(ErrorCategory::Poll.advice())
        );
        assert_eq!(
            failure_advice(&rejected, true),
            Some(ErrorCategory::Cancelled.advice())
        );
        assert_eq!(failure_advice(&rejected, false), None);
        assert_eq!(failure_advice(&[], false), None);
    }
}
