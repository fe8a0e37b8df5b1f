//! Plan display

use colored::Colorize;
use declarative::{Action, ExecutionPlan, PlannedChange};
use std::collections::BTreeMap;

/// Display a plan in a user-friendly format
pub fn display_plan(plan: &ExecutionPlan) {
    let summary = plan.summary();
    if !summary.has_changes() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    // Group by kind
    let mut by_kind: BTreeMap<&str, Vec<&PlannedChange>> = BTreeMap::new();
    for change in plan.pending() {
        by_kind
            .entry(change.address.kind.as_str())
            .or_default()
            .push(change);
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Execution Plan".bold()
    );
    println!("│");

    for (kind, changes) in &by_kind {
        println!("│ {}", kind.bold());
        for change in changes {
            let symbol = match change.action {
                Action::Create { .. } => "+".green(),
                Action::Update { .. } => "~".yellow(),
                Action::Replace { .. } => "±".magenta(),
                Action::Delete { .. } => "-".red(),
                Action::NoOp { .. } => "○".dimmed(),
            };
            println!(
                "│   {} {:<30} {}",
                symbol,
                change.address.name,
                headline(&change.action).dimmed()
            );
            for line in detail_lines(&change.action) {
                println!("│       {}", line.dimmed());
            }
        }
        println!("│");
    }

    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} to create, {} to update, {} to replace, {} to delete",
        summary.create.to_string().green(),
        summary.update.to_string().yellow(),
        summary.replace.to_string().magenta(),
        summary.delete.to_string().red()
    );
    println!("└─────────────────────────────────────────────────────┘");
}

fn headline(action: &Action) -> String {
    match action {
        Action::Create { .. } => "(will create)".to_string(),
        Action::Update { last_known, .. } => format!("({} will update in place)", last_known.id),
        Action::Replace { id, .. } => format!("({id} will be destroyed and recreated)"),
        Action::Delete { id } => format!("({id} will be destroyed)"),
        Action::NoOp { id } => format!("({id} up to date)"),
    }
}

/// Per-attribute lines for an action; sensitive values stay redacted
fn detail_lines(action: &Action) -> Vec<String> {
    match action {
        Action::Update { diff, .. } | Action::Replace { diff, .. } => {
            diff.changes.iter().map(ToString::to_string).collect()
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource;
    use declarative::{Address, Declared, RemoteResourceState, ResourceSpec, Status, Tracked};

    fn spec() -> ResourceSpec {
        ResourceSpec::new()
            .with("name", "jobs")
            .with("region", "GRA")
            .with("server_count", 3)
            .with("client_count", 5)
    }

    fn plan_for(desired: ResourceSpec) -> ExecutionPlan {
        let registry = resource::registry().unwrap();
        let address = Address::new("nomad_cluster", "jobs");
        ExecutionPlan::build(
            &registry,
            &[Declared {
                address: address.clone(),
                spec: desired,
            }],
            &[Tracked {
                address,
                state: RemoteResourceState::new("abc123", Status::Ready, spec()),
            }],
        )
        .unwrap()
    }

    #[test]
    fn test_update_details() {
        let plan = plan_for(spec().with("server_count", 5));
        let action = &plan.changes[0].action;

        assert_eq!(headline(action), "(abc123 will update in place)");
        assert_eq!(detail_lines(action), vec!["server_count: 3 -> 5".to_string()]);
    }

    #[test]
    fn test_replace_details() {
        let plan = plan_for(spec().with("region", "SBG"));
        let action = &plan.changes[0].action;

        assert_eq!(headline(action), "(abc123 will be destroyed and recreated)");
        assert_eq!(
            detail_lines(action),
            vec![r#"region: "GRA" -> "SBG" (forces replacement)"#.to_string()]
        );
    }

    #[test]
    fn test_create_has_no_details() {
        let action = Action::Create { spec: spec() };
        assert_eq!(headline(&action), "(will create)");
        assert!(detail_lines(&action).is_empty());
    }
}
