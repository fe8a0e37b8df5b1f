//! `hashistack list` - list remote resources of one kind

use anyhow::Result;
use colored::Colorize;
use declarative::{ListFilter, RemoteResourceState};

use super::Session;
use crate::progress;
use crate::state::StateStore;
use crate::ui;

/// One line of the listing
#[derive(Debug, PartialEq)]
struct Row {
    id: String,
    name: String,
    region: String,
    status: String,
    /// Address tracking this ID, if any
    tracked_as: Option<String>,
}

pub fn run(
    session: &Session,
    kind: &str,
    region: Option<String>,
    status: Option<String>,
) -> Result<()> {
    let reconciler = session.registry.reconciler(kind)?;
    let filter = ListFilter { region, status };

    let pb = progress::spinner(&format!("Listing {kind}..."), session.quiet);
    let listed = reconciler.list(&session.context(), &filter);
    pb.finish_and_clear();
    let remotes = listed?;

    if remotes.is_empty() {
        ui::info(&format!("No {kind} resources found"));
        return Ok(());
    }

    let state = session.load_state()?;
    let rows = rows(kind, &remotes, &state);

    ui::header(&format!("{kind} ({})", rows.len()));
    println!(
        "  {:<24} {:<24} {:<12} {}",
        "ID".bold(),
        "NAME".bold(),
        "REGION".bold(),
        "STATUS".bold()
    );
    for row in &rows {
        let status = match row.status.to_ascii_uppercase().as_str() {
            "READY" => row.status.green(),
            "ERROR" | "FAILED" => row.status.red(),
            _ => row.status.yellow(),
        };
        let tracked = row
            .tracked_as
            .as_deref()
            .map(|a| format!(" ({a})"))
            .unwrap_or_default();
        println!(
            "  {:<24} {:<24} {:<12} {}{}",
            row.id,
            row.name,
            row.region,
            status,
            tracked.dimmed()
        );
    }
    Ok(())
}

fn rows(kind: &str, remotes: &[RemoteResourceState], state: &StateStore) -> Vec<Row> {
    remotes
        .iter()
        .map(|remote| Row {
            id: remote.id.clone(),
            name: remote.attributes.get_str("name").unwrap_or("-").to_string(),
            region: remote.attributes.get_str("region").unwrap_or("-").to_string(),
            status: remote
                .raw_status
                .clone()
                .unwrap_or_else(|| remote.status.to_string()),
            tracked_as: state
                .resources
                .iter()
                .find(|(_, r)| r.kind == kind && r.id == remote.id)
                .map(|(address, _)| address.clone()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{mock_session, nomad_remote};
    use declarative::{Address, Method, ResourceSpec, Status};
    use serde_json::json;

    const COLLECTION: &str = "/cloud/project/nomad/cluster";

    #[test]
    fn test_rows_mark_tracked_resources() {
        let mut state = StateStore::default();
        state.record(
            &Address::new("nomad_cluster", "jobs"),
            &RemoteResourceState::new("abc123", Status::Ready, ResourceSpec::new()),
        );
        let remotes = vec![
            RemoteResourceState::new(
                "abc123",
                Status::Ready,
                ResourceSpec::new().with("name", "jobs").with("region", "GRA"),
            ),
            RemoteResourceState::new("zzz", Status::Pending, ResourceSpec::new()),
        ];

        let rows = rows("nomad_cluster", &remotes, &state);

        assert_eq!(rows[0].tracked_as.as_deref(), Some("nomad_cluster.jobs"));
        assert_eq!(rows[0].region, "GRA");
        assert_eq!(rows[1].tracked_as, None);
        assert_eq!(rows[1].name, "-");
        assert_eq!(rows[1].status, "PENDING");
    }

    #[test]
    fn test_list_reads_collection() {
        let (session, client, _dir) = mock_session();
        client.on(
            Method::Get,
            COLLECTION,
            json!([
                nomad_remote("abc123", "READY", 3),
                nomad_remote("def456", "PENDING", 3)
            ]),
        );

        run(&session, "nomad_cluster", None, Some("ready".to_string())).unwrap();

        assert_eq!(client.count(Method::Get, COLLECTION), 1);
    }

    #[test]
    fn test_list_unknown_kind_fails() {
        let (session, client, _dir) = mock_session();
        let err = run(&session, "mystery", None, None).unwrap_err();
        assert!(err.to_string().contains("unknown resource kind"));
        assert!(client.requests().is_empty());
    }

    #[test]
    fn test_list_remote_error_propagates() {
        let (session, _client, _dir) = mock_session();
        // Unscripted collection answers 404
        assert!(run(&session, "nomad_cluster", None, None).is_err());
    }
}
