//! `hashistack import` - adopt an existing remote resource

use anyhow::{Result, bail};

use super::{Session, parse_address};
use crate::progress;
use crate::ui;

pub fn run(session: &Session, address: &str, id: &str) -> Result<()> {
    let address = parse_address(&session.registry, address)?;
    let mut state = session.load_state()?;

    if let Some(existing) = state.get(&address) {
        if existing.id != id {
            bail!(
                "{address} already tracks {}; destroy it or pick another name",
                existing.id
            );
        }
        log::info!("{address} already tracks {id}, refreshing");
    }

    let pb = progress::spinner(&format!("Importing {} {id}...", address.kind), session.quiet);
    let imported = session
        .registry
        .reconciler(&address.kind)?
        .import(&session.context(), id);
    pb.finish_and_clear();
    let remote = imported?;

    state.record(&address, &remote);
    session.save_state(&state)?;

    ui::success(&format!("Imported {address} ({}, {})", remote.id, remote.status));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{mock_session, nomad_remote};
    use crate::state::StateStore;
    use declarative::{Address, Method, RemoteResourceState, ResourceSpec, Status};

    const ITEM: &str = "/cloud/project/nomad/cluster/abc123";

    #[test]
    fn test_import_tracks_resource() {
        let (session, client, _dir) = mock_session();
        client.on(Method::Get, ITEM, nomad_remote("abc123", "READY", 3));

        run(&session, "nomad_cluster.jobs", "abc123").unwrap();

        let state = session.load_state().unwrap();
        let record = state.get(&Address::new("nomad_cluster", "jobs")).unwrap();
        assert_eq!(record.id, "abc123");
        assert_eq!(record.attributes.get_str("region"), Some("GRA"));
        assert_eq!(record.attributes.get_int("server_count"), Some(3));
    }

    #[test]
    fn test_import_missing_resource_fails() {
        let (session, _client, _dir) = mock_session();

        let err = run(&session, "nomad_cluster.jobs", "abc123").unwrap_err();

        assert!(err.to_string().contains("not found"));
        assert!(session.load_state().unwrap().is_empty());
    }

    #[test]
    fn test_import_refuses_conflicting_id() {
        let (session, client, _dir) = mock_session();
        let mut state = StateStore::default();
        state.record(
            &Address::new("nomad_cluster", "jobs"),
            &RemoteResourceState::new("other", Status::Ready, ResourceSpec::new()),
        );
        session.save_state(&state).unwrap();

        let err = run(&session, "nomad_cluster.jobs", "abc123").unwrap_err();

        assert!(err.to_string().contains("already tracks other"));
        assert!(client.requests().is_empty());
    }

    #[test]
    fn test_import_unknown_kind_fails() {
        let (session, client, _dir) = mock_session();
        assert!(run(&session, "mystery.jobs", "abc123").is_err());
        assert!(client.requests().is_empty());
    }
}
