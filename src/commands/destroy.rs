//! `hashistack destroy` - delete tracked resources

use anyhow::{Result, bail};
use declarative::ExecutionPlan;

use super::Session;
use crate::engine::{self, ApplyOptions};
use crate::ui;

pub fn run(session: &Session, target: Option<&str>, yes: bool) -> Result<()> {
    let mut state = session.load_state()?;
    if state.is_empty() {
        ui::info("No tracked resources, nothing to destroy");
        return Ok(());
    }

    let tracked = state.tracked(&session.registry);
    let plan = ExecutionPlan::destroy(&tracked).filter_by_target(target);
    if plan.is_empty() {
        ui::warn(&format!(
            "No tracked resources match '{}'",
            target.unwrap_or_default()
        ));
        return Ok(());
    }

    let opts = ApplyOptions {
        yes,
        dry_run: false,
        jobs: session.jobs,
    };
    let summary = engine::execute(session, &plan, &mut state, &opts)?;

    if !summary.is_success() {
        bail!("{} resources could not be destroyed", summary.failed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::mock_session;
    use crate::state::StateStore;
    use declarative::{Address, Method, RemoteError, RemoteResourceState, ResourceSpec, Status};
    use serde_json::json;

    fn track(session: &Session) {
        let mut state = StateStore::default();
        for (kind, name, id) in [
            ("nomad_cluster", "jobs", "abc123"),
            ("vault_cluster", "secrets", "v-1"),
        ] {
            state.record(
                &Address::new(kind, name),
                &RemoteResourceState::new(id, Status::Ready, ResourceSpec::new()),
            );
        }
        session.save_state(&state).unwrap();
    }

    #[test]
    fn test_destroy_target_only() {
        let (session, client, _dir) = mock_session();
        track(&session);
        client.on(Method::Delete, "/cloud/project/vault/cluster/v-1", json!(null));

        run(&session, Some("vault_cluster.secrets"), true).unwrap();

        assert_eq!(client.count_method(Method::Delete), 1);
        let state = session.load_state().unwrap();
        assert!(state.get(&Address::new("vault_cluster", "secrets")).is_none());
        assert!(state.get(&Address::new("nomad_cluster", "jobs")).is_some());
    }

    #[test]
    fn test_destroy_already_absent_succeeds() {
        let (session, client, _dir) = mock_session();
        track(&session);
        // Unscripted deletes answer 404

        run(&session, None, true).unwrap();

        assert_eq!(client.count_method(Method::Delete), 2);
        assert!(session.load_state().unwrap().is_empty());
    }

    #[test]
    fn test_destroy_failure_keeps_tracking() {
        let (session, client, _dir) = mock_session();
        track(&session);
        client.fail(
            Method::Delete,
            "/cloud/project/nomad/cluster/abc123",
            RemoteError::Status {
                code: 409,
                message: "cluster is busy".to_string(),
            },
        );

        let err = run(&session, Some("nomad"), true).unwrap_err();

        assert!(err.to_string().contains("1 resources could not be destroyed"));
        let state = session.load_state().unwrap();
        assert!(state.get(&Address::new("nomad_cluster", "jobs")).is_some());
    }

    #[test]
    fn test_destroy_with_empty_state() {
        let (session, client, _dir) = mock_session();
        run(&session, None, true).unwrap();
        assert!(client.requests().is_empty());
    }
}
