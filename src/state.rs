//! Declarative state store
//!
//! Remembers, per address, the remote ID and the last-known attributes of
//! every resource this tool created or imported.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use declarative::{
    Address, ApplyResult, Registry, RemoteResourceState, ResourceSpec, Status, Tracked,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

// ============================================================================
// State Structures
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StateStore {
    /// Tracked resources keyed by `kind.name`
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceRecord>,

    /// Last time the state was updated
    pub last_updated: DateTime<Utc>,
}

/// Last-known state of one resource
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResourceRecord {
    pub kind: String,
    /// Remote ID
    pub id: String,
    /// Status exactly as the control plane reported it
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub attributes: ResourceSpec,
    pub updated_at: DateTime<Utc>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self {
            resources: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }
}

// ============================================================================
// StateStore Implementation
// ============================================================================

impl StateStore {
    /// Load state from disk, or return default if file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, using default state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        log::debug!("Loaded state from {}", path.display());
        Ok(state)
    }

    /// Save state to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        let content = toml::to_string_pretty(&self).context("Failed to serialize state to TOML")?;

        fs::write(path, &content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    pub fn get(&self, address: &Address) -> Option<&ResourceRecord> {
        self.resources.get(&address.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Record the observed state of a resource
    pub fn record(&mut self, address: &Address, state: &RemoteResourceState) {
        let now = Utc::now();
        self.resources.insert(
            address.to_string(),
            ResourceRecord {
                kind: address.kind.clone(),
                id: state.id.clone(),
                status: state.raw_status.clone(),
                attributes: state.attributes.clone(),
                updated_at: now,
            },
        );
        self.last_updated = now;
    }

    /// Stop tracking a resource
    pub fn forget(&mut self, address: &Address) -> Option<ResourceRecord> {
        let removed = self.resources.remove(&address.to_string());
        if removed.is_some() {
            self.last_updated = Utc::now();
        }
        removed
    }

    /// Fold the outcome of an applied change into the state.
    ///
    /// A failure that left a remote resource behind keeps it tracked so the
    /// next plan can reconcile it instead of creating a duplicate. A
    /// resource tracked without attributes is replaced on the next apply.
    pub fn apply(&mut self, address: &Address, result: &ApplyResult) {
        match result {
            ApplyResult::Created(state)
            | ApplyResult::Modified(state)
            | ApplyResult::Replaced(state) => self.record(address, state),
            ApplyResult::Removed => {
                self.forget(address);
            }
            ApplyResult::Failed { id: Some(id), .. } => {
                let known = self.get(address).is_some_and(|r| &r.id == id);
                if !known {
                    log::warn!("{address}: tracking partially created resource {id}");
                    let state =
                        RemoteResourceState::new(id.clone(), Status::Unknown, ResourceSpec::new());
                    self.record(address, &state);
                }
            }
            ApplyResult::Failed { id: None, .. } => {
                self.forget(address);
            }
            ApplyResult::NoChange | ApplyResult::Skipped { .. } => {}
        }
    }

    /// Tracked resources, with status classified by each kind's rules
    pub fn tracked(&self, registry: &Registry) -> Vec<Tracked> {
        self.resources
            .iter()
            .map(|(key, record)| {
                let address = Address::parse(key)
                    .unwrap_or_else(|| Address::new(record.kind.as_str(), key.as_str()));
                let status = registry.schema(&record.kind).map_or(Status::Unknown, |schema| {
                    schema.status.classify(record.status.as_deref())
                });
                let mut state =
                    RemoteResourceState::new(record.id.clone(), status, record.attributes.clone());
                state.raw_status = record.status.clone();
                Tracked { address, state }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource;

    fn nomad_state(id: &str, server_count: i64) -> RemoteResourceState {
        let mut state = RemoteResourceState::new(
            id,
            Status::Ready,
            ResourceSpec::new()
                .with("name", "jobs")
                .with("region", "GRA")
                .with("server_count", server_count)
                .with("client_count", 5)
                .with("server_endpoints", vec!["10.0.0.1:4646".to_string()])
                .with(
                    "tags",
                    [("env".to_string(), "prod".to_string())]
                        .into_iter()
                        .collect::<declarative::TagSet>(),
                ),
        );
        state.raw_status = Some("READY".to_string());
        state
    }

    fn address() -> Address {
        Address::new("nomad_cluster", "jobs")
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateStore::load(&dir.path().join("state.toml")).unwrap();
        assert!(state.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.toml");

        let mut state = StateStore::default();
        state.record(&address(), &nomad_state("abc123", 3));
        state.save(&path).unwrap();

        let loaded = StateStore::load(&path).unwrap();
        let record = loaded.get(&address()).unwrap();
        assert_eq!(record.id, "abc123");
        assert_eq!(record.kind, "nomad_cluster");
        assert_eq!(record.status.as_deref(), Some("READY"));
        assert_eq!(record.attributes, nomad_state("abc123", 3).attributes);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.toml");
        fs::write(&path, "resources = 3").unwrap();
        let err = StateStore::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse state file"));
    }

    #[test]
    fn test_tracked_classifies_status() {
        let registry = resource::registry().unwrap();
        let mut state = StateStore::default();
        let mut observed = nomad_state("abc123", 3);
        observed.raw_status = Some("installing".to_string());
        state.record(&address(), &observed);

        let tracked = state.tracked(&registry);

        assert_eq!(tracked.len(), 1);
        assert_eq!(tracked[0].address, address());
        assert_eq!(tracked[0].state.status, Status::Pending);
        assert_eq!(tracked[0].state.attributes.get_int("server_count"), Some(3));
    }

    #[test]
    fn test_apply_results() {
        let mut state = StateStore::default();

        state.apply(&address(), &ApplyResult::Created(nomad_state("abc123", 3)));
        assert_eq!(state.get(&address()).unwrap().id, "abc123");

        state.apply(&address(), &ApplyResult::Modified(nomad_state("abc123", 5)));
        assert_eq!(
            state.get(&address()).unwrap().attributes.get_int("server_count"),
            Some(5)
        );

        state.apply(
            &address(),
            &ApplyResult::Skipped {
                reason: "dry run".to_string(),
            },
        );
        assert!(state.get(&address()).is_some());

        state.apply(&address(), &ApplyResult::Removed);
        assert!(state.get(&address()).is_none());
    }

    #[test]
    fn test_failed_create_keeps_remote_id() {
        let mut state = StateStore::default();
        state.apply(
            &address(),
            &ApplyResult::Failed {
                error: "timed out".to_string(),
                id: Some("abc123".to_string()),
            },
        );

        let record = state.get(&address()).unwrap();
        assert_eq!(record.id, "abc123");
        assert!(record.attributes.is_empty());
    }

    #[test]
    fn test_failed_update_keeps_last_known() {
        let mut state = StateStore::default();
        state.record(&address(), &nomad_state("abc123", 3));

        state.apply(
            &address(),
            &ApplyResult::Failed {
                error: "PUT failed".to_string(),
                id: Some("abc123".to_string()),
            },
        );

        assert_eq!(
            state.get(&address()).unwrap().attributes.get_int("server_count"),
            Some(3)
        );
    }
}
