//! Execution planner - classifies declared and tracked resources into actions

use std::collections::BTreeMap;
use std::fmt;

use crate::diff::SpecDiff;
use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::types::{RemoteResourceState, ResourceSpec};

/// Address of one resource: `kind.name`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address {
    pub kind: String,
    pub name: String,
}

impl Address {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Parse `kind.name`
    pub fn parse(address: &str) -> Option<Self> {
        let (kind, name) = address.split_once('.')?;
        if kind.is_empty() || name.is_empty() || name.contains('.') {
            return None;
        }
        Some(Self::new(kind, name))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind, self.name)
    }
}

/// A resource declared in desired state
#[derive(Debug, Clone, PartialEq)]
pub struct Declared {
    pub address: Address,
    pub spec: ResourceSpec,
}

/// A resource recorded in the state store
#[derive(Debug, Clone, PartialEq)]
pub struct Tracked {
    pub address: Address,
    pub state: RemoteResourceState,
}

/// What the executor will do for one address
#[derive(Debug, Clone)]
pub enum Action {
    Create {
        spec: ResourceSpec,
    },
    Update {
        desired: ResourceSpec,
        last_known: RemoteResourceState,
        diff: SpecDiff,
    },
    /// Destroy and create again
    Replace {
        id: String,
        desired: ResourceSpec,
        diff: SpecDiff,
    },
    Delete {
        id: String,
    },
    NoOp {
        id: String,
    },
}

impl Action {
    /// Short verb for display
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Replace { .. } => "replace",
            Self::Delete { .. } => "delete",
            Self::NoOp { .. } => "no-op",
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, Self::NoOp { .. })
    }

    /// Remote ID of the existing resource, if any
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Create { .. } => None,
            Self::Update { last_known, .. } => Some(&last_known.id),
            Self::Replace { id, .. } | Self::Delete { id } | Self::NoOp { id } => Some(id),
        }
    }
}

/// One address and its action
#[derive(Debug, Clone)]
pub struct PlannedChange {
    pub address: Address,
    pub action: Action,
}

/// Counts per action
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub replace: usize,
    pub delete: usize,
    pub no_op: usize,
}

impl PlanSummary {
    pub fn total_changes(&self) -> usize {
        self.create + self.update + self.replace + self.delete
    }

    pub fn has_changes(&self) -> bool {
        self.total_changes() > 0
    }
}

/// An execution plan, ordered by address
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    pub changes: Vec<PlannedChange>,
}

impl ExecutionPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan convergence of tracked resources towards declared ones.
    ///
    /// Declared specs are validated up front, so schema errors surface
    /// before anything is applied. Tracked resources that are no longer
    /// declared are deleted.
    pub fn build(registry: &Registry, declared: &[Declared], tracked: &[Tracked]) -> Result<Self> {
        let mut tracked_by_address: BTreeMap<&Address, &Tracked> =
            tracked.iter().map(|t| (&t.address, t)).collect();
        let mut changes = BTreeMap::new();

        for item in declared {
            let reconciler = registry.reconciler(&item.address.kind)?;
            reconciler.schema().validate(&item.spec)?;

            let action = match tracked_by_address.remove(&item.address) {
                None => Action::Create {
                    spec: item.spec.clone(),
                },
                Some(existing) => {
                    let diff = reconciler.plan_update(&item.spec, &existing.state.attributes);
                    if diff.force_replace {
                        Action::Replace {
                            id: existing.state.id.clone(),
                            desired: item.spec.clone(),
                            diff,
                        }
                    } else if diff.changed.is_empty() {
                        Action::NoOp {
                            id: existing.state.id.clone(),
                        }
                    } else {
                        Action::Update {
                            desired: item.spec.clone(),
                            last_known: existing.state.clone(),
                            diff,
                        }
                    }
                }
            };
            if changes.insert(item.address.clone(), action).is_some() {
                return Err(Error::schema(
                    &item.address.kind,
                    &item.address.name,
                    "is declared more than once",
                ));
            }
        }

        for (address, orphan) in tracked_by_address {
            registry.schema(&address.kind)?;
            changes.insert(
                address.clone(),
                Action::Delete {
                    id: orphan.state.id.clone(),
                },
            );
        }

        Ok(Self::from_map(changes))
    }

    /// Plan deletion of every tracked resource
    pub fn destroy(tracked: &[Tracked]) -> Self {
        let changes = tracked
            .iter()
            .map(|t| {
                (
                    t.address.clone(),
                    Action::Delete {
                        id: t.state.id.clone(),
                    },
                )
            })
            .collect();
        Self::from_map(changes)
    }

    fn from_map(changes: BTreeMap<Address, Action>) -> Self {
        Self {
            changes: changes
                .into_iter()
                .map(|(address, action)| PlannedChange { address, action })
                .collect(),
        }
    }

    /// Filter plan to only include changes matching a predicate
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&PlannedChange) -> bool,
    {
        Self {
            changes: self.changes.into_iter().filter(|c| predicate(c)).collect(),
        }
    }

    /// Filter plan to only include addresses matching a target pattern
    ///
    /// Target format: "kind" or "kind.name"
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => {
                let (kind, name) = parse_target(t);
                self.filter(|c| matches_filter(&c.address, kind.as_deref(), name.as_deref()))
            }
        }
    }

    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary::default();
        for change in &self.changes {
            match change.action {
                Action::Create { .. } => summary.create += 1,
                Action::Update { .. } => summary.update += 1,
                Action::Replace { .. } => summary.replace += 1,
                Action::Delete { .. } => summary.delete += 1,
                Action::NoOp { .. } => summary.no_op += 1,
            }
        }
        summary
    }

    /// Changes that do something
    pub fn pending(&self) -> impl Iterator<Item = &PlannedChange> {
        self.changes.iter().filter(|c| c.action.is_change())
    }

    /// Check if plan has no changes to apply
    pub fn is_empty(&self) -> bool {
        self.pending().next().is_none()
    }
}

/// Parse a target string like "kind.name" into (kind, name)
pub fn parse_target(target: &str) -> (Option<String>, Option<String>) {
    let parts: Vec<&str> = target.split('.').collect();
    match parts.len() {
        1 => (Some(parts[0].to_string()), None),
        2 => (Some(parts[0].to_string()), Some(parts[1].to_string())),
        _ => (None, Some(target.to_string())),
    }
}

/// Check if an address matches the filter criteria
///
/// A kind matches exactly or by its product prefix (`nomad` matches
/// `nomad_cluster`).
pub fn matches_filter(address: &Address, kind: Option<&str>, name: Option<&str>) -> bool {
    if let Some(k) = kind {
        let prefix = address.kind.split('_').next().unwrap_or(&address.kind);
        if address.kind != k && prefix != k {
            return false;
        }
    }

    if let Some(n) = name
        && address.name != n
    {
        return false;
    }

    true
}
