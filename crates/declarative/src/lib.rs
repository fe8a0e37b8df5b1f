//! # Declarative
//!
//! A declarative resource lifecycle reconciler for remote control planes.
//!
//! This crate converges remote resources towards a declared specification:
//! it translates attribute specs into remote payloads, computes minimal
//! update diffs, performs create/read/update/delete through a pluggable
//! client and waits for asynchronously provisioned resources to become ready.
//!
//! ## Core Concepts
//!
//! - **ResourceSchema**: the attribute table of one resource kind
//! - **ResourceSpec**: desired (or last-known) typed attribute values
//! - **Reconciler**: generic CRUD over any schema
//! - **Registry**: kind name to schema lookup
//! - **ExecutionPlan**: create/update/replace/delete actions per address
//! - **Executor**: applies a plan with bounded parallelism
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{
//!     AttrType, AttributeDescriptor, ReconcileContext, Registry, ResourceSchema, ResourceSpec,
//! };
//!
//! let mut registry = Registry::new();
//! registry.register(
//!     ResourceSchema::new("nomad_cluster", "/cloud/project/nomad/cluster")
//!         .attribute(AttributeDescriptor::required("name", AttrType::String).force_new())
//!         .attribute(AttributeDescriptor::required("server_count", AttrType::Int)),
//! )?;
//!
//! let ctx = ReconcileContext::new(&client);
//! let spec = ResourceSpec::new().with("name", "jobs").with("server_count", 3);
//! let state = registry.reconciler("nomad_cluster")?.create(&ctx, &spec)?;
//! println!("{} is {}", state.id, state.status);
//! ```
//!
//! ## Provider Traits
//!
//! - [`RemoteClient`]: performs control-plane requests
//! - [`PollObserver`]: receives readiness observations
//! - [`ProgressCallback`]: receives plan execution progress
//!
//! This keeps the crate free of HTTP, terminal and configuration concerns.

pub mod client;
pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod planner;
pub mod poller;
pub mod reconciler;
pub mod registry;
pub mod schema;
pub mod translate;
pub mod types;

// Re-export main types at crate root
pub use client::{Method, RemoteClient};
#[cfg(any(test, feature = "mock"))]
pub use client::{MockClient, Request};
pub use context::{CancelToken, NoProgress, PollObserver, ProgressCallback, ReconcileContext};
pub use diff::{FieldChange, SpecDiff, diff};
pub use error::{Error, ErrorCategory, RemoteError, Result};
pub use executor::{ExecuteReport, apply_change, execute};
pub use planner::{
    Action, Address, Declared, ExecutionPlan, PlanSummary, PlannedChange, Tracked, matches_filter,
    parse_target,
};
pub use poller::{Observation, PollConfig, wait_until_ready};
pub use reconciler::{ListFilter, Reconciler};
pub use registry::Registry;
pub use schema::{AttributeDescriptor, Presence, ResourceSchema, Rule, StatusRules};
pub use translate::{camel_to_snake, from_remote_payload, snake_to_camel, to_remote_payload};
pub use types::{
    ApplyResult, AttrType, ExecuteOptions, ExecuteSummary, RemoteResourceState, ResourceSpec,
    Status, TagSet, Value,
};
