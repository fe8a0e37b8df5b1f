//! Execution engine - applies a plan with bounded parallelism

use std::sync::{Arc, Mutex, PoisonError};

use rayon::prelude::*;

use crate::context::{ProgressCallback, ReconcileContext};
use crate::planner::{Action, Address, ExecutionPlan, PlannedChange};
use crate::registry::Registry;
use crate::types::{ApplyResult, ExecuteOptions, ExecuteSummary};

/// Per-address results of an execution, in plan order
#[derive(Debug, Default)]
pub struct ExecuteReport {
    pub results: Vec<(Address, ApplyResult)>,
    pub summary: ExecuteSummary,
}

/// Execute a plan
///
/// Each address is applied exactly once. Different addresses run
/// concurrently on a pool of `opts.jobs` threads. A failure on one address
/// does not stop the others.
pub fn execute(
    registry: &Registry,
    ctx: &ReconcileContext<'_>,
    plan: &ExecutionPlan,
    opts: &ExecuteOptions,
    progress: &dyn ProgressCallback,
) -> ExecuteReport {
    let pending: Vec<&PlannedChange> = plan.pending().collect();
    let mut report = ExecuteReport::default();
    if pending.is_empty() {
        for change in &plan.changes {
            report.summary.add_result(&ApplyResult::NoChange);
            report
                .results
                .push((change.address.clone(), ApplyResult::NoChange));
        }
        return report;
    }

    progress.on_start(pending.len());
    let results = if opts.jobs <= 1 || plan.changes.len() == 1 {
        plan.changes
            .iter()
            .map(|change| run_one(registry, ctx, change, opts, progress))
            .collect()
    } else {
        execute_parallel(registry, ctx, plan, opts, progress)
    };
    progress.on_complete();

    for (change, result) in plan.changes.iter().zip(results) {
        report.summary.add_result(&result);
        report.results.push((change.address.clone(), result));
    }
    report
}

/// Execute changes in parallel using rayon
fn execute_parallel(
    registry: &Registry,
    ctx: &ReconcileContext<'_>,
    plan: &ExecutionPlan,
    opts: &ExecuteOptions,
    progress: &dyn ProgressCallback,
) -> Vec<ApplyResult> {
    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(opts.jobs)
        .build()
    {
        Ok(pool) => pool,
        Err(e) => {
            log::warn!("Failed to create thread pool ({e}), applying sequentially");
            return plan
                .changes
                .iter()
                .map(|change| run_one(registry, ctx, change, opts, progress))
                .collect();
        }
    };

    let results: Arc<Mutex<Vec<(usize, ApplyResult)>>> =
        Arc::new(Mutex::new(Vec::with_capacity(plan.changes.len())));

    pool.install(|| {
        plan.changes.par_iter().enumerate().for_each(|(index, change)| {
            let result = run_one(registry, ctx, change, opts, progress);
            push_result(&results, index, result);
        });
    });

    into_results(&results)
}

fn push_result(results: &Mutex<Vec<(usize, ApplyResult)>>, index: usize, result: ApplyResult) {
    results
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push((index, result));
}

/// Drain collected results back into plan order
fn into_results(results: &Mutex<Vec<(usize, ApplyResult)>>) -> Vec<ApplyResult> {
    let mut collected: Vec<(usize, ApplyResult)> = results
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .drain(..)
        .collect();
    collected.sort_by_key(|(index, _)| *index);
    collected.into_iter().map(|(_, result)| result).collect()
}

fn run_one(
    registry: &Registry,
    ctx: &ReconcileContext<'_>,
    change: &PlannedChange,
    opts: &ExecuteOptions,
    progress: &dyn ProgressCallback,
) -> ApplyResult {
    if !change.action.is_change() {
        return ApplyResult::NoChange;
    }

    let address = change.address.to_string();
    progress.on_resource_start(&address, change.action.verb());
    let result = apply_change(registry, ctx, change, opts.dry_run);
    if let ApplyResult::Failed { error, .. } = &result {
        log::error!("{address}: {error}");
    }
    progress.on_resource_complete(&address, &result);
    result
}

/// Apply a single planned change
pub fn apply_change(
    registry: &Registry,
    ctx: &ReconcileContext<'_>,
    change: &PlannedChange,
    dry_run: bool,
) -> ApplyResult {
    if dry_run {
        return ApplyResult::Skipped {
            reason: "dry run".to_string(),
        };
    }
    if ctx.cancel.is_cancelled() {
        return ApplyResult::Skipped {
            reason: "cancelled".to_string(),
        };
    }

    let reconciler = match registry.reconciler(&change.address.kind) {
        Ok(reconciler) => reconciler,
        Err(e) => {
            return ApplyResult::Failed {
                error: e.to_string(),
                id: change.action.id().map(str::to_string),
            };
        }
    };

    match &change.action {
        Action::Create { spec } => match reconciler.create(ctx, spec) {
            Ok(state) => ApplyResult::Created(state),
            Err(e) => ApplyResult::Failed {
                id: e.remote_id().map(str::to_string),
                error: e.to_string(),
            },
        },
        Action::Update {
            desired,
            last_known,
            ..
        } => match reconciler.update(ctx, &last_known.id, desired, last_known) {
            Ok(state) => ApplyResult::Modified(state),
            Err(e) => ApplyResult::Failed {
                error: e.to_string(),
                id: Some(last_known.id.clone()),
            },
        },
        Action::Replace { id, desired, .. } => {
            if let Err(e) = reconciler.delete(ctx, id) {
                return ApplyResult::Failed {
                    error: e.to_string(),
                    id: Some(id.clone()),
                };
            }
            match reconciler.create(ctx, desired) {
                Ok(state) => ApplyResult::Replaced(state),
                Err(e) => ApplyResult::Failed {
                    id: e.remote_id().map(str::to_string),
                    error: e.to_string(),
                },
            }
        }
        Action::Delete { id } => match reconciler.delete(ctx, id) {
            Ok(()) => ApplyResult::Removed,
            Err(e) => ApplyResult::Failed {
                error: e.to_string(),
                id: Some(id.clone()),
            },
        },
        Action::NoOp { .. } => ApplyResult::NoChange,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Method, MockClient};
    use crate::context::{CancelToken, NoProgress};
    use crate::error::RemoteError;
    use crate::planner::{Declared, Tracked};
    use crate::poller::PollConfig;
    use crate::schema::{AttributeDescriptor, ResourceSchema};
    use crate::types::{AttrType, RemoteResourceState, ResourceSpec, Status};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const COLLECTION: &str = "/cloud/project/vault/cluster";

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .register(
                ResourceSchema::new("vault_cluster", COLLECTION)
                    .attribute(AttributeDescriptor::required("name", AttrType::String).force_new())
                    .attribute(AttributeDescriptor::required("region", AttrType::String).force_new())
                    .attribute(AttributeDescriptor::required("node_count", AttrType::Int)),
            )
            .unwrap();
        registry
    }

    fn spec(name: &str, region: &str) -> ResourceSpec {
        ResourceSpec::new()
            .with("name", name)
            .with("region", region)
            .with("node_count", 3)
    }

    fn ctx(client: &MockClient) -> ReconcileContext<'_> {
        ReconcileContext::new(client).with_poll(PollConfig::new(
            Duration::from_millis(5),
            Duration::from_secs(5),
        ))
    }

    fn ready(id: &str, name: &str, region: &str) -> serde_json::Value {
        json!({"id": id, "name": name, "region": region, "nodeCount": 3, "status": "READY"})
    }

    #[derive(Default)]
    struct Counting {
        started: AtomicUsize,
        completed: AtomicUsize,
    }

    impl ProgressCallback for Counting {
        fn on_start(&self, _count: usize) {}
        fn on_resource_start(&self, _address: &str, _action: &str) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }
        fn on_resource_complete(&self, _address: &str, _result: &ApplyResult) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
        fn on_complete(&self) {}
    }

    #[test]
    fn test_push_result_handles_poisoned_mutex() {
        let results: Arc<Mutex<Vec<(usize, ApplyResult)>>> = Arc::new(Mutex::new(Vec::new()));
        let poisoned = Arc::clone(&results);

        let _ = std::thread::spawn(move || {
            let mut guard = poisoned
                .lock()
                .expect("lock should succeed before poisoning");
            guard.push((1, ApplyResult::Removed));
            panic!("intentional poison");
        })
        .join();

        push_result(&results, 0, ApplyResult::NoChange);

        let collected = into_results(&results);
        assert_eq!(collected, vec![ApplyResult::NoChange, ApplyResult::Removed]);
    }

    #[test]
    fn test_execute_empty_plan() {
        let client = MockClient::new();
        let report = execute(
            &registry(),
            &ctx(&client),
            &ExecutionPlan::new(),
            &ExecuteOptions::default(),
            &NoProgress,
        );
        assert_eq!(report.summary.total(), 0);
        assert!(client.requests().is_empty());
    }

    #[test]
    fn test_execute_creates_in_parallel() {
        let registry = registry();
        let client = MockClient::new();
        client.sequence(
            Method::Post,
            COLLECTION,
            vec![Ok(json!({"id": "one"})), Ok(json!({"id": "two"}))],
        );
        client.on(Method::Get, &format!("{COLLECTION}/one"), ready("one", "a", "eu"));
        client.on(Method::Get, &format!("{COLLECTION}/two"), ready("two", "b", "eu"));

        let declared = vec![
            Declared {
                address: Address::new("vault_cluster", "a"),
                spec: spec("a", "eu"),
            },
            Declared {
                address: Address::new("vault_cluster", "b"),
                spec: spec("b", "eu"),
            },
        ];
        let plan = ExecutionPlan::build(&registry, &declared, &[]).unwrap();
        let progress = Counting::default();

        let report = execute(
            &registry,
            &ctx(&client),
            &plan,
            &ExecuteOptions::default(),
            &progress,
        );

        assert_eq!(report.summary.created, 2);
        assert!(report.summary.is_success());
        assert_eq!(report.results[0].0.name, "a");
        assert_eq!(progress.started.load(Ordering::SeqCst), 2);
        assert_eq!(progress.completed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_replace_deletes_then_creates() {
        let registry = registry();
        let client = MockClient::new();
        client.on(Method::Delete, &format!("{COLLECTION}/old"), serde_json::Value::Null);
        client.on(Method::Post, COLLECTION, json!({"id": "new"}));
        client.on(
            Method::Get,
            &format!("{COLLECTION}/new"),
            ready("new", "a", "eu-central-1"),
        );

        let tracked = vec![Tracked {
            address: Address::new("vault_cluster", "a"),
            state: RemoteResourceState::new("old", Status::Ready, spec("a", "eu-west-1")),
        }];
        let declared = vec![Declared {
            address: Address::new("vault_cluster", "a"),
            spec: spec("a", "eu-central-1"),
        }];
        let plan = ExecutionPlan::build(&registry, &declared, &tracked).unwrap();

        let report = execute(
            &registry,
            &ctx(&client),
            &plan,
            &ExecuteOptions::default(),
            &NoProgress,
        );

        assert_eq!(report.summary.replaced, 1);
        assert_eq!(report.results[0].1.state().unwrap().id, "new");
        let methods: Vec<Method> = client.requests().iter().map(|r| r.method).collect();
        assert_eq!(methods[0], Method::Delete);
        assert_eq!(methods[1], Method::Post);
    }

    #[test]
    fn test_failure_after_create_keeps_id() {
        let registry = registry();
        let client = MockClient::new();
        client.on(Method::Post, COLLECTION, json!({"id": "broken"}));
        client.on(
            Method::Get,
            &format!("{COLLECTION}/broken"),
            json!({"id": "broken", "status": "FAILED"}),
        );
        let declared = vec![Declared {
            address: Address::new("vault_cluster", "a"),
            spec: spec("a", "eu"),
        }];
        let plan = ExecutionPlan::build(&registry, &declared, &[]).unwrap();

        let report = execute(
            &registry,
            &ctx(&client),
            &plan,
            &ExecuteOptions::default(),
            &NoProgress,
        );

        assert_eq!(report.summary.failed, 1);
        assert!(matches!(
            &report.results[0].1,
            ApplyResult::Failed { id: Some(id), .. } if id == "broken"
        ));
    }

    #[test]
    fn test_delete_failure_is_reported() {
        let registry = registry();
        let client = MockClient::new();
        client.fail(
            Method::Delete,
            &format!("{COLLECTION}/x"),
            RemoteError::Status {
                code: 409,
                message: "locked".into(),
            },
        );
        let tracked = vec![Tracked {
            address: Address::new("vault_cluster", "a"),
            state: RemoteResourceState::new("x", Status::Ready, spec("a", "eu")),
        }];

        let report = execute(
            &registry,
            &ctx(&client),
            &ExecutionPlan::destroy(&tracked),
            &ExecuteOptions::default(),
            &NoProgress,
        );
        assert!(!report.summary.is_success());
    }

    #[test]
    fn test_dry_run_and_cancel_skip() {
        let registry = registry();
        let client = MockClient::new();
        let tracked = vec![Tracked {
            address: Address::new("vault_cluster", "a"),
            state: RemoteResourceState::new("x", Status::Ready, spec("a", "eu")),
        }];
        let plan = ExecutionPlan::destroy(&tracked);

        let dry = ExecuteOptions {
            dry_run: true,
            ..ExecuteOptions::default()
        };
        let report = execute(&registry, &ctx(&client), &plan, &dry, &NoProgress);
        assert_eq!(report.summary.skipped, 1);

        let cancel = CancelToken::new();
        cancel.cancel();
        let cancelled = ctx(&client).with_cancel(cancel);
        let report = execute(
            &registry,
            &cancelled,
            &plan,
            &ExecuteOptions::default(),
            &NoProgress,
        );
        assert_eq!(report.summary.skipped, 1);
        assert!(client.requests().is_empty());
    }
}
