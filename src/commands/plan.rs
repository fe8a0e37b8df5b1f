//! `hashistack plan` - preview what apply would change

use anyhow::Result;
use declarative::ExecutionPlan;

use super::Session;
use crate::engine;
use crate::state::StateStore;
use crate::ui;

/// Build the convergence plan for the manifest against the state
pub fn build(session: &Session, state: &StateStore, target: Option<&str>) -> Result<ExecutionPlan> {
    let manifest = session.load_manifest()?;
    let tracked = state.tracked(&session.registry);
    let plan = ExecutionPlan::build(&session.registry, &manifest.resources, &tracked)?
        .filter_by_target(target);
    log::debug!("Plan has {} addresses", plan.changes.len());
    Ok(plan)
}

pub fn run(session: &Session, target: Option<&str>) -> Result<()> {
    let state = session.load_state()?;
    let plan = build(session, &state, target)?;

    if plan.changes.is_empty()
        && let Some(target) = target
    {
        ui::warn(&format!("No resources match '{target}'"));
    }
    engine::display_plan(&plan);
    Ok(())
}
