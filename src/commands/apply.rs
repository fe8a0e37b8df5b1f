//! `hashistack apply` - converge remote resources towards the manifest

use anyhow::{Result, bail};

use super::{Session, plan};
use crate::engine::{self, ApplyOptions};

pub fn run(
    session: &Session,
    target: Option<&str>,
    yes: bool,
    dry_run: bool,
    jobs: Option<usize>,
) -> Result<()> {
    let mut state = session.load_state()?;
    let plan = plan::build(session, &state, target)?;

    let opts = ApplyOptions {
        yes,
        dry_run,
        jobs: jobs.unwrap_or(session.jobs).max(1),
    };
    let summary = engine::execute(session, &plan, &mut state, &opts)?;

    if !summary.is_success() {
        bail!("{} of {} changes failed", summary.failed, summary.total_changes() + summary.failed);
    }
    Ok(())
}
