//! Progress indicators for the hashistack CLI.

use colored::Colorize;
use declarative::{ApplyResult, Observation, PollObserver, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner with a message
pub fn spinner(msg: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Symbol for a finished resource
pub fn result_symbol(result: &ApplyResult) -> &'static str {
    match result {
        ApplyResult::NoChange => "○",
        ApplyResult::Created(_)
        | ApplyResult::Modified(_)
        | ApplyResult::Replaced(_)
        | ApplyResult::Removed => "✓",
        ApplyResult::Failed { .. } => "✗",
        ApplyResult::Skipped { .. } => "⊘",
    }
}

/// Progress bar for plan execution.
///
/// Also reports readiness polling, which is where most of the time goes.
pub struct ApplyProgress {
    pb: ProgressBar,
}

impl ApplyProgress {
    pub fn new(quiet: bool) -> Self {
        let pb = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=>-"),
            );
            pb
        };
        Self { pb }
    }
}

impl ProgressCallback for ApplyProgress {
    fn on_start(&self, count: usize) {
        self.pb.set_length(count as u64);
        self.pb.enable_steady_tick(Duration::from_millis(100));
    }

    fn on_resource_start(&self, address: &str, action: &str) {
        self.pb.set_message(format!("{action} {address}"));
    }

    fn on_resource_complete(&self, address: &str, result: &ApplyResult) {
        let line = match result {
            ApplyResult::Failed { error, .. } => {
                format!("  {} {address}: {}", "✗".red(), error.red())
            }
            ApplyResult::Skipped { reason } => {
                format!("  {} {address} ({reason})", "⊘".dimmed())
            }
            other => format!("  {} {address}", result_symbol(other).green()),
        };
        self.pb.println(line);
        self.pb.set_message(format!("{} {address}", result_symbol(result)));
        self.pb.inc(1);
    }

    fn on_complete(&self) {
        self.pb.finish_and_clear();
    }
}

impl PollObserver for ApplyProgress {
    fn on_poll(&self, id: &str, attempt: u32, observation: &Observation<'_>) {
        SpinnerObserver::report(&self.pb, id, attempt, observation);
    }
}

/// Reports polling on a standalone spinner
pub struct SpinnerObserver {
    pb: ProgressBar,
}

impl SpinnerObserver {
    pub fn new(pb: ProgressBar) -> Self {
        Self { pb }
    }

    fn report(pb: &ProgressBar, id: &str, attempt: u32, observation: &Observation<'_>) {
        let seen = describe(observation);
        log::debug!("poll {id} #{attempt}: {seen}");
        pb.set_message(format!("waiting for {id}: {seen} (check {attempt})"));
    }
}

impl PollObserver for SpinnerObserver {
    fn on_poll(&self, id: &str, attempt: u32, observation: &Observation<'_>) {
        Self::report(&self.pb, id, attempt, observation);
    }
}

fn describe(observation: &Observation<'_>) -> String {
    match observation {
        Observation::Status { raw: Some(raw), .. } => (*raw).to_string(),
        Observation::Status { status, raw: None } => status.to_string(),
        Observation::Absent => "not visible yet".to_string(),
        Observation::Error(e) => format!("read failed ({e})"),
    }
}
