mod cli;
mod commands;
mod config;
mod engine;
mod manifest;
mod progress;
mod resource;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{ApplyArgs, Cli, Command};
use commands::Session;
use declarative::CancelToken;
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    pub config: Option<PathBuf>,
    pub manifest: PathBuf,
    pub state: Option<PathBuf>,
    /// Cancelled on Ctrl-C; interrupts readiness polling
    pub cancel: CancelToken,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        if !handler_token.is_cancelled() {
            ui::warn("Interrupted, stopping after in-flight requests");
        }
        handler_token.cancel();
    }) {
        log::warn!("Could not install Ctrl-C handler: {e}");
    }

    let ctx = Context {
        quiet: cli.quiet,
        config: cli.config,
        manifest: cli.manifest,
        state: cli.state,
        cancel,
    };

    match cli.command {
        Command::Plan { target } => {
            let session = Session::open(&ctx)?;
            commands::plan::run(&session, target.as_deref())
        }
        Command::Apply(ApplyArgs {
            target,
            yes,
            dry_run,
            jobs,
        }) => {
            let session = Session::open(&ctx)?;
            commands::apply::run(&session, target.as_deref(), yes, dry_run, jobs)
        }
        Command::Destroy { target, yes } => {
            let session = Session::open(&ctx)?;
            commands::destroy::run(&session, target.as_deref(), yes)
        }
        Command::Show { address, refresh } => {
            let session = Session::open(&ctx)?;
            commands::show::run(&session, &address, refresh)
        }
        Command::Import { address, id } => {
            let session = Session::open(&ctx)?;
            commands::import::run(&session, &address, &id)
        }
        Command::List {
            kind,
            region,
            status,
        } => {
            let session = Session::open(&ctx)?;
            commands::list::run(&session, &kind, region, status)
        }
        Command::Kinds { kind } => {
            let registry = resource::registry()?;
            commands::kinds::run(&registry, kind.as_deref())
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "hashistack", &mut io::stdout());
            Ok(())
        }
    }
}
