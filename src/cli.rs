use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::manifest::DEFAULT_MANIFEST;

#[derive(Parser)]
#[command(name = "hashistack")]
#[command(version)]
#[command(about = "Declarative lifecycle for managed HashiCorp clusters", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Settings file (default: ~/.config/hashistack/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Manifest declaring the desired resources
    #[arg(short, long, global = true, default_value = DEFAULT_MANIFEST)]
    pub manifest: PathBuf,

    /// State file (overrides the configured one)
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what apply would change
    Plan {
        /// Only plan a kind or a single address (e.g., nomad_cluster.jobs)
        target: Option<String>,
    },

    /// Create, update or replace resources to match the manifest
    Apply(ApplyArgs),

    /// Delete tracked resources
    Destroy {
        /// Only destroy a kind or a single address
        target: Option<String>,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show a tracked resource
    Show {
        /// Resource address (kind.name)
        address: String,

        /// Read the current state from the control plane first
        #[arg(short, long)]
        refresh: bool,
    },

    /// Start tracking an existing remote resource
    Import {
        /// Address to track it under (kind.name)
        address: String,

        /// Remote ID
        id: String,
    },

    /// List remote resources of a kind
    List {
        /// Resource kind (e.g., vault_cluster)
        kind: String,

        /// Only resources in this region
        #[arg(long)]
        region: Option<String>,

        /// Only resources with this status (case-insensitive)
        #[arg(long)]
        status: Option<String>,
    },

    /// Describe supported resource kinds
    Kinds {
        /// Show the attributes of one kind
        kind: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Only apply a kind or a single address
    pub target: Option<String>,

    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Show the plan without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Number of parallel operations (default from settings)
    #[arg(short, long)]
    pub jobs: Option<usize>,
}
