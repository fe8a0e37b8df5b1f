// Planning and applying
pub mod apply;
pub mod destroy;
pub mod plan;

// Inspecting and adopting
pub mod import;
pub mod kinds;
pub mod list;
pub mod show;

use anyhow::{Context as _, Result, bail};
use controlplane::HttpClient;
use declarative::{
    Address, CancelToken, PollConfig, PollObserver, ReconcileContext, Registry, RemoteClient,
};
use std::path::PathBuf;

use crate::Context;
use crate::config::Settings;
use crate::manifest::Manifest;
use crate::resource;
use crate::state::StateStore;

/// Everything a command needs to talk to the control plane
pub struct Session {
    pub registry: Registry,
    pub client: Box<dyn RemoteClient>,
    pub poll: PollConfig,
    pub jobs: usize,
    pub cancel: CancelToken,
    pub manifest_path: PathBuf,
    pub state_path: PathBuf,
    pub quiet: bool,
}

impl Session {
    /// Load settings and connect to the configured endpoint
    pub fn open(ctx: &Context) -> Result<Self> {
        let settings = Settings::load(ctx.config.as_deref())?;
        let registry = resource::registry()?;
        let client = HttpClient::with_timeout(&settings.endpoint, settings.request_timeout())
            .context("Invalid endpoint in configuration")?;
        let state_path = match &ctx.state {
            Some(path) => path.clone(),
            None => settings.state_path()?,
        };
        log::info!("Using {} with state at {}", client.base_url(), state_path.display());

        Ok(Self {
            registry,
            client: Box::new(client),
            poll: settings.poll_config(),
            jobs: settings.jobs,
            cancel: ctx.cancel.clone(),
            manifest_path: ctx.manifest.clone(),
            state_path,
            quiet: ctx.quiet,
        })
    }

    /// Context for reconciler calls
    pub fn context(&self) -> ReconcileContext<'_> {
        ReconcileContext::new(self.client.as_ref())
            .with_poll(self.poll)
            .with_cancel(self.cancel.clone())
    }

    /// Context for reconciler calls, reporting polls to `observer`
    pub fn reconcile_context<'a>(&'a self, observer: &'a dyn PollObserver) -> ReconcileContext<'a> {
        self.context().with_observer(observer)
    }

    pub fn load_manifest(&self) -> Result<Manifest> {
        Manifest::load(&self.manifest_path, &self.registry)
    }

    pub fn load_state(&self) -> Result<StateStore> {
        StateStore::load(&self.state_path)
    }

    pub fn save_state(&self, state: &StateStore) -> Result<()> {
        state.save(&self.state_path)
    }
}

/// Parse a `kind.name` address for a registered kind
pub fn parse_address(registry: &Registry, address: &str) -> Result<Address> {
    let Some(parsed) = Address::parse(address) else {
        bail!("Invalid address '{address}' (expected <kind>.<name>)");
    };
    registry.schema(&parsed.kind)?;
    Ok(parsed)
}
