use anyhow::{Context, Result, bail};
use declarative::PollConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variables that override the configured endpoint, in priority order
const ENDPOINT_VARS: &[&str] = &["HASHISTACK_ENDPOINT", "OVH_ENDPOINT"];

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("hashistack"))
}

/// Get the default state directory (~/.local/state/hashistack)
pub fn state_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".local").join("state").join("hashistack"))
}

/// Expand `~` and make a path from a config value
pub fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

// ============================================================================
// Settings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Named endpoint (`ovh-eu`, `ovh-us`, ...) or base URL
    pub endpoint: String,
    /// Timeout for a single API request
    pub request_timeout_secs: u64,
    /// Resources applied concurrently
    pub jobs: usize,
    /// State file location; defaults to the state directory
    pub state_file: Option<String>,
    pub poll: PollSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: "ovh-eu".to_string(),
            request_timeout_secs: controlplane::DEFAULT_TIMEOUT.as_secs(),
            jobs: 4,
            state_file: None,
            poll: PollSettings::default(),
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        let defaults = PollConfig::default();
        Self {
            interval_secs: defaults.interval.as_secs(),
            timeout_secs: defaults.timeout.as_secs(),
        }
    }
}

impl Settings {
    /// Default config file location
    pub fn default_path() -> Result<PathBuf> {
        Ok(config_dir()?.join("config.toml"))
    }

    /// Load settings, then apply environment overrides.
    ///
    /// An explicit path must exist; a missing default file means defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut settings = match explicit {
            Some(path) => Self::load_from(path)?,
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::load_from(&path)?
                } else {
                    log::debug!("No config at {}, using defaults", path.display());
                    Self::default()
                }
            }
        };
        settings.apply_env(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Parse a config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let settings: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(settings)
    }

    /// Override the endpoint from the environment
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for var in ENDPOINT_VARS {
            if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
                log::debug!("Endpoint from {var}");
                self.endpoint = value;
                return;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            bail!("jobs must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be at least 1");
        }
        if self.poll.interval_secs == 0 {
            bail!("poll.interval_secs must be at least 1");
        }
        if self.poll.timeout_secs < self.poll.interval_secs {
            bail!(
                "poll.timeout_secs ({}) is shorter than poll.interval_secs ({})",
                self.poll.timeout_secs,
                self.poll.interval_secs
            );
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig::new(
            Duration::from_secs(self.poll.interval_secs),
            Duration::from_secs(self.poll.timeout_secs),
        )
    }

    /// Resolved state file path
    pub fn state_path(&self) -> Result<PathBuf> {
        match &self.state_file {
            Some(path) => Ok(expand(path)),
            None => Ok(state_dir()?.join("state.toml")),
        }
    }
}
