//! Shared utilities for CLI commands.

use anyhow::{Context, Result};
use mn_core::{ConfigStore, Settings, SystemProbes};

use crate::Config;
use crate::store::JsonSettingsStore;

/// Opens the settings file and fills missing options with defaults.
pub fn load_options(config: &Config) -> Result<(JsonSettingsStore, ConfigStore)> {
    let mut store = JsonSettingsStore::open(&config.settings_path)
        .with_context(|| format!("failed to open {}", config.settings_path.display()))?;
    let options = ConfigStore::load(&mut store).context("failed to initialize options")?;
    Ok((store, options))
}

/// Loads and parses the typed settings.
pub fn load_settings(config: &Config) -> Result<Settings> {
    let (_store, options) = load_options(config)?;
    let settings = Settings::from_store(&options).context("invalid option value")?;
    tracing::debug!(?settings, "loaded settings");
    Ok(settings)
}

/// The pid the active tmux pane is compared against.
///
/// The host spawns this binary, so by default that is our parent.
pub fn host_pid(explicit: Option<u32>) -> u32 {
    explicit.unwrap_or_else(parent_pid)
}

#[cfg(unix)]
fn parent_pid() -> u32 {
    std::os::unix::process::parent_id()
}

#[cfg(not(unix))]
fn parent_pid() -> u32 {
    std::process::id()
}

/// Probes configured from the CLI configuration.
pub fn system_probes(config: &Config, explicit_pid: Option<u32>) -> SystemProbes {
    SystemProbes::new()
        .with_tmux_program(&config.tmux_program)
        .with_host_pid(host_pid(explicit_pid))
        .with_timeout(config.probe_timeout())
}
