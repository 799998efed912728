//! Configuration loading and management.
//!
//! This is the adapter's own configuration (where the option file lives,
//! which programs to run). The plugin options themselves live in the
//! settings file, see [`crate::store`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the persisted plugin options.
    pub settings_path: PathBuf,
    /// Notification program, invoked like `notify-send`.
    pub notify_program: PathBuf,
    /// Multiplexer program queried for the active pane.
    pub tmux_program: PathBuf,
    /// Seconds a notification may take before it is abandoned.
    pub notify_timeout_secs: u64,
    /// Seconds a focus or pane probe may take before it is killed.
    pub probe_timeout_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("settings_path", &self.settings_path)
            .field("notify_program", &self.notify_program)
            .field("tmux_program", &self.tmux_program)
            .field("notify_timeout_secs", &self.notify_timeout_secs)
            .field("probe_timeout_secs", &self.probe_timeout_secs)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            settings_path: data_dir.join("settings.json"),
            notify_program: PathBuf::from(mn_core::notify::DEFAULT_NOTIFY_PROGRAM),
            tmux_program: PathBuf::from("tmux"),
            notify_timeout_secs: mn_core::notify::DEFAULT_NOTIFY_TIMEOUT.as_secs(),
            probe_timeout_secs: mn_core::probe::DEFAULT_PROBE_TIMEOUT.as_secs(),
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (MUXNOTIFY_*)
        figment = figment.merge(Env::prefixed("MUXNOTIFY_"));

        figment.extract()
    }

    pub const fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }

    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

/// Returns the platform-specific config directory for muxnotify.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("muxnotify"))
}

/// Returns the platform-specific data directory for muxnotify.
///
/// On Linux: `~/.local/share/muxnotify`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("muxnotify"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_dirs_data_path_ends_with_muxnotify() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "muxnotify");
    }

    #[test]
    fn test_default_config_uses_data_dir_for_settings() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.settings_path, data_dir.join("settings.json"));
        assert_eq!(config.notify_program, PathBuf::from("notify-send"));
        assert_eq!(config.notify_timeout(), Duration::from_secs(20));
        assert_eq!(config.probe_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"settings_path = "/tmp/mn/settings.json""#).unwrap();
        writeln!(file, "probe_timeout_secs = 1").unwrap();
        file.flush().unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();
        assert_eq!(config.settings_path, PathBuf::from("/tmp/mn/settings.json"));
        assert_eq!(config.probe_timeout_secs, 1);
        assert_eq!(config.tmux_program, PathBuf::from("tmux"));
    }
}
