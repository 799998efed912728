//! Plugin options: the host-persisted string store and its typed view.
//!
//! Hosts persist plugin options as flat `name -> string` pairs. The
//! [`ConfigStore`] keeps a local copy of those values, fills gaps from the
//! built-in defaults, and [`Settings`] parses the strings once into typed
//! fields so the decision engine never looks at `"on"`/`"off"` again.

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

use crate::notify::{UnknownUrgency, Urgency};

/// A registered option with its default and help text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: &'static str,
    pub default: &'static str,
    pub description: &'static str,
}

/// Every option the plugin registers, in display order.
pub const OPTIONS: &[OptionSpec] = &[
    OptionSpec {
        name: "enabled",
        default: "on",
        description: "Enable or disable notifications",
    },
    OptionSpec {
        name: "on_highlight",
        default: "on",
        description: "Show notifications when our nick is highlighted even when the channel is active",
    },
    OptionSpec {
        name: "urgency",
        default: "normal",
        description: "Urgency for notified messages (low/normal/critical)",
    },
    OptionSpec {
        name: "icon",
        default: "weechat",
        description: "Icon for notifications (e.g. gtk-dialog-info)",
    },
    OptionSpec {
        name: "term_title",
        default: "",
        description: "Terminal title of the chat client; WeeChat is always matched as well. Use xprop to find WM_NAME",
    },
    OptionSpec {
        name: "mux_path",
        default: "",
        description: "Absolute path of the multiplexer the chat client runs under (e.g. /usr/bin/tmux)",
    },
    OptionSpec {
        name: "xdotool_path",
        default: "/usr/bin/xdotool",
        description: "Absolute path of xdotool (e.g. /usr/bin/xdotool)",
    },
];

/// Looks up a registered option by name.
pub fn option_spec(name: &str) -> Option<&'static OptionSpec> {
    OPTIONS.iter().find(|spec| spec.name == name)
}

/// Errors from the host's persistent option storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing storage failed.
    #[error("settings storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The backing storage held something other than an option map.
    #[error("settings storage is corrupt: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The option was never registered.
    #[error("unknown option: {0}")]
    KeyNotFound(String),
    /// A switch option held something other than `on` or `off`.
    #[error("option {name} must be \"on\" or \"off\", got {value:?}")]
    InvalidSwitch { name: &'static str, value: String },
    /// The urgency option did not name a known urgency level.
    #[error("option urgency is invalid: {0}")]
    InvalidUrgency(#[from] UnknownUrgency),
    /// The host store could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The host's persistent option storage.
///
/// Implemented by whatever the chat client offers for plugin settings; the
/// CLI adapter backs it with a JSON file.
pub trait SettingsStore {
    /// Returns the persisted value, if the option has one.
    fn get(&self, name: &str) -> Option<String>;

    /// Persists a value.
    fn set(&mut self, name: &str, value: &str) -> Result<(), StoreError>;

    /// Whether the host can attach help text to options.
    fn supports_descriptions(&self) -> bool;

    /// Attaches help text to an option.
    fn set_description(&mut self, name: &str, description: &str) -> Result<(), StoreError>;

    /// Whether the option has a persisted value.
    fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// An in-process [`SettingsStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
    descriptions: Option<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store that accepts descriptions.
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
            descriptions: Some(BTreeMap::new()),
        }
    }

    /// Creates an empty store for hosts too old to carry descriptions.
    pub fn without_descriptions() -> Self {
        Self::default()
    }

    /// Returns the attached description for an option.
    pub fn description(&self, name: &str) -> Option<&str> {
        self.descriptions.as_ref()?.get(name).map(String::as_str)
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn supports_descriptions(&self) -> bool {
        self.descriptions.is_some()
    }

    fn set_description(&mut self, name: &str, description: &str) -> Result<(), StoreError> {
        if let Some(descriptions) = &mut self.descriptions {
            descriptions.insert(name.to_string(), description.to_string());
        }
        Ok(())
    }
}

/// One row of [`ConfigStore::entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionEntry<'a> {
    pub name: &'static str,
    pub value: &'a str,
    pub default: &'static str,
    pub description: &'static str,
}

/// Local copy of every registered option's current value.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    values: BTreeMap<&'static str, String>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self {
            values: OPTIONS
                .iter()
                .map(|spec| (spec.name, spec.default.to_string()))
                .collect(),
        }
    }
}

impl ConfigStore {
    /// Creates a store holding the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes the host store and loads the result.
    pub fn load<S: SettingsStore>(host: &mut S) -> Result<Self, ConfigError> {
        let mut store = Self::new();
        store.initialize(host)?;
        store.refresh(host)?;
        Ok(store)
    }

    /// Fills options missing from the host store with their defaults.
    ///
    /// Existing host values are never overwritten, so calling this twice is
    /// a no-op the second time. Descriptions are attached only when the host
    /// supports them.
    pub fn initialize<S: SettingsStore>(&mut self, host: &mut S) -> Result<(), ConfigError> {
        let with_descriptions = host.supports_descriptions();
        for spec in OPTIONS {
            if !host.is_set(spec.name) {
                tracing::debug!(option = spec.name, default = spec.default, "filling default");
                host.set(spec.name, spec.default)?;
            }
            if with_descriptions {
                let description = format!("{} (default: \"{}\")", spec.description, spec.default);
                host.set_description(spec.name, &description)?;
            }
        }
        Ok(())
    }

    /// Re-reads every option from the host store.
    pub fn refresh<S: SettingsStore>(&mut self, host: &S) -> Result<(), ConfigError> {
        for spec in OPTIONS {
            let value = host.get(spec.name).unwrap_or_else(|| spec.default.to_string());
            self.values.insert(spec.name, value);
        }
        Ok(())
    }

    /// Returns the current value of an option.
    pub fn get(&self, name: &str) -> Result<&str, ConfigError> {
        self.values
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::KeyNotFound(name.to_string()))
    }

    /// Writes an option through to the host store and the local copy.
    pub fn set<S: SettingsStore>(
        &mut self,
        host: &mut S,
        name: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let spec = option_spec(name).ok_or_else(|| ConfigError::KeyNotFound(name.to_string()))?;
        host.set(spec.name, value)?;
        self.values.insert(spec.name, value.to_string());
        Ok(())
    }

    /// Lists every option in registration order.
    pub fn entries(&self) -> Vec<OptionEntry<'_>> {
        OPTIONS
            .iter()
            .map(|spec| OptionEntry {
                name: spec.name,
                value: self.values.get(spec.name).map_or(spec.default, String::as_str),
                default: spec.default,
                description: spec.description,
            })
            .collect()
    }
}

/// Typed settings parsed once from a [`ConfigStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub enabled: bool,
    pub on_highlight: bool,
    pub urgency: Urgency,
    pub icon: String,
    /// Expected terminal window title; empty means "match the host name only".
    pub term_title: String,
    /// Reserved; parsed but not consulted by the engine.
    pub mux_path: Option<PathBuf>,
    pub xdotool_path: PathBuf,
}

impl Settings {
    /// Parses the store's string values.
    pub fn from_store(store: &ConfigStore) -> Result<Self, ConfigError> {
        let mux_path = store.get("mux_path")?;
        Ok(Self {
            enabled: parse_switch(store, "enabled")?,
            on_highlight: parse_switch(store, "on_highlight")?,
            urgency: store.get("urgency")?.parse()?,
            icon: store.get("icon")?.to_string(),
            term_title: store.get("term_title")?.to_string(),
            mux_path: (!mux_path.is_empty()).then(|| PathBuf::from(mux_path)),
            xdotool_path: PathBuf::from(store.get("xdotool_path")?),
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        // The default table only holds valid values.
        Self {
            enabled: true,
            on_highlight: true,
            urgency: Urgency::Normal,
            icon: "weechat".to_string(),
            term_title: String::new(),
            mux_path: None,
            xdotool_path: PathBuf::from("/usr/bin/xdotool"),
        }
    }
}

fn parse_switch(store: &ConfigStore, name: &'static str) -> Result<bool, ConfigError> {
    match store.get(name)? {
        "on" => Ok(true),
        "off" => Ok(false),
        other => Err(ConfigError::InvalidSwitch {
            name,
            value: other.to_string(),
        }),
    }
}
