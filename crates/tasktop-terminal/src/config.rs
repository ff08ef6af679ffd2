//! YAML configuration for tasktop.
//!
//! XDG-compliant lookup: `$XDG_CONFIG_HOME/tasktop/config.yaml`, then
//! `~/.config/tasktop/config.yaml`. Every field has a default, so a partial
//! file (or none at all) is valid.

use crate::error::TerminalError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tasktop_core::{
    RepeatTimer, SettingsError, SettingsProvider, DEFAULT_DEADZONE, DEFAULT_INITIAL_DELAY,
    DEFAULT_REPEAT_RATE,
};

/// Shortest accepted refresh interval.
pub const MIN_REFRESH_MS: u64 = 100;
/// Longest accepted refresh interval.
pub const MAX_REFRESH_MS: u64 = 10_000;

/// Gamepad and keyboard repeat schedule, in polling ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepeatConfig {
    /// Ticks a direction must be held before it starts repeating.
    pub initial_delay_ticks: u32,
    /// Ticks between repeats once repeating.
    pub rate_ticks: u32,
}

impl Default for RepeatConfig {
    fn default() -> Self {
        Self {
            initial_delay_ticks: DEFAULT_INITIAL_DELAY,
            rate_ticks: DEFAULT_REPEAT_RATE,
        }
    }
}

/// Input thread settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Terminal event poll interval in milliseconds.
    pub poll_ms: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { poll_ms: 50 }
    }
}

/// Gamepad settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GamepadConfig {
    /// Stick travel ignored around the centre, 0.0-1.0.
    pub deadzone: f32,
}

impl Default for GamepadConfig {
    fn default() -> Self {
        Self {
            deadzone: DEFAULT_DEADZONE,
        }
    }
}

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TasktopConfig {
    /// Refresh interval in milliseconds.
    pub refresh_ms: u64,
    /// Rows shown after filtering and sorting (0 = all).
    pub row_limit: usize,
    /// Hide pids 0-2 and processes owned by privileged accounts.
    pub hide_system_processes: bool,
    /// Hide processes whose executable directory cannot be read.
    pub hide_inaccessible_processes: bool,
    /// Directional repeat schedule.
    pub repeat: RepeatConfig,
    /// Input thread settings.
    pub input: InputConfig,
    /// Gamepad settings.
    pub gamepad: GamepadConfig,
}

impl Default for TasktopConfig {
    fn default() -> Self {
        Self {
            refresh_ms: 500,
            row_limit: 100,
            hide_system_processes: false,
            hide_inaccessible_processes: false,
            repeat: RepeatConfig::default(),
            input: InputConfig::default(),
            gamepad: GamepadConfig::default(),
        }
    }
}

impl TasktopConfig {
    /// XDG-compliant config paths to search, most specific first.
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            if !xdg_config.is_empty() {
                paths.push(PathBuf::from(xdg_config).join("tasktop/config.yaml"));
            }
        }

        if let Ok(home) = std::env::var("HOME") {
            paths.push(PathBuf::from(home).join(".config/tasktop/config.yaml"));
        }

        paths
    }

    /// First existing config file.
    pub fn find() -> Option<PathBuf> {
        Self::config_paths().into_iter().find(|path| path.exists())
    }

    /// Load the first config file found, falling back to defaults. A file
    /// that fails to parse is reported and ignored.
    pub fn load() -> Self {
        match Self::find() {
            Some(path) => Self::load_from_file(&path).unwrap_or_else(|err| {
                tracing::warn!(%err, "using default configuration");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// Load a specific config file.
    pub fn load_from_file(path: &Path) -> Result<Self, TerminalError> {
        let contents =
            fs::read_to_string(path).map_err(|e| TerminalError::config(path, e.to_string()))?;
        let config = Self::parse_yaml(&contents).map_err(|e| TerminalError::config(path, e))?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parse YAML text. Out-of-range values are clamped.
    pub fn parse_yaml(contents: &str) -> Result<Self, String> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str::<Self>(contents)
            .map(Self::normalized)
            .map_err(|e| e.to_string())
    }

    /// Clamp every field into its accepted range.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.refresh_ms = self.refresh_ms.clamp(MIN_REFRESH_MS, MAX_REFRESH_MS);
        self.input.poll_ms = self.input.poll_ms.clamp(10, 1000);
        self.repeat.rate_ticks = self.repeat.rate_ticks.max(1);
        if !self.gamepad.deadzone.is_finite() {
            self.gamepad.deadzone = DEFAULT_DEADZONE;
        }
        self.gamepad.deadzone = self.gamepad.deadzone.clamp(0.0, 0.95);
        self
    }

    /// Refresh interval.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms.clamp(MIN_REFRESH_MS, MAX_REFRESH_MS))
    }

    /// Input poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.input.poll_ms)
    }

    /// A fresh repeat timer on the configured schedule.
    pub fn repeat_timer<D: Copy + PartialEq>(&self) -> RepeatTimer<D> {
        RepeatTimer::new(self.repeat.initial_delay_ticks, self.repeat.rate_ticks)
    }

    /// Documented default configuration file.
    pub fn default_yaml() -> String {
        r"# tasktop configuration file
# Location: ~/.config/tasktop/config.yaml

# Refresh interval in milliseconds (100-10000)
refresh_ms: 500

# Rows shown after filtering and sorting (0 = all)
row_limit: 100

# Filter checkboxes (also toggled from the UI and saved back here)
hide_system_processes: false
hide_inaccessible_processes: false

# Held-direction repeat, in input polling ticks
repeat:
  initial_delay_ticks: 3
  rate_ticks: 1

# Terminal input polling
input:
  poll_ms: 50

# Analog stick deadzone (0.0-0.95)
gamepad:
  deadzone: 0.5
"
        .to_string()
    }
}

// =============================================================================
// File-backed settings
// =============================================================================

/// [`SettingsProvider`] that writes the filter toggles back to the config
/// file whenever one changes.
///
/// Only the toggled key is rewritten; every other line of the file, comments
/// included, is left as the user wrote it. Values overridden for one run
/// (command-line flags) live only in memory and never reach the file.
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
    hide_system: bool,
    hide_inaccessible: bool,
}

impl FileSettings {
    /// Settings persisted to `path`, starting from the toggles in `config`.
    pub fn new(path: impl Into<PathBuf>, config: &TasktopConfig) -> Self {
        Self {
            path: path.into(),
            hide_system: config.hide_system_processes,
            hide_inaccessible: config.hide_inaccessible_processes,
        }
    }

    /// Settings at the first existing config path, or the preferred path
    /// when none exists yet. `None` when no config directory is known.
    pub fn discover(config: &TasktopConfig) -> Option<Self> {
        let path = TasktopConfig::find()
            .or_else(|| TasktopConfig::config_paths().into_iter().next())?;
        Some(Self::new(path, config))
    }

    /// File written on change.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save_key(&self, key: &str, value: bool) -> Result<(), SettingsError> {
        let fail = |message: String| SettingsError(format!("{}: {message}", self.path.display()));

        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(fail(e.to_string())),
        };
        // A file the loader rejected was replaced by defaults in memory;
        // writing now would overwrite what the user has to fix.
        TasktopConfig::parse_yaml(&contents).map_err(fail)?;

        let updated = set_top_level_key(&contents, key, &value.to_string());
        let check = TasktopConfig::parse_yaml(&updated).map_err(fail)?;
        let stored = match key {
            "hide_system_processes" => check.hide_system_processes,
            _ => check.hide_inaccessible_processes,
        };
        if stored != value {
            return Err(fail(format!("could not update `{key}`")));
        }

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| fail(e.to_string()))?;
        }
        fs::write(&self.path, updated).map_err(|e| fail(e.to_string()))?;
        tracing::debug!(path = %self.path.display(), key, value, "settings saved");
        Ok(())
    }
}

/// Replace the line holding top-level `key`, or append one.
fn set_top_level_key(contents: &str, key: &str, value: &str) -> String {
    let entry = format!("{key}: {value}");
    let mut found = false;
    let mut lines: Vec<String> = contents
        .lines()
        .map(|line| {
            let is_key = line
                .strip_prefix(key)
                .is_some_and(|rest| rest.trim_start().starts_with(':'));
            if is_key && !found {
                found = true;
                entry.clone()
            } else {
                line.to_string()
            }
        })
        .collect();
    if !found {
        lines.push(entry);
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

impl SettingsProvider for FileSettings {
    fn hide_system_processes(&self) -> bool {
        self.hide_system
    }

    fn hide_inaccessible_processes(&self) -> bool {
        self.hide_inaccessible
    }

    // The new value is kept for this session even when the write fails.
    fn set_hide_system_processes(&mut self, value: bool) -> Result<(), SettingsError> {
        self.hide_system = value;
        self.save_key("hide_system_processes", value)
    }

    fn set_hide_inaccessible_processes(&mut self, value: bool) -> Result<(), SettingsError> {
        self.hide_inaccessible = value;
        self.save_key("hide_inaccessible_processes", value)
    }
}
