//! TOML-based configuration for the monitor application.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\Brainwave\config.toml`
//! - Linux:    `~/.config/brainwave/config.toml`
//! - macOS:    `~/Library/Application Support/Brainwave/config.toml`
//!
//! A file given with `--config` takes precedence over the platform path.
//!
//! # Example file
//!
//! ```toml
//! [monitor]
//! log_level = "info"
//! idle_interval_ms = 10
//!
//! [source]
//! kind = "device"
//! path = "/dev/rfcomm0"
//! baud_rate = 9600
//!
//! [output]
//! format = "csv"
//! only_with_power = false
//! print_errors = true
//! ```
//!
//! # Serde default values
//!
//! Every field carries `#[serde(default = "...")]`, so an empty section (or
//! a file written by an older version) still loads.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::monitor::MonitorSettings;
use crate::application::output::OutputFormat;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// General loop behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// How long to back off when no bytes are available, in milliseconds.
    /// Also used as the read timeout for TCP sources.
    #[serde(default = "default_idle_interval_ms")]
    pub idle_interval_ms: u64,
    /// Stop after printing this many readings.  Absent means run forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_readings: Option<u64>,
}

/// Where the headset's bytes come from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A serial or Bluetooth RFCOMM device node.
    Device,
    /// A previously captured byte stream.
    File,
    /// Bytes piped into the process.
    Stdin,
    /// A serial-to-TCP bridge.
    Tcp,
}

/// Byte source selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceConfig {
    #[serde(default = "default_source_kind")]
    pub kind: SourceKind,
    /// Device node or capture file, used by `device` and `file`.
    #[serde(default = "default_device_path")]
    pub path: PathBuf,
    /// Serial line speed, used by `device`.
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// `host:port` of the bridge, used by `tcp`.
    #[serde(default = "default_tcp_address")]
    pub address: String,
}

/// How readings are printed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Only print readings whose frame carried power bands.
    #[serde(default)]
    pub only_with_power: bool,
    /// Print rejected frames to stderr in addition to logging them.
    #[serde(default = "default_print_errors")]
    pub print_errors: bool,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_idle_interval_ms() -> u64 {
    10
}
fn default_source_kind() -> SourceKind {
    SourceKind::Device
}
fn default_device_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        PathBuf::from("COM3")
    }
    #[cfg(not(target_os = "windows"))]
    {
        PathBuf::from("/dev/rfcomm0")
    }
}
fn default_baud_rate() -> u32 {
    9600
}
fn default_tcp_address() -> String {
    "127.0.0.1:2000".to_string()
}
fn default_print_errors() -> bool {
    true
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            idle_interval_ms: default_idle_interval_ms(),
            max_readings: None,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: default_source_kind(),
            path: default_device_path(),
            baud_rate: default_baud_rate(),
            address: default_tcp_address(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            only_with_power: false,
            print_errors: default_print_errors(),
        }
    }
}

impl MonitorConfig {
    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }
}

impl AppConfig {
    /// Flattens the loop-related parts of the config for the monitor use case.
    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            format: self.output.format,
            only_with_power: self.output.only_with_power,
            print_errors: self.output.print_errors,
            idle_interval: self.monitor.idle_interval(),
            max_readings: self.monitor.max_readings,
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the full path to the platform config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads `AppConfig` from the platform config file, returning
/// `AppConfig::default()` if the file (or the platform directory) does not
/// exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    match config_file_path() {
        Ok(path) => load_config_from(&path),
        Err(ConfigError::NoPlatformConfigDir) => Ok(AppConfig::default()),
        Err(e) => Err(e),
    }
}

/// Loads `AppConfig` from `path`, returning the defaults if it does not exist.
///
/// # Errors
///
/// Same as [`load_config`].
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Resolves the platform config base directory including the `Brainwave`
/// subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Brainwave"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("brainwave"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Brainwave")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
