//! Configuration for stereofix.
//!
//! TOML file with global defaults, tool program names and named device
//! profiles, layered with `STEREOFIX_*` environment variables, and
//! translated to `stereofix_core::RecoveryConfig`. The CLI applies its
//! flag overrides on top of the result.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stereofix_core::{
    FallbackMode, MacAddress, PhaseDurations, RecoveryConfig, ToolPaths, default_name_hints,
};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("device profile '{name}' not found (available: {available})")]
    DeviceNotFound { name: String, available: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Device profile used when `--device` is not given.
    pub default_device: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// External program names.
    #[serde(default)]
    pub tools: ToolPaths,

    /// Named device profiles.
    #[serde(default)]
    pub devices: HashMap<String, DeviceProfile>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Per-command timeout, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_disconnect_wait")]
    pub disconnect_wait: u64,

    #[serde(default = "default_reconnect_wait")]
    pub reconnect_wait: u64,

    #[serde(default = "default_retry_pause")]
    pub retry_pause: u64,

    #[serde(default = "default_fallback_pause")]
    pub fallback_pause: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_true")]
    pub enable_fallbacks: bool,

    #[serde(default)]
    pub fallback_mode: FallbackMode,

    /// Name fragments for auto-detection when no address is configured.
    #[serde(default = "default_name_hints")]
    pub name_hints: Vec<String>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            disconnect_wait: default_disconnect_wait(),
            reconnect_wait: default_reconnect_wait(),
            retry_pause: default_retry_pause(),
            fallback_pause: default_fallback_pause(),
            max_attempts: default_max_attempts(),
            enable_fallbacks: true,
            fallback_mode: FallbackMode::default(),
            name_hints: default_name_hints(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    10
}
fn default_disconnect_wait() -> u64 {
    3
}
fn default_reconnect_wait() -> u64 {
    2
}
fn default_retry_pause() -> u64 {
    2
}
fn default_fallback_pause() -> u64 {
    1
}
fn default_max_attempts() -> u32 {
    3
}
fn default_true() -> bool {
    true
}

/// A named headset.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct DeviceProfile {
    /// Hardware address in any accepted layout.
    pub address: Option<String>,

    /// Display name as the audio subsystem reports it.
    pub name: Option<String>,

    /// Replaces the global name hints for this device.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name_hints: Vec<String>,

    pub disconnect_wait: Option<u64>,
    pub reconnect_wait: Option<u64>,
    pub max_attempts: Option<u32>,
    pub enable_fallbacks: Option<bool>,
    pub fallback_mode: Option<FallbackMode>,
}

impl Config {
    /// Profile names, sorted.
    pub fn device_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.devices.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The requested profile name, or the configured default.
    pub fn active_device_name<'a>(&'a self, requested: Option<&'a str>) -> Option<&'a str> {
        requested.or(self.default_device.as_deref())
    }

    pub fn device(&self, name: &str) -> Result<&DeviceProfile, ConfigError> {
        self.devices
            .get(name)
            .ok_or_else(|| ConfigError::DeviceNotFound {
                name: name.to_owned(),
                available: self.available_devices(),
            })
    }

    fn available_devices(&self) -> String {
        let names = self.device_names();
        if names.is_empty() {
            "(none)".into()
        } else {
            names.join(", ")
        }
    }

    /// Build the core recovery settings for a profile.
    ///
    /// `device` picks a profile by name; `None` falls back to
    /// `default_device`, and with neither set only the global defaults
    /// apply (auto-detection by name hints). A `default_device` that no
    /// longer exists is ignored so a stale entry does not block `fix`.
    pub fn recovery_config(&self, device: Option<&str>) -> Result<RecoveryConfig, ConfigError> {
        let d = &self.defaults;
        let mut cfg = RecoveryConfig {
            address: None,
            name: None,
            name_hints: d.name_hints.clone(),
            durations: PhaseDurations {
                disconnect_wait: Duration::from_secs(d.disconnect_wait),
                reconnect_wait: Duration::from_secs(d.reconnect_wait),
                retry_pause: Duration::from_secs(d.retry_pause),
                fallback_pause: Duration::from_secs(d.fallback_pause),
                command_timeout: Duration::from_secs(d.timeout),
            },
            max_attempts: d.max_attempts,
            enable_fallbacks: d.enable_fallbacks,
            fallback_mode: d.fallback_mode,
            dry_run: false,
            tools: self.tools.clone(),
        };

        let profile = match device {
            Some(name) => Some((name, self.device(name)?)),
            None => self
                .default_device
                .as_deref()
                .and_then(|name| self.devices.get(name).map(|p| (name, p))),
        };

        if let Some((name, profile)) = profile {
            apply_profile(&mut cfg, name, profile)?;
        }
        Ok(cfg)
    }
}

fn apply_profile(
    cfg: &mut RecoveryConfig,
    name: &str,
    profile: &DeviceProfile,
) -> Result<(), ConfigError> {
    if let Some(ref raw) = profile.address {
        cfg.address = Some(parse_address(raw, &format!("devices.{name}.address"))?);
    }
    cfg.name.clone_from(&profile.name);
    if !profile.name_hints.is_empty() {
        cfg.name_hints.clone_from(&profile.name_hints);
    }
    if let Some(secs) = profile.disconnect_wait {
        cfg.durations.disconnect_wait = Duration::from_secs(secs);
    }
    if let Some(secs) = profile.reconnect_wait {
        cfg.durations.reconnect_wait = Duration::from_secs(secs);
    }
    if let Some(n) = profile.max_attempts {
        cfg.max_attempts = n;
    }
    if let Some(enabled) = profile.enable_fallbacks {
        cfg.enable_fallbacks = enabled;
    }
    if let Some(mode) = profile.fallback_mode {
        cfg.fallback_mode = mode;
    }
    Ok(())
}

/// Parse a hardware address, reporting failures against `field`.
pub fn parse_address(raw: &str, field: &str) -> Result<MacAddress, ConfigError> {
    MacAddress::parse(raw).map_err(|e| ConfigError::Validation {
        field: field.to_owned(),
        reason: e.to_string(),
    })
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "stereofix", "stereofix").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("stereofix");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields the defaults.
///
/// Nested keys use a double underscore:
/// `STEREOFIX_DEFAULTS__MAX_ATTEMPTS=5`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("STEREOFIX_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
