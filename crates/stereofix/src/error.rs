//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use stereofix_config::ConfigError;
use stereofix_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    #[allow(dead_code)]
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const RECOVERY_FAILED: i32 = 9;
    pub const TOOLS_MISSING: i32 = 10;
    pub const INTERRUPTED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Input ────────────────────────────────────────────────────────
    #[error("Invalid Bluetooth address '{input}'")]
    #[diagnostic(
        code(stereofix::invalid_address),
        help(
            "Expected 12 hexadecimal digits, e.g. AA:BB:CC:DD:EE:FF.\n\
             Colons, dashes or no separators are all accepted."
        )
    )]
    InvalidAddress { input: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(stereofix::validation))]
    Validation { field: String, reason: String },

    // ── Devices ──────────────────────────────────────────────────────
    #[error("No Bluetooth device matched {hint}")]
    #[diagnostic(
        code(stereofix::device_not_found),
        help(
            "Run: stereofix discover  to list paired devices,\n\
             then pass --address or save a profile with: stereofix config init"
        )
    )]
    DeviceNotFound { hint: String },

    #[error("Device profile '{name}' not found in configuration")]
    #[diagnostic(
        code(stereofix::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: stereofix config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    // ── Environment ──────────────────────────────────────────────────
    #[error("No {capability} tool is installed (looked for: {tools})")]
    #[diagnostic(
        code(stereofix::tools_missing),
        help(
            "Install the Bluetooth control tool, e.g.: brew install blueutil\n\
             Program names can be changed under [tools] in the config file."
        )
    )]
    ToolsMissing { capability: String, tools: String },

    // ── Recovery ─────────────────────────────────────────────────────
    #[error("{device} is not connected")]
    #[diagnostic(
        code(stereofix::not_connected),
        help("Connect the headset first, then run stereofix fix again.")
    )]
    NotConnected { device: String },

    #[error("Recovery failed: {reason}")]
    #[diagnostic(code(stereofix::recovery_failed), help("{guidance}"))]
    RecoveryFailed { reason: String, guidance: String },

    #[error("Interrupted")]
    #[diagnostic(code(stereofix::interrupted))]
    Interrupted,

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(stereofix::config))]
    Config(Box<figment::Error>),

    #[error("failed to serialize config: {0}")]
    #[diagnostic(code(stereofix::config))]
    ConfigSerialization(#[from] toml::ser::Error),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to render JSON: {0}")]
    #[diagnostic(code(stereofix::json))]
    Json(#[from] serde_json::Error),

    #[error("failed to render YAML: {0}")]
    #[diagnostic(code(stereofix::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidAddress { .. } | Self::Validation { .. } => exit_code::USAGE,
            Self::DeviceNotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::ToolsMissing { .. } => exit_code::TOOLS_MISSING,
            Self::NotConnected { .. } | Self::RecoveryFailed { .. } => exit_code::RECOVERY_FAILED,
            Self::Interrupted => exit_code::INTERRUPTED,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidAddressFormat { input } => CliError::InvalidAddress { input },
            CoreError::InvalidConfig { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::ToolUnavailable { capability, tools } => {
                CliError::ToolsMissing { capability, tools }
            }
            CoreError::DeviceNotResolved { hint } => CliError::DeviceNotFound { hint },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::DeviceNotFound { name, available } => {
                CliError::ProfileNotFound { name, available }
            }
            ConfigError::Serialization(e) => CliError::ConfigSerialization(e),
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}
