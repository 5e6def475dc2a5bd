//! Clap derive structures for the `stereofix` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// stereofix -- bring a Bluetooth headset back to stereo audio
#[derive(Debug, Parser)]
#[command(
    name = "stereofix",
    version,
    about = "Restore high-quality stereo audio on a Bluetooth headset",
    long_about = "Detects a headset stuck in the low-quality call profile and forces\n\
        the audio stack to renegotiate by cycling the connection, falling back\n\
        to alternate strategies when a plain reconnect does not help.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Device profile to use
    #[arg(long, short = 'd', env = "STEREOFIX_DEVICE", global = true)]
    pub device: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "STEREOFIX_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Per-command timeout in seconds (overrides config)
    #[arg(long, env = "STEREOFIX_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FallbackModeArg {
    /// Only the least invasive strategy that can run
    Smart,
    /// Every available strategy in order until one works
    Exhaustive,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Detect the call profile and cycle the connection until stereo returns
    #[command(alias = "f")]
    Fix(FixArgs),

    /// Show the connection state of a headset
    #[command(alias = "st")]
    Status(StatusArgs),

    /// List known Bluetooth devices
    #[command(alias = "ls")]
    Discover(DiscoverArgs),

    /// Manage CLI configuration and device profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  FIX
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct FixArgs {
    /// Headset address (overrides the profile)
    #[arg(long, short = 'a')]
    pub address: Option<String>,

    /// Headset name as shown in the audio output list
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Maximum disconnect/reconnect cycles
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub attempts: Option<u32>,

    /// Wait after disconnecting (e.g. "3s", "1500ms")
    #[arg(long, value_parser = humantime::parse_duration)]
    pub disconnect_wait: Option<Duration>,

    /// Wait after reconnecting before verifying
    #[arg(long, value_parser = humantime::parse_duration)]
    pub reconnect_wait: Option<Duration>,

    /// Stop after the primary cycle; never try fallback strategies
    #[arg(long)]
    pub no_fallback: bool,

    /// How fallback strategies are selected
    #[arg(long)]
    pub fallback_mode: Option<FallbackModeArg>,

    /// Walk every phase and log intended actions without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  STATUS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Headset address (defaults to the active profile's address)
    pub address: Option<String>,

    /// Include every probe source's answer
    #[arg(long)]
    pub detailed: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DISCOVER
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DiscoverArgs {
    /// Only devices whose name contains this text (repeatable)
    #[arg(long = "match", short = 'm')]
    pub matches: Vec<String>,

    /// Only devices that are currently connected
    #[arg(long)]
    pub connected: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create a device profile with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a configuration value
    Set {
        /// Config key: a device field ("address", "name", "max_attempts")
        /// or a global one prefixed with "defaults." or "tools."
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured device profiles
    Devices,

    /// Set the default device profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Print the config file location
    Path,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
