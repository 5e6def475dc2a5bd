//! Detection and recovery core for Bluetooth headsets stuck in the
//! low-quality call profile.
//!
//! The crate owns the domain model and every decision the tool makes; the
//! CLI only builds a [`RecoveryConfig`] and renders what comes back:
//!
//! - **[`Orchestrator`]**: Facade exposing
//!   [`run_recovery()`](Orchestrator::run_recovery),
//!   [`probe_status()`](Orchestrator::probe_status) and
//!   [`discover_devices()`](Orchestrator::discover_devices).
//!
//! - **[`StatusProber`]**: Reconciles the control tool, the system
//!   inventory and the audio-output list into one [`ConnectionState`].
//!   Tool output parsing lives in [`probe::parse`].
//!
//! - **[`RecoverySequencer`]**: The disconnect → wait → reconnect → wait
//!   → verify state machine with bounded retries and cancellation.
//!
//! - **[`FallbackSelector`]**: Alternate strategies, least invasive first,
//!   in `smart` or `exhaustive` mode.
//!
//! - **[`CommandRunner`]**: The seam to the outside world. Production code
//!   uses [`SystemRunner`]; tests script it.

pub mod action;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fallback;
pub mod model;
pub mod orchestrator;
pub mod probe;
pub mod runner;
pub mod sequencer;

// ── Primary re-exports ──────────────────────────────────────────────
pub use action::ActionExecutor;
pub use config::{FallbackMode, PhaseDurations, RecoveryConfig, ToolPaths, default_name_hints};
pub use discovery::DeviceDiscovery;
pub use error::CoreError;
pub use fallback::{FallbackOutcome, FallbackSelector, manual_guidance};
pub use orchestrator::Orchestrator;
pub use probe::{FormatCache, ProbeSummary, StatusProber};
pub use runner::{CommandOutput, CommandRunner, CommandStatus, SystemRunner};
pub use sequencer::{RecoverySequencer, SequenceOutcome};

pub use model::{
    ActionResult, ActionStatus, AttemptOutcome, BluetoothAction, Confidence, ConnectionHint,
    ConnectionState, DeviceIdentity, DiscoveredDevice, FailureReason, MacAddress, MacFormat,
    Phase, PhaseTransition, ProbeResult, ProbeSource, ProfileHint, RecoveryAttempt,
    RecoveryMethod, RecoveryReport, StatusReport, StrategyKind, StrategyReport, StrategyStatus,
};
