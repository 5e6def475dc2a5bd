// ── Domain model ──
//
// Every type here is transient: built during one invocation, rendered by
// the CLI, and dropped at exit.

pub mod action;
pub mod attempt;
pub mod device;
pub mod mac;
pub mod report;
pub mod state;
pub mod strategy;

pub use action::{ActionResult, ActionStatus, BluetoothAction};
pub use attempt::{AttemptOutcome, FailureReason, Phase, PhaseTransition, RecoveryAttempt};
pub use device::{ConnectionHint, DeviceIdentity, DiscoveredDevice, StatusReport};
pub use mac::{MacAddress, MacFormat};
pub use report::{RecoveryMethod, RecoveryReport};
pub use state::{Confidence, ConnectionState, ProbeResult, ProbeSource, ProfileHint};
pub use strategy::{StrategyKind, StrategyReport, StrategyStatus};
