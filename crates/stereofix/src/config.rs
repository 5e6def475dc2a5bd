//! CLI configuration: thin wrapper around `stereofix_config`.
//!
//! Re-exports the shared types and layers `GlobalOpts` and `fix` flags
//! over the profile. Precedence is flag > profile > `[defaults]`.

use std::time::Duration;

use stereofix_core::{FallbackMode, MacAddress, RecoveryConfig};

use crate::cli::{FallbackModeArg, FixArgs, GlobalOpts};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use stereofix_config::{
    Config, DeviceProfile, config_path, load_config, load_config_or_default, parse_address,
    save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

impl From<FallbackModeArg> for FallbackMode {
    fn from(arg: FallbackModeArg) -> Self {
        match arg {
            FallbackModeArg::Smart => Self::Smart,
            FallbackModeArg::Exhaustive => Self::Exhaustive,
        }
    }
}

/// Resolve the profile name `config set` and friends operate on.
pub fn active_device_name(global: &GlobalOpts, config: &Config) -> String {
    config
        .active_device_name(global.device.as_deref())
        .unwrap_or("default")
        .to_owned()
}

/// Build the recovery settings for `status` / `discover`.
pub fn recovery_config(global: &GlobalOpts) -> Result<RecoveryConfig, CliError> {
    let cfg = load_config()?;
    resolve(&cfg, global, None)
}

/// Build the recovery settings for `fix`.
pub fn fix_config(global: &GlobalOpts, args: &FixArgs) -> Result<RecoveryConfig, CliError> {
    let cfg = load_config()?;
    resolve(&cfg, global, Some(args))
}

/// Layer CLI flags over the profile selected by `--device`.
pub fn resolve(
    cfg: &Config,
    global: &GlobalOpts,
    fix: Option<&FixArgs>,
) -> Result<RecoveryConfig, CliError> {
    let mut rc = cfg.recovery_config(global.device.as_deref())?;

    if let Some(secs) = global.timeout {
        rc.durations.command_timeout = Duration::from_secs(secs);
    }

    let Some(args) = fix else {
        return Ok(rc);
    };

    if let Some(ref raw) = args.address {
        rc.address = Some(MacAddress::parse(raw)?);
        // A different address than the profile's: the profile name no
        // longer describes the target.
        if args.name.is_none() {
            rc.name = None;
        }
    }
    if let Some(ref name) = args.name {
        rc.name = Some(name.clone());
    }
    if let Some(n) = args.attempts {
        rc.max_attempts = n;
    }
    if let Some(wait) = args.disconnect_wait {
        rc.durations.disconnect_wait = wait;
    }
    if let Some(wait) = args.reconnect_wait {
        rc.durations.reconnect_wait = wait;
    }
    if args.no_fallback {
        rc.enable_fallbacks = false;
    }
    if let Some(mode) = args.fallback_mode {
        rc.fallback_mode = mode.into();
    }
    rc.dry_run = args.dry_run;

    Ok(rc)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::cli::{ColorMode, OutputFormat};

    fn global(device: Option<&str>) -> GlobalOpts {
        GlobalOpts {
            device: device.map(str::to_owned),
            output: OutputFormat::Table,
            color: ColorMode::Never,
            verbose: 0,
            quiet: false,
            timeout: None,
        }
    }

    fn fix_args() -> FixArgs {
        FixArgs {
            address: None,
            name: None,
            attempts: None,
            disconnect_wait: None,
            reconnect_wait: None,
            no_fallback: false,
            fallback_mode: None,
            dry_run: false,
        }
    }

    fn config_with_desk() -> Config {
        let mut cfg = Config::default();
        cfg.devices.insert(
            "desk".into(),
            DeviceProfile {
                address: Some("AA:BB:CC:DD:EE:FF".into()),
                name: Some("WH-1000XM4".into()),
                max_attempts: Some(5),
                ..DeviceProfile::default()
            },
        );
        cfg
    }

    #[test]
    fn flags_override_the_profile() {
        let args = FixArgs {
            attempts: Some(2),
            disconnect_wait: Some(Duration::from_millis(1500)),
            no_fallback: true,
            fallback_mode: Some(FallbackModeArg::Exhaustive),
            dry_run: true,
            ..fix_args()
        };
        let mut opts = global(Some("desk"));
        opts.timeout = Some(4);

        let rc = resolve(&config_with_desk(), &opts, Some(&args)).unwrap();

        assert_eq!(rc.max_attempts, 2);
        assert_eq!(rc.durations.disconnect_wait, Duration::from_millis(1500));
        assert_eq!(rc.durations.command_timeout, Duration::from_secs(4));
        assert!(!rc.enable_fallbacks);
        assert_eq!(rc.fallback_mode, FallbackMode::Exhaustive);
        assert!(rc.dry_run);
        assert_eq!(rc.name.as_deref(), Some("WH-1000XM4"));
    }

    #[test]
    fn profile_applies_without_flags() {
        let rc = resolve(&config_with_desk(), &global(Some("desk")), Some(&fix_args())).unwrap();
        assert_eq!(rc.max_attempts, 5);
        assert_eq!(rc.address.unwrap().to_string(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn explicit_address_drops_the_profile_name() {
        let args = FixArgs {
            address: Some("11-22-33-44-55-66".into()),
            ..fix_args()
        };
        let rc = resolve(&config_with_desk(), &global(Some("desk")), Some(&args)).unwrap();
        assert_eq!(rc.address.unwrap().to_string(), "11:22:33:44:55:66");
        assert_eq!(rc.name, None);
    }

    #[test]
    fn malformed_address_flag_is_a_usage_error() {
        let args = FixArgs {
            address: Some("not-an-address".into()),
            ..fix_args()
        };
        let err = resolve(&Config::default(), &global(None), Some(&args)).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::exit_code::USAGE);
    }

    #[test]
    fn unknown_device_profile_is_not_found() {
        let err = resolve(&Config::default(), &global(Some("car")), None).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::exit_code::NOT_FOUND);
    }
}
