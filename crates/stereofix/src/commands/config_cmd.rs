//! Config subcommand handlers.

use dialoguer::{Input, Select};

use stereofix_core::{DiscoveredDevice, FallbackMode, MacAddress, Orchestrator, RecoveryConfig};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, DeviceProfile};
use crate::error::CliError;
use crate::output;

use super::util::{self, parse_setting, prompt_err, split_list};

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => init(global).await,

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = output::render_single(
                global.output,
                &cfg,
                |c| {
                    toml::to_string_pretty(c)
                        .unwrap_or_else(|e| format!("failed to render config: {e}"))
                },
                |_| config::config_path().display().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let target = apply_setting(&mut cfg, global, &key, &value)?;
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Set {key} on {target}");
            }
            Ok(())
        }

        // ── Devices ─────────────────────────────────────────────────
        ConfigCommand::Devices => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_device.as_deref().unwrap_or_default();
            if cfg.devices.is_empty() {
                eprintln!("No device profiles configured. Run: stereofix config init");
            } else {
                for name in cfg.device_names() {
                    let marker = if name == default { " *" } else { "" };
                    let address = cfg.devices[name].address.as_deref().unwrap_or("-");
                    println!("{name}{marker}\t{address}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            cfg.device(&name)?;
            cfg.default_device = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Default device set to '{name}'");
            }
            Ok(())
        }

        // ── Path ───────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }
    }
}

// ── Init ────────────────────────────────────────────────────────────

async fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("✨ stereofix device setup");
    eprintln!("   Config path: {}\n", config_path.display());

    let mut cfg = config::load_config_or_default();

    // 1. Device: pick a discovered one or type the address
    let found = discover_for_wizard(&cfg, global.quiet).await;
    let (address, discovered_name) = pick_device(&found)?;

    // 2. Audio name
    let name: String = Input::new()
        .with_prompt("Name in the sound output list")
        .default(discovered_name.unwrap_or_default())
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;
    let name = name.trim().to_owned();

    // 3. Profile name
    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default(profile_slug(&name))
        .interact_text()
        .map_err(prompt_err)?;

    // 4. Fallback mode
    let modes = &[
        "smart (only the least invasive alternative)",
        "exhaustive (try every alternative in turn)",
    ];
    let mode = Select::new()
        .with_prompt("Fallback strategy selection")
        .items(modes)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    cfg.devices.insert(
        profile_name.clone(),
        DeviceProfile {
            address: Some(address.to_string()),
            name: (!name.is_empty()).then_some(name),
            fallback_mode: Some(if mode == 0 {
                FallbackMode::Smart
            } else {
                FallbackMode::Exhaustive
            }),
            ..DeviceProfile::default()
        },
    );
    if cfg.default_device.is_none() {
        cfg.default_device = Some(profile_name.clone());
    }

    let path = config::save_config(&cfg)?;
    eprintln!("\n✓ Profile '{profile_name}' saved to {}", path.display());
    eprintln!("  Run: stereofix fix");
    Ok(())
}

/// Best-effort device listing; setup still works without any tools.
async fn discover_for_wizard(cfg: &Config, quiet: bool) -> Vec<DiscoveredDevice> {
    let rc = RecoveryConfig {
        tools: cfg.tools.clone(),
        ..RecoveryConfig::default()
    };
    let Ok(orchestrator) = Orchestrator::new(rc) else {
        return Vec::new();
    };
    let spinner = util::spinner("Looking for paired devices", quiet);
    let devices = orchestrator.discover_devices().await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    devices
}

fn pick_device(found: &[DiscoveredDevice]) -> Result<(MacAddress, Option<String>), CliError> {
    if !found.is_empty() {
        let mut items: Vec<String> = found
            .iter()
            .map(|d| format!("{} ({}, {})", d.name, d.address, d.connection))
            .collect();
        items.push("Enter an address manually".into());

        let choice = Select::new()
            .with_prompt("Headset")
            .items(&items)
            .default(0)
            .interact()
            .map_err(prompt_err)?;
        if let Some(device) = found.get(choice) {
            return Ok((device.address, Some(device.name.clone())));
        }
    }

    let raw: String = Input::new()
        .with_prompt("Bluetooth address (AA:BB:CC:DD:EE:FF)")
        .validate_with(|s: &String| -> Result<(), String> {
            MacAddress::parse(s).map(|_| ()).map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(prompt_err)?;
    Ok((config::parse_address(&raw, "address")?, None))
}

/// `WH-1000XM4` → `wh-1000xm4`, `Jabra Evolve2 65` → `jabra-evolve2-65`.
fn profile_slug(name: &str) -> String {
    let slug = name
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() { "headset".into() } else { slug }
}

// ── Set ─────────────────────────────────────────────────────────────

/// Apply one `config set` pair. `defaults.*` and `tools.*` keys are
/// global, `devices.<name>.*` targets that profile and a bare field
/// targets the active one. Profiles are created on first use. Returns a
/// label for the confirmation.
fn apply_setting(
    cfg: &mut Config,
    global: &GlobalOpts,
    key: &str,
    value: &str,
) -> Result<String, CliError> {
    // Field names accept dashes; profile names keep theirs.
    let (scope, field) = key.rsplit_once('.').unwrap_or(("", key));
    let field = field.replace('-', "_");

    match scope {
        "defaults" => {
            set_default(cfg, &field, value)?;
            return Ok("[defaults]".into());
        }
        "tools" => {
            set_tool(cfg, &field, value)?;
            return Ok("[tools]".into());
        }
        _ => {}
    }

    let profile_name = match scope.strip_prefix("devices.") {
        Some(name) => name.to_owned(),
        None if scope.is_empty() => config::active_device_name(global, cfg),
        None => return Err(unknown_key(key)),
    };
    let profile = cfg.devices.entry(profile_name.clone()).or_default();
    set_device_field(profile, &field, value)?;
    if cfg.default_device.is_none() {
        cfg.default_device = Some(profile_name.clone());
    }
    Ok(format!("device '{profile_name}'"))
}

fn set_default(cfg: &mut Config, field: &str, value: &str) -> Result<(), CliError> {
    let d = &mut cfg.defaults;
    let key = format!("defaults.{field}");
    match field {
        "output" => {
            if !matches!(value, "table" | "json" | "json-compact" | "yaml" | "plain") {
                return Err(CliError::Validation {
                    field: key,
                    reason: "must be table, json, json-compact, yaml or plain".into(),
                });
            }
            d.output = value.into();
        }
        "color" => {
            if !matches!(value, "auto" | "always" | "never") {
                return Err(CliError::Validation {
                    field: key,
                    reason: "must be auto, always or never".into(),
                });
            }
            d.color = value.into();
        }
        "timeout" => d.timeout = positive_secs(&key, value)?,
        "disconnect_wait" => d.disconnect_wait = parse_setting(&key, value, "seconds")?,
        "reconnect_wait" => d.reconnect_wait = parse_setting(&key, value, "seconds")?,
        "retry_pause" => d.retry_pause = parse_setting(&key, value, "seconds")?,
        "fallback_pause" => d.fallback_pause = parse_setting(&key, value, "seconds")?,
        "max_attempts" => d.max_attempts = attempts(&key, value)?,
        "enable_fallbacks" => d.enable_fallbacks = parse_setting(&key, value, "true or false")?,
        "fallback_mode" => d.fallback_mode = parse_setting(&key, value, "smart or exhaustive")?,
        "name_hints" => d.name_hints = split_list(value),
        other => return Err(unknown_key(&format!("defaults.{other}"))),
    }
    Ok(())
}

fn set_tool(cfg: &mut Config, field: &str, value: &str) -> Result<(), CliError> {
    let t = &mut cfg.tools;
    let slot = match field {
        "control" => &mut t.control,
        "inventory" => &mut t.inventory,
        "audio" => &mut t.audio,
        "alternate" => &mut t.alternate,
        "automation" => &mut t.automation,
        "process_kill" => &mut t.process_kill,
        "user_id" => &mut t.user_id,
        other => return Err(unknown_key(&format!("tools.{other}"))),
    };
    if value.trim().is_empty() {
        return Err(CliError::Validation {
            field: format!("tools.{field}"),
            reason: "program name cannot be empty".into(),
        });
    }
    value.trim().clone_into(slot);
    Ok(())
}

fn set_device_field(profile: &mut DeviceProfile, field: &str, value: &str) -> Result<(), CliError> {
    match field {
        "address" => {
            let address = config::parse_address(value, "address")?;
            profile.address = Some(address.to_string());
        }
        "name" => profile.name = Some(value.to_owned()),
        "name_hints" => profile.name_hints = split_list(value),
        "disconnect_wait" => {
            profile.disconnect_wait = Some(parse_setting(field, value, "seconds")?);
        }
        "reconnect_wait" => profile.reconnect_wait = Some(parse_setting(field, value, "seconds")?),
        "max_attempts" => profile.max_attempts = Some(attempts(field, value)?),
        "enable_fallbacks" => {
            profile.enable_fallbacks = Some(parse_setting(field, value, "true or false")?);
        }
        "fallback_mode" => {
            profile.fallback_mode = Some(parse_setting(field, value, "smart or exhaustive")?);
        }
        other => return Err(unknown_key(other)),
    }
    Ok(())
}

fn attempts(key: &str, value: &str) -> Result<u32, CliError> {
    let n: u32 = parse_setting(key, value, "a whole number")?;
    if n == 0 {
        return Err(CliError::Validation {
            field: key.to_owned(),
            reason: "must be at least 1".into(),
        });
    }
    Ok(n)
}

fn positive_secs(key: &str, value: &str) -> Result<u64, CliError> {
    let secs: u64 = parse_setting(key, value, "seconds")?;
    if secs == 0 {
        return Err(CliError::Validation {
            field: key.to_owned(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(secs)
}

fn unknown_key(key: &str) -> CliError {
    CliError::Validation {
        field: "key".into(),
        reason: format!("unknown config key '{key}'"),
    }
}
