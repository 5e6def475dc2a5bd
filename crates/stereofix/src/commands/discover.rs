//! `discover` command: list paired and visible Bluetooth devices.

use tabled::Tabled;

use stereofix_core::discovery::filter_by_name_hint;
use stereofix_core::{ConnectionHint, DiscoveredDevice, Orchestrator};

use crate::cli::{DiscoverArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Connection")]
    connection: String,
    #[tabled(rename = "Source")]
    source: String,
}

impl From<&DiscoveredDevice> for DeviceRow {
    fn from(d: &DiscoveredDevice) -> Self {
        Self {
            name: if d.name.is_empty() {
                "-".into()
            } else {
                d.name.clone()
            },
            address: d.address.to_string(),
            connection: d.connection.to_string(),
            source: d.source.to_string(),
        }
    }
}

pub async fn handle(args: DiscoverArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let rc = config::recovery_config(global)?;
    let orchestrator = Orchestrator::new(rc)?;

    let spinner = util::spinner("Scanning Bluetooth devices", global.quiet);
    let found = orchestrator.discover_devices().await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let devices = select(found, &args.matches, args.connected);
    if devices.is_empty() && !global.quiet {
        eprintln!("No Bluetooth devices found.");
    }

    let out = output::render_list(
        global.output,
        &devices,
        |d| DeviceRow::from(d),
        |d| d.address.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn select(
    devices: Vec<DiscoveredDevice>,
    matches: &[String],
    connected_only: bool,
) -> Vec<DiscoveredDevice> {
    let devices = if matches.is_empty() {
        devices
    } else {
        filter_by_name_hint(devices, matches)
    };
    devices
        .into_iter()
        .filter(|d| !connected_only || d.connection == ConnectionHint::Connected)
        .collect()
}
