// ── Device discovery ──
//
// Enumerates paired devices from the inventory listing and the control
// tool's paired list, without filtering to one target. Read-only; an
// environment with neither tool yields an empty list.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::ToolPaths;
use crate::model::{ConnectionHint, DiscoveredDevice, MacAddress, ProbeSource};
use crate::probe::parse;
use crate::runner::CommandRunner;

pub struct DeviceDiscovery {
    runner: Arc<dyn CommandRunner>,
    tools: ToolPaths,
    timeout: Duration,
}

impl DeviceDiscovery {
    pub fn new(runner: Arc<dyn CommandRunner>, tools: ToolPaths, timeout: Duration) -> Self {
        Self {
            runner,
            tools,
            timeout,
        }
    }

    /// Every known device, merged by address.
    ///
    /// Inventory entries come first; the paired listing fills in devices
    /// the inventory missed and upgrades the connection hint when it saw a
    /// connection the inventory did not.
    pub async fn discover(&self) -> Vec<DiscoveredDevice> {
        let mut devices = self.scan_inventory().await;
        for found in self.scan_paired().await {
            merge(&mut devices, found);
        }
        debug!(count = devices.len(), "discovery finished");
        devices
    }

    /// Devices whose name contains any of `hints`, connected ones first.
    pub async fn find_by_name_hint(&self, hints: &[String]) -> Vec<DiscoveredDevice> {
        filter_by_name_hint(self.discover().await, hints)
    }

    /// Name the system shows for `address`, if any source lists it.
    pub async fn lookup_name(&self, address: &MacAddress) -> Option<String> {
        self.discover()
            .await
            .into_iter()
            .find(|d| d.address == *address && !d.name.is_empty())
            .map(|d| d.name)
    }

    async fn scan_inventory(&self) -> Vec<DiscoveredDevice> {
        let program = self.tools.inventory.as_str();
        if !self.runner.is_available(program) {
            return Vec::new();
        }
        let output = self
            .runner
            .run(program, &["SPBluetoothDataType"], self.timeout)
            .await;
        if !output.success() {
            debug!(program, "inventory scan failed");
            return Vec::new();
        }

        let mut devices = Vec::new();
        for entry in parse::parse_inventory(&output.stdout) {
            merge(
                &mut devices,
                DiscoveredDevice {
                    address: entry.address,
                    name: entry.name,
                    connection: ConnectionHint::from_flag(entry.connected),
                    source: ProbeSource::Inventory,
                },
            );
        }
        devices
    }

    async fn scan_paired(&self) -> Vec<DiscoveredDevice> {
        let program = self.tools.control.as_str();
        if !self.runner.is_available(program) {
            return Vec::new();
        }
        let output = self.runner.run(program, &["--paired"], self.timeout).await;
        if !output.success() {
            debug!(program, "paired listing failed");
            return Vec::new();
        }

        parse::parse_paired_listing(&output.stdout)
            .into_iter()
            .map(|entry| DiscoveredDevice {
                address: entry.address,
                name: entry.name,
                connection: ConnectionHint::from_flag(Some(entry.connected)),
                source: ProbeSource::Control,
            })
            .collect()
    }
}

fn merge(devices: &mut Vec<DiscoveredDevice>, found: DiscoveredDevice) {
    let Some(existing) = devices.iter_mut().find(|d| d.address == found.address) else {
        devices.push(found);
        return;
    };
    if existing.name.is_empty() {
        existing.name = found.name;
    }
    match (existing.connection, found.connection) {
        (ConnectionHint::Connected, _) => {}
        (_, ConnectionHint::Connected) | (ConnectionHint::Unknown, _) => {
            existing.connection = found.connection;
        }
        _ => {}
    }
}

/// Keep devices matching any hint (case-insensitive substring), with
/// connected devices ahead of the rest. Order is otherwise preserved.
pub fn filter_by_name_hint(devices: Vec<DiscoveredDevice>, hints: &[String]) -> Vec<DiscoveredDevice> {
    let mut matches: Vec<DiscoveredDevice> = devices
        .into_iter()
        .filter(|d| hints.iter().any(|h| !h.is_empty() && parse::name_contains(&d.name, h)))
        .collect();
    matches.sort_by_key(|d| d.connection != ConnectionHint::Connected);
    matches
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn device(addr: &str, name: &str, connection: ConnectionHint) -> DiscoveredDevice {
        DiscoveredDevice {
            address: addr.parse().unwrap(),
            name: name.into(),
            connection,
            source: ProbeSource::Inventory,
        }
    }

    #[test]
    fn hint_filter_puts_connected_first() {
        let devices = vec![
            device("11:22:33:44:55:66", "AirPods Pro", ConnectionHint::NotConnected),
            device("01:02:03:04:05:06", "Magic Keyboard", ConnectionHint::Connected),
            device("AA:BB:CC:DD:EE:FF", "WH-1000XM4", ConnectionHint::Connected),
        ];
        let hints = vec!["airpods".to_owned(), "WH-".to_owned()];

        let names: Vec<String> = filter_by_name_hint(devices, &hints)
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["WH-1000XM4", "AirPods Pro"]);
    }

    #[test]
    fn empty_hints_match_nothing() {
        let devices = vec![device("AA:BB:CC:DD:EE:FF", "Headset", ConnectionHint::Connected)];
        assert!(filter_by_name_hint(devices, &[String::new()]).is_empty());
    }

    #[test]
    fn merge_prefers_connected_and_fills_names() {
        let mut devices = vec![device("AA:BB:CC:DD:EE:FF", "", ConnectionHint::NotConnected)];
        merge(
            &mut devices,
            device("aa-bb-cc-dd-ee-ff", "Headset", ConnectionHint::Connected),
        );
        merge(
            &mut devices,
            device("AABBCCDDEEFF", "Other", ConnectionHint::NotConnected),
        );

        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "Headset");
        assert_eq!(devices[0].connection, ConnectionHint::Connected);
    }
}
