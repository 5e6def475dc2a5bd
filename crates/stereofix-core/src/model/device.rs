use serde::{Deserialize, Serialize};
use strum::Display;

use super::mac::MacAddress;
use super::state::{ConnectionState, ProbeResult, ProbeSource};
use super::MacFormat;

/// The device a recovery run targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceIdentity {
    pub address: MacAddress,
    pub name: Option<String>,
    /// `true` when discovery picked the device instead of configuration.
    pub auto_detected: bool,
}

impl DeviceIdentity {
    pub fn configured(address: MacAddress, name: Option<String>) -> Self {
        Self {
            address,
            name,
            auto_detected: false,
        }
    }

    pub fn detected(address: MacAddress, name: impl Into<String>) -> Self {
        Self {
            address,
            name: Some(name.into()),
            auto_detected: true,
        }
    }

    /// Human-readable label: `Name (AA:BB:..)` or just the address.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{name} ({})", self.address),
            None => self.address.to_string(),
        }
    }
}

/// Connection hint attached to an inventory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ConnectionHint {
    Connected,
    NotConnected,
    Unknown,
}

impl ConnectionHint {
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => Self::Connected,
            Some(false) => Self::NotConnected,
            None => Self::Unknown,
        }
    }
}

/// A device found by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredDevice {
    pub address: MacAddress,
    pub name: String,
    pub connection: ConnectionHint,
    pub source: ProbeSource,
}

/// Result of a read-only status query.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub device: DeviceIdentity,
    pub state: ConnectionState,
    pub probes: Vec<ProbeResult>,
    /// Address layout the control tool accepted, if one was found.
    pub address_format: Option<MacFormat>,
}
