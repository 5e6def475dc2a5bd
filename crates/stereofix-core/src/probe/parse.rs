// ── Tool output parsers ──
//
// Each external source prints free text. The fragile string matching
// lives here, behind small pure functions that return typed judgments,
// so the prober and discovery never look at raw output themselves.

use crate::model::{MacAddress, ProfileHint};
use crate::runner::{CommandOutput, CommandStatus};

// ── Control tool (blueutil) ─────────────────────────────────────────

/// Interpretation of a `--is-connected` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlReply {
    Connected,
    Disconnected,
    /// The tool ran but refused the query, typically over address format.
    Rejected,
    /// The tool could not be run at all; other formats will not help.
    Unavailable,
}

pub fn parse_control_status(output: &CommandOutput) -> ControlReply {
    match output.status {
        CommandStatus::Exited(Some(0)) => match output.stdout.trim() {
            "1" => ControlReply::Connected,
            "0" => ControlReply::Disconnected,
            _ => ControlReply::Rejected,
        },
        CommandStatus::Exited(_) => ControlReply::Rejected,
        CommandStatus::NotFound | CommandStatus::TimedOut | CommandStatus::SpawnFailed(_) => {
            ControlReply::Unavailable
        }
    }
}

/// One line of `blueutil --paired` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairedEntry {
    pub address: MacAddress,
    pub name: String,
    pub connected: bool,
}

/// Parse `blueutil --paired` output:
///
/// ```text
/// address: aa-bb-cc-dd-ee-ff, connected (master, -52 dBm), not favourite, paired, name: "WH-1000XM4", recent access date: ...
/// ```
pub fn parse_paired_listing(text: &str) -> Vec<PairedEntry> {
    text.lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("address: ")?;
            let (raw_address, rest) = rest.split_once(',')?;
            let address = MacAddress::parse(raw_address).ok()?;
            let rest = rest.trim_start();
            let connected = rest.starts_with("connected");
            let name = rest
                .find("name: \"")
                .and_then(|start| {
                    let tail = &rest[start + "name: \"".len()..];
                    tail.find('"').map(|end| tail[..end].to_owned())
                })
                .unwrap_or_default();
            Some(PairedEntry {
                address,
                name,
                connected,
            })
        })
        .collect()
}

// ── System inventory (system_profiler SPBluetoothDataType) ──────────

/// A device entry from the inventory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryEntry {
    pub name: String,
    pub address: MacAddress,
    /// `Some` when the entry sat under a connected/not-connected section or
    /// carried an explicit `Connected: Yes/No` line.
    pub connected: Option<bool>,
    pub profile: Option<ProfileHint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Connected,
    NotConnected,
    Paired,
}

struct PendingEntry {
    name: String,
    indent: usize,
    section: Section,
    address: Option<MacAddress>,
    connected_flag: Option<bool>,
    details: Vec<String>,
}

impl PendingEntry {
    fn finish(self) -> Option<InventoryEntry> {
        let address = self.address?;
        let connected = match self.section {
            Section::Connected => Some(true),
            Section::NotConnected => Some(false),
            Section::Paired => self.connected_flag,
        };
        Some(InventoryEntry {
            name: self.name,
            address,
            connected,
            profile: profile_hint(&self.details.join(" ")),
        })
    }
}

/// Parse the indented inventory listing.
///
/// Recognizes both layouts the inventory tool has used: `Connected:` /
/// `Not Connected:` sections, and a single `Devices (Paired, ...)`
/// section whose entries carry `Connected: Yes|No` lines.
pub fn parse_inventory(text: &str) -> Vec<InventoryEntry> {
    let mut entries = Vec::new();
    let mut section: Option<(Section, usize)> = None;
    let mut current: Option<PendingEntry> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let indent = line.len() - line.trim_start().len();

        if let Some(label) = trimmed.strip_suffix(':') {
            let heading = match label {
                "Connected" => Some(Section::Connected),
                "Not Connected" => Some(Section::NotConnected),
                l if l.starts_with("Devices") || l == "Paired Devices" => Some(Section::Paired),
                _ => None,
            };

            if let Some(kind) = heading {
                entries.extend(current.take().and_then(PendingEntry::finish));
                section = Some((kind, indent));
                continue;
            }

            match section {
                Some((kind, section_indent)) if indent > section_indent => {
                    // Headers nested inside an entry belong to that entry.
                    if current.as_ref().is_some_and(|e| indent > e.indent) {
                        if let Some(entry) = current.as_mut() {
                            entry.details.push(label.to_owned());
                        }
                        continue;
                    }
                    entries.extend(current.take().and_then(PendingEntry::finish));
                    current = Some(PendingEntry {
                        name: label.to_owned(),
                        indent,
                        section: kind,
                        address: None,
                        connected_flag: None,
                        details: Vec::new(),
                    });
                }
                _ => {
                    entries.extend(current.take().and_then(PendingEntry::finish));
                    section = None;
                }
            }
            continue;
        }

        let Some(entry) = current.as_mut() else {
            continue;
        };
        if indent <= entry.indent {
            continue;
        }
        let Some((key, value)) = trimmed.split_once(':') else {
            entry.details.push(trimmed.to_owned());
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Address" => entry.address = MacAddress::parse(value).ok(),
            "Connected" => entry.connected_flag = parse_yes_no(value),
            _ => entry.details.push(format!("{key} {value}")),
        }
    }

    entries.extend(current.take().and_then(PendingEntry::finish));
    entries
}

fn parse_yes_no(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" => Some(true),
        "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

/// Best-effort profile detection from free text.
///
/// Only an unambiguous mention counts: text naming both stereo and call
/// profiles (a capability list, usually) yields `None`.
pub fn profile_hint(text: &str) -> Option<ProfileHint> {
    const HIGH: [&str; 5] = ["A2DP", "AAC", "SBC", "APTX", "LDAC"];
    const LOW: [&str; 6] = ["HFP", "HSP", "HANDS-FREE", "HANDSFREE", "MSBC", "CVSD"];

    let upper = text.to_ascii_uppercase();
    let tokens: Vec<&str> = upper
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .filter(|t| !t.is_empty())
        .collect();

    let high = tokens.iter().any(|t| HIGH.contains(t));
    let low = tokens.iter().any(|t| LOW.contains(t));
    match (high, low) {
        (true, false) => Some(ProfileHint::HighQuality),
        (false, true) => Some(ProfileHint::LowQuality),
        _ => None,
    }
}

// ── Audio outputs (SwitchAudioSource -a) ────────────────────────────

/// Parse a device list, one name per line, dropping `(output)` suffixes.
pub fn parse_audio_devices(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| {
            l.strip_suffix("(output)")
                .or_else(|| l.strip_suffix("(input)"))
                .unwrap_or(l)
                .trim_end()
                .to_owned()
        })
        .collect()
}

/// Compare device names the way the OS presents them: case-insensitive,
/// with typographic apostrophes folded.
pub fn names_match(a: &str, b: &str) -> bool {
    fold_name(a) == fold_name(b)
}

/// Case-insensitive substring test with the same folding as [`names_match`].
pub fn name_contains(name: &str, fragment: &str) -> bool {
    fold_name(name).contains(&fold_name(fragment))
}

fn fold_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '\u{2019}' | '\u{2018}' => '\'',
            other => other,
        })
        .collect::<String>()
        .to_lowercase()
}
