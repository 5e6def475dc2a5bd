// ── Hardware address normalization ──
//
// The control tool is inconsistent about which textual address form it
// accepts, so every address is parsed once into raw octets and rendered
// on demand in any of the six supported layouts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::CoreError;

// ── MacFormat ───────────────────────────────────────────────────────

/// Textual layout of a hardware address.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MacFormat {
    /// `AA:BB:CC:DD:EE:FF` (canonical)
    ColonUpper,
    /// `aa:bb:cc:dd:ee:ff`
    ColonLower,
    /// `AA-BB-CC-DD-EE-FF`
    DashUpper,
    /// `aa-bb-cc-dd-ee-ff`
    DashLower,
    /// `AABBCCDDEEFF`
    BareUpper,
    /// `aabbccddeeff`
    BareLower,
}

impl MacFormat {
    /// Every layout, in the order variants are generated and probed.
    pub const ALL: [Self; 6] = [
        Self::ColonUpper,
        Self::ColonLower,
        Self::DashUpper,
        Self::DashLower,
        Self::BareUpper,
        Self::BareLower,
    ];

    fn separator(self) -> &'static str {
        match self {
            Self::ColonUpper | Self::ColonLower => ":",
            Self::DashUpper | Self::DashLower => "-",
            Self::BareUpper | Self::BareLower => "",
        }
    }

    fn uppercase(self) -> bool {
        matches!(self, Self::ColonUpper | Self::DashUpper | Self::BareUpper)
    }
}

// ── MacAddress ──────────────────────────────────────────────────────

/// A Bluetooth hardware address.
///
/// Parsing accepts colon, dash, or separator-free input in either case.
/// `Display` and serde always use the canonical `AA:BB:CC:DD:EE:FF` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub const fn from_octets(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// Parse an address in any supported layout.
    ///
    /// Separators (`:` / `-`) and surrounding whitespace are ignored; the
    /// remaining characters must be exactly 12 hexadecimal digits.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let mut nibbles = Vec::with_capacity(12);
        for ch in input.trim().chars() {
            match ch {
                ':' | '-' => {}
                c => {
                    let digit = c
                        .to_digit(16)
                        .ok_or_else(|| CoreError::invalid_address(input))?;
                    nibbles.push(u8::try_from(digit).map_err(|_| CoreError::invalid_address(input))?);
                }
            }
        }

        if nibbles.len() != 12 {
            return Err(CoreError::invalid_address(input));
        }

        let mut octets = [0u8; 6];
        for (octet, pair) in octets.iter_mut().zip(nibbles.chunks_exact(2)) {
            *octet = (pair[0] << 4) | pair[1];
        }
        Ok(Self(octets))
    }

    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Render the address in a specific layout.
    pub fn format(&self, style: MacFormat) -> String {
        self.0
            .iter()
            .map(|b| {
                if style.uppercase() {
                    format!("{b:02X}")
                } else {
                    format!("{b:02x}")
                }
            })
            .collect::<Vec<_>>()
            .join(style.separator())
    }

    /// The canonical colon-separated uppercase form.
    pub fn canonical(&self) -> String {
        self.format(MacFormat::ColonUpper)
    }

    /// All six layouts, in [`MacFormat::ALL`] order.
    pub fn variants(&self) -> Vec<(MacFormat, String)> {
        MacFormat::ALL
            .iter()
            .map(|&style| (style, self.format(style)))
            .collect()
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl FromStr for MacAddress {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MacAddress {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.canonical()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_layout_to_the_same_address() {
        let inputs = [
            "AA:BB:CC:DD:EE:0F",
            "aa:bb:cc:dd:ee:0f",
            "AA-BB-CC-DD-EE-0F",
            "aa-bb-cc-dd-ee-0f",
            "AABBCCDDEE0F",
            "aabbccddee0f",
            "  Aa:bB:cc:DD:ee:0f\n",
        ];
        for input in inputs {
            let mac = MacAddress::parse(input).unwrap();
            assert_eq!(mac.canonical(), "AA:BB:CC:DD:EE:0F", "input: {input:?}");
        }
    }

    #[test]
    fn variants_follow_fixed_order() {
        let mac: MacAddress = "a1b2c3d4e5f6".parse().unwrap();
        let rendered: Vec<String> = mac.variants().into_iter().map(|(_, s)| s).collect();
        assert_eq!(
            rendered,
            vec![
                "A1:B2:C3:D4:E5:F6",
                "a1:b2:c3:d4:e5:f6",
                "A1-B2-C3-D4-E5-F6",
                "a1-b2-c3-d4-e5-f6",
                "A1B2C3D4E5F6",
                "a1b2c3d4e5f6",
            ]
        );
    }

    #[test]
    fn variants_renormalize_to_canonical() {
        // Walk a spread of octet patterns rather than a single fixture.
        for seed in 0u8..=255 {
            let octets = [
                seed,
                seed.wrapping_mul(7),
                seed.wrapping_add(91),
                !seed,
                seed.rotate_left(3),
                seed ^ 0x5a,
            ];
            let mac = MacAddress::from_octets(octets);
            for (_, variant) in mac.variants() {
                assert_eq!(MacAddress::parse(&variant).unwrap(), mac);
                assert_eq!(MacAddress::parse(&variant).unwrap().canonical(), mac.canonical());
            }
        }
    }

    #[test]
    fn rejects_wrong_digit_count() {
        assert!(MacAddress::parse("AA:BB:CC:DD:EE").is_err());
        assert!(MacAddress::parse("AA:BB:CC:DD:EE:FF:00").is_err());
        assert!(MacAddress::parse("").is_err());
    }

    #[test]
    fn rejects_non_hex_characters() {
        let err = MacAddress::parse("GG:BB:CC:DD:EE:FF").unwrap_err();
        assert!(matches!(err, CoreError::InvalidAddressFormat { ref input } if input == "GG:BB:CC:DD:EE:FF"));
        assert!(MacAddress::parse("AA.BB.CC.DD.EE.FF").is_err());
    }

    #[test]
    fn serde_uses_canonical_string() {
        let mac: MacAddress = "aa-bb-cc-dd-ee-ff".parse().unwrap();
        let json = serde_json::to_string(&mac).unwrap();
        assert_eq!(json, "\"AA:BB:CC:DD:EE:FF\"");
        let back: MacAddress = serde_json::from_str("\"aabbccddeeff\"").unwrap();
        assert_eq!(back, mac);
    }
}
