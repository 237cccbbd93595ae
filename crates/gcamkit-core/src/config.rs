//! Program-wide configuration
//!
//! [`ProgramConfig`] holds the settings every block reads while generating
//! code: units, stock material, traverse height, drilling style and the
//! G-code dialect of the target controller.

use crate::error::{Error, Result};
use crate::math::Vec3;
use crate::units::Units;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Stock material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialType {
    #[default]
    Aluminum,
    Foam,
    Plastic,
    Steel,
    Wood,
    Brass,
}

impl MaterialType {
    pub const ALL: [MaterialType; 6] = [
        Self::Aluminum,
        Self::Foam,
        Self::Plastic,
        Self::Steel,
        Self::Wood,
        Self::Brass,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aluminum => "aluminum",
            Self::Foam => "foam",
            Self::Plastic => "plastic",
            Self::Steel => "steel",
            Self::Wood => "wood",
            Self::Brass => "brass",
        }
    }

    /// Conservative starting feed for a small end mill, in mm/min.
    pub fn default_feed_mm(&self) -> f64 {
        match self {
            Self::Aluminum => 900.0,
            Self::Foam => 2500.0,
            Self::Plastic => 1000.0,
            Self::Steel => 300.0,
            Self::Wood => 1200.0,
            Self::Brass => 700.0,
        }
    }

    pub fn default_spindle_rpm(&self) -> u32 {
        match self {
            Self::Aluminum => 10000,
            Self::Foam => 12000,
            Self::Plastic => 12000,
            Self::Steel => 3000,
            Self::Wood => 16000,
            Self::Brass => 8000,
        }
    }

    pub fn to_u8(self) -> u8 {
        Self::ALL.iter().position(|m| *m == self).unwrap_or(0) as u8
    }

    pub fn from_u8(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }
}

impl fmt::Display for MaterialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MaterialType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == lower)
            .ok_or_else(|| Error::unknown("material type", s))
    }
}

/// How drill holes are emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrillingMotion {
    /// G81/G83 canned cycles
    #[default]
    Canned,
    /// Explicit G0/G1 moves
    Simple,
}

impl DrillingMotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Canned => "canned",
            Self::Simple => "simple",
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Self::Canned => 0,
            Self::Simple => 1,
        }
    }

    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Canned),
            1 => Some(Self::Simple),
            _ => None,
        }
    }
}

impl fmt::Display for DrillingMotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DrillingMotion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "canned" => Ok(Self::Canned),
            "simple" => Ok(Self::Simple),
            _ => Err(Error::unknown("drilling motion", s)),
        }
    }
}

/// G-code flavour of the target controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Rs274ngc,
    Fanuc,
    Haas,
    Grbl,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [Self::Rs274ngc, Self::Fanuc, Self::Haas, Self::Grbl];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rs274ngc => "rs274ngc",
            Self::Fanuc => "fanuc",
            Self::Haas => "haas",
            Self::Grbl => "grbl",
        }
    }

    /// G81/G83 with G80 cancel.
    pub fn supports_canned_cycles(&self) -> bool {
        !matches!(self, Self::Grbl)
    }

    /// G41/G42 radius compensation.
    pub fn supports_cutter_compensation(&self) -> bool {
        !matches!(self, Self::Grbl)
    }

    /// G49 tool length compensation cancel.
    pub fn supports_tool_length_offset(&self) -> bool {
        !matches!(self, Self::Grbl)
    }

    /// Whether programs are wrapped in `%` with an `O` number.
    pub fn uses_tape_delimiters(&self) -> bool {
        matches!(self, Self::Fanuc | Self::Haas)
    }

    /// Highest supported work coordinate system index (0 = G54).
    pub fn max_coordinate_system(&self) -> u8 {
        match self {
            Self::Grbl => 5,
            _ => 8,
        }
    }

    pub fn to_u8(self) -> u8 {
        Self::ALL.iter().position(|d| *d == self).unwrap_or(0) as u8
    }

    pub fn from_u8(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_lowercase();
        match lower.as_str() {
            "linuxcnc" | "emc" => Ok(Self::Rs274ngc),
            _ => Self::ALL
                .iter()
                .copied()
                .find(|d| d.as_str() == lower)
                .ok_or_else(|| Error::unknown("dialect", s)),
        }
    }
}

/// Optional hardware present on the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineOptions {
    pub home_switches: bool,
    pub auto_tool_change: bool,
    pub spindle_control: bool,
    pub coolant: bool,
}

impl Default for MachineOptions {
    fn default() -> Self {
        Self {
            home_switches: true,
            auto_tool_change: false,
            spindle_control: true,
            coolant: false,
        }
    }
}

impl MachineOptions {
    const HOME_SWITCHES: u8 = 0x01;
    const AUTO_TOOL_CHANGE: u8 = 0x02;
    const SPINDLE_CONTROL: u8 = 0x04;
    const COOLANT: u8 = 0x08;

    pub fn to_bits(&self) -> u8 {
        let mut bits = 0;
        if self.home_switches {
            bits |= Self::HOME_SWITCHES;
        }
        if self.auto_tool_change {
            bits |= Self::AUTO_TOOL_CHANGE;
        }
        if self.spindle_control {
            bits |= Self::SPINDLE_CONTROL;
        }
        if self.coolant {
            bits |= Self::COOLANT;
        }
        bits
    }

    pub fn from_bits(bits: u8) -> Self {
        Self {
            home_switches: bits & Self::HOME_SWITCHES != 0,
            auto_tool_change: bits & Self::AUTO_TOOL_CHANGE != 0,
            spindle_control: bits & Self::SPINDLE_CONTROL != 0,
            coolant: bits & Self::COOLANT != 0,
        }
    }
}

/// Settings shared by every block of a program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramConfig {
    pub name: String,
    pub notes: String,
    pub units: Units,
    pub material_type: MaterialType,
    /// Stock extents; `z` is the thickness.
    pub material_size: Vec3,
    pub material_origin: Vec3,
    /// Safe rapid height above the stock.
    pub ztraverse: f64,
    pub drilling_motion: DrillingMotion,
    pub dialect: Dialect,
    pub machine: MachineOptions,
    /// Fixed decimals for emitted numbers.
    pub decimals: u8,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            name: "Untitled".to_string(),
            notes: String::new(),
            units: Units::Millimeter,
            material_type: MaterialType::Aluminum,
            material_size: Vec3::new(100.0, 100.0, 10.0),
            material_origin: Vec3::ZERO,
            ztraverse: 5.0,
            drilling_motion: DrillingMotion::Canned,
            dialect: Dialect::Rs274ngc,
            machine: MachineOptions::default(),
            decimals: 4,
        }
    }
}

impl ProgramConfig {
    pub const MAX_DECIMALS: u8 = 8;

    /// Whether drill holes should use canned cycles for this controller.
    pub fn uses_canned_cycles(&self) -> bool {
        self.drilling_motion == DrillingMotion::Canned && self.dialect.supports_canned_cycles()
    }

    /// Convert every length to `units`.
    pub fn convert_units(&mut self, units: Units) {
        let factor = self.units.factor_to(units);
        debug!("converting program config from {} to {}", self.units, units);
        self.material_size = self.material_size * factor;
        self.material_origin = self.material_origin * factor;
        self.ztraverse *= factor;
        self.units = units;
    }

    pub fn validate(&self) -> Result<()> {
        if self.decimals > Self::MAX_DECIMALS {
            return Err(Error::config(format!(
                "decimals must be between 0 and {}, got {}",
                Self::MAX_DECIMALS,
                self.decimals
            )));
        }
        let size = self.material_size;
        if size.x <= 0.0 || size.y <= 0.0 || size.z <= 0.0 {
            return Err(Error::config("material size must be positive"));
        }
        if self.ztraverse < 0.0 {
            return Err(Error::config("traverse height must not be negative"));
        }
        Ok(())
    }
}
