//! Unit conversion utilities
//!
//! Handles conversion between millimeter and inch programs.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Millimeters per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Length units of a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Millimeters (G21)
    #[default]
    Millimeter,
    /// Inches (G20)
    Inch,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Millimeter => "millimeter",
            Self::Inch => "inch",
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Self::Millimeter => "mm",
            Self::Inch => "in",
        }
    }

    /// The G-code word selecting these units.
    pub fn gcode(&self) -> &'static str {
        match self {
            Self::Millimeter => "G21",
            Self::Inch => "G20",
        }
    }

    /// Factor that converts a length in `self` into `to`.
    pub fn factor_to(&self, to: Units) -> f64 {
        match (self, to) {
            (Self::Millimeter, Self::Inch) => 1.0 / MM_PER_INCH,
            (Self::Inch, Self::Millimeter) => MM_PER_INCH,
            _ => 1.0,
        }
    }

    pub fn convert(value: f64, from: Units, to: Units) -> f64 {
        match (from, to) {
            (Self::Millimeter, Self::Inch) => value / MM_PER_INCH,
            (Self::Inch, Self::Millimeter) => value * MM_PER_INCH,
            _ => value,
        }
    }

    /// Express a millimeter default in these units.
    pub fn from_mm(&self, value_mm: f64) -> f64 {
        Units::convert(value_mm, Units::Millimeter, *self)
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Self::Millimeter => 0,
            Self::Inch => 1,
        }
    }

    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Millimeter),
            1 => Some(Self::Inch),
            _ => None,
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Units {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "millimeter" | "metric" | "mm" => Ok(Self::Millimeter),
            "inch" | "imperial" | "in" => Ok(Self::Inch),
            _ => Err(Error::unknown("units", s)),
        }
    }
}
