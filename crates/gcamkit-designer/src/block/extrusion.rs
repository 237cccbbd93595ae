use gcamkit_camtools::peck_levels;
use gcamkit_core::{ProgramConfig, Vec2, PRECISION};
use std::fmt;
use std::str::FromStr;

use super::{BlockFlags, BlockPayload};
use crate::error::{BlockError, CodecError, CodecResult};
use crate::serialization::binary::{f64_value, u8_value, BinWriter};
use crate::serialization::tags::extrusion as tag;
use crate::serialization::xml::{AttrReader, AttrWriter};

/// Which side of a closed contour the cutter runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CutSide {
    Inside,
    Outside,
    /// On the contour, no compensation.
    #[default]
    Along,
}

impl CutSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inside => "inside",
            Self::Outside => "outside",
            Self::Along => "along",
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            Self::Inside => 0,
            Self::Outside => 1,
            Self::Along => 2,
        }
    }

    fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Inside),
            1 => Some(Self::Outside),
            2 => Some(Self::Along),
            _ => None,
        }
    }
}

impl fmt::Display for CutSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CutSide {
    type Err = BlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inside" => Ok(Self::Inside),
            "outside" => Ok(Self::Outside),
            "along" => Ok(Self::Along),
            _ => Err(BlockError::InvalidParameter {
                name: "cut side",
                reason: format!("unknown value '{}'", s),
            }),
        }
    }
}

/// Depth profile owned by a Sketch or BoltHoles.
///
/// Line children describe the profile: x is the lateral offset, y the depth
/// below the surface (zero or negative).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extrusion {
    /// Depth step between passes.
    pub resolution: f64,
    pub cut_side: CutSide,
}

impl Extrusion {
    pub fn new(config: &ProgramConfig) -> Self {
        Self {
            resolution: config.units.from_mm(1.0),
            cut_side: CutSide::Along,
        }
    }
}

impl BlockPayload for Extrusion {
    fn scale(&mut self, factor: f64) {
        self.resolution *= factor;
    }

    fn save_fields(&self, w: &mut BinWriter) {
        w.record_f64(tag::RESOLUTION, self.resolution);
        w.record_u8(tag::CUT_SIDE, self.cut_side.to_u8());
    }

    fn load_field(&mut self, t: u8, value: &[u8]) -> CodecResult<bool> {
        match t {
            tag::RESOLUTION => self.resolution = f64_value(t, value)?,
            tag::CUT_SIDE => {
                let code = u8_value(t, value)?;
                self.cut_side = CutSide::from_u8(code).ok_or_else(|| CodecError::InvalidValue {
                    tag: t,
                    reason: format!("unknown cut side {}", code),
                })?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn write_xml(&self, comment: &str, flags: BlockFlags, attrs: &mut AttrWriter) {
        attrs.common(comment, flags);
        attrs.f64("resolution", self.resolution);
        attrs.word("cut-side", self.cut_side);
    }

    fn parse_xml(&mut self, attrs: &AttrReader<'_>) -> CodecResult<()> {
        if let Some(resolution) = attrs.f64("resolution")? {
            self.resolution = resolution;
        }
        if let Some(side) = attrs.parse("cut-side")? {
            self.cut_side = side;
        }
        Ok(())
    }
}

/// Evaluated depth profile of an extrusion.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub segments: Vec<(Vec2, Vec2)>,
    pub resolution: f64,
    pub cut_side: CutSide,
}

impl Profile {
    /// Vertical wall down to `depth` below the surface.
    pub fn straight(depth: f64, resolution: f64, cut_side: CutSide) -> Self {
        Self {
            segments: vec![(Vec2::ZERO, Vec2::new(0.0, -depth.abs()))],
            resolution,
            cut_side,
        }
    }

    /// Deepest point, relative to the surface.
    pub fn bottom(&self) -> f64 {
        self.segments
            .iter()
            .flat_map(|(a, b)| [a.y, b.y])
            .fold(0.0, f64::min)
    }

    /// Lateral offset at `depth` below the surface. Depths outside the
    /// profile take the value of the nearest end.
    pub fn eval(&self, depth: f64) -> f64 {
        for (a, b) in &self.segments {
            let (lo, hi) = (a.y.min(b.y), a.y.max(b.y));
            if depth < lo - PRECISION || depth > hi + PRECISION {
                continue;
            }
            if hi - lo < PRECISION {
                return a.x.max(b.x);
            }
            let t = (depth - a.y) / (b.y - a.y);
            return a.x + t * (b.x - a.x);
        }

        let ends = self.segments.iter().flat_map(|(a, b)| [*a, *b]);
        ends.min_by(|p, q| {
            (p.y - depth)
                .abs()
                .partial_cmp(&(q.y - depth).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|p| p.x)
        .unwrap_or(0.0)
    }

    /// Absolute pass depths below a surface at `top`.
    pub fn passes(&self, top: f64, zero_pass: bool) -> Vec<f64> {
        depth_passes(top, self.bottom(), self.resolution, zero_pass)
    }
}

/// Pass depths from `top` down to `top + bottom` in steps of at most
/// `resolution`, the last exactly at the bottom. `zero_pass` adds a first
/// pass at the surface.
pub fn depth_passes(top: f64, bottom: f64, resolution: f64, zero_pass: bool) -> Vec<f64> {
    let mut passes = Vec::new();
    if zero_pass {
        passes.push(top);
    }
    if bottom < -PRECISION {
        passes.extend(peck_levels(top, top + bottom, resolution));
    } else if passes.is_empty() {
        passes.push(top);
    }
    passes
}
