use gcamkit_camtools::{helical_bore, ArcDirection, GcodeWriter, HelicalPass};
use gcamkit_core::math::{rotate2d, rotate_about, wrap_degrees};
use gcamkit_core::{ProgramConfig, Vec2, PRECISION};
use std::fmt;
use std::str::FromStr;

use super::{BlockFlags, BlockPayload, CutSide, FlipAxis, Profile};
use crate::error::{BlockError, CodecError, CodecResult};
use crate::make::Generation;
use crate::program::BlockId;
use crate::serialization::binary::{
    bool_value, f64_value, u32_pair_value, u8_value, vec2_value, BinWriter,
};
use crate::serialization::tags::bolt_holes as tag;
use crate::serialization::xml::{AttrReader, AttrWriter};

/// Most holes one BoltHoles block may describe.
pub const MAX_BOLT_HOLES: u64 = 10_000;

/// Whether `count` stays within [`MAX_BOLT_HOLES`] for either pattern.
pub fn bolt_count_in_range(count: [u32; 2]) -> bool {
    count[0] as u64 * (count[1] as u64).max(1) <= MAX_BOLT_HOLES
}

/// Arrangement of a bolt hole set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoltPattern {
    /// `count[0]` holes on a circle of radius `offset_distance`.
    #[default]
    Radial,
    /// `count[0]` columns by `count[1]` rows at pitch `offset_distance`.
    Matrix,
}

impl BoltPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Radial => "radial",
            Self::Matrix => "matrix",
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            Self::Radial => 0,
            Self::Matrix => 1,
        }
    }

    fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Radial),
            1 => Some(Self::Matrix),
            _ => None,
        }
    }
}

impl fmt::Display for BoltPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BoltPattern {
    type Err = BlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "radial" => Ok(Self::Radial),
            "matrix" => Ok(Self::Matrix),
            _ => Err(BlockError::InvalidParameter {
                name: "bolt pattern",
                reason: format!("unknown value '{}'", s),
            }),
        }
    }
}

/// Parametric set of round holes.
///
/// The Arc children are derived from these fields and rebuilt after every
/// edit; they are never written to files.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoltHoles {
    pub position: Vec2,
    pub hole_diameter: f64,
    /// Circle radius (radial) or grid pitch (matrix).
    pub offset_distance: f64,
    pub pattern: BoltPattern,
    pub count: [u32; 2],
    pub offset_angle: f64,
    /// Clear each hole with concentric rings instead of a helix.
    pub pocket: bool,
}

impl BoltHoles {
    pub fn new(config: &ProgramConfig) -> Self {
        Self {
            position: Vec2::ZERO,
            hole_diameter: config.units.from_mm(6.0),
            offset_distance: config.units.from_mm(20.0),
            pattern: BoltPattern::Radial,
            count: [4, 1],
            offset_angle: 0.0,
            pocket: false,
        }
    }

    pub fn hole_radius(&self) -> f64 {
        self.hole_diameter * 0.5
    }

    /// Local hole centers. Empty when `count` exceeds [`MAX_BOLT_HOLES`].
    pub fn hole_centers(&self) -> Vec<Vec2> {
        if !bolt_count_in_range(self.count) {
            return Vec::new();
        }
        match self.pattern {
            BoltPattern::Radial => {
                let n = self.count[0];
                let step = 360.0 / n.max(1) as f64;
                (0..n)
                    .map(|i| {
                        self.position
                            + Vec2::from_angle(self.offset_angle + i as f64 * step)
                                * self.offset_distance
                    })
                    .collect()
            }
            BoltPattern::Matrix => {
                let pitch = self.offset_distance;
                let mut centers = Vec::new();
                for row in 0..self.count[1] {
                    for col in 0..self.count[0] {
                        let local = Vec2::new(col as f64 * pitch, row as f64 * pitch);
                        centers.push(self.position + rotate2d(local, self.offset_angle));
                    }
                }
                centers
            }
        }
    }

    pub(crate) fn make(&self, gen: &mut Generation<'_>, id: BlockId, comment: &str) -> String {
        let program = gen.program();
        let offset = program.resolve_offset(id);
        let centers: Vec<Vec2> = self
            .hole_centers()
            .into_iter()
            .map(|c| offset.apply(c))
            .collect();
        if centers.is_empty() {
            return String::new();
        }
        let Some(tool) = gen.require_tool(id) else {
            return String::new();
        };
        let config = gen.config();

        let profile = program
            .extruder(id)
            .and_then(|e| program.profile(e))
            .unwrap_or_else(|| {
                let depth = config.material_size.z;
                Profile::straight(depth, depth, CutSide::Along)
            });
        let top = offset.top();
        let passes = profile.passes(top, false);
        let Some(bottom) = passes.last().copied() else {
            return String::new();
        };
        let feed = tool.feed;
        let plunge = tool.plunge_feed();
        let traverse = config.ztraverse;
        let clearance = self.hole_radius() - tool.radius();
        let path_radius = |z: f64| (clearance + profile.eval(z - top)).max(0.0);

        let mut w = gen.writer();
        w.comment(&format!("Bolt Holes: {}", comment));
        for center in centers {
            if clearance <= PRECISION {
                w.rapid_z(traverse);
                w.rapid_xy(center);
                w.feed_z(bottom, plunge);
                w.rapid_z(traverse);
            } else if self.pocket {
                let rings: Vec<HelicalPass> = passes
                    .iter()
                    .map(|&z| HelicalPass {
                        z,
                        radius: path_radius(z),
                    })
                    .collect();
                pocket(&mut w, center, &rings, top, tool.radius(), traverse, plunge, feed);
            } else {
                let helix: Vec<HelicalPass> = passes
                    .iter()
                    .map(|&z| HelicalPass {
                        z,
                        radius: path_radius(z),
                    })
                    .collect();
                helical_bore(&mut w, center, &helix, top, traverse, plunge, feed);
            }
        }
        w.finish()
    }
}

/// Clear a round hole level by level with concentric circles `step` apart.
#[allow(clippy::too_many_arguments)]
fn pocket(
    w: &mut GcodeWriter,
    center: Vec2,
    levels: &[HelicalPass],
    top: f64,
    step: f64,
    traverse: f64,
    plunge: f64,
    feed: f64,
) {
    let step = step.max(PRECISION);
    w.rapid_z(traverse);
    w.rapid_xy(center);
    w.feed_z(top, plunge);
    for level in levels {
        w.feed_z(level.z, plunge);
        if level.radius > PRECISION {
            let mut r = step.min(level.radius);
            loop {
                let start = center + Vec2::new(r, 0.0);
                w.feed_xy(start, Some(feed));
                w.arc(ArcDirection::Clockwise, start, Vec2::new(-r, 0.0), None, None);
                if r >= level.radius - PRECISION {
                    break;
                }
                r = (r + step).min(level.radius);
            }
            w.feed_xy(center, Some(feed));
        }
    }
    w.rapid_z(traverse);
}

impl BlockPayload for BoltHoles {
    fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    fn spin(&mut self, datum: Vec2, angle: f64) {
        self.position = rotate_about(self.position, datum, angle);
        self.offset_angle = wrap_degrees(self.offset_angle + angle);
    }

    fn scale(&mut self, factor: f64) {
        self.position = self.position * factor;
        self.hole_diameter *= factor;
        self.offset_distance *= factor;
    }

    fn flip(&mut self, datum: Vec2, axis: FlipAxis) {
        let mirrored = axis.mirror(self.position, datum);
        match self.pattern {
            BoltPattern::Radial => {
                self.position = mirrored;
                self.offset_angle = axis.mirror_angle(self.offset_angle);
            }
            BoltPattern::Matrix => {
                // Mirroring a grid flips one axis; re-anchor at the far corner.
                let angle = wrap_degrees(-self.offset_angle);
                let pitch = self.offset_distance;
                let (along, span) = match axis {
                    FlipAxis::Vertical => (Vec2::from_angle(angle), self.count[0]),
                    FlipAxis::Horizontal => (Vec2::from_angle(angle + 90.0), self.count[1]),
                };
                self.position = mirrored - along * (span.saturating_sub(1) as f64 * pitch);
                self.offset_angle = angle;
            }
        }
    }

    fn save_fields(&self, w: &mut BinWriter) {
        w.record_vec2(tag::POSITION, self.position);
        w.record_f64(tag::HOLE_DIAMETER, self.hole_diameter);
        w.record_f64(tag::OFFSET_DISTANCE, self.offset_distance);
        w.record_u8(tag::TYPE, self.pattern.to_u8());
        w.record_u32_pair(tag::COUNT, self.count);
        w.record_f64(tag::OFFSET_ANGLE, self.offset_angle);
        w.record_bool(tag::POCKET, self.pocket);
    }

    fn load_field(&mut self, t: u8, value: &[u8]) -> CodecResult<bool> {
        match t {
            tag::POSITION => self.position = vec2_value(t, value)?,
            tag::HOLE_DIAMETER => self.hole_diameter = f64_value(t, value)?,
            tag::OFFSET_DISTANCE => self.offset_distance = f64_value(t, value)?,
            tag::TYPE => {
                let code = u8_value(t, value)?;
                self.pattern =
                    BoltPattern::from_u8(code).ok_or_else(|| CodecError::InvalidValue {
                        tag: t,
                        reason: format!("unknown bolt pattern {}", code),
                    })?;
            }
            tag::COUNT => {
                let count = u32_pair_value(t, value)?;
                if !bolt_count_in_range(count) {
                    return Err(CodecError::InvalidValue {
                        tag: t,
                        reason: format!(
                            "{}x{} holes exceeds {}",
                            count[0], count[1], MAX_BOLT_HOLES
                        ),
                    });
                }
                self.count = count;
            }
            tag::OFFSET_ANGLE => self.offset_angle = f64_value(t, value)?,
            tag::POCKET => self.pocket = bool_value(t, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn write_xml(&self, comment: &str, flags: BlockFlags, attrs: &mut AttrWriter) {
        attrs.common(comment, flags);
        attrs.vec2("position", self.position);
        attrs.f64("hole-diameter", self.hole_diameter);
        attrs.f64("offset-distance", self.offset_distance);
        attrs.word("type", self.pattern);
        attrs.list("count", self.count.iter());
        attrs.f64("offset-angle", self.offset_angle);
        attrs.bool("pocket", self.pocket);
    }

    fn parse_xml(&mut self, attrs: &AttrReader<'_>) -> CodecResult<()> {
        if let Some(v) = attrs.vec2("position")? {
            self.position = v;
        }
        if let Some(v) = attrs.f64("hole-diameter")? {
            self.hole_diameter = v;
        }
        if let Some(v) = attrs.f64("offset-distance")? {
            self.offset_distance = v;
        }
        if let Some(v) = attrs.parse("type")? {
            self.pattern = v;
        }
        if let Some(v) = attrs.u32_pair("count")? {
            if !bolt_count_in_range(v) {
                return Err(CodecError::InvalidAttribute {
                    name: "count".to_string(),
                    value: format!("{} {}", v[0], v[1]),
                });
            }
            self.count = v;
        }
        if let Some(v) = attrs.f64("offset-angle")? {
            self.offset_angle = v;
        }
        if let Some(v) = attrs.bool("pocket")? {
            self.pocket = v;
        }
        Ok(())
    }
}
