use gcamkit_camtools::{ArcDirection, GcodeWriter};
use gcamkit_core::math::rotate2d;
use gcamkit_core::{Offset, Vec2, PRECISION};

use super::{BlockFlags, BlockPayload, CutSide, FlipAxis, Payload, Profile, Tool};
use crate::error::CodecResult;
use crate::make::Generation;
use crate::program::{BlockId, Program};
use crate::serialization::binary::{bool_value, vec2_value, BinWriter};
use crate::serialization::tags::sketch as tag;
use crate::serialization::xml::{AttrReader, AttrWriter};

/// Contour cut through the depth profile of its extruder.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sketch {
    /// XY shift reached at the bottom of the profile.
    pub taper_offset: Vec2,
    /// Extra pass at the surface before descending.
    pub zero_pass: bool,
    /// Ramp closed contours down instead of plunging.
    pub helical: bool,
}

/// Contour piece in absolute coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Segment {
    Line {
        start: Vec2,
        end: Vec2,
    },
    Arc {
        start: Vec2,
        end: Vec2,
        center: Vec2,
        sweep: f64,
    },
}

impl Segment {
    fn start(&self) -> Vec2 {
        match self {
            Self::Line { start, .. } | Self::Arc { start, .. } => *start,
        }
    }

    fn end(&self) -> Vec2 {
        match self {
            Self::Line { end, .. } | Self::Arc { end, .. } => *end,
        }
    }

    fn length(&self) -> f64 {
        match self {
            Self::Line { start, end } => start.distance_to(end),
            Self::Arc {
                start,
                center,
                sweep,
                ..
            } => start.distance_to(center) * sweep.abs().to_radians(),
        }
    }

    fn shifted(&self, d: Vec2) -> Self {
        match *self {
            Self::Line { start, end } => Self::Line {
                start: start + d,
                end: end + d,
            },
            Self::Arc {
                start,
                end,
                center,
                sweep,
            } => Self::Arc {
                start: start + d,
                end: end + d,
                center: center + d,
                sweep,
            },
        }
    }

    /// Signed area contribution: chord cross term plus the circular segment
    /// between chord and arc.
    fn area(&self) -> f64 {
        match *self {
            Self::Line { start, end } => 0.5 * start.cross(&end),
            Self::Arc {
                start,
                end,
                center,
                sweep,
            } => {
                let r = start.distance_to(&center);
                let theta = sweep.to_radians();
                0.5 * start.cross(&end) + 0.5 * r * r * (theta - theta.sin())
            }
        }
    }
}

/// Connected run of segments.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Contour {
    pub(crate) segments: Vec<Segment>,
}

impl Contour {
    fn start(&self) -> Vec2 {
        self.segments.first().map(|s| s.start()).unwrap_or(Vec2::ZERO)
    }

    fn end(&self) -> Vec2 {
        self.segments.last().map(|s| s.end()).unwrap_or(Vec2::ZERO)
    }

    pub(crate) fn is_closed(&self) -> bool {
        !self.segments.is_empty() && self.start().approx_eq(&self.end())
    }

    fn length(&self) -> f64 {
        self.segments.iter().map(Segment::length).sum()
    }

    /// Positive for counter-clockwise contours.
    pub(crate) fn signed_area(&self) -> f64 {
        self.segments.iter().map(Segment::area).sum()
    }
}

/// Split segments into contours wherever one does not start at the previous
/// end.
pub(crate) fn chain(segments: Vec<Segment>) -> Vec<Contour> {
    let mut contours: Vec<Contour> = Vec::new();
    for segment in segments {
        match contours.last_mut() {
            Some(contour) if !contour.is_closed() && contour.end().approx_eq(&segment.start()) => {
                contour.segments.push(segment)
            }
            _ => contours.push(Contour {
                segments: vec![segment],
            }),
        }
    }
    contours
}

fn contour_segments(program: &Program, id: BlockId, offset: &Offset) -> Vec<Segment> {
    program
        .children(id)
        .iter()
        .filter_map(|child| program.get(*child))
        .filter(|block| !block.is_suppressed())
        .filter_map(|block| match &block.payload {
            Payload::Line(line) => Some(Segment::Line {
                start: offset.apply(line.p0),
                end: offset.apply(line.p1),
            }),
            Payload::Arc(arc) => Some(Segment::Arc {
                start: offset.apply(arc.start),
                end: offset.apply(arc.end()),
                center: offset.apply(arc.center()),
                sweep: arc.sweep,
            }),
            _ => None,
        })
        .collect()
}

/// G41 when the cutter must stay left of the direction of travel.
pub(crate) fn compensation_word(side: CutSide, signed_area: f64) -> &'static str {
    let counter_clockwise = signed_area > 0.0;
    let left = match side {
        CutSide::Inside => counter_clockwise,
        _ => !counter_clockwise,
    };
    if left {
        "G41"
    } else {
        "G42"
    }
}

struct Pass<'a> {
    tool: &'a Tool,
    top: f64,
    bottom: f64,
    traverse: f64,
}

impl Sketch {
    fn taper_shift(&self, z: f64, top: f64, bottom: f64) -> Vec2 {
        if bottom.abs() < PRECISION {
            return Vec2::ZERO;
        }
        self.taper_offset * ((z - top) / bottom)
    }

    pub(crate) fn make(&self, gen: &mut Generation<'_>, id: BlockId, comment: &str) -> String {
        let program = gen.program();
        let offset = program.resolve_offset(id);
        let contours = chain(contour_segments(program, id, &offset));
        if contours.is_empty() {
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
        let passes = profile.passes(offset.top(), self.zero_pass);
        let compensate =
            profile.cut_side != CutSide::Along && config.dialect.supports_cutter_compensation();
        let pass = Pass {
            tool,
            top: offset.top(),
            bottom: profile.bottom(),
            traverse: config.ztraverse,
        };

        let mut w = gen.writer();
        w.comment(&format!("Sketch: {}", comment));
        for contour in &contours {
            let comp = (compensate && contour.is_closed())
                .then(|| compensation_word(profile.cut_side, contour.signed_area()));
            self.cut_contour(&mut w, contour, &passes, &pass, comp);
        }
        w.finish()
    }

    fn cut_contour(
        &self,
        w: &mut GcodeWriter,
        contour: &Contour,
        passes: &[f64],
        pass: &Pass<'_>,
        comp: Option<&str>,
    ) {
        let Some(first) = passes.first() else {
            return;
        };
        let feed = pass.tool.feed;
        let plunge = pass.tool.plunge_feed();
        let closed = contour.is_closed();

        let mut position = contour.start() + self.taper_shift(*first, pass.top, pass.bottom);
        w.rapid_z(pass.traverse);
        w.rapid_xy(position);
        if let Some(word) = comp {
            w.line(format!("{} D{}", word, pass.tool.number));
        }

        if self.helical && closed {
            w.feed_z(pass.top, plunge);
            let mut z_prev = pass.top;
            for &z in passes {
                let shift = self.taper_shift(z, pass.top, pass.bottom);
                let start = contour.start() + shift;
                if !start.approx_eq(&position) {
                    w.feed_xy(start, Some(feed));
                    position = start;
                }
                trace(w, contour, shift, Some((z_prev, z)), feed);
                z_prev = z;
            }
            let shift = self.taper_shift(z_prev, pass.top, pass.bottom);
            trace(w, contour, shift, None, feed);
        } else {
            for (i, &z) in passes.iter().enumerate() {
                let shift = self.taper_shift(z, pass.top, pass.bottom);
                let start = contour.start() + shift;
                if i > 0 {
                    if !closed {
                        w.rapid_z(pass.traverse);
                        w.rapid_xy(start);
                    } else if !start.approx_eq(&position) {
                        w.feed_xy(start, Some(feed));
                    }
                }
                position = start;
                w.feed_z(z, plunge);
                trace(w, contour, shift, None, feed);
            }
        }

        if comp.is_some() {
            w.line("G40");
        }
        w.rapid_z(pass.traverse);
    }
}

/// Cut along the contour. With `ramp`, Z descends linearly over its length.
fn trace(
    w: &mut GcodeWriter,
    contour: &Contour,
    shift: Vec2,
    ramp: Option<(f64, f64)>,
    feed: f64,
) {
    let total = contour.length();
    let mut travelled = 0.0;
    for (k, segment) in contour.segments.iter().enumerate() {
        let f = (k == 0).then_some(feed);
        travelled += segment.length();
        let z = ramp.map(|(z0, z1)| {
            if total > PRECISION {
                z0 + (z1 - z0) * travelled / total
            } else {
                z1
            }
        });
        match segment.shifted(shift) {
            Segment::Line { end, .. } => match z {
                Some(z) => w.feed_xyz(end, z, f),
                None => w.feed_xy(end, f),
            },
            Segment::Arc {
                start,
                end,
                center,
                sweep,
            } => w.arc(ArcDirection::from_sweep(sweep), end, center - start, z, f),
        }
    }
}

impl BlockPayload for Sketch {
    fn spin(&mut self, _datum: Vec2, angle: f64) {
        self.taper_offset = rotate2d(self.taper_offset, angle);
    }

    fn scale(&mut self, factor: f64) {
        self.taper_offset = self.taper_offset * factor;
    }

    fn flip(&mut self, _datum: Vec2, axis: FlipAxis) {
        self.taper_offset = axis.mirror(self.taper_offset, Vec2::ZERO);
    }

    fn save_fields(&self, w: &mut BinWriter) {
        w.record_vec2(tag::TAPER_OFFSET, self.taper_offset);
        w.record_bool(tag::ZERO_PASS, self.zero_pass);
        w.record_bool(tag::HELICAL, self.helical);
    }

    fn load_field(&mut self, t: u8, value: &[u8]) -> CodecResult<bool> {
        match t {
            tag::TAPER_OFFSET => self.taper_offset = vec2_value(t, value)?,
            tag::ZERO_PASS => self.zero_pass = bool_value(t, value)?,
            tag::HELICAL => self.helical = bool_value(t, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn write_xml(&self, comment: &str, flags: BlockFlags, attrs: &mut AttrWriter) {
        attrs.common(comment, flags);
        attrs.vec2("taper-offset", self.taper_offset);
        attrs.bool("zero-pass", self.zero_pass);
        attrs.bool("helical", self.helical);
    }

    fn parse_xml(&mut self, attrs: &AttrReader<'_>) -> CodecResult<()> {
        if let Some(taper) = attrs.vec2("taper-offset")? {
            self.taper_offset = taper;
        }
        if let Some(zero_pass) = attrs.bool("zero-pass")? {
            self.zero_pass = zero_pass;
        }
        if let Some(helical) = attrs.bool("helical")? {
            self.helical = helical;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(clockwise: bool) -> Vec<Segment> {
        let mut corners = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        if clockwise {
            corners.reverse();
        }
        (0..4)
            .map(|i| Segment::Line {
                start: corners[i],
                end: corners[(i + 1) % 4],
            })
            .collect()
    }

    #[test]
    fn test_chain_splits_at_gaps() {
        let mut segments = square(false);
        segments.push(Segment::Line {
            start: Vec2::new(20.0, 0.0),
            end: Vec2::new(30.0, 0.0),
        });
        let contours = chain(segments);
        assert_eq!(contours.len(), 2);
        assert!(contours[0].is_closed());
        assert!(!contours[1].is_closed());
    }

    #[test]
    fn test_signed_area_and_winding() {
        let ccw = &chain(square(false))[0];
        let cw = &chain(square(true))[0];
        assert!((ccw.signed_area() - 100.0).abs() < 1e-9);
        assert!((cw.signed_area() + 100.0).abs() < 1e-9);

        assert_eq!(compensation_word(CutSide::Outside, ccw.signed_area()), "G42");
        assert_eq!(compensation_word(CutSide::Inside, ccw.signed_area()), "G41");
        assert_eq!(compensation_word(CutSide::Outside, cw.signed_area()), "G41");
    }

    #[test]
    fn test_full_circle_area() {
        let circle = Contour {
            segments: vec![Segment::Arc {
                start: Vec2::new(2.0, 0.0),
                end: Vec2::new(2.0, 0.0),
                center: Vec2::ZERO,
                sweep: 360.0,
            }],
        };
        assert!(circle.is_closed());
        assert!((circle.signed_area() - std::f64::consts::PI * 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_taper_shift() {
        let sketch = Sketch {
            taper_offset: Vec2::new(1.0, 0.0),
            ..Sketch::default()
        };
        assert_eq!(sketch.taper_shift(-2.0, 0.0, -4.0), Vec2::new(0.5, 0.0));
        assert_eq!(sketch.taper_shift(-2.0, 0.0, 0.0), Vec2::ZERO);
    }
}
