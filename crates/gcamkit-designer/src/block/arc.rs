use gcamkit_core::math::{arc_center, arc_end, rotate_about, wrap_degrees};
use gcamkit_core::Vec2;

use super::{BlockFlags, BlockPayload, FlipAxis};
use crate::error::CodecResult;
use crate::serialization::binary::{f64_value, vec2_value, BinWriter};
use crate::serialization::tags::arc as tag;
use crate::serialization::xml::{AttrReader, AttrWriter};

/// Circular arc stored by its start point.
///
/// `start_angle` is the direction from the center to `start`; `sweep` is
/// signed degrees, positive counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arc {
    pub start: Vec2,
    pub radius: f64,
    pub start_angle: f64,
    pub sweep: f64,
}

impl Default for Arc {
    fn default() -> Self {
        Self {
            start: Vec2::new(1.0, 0.0),
            radius: 1.0,
            start_angle: 0.0,
            sweep: 90.0,
        }
    }
}

impl Arc {
    pub fn new(start: Vec2, radius: f64, start_angle: f64, sweep: f64) -> Self {
        Self {
            start,
            radius,
            start_angle,
            sweep,
        }
    }

    /// Full counter-clockwise circle starting at angle 0.
    pub fn circle(center: Vec2, radius: f64) -> Self {
        Self::new(center + Vec2::new(radius, 0.0), radius, 0.0, 360.0)
    }

    pub fn center(&self) -> Vec2 {
        arc_center(self.start, self.radius, self.start_angle)
    }

    pub fn end(&self) -> Vec2 {
        arc_end(self.start, self.radius, self.start_angle, self.sweep)
    }

    pub fn length(&self) -> f64 {
        self.radius * self.sweep.abs().to_radians()
    }
}

impl BlockPayload for Arc {
    fn translate(&mut self, delta: Vec2) {
        self.start += delta;
    }

    fn spin(&mut self, datum: Vec2, angle: f64) {
        self.start = rotate_about(self.start, datum, angle);
        self.start_angle = wrap_degrees(self.start_angle + angle);
    }

    fn scale(&mut self, factor: f64) {
        self.start = self.start * factor;
        self.radius *= factor;
    }

    fn flip(&mut self, datum: Vec2, axis: FlipAxis) {
        self.start = axis.mirror(self.start, datum);
        self.start_angle = axis.mirror_angle(self.start_angle);
        self.sweep = -self.sweep;
    }

    fn ends(&self) -> Option<(Vec2, Vec2)> {
        Some((self.start, self.end()))
    }

    fn save_fields(&self, w: &mut BinWriter) {
        w.record_vec2(tag::START_POINT, self.start);
        w.record_f64(tag::RADIUS, self.radius);
        w.record_f64(tag::START_ANGLE, self.start_angle);
        w.record_f64(tag::SWEEP_ANGLE, self.sweep);
    }

    fn load_field(&mut self, t: u8, value: &[u8]) -> CodecResult<bool> {
        match t {
            tag::START_POINT => self.start = vec2_value(t, value)?,
            tag::RADIUS => self.radius = f64_value(t, value)?,
            tag::START_ANGLE => self.start_angle = f64_value(t, value)?,
            tag::SWEEP_ANGLE => self.sweep = f64_value(t, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn write_xml(&self, comment: &str, flags: BlockFlags, attrs: &mut AttrWriter) {
        attrs.common(comment, flags);
        attrs.vec2("start", self.start);
        attrs.f64("radius", self.radius);
        attrs.f64("start-angle", self.start_angle);
        attrs.f64("sweep", self.sweep);
    }

    fn parse_xml(&mut self, attrs: &AttrReader<'_>) -> CodecResult<()> {
        if let Some(start) = attrs.vec2("start")? {
            self.start = start;
        }
        if let Some(radius) = attrs.f64("radius")? {
            self.radius = radius;
        }
        if let Some(angle) = attrs.f64("start-angle")? {
            self.start_angle = angle;
        }
        if let Some(sweep) = attrs.f64("sweep")? {
            self.sweep = sweep;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arc_end_points() {
        let arc = Arc::new(Vec2::new(1.0, 0.0), 1.0, 0.0, 90.0);
        assert!(arc.center().approx_eq(&Vec2::ZERO));
        assert!(arc.end().approx_eq(&Vec2::new(0.0, 1.0)));

        let circle = Arc::circle(Vec2::new(5.0, 5.0), 2.0);
        assert!(circle.end().approx_eq(&circle.start));
    }

    #[test]
    fn test_arc_spin_keeps_center_relation() {
        let mut arc = Arc::new(Vec2::new(1.0, 0.0), 1.0, 0.0, 90.0);
        arc.spin(Vec2::ZERO, 90.0);
        assert!(arc.center().approx_eq(&Vec2::ZERO));
        assert!(arc.end().approx_eq(&Vec2::new(-1.0, 0.0)));
        assert_eq!(arc.start_angle, 90.0);
    }

    #[test]
    fn test_arc_flip_reverses_sweep() {
        let mut arc = Arc::new(Vec2::new(2.0, 1.0), 1.0, 0.0, 90.0);
        arc.flip(Vec2::ZERO, FlipAxis::Vertical);
        assert_eq!(arc.sweep, -90.0);
        assert!(arc.center().approx_eq(&Vec2::new(-1.0, 1.0)));
        assert!(arc.end().approx_eq(&Vec2::new(-1.0, 2.0)));
    }

    #[test]
    fn test_arc_scale() {
        let mut arc = Arc::circle(Vec2::new(1.0, 1.0), 1.0);
        arc.scale(2.0);
        assert!(arc.center().approx_eq(&Vec2::new(2.0, 2.0)));
        assert_eq!(arc.radius, 2.0);
    }
}
