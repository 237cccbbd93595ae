use gcamkit_core::math::rotate_about;
use gcamkit_core::Vec2;

use super::{BlockFlags, BlockPayload, FlipAxis};
use crate::error::CodecResult;
use crate::serialization::binary::{vec2_value, BinWriter};
use crate::serialization::tags::line as tag;
use crate::serialization::xml::{AttrReader, AttrWriter};

/// Straight segment from `p0` to `p1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub p0: Vec2,
    pub p1: Vec2,
}

impl Default for Line {
    fn default() -> Self {
        Self {
            p0: Vec2::ZERO,
            p1: Vec2::new(1.0, 0.0),
        }
    }
}

impl Line {
    pub fn new(p0: Vec2, p1: Vec2) -> Self {
        Self { p0, p1 }
    }

    pub fn length(&self) -> f64 {
        self.p0.distance_to(&self.p1)
    }
}

impl BlockPayload for Line {
    fn translate(&mut self, delta: Vec2) {
        self.p0 += delta;
        self.p1 += delta;
    }

    fn spin(&mut self, datum: Vec2, angle: f64) {
        self.p0 = rotate_about(self.p0, datum, angle);
        self.p1 = rotate_about(self.p1, datum, angle);
    }

    fn scale(&mut self, factor: f64) {
        self.p0 = self.p0 * factor;
        self.p1 = self.p1 * factor;
    }

    fn flip(&mut self, datum: Vec2, axis: FlipAxis) {
        self.p0 = axis.mirror(self.p0, datum);
        self.p1 = axis.mirror(self.p1, datum);
    }

    fn ends(&self) -> Option<(Vec2, Vec2)> {
        Some((self.p0, self.p1))
    }

    fn save_fields(&self, w: &mut BinWriter) {
        w.record_vec2(tag::P0, self.p0);
        w.record_vec2(tag::P1, self.p1);
    }

    fn load_field(&mut self, t: u8, value: &[u8]) -> CodecResult<bool> {
        match t {
            tag::P0 => self.p0 = vec2_value(t, value)?,
            tag::P1 => self.p1 = vec2_value(t, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn write_xml(&self, comment: &str, flags: BlockFlags, attrs: &mut AttrWriter) {
        attrs.common(comment, flags);
        attrs.vec2("p0", self.p0);
        attrs.vec2("p1", self.p1);
    }

    fn parse_xml(&mut self, attrs: &AttrReader<'_>) -> CodecResult<()> {
        if let Some(p0) = attrs.vec2("p0")? {
            self.p0 = p0;
        }
        if let Some(p1) = attrs.vec2("p1")? {
            self.p1 = p1;
        }
        Ok(())
    }
}
