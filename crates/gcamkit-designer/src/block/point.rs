use gcamkit_core::math::rotate_about;
use gcamkit_core::Vec2;

use super::{BlockFlags, BlockPayload, FlipAxis};
use crate::error::CodecResult;
use crate::serialization::binary::{vec2_value, BinWriter};
use crate::serialization::tags::point as tag;
use crate::serialization::xml::{AttrReader, AttrWriter};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub position: Vec2,
}

impl Point {
    pub fn new(position: Vec2) -> Self {
        Self { position }
    }
}

impl BlockPayload for Point {
    fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    fn spin(&mut self, datum: Vec2, angle: f64) {
        self.position = rotate_about(self.position, datum, angle);
    }

    fn scale(&mut self, factor: f64) {
        self.position = self.position * factor;
    }

    fn flip(&mut self, datum: Vec2, axis: FlipAxis) {
        self.position = axis.mirror(self.position, datum);
    }

    fn ends(&self) -> Option<(Vec2, Vec2)> {
        Some((self.position, self.position))
    }

    fn save_fields(&self, w: &mut BinWriter) {
        w.record_vec2(tag::POSITION, self.position);
    }

    fn load_field(&mut self, t: u8, value: &[u8]) -> CodecResult<bool> {
        match t {
            tag::POSITION => self.position = vec2_value(t, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn write_xml(&self, comment: &str, flags: BlockFlags, attrs: &mut AttrWriter) {
        attrs.common(comment, flags);
        attrs.vec2("position", self.position);
    }

    fn parse_xml(&mut self, attrs: &AttrReader<'_>) -> CodecResult<()> {
        if let Some(position) = attrs.vec2("position")? {
            self.position = position;
        }
        Ok(())
    }
}
