use gcamkit_core::Vec2;

use super::{BlockFlags, BlockPayload};
use crate::error::CodecResult;
use crate::make::Generation;
use crate::program::BlockId;
use crate::serialization::binary::{f64_value, vec2_value, BinWriter};
use crate::serialization::tags::template as tag;
use crate::serialization::xml::{AttrReader, AttrWriter};

/// Group of blocks placed together.
///
/// Children are expressed in the template's frame: `position` and `rotation`
/// are composed onto the inherited offset. Moving, spinning or flipping a
/// template edits its children; its own placement is edited directly.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Template {
    pub position: Vec2,
    pub rotation: f64,
}

impl Template {
    pub fn new(position: Vec2, rotation: f64) -> Self {
        Self { position, rotation }
    }

    pub(crate) fn make(&self, gen: &mut Generation<'_>, id: BlockId, comment: &str) -> String {
        let mut w = gen.writer();
        w.comment(&format!("Template: {}", comment));
        for child in gen.program().children(id) {
            let code = gen.block(*child);
            w.append(&code);
        }
        w.finish()
    }
}

impl BlockPayload for Template {
    fn scale(&mut self, factor: f64) {
        self.position = self.position * factor;
    }

    fn save_fields(&self, w: &mut BinWriter) {
        w.record_vec2(tag::POSITION, self.position);
        w.record_f64(tag::ROTATION, self.rotation);
    }

    fn load_field(&mut self, t: u8, value: &[u8]) -> CodecResult<bool> {
        match t {
            tag::POSITION => self.position = vec2_value(t, value)?,
            tag::ROTATION => self.rotation = f64_value(t, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn write_xml(&self, comment: &str, flags: BlockFlags, attrs: &mut AttrWriter) {
        attrs.common(comment, flags);
        attrs.vec2("position", self.position);
        attrs.f64("rotation", self.rotation);
    }

    fn parse_xml(&mut self, attrs: &AttrReader<'_>) -> CodecResult<()> {
        if let Some(position) = attrs.vec2("position")? {
            self.position = position;
        }
        if let Some(rotation) = attrs.f64("rotation")? {
            self.rotation = rotation;
        }
        Ok(())
    }
}
