use gcamkit_camtools::{DrillCycleGenerator, DrillCycleParameters, PathOptimizer};
use gcamkit_core::{ProgramConfig, Vec2};
use tracing::warn;

use super::{BlockFlags, BlockPayload, Payload};
use crate::error::CodecResult;
use crate::make::Generation;
use crate::program::{BlockId, Program};
use crate::serialization::binary::{bool_value, f64_value, BinWriter};
use crate::serialization::tags::drill_holes as tag;
use crate::serialization::xml::{AttrReader, AttrWriter};

/// Holes drilled at each Point child.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrillHoles {
    /// Hole depth below the surface, zero or negative.
    pub depth: f64,
    /// Peck step; zero drills each hole in one plunge.
    pub increment: f64,
    /// Reorder holes by nearest neighbor and merge duplicates.
    pub optimal_path: bool,
}

impl DrillHoles {
    pub fn new(config: &ProgramConfig) -> Self {
        Self {
            depth: -config.material_size.z,
            increment: 0.0,
            optimal_path: false,
        }
    }

    /// Absolute hole positions in drilling order.
    pub fn holes(&self, program: &Program, id: BlockId) -> Vec<Vec2> {
        let offset = program.resolve_offset(id);
        let points: Vec<Vec2> = program
            .children(id)
            .iter()
            .filter_map(|child| program.get(*child))
            .filter(|block| !block.is_suppressed())
            .filter_map(|block| match &block.payload {
                Payload::Point(point) => Some(offset.apply(point.position)),
                _ => None,
            })
            .collect();

        if self.optimal_path {
            PathOptimizer::order_points(points)
        } else {
            points
        }
    }

    pub(crate) fn make(&self, gen: &mut Generation<'_>, id: BlockId, comment: &str) -> String {
        let program = gen.program();
        let holes = self.holes(program, id);
        if holes.is_empty() {
            return String::new();
        }
        let Some(tool) = gen.require_tool(id) else {
            return String::new();
        };
        let config = gen.config();
        let offset = program.resolve_offset(id);

        let params = DrillCycleParameters {
            top_z: offset.top(),
            depth: offset.bottom(),
            increment: self.increment,
            plunge_feed: tool.plunge_feed(),
            feed: tool.feed,
            traverse_z: config.ztraverse,
        };
        if let Err(e) = params.validate() {
            warn!("drill holes '{}': {}", comment, e);
            gen.note(id, e.to_string());
            return String::new();
        }

        let mut w = gen.writer();
        w.comment(&format!("Drill Holes: {}", comment));
        DrillCycleGenerator::new(params).generate(&mut w, &holes, config.uses_canned_cycles());
        w.finish()
    }
}

impl BlockPayload for DrillHoles {
    fn scale(&mut self, factor: f64) {
        self.depth *= factor;
        self.increment *= factor;
    }

    fn save_fields(&self, w: &mut BinWriter) {
        w.record_f64(tag::DEPTH, self.depth);
        w.record_f64(tag::INCREMENT, self.increment);
        w.record_bool(tag::OPTIMAL_PATH, self.optimal_path);
    }

    fn load_field(&mut self, t: u8, value: &[u8]) -> CodecResult<bool> {
        match t {
            tag::DEPTH => self.depth = f64_value(t, value)?,
            tag::INCREMENT => self.increment = f64_value(t, value)?,
            tag::OPTIMAL_PATH => self.optimal_path = bool_value(t, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn write_xml(&self, comment: &str, flags: BlockFlags, attrs: &mut AttrWriter) {
        attrs.common(comment, flags);
        attrs.f64("depth", self.depth);
        attrs.f64("increment", self.increment);
        attrs.bool("optimal-path", self.optimal_path);
    }

    fn parse_xml(&mut self, attrs: &AttrReader<'_>) -> CodecResult<()> {
        if let Some(depth) = attrs.f64("depth")? {
            self.depth = depth;
        }
        if let Some(increment) = attrs.f64("increment")? {
            self.increment = increment;
        }
        if let Some(optimal) = attrs.bool("optimal-path")? {
            self.optimal_path = optimal;
        }
        Ok(())
    }
}
