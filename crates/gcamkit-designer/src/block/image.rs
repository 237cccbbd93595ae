use gcamkit_core::{ProgramConfig, Vec2, Vec3};

use super::{BlockFlags, BlockPayload};
use crate::error::{BlockError, CodecResult, Result};
use crate::make::Generation;
use crate::program::BlockId;
use crate::serialization::binary::{f32s_value, u32_pair_value, vec2_value, vec3_value, BinWriter};
use crate::serialization::tags::image as tag;
use crate::serialization::xml::{AttrReader, AttrWriter};

/// Depth map carved as a zig-zag raster.
///
/// `dmap` is row-major, values in `[0, 1]` with 1 the deepest; row 0 lies at
/// the top edge (largest Y).
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub position: Vec2,
    /// Width, height and maximum depth.
    pub size: Vec3,
    /// Columns and rows of `dmap`.
    pub resolution: [u32; 2],
    pub dmap: Vec<f32>,
}

impl Image {
    pub fn new(config: &ProgramConfig) -> Self {
        Self {
            position: Vec2::ZERO,
            size: Vec3::new(
                config.material_size.x,
                config.material_size.y,
                config.units.from_mm(1.0),
            ),
            resolution: [0, 0],
            dmap: Vec::new(),
        }
    }

    /// Replace the depth map. Values are clamped into `[0, 1]`.
    pub fn set_depth_map(&mut self, resolution: [u32; 2], dmap: Vec<f32>) -> Result<()> {
        let expected = resolution[0] as usize * resolution[1] as usize;
        if dmap.len() != expected {
            return Err(BlockError::InvalidParameter {
                name: "dmap",
                reason: format!(
                    "{} values for a {}x{} grid",
                    dmap.len(),
                    resolution[0],
                    resolution[1]
                ),
            });
        }
        self.resolution = resolution;
        self.dmap = dmap.into_iter().map(|v| v.clamp(0.0, 1.0)).collect();
        Ok(())
    }

    pub fn value(&self, col: u32, row: u32) -> Option<f32> {
        let [cols, rows] = self.resolution;
        if col >= cols || row >= rows {
            return None;
        }
        self.dmap
            .get(row as usize * cols as usize + col as usize)
            .copied()
    }

    fn has_data(&self) -> bool {
        let [cols, rows] = self.resolution;
        cols > 0 && rows > 0 && self.dmap.len() == cols as usize * rows as usize
    }

    /// Local XY of a cell center.
    pub fn cell_center(&self, col: u32, row: u32) -> Vec2 {
        let [cols, rows] = self.resolution;
        let dx = self.size.x / cols.max(1) as f64;
        let dy = self.size.y / rows.max(1) as f64;
        Vec2::new(
            self.position.x + (col as f64 + 0.5) * dx,
            self.position.y + self.size.y - (row as f64 + 0.5) * dy,
        )
    }

    pub(crate) fn make(&self, gen: &mut Generation<'_>, id: BlockId, comment: &str) -> String {
        if !self.has_data() {
            return String::new();
        }
        let Some(tool) = gen.require_tool(id) else {
            return String::new();
        };
        let config = gen.config();
        let offset = gen.program().resolve_offset(id);
        let top = offset.top();
        let [cols, rows] = self.resolution;

        let mut w = gen.writer();
        w.comment(&format!("Image: {}", comment));
        w.rapid_z(config.ztraverse);

        let mut started = false;
        for row in 0..rows {
            let order: Vec<u32> = if row % 2 == 0 {
                (0..cols).collect()
            } else {
                (0..cols).rev().collect()
            };
            for col in order {
                let p = offset.apply(self.cell_center(col, row));
                let depth = self.value(col, row).unwrap_or(0.0) as f64;
                let z = top - depth * self.size.z;
                if started {
                    w.feed_xyz(p, z, None);
                } else {
                    w.rapid_xy(p);
                    w.feed_z(z, tool.plunge_feed());
                    w.feed(tool.feed);
                    started = true;
                }
            }
        }
        w.rapid_z(config.ztraverse);
        w.finish()
    }
}

impl BlockPayload for Image {
    fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    fn scale(&mut self, factor: f64) {
        self.position = self.position * factor;
        self.size = self.size * factor;
    }

    fn save_fields(&self, w: &mut BinWriter) {
        w.record_vec2(tag::POSITION, self.position);
        w.record_vec3(tag::SIZE, self.size);
        w.record_u32_pair(tag::RESOLUTION, self.resolution);
        w.record_f32s(tag::DMAP, &self.dmap);
    }

    fn load_field(&mut self, t: u8, value: &[u8]) -> CodecResult<bool> {
        match t {
            tag::POSITION => self.position = vec2_value(t, value)?,
            tag::SIZE => self.size = vec3_value(t, value)?,
            tag::RESOLUTION => self.resolution = u32_pair_value(t, value)?,
            tag::DMAP => self.dmap = f32s_value(t, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn write_xml(&self, comment: &str, flags: BlockFlags, attrs: &mut AttrWriter) {
        attrs.common(comment, flags);
        attrs.vec2("position", self.position);
        attrs.vec3("size", self.size);
        attrs.list("resolution", self.resolution.iter());
        attrs.list("dmap", self.dmap.iter());
    }

    fn parse_xml(&mut self, attrs: &AttrReader<'_>) -> CodecResult<()> {
        if let Some(position) = attrs.vec2("position")? {
            self.position = position;
        }
        if let Some(size) = attrs.vec3("size")? {
            self.size = size;
        }
        if let Some(resolution) = attrs.u32_pair("resolution")? {
            self.resolution = resolution;
        }
        if let Some(dmap) = attrs.f32_list("dmap")? {
            self.dmap = dmap;
        }
        Ok(())
    }
}
