use gcamkit_camtools::{slice_mesh, z_range, PathOptimizer};
use gcamkit_core::{Vec2, Vec3, PRECISION};

use super::{BlockFlags, BlockPayload};
use crate::error::{CodecError, CodecResult};
use crate::make::Generation;
use crate::program::BlockId;
use crate::serialization::binary::{triangles_value, u32_value, BinWriter};
use crate::serialization::tags::stl as tag;
use crate::serialization::xml::{AttrReader, AttrWriter};

/// Triangle mesh cut as waterline slices. The top of the mesh sits at the
/// material surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Stl {
    pub triangles: Vec<[Vec3; 3]>,
    pub slices: u32,
}

impl Default for Stl {
    fn default() -> Self {
        Self {
            triangles: Vec::new(),
            slices: 10,
        }
    }
}

impl Stl {
    pub fn set_triangles(&mut self, triangles: Vec<[Vec3; 3]>) {
        self.triangles = triangles;
    }

    /// Slice heights in mesh coordinates, top to bottom.
    pub fn levels(&self) -> Vec<f64> {
        let Some((zmin, zmax)) = z_range(&self.triangles) else {
            return Vec::new();
        };
        let slices = self.slices.max(1);
        (1..=slices)
            .map(|i| {
                let level = zmax - (zmax - zmin) * i as f64 / slices as f64;
                level.max(zmin + PRECISION)
            })
            .collect()
    }

    pub(crate) fn make(&self, gen: &mut Generation<'_>, id: BlockId, comment: &str) -> String {
        let Some((_, zmax)) = z_range(&self.triangles) else {
            return String::new();
        };
        let Some(tool) = gen.require_tool(id) else {
            return String::new();
        };
        let config = gen.config();
        let offset = gen.program().resolve_offset(id);
        let top = offset.top();

        let mut w = gen.writer();
        w.comment(&format!("STL: {}", comment));
        for level in self.levels() {
            let depth = top + (level - zmax);
            let segments =
                PathOptimizer::nearest_neighbor(slice_mesh(&self.triangles, level), |s| s.start);

            let mut position: Option<Vec2> = None;
            for segment in segments {
                let start = offset.apply(segment.start);
                let end = offset.apply(segment.end);
                let connected = position.is_some_and(|p| p.approx_eq(&start));
                if !connected {
                    w.rapid_z(config.ztraverse);
                    w.rapid_xy(start);
                    w.feed_z(depth, tool.plunge_feed());
                }
                w.feed_xy(end, (!connected).then_some(tool.feed));
                position = Some(end);
            }
        }
        w.rapid_z(config.ztraverse);
        w.finish()
    }
}

impl BlockPayload for Stl {
    fn translate(&mut self, delta: Vec2) {
        let shift = Vec3::new(delta.x, delta.y, 0.0);
        for vertex in self.triangles.iter_mut().flatten() {
            *vertex = *vertex + shift;
        }
    }

    fn scale(&mut self, factor: f64) {
        for vertex in self.triangles.iter_mut().flatten() {
            *vertex = *vertex * factor;
        }
    }

    fn save_fields(&self, w: &mut BinWriter) {
        w.record_u32(tag::SLICES, self.slices);
        w.record_triangles(tag::TRIANGLES, &self.triangles);
    }

    fn load_field(&mut self, t: u8, value: &[u8]) -> CodecResult<bool> {
        match t {
            tag::SLICES => self.slices = u32_value(t, value)?,
            tag::TRIANGLES => self.triangles = triangles_value(t, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn write_xml(&self, comment: &str, flags: BlockFlags, attrs: &mut AttrWriter) {
        attrs.common(comment, flags);
        attrs.u32("slices", self.slices);
        attrs.list(
            "triangles",
            self.triangles
                .iter()
                .flatten()
                .flat_map(|v| [v.x, v.y, v.z]),
        );
    }

    fn parse_xml(&mut self, attrs: &AttrReader<'_>) -> CodecResult<()> {
        if let Some(slices) = attrs.u32("slices")? {
            self.slices = slices;
        }
        if let Some(values) = attrs.f64_list("triangles")? {
            if values.len() % 9 != 0 {
                return Err(CodecError::InvalidAttribute {
                    name: "triangles".to_string(),
                    value: format!("{} values", values.len()),
                });
            }
            self.triangles = values
                .chunks_exact(9)
                .map(|c| {
                    [
                        Vec3::new(c[0], c[1], c[2]),
                        Vec3::new(c[3], c[4], c[5]),
                        Vec3::new(c[6], c[7], c[8]),
                    ]
                })
                .collect();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetra() -> Vec<[Vec3; 3]> {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(10.0, 0.0, 0.0);
        let c = Vec3::new(0.0, 10.0, 0.0);
        let d = Vec3::new(0.0, 0.0, 4.0);
        vec![[a, b, c], [a, b, d], [b, c, d], [c, a, d]]
    }

    #[test]
    fn test_levels_even_and_above_floor() {
        let stl = Stl {
            triangles: tetra(),
            slices: 4,
        };
        let levels = stl.levels();
        assert_eq!(levels.len(), 4);
        assert!((levels[0] - 3.0).abs() < 1e-12);
        assert!((levels[2] - 1.0).abs() < 1e-12);
        assert!(levels[3] > 0.0 && levels[3] < 1e-4);
    }

    #[test]
    fn test_empty_mesh_has_no_levels() {
        assert!(Stl::default().levels().is_empty());
    }

    #[test]
    fn test_translate_keeps_z() {
        let mut stl = Stl {
            triangles: tetra(),
            slices: 1,
        };
        stl.translate(Vec2::new(1.0, 2.0));
        assert_eq!(stl.triangles[0][0], Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(stl.triangles[3][2], Vec3::new(1.0, 2.0, 4.0));
    }
}
