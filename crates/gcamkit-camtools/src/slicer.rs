//! Triangle mesh slicing
//!
//! Cuts triangle soups with horizontal planes to produce waterline segments.

use gcamkit_core::{Vec2, Vec3, PRECISION};

/// One waterline segment in the XY plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Vec2,
    pub end: Vec2,
}

/// Lowest and highest Z of a mesh, or `None` when empty.
pub fn z_range(triangles: &[[Vec3; 3]]) -> Option<(f64, f64)> {
    let mut vertices = triangles.iter().flatten();
    let first = vertices.next()?;
    Some(vertices.fold((first.z, first.z), |(lo, hi), v| {
        (lo.min(v.z), hi.max(v.z))
    }))
}

/// Intersect one triangle with the plane `Z = z`.
///
/// Vertices exactly on the plane count as above it so a plane through a
/// vertex yields at most one segment.
pub fn slice_triangle(triangle: &[Vec3; 3], z: f64) -> Option<Segment> {
    let mut hits = Vec::with_capacity(2);
    for i in 0..3 {
        let a = triangle[i];
        let b = triangle[(i + 1) % 3];
        if (a.z >= z) != (b.z >= z) {
            let t = (z - a.z) / (b.z - a.z);
            hits.push(a.lerp(&b, t).xy());
        }
    }
    match hits.as_slice() {
        [start, end] if start.distance_to(end) >= PRECISION => Some(Segment {
            start: *start,
            end: *end,
        }),
        _ => None,
    }
}

/// All segments where the plane `Z = z` cuts the mesh.
pub fn slice_mesh(triangles: &[[Vec3; 3]], z: f64) -> Vec<Segment> {
    triangles
        .iter()
        .filter_map(|t| slice_triangle(t, z))
        .collect()
}
