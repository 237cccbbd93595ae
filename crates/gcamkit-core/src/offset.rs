//! Offset / transform record
//!
//! Every block that places geometry resolves an [`Offset`]: the rotation and
//! origin that map its local coordinates into machine coordinates, together
//! with the depth span and tool compensation state used while generating
//! toolpaths.

use crate::math::{rotate2d, wrap_degrees, Vec2};
use serde::{Deserialize, Serialize};

/// Placement and compensation state inherited down the block tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    /// +1 cuts outside the contour, -1 inside.
    pub side: f64,
    /// Compensation radius.
    pub tool: f64,
    /// Lateral profile value at the current depth.
    pub eval: f64,
    /// Rotation in degrees.
    pub rotation: f64,
    pub origin: Vec2,
    /// `[top, bottom]`
    pub z: [f64; 2],
}

impl Default for Offset {
    fn default() -> Self {
        Self {
            side: 1.0,
            tool: 0.0,
            eval: 0.0,
            rotation: 0.0,
            origin: Vec2::ZERO,
            z: [0.0, 0.0],
        }
    }
}

impl Offset {
    /// Map a local point into absolute coordinates.
    pub fn apply(&self, local: Vec2) -> Vec2 {
        rotate2d(local, self.rotation) + self.origin
    }

    /// Absolute angle of a local angle.
    pub fn apply_angle(&self, angle: f64) -> f64 {
        wrap_degrees(angle + self.rotation)
    }

    /// Take rotation and origin from the parent's resolved record, keeping the
    /// rest of this record.
    pub fn placed_under(&self, parent: &Offset) -> Offset {
        Offset {
            rotation: parent.rotation,
            origin: parent.origin,
            ..*self
        }
    }

    /// Stack a local placement (position + rotation) on top of this record.
    pub fn compose(&self, position: Vec2, rotation: f64) -> Offset {
        Offset {
            origin: self.apply(position),
            rotation: wrap_degrees(self.rotation + rotation),
            ..*self
        }
    }

    pub fn top(&self) -> f64 {
        self.z[0]
    }

    pub fn bottom(&self) -> f64 {
        self.z[1]
    }
}
