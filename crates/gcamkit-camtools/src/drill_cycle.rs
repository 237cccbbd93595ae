//! Drilling cycles
//!
//! Emits hole sets either as G81/G83 canned cycles or as explicit rapid and
//! feed moves with optional pecking, plus the helical descent used for holes
//! wider than the cutter.

use crate::error::{CamToolError, CamToolResult};
use crate::gcode::{ArcDirection, GcodeWriter};
use gcamkit_core::{Vec2, PRECISION};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Relief rapid after a peck retract stops at this fraction of the depth
/// just reached.
pub const PECK_RELIEF_RATIO: f64 = 0.95;

/// Upper bound on the levels of one descent. Past it the last step lands on
/// the target depth regardless of the increment.
pub const MAX_PECK_LEVELS: usize = 10_000;

/// Parameters shared by every hole of one drilling operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrillCycleParameters {
    /// Z of the material surface (R plane)
    pub top_z: f64,
    /// Final hole depth
    pub depth: f64,
    /// Maximum depth of each peck. 0 disables pecking.
    pub increment: f64,
    /// Feed for vertical moves
    pub plunge_feed: f64,
    /// Feed restored after the cycle
    pub feed: f64,
    /// Safe travel height between holes
    pub traverse_z: f64,
}

impl DrillCycleParameters {
    pub fn pecks(&self) -> bool {
        self.increment > PRECISION
    }

    pub fn validate(&self) -> CamToolResult<()> {
        if self.increment < 0.0 {
            return Err(CamToolError::Negative {
                name: "increment",
                value: self.increment,
            });
        }
        if self.depth > self.top_z {
            return Err(CamToolError::AboveSurface {
                name: "depth",
                value: self.depth,
                surface: self.top_z,
            });
        }
        if self.plunge_feed <= 0.0 {
            return Err(CamToolError::NotPositive {
                name: "plunge feed",
                value: self.plunge_feed,
            });
        }
        Ok(())
    }
}

/// Successive peck depths from `top` to `depth`, each step at most
/// `increment`, the last exactly `depth`. A non-finite or zero increment
/// gives a single plunge.
pub fn peck_levels(top: f64, depth: f64, increment: f64) -> Vec<f64> {
    if !increment.is_finite() || increment <= PRECISION || !(top - depth).is_finite() {
        return vec![depth];
    }
    let steps = (((top - depth) / increment).ceil().max(1.0) as usize).min(MAX_PECK_LEVELS);
    let mut levels = Vec::with_capacity(steps);
    let mut current = top;
    for _ in 1..steps {
        current -= increment;
        if current <= depth + PRECISION {
            break;
        }
        levels.push(current);
    }
    levels.push(depth);
    levels
}

/// Generator for a set of drilled holes
pub struct DrillCycleGenerator {
    params: DrillCycleParameters,
}

impl DrillCycleGenerator {
    pub fn new(params: DrillCycleParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &DrillCycleParameters {
        &self.params
    }

    /// Emit every hole in order, then the cycle cleanup and final retract.
    pub fn generate(&self, w: &mut GcodeWriter, holes: &[Vec2], canned: bool) {
        let Some((first, rest)) = holes.split_first() else {
            return;
        };
        debug!(
            "drilling {} holes ({}, pecking: {})",
            holes.len(),
            if canned { "canned" } else { "simple" },
            self.params.pecks()
        );
        if canned {
            self.open_canned(w, *first);
            for hole in rest {
                w.line(format!("X{} Y{}", w.num(hole.x), w.num(hole.y)));
            }
            w.line("G80");
            w.feed(self.params.feed);
        } else {
            for hole in holes {
                self.simple_hole(w, *hole);
            }
        }
        w.rapid_z(self.params.traverse_z);
    }

    fn open_canned(&self, w: &mut GcodeWriter, first: Vec2) {
        let p = &self.params;
        let line = if p.pecks() {
            format!(
                "G83 X{} Y{} Z{} R{} Q{} F{}",
                w.num(first.x),
                w.num(first.y),
                w.num(p.depth),
                w.num(p.top_z),
                w.num(p.increment),
                w.num(p.plunge_feed)
            )
        } else {
            format!(
                "G81 X{} Y{} Z{} R{} F{}",
                w.num(first.x),
                w.num(first.y),
                w.num(p.depth),
                w.num(p.top_z),
                w.num(p.plunge_feed)
            )
        };
        w.line(line);
    }

    fn simple_hole(&self, w: &mut GcodeWriter, hole: Vec2) {
        let p = &self.params;
        w.rapid_z(p.traverse_z);
        w.rapid_xy(hole);
        w.rapid_z(p.top_z);

        if !p.pecks() {
            w.feed_z(p.depth, p.plunge_feed);
            return;
        }

        let levels = peck_levels(p.top_z, p.depth, p.increment);
        let last = levels.len().saturating_sub(1);
        for (i, level) in levels.iter().enumerate() {
            w.feed_z(*level, p.plunge_feed);
            if i < last {
                w.rapid_z(p.top_z);
                w.rapid_z(PECK_RELIEF_RATIO * level);
            }
        }
    }
}

/// One level of a helical bore: target depth and path radius at that depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HelicalPass {
    pub z: f64,
    pub radius: f64,
}

/// Spiral down around `center` through each pass, finishing with a flat
/// circle at the last depth and a return to the center.
pub fn helical_bore(
    w: &mut GcodeWriter,
    center: Vec2,
    passes: &[HelicalPass],
    top_z: f64,
    traverse_z: f64,
    plunge_feed: f64,
    feed: f64,
) {
    let Some(first) = passes.first() else {
        return;
    };
    let start = |r: f64| Vec2::new(center.x + r, center.y);

    w.rapid_z(traverse_z);
    w.rapid_xy(start(first.radius));
    w.feed_z(top_z, plunge_feed);

    let mut radius = first.radius;
    for pass in passes {
        if (pass.radius - radius).abs() > PRECISION {
            radius = pass.radius;
            w.feed_xy(start(radius), Some(feed));
        }
        w.arc(
            ArcDirection::Clockwise,
            start(radius),
            Vec2::new(-radius, 0.0),
            Some(pass.z),
            Some(feed),
        );
    }

    w.arc(
        ArcDirection::Clockwise,
        start(radius),
        Vec2::new(-radius, 0.0),
        None,
        Some(feed),
    );
    w.feed_xy(center, Some(feed));
    w.rapid_z(traverse_z);
}
