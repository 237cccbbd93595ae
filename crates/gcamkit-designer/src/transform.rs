//! Geometric edits
//!
//! Transforms edit a block's payload and then walk down the tree, applying the
//! same edit to every descendant that supports it. Scaling also reaches
//! extruders. BoltHoles regenerate their circles instead of transforming them.

use gcamkit_core::{Units, Vec2};
use tracing::debug;

use crate::block::{BlockKind, FlipAxis, Operation, Payload, Transform};
use crate::error::{BlockError, Result};
use crate::program::{BlockId, Program};

impl Program {
    pub fn translate(&mut self, id: BlockId, delta: Vec2) -> Result<()> {
        self.transform(id, Transform::Move(delta))
    }

    /// Rotate by `angle` degrees about `datum`.
    pub fn spin(&mut self, id: BlockId, datum: Vec2, angle: f64) -> Result<()> {
        self.transform(id, Transform::Spin { datum, angle })
    }

    pub fn scale(&mut self, id: BlockId, factor: f64) -> Result<()> {
        self.transform(id, Transform::Scale(factor))
    }

    pub fn flip(&mut self, id: BlockId, datum: Vec2, axis: FlipAxis) -> Result<()> {
        self.transform(id, Transform::Flip { datum, axis })
    }

    /// Apply `transform` to `id` and its subtree.
    pub fn transform(&mut self, id: BlockId, transform: Transform) -> Result<()> {
        let kind = self.block(id)?.kind();
        let operation = transform.operation();
        if !kind.supports(operation) {
            return Err(BlockError::Unsupported { kind, operation });
        }
        if let Transform::Scale(factor) = transform {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(BlockError::InvalidParameter {
                    name: "factor",
                    reason: format!("must be a positive number, got {}", factor),
                });
            }
        }
        debug!("{} {:?}: {:?}", operation, id, transform);
        self.apply_transform(id, &transform);
        Ok(())
    }

    fn apply_transform(&mut self, id: BlockId, transform: &Transform) {
        let Some(block) = self.get_mut(id) else {
            return;
        };
        block.payload.apply(transform);
        let kind = block.kind();
        let scaling = matches!(transform, Transform::Scale(_));

        if scaling {
            if let Some(extruder) = self.extruder(id) {
                self.apply_transform(extruder, transform);
            }
        }
        if kind == BlockKind::BoltHoles {
            self.rebuild_bolt_holes(id);
            return;
        }

        let operation = transform.operation();
        let children: Vec<BlockId> = self.children(id).to_vec();
        for child in children {
            let supported = self
                .get(child)
                .is_some_and(|b| b.kind().supports(operation));
            if supported {
                self.apply_transform(child, transform);
            }
        }
    }

    /// Switch the program to `units`, scaling all geometry, tool feeds and
    /// configuration lengths.
    pub fn set_units(&mut self, units: Units) {
        let factor = self.config.units.factor_to(units);
        if (factor - 1.0).abs() < f64::EPSILON {
            return;
        }
        let scale = Transform::Scale(factor);
        for root in self.roots().to_vec() {
            let supported = self
                .get(root)
                .is_some_and(|b| b.kind().supports(Operation::Scale));
            if supported {
                self.apply_transform(root, &scale);
            }
        }
        for id in self.ids() {
            if let Some(Payload::Tool(tool)) = self.get_mut(id).map(|b| &mut b.payload) {
                tool.feed *= factor;
            }
        }
        self.config.convert_units(units);
        debug!("converted program to {}", units.as_str());
    }
}
