//! Repeating the children of a container.

use gcamkit_core::Vec2;
use tracing::debug;

use crate::block::{Operation, Transform};
use crate::error::Result;
use crate::program::{BlockId, Program};

impl Program {
    /// Append `count - 1` copies of `id`'s current children. Copy `i` is
    /// rotated by `i * angle` about `datum` and then moved by `i * delta`.
    ///
    /// Returns the ids of the new top-level copies in insertion order.
    pub fn generate_pattern(
        &mut self,
        id: BlockId,
        count: u32,
        delta: Vec2,
        datum: Vec2,
        angle: f64,
    ) -> Result<Vec<BlockId>> {
        self.block(id)?;
        if count <= 1 {
            return Ok(Vec::new());
        }

        let originals: Vec<BlockId> = self.children(id).to_vec();
        let mut copies = Vec::with_capacity(originals.len() * (count as usize - 1));
        for i in 1..count {
            let step = f64::from(i);
            for original in &originals {
                let copy = self.clone_block(*original, Some(id))?;
                let kind = self.block(copy)?.kind();
                if angle != 0.0 && kind.supports(Operation::Spin) {
                    self.transform(
                        copy,
                        Transform::Spin {
                            datum,
                            angle: angle * step,
                        },
                    )?;
                }
                if kind.supports(Operation::Move) {
                    self.transform(copy, Transform::Move(delta * step))?;
                }
                copies.push(copy);
            }
        }
        debug!("pattern of {:?}: {} copies", id, copies.len());
        Ok(copies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, BlockFlags, BlockKind, Payload, Point};

    fn holes_with_point() -> (Program, BlockId) {
        let mut p = Program::default();
        let config = p.config.clone();
        let holes = p.insert(None, Block::new(BlockKind::DrillHoles, &config)).unwrap();
        p.insert(Some(holes), Block::from_payload(Point::new(Vec2::new(1.0, 0.0))))
            .unwrap();
        (p, holes)
    }

    fn position(p: &Program, id: BlockId) -> Vec2 {
        match &p.get(id).unwrap().payload {
            Payload::Point(point) => point.position,
            other => panic!("expected point, got {:?}", other),
        }
    }

    #[test]
    fn test_count_one_is_noop() {
        let (mut p, holes) = holes_with_point();
        for count in [0, 1] {
            let copies = p
                .generate_pattern(holes, count, Vec2::new(5.0, 0.0), Vec2::ZERO, 0.0)
                .unwrap();
            assert!(copies.is_empty());
            assert_eq!(p.children(holes).len(), 1);
        }
    }

    #[test]
    fn test_linear_pattern() {
        let (mut p, holes) = holes_with_point();
        let copies = p
            .generate_pattern(holes, 3, Vec2::new(5.0, 0.0), Vec2::ZERO, 0.0)
            .unwrap();
        assert_eq!(copies.len(), 2);
        assert_eq!(&p.children(holes)[1..], copies.as_slice());
        assert!(position(&p, copies[0]).approx_eq(&Vec2::new(6.0, 0.0)));
        assert!(position(&p, copies[1]).approx_eq(&Vec2::new(11.0, 0.0)));
    }

    #[test]
    fn test_polar_pattern() {
        let (mut p, holes) = holes_with_point();
        let copies = p
            .generate_pattern(holes, 4, Vec2::ZERO, Vec2::ZERO, 90.0)
            .unwrap();
        assert!(position(&p, copies[0]).approx_eq(&Vec2::new(0.0, 1.0)));
        assert!(position(&p, copies[1]).approx_eq(&Vec2::new(-1.0, 0.0)));
        assert!(position(&p, copies[2]).approx_eq(&Vec2::new(0.0, -1.0)));
    }

    #[test]
    fn test_locked_children_are_copied() {
        let (mut p, holes) = holes_with_point();
        let original = p.children(holes)[0];
        p.get_mut(original).unwrap().flags = BlockFlags::LOCK;
        let copies = p
            .generate_pattern(holes, 2, Vec2::new(1.0, 1.0), Vec2::ZERO, 0.0)
            .unwrap();
        assert!(p.get(copies[0]).unwrap().is_locked());
        assert!(position(&p, original).approx_eq(&Vec2::new(1.0, 0.0)));
    }
}
