//! Toolpath order optimizer
//!
//! Greedy nearest-neighbor ordering used for drill holes and slice segments.

use gcamkit_core::{Vec2, PRECISION};
use tracing::debug;

/// Path ordering strategies
#[derive(Debug)]
pub struct PathOptimizer;

impl PathOptimizer {
    /// Reorder `items` by greedy nearest neighbor, starting at the first item.
    ///
    /// At each step every later item within [`PRECISION`] of the cursor is
    /// dropped, then the closest remaining item (first found on ties) is moved
    /// directly after the cursor. Each surviving item appears exactly once.
    pub fn nearest_neighbor<T, F>(items: Vec<T>, position: F) -> Vec<T>
    where
        F: Fn(&T) -> Vec2,
    {
        let mut work = items;
        let original = work.len();
        let mut cursor = 0;

        while cursor < work.len() {
            let here = position(&work[cursor]);

            let mut i = cursor + 1;
            while i < work.len() {
                if position(&work[i]).distance_to(&here) < PRECISION {
                    work.remove(i);
                } else {
                    i += 1;
                }
            }

            let mut best: Option<(usize, f64)> = None;
            for (i, item) in work.iter().enumerate().skip(cursor + 1) {
                let d = position(item).distance_to(&here);
                if best.map_or(true, |(_, bd)| d < bd) {
                    best = Some((i, d));
                }
            }
            if let Some((i, _)) = best {
                let next = work.remove(i);
                work.insert(cursor + 1, next);
            }

            cursor += 1;
        }

        if work.len() < original {
            debug!(
                "optimizer merged {} duplicate positions, {} remain",
                original - work.len(),
                work.len()
            );
        }
        work
    }

    /// Order points by nearest neighbor.
    pub fn order_points(points: Vec<Vec2>) -> Vec<Vec2> {
        Self::nearest_neighbor(points, |p| *p)
    }

    /// Total rapid distance visiting `points` in order.
    pub fn path_length(points: &[Vec2]) -> f64 {
        points
            .windows(2)
            .map(|pair| pair[0].distance_to(&pair[1]))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_by_proximity() {
        let points = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(1.0, 0.0),
        ];
        let ordered = PathOptimizer::order_points(points);
        assert_eq!(
            ordered,
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(10.0, 0.0)
            ]
        );
    }

    #[test]
    fn test_merges_coincident_points() {
        let points = vec![Vec2::new(0.0, 0.0), Vec2::new(1e-7, 1e-7)];
        assert_eq!(PathOptimizer::order_points(points).len(), 1);
    }

    #[test]
    fn test_tie_keeps_first_found() {
        let points = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
        ];
        let ordered = PathOptimizer::order_points(points);
        assert_eq!(ordered[1], Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_empty_and_single() {
        assert!(PathOptimizer::order_points(Vec::new()).is_empty());
        let one = vec![Vec2::new(3.0, 4.0)];
        assert_eq!(PathOptimizer::order_points(one.clone()), one);
    }

    #[test]
    fn test_path_length() {
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(3.0, 4.0), Vec2::new(3.0, 0.0)];
        assert_eq!(PathOptimizer::path_length(&pts), 9.0);
    }
}
