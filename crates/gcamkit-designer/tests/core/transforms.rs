use gcamkit_core::{Vec2, ANGULAR_PRECISION, PRECISION};
use gcamkit_designer::{Arc, Block, BlockId, BlockKind, FlipAxis, Line, Payload, Point, Program};
use proptest::prelude::*;

struct Scene {
    program: Program,
    sketch: BlockId,
    holes: BlockId,
}

fn scene(a: Vec2, b: Vec2) -> Scene {
    let mut program = Program::default();
    let config = program.config.clone();
    let sketch = program
        .insert(None, Block::new(BlockKind::Sketch, &config))
        .unwrap();
    program
        .insert(Some(sketch), Block::from_payload(Line::new(a, b)))
        .unwrap();
    program
        .insert(Some(sketch), Block::from_payload(Arc::new(b, 2.0, 30.0, 120.0)))
        .unwrap();
    let holes = program
        .insert(None, Block::new(BlockKind::DrillHoles, &config))
        .unwrap();
    program
        .insert(Some(holes), Block::from_payload(Point::new(a)))
        .unwrap();
    Scene {
        program,
        sketch,
        holes,
    }
}

/// Every stored coordinate of the geometry blocks, in tree order.
fn coordinates(program: &Program) -> Vec<f64> {
    program
        .iter()
        .flat_map(|(_, block)| match &block.payload {
            Payload::Line(l) => vec![l.p0.x, l.p0.y, l.p1.x, l.p1.y],
            Payload::Arc(a) => vec![a.start.x, a.start.y, a.radius],
            Payload::Point(p) => vec![p.position.x, p.position.y],
            _ => Vec::new(),
        })
        .collect()
}

fn arc_angles(program: &Program) -> Vec<f64> {
    program
        .iter()
        .filter_map(|(_, block)| match &block.payload {
            Payload::Arc(a) => Some(a.start_angle),
            _ => None,
        })
        .collect()
}

fn angle_close(a: f64, b: f64) -> bool {
    let d = (a - b).rem_euclid(360.0);
    d < ANGULAR_PRECISION || 360.0 - d < ANGULAR_PRECISION
}

fn coord() -> impl Strategy<Value = f64> {
    -500.0..500.0f64
}

proptest! {
    #[test]
    fn move_then_move_back(ax in coord(), ay in coord(), dx in coord(), dy in coord()) {
        let mut s = scene(Vec2::new(ax, ay), Vec2::new(ay, ax));
        let before = coordinates(&s.program);
        let delta = Vec2::new(dx, dy);
        for id in [s.sketch, s.holes] {
            s.program.translate(id, delta).unwrap();
            s.program.translate(id, Vec2::new(-dx, -dy)).unwrap();
        }
        for (x, y) in before.iter().zip(coordinates(&s.program)) {
            prop_assert!((x - y).abs() < PRECISION);
        }
    }

    #[test]
    fn spin_then_spin_back(ax in coord(), ay in coord(), cx in coord(), cy in coord(), angle in -720.0..720.0f64) {
        let mut s = scene(Vec2::new(ax, ay), Vec2::new(ay, ax));
        let before = coordinates(&s.program);
        let angles = arc_angles(&s.program);
        let datum = Vec2::new(cx, cy);
        s.program.spin(s.sketch, datum, angle).unwrap();
        s.program.spin(s.sketch, datum, -angle).unwrap();
        for (x, y) in before.iter().zip(coordinates(&s.program)) {
            prop_assert!((x - y).abs() < ANGULAR_PRECISION);
        }
        for (a, b) in angles.iter().zip(arc_angles(&s.program)) {
            prop_assert!(angle_close(*a, b));
        }
    }

    #[test]
    fn full_turn_is_identity(ax in coord(), ay in coord(), cx in coord(), cy in coord()) {
        let mut s = scene(Vec2::new(ax, ay), Vec2::new(ay, ax));
        let before = coordinates(&s.program);
        s.program.spin(s.sketch, Vec2::new(cx, cy), 360.0).unwrap();
        for (x, y) in before.iter().zip(coordinates(&s.program)) {
            prop_assert!((x - y).abs() < ANGULAR_PRECISION);
        }
    }

    #[test]
    fn flip_twice_is_identity(ax in coord(), ay in coord(), cx in coord(), cy in coord()) {
        let mut s = scene(Vec2::new(ax, ay), Vec2::new(ay, ax));
        let before = coordinates(&s.program);
        for axis in [FlipAxis::Horizontal, FlipAxis::Vertical] {
            s.program.flip(s.sketch, Vec2::new(cx, cy), axis).unwrap();
            s.program.flip(s.sketch, Vec2::new(cx, cy), axis).unwrap();
        }
        for (x, y) in before.iter().zip(coordinates(&s.program)) {
            prop_assert!((x - y).abs() < PRECISION);
        }
    }
}

#[test]
fn test_scale_drill_holes_depth() {
    let mut s = scene(Vec2::new(2.0, 3.0), Vec2::ZERO);
    s.program.scale(s.holes, 0.5).unwrap();
    let Some(Payload::DrillHoles(holes)) = s.program.get(s.holes).map(|b| &b.payload) else {
        panic!("expected drill holes");
    };
    assert!((holes.depth + 5.0).abs() < PRECISION);
    let point = s.program.children(s.holes)[0];
    let Some(Payload::Point(p)) = s.program.get(point).map(|b| &b.payload) else {
        panic!("expected point");
    };
    assert!(p.position.approx_eq(&Vec2::new(1.0, 1.5)));
}

#[test]
fn test_aabb_follows_translation() {
    let mut s = scene(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
    let point_box = s.program.aabb(s.holes).unwrap();
    assert!(point_box.min.approx_eq(&Vec2::ZERO));
    s.program.translate(s.holes, Vec2::new(3.0, 4.0)).unwrap();
    let moved = s.program.aabb(s.holes).unwrap();
    assert!(moved.min.approx_eq(&Vec2::new(3.0, 4.0)));
    assert!(moved.max.approx_eq(&Vec2::new(3.0, 4.0)));
}
