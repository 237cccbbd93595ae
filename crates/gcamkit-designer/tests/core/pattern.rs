use gcamkit_core::Vec2;
use gcamkit_designer::{Block, BlockKind, Line, Payload, Program};

#[test]
fn test_pattern_of_template_children() {
    let mut program = Program::default();
    let config = program.config.clone();
    let template = program
        .insert(None, Block::new(BlockKind::Template, &config))
        .unwrap();
    let sketch = program
        .insert(Some(template), Block::new(BlockKind::Sketch, &config))
        .unwrap();
    program
        .insert(
            Some(sketch),
            Block::from_payload(Line::new(Vec2::ZERO, Vec2::new(1.0, 0.0))),
        )
        .unwrap();

    let copies = program
        .generate_pattern(template, 3, Vec2::new(0.0, 10.0), Vec2::ZERO, 0.0)
        .unwrap();
    assert_eq!(copies.len(), 2);
    assert_eq!(program.children(template).len(), 3);

    for (i, copy) in copies.iter().enumerate() {
        assert_eq!(program.get(*copy).unwrap().kind(), BlockKind::Sketch);
        assert!(program.extruder(*copy).is_some());
        let line = program.children(*copy)[0];
        let Some(Payload::Line(l)) = program.get(line).map(|b| &b.payload) else {
            panic!("expected line");
        };
        let dy = 10.0 * (i + 1) as f64;
        assert!(l.p0.approx_eq(&Vec2::new(0.0, dy)));
        assert!(l.p1.approx_eq(&Vec2::new(1.0, dy)));
    }
}

#[test]
fn test_pattern_copies_only_originals() {
    let mut program = Program::default();
    let config = program.config.clone();
    let holes = program
        .insert(None, Block::new(BlockKind::DrillHoles, &config))
        .unwrap();
    for _ in 0..2 {
        program
            .insert(Some(holes), Block::new(BlockKind::Point, &config))
            .unwrap();
    }
    let copies = program
        .generate_pattern(holes, 4, Vec2::new(1.0, 0.0), Vec2::ZERO, 0.0)
        .unwrap();
    assert_eq!(copies.len(), 6);
    assert_eq!(program.children(holes).len(), 8);
}

#[test]
fn test_pattern_on_missing_block() {
    let mut program = Program::default();
    let config = program.config.clone();
    let holes = program
        .insert(None, Block::new(BlockKind::DrillHoles, &config))
        .unwrap();
    program.remove(holes).unwrap();
    assert!(program
        .generate_pattern(holes, 2, Vec2::ZERO, Vec2::ZERO, 0.0)
        .is_err());
}
