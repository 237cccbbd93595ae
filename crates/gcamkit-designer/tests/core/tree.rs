use gcamkit_core::Vec2;
use gcamkit_designer::{
    Arc, Block, BlockError, BlockKind, Line, OffsetRef, Operation, Payload, Point, Program,
    Template,
};

#[test]
fn test_clone_is_independent() {
    let mut program = Program::default();
    let config = program.config.clone();
    let sketch = program
        .insert(None, Block::new(BlockKind::Sketch, &config).with_comment("outline"))
        .unwrap();
    let line = program
        .insert(
            Some(sketch),
            Block::from_payload(Line::new(Vec2::ZERO, Vec2::new(5.0, 0.0))),
        )
        .unwrap();

    let copy = program.clone_block(sketch, None).unwrap();
    assert_eq!(program.roots(), &[sketch, copy]);
    assert_eq!(program.get(copy).unwrap().comment(), "outline");
    assert_ne!(program.extruder(copy), program.extruder(sketch));
    assert!(program.extruder(copy).is_some());

    program.translate(copy, Vec2::new(0.0, 7.0)).unwrap();
    let Some(Payload::Line(original)) = program.get(line).map(|b| &b.payload) else {
        panic!("expected line");
    };
    assert!(original.p0.approx_eq(&Vec2::ZERO));

    program.remove(copy).unwrap();
    assert!(program.contains(line));
    assert_eq!(program.len(), 4);
}

#[test]
fn test_clone_rebinds_inherited_offsets() {
    let mut program = Program::default();
    let config = program.config.clone();
    let a = program
        .insert(None, Block::new(BlockKind::DrillHoles, &config))
        .unwrap();
    let b = program
        .insert(None, Block::new(BlockKind::DrillHoles, &config))
        .unwrap();
    let point = program
        .insert(Some(a), Block::new(BlockKind::Point, &config))
        .unwrap();

    let copy = program.clone_block(point, Some(b)).unwrap();
    assert_eq!(
        program.get(copy).unwrap().offset_ref(),
        &OffsetRef::Inherited(b)
    );
    assert_eq!(
        program.get(point).unwrap().offset_ref(),
        &OffsetRef::Inherited(a)
    );
}

#[test]
fn test_clone_checks_parent() {
    let mut program = Program::default();
    let config = program.config.clone();
    let holes = program
        .insert(None, Block::new(BlockKind::DrillHoles, &config))
        .unwrap();
    let point = program
        .insert(Some(holes), Block::new(BlockKind::Point, &config))
        .unwrap();
    assert!(matches!(
        program.clone_block(point, None),
        Err(BlockError::InvalidParent { .. })
    ));
}

#[test]
fn test_insert_at_position() {
    let mut program = Program::default();
    let config = program.config.clone();
    let first = program
        .insert(None, Block::new(BlockKind::Begin, &config))
        .unwrap();
    let last = program
        .insert(None, Block::new(BlockKind::End, &config))
        .unwrap();
    let tool = program
        .insert_at(None, 1, Block::new(BlockKind::Tool, &config))
        .unwrap();
    assert_eq!(program.roots(), &[first, tool, last]);
}

#[test]
fn test_set_extruder_replaces_profile() {
    let mut program = Program::default();
    let config = program.config.clone();
    let sketch = program
        .insert(None, Block::new(BlockKind::Sketch, &config))
        .unwrap();
    let old = program.extruder(sketch).unwrap();

    let extruder = program
        .set_extruder(sketch, Block::new(BlockKind::Extrusion, &config))
        .unwrap();
    program
        .insert(
            Some(extruder),
            Block::from_payload(Line::new(Vec2::ZERO, Vec2::new(0.0, -3.0))),
        )
        .unwrap();
    assert!(!program.contains(old));
    assert_eq!(program.extruder(sketch), Some(extruder));
    assert_eq!(program.profile(extruder).unwrap().bottom(), -3.0);

    assert!(program
        .set_extruder(sketch, Block::new(BlockKind::Line, &config))
        .is_err());
}

#[test]
fn test_aabb_of_sketch_with_arc() {
    let mut program = Program::default();
    let config = program.config.clone();
    let template = program
        .insert(
            None,
            Block::from_payload(Template::new(Vec2::new(100.0, 0.0), 0.0)),
        )
        .unwrap();
    let sketch = program
        .insert(Some(template), Block::new(BlockKind::Sketch, &config))
        .unwrap();
    program
        .insert(Some(sketch), Block::from_payload(Arc::circle(Vec2::ZERO, 2.0)))
        .unwrap();

    let aabb = program.aabb(sketch).unwrap();
    assert!(aabb.min.approx_eq(&Vec2::new(98.0, -2.0)));
    assert!(aabb.max.approx_eq(&Vec2::new(102.0, 2.0)));
    assert_eq!(program.aabb(template).unwrap(), aabb);
}

#[test]
fn test_ends() {
    let mut program = Program::default();
    let config = program.config.clone();
    let holes = program
        .insert(None, Block::new(BlockKind::DrillHoles, &config))
        .unwrap();
    let point = program
        .insert(Some(holes), Block::from_payload(Point::new(Vec2::new(2.0, 2.0))))
        .unwrap();
    let (a, b) = program.ends(point).unwrap();
    assert_eq!(a, b);
    assert_eq!(
        program.ends(holes),
        Err(BlockError::Unsupported {
            kind: BlockKind::DrillHoles,
            operation: Operation::Ends
        })
    );
}
