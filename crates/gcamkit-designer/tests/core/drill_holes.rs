use gcamkit_core::{Dialect, Vec2};
use gcamkit_designer::{Block, BlockFlags, BlockId, BlockKind, DrillHoles, Point, Program, NO_TOOL};

fn drilling_program(points: &[Vec2], optimal: bool) -> (Program, BlockId, BlockId) {
    let mut program = Program::default();
    let config = program.config.clone();
    let tool = program
        .insert(None, Block::new(BlockKind::Tool, &config))
        .unwrap();

    let mut holes = DrillHoles::new(&config);
    holes.optimal_path = optimal;
    let holes = program
        .insert(None, Block::from_payload(holes).with_comment("holes"))
        .unwrap();
    for p in points {
        program
            .insert(Some(holes), Block::from_payload(Point::new(*p)))
            .unwrap();
    }
    (program, tool, holes)
}

fn drill_lines(gcode: &str) -> Vec<&str> {
    gcode
        .lines()
        .skip_while(|l| !l.starts_with("(Drill Holes"))
        .collect()
}

#[test]
fn test_canned_cycle_with_optimal_order() {
    let points = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(1.0, 0.0)];
    let (mut program, _, _) = drilling_program(&points, true);
    let gcode = program.make();

    assert_eq!(
        drill_lines(&gcode),
        vec![
            "(Drill Holes: holes)",
            "G81 X0.0000 Y0.0000 Z-10.0000 R0.0000 F900.0000",
            "X1.0000 Y0.0000",
            "X10.0000 Y0.0000",
            "G80",
            "F900.0000",
            "G0 Z5.0000",
        ]
    );
}

#[test]
fn test_list_order_without_optimization() {
    let points = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(1.0, 0.0)];
    let (mut program, _, _) = drilling_program(&points, false);
    let gcode = program.make();
    let lines = drill_lines(&gcode);
    assert_eq!(lines[2], "X10.0000 Y0.0000");
    assert_eq!(lines[3], "X1.0000 Y0.0000");
}

#[test]
fn test_duplicate_holes_are_merged() {
    let points = [Vec2::new(0.0, 0.0), Vec2::new(1e-7, 1e-7)];
    let (program, _, holes) = drilling_program(&points, true);
    let Some(gcamkit_designer::Payload::DrillHoles(drill)) =
        program.get(holes).map(|b| &b.payload)
    else {
        panic!("expected drill holes");
    };
    assert_eq!(drill.holes(&program, holes).len(), 1);
}

#[test]
fn test_pecking_canned_cycle() {
    let (mut program, _, holes) = drilling_program(&[Vec2::new(5.0, 5.0)], false);
    if let Some(gcamkit_designer::Payload::DrillHoles(drill)) =
        program.get_mut(holes).map(|b| &mut b.payload)
    {
        drill.increment = 2.5;
    }
    let gcode = program.make();
    assert!(gcode.contains("G83 X5.0000 Y5.0000 Z-10.0000 R0.0000 Q2.5000 F900.0000"));
}

#[test]
fn test_simple_motion_for_grbl() {
    let (mut program, _, holes) = drilling_program(&[Vec2::new(5.0, 5.0)], false);
    program.config.dialect = Dialect::Grbl;
    if let Some(gcamkit_designer::Payload::DrillHoles(drill)) =
        program.get_mut(holes).map(|b| &mut b.payload)
    {
        drill.increment = 4.0;
    }
    let gcode = program.make();
    let lines = drill_lines(&gcode);

    assert!(!gcode.contains("G83"));
    assert!(!gcode.contains("G80"));
    assert_eq!(lines[1], "G0 Z5.0000");
    assert_eq!(lines[2], "G0 X5.0000 Y5.0000");
    let plunges: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|l| l.starts_with("G1 Z"))
        .collect();
    assert_eq!(plunges.len(), 3);
    assert!(plunges[2].starts_with("G1 Z-10.0000"));
    assert_eq!(lines.last(), Some(&"G0 Z5.0000"));
}

#[test]
fn test_missing_tool_marks_status() {
    let (mut program, tool, holes) = drilling_program(&[Vec2::new(1.0, 1.0)], false);
    program.get_mut(tool).unwrap().flags = BlockFlags::SUPPRESS;

    let gcode = program.make();
    assert!(!gcode.contains("Drill Holes"));
    assert_eq!(program.get(holes).unwrap().status(), NO_TOOL);

    program.get_mut(tool).unwrap().flags = BlockFlags::empty();
    program.make();
    assert_eq!(program.get(holes).unwrap().status(), "");
}

#[test]
fn test_make_block_keeps_unrelated_statuses() {
    let mut program = Program::default();
    let config = program.config.clone();
    let orphan = program
        .insert(None, Block::new(BlockKind::DrillHoles, &config))
        .unwrap();
    program
        .insert(Some(orphan), Block::from_payload(Point::new(Vec2::new(1.0, 1.0))))
        .unwrap();
    program
        .insert(None, Block::new(BlockKind::Tool, &config))
        .unwrap();
    let holes = program
        .insert(None, Block::new(BlockKind::DrillHoles, &config))
        .unwrap();
    program
        .insert(Some(holes), Block::from_payload(Point::new(Vec2::new(2.0, 2.0))))
        .unwrap();

    program.make();
    assert_eq!(program.get(orphan).unwrap().status(), NO_TOOL);

    assert!(program.make_block(holes).unwrap().contains("Drill Holes"));
    assert_eq!(program.get(orphan).unwrap().status(), NO_TOOL);
    assert_eq!(program.get(holes).unwrap().status(), "");
}

#[test]
fn test_empty_or_suppressed_holes_emit_nothing() {
    let (mut program, _, holes) = drilling_program(&[], false);
    assert_eq!(program.make_block(holes).unwrap(), "");

    let (mut program, _, holes) = drilling_program(&[Vec2::new(1.0, 1.0)], false);
    program.get_mut(holes).unwrap().flags = BlockFlags::SUPPRESS;
    assert!(!program.make().contains("Drill Holes"));
}

#[test]
fn test_suppressed_points_are_skipped() {
    let (mut program, _, holes) =
        drilling_program(&[Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0)], false);
    let first = program.children(holes)[0];
    program.get_mut(first).unwrap().flags = BlockFlags::SUPPRESS;
    let gcode = program.make();
    assert!(gcode.contains("G81 X2.0000 Y2.0000"));
    assert!(!gcode.contains("X1.0000 Y1.0000"));
}

#[test]
fn test_make_is_idempotent() {
    let points = [Vec2::new(3.0, 4.0), Vec2::new(-2.0, 7.5)];
    let (mut program, _, _) = drilling_program(&points, true);
    let first = program.make();
    let second = program.make();
    assert_eq!(first, second);
}
