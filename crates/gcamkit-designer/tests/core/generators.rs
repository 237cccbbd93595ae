use gcamkit_core::{Dialect, Vec2, Vec3};
use gcamkit_designer::{
    Begin, Block, BlockKind, BoltHoles, Code, CutSide, End, Image, Line, Payload, Program, Stl,
    Template, NO_TOOL,
};

fn with_tool() -> Program {
    let mut program = Program::default();
    let config = program.config.clone();
    program
        .insert(None, Block::new(BlockKind::Tool, &config))
        .unwrap();
    program
}

fn square(program: &mut Program, size: f64) -> gcamkit_designer::BlockId {
    let config = program.config.clone();
    let sketch = program
        .insert(None, Block::new(BlockKind::Sketch, &config).with_comment("square"))
        .unwrap();
    let corners = [
        Vec2::new(0.0, 0.0),
        Vec2::new(size, 0.0),
        Vec2::new(size, size),
        Vec2::new(0.0, size),
    ];
    for i in 0..4 {
        program
            .insert(
                Some(sketch),
                Block::from_payload(Line::new(corners[i], corners[(i + 1) % 4])),
            )
            .unwrap();
    }
    sketch
}

#[test]
fn test_begin_and_end_frame_the_program() {
    let mut program = Program::default();
    program.config.name = "bracket".to_string();
    program.config.dialect = Dialect::Fanuc;
    program
        .insert(None, Block::from_payload(Begin::default()))
        .unwrap();
    let config = program.config.clone();
    program
        .insert(None, Block::from_payload(End::new(&config)))
        .unwrap();

    let gcode = program.make();
    let lines: Vec<&str> = gcode.lines().collect();
    assert_eq!(lines[0], "%");
    assert_eq!(lines[1], "O0001");
    assert_eq!(lines[2], "(Program: bracket)");
    assert!(lines.contains(&"G21"));
    assert!(lines.contains(&"G54"));
    assert!(lines.contains(&"M5"));
    assert_eq!(lines[lines.len() - 2], "M30");
    assert_eq!(lines[lines.len() - 1], "%");
}

#[test]
fn test_grbl_skips_unsupported_words() {
    let mut program = Program::default();
    program.config.dialect = Dialect::Grbl;
    program
        .insert(None, Block::from_payload(Begin::default()))
        .unwrap();
    let gcode = program.make();
    assert!(!gcode.contains('%'));
    assert!(!gcode.contains("G49"));
}

#[test]
fn test_code_block_is_verbatim() {
    let mut program = Program::default();
    program
        .insert(None, Block::from_payload(Code::new("M7\nG4 P1")))
        .unwrap();
    assert_eq!(program.make(), "M7\nG4 P1\n");
}

#[test]
fn test_tool_change_lines() {
    let mut program = with_tool();
    let gcode = program.make();
    let lines: Vec<&str> = gcode.lines().collect();
    assert_eq!(lines[0], "(Tool 1: End Mill 3.1750 mm)");
    assert!(lines.contains(&"S10000 M3"));

    program.config.machine.auto_tool_change = true;
    let gcode = program.make();
    assert!(gcode.contains("T1 M6\nG43 H1\n"));
}

#[test]
fn test_sketch_square_passes() {
    let mut program = with_tool();
    square(&mut program, 10.0);
    let gcode = program.make();

    assert!(gcode.contains("(Sketch: square)"));
    let plunges: Vec<&str> = gcode.lines().filter(|l| l.starts_with("G1 Z")).collect();
    assert_eq!(plunges.len(), 10);
    assert!(plunges[9].starts_with("G1 Z-10.0000"));
    assert!(!gcode.contains("G41"));
    assert!(!gcode.contains("G42"));
}

#[test]
fn test_sketch_compensation() {
    let mut program = with_tool();
    let sketch = square(&mut program, 10.0);
    let extruder = program.extruder(sketch).unwrap();
    if let Some(Payload::Extrusion(extrusion)) =
        program.get_mut(extruder).map(|b| &mut b.payload)
    {
        extrusion.cut_side = CutSide::Outside;
    }
    let gcode = program.make();
    assert!(gcode.contains("G42 D1"));
    assert!(gcode.contains("G40"));
}

#[test]
fn test_sketch_without_tool() {
    let mut program = Program::default();
    let sketch = square(&mut program, 5.0);
    assert_eq!(program.make(), "");
    assert_eq!(program.get(sketch).unwrap().status(), NO_TOOL);
}

#[test]
fn test_bolt_holes_rebuild_circles() {
    let mut program = with_tool();
    let config = program.config.clone();
    let holes = program
        .insert(None, Block::from_payload(BoltHoles::new(&config)))
        .unwrap();
    assert_eq!(program.children(holes).len(), 4);
    assert!(program.extruder(holes).is_some());
    let before = program.len();
    let old = program.children(holes).to_vec();

    if let Some(Payload::BoltHoles(bolts)) = program.get_mut(holes).map(|b| &mut b.payload) {
        bolts.count = [6, 1];
    }
    program.rebuild_bolt_holes(holes);
    assert_eq!(program.children(holes).len(), 6);
    assert_eq!(program.len(), before + 2);
    assert!(old.iter().all(|id| !program.contains(*id)));
    for child in program.children(holes) {
        assert_eq!(program.get(*child).unwrap().kind(), BlockKind::Arc);
    }

    let gcode = program.make();
    assert!(gcode.contains("(Bolt Holes: )"));
}

#[test]
fn test_template_wraps_children() {
    let mut program = Program::default();
    let config = program.config.clone();
    let template = program
        .insert(
            None,
            Block::from_payload(Template::new(Vec2::new(50.0, 0.0), 0.0)).with_comment("plate"),
        )
        .unwrap();
    program
        .insert(Some(template), Block::new(BlockKind::Tool, &config))
        .unwrap();
    let holes = program
        .insert(Some(template), Block::new(BlockKind::DrillHoles, &config))
        .unwrap();
    program
        .insert(Some(holes), Block::new(BlockKind::Point, &config))
        .unwrap();

    let gcode = program.make();
    assert!(gcode.starts_with("(Template: plate)\n"));
    assert!(gcode.contains("G81 X50.0000 Y0.0000"));
}

#[test]
fn test_image_zig_zag() {
    let mut program = with_tool();
    let config = program.config.clone();
    let mut image = Image::new(&config);
    image.size = Vec3::new(2.0, 2.0, 1.0);
    image
        .set_depth_map([2, 2], vec![0.0, 1.0, 0.5, 0.25])
        .unwrap();
    program.insert(None, Block::from_payload(image)).unwrap();

    let gcode = program.make();
    assert!(gcode.contains("(Image: )"));
    let cuts: Vec<&str> = gcode
        .lines()
        .filter(|l| l.starts_with("G1 X"))
        .collect();
    assert_eq!(cuts.len(), 3);
}

#[test]
fn test_stl_waterline() {
    let mut program = with_tool();
    let mut stl = Stl::default();
    stl.slices = 2;
    stl.set_triangles(vec![
        [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 4.0),
        ],
        [
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::new(0.0, 0.0, 4.0),
        ],
        [
            Vec3::new(0.0, 10.0, 0.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 4.0),
        ],
    ]);
    program.insert(None, Block::from_payload(stl)).unwrap();

    let gcode = program.make();
    assert!(gcode.contains("(STL: )"));
    assert!(gcode.contains("G1 Z-2.0000"));
}
