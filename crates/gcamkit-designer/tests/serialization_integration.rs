//! Integration tests for program files

use gcamkit_core::{Dialect, MaterialType, Units, Vec2, Vec3};
use gcamkit_designer::{
    load_any, load_binary, load_from_file, load_xml, save_binary, save_to_file, save_xml, Arc,
    Block, BlockFlags, BlockKind, BoltHoles, BoltPattern, Code, CodecError, Image, Line, Payload,
    Point, Program, Stl, Template, Tool,
};
use tempfile::TempDir;

fn sample_program() -> Program {
    let mut program = Program::default();
    program.config.name = "Bracket <rev A>".to_string();
    program.config.notes = "Clamp on the left\nFace first".to_string();
    program.config.material_type = MaterialType::Wood;
    program.config.material_size = Vec3::new(120.0, 80.0, 18.0);
    program.config.dialect = Dialect::Haas;
    let config = program.config.clone();

    program
        .insert(None, Block::new(BlockKind::Begin, &config))
        .unwrap();
    let mut tool = Tool::new(&config);
    tool.label = "Flat & \"sharp\"".to_string();
    tool.number = 3;
    program
        .insert(None, Block::from_payload(tool).with_comment("roughing"))
        .unwrap();

    let template = program
        .insert(
            None,
            Block::from_payload(Template::new(Vec2::new(10.0, 5.0), 30.0)).with_comment("part"),
        )
        .unwrap();
    let sketch = program
        .insert(Some(template), Block::new(BlockKind::Sketch, &config))
        .unwrap();
    program
        .insert(
            Some(sketch),
            Block::from_payload(Line::new(Vec2::new(0.1, 0.2), Vec2::new(40.0, 0.2))),
        )
        .unwrap();
    program
        .insert(
            Some(sketch),
            Block::from_payload(Arc::new(Vec2::new(40.0, 0.2), 5.0, 270.0, 180.0)),
        )
        .unwrap();

    let holes = program
        .insert(None, Block::new(BlockKind::DrillHoles, &config))
        .unwrap();
    program
        .insert(Some(holes), Block::from_payload(Point::new(Vec2::new(1.0, 2.0))))
        .unwrap();
    let hidden = program
        .insert(Some(holes), Block::from_payload(Point::new(Vec2::new(3.0, 4.0))))
        .unwrap();
    program.get_mut(hidden).unwrap().flags = BlockFlags::SUPPRESS | BlockFlags::LOCK;

    let mut bolts = BoltHoles::new(&config);
    bolts.pattern = BoltPattern::Matrix;
    bolts.count = [3, 2];
    bolts.pocket = true;
    program.insert(None, Block::from_payload(bolts)).unwrap();

    let mut image = Image::new(&config);
    image.set_depth_map([2, 1], vec![0.25, 0.75]).unwrap();
    program.insert(None, Block::from_payload(image)).unwrap();

    let mut stl = Stl::default();
    stl.set_triangles(vec![[
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.5, 0.0, 0.0),
        Vec3::new(0.0, 1.5, 2.0),
    ]]);
    program.insert(None, Block::from_payload(stl)).unwrap();

    program
        .insert(None, Block::from_payload(Code::new("M7\n(flood)")))
        .unwrap();
    program
        .insert(None, Block::new(BlockKind::End, &config))
        .unwrap();
    program
}

fn kinds(program: &Program) -> Vec<BlockKind> {
    program.iter().map(|(_, b)| b.kind()).collect()
}

#[test]
fn test_binary_roundtrip_is_stable() {
    let program = sample_program();
    let bytes = save_binary(&program);
    assert_eq!(&bytes[..4], b"GCAM");
    assert_eq!(bytes[4], 1);

    let loaded = load_binary(&bytes).unwrap();
    assert_eq!(loaded.config, program.config);
    assert_eq!(kinds(&loaded), kinds(&program));
    assert_eq!(save_binary(&loaded), bytes);
}

#[test]
fn test_xml_roundtrip_is_stable() {
    let program = sample_program();
    let text = save_xml(&program).unwrap();
    assert!(text.starts_with("<?xml"));
    assert!(text.contains("<drill-holes"));
    assert!(text.contains("&#10;"));

    let loaded = load_xml(&text).unwrap();
    assert_eq!(loaded.config, program.config);
    assert_eq!(kinds(&loaded), kinds(&program));
    assert_eq!(save_xml(&loaded).unwrap(), text);
}

#[test]
fn test_formats_agree() {
    let program = sample_program();
    let from_binary = load_binary(&save_binary(&program)).unwrap();
    let from_xml = load_xml(&save_xml(&program).unwrap()).unwrap();
    assert_eq!(save_binary(&from_xml), save_binary(&from_binary));
}

#[test]
fn test_loaded_blocks_keep_fields() {
    let program = sample_program();
    let loaded = load_binary(&save_binary(&program)).unwrap();

    let tool = loaded
        .iter()
        .find_map(|(_, b)| b.as_tool().map(|t| (b.comment().to_string(), t.clone())))
        .unwrap();
    assert_eq!(tool.0, "roughing");
    assert_eq!(tool.1.label, "Flat & \"sharp\"");
    assert_eq!(tool.1.number, 3);

    let suppressed: Vec<_> = loaded
        .iter()
        .filter(|(_, b)| b.is_suppressed())
        .map(|(_, b)| b.is_locked())
        .collect();
    assert_eq!(suppressed, vec![true]);

    let bolts = loaded
        .iter()
        .find(|(_, b)| b.kind() == BlockKind::BoltHoles)
        .map(|(id, _)| id)
        .unwrap();
    assert_eq!(loaded.children(bolts).len(), 6);
    assert!(loaded.extruder(bolts).is_some());
}

#[test]
fn test_make_survives_roundtrip() {
    let mut program = sample_program();
    let mut loaded = load_xml(&save_xml(&program).unwrap()).unwrap();
    assert_eq!(loaded.make(), program.make());
}

#[test]
fn test_file_roundtrip_by_extension() {
    let dir = TempDir::new().unwrap();
    let program = sample_program();

    for name in ["part.gcam", "part.xml"] {
        let path = dir.path().join(name);
        save_to_file(&program, &path).unwrap();
        let loaded = load_from_file(&path).unwrap();
        assert_eq!(loaded.config.name, "Bracket <rev A>");
        assert_eq!(loaded.len(), program.len());
    }

    let xml = std::fs::read_to_string(dir.path().join("part.xml")).unwrap();
    assert!(xml.contains("<gcam "));
    assert!(load_from_file(dir.path().join("missing.gcam")).is_err());
}

#[test]
fn test_units_survive_roundtrip() {
    let mut program = sample_program();
    program.set_units(Units::Inch);
    let loaded = load_any(&save_binary(&program)).unwrap();
    assert_eq!(loaded.config.units, Units::Inch);
    assert_eq!(loaded.config.ztraverse, program.config.ztraverse);
}

#[test]
fn test_truncated_binary_is_rejected() {
    let bytes = save_binary(&sample_program());
    for cut in [5, 9, bytes.len() - 3, bytes.len() - 1] {
        assert!(load_binary(&bytes[..cut]).is_err(), "cut at {}", cut);
    }
}

#[test]
fn test_unknown_block_type_is_rejected() {
    let mut bytes = b"GCAM\x01".to_vec();
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.push(0x7F);
    bytes.extend_from_slice(&0u32.to_le_bytes());
    assert!(matches!(
        load_binary(&bytes),
        Err(CodecError::UnknownBlockType(0x7F))
    ));
}

#[test]
fn test_unknown_tags_are_skipped() {
    let mut bytes = b"GCAM\x01".to_vec();
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.push(0x07);
    let body = {
        let mut b = vec![0x55];
        b.extend_from_slice(&2u32.to_le_bytes());
        b.extend_from_slice(&[0xAA, 0xBB]);
        b
    };
    bytes.extend_from_slice(&(body.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&body);

    let program = load_binary(&bytes).unwrap();
    assert_eq!(program.len(), 1);
    assert_eq!(program.roots().len(), 1);
}

#[test]
fn test_misplaced_blocks_are_rejected() {
    assert!(matches!(
        load_xml(r#"<gcam version="1"><point position="1 2"/></gcam>"#),
        Err(CodecError::Placement(_))
    ));
    assert!(matches!(
        load_xml(r#"<gcam version="1"><drill-holes><line/></drill-holes></gcam>"#),
        Err(CodecError::Placement(_))
    ));
}

#[test]
fn test_xml_unknown_element_and_attribute() {
    assert!(matches!(
        load_xml(r#"<gcam version="1"><polygon/></gcam>"#),
        Err(CodecError::UnknownElement(name)) if name == "polygon"
    ));

    let program = load_xml(
        r#"<gcam version="1" name="x"><drill-holes depth="-2" color="red"><point position="1 2" glow="1"/></drill-holes></gcam>"#,
    )
    .unwrap();
    let holes = program.roots()[0];
    let Some(Payload::DrillHoles(drill)) = program.get(holes).map(|b| &b.payload) else {
        panic!("expected drill holes");
    };
    assert_eq!(drill.depth, -2.0);
    let point = program.children(holes)[0];
    let Some(Payload::Point(p)) = program.get(point).map(|b| &b.payload) else {
        panic!("expected point");
    };
    assert_eq!(p.position, Vec2::new(1.0, 2.0));
}

#[test]
fn test_xml_bad_values() {
    assert!(matches!(
        load_xml(r#"<gcam version="1"><drill-holes depth="deep"/></gcam>"#),
        Err(CodecError::InvalidAttribute { .. })
    ));
    assert!(load_xml("<gcam><sketch></gcam>").is_err());
    assert!(load_xml(r#"<gcam version="9"/>"#).is_err());
}

fn sketch_with_resolution(resolution: f64) -> Program {
    let mut program = Program::default();
    let config = program.config.clone();
    program
        .insert(None, Block::new(BlockKind::Tool, &config))
        .unwrap();
    let sketch = program
        .insert(None, Block::new(BlockKind::Sketch, &config))
        .unwrap();
    program
        .insert(
            Some(sketch),
            Block::from_payload(Line::new(Vec2::ZERO, Vec2::new(10.0, 0.0))),
        )
        .unwrap();
    let extruder = program.extruder(sketch).unwrap();
    if let Some(Payload::Extrusion(extrusion)) = program.get_mut(extruder).map(|b| &mut b.payload)
    {
        extrusion.resolution = resolution;
    }
    program
}

#[test]
fn test_non_finite_numbers_are_rejected() {
    let text = r#"<gcam version="1"><sketch><line p0="0 0" p1="10 0"/><extrusion resolution="NaN"><line p0="0 0" p1="0 -3"/></extrusion></sketch></gcam>"#;
    assert!(matches!(
        load_xml(text),
        Err(CodecError::InvalidAttribute { name, .. }) if name == "resolution"
    ));

    let program = sketch_with_resolution(f64::NAN);
    assert!(matches!(
        load_binary(&save_binary(&program)),
        Err(CodecError::InvalidValue { .. })
    ));
    let text = save_xml(&program).unwrap();
    assert!(load_xml(&text).is_err());
}

#[test]
fn test_make_with_non_finite_resolution_finishes() {
    let mut program = sketch_with_resolution(f64::NAN);
    let gcode = program.make();
    assert!(gcode.contains("Z-10.0000"));
}

#[test]
fn test_oversized_bolt_count_is_rejected() {
    assert!(matches!(
        load_xml(r#"<gcam version="1"><bolt-holes type="matrix" count="100000 100000"/></gcam>"#),
        Err(CodecError::InvalidAttribute { name, .. }) if name == "count"
    ));

    let mut program = Program::default();
    let config = program.config.clone();
    let mut bolts = BoltHoles::new(&config);
    bolts.pattern = BoltPattern::Matrix;
    bolts.count = [100_000, 100_000];
    let id = program.insert(None, Block::from_payload(bolts)).unwrap();
    assert!(program.children(id).is_empty());
    assert!(matches!(
        load_binary(&save_binary(&program)),
        Err(CodecError::InvalidValue { .. })
    ));
}
