//! Binary tag catalog
//!
//! Tags live in per-block namespaces. `0x01` and `0x02` are shared by every
//! block; kind-specific tags start at `0x10`.

use crate::block::BlockKind;

/// File magic.
pub const MAGIC: &[u8; 4] = b"GCAM";

/// Current binary format version.
pub const VERSION: u8 = 1;

pub const BLOCK_COMMENT: u8 = 0x01;
pub const BLOCK_FLAGS: u8 = 0x02;

pub mod config {
    pub const NAME: u8 = 0x01;
    pub const NOTES: u8 = 0x02;
    pub const UNITS: u8 = 0x03;
    pub const MATERIAL_TYPE: u8 = 0x04;
    pub const MATERIAL_SIZE: u8 = 0x05;
    pub const MATERIAL_ORIGIN: u8 = 0x06;
    pub const ZTRAVERSE: u8 = 0x07;
    pub const DRILLING_MOTION: u8 = 0x08;
    pub const DIALECT: u8 = 0x09;
    pub const MACHINE_OPTIONS: u8 = 0x0A;
    pub const DECIMALS: u8 = 0x0B;
}

pub mod begin {
    pub const COORDINATE_SYSTEM: u8 = 0x10;
}

pub mod end {
    pub const RETRACT_POSITION: u8 = 0x10;
    pub const HOME_ALL_AXES: u8 = 0x11;
}

pub mod code {
    pub const TEXT: u8 = 0x10;
}

pub mod tool {
    pub const DIAMETER: u8 = 0x10;
    pub const FEED: u8 = 0x11;
    pub const PLUNGE_RATIO: u8 = 0x12;
    pub const SPINDLE_RPM: u8 = 0x13;
    pub const SPINDLE_DIRECTION: u8 = 0x14;
    pub const NUMBER: u8 = 0x15;
    pub const LABEL: u8 = 0x16;
    pub const CHANGE_POSITION: u8 = 0x17;
    pub const COOLANT: u8 = 0x18;
    pub const PROMPT: u8 = 0x19;
    pub const LENGTH: u8 = 0x1A;
}

pub mod template {
    pub const POSITION: u8 = 0x10;
    pub const ROTATION: u8 = 0x11;
    pub const NUMBER: u8 = 0x12;
}

pub mod sketch {
    pub const TAPER_OFFSET: u8 = 0x10;
    pub const ZERO_PASS: u8 = 0x11;
    pub const HELICAL: u8 = 0x12;
    pub const NUMBER: u8 = 0x13;
    pub const EXTRUDER: u8 = 0x14;
}

pub mod extrusion {
    pub const RESOLUTION: u8 = 0x10;
    pub const CUT_SIDE: u8 = 0x11;
    pub const NUMBER: u8 = 0x12;
}

pub mod line {
    pub const P0: u8 = 0x10;
    pub const P1: u8 = 0x11;
}

pub mod arc {
    pub const START_POINT: u8 = 0x10;
    pub const RADIUS: u8 = 0x11;
    pub const START_ANGLE: u8 = 0x12;
    pub const SWEEP_ANGLE: u8 = 0x13;
}

pub mod point {
    pub const POSITION: u8 = 0x10;
}

pub mod drill_holes {
    pub const NUMBER: u8 = 0x10;
    pub const DEPTH: u8 = 0x11;
    pub const INCREMENT: u8 = 0x12;
    pub const OPTIMAL_PATH: u8 = 0x13;
}

pub mod bolt_holes {
    pub const POSITION: u8 = 0x10;
    pub const HOLE_DIAMETER: u8 = 0x11;
    pub const OFFSET_DISTANCE: u8 = 0x12;
    pub const TYPE: u8 = 0x13;
    pub const COUNT: u8 = 0x14;
    pub const OFFSET_ANGLE: u8 = 0x15;
    pub const POCKET: u8 = 0x16;
    pub const EXTRUDER: u8 = 0x17;
}

pub mod image {
    pub const RESOLUTION: u8 = 0x10;
    pub const SIZE: u8 = 0x11;
    pub const DMAP: u8 = 0x12;
    pub const POSITION: u8 = 0x13;
}

pub mod stl {
    pub const SLICES: u8 = 0x10;
    pub const TRIANGLES: u8 = 0x11;
}

/// Block type byte.
pub fn type_code(kind: BlockKind) -> u8 {
    match kind {
        BlockKind::Template => 0x01,
        BlockKind::Sketch => 0x02,
        BlockKind::Extrusion => 0x03,
        BlockKind::Line => 0x04,
        BlockKind::Arc => 0x05,
        BlockKind::Point => 0x06,
        BlockKind::DrillHoles => 0x07,
        BlockKind::BoltHoles => 0x08,
        BlockKind::Tool => 0x09,
        BlockKind::Begin => 0x0A,
        BlockKind::End => 0x0B,
        BlockKind::Code => 0x0C,
        BlockKind::Image => 0x0D,
        BlockKind::Stl => 0x0E,
    }
}

pub fn kind_from_code(code: u8) -> Option<BlockKind> {
    BlockKind::ALL.iter().copied().find(|k| type_code(*k) == code)
}

/// Tag announcing the nested child records of `kind`.
pub fn children_tag(kind: BlockKind) -> Option<u8> {
    match kind {
        BlockKind::Template => Some(template::NUMBER),
        BlockKind::Sketch => Some(sketch::NUMBER),
        BlockKind::Extrusion => Some(extrusion::NUMBER),
        BlockKind::DrillHoles => Some(drill_holes::NUMBER),
        _ => None,
    }
}

/// Tag announcing the nested extruder record of `kind`.
pub fn extruder_tag(kind: BlockKind) -> Option<u8> {
    match kind {
        BlockKind::Sketch => Some(sketch::EXTRUDER),
        BlockKind::BoltHoles => Some(bolt_holes::EXTRUDER),
        _ => None,
    }
}
