//! # GCamKit Designer
//!
//! The block tree at the heart of GCamKit. A [`Program`] holds a tree of
//! blocks: setup blocks (Begin, End, Code, Tool), containers (Template,
//! Sketch, DrillHoles, BoltHoles), geometry (Line, Arc, Point), depth profiles
//! (Extrusion) and surface generators (Image, Stl). Walking the tree with
//! [`Program::make`] produces the G-code of the whole program.
//!
//! ## Architecture
//!
//! ```text
//! Program (config + block arena)
//!   ├── Template
//!   │     ├── Tool
//!   │     └── Sketch ── Line / Arc     (extruder: Extrusion ── Line)
//!   ├── DrillHoles ── Point
//!   └── BoltHoles ── derived Arc      (extruder: Extrusion ── Line)
//! ```
//!
//! Blocks that own an offset record (templates, sketches, extrusions and hole
//! groups) place their subtree; everything else inherits the record of its
//! nearest owning ancestor.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gcamkit_designer::{Block, BlockKind, Point, Program};
//!
//! let mut program = Program::default();
//! let config = program.config.clone();
//! program.insert(None, Block::new(BlockKind::Tool, &config))?;
//! let holes = program.insert(None, Block::new(BlockKind::DrillHoles, &config))?;
//! program.insert(Some(holes), Block::from_payload(Point::new(Vec2::new(10.0, 10.0))))?;
//!
//! let gcode = program.make();
//! ```

pub mod block;
pub mod error;
pub mod make;
pub mod pattern;
pub mod program;
pub mod serialization;
pub mod transform;

pub use block::{
    depth_passes, Arc, Begin, Block, BlockFlags, BlockKind, BoltHoles, BoltPattern, Code, CutSide,
    DrillHoles, End, Extrusion, FlipAxis, Image, Line, OffsetRef, Operation, Payload, Point,
    Profile, Sketch, SpindleDirection, Stl, Template, Tool, Transform, MAX_BOLT_HOLES,
    MAX_COMMENT_LEN,
};
pub use error::{BlockError, CodecError, CodecResult, Result};
pub use make::NO_TOOL;
pub use program::{BlockId, Program};
pub use serialization::{
    load_any, load_binary, load_from_file, load_xml, save_binary, save_to_file, save_xml, Format,
};
