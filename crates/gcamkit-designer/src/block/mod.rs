//! Block model
//!
//! A program is a tree of blocks. Each block carries a comment, flags, a
//! status line written by code generation, a reference to the offset record
//! it is placed by, and a kind-specific [`Payload`].

use gcamkit_core::{Offset, ProgramConfig, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CodecResult;
use crate::program::BlockId;
use crate::serialization::binary::BinWriter;
use crate::serialization::xml::{AttrReader, AttrWriter};

mod arc;
mod begin;
mod bolt_holes;
mod code;
mod drill_holes;
mod end;
mod extrusion;
mod image;
mod line;
mod point;
mod sketch;
mod stl;
mod template;
mod tool;

pub use arc::Arc;
pub use begin::Begin;
pub use bolt_holes::{BoltHoles, BoltPattern, MAX_BOLT_HOLES};
pub use code::Code;
pub use drill_holes::DrillHoles;
pub use end::End;
pub use extrusion::{depth_passes, CutSide, Extrusion, Profile};
pub use image::Image;
pub use line::Line;
pub use point::Point;
pub use sketch::Sketch;
pub use stl::Stl;
pub use template::Template;
pub use tool::{SpindleDirection, Tool};

/// Longest comment kept on a block, in characters.
pub const MAX_COMMENT_LEN: usize = 64;

/// Operations a block kind may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Free,
    Save,
    Load,
    Make,
    Move,
    Spin,
    Scale,
    Flip,
    Parse,
    Clone,
    Aabb,
    Ends,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Free => "free",
            Self::Save => "save",
            Self::Load => "load",
            Self::Make => "make",
            Self::Move => "move",
            Self::Spin => "spin",
            Self::Scale => "scale",
            Self::Flip => "flip",
            Self::Parse => "parse",
            Self::Clone => "clone",
            Self::Aabb => "aabb",
            Self::Ends => "ends",
        };
        write!(f, "{}", name)
    }
}

/// Block type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    Begin,
    End,
    Code,
    Tool,
    Template,
    Sketch,
    Extrusion,
    Line,
    Arc,
    Point,
    DrillHoles,
    BoltHoles,
    Image,
    Stl,
}

use Operation as Op;

const BASE: [Op; 6] = [Op::Create, Op::Free, Op::Save, Op::Load, Op::Parse, Op::Clone];

impl BlockKind {
    pub const ALL: [BlockKind; 14] = [
        Self::Begin,
        Self::End,
        Self::Code,
        Self::Tool,
        Self::Template,
        Self::Sketch,
        Self::Extrusion,
        Self::Line,
        Self::Arc,
        Self::Point,
        Self::DrillHoles,
        Self::BoltHoles,
        Self::Image,
        Self::Stl,
    ];

    /// Operations beyond create/free/save/load/parse/clone.
    fn extra_capabilities(&self) -> &'static [Operation] {
        match self {
            Self::Begin | Self::Code => &[Op::Make],
            Self::End | Self::Tool => &[Op::Make, Op::Scale],
            Self::Template | Self::Sketch | Self::DrillHoles | Self::BoltHoles => {
                &[Op::Make, Op::Move, Op::Spin, Op::Scale, Op::Flip, Op::Aabb]
            }
            Self::Extrusion => &[Op::Scale, Op::Aabb],
            Self::Line | Self::Arc | Self::Point => {
                &[Op::Move, Op::Spin, Op::Scale, Op::Flip, Op::Aabb, Op::Ends]
            }
            Self::Image | Self::Stl => &[Op::Make, Op::Move, Op::Scale, Op::Aabb],
        }
    }

    pub fn capabilities(&self) -> Vec<Operation> {
        BASE.iter()
            .chain(self.extra_capabilities())
            .copied()
            .collect()
    }

    pub fn supports(&self, op: Operation) -> bool {
        BASE.contains(&op) || self.extra_capabilities().contains(&op)
    }

    /// Kinds that carry their own offset record.
    pub fn owns_offset(&self) -> bool {
        matches!(
            self,
            Self::Template | Self::Sketch | Self::Extrusion | Self::DrillHoles | Self::BoltHoles
        )
    }

    /// Whether `child` may be inserted under this kind.
    pub fn accepts_child(&self, child: BlockKind) -> bool {
        match self {
            Self::Template => !matches!(
                child,
                Self::Begin | Self::End | Self::Extrusion | Self::Line | Self::Arc | Self::Point
            ),
            Self::Sketch => matches!(child, Self::Line | Self::Arc),
            Self::Extrusion => child == Self::Line,
            Self::DrillHoles => child == Self::Point,
            _ => false,
        }
    }

    /// Kinds that take an Extrusion as depth profile.
    pub fn accepts_extruder(&self) -> bool {
        matches!(self, Self::Sketch | Self::BoltHoles)
    }

    /// Whether children are written to files (BoltHoles rebuilds its own).
    pub fn persists_children(&self) -> bool {
        matches!(
            self,
            Self::Template | Self::Sketch | Self::Extrusion | Self::DrillHoles
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Begin => "Begin",
            Self::End => "End",
            Self::Code => "Code",
            Self::Tool => "Tool",
            Self::Template => "Template",
            Self::Sketch => "Sketch",
            Self::Extrusion => "Extrusion",
            Self::Line => "Line",
            Self::Arc => "Arc",
            Self::Point => "Point",
            Self::DrillHoles => "Drill Holes",
            Self::BoltHoles => "Bolt Holes",
            Self::Image => "Image",
            Self::Stl => "STL",
        }
    }

    /// Element name in XML documents.
    pub fn xml_name(&self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::End => "end",
            Self::Code => "code",
            Self::Tool => "tool",
            Self::Template => "template",
            Self::Sketch => "sketch",
            Self::Extrusion => "extrusion",
            Self::Line => "line",
            Self::Arc => "arc",
            Self::Point => "point",
            Self::DrillHoles => "drill-holes",
            Self::BoltHoles => "bolt-holes",
            Self::Image => "image",
            Self::Stl => "stl",
        }
    }

    pub fn from_xml_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.xml_name() == name)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Block flag bits. Unknown bits are preserved verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct BlockFlags(u8);

impl BlockFlags {
    /// Skip the block during code generation.
    pub const SUPPRESS: BlockFlags = BlockFlags(0x01);
    /// Block is protected from interactive edits.
    pub const LOCK: BlockFlags = BlockFlags(0x02);
    /// Tree view expansion state.
    pub const EXPAND: BlockFlags = BlockFlags(0x04);

    pub const fn empty() -> Self {
        BlockFlags(0)
    }

    pub const fn from_bits(bits: u8) -> Self {
        BlockFlags(bits)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, other: BlockFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn set(&mut self, other: BlockFlags, on: bool) {
        if on {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }
}

impl std::ops::BitOr for BlockFlags {
    type Output = BlockFlags;
    fn bitor(self, rhs: BlockFlags) -> BlockFlags {
        BlockFlags(self.0 | rhs.0)
    }
}

/// Mirror axis for [`Transform::Flip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipAxis {
    /// Mirror across the horizontal line through the datum (Y changes sign).
    Horizontal,
    /// Mirror across the vertical line through the datum (X changes sign).
    Vertical,
}

impl FlipAxis {
    pub fn mirror(&self, p: Vec2, datum: Vec2) -> Vec2 {
        match self {
            Self::Horizontal => Vec2::new(p.x, 2.0 * datum.y - p.y),
            Self::Vertical => Vec2::new(2.0 * datum.x - p.x, p.y),
        }
    }

    /// Mirror a direction angle in degrees.
    pub fn mirror_angle(&self, angle: f64) -> f64 {
        let mirrored = match self {
            Self::Horizontal => -angle,
            Self::Vertical => 180.0 - angle,
        };
        gcamkit_core::math::wrap_degrees(mirrored)
    }
}

/// Geometric edit applied through the tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    Move(Vec2),
    Spin { datum: Vec2, angle: f64 },
    Scale(f64),
    Flip { datum: Vec2, axis: FlipAxis },
}

impl Transform {
    pub fn operation(&self) -> Operation {
        match self {
            Self::Move(_) => Op::Move,
            Self::Spin { .. } => Op::Spin,
            Self::Scale(_) => Op::Scale,
            Self::Flip { .. } => Op::Flip,
        }
    }
}

/// Where a block takes its placement from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OffsetRef {
    /// The block's own record.
    Owned(Offset),
    /// The record of the nearest owning ancestor.
    Inherited(BlockId),
    /// The program default record.
    Default,
}

/// Behaviour shared by all payload types.
///
/// Transform methods only touch the payload's own fields; the program
/// propagates to children. Defaults are no-ops for kinds whose fields are
/// unaffected.
pub(crate) trait BlockPayload {
    fn translate(&mut self, _delta: Vec2) {}

    fn spin(&mut self, _datum: Vec2, _angle: f64) {}

    fn scale(&mut self, _factor: f64) {}

    fn flip(&mut self, _datum: Vec2, _axis: FlipAxis) {}

    /// Local start and end points.
    fn ends(&self) -> Option<(Vec2, Vec2)> {
        None
    }

    fn save_fields(&self, w: &mut BinWriter);

    /// Apply one binary record. `Ok(false)` marks an unknown tag.
    fn load_field(&mut self, tag: u8, value: &[u8]) -> CodecResult<bool>;

    /// Write this block's attributes, including comment and flags.
    fn write_xml(&self, comment: &str, flags: BlockFlags, attrs: &mut AttrWriter);

    fn parse_xml(&mut self, attrs: &AttrReader<'_>) -> CodecResult<()>;
}

/// Kind-specific block data.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Begin(Begin),
    End(End),
    Code(Code),
    Tool(Tool),
    Template(Template),
    Sketch(Sketch),
    Extrusion(Extrusion),
    Line(Line),
    Arc(Arc),
    Point(Point),
    DrillHoles(DrillHoles),
    BoltHoles(BoltHoles),
    Image(Image),
    Stl(Stl),
}

macro_rules! dispatch {
    ($self:expr, $inner:ident => $body:expr) => {
        match $self {
            Payload::Begin($inner) => $body,
            Payload::End($inner) => $body,
            Payload::Code($inner) => $body,
            Payload::Tool($inner) => $body,
            Payload::Template($inner) => $body,
            Payload::Sketch($inner) => $body,
            Payload::Extrusion($inner) => $body,
            Payload::Line($inner) => $body,
            Payload::Arc($inner) => $body,
            Payload::Point($inner) => $body,
            Payload::DrillHoles($inner) => $body,
            Payload::BoltHoles($inner) => $body,
            Payload::Image($inner) => $body,
            Payload::Stl($inner) => $body,
        }
    };
}

impl Payload {
    /// Default payload of `kind`, seeded from the program configuration.
    pub fn defaults(kind: BlockKind, config: &ProgramConfig) -> Self {
        match kind {
            BlockKind::Begin => Begin::default().into(),
            BlockKind::End => End::new(config).into(),
            BlockKind::Code => Code::default().into(),
            BlockKind::Tool => Tool::new(config).into(),
            BlockKind::Template => Template::default().into(),
            BlockKind::Sketch => Sketch::default().into(),
            BlockKind::Extrusion => Extrusion::new(config).into(),
            BlockKind::Line => Line::default().into(),
            BlockKind::Arc => Arc::default().into(),
            BlockKind::Point => Point::default().into(),
            BlockKind::DrillHoles => DrillHoles::new(config).into(),
            BlockKind::BoltHoles => BoltHoles::new(config).into(),
            BlockKind::Image => Image::new(config).into(),
            BlockKind::Stl => Stl::default().into(),
        }
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            Self::Begin(_) => BlockKind::Begin,
            Self::End(_) => BlockKind::End,
            Self::Code(_) => BlockKind::Code,
            Self::Tool(_) => BlockKind::Tool,
            Self::Template(_) => BlockKind::Template,
            Self::Sketch(_) => BlockKind::Sketch,
            Self::Extrusion(_) => BlockKind::Extrusion,
            Self::Line(_) => BlockKind::Line,
            Self::Arc(_) => BlockKind::Arc,
            Self::Point(_) => BlockKind::Point,
            Self::DrillHoles(_) => BlockKind::DrillHoles,
            Self::BoltHoles(_) => BlockKind::BoltHoles,
            Self::Image(_) => BlockKind::Image,
            Self::Stl(_) => BlockKind::Stl,
        }
    }

    pub(crate) fn apply(&mut self, transform: &Transform) {
        dispatch!(self, p => match *transform {
            Transform::Move(delta) => p.translate(delta),
            Transform::Spin { datum, angle } => p.spin(datum, angle),
            Transform::Scale(factor) => p.scale(factor),
            Transform::Flip { datum, axis } => p.flip(datum, axis),
        })
    }

    pub(crate) fn ends(&self) -> Option<(Vec2, Vec2)> {
        dispatch!(self, p => p.ends())
    }

    pub(crate) fn save_fields(&self, w: &mut BinWriter) {
        dispatch!(self, p => p.save_fields(w))
    }

    pub(crate) fn load_field(&mut self, tag: u8, value: &[u8]) -> CodecResult<bool> {
        dispatch!(self, p => p.load_field(tag, value))
    }

    pub(crate) fn write_xml(&self, comment: &str, flags: BlockFlags, attrs: &mut AttrWriter) {
        dispatch!(self, p => p.write_xml(comment, flags, attrs))
    }

    pub(crate) fn parse_xml(&mut self, attrs: &AttrReader<'_>) -> CodecResult<()> {
        dispatch!(self, p => p.parse_xml(attrs))
    }

    /// Adjust an owned offset record after it has been placed under its parent.
    pub(crate) fn refine_offset(&self, offset: Offset) -> Offset {
        match self {
            Self::Template(t) => offset.compose(t.position, t.rotation),
            Self::DrillHoles(d) => Offset {
                z: [offset.z[0], offset.z[0] + d.depth],
                ..offset
            },
            _ => offset,
        }
    }
}

macro_rules! payload_from {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Payload {
                fn from(value: $variant) -> Self {
                    Payload::$variant(value)
                }
            }
        )*
    };
}

payload_from!(
    Begin, End, Code, Tool, Template, Sketch, Extrusion, Line, Arc, Point, DrillHoles, BoltHoles,
    Image, Stl,
);

/// One node's data: common fields plus the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    comment: String,
    pub flags: BlockFlags,
    status: String,
    pub(crate) offset: OffsetRef,
    pub payload: Payload,
}

impl Block {
    /// A block of `kind` with defaults seeded from `config`.
    pub fn new(kind: BlockKind, config: &ProgramConfig) -> Self {
        Self::from_payload(Payload::defaults(kind, config))
    }

    pub fn from_payload(payload: impl Into<Payload>) -> Self {
        let payload = payload.into();
        let offset = if payload.kind().owns_offset() {
            OffsetRef::Owned(Offset::default())
        } else {
            OffsetRef::Default
        };
        Self {
            comment: String::new(),
            flags: BlockFlags::empty(),
            status: String::new(),
            offset,
            payload,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.set_comment(comment);
        self
    }

    pub fn kind(&self) -> BlockKind {
        self.payload.kind()
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Set the comment, truncated to [`MAX_COMMENT_LEN`] characters.
    pub fn set_comment(&mut self, comment: impl Into<String>) {
        let mut comment = comment.into();
        if let Some((idx, _)) = comment.char_indices().nth(MAX_COMMENT_LEN) {
            comment.truncate(idx);
        }
        self.comment = comment;
    }

    /// Result note from the last code generation ("" when fine).
    pub fn status(&self) -> &str {
        &self.status
    }

    pub(crate) fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn is_suppressed(&self) -> bool {
        self.flags.contains(BlockFlags::SUPPRESS)
    }

    pub fn is_locked(&self) -> bool {
        self.flags.contains(BlockFlags::LOCK)
    }

    pub fn offset_ref(&self) -> &OffsetRef {
        &self.offset
    }

    /// The block's own offset record, for kinds that carry one.
    pub fn own_offset_mut(&mut self) -> Option<&mut Offset> {
        match &mut self.offset {
            OffsetRef::Owned(offset) => Some(offset),
            _ => None,
        }
    }

    pub fn as_tool(&self) -> Option<&Tool> {
        match &self.payload {
            Payload::Tool(tool) => Some(tool),
            _ => None,
        }
    }
}
