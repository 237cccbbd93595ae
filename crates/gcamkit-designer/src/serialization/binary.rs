//! Binary TLV codec
//!
//! Layout (little endian):
//!
//! ```text
//! "GCAM" version:u8 header_size:u32 <config records> <block>*
//! block  = type:u8 size:u32 <record>*
//! record = tag:u8 len:u32 payload[len]
//! ```
//!
//! Block sizes are back-patched after the body is written. Child blocks follow
//! their parent's `NUMBER` record inside the parent body; an extruder follows
//! a zero-length `EXTRUDER` record.

use gcamkit_core::{Dialect, DrillingMotion, MachineOptions, MaterialType, ProgramConfig, Units};
use gcamkit_core::{Vec2, Vec3};
use tracing::debug;

use crate::block::{Block, BlockFlags};
use crate::error::{CodecError, CodecResult};
use crate::program::{BlockId, Program, Slot};
use crate::serialization::tags::{self, config as cfg};

/// Append-only record writer.
#[derive(Debug, Default)]
pub(crate) struct BinWriter {
    buf: Vec<u8>,
}

impl BinWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub(crate) fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub(crate) fn u32(&mut self, value: u32) {
        self.bytes(&value.to_le_bytes());
    }

    /// Reserve a `u32` size slot and return its position.
    pub(crate) fn mark(&mut self) -> usize {
        let at = self.buf.len();
        self.u32(0);
        at
    }

    /// Fill a size slot with the byte count written since it.
    pub(crate) fn patch(&mut self, mark: usize) {
        let size = (self.buf.len() - mark - 4) as u32;
        self.buf[mark..mark + 4].copy_from_slice(&size.to_le_bytes());
    }

    pub(crate) fn record(&mut self, tag: u8, payload: &[u8]) {
        self.u8(tag);
        self.u32(payload.len() as u32);
        self.bytes(payload);
    }

    pub(crate) fn record_u8(&mut self, tag: u8, value: u8) {
        self.record(tag, &[value]);
    }

    pub(crate) fn record_bool(&mut self, tag: u8, value: bool) {
        self.record_u8(tag, value as u8);
    }

    pub(crate) fn record_u32(&mut self, tag: u8, value: u32) {
        self.record(tag, &value.to_le_bytes());
    }

    pub(crate) fn record_u32_pair(&mut self, tag: u8, value: [u32; 2]) {
        let mut payload = Vec::with_capacity(8);
        payload.extend_from_slice(&value[0].to_le_bytes());
        payload.extend_from_slice(&value[1].to_le_bytes());
        self.record(tag, &payload);
    }

    pub(crate) fn record_f64(&mut self, tag: u8, value: f64) {
        self.record(tag, &value.to_le_bytes());
    }

    pub(crate) fn record_vec2(&mut self, tag: u8, value: Vec2) {
        let mut payload = Vec::with_capacity(16);
        push_vec2(&mut payload, value);
        self.record(tag, &payload);
    }

    pub(crate) fn record_vec3(&mut self, tag: u8, value: Vec3) {
        let mut payload = Vec::with_capacity(24);
        push_vec3(&mut payload, value);
        self.record(tag, &payload);
    }

    pub(crate) fn record_str(&mut self, tag: u8, value: &str) {
        self.record(tag, value.as_bytes());
    }

    pub(crate) fn record_f32s(&mut self, tag: u8, values: &[f32]) {
        let payload: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.record(tag, &payload);
    }

    pub(crate) fn record_triangles(&mut self, tag: u8, triangles: &[[Vec3; 3]]) {
        let mut payload = Vec::with_capacity(triangles.len() * 72);
        for vertex in triangles.iter().flatten() {
            push_vec3(&mut payload, *vertex);
        }
        self.record(tag, &payload);
    }

    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

fn push_vec2(buf: &mut Vec<u8>, v: Vec2) {
    buf.extend_from_slice(&v.x.to_le_bytes());
    buf.extend_from_slice(&v.y.to_le_bytes());
}

fn push_vec3(buf: &mut Vec<u8>, v: Vec3) {
    buf.extend_from_slice(&v.x.to_le_bytes());
    buf.extend_from_slice(&v.y.to_le_bytes());
    buf.extend_from_slice(&v.z.to_le_bytes());
}

/// Bounded cursor over a byte slice.
#[derive(Debug)]
pub(crate) struct BinReader<'a> {
    data: &'a [u8],
    pos: usize,
    /// Absolute offset of `data[0]`, for error messages.
    base: usize,
}

impl<'a> BinReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            base: 0,
        }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub(crate) fn take(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(CodecError::Truncated {
                offset: self.base + self.pos,
                needed: n,
                available: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub(crate) fn u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u32(&mut self) -> CodecResult<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Split off the next `n` bytes as their own reader.
    pub(crate) fn sub(&mut self, n: usize) -> CodecResult<BinReader<'a>> {
        let start = self.base + self.pos;
        let data = self.take(n)?;
        Ok(BinReader {
            data,
            pos: 0,
            base: start,
        })
    }

    /// Next `(tag, payload)` record.
    pub(crate) fn record(&mut self) -> CodecResult<(u8, &'a [u8])> {
        let tag = self.u8()?;
        let len = self.u32()? as usize;
        Ok((tag, self.take(len)?))
    }
}

fn expect_len(tag: u8, value: &[u8], expected: usize) -> CodecResult<()> {
    if value.len() != expected {
        return Err(CodecError::FieldLength {
            tag,
            expected,
            actual: value.len(),
        });
    }
    Ok(())
}

fn f64_at(value: &[u8], at: usize) -> f64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&value[at..at + 8]);
    f64::from_le_bytes(raw)
}

fn u32_at(value: &[u8], at: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&value[at..at + 4]);
    u32::from_le_bytes(raw)
}

pub(crate) fn u8_value(tag: u8, value: &[u8]) -> CodecResult<u8> {
    expect_len(tag, value, 1)?;
    Ok(value[0])
}

pub(crate) fn bool_value(tag: u8, value: &[u8]) -> CodecResult<bool> {
    Ok(u8_value(tag, value)? != 0)
}

pub(crate) fn u32_value(tag: u8, value: &[u8]) -> CodecResult<u32> {
    expect_len(tag, value, 4)?;
    Ok(u32_at(value, 0))
}

pub(crate) fn u32_pair_value(tag: u8, value: &[u8]) -> CodecResult<[u32; 2]> {
    expect_len(tag, value, 8)?;
    Ok([u32_at(value, 0), u32_at(value, 4)])
}

fn finite_at(tag: u8, value: &[u8], at: usize) -> CodecResult<f64> {
    let v = f64_at(value, at);
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CodecError::InvalidValue {
            tag,
            reason: format!("{} is not a finite number", v),
        })
    }
}

pub(crate) fn f64_value(tag: u8, value: &[u8]) -> CodecResult<f64> {
    expect_len(tag, value, 8)?;
    finite_at(tag, value, 0)
}

pub(crate) fn vec2_value(tag: u8, value: &[u8]) -> CodecResult<Vec2> {
    expect_len(tag, value, 16)?;
    Ok(Vec2::new(finite_at(tag, value, 0)?, finite_at(tag, value, 8)?))
}

pub(crate) fn vec3_value(tag: u8, value: &[u8]) -> CodecResult<Vec3> {
    expect_len(tag, value, 24)?;
    Ok(Vec3::new(
        finite_at(tag, value, 0)?,
        finite_at(tag, value, 8)?,
        finite_at(tag, value, 16)?,
    ))
}

pub(crate) fn str_value(value: &[u8]) -> CodecResult<String> {
    Ok(String::from_utf8(value.to_vec())?)
}

pub(crate) fn f32s_value(tag: u8, value: &[u8]) -> CodecResult<Vec<f32>> {
    if value.len() % 4 != 0 {
        return Err(CodecError::InvalidValue {
            tag,
            reason: format!("{} bytes is not a whole number of f32 values", value.len()),
        });
    }
    value
        .chunks_exact(4)
        .map(|c| {
            let v = f32::from_le_bytes([c[0], c[1], c[2], c[3]]);
            if v.is_finite() {
                Ok(v)
            } else {
                Err(CodecError::InvalidValue {
                    tag,
                    reason: format!("{} is not a finite number", v),
                })
            }
        })
        .collect()
}

pub(crate) fn triangles_value(tag: u8, value: &[u8]) -> CodecResult<Vec<[Vec3; 3]>> {
    if value.len() % 72 != 0 {
        return Err(CodecError::InvalidValue {
            tag,
            reason: format!("{} bytes is not a whole number of triangles", value.len()),
        });
    }
    value
        .chunks_exact(72)
        .map(|t| {
            let v = |i: usize| -> CodecResult<Vec3> {
                Ok(Vec3::new(
                    finite_at(tag, t, i * 24)?,
                    finite_at(tag, t, i * 24 + 8)?,
                    finite_at(tag, t, i * 24 + 16)?,
                ))
            };
            Ok([v(0)?, v(1)?, v(2)?])
        })
        .collect()
}

fn invalid_code(tag: u8, code: u8) -> CodecError {
    CodecError::InvalidValue {
        tag,
        reason: format!("unknown code {}", code),
    }
}

fn write_config(w: &mut BinWriter, config: &ProgramConfig) {
    let mark = w.mark();
    w.record_str(cfg::NAME, &config.name);
    w.record_str(cfg::NOTES, &config.notes);
    w.record_u8(cfg::UNITS, config.units.to_u8());
    w.record_u8(cfg::MATERIAL_TYPE, config.material_type.to_u8());
    w.record_vec3(cfg::MATERIAL_SIZE, config.material_size);
    w.record_vec3(cfg::MATERIAL_ORIGIN, config.material_origin);
    w.record_f64(cfg::ZTRAVERSE, config.ztraverse);
    w.record_u8(cfg::DRILLING_MOTION, config.drilling_motion.to_u8());
    w.record_u8(cfg::DIALECT, config.dialect.to_u8());
    w.record_u8(cfg::MACHINE_OPTIONS, config.machine.to_bits());
    w.record_u8(cfg::DECIMALS, config.decimals);
    w.patch(mark);
}

fn read_config(r: &mut BinReader<'_>) -> CodecResult<ProgramConfig> {
    let mut config = ProgramConfig::default();
    while !r.is_empty() {
        let (tag, value) = r.record()?;
        match tag {
            cfg::NAME => config.name = str_value(value)?,
            cfg::NOTES => config.notes = str_value(value)?,
            cfg::UNITS => {
                let code = u8_value(tag, value)?;
                config.units = Units::from_u8(code).ok_or_else(|| invalid_code(tag, code))?;
            }
            cfg::MATERIAL_TYPE => {
                let code = u8_value(tag, value)?;
                config.material_type =
                    MaterialType::from_u8(code).ok_or_else(|| invalid_code(tag, code))?;
            }
            cfg::MATERIAL_SIZE => config.material_size = vec3_value(tag, value)?,
            cfg::MATERIAL_ORIGIN => config.material_origin = vec3_value(tag, value)?,
            cfg::ZTRAVERSE => config.ztraverse = f64_value(tag, value)?,
            cfg::DRILLING_MOTION => {
                let code = u8_value(tag, value)?;
                config.drilling_motion =
                    DrillingMotion::from_u8(code).ok_or_else(|| invalid_code(tag, code))?;
            }
            cfg::DIALECT => {
                let code = u8_value(tag, value)?;
                config.dialect = Dialect::from_u8(code).ok_or_else(|| invalid_code(tag, code))?;
            }
            cfg::MACHINE_OPTIONS => {
                config.machine = MachineOptions::from_bits(u8_value(tag, value)?)
            }
            cfg::DECIMALS => config.decimals = u8_value(tag, value)?,
            other => debug!("skipping unknown config tag 0x{:02x}", other),
        }
    }
    Ok(config)
}

fn write_block(w: &mut BinWriter, program: &Program, id: BlockId) {
    let Some(block) = program.get(id) else {
        return;
    };
    let kind = block.kind();

    w.u8(tags::type_code(kind));
    let mark = w.mark();
    w.record_str(tags::BLOCK_COMMENT, block.comment());
    w.record_u8(tags::BLOCK_FLAGS, block.flags.bits());
    block.payload.save_fields(w);

    if let Some(tag) = tags::children_tag(kind) {
        let children = program.children(id);
        w.record_u32(tag, children.len() as u32);
        for child in children {
            write_block(w, program, *child);
        }
    }
    if let (Some(tag), Some(extruder)) = (tags::extruder_tag(kind), program.extruder(id)) {
        w.record(tag, &[]);
        write_block(w, program, extruder);
    }
    w.patch(mark);
}

fn read_block(
    program: &mut Program,
    parent: Option<BlockId>,
    slot: Slot,
    r: &mut BinReader<'_>,
) -> CodecResult<BlockId> {
    let code = r.u8()?;
    let kind = tags::kind_from_code(code).ok_or(CodecError::UnknownBlockType(code))?;
    let size = r.u32()? as usize;
    let mut body = r.sub(size)?;
    program.check_placement(parent, slot, kind)?;

    let block = Block::new(kind, &program.config);
    let id = program.attach(parent, slot, block);

    while !body.is_empty() {
        let (tag, value) = body.record()?;

        if tag == tags::BLOCK_COMMENT {
            let comment = str_value(value)?;
            if let Some(block) = program.get_mut(id) {
                block.set_comment(comment);
            }
        } else if tag == tags::BLOCK_FLAGS {
            let flags = BlockFlags::from_bits(u8_value(tag, value)?);
            if let Some(block) = program.get_mut(id) {
                block.flags = flags;
            }
        } else if Some(tag) == tags::children_tag(kind) {
            let count = u32_value(tag, value)?;
            for _ in 0..count {
                read_block(program, Some(id), Slot::Child, &mut body)?;
            }
        } else if Some(tag) == tags::extruder_tag(kind) {
            read_block(program, Some(id), Slot::Extruder, &mut body)?;
        } else {
            let known = match program.get_mut(id) {
                Some(block) => block.payload.load_field(tag, value)?,
                None => false,
            };
            if !known {
                debug!("skipping unknown {} tag 0x{:02x}", kind, tag);
            }
        }
    }

    program.refresh_derived(id);
    Ok(id)
}

/// Encode a program.
pub fn write_program(program: &Program) -> Vec<u8> {
    let mut w = BinWriter::new();
    w.bytes(tags::MAGIC);
    w.u8(tags::VERSION);
    write_config(&mut w, &program.config);
    for root in program.roots() {
        write_block(&mut w, program, *root);
    }
    w.into_inner()
}

/// Decode a program. Any malformed record fails the whole read.
pub fn read_program(data: &[u8]) -> CodecResult<Program> {
    let mut r = BinReader::new(data);
    let magic = r.take(tags::MAGIC.len()).map_err(|_| CodecError::BadMagic)?;
    if magic != tags::MAGIC {
        return Err(CodecError::BadMagic);
    }
    let version = r.u8()?;
    if version != tags::VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let header_size = r.u32()? as usize;
    let mut header = r.sub(header_size)?;
    let config = read_config(&mut header)?;

    let mut program = Program::new(config);
    while !r.is_empty() {
        read_block(&mut program, None, Slot::Child, &mut r)?;
    }
    debug!("decoded {} blocks", program.len());
    Ok(program)
}
