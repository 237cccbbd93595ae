use gcamkit_camtools::GcodeWriter;
use gcamkit_core::ProgramConfig;

use super::{BlockFlags, BlockPayload};
use crate::error::CodecResult;
use crate::serialization::binary::{u8_value, BinWriter};
use crate::serialization::tags::begin as tag;
use crate::serialization::xml::{AttrReader, AttrWriter};

const WORK_OFFSETS: [&str; 9] = [
    "G54", "G55", "G56", "G57", "G58", "G59", "G59.1", "G59.2", "G59.3",
];

/// Program header.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Begin {
    /// Work offset index, 0 = G54.
    pub coordinate_system: u8,
}

impl Begin {
    /// Work offset word, clamped to what the dialect provides.
    pub fn coordinate_system_word(&self, config: &ProgramConfig) -> &'static str {
        let index = self
            .coordinate_system
            .min(config.dialect.max_coordinate_system()) as usize;
        WORK_OFFSETS[index.min(WORK_OFFSETS.len() - 1)]
    }

    pub(crate) fn make(&self, config: &ProgramConfig) -> String {
        let mut w = GcodeWriter::new(config.decimals);
        if config.dialect.uses_tape_delimiters() {
            w.line("%");
            w.line("O0001");
        }
        w.comment(&format!("Program: {}", config.name));
        for note in config.notes.lines().filter(|l| !l.trim().is_empty()) {
            w.comment(note);
        }
        let size = config.material_size;
        w.comment(&format!(
            "Material: {} {} x {} x {} {}",
            config.material_type,
            w.num(size.x),
            w.num(size.y),
            w.num(size.z),
            config.units.abbreviation()
        ));
        w.line("G17");
        w.line(config.units.gcode());
        w.line("G90");
        if config.dialect.supports_cutter_compensation() {
            w.line("G40");
        }
        if config.dialect.supports_tool_length_offset() {
            w.line("G49");
        }
        w.line(self.coordinate_system_word(config));
        w.rapid_z(config.ztraverse);
        w.finish()
    }
}

impl BlockPayload for Begin {
    fn save_fields(&self, w: &mut BinWriter) {
        w.record_u8(tag::COORDINATE_SYSTEM, self.coordinate_system);
    }

    fn load_field(&mut self, t: u8, value: &[u8]) -> CodecResult<bool> {
        match t {
            tag::COORDINATE_SYSTEM => self.coordinate_system = u8_value(t, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn write_xml(&self, comment: &str, flags: BlockFlags, attrs: &mut AttrWriter) {
        attrs.common(comment, flags);
        attrs.u32("coordinate-system", self.coordinate_system as u32);
    }

    fn parse_xml(&mut self, attrs: &AttrReader<'_>) -> CodecResult<()> {
        if let Some(cs) = attrs.u8("coordinate-system")? {
            self.coordinate_system = cs;
        }
        Ok(())
    }
}
