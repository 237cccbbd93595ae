use gcamkit_camtools::GcodeWriter;
use gcamkit_core::{ProgramConfig, Vec3};

use super::{BlockFlags, BlockPayload};
use crate::error::CodecResult;
use crate::serialization::binary::{bool_value, vec3_value, BinWriter};
use crate::serialization::tags::end as tag;
use crate::serialization::xml::{AttrReader, AttrWriter};

/// Program trailer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct End {
    pub retract_position: Vec3,
    /// Send `G28` instead of the retract moves when home switches exist.
    pub home_all_axes: bool,
}

impl End {
    pub fn new(config: &ProgramConfig) -> Self {
        Self {
            retract_position: Vec3::new(0.0, 0.0, config.ztraverse),
            home_all_axes: false,
        }
    }

    pub(crate) fn make(&self, config: &ProgramConfig) -> String {
        let mut w = GcodeWriter::new(config.decimals);
        w.rapid_z(config.ztraverse);
        if self.home_all_axes && config.machine.home_switches {
            w.line("G28");
        } else {
            w.rapid_xy(self.retract_position.xy());
            w.rapid_z(self.retract_position.z);
        }
        if config.machine.spindle_control {
            w.line("M5");
        }
        if config.machine.coolant {
            w.line("M9");
        }
        w.line("M30");
        if config.dialect.uses_tape_delimiters() {
            w.line("%");
        }
        w.finish()
    }
}

impl BlockPayload for End {
    fn scale(&mut self, factor: f64) {
        self.retract_position = self.retract_position * factor;
    }

    fn save_fields(&self, w: &mut BinWriter) {
        w.record_vec3(tag::RETRACT_POSITION, self.retract_position);
        w.record_bool(tag::HOME_ALL_AXES, self.home_all_axes);
    }

    fn load_field(&mut self, t: u8, value: &[u8]) -> CodecResult<bool> {
        match t {
            tag::RETRACT_POSITION => self.retract_position = vec3_value(t, value)?,
            tag::HOME_ALL_AXES => self.home_all_axes = bool_value(t, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn write_xml(&self, comment: &str, flags: BlockFlags, attrs: &mut AttrWriter) {
        attrs.common(comment, flags);
        attrs.vec3("retract-position", self.retract_position);
        attrs.bool("home-all-axes", self.home_all_axes);
    }

    fn parse_xml(&mut self, attrs: &AttrReader<'_>) -> CodecResult<()> {
        if let Some(position) = attrs.vec3("retract-position")? {
            self.retract_position = position;
        }
        if let Some(home) = attrs.bool("home-all-axes")? {
            self.home_all_axes = home;
        }
        Ok(())
    }
}
