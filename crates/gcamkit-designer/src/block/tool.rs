use gcamkit_camtools::GcodeWriter;
use gcamkit_core::{ProgramConfig, Vec3};
use std::fmt;
use std::str::FromStr;

use super::{BlockFlags, BlockPayload};
use crate::error::{BlockError, CodecError, CodecResult};
use crate::serialization::binary::{
    bool_value, f64_value, str_value, u32_value, u8_value, vec3_value, BinWriter,
};
use crate::serialization::tags::tool as tag;
use crate::serialization::xml::{AttrReader, AttrWriter};

const DEFAULT_DIAMETER_MM: f64 = 3.175;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpindleDirection {
    /// M3
    #[default]
    Clockwise,
    /// M4
    CounterClockwise,
}

impl SpindleDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clockwise => "cw",
            Self::CounterClockwise => "ccw",
        }
    }

    pub fn mcode(&self) -> &'static str {
        match self {
            Self::Clockwise => "M3",
            Self::CounterClockwise => "M4",
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            Self::Clockwise => 0,
            Self::CounterClockwise => 1,
        }
    }

    fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Clockwise),
            1 => Some(Self::CounterClockwise),
            _ => None,
        }
    }
}

impl fmt::Display for SpindleDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SpindleDirection {
    type Err = BlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cw" | "clockwise" => Ok(Self::Clockwise),
            "ccw" | "counterclockwise" | "counter-clockwise" => Ok(Self::CounterClockwise),
            _ => Err(BlockError::InvalidParameter {
                name: "spindle direction",
                reason: format!("unknown value '{}'", s),
            }),
        }
    }
}

/// Cutter and spindle settings for the blocks that follow it.
#[derive(Debug, Clone, PartialEq)]
pub struct Tool {
    pub diameter: f64,
    pub length: f64,
    pub feed: f64,
    /// Fraction of `feed` used for plunges, `0..=1`.
    pub plunge_ratio: f64,
    pub spindle_rpm: u32,
    pub spindle_direction: SpindleDirection,
    pub number: u32,
    pub label: String,
    pub change_position: Vec3,
    pub coolant: bool,
    /// Pause for a manual change.
    pub prompt: bool,
}

impl Tool {
    pub fn new(config: &ProgramConfig) -> Self {
        Self {
            diameter: config.units.from_mm(DEFAULT_DIAMETER_MM),
            length: 0.0,
            feed: config.units.from_mm(config.material_type.default_feed_mm()),
            plunge_ratio: 1.0,
            spindle_rpm: config.material_type.default_spindle_rpm(),
            spindle_direction: SpindleDirection::Clockwise,
            number: 1,
            label: "End Mill".to_string(),
            change_position: Vec3::new(0.0, 0.0, config.ztraverse),
            coolant: false,
            prompt: false,
        }
    }

    pub fn radius(&self) -> f64 {
        self.diameter * 0.5
    }

    pub fn plunge_feed(&self) -> f64 {
        self.feed * self.plunge_ratio
    }

    pub(crate) fn make(&self, config: &ProgramConfig) -> String {
        let mut w = GcodeWriter::new(config.decimals);
        w.comment(&format!(
            "Tool {}: {} {} {}",
            self.number,
            self.label,
            w.num(self.diameter),
            config.units.abbreviation()
        ));

        if config.machine.auto_tool_change {
            w.line(format!("T{} M6", self.number));
            if config.dialect.supports_tool_length_offset() {
                w.line(format!("G43 H{}", self.number));
            }
        } else {
            w.rapid_z(self.change_position.z);
            w.rapid_xy(self.change_position.xy());
            if self.prompt {
                w.line("M0");
            }
        }

        if config.machine.spindle_control {
            w.line(format!(
                "S{} {}",
                self.spindle_rpm,
                self.spindle_direction.mcode()
            ));
        }
        if self.coolant && config.machine.coolant {
            w.line("M8");
        }
        w.feed(self.feed);
        w.finish()
    }
}

impl BlockPayload for Tool {
    fn scale(&mut self, factor: f64) {
        self.diameter *= factor;
        self.length *= factor;
        self.change_position = self.change_position * factor;
    }

    fn save_fields(&self, w: &mut BinWriter) {
        w.record_f64(tag::DIAMETER, self.diameter);
        w.record_f64(tag::LENGTH, self.length);
        w.record_f64(tag::FEED, self.feed);
        w.record_f64(tag::PLUNGE_RATIO, self.plunge_ratio);
        w.record_u32(tag::SPINDLE_RPM, self.spindle_rpm);
        w.record_u8(tag::SPINDLE_DIRECTION, self.spindle_direction.to_u8());
        w.record_u32(tag::NUMBER, self.number);
        w.record_str(tag::LABEL, &self.label);
        w.record_vec3(tag::CHANGE_POSITION, self.change_position);
        w.record_bool(tag::COOLANT, self.coolant);
        w.record_bool(tag::PROMPT, self.prompt);
    }

    fn load_field(&mut self, t: u8, value: &[u8]) -> CodecResult<bool> {
        match t {
            tag::DIAMETER => self.diameter = f64_value(t, value)?,
            tag::LENGTH => self.length = f64_value(t, value)?,
            tag::FEED => self.feed = f64_value(t, value)?,
            tag::PLUNGE_RATIO => self.plunge_ratio = f64_value(t, value)?,
            tag::SPINDLE_RPM => self.spindle_rpm = u32_value(t, value)?,
            tag::SPINDLE_DIRECTION => {
                let code = u8_value(t, value)?;
                self.spindle_direction =
                    SpindleDirection::from_u8(code).ok_or_else(|| CodecError::InvalidValue {
                        tag: t,
                        reason: format!("unknown spindle direction {}", code),
                    })?;
            }
            tag::NUMBER => self.number = u32_value(t, value)?,
            tag::LABEL => self.label = str_value(value)?,
            tag::CHANGE_POSITION => self.change_position = vec3_value(t, value)?,
            tag::COOLANT => self.coolant = bool_value(t, value)?,
            tag::PROMPT => self.prompt = bool_value(t, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn write_xml(&self, comment: &str, flags: BlockFlags, attrs: &mut AttrWriter) {
        attrs.common(comment, flags);
        attrs.f64("diameter", self.diameter);
        attrs.f64("length", self.length);
        attrs.f64("feed", self.feed);
        attrs.f64("plunge-ratio", self.plunge_ratio);
        attrs.u32("spindle-rpm", self.spindle_rpm);
        attrs.word("spindle-direction", self.spindle_direction);
        attrs.u32("number", self.number);
        attrs.str("label", &self.label);
        attrs.vec3("change-position", self.change_position);
        attrs.bool("coolant", self.coolant);
        attrs.bool("prompt", self.prompt);
    }

    fn parse_xml(&mut self, attrs: &AttrReader<'_>) -> CodecResult<()> {
        if let Some(v) = attrs.f64("diameter")? {
            self.diameter = v;
        }
        if let Some(v) = attrs.f64("length")? {
            self.length = v;
        }
        if let Some(v) = attrs.f64("feed")? {
            self.feed = v;
        }
        if let Some(v) = attrs.f64("plunge-ratio")? {
            self.plunge_ratio = v;
        }
        if let Some(v) = attrs.u32("spindle-rpm")? {
            self.spindle_rpm = v;
        }
        if let Some(v) = attrs.parse("spindle-direction")? {
            self.spindle_direction = v;
        }
        if let Some(v) = attrs.u32("number")? {
            self.number = v;
        }
        if let Some(v) = attrs.str("label") {
            self.label = v;
        }
        if let Some(v) = attrs.vec3("change-position")? {
            self.change_position = v;
        }
        if let Some(v) = attrs.bool("coolant")? {
            self.coolant = v;
        }
        if let Some(v) = attrs.bool("prompt")? {
            self.prompt = v;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcamkit_core::{MaterialType, Units};

    #[test]
    fn test_tool_defaults_from_config() {
        let config = ProgramConfig {
            material_type: MaterialType::Wood,
            ..ProgramConfig::default()
        };
        let tool = Tool::new(&config);
        assert_eq!(tool.diameter, 3.175);
        assert_eq!(tool.feed, 1200.0);
        assert_eq!(tool.spindle_rpm, 16000);

        let config = ProgramConfig {
            units: Units::Inch,
            ..ProgramConfig::default()
        };
        assert!((Tool::new(&config).diameter - 0.125).abs() < 1e-12);
    }

    #[test]
    fn test_tool_manual_change() {
        let config = ProgramConfig::default();
        let tool = Tool {
            prompt: true,
            ..Tool::new(&config)
        };
        assert_eq!(
            tool.make(&config),
            "(Tool 1: End Mill 3.1750 mm)\nG0 Z5.0000\nG0 X0.0000 Y0.0000\nM0\nS10000 M3\nF900.0000\n"
        );
    }

    #[test]
    fn test_tool_auto_change() {
        let mut config = ProgramConfig::default();
        config.machine.auto_tool_change = true;
        config.machine.coolant = true;
        let tool = Tool {
            number: 3,
            coolant: true,
            spindle_direction: SpindleDirection::CounterClockwise,
            ..Tool::new(&config)
        };
        let code = tool.make(&config);
        assert!(code.contains("T3 M6\nG43 H3\n"));
        assert!(code.contains("S10000 M4\nM8\n"));
    }

    #[test]
    fn test_spindle_direction_parse() {
        assert_eq!("CCW".parse::<SpindleDirection>().unwrap(), SpindleDirection::CounterClockwise);
        assert!("sideways".parse::<SpindleDirection>().is_err());
    }
}
