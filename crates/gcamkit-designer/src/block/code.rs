use super::{BlockFlags, BlockPayload};
use crate::error::CodecResult;
use crate::serialization::binary::{str_value, BinWriter};
use crate::serialization::tags::code as tag;
use crate::serialization::xml::{AttrReader, AttrWriter};

/// Verbatim G-code inserted into the program.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Code {
    pub text: String,
}

impl Code {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub(crate) fn make(&self) -> String {
        let mut out = self.text.clone();
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }
}

impl BlockPayload for Code {
    fn save_fields(&self, w: &mut BinWriter) {
        w.record_str(tag::TEXT, &self.text);
    }

    fn load_field(&mut self, t: u8, value: &[u8]) -> CodecResult<bool> {
        match t {
            tag::TEXT => self.text = str_value(value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn write_xml(&self, comment: &str, flags: BlockFlags, attrs: &mut AttrWriter) {
        attrs.common(comment, flags);
        attrs.str("text", &self.text);
    }

    fn parse_xml(&mut self, attrs: &AttrReader<'_>) -> CodecResult<()> {
        if let Some(text) = attrs.str("text") {
            self.text = text;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_newline() {
        assert_eq!(Code::new("M8").make(), "M8\n");
        assert_eq!(Code::new("G0 X0\nM8\n").make(), "G0 X0\nM8\n");
        assert_eq!(Code::default().make(), "");
    }
}
