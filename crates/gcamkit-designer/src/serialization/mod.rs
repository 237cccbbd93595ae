//! Program file formats
//!
//! Programs are stored either in the compact tagged binary format (`.gcam`)
//! or as an XML document (`.xml`). Both formats round-trip every block the
//! tree can hold.

pub(crate) mod binary;
pub mod tags;
pub(crate) mod xml;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::error::CodecResult;
use crate::program::Program;

/// On-disk program format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Binary,
    Xml,
}

impl Format {
    /// Format implied by a file extension; anything but `xml` is binary.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xml") => Self::Xml,
            _ => Self::Binary,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Binary => "gcam",
            Self::Xml => "xml",
        }
    }
}

pub fn save_binary(program: &Program) -> Vec<u8> {
    binary::write_program(program)
}

pub fn load_binary(data: &[u8]) -> CodecResult<Program> {
    binary::read_program(data)
}

pub fn save_xml(program: &Program) -> CodecResult<String> {
    xml::write_program(program)
}

pub fn load_xml(text: &str) -> CodecResult<Program> {
    xml::read_program(text)
}

/// Decode either format: binary when the data carries the binary magic,
/// XML otherwise.
pub fn load_any(data: &[u8]) -> CodecResult<Program> {
    if data.starts_with(tags::MAGIC) {
        return load_binary(data);
    }
    debug!("no binary magic, trying XML");
    let text = String::from_utf8(data.to_vec())?;
    load_xml(&text)
}

/// Save a program, choosing the format from the file extension.
pub fn save_to_file(program: &Program, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let data = match Format::from_path(path) {
        Format::Binary => save_binary(program),
        Format::Xml => save_xml(program)
            .context("Failed to serialize program")?
            .into_bytes(),
    };
    std::fs::write(path, data)
        .with_context(|| format!("Failed to write program file {}", path.display()))?;
    info!("Saved program '{}' to {}", program.config.name, path.display());
    Ok(())
}

/// Load a program from either format.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Program> {
    let path = path.as_ref();
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read program file {}", path.display()))?;
    let program = load_any(&data)
        .with_context(|| format!("Failed to parse program file {}", path.display()))?;
    info!(
        "Loaded program '{}' ({} blocks) from {}",
        program.config.name,
        program.len(),
        path.display()
    );
    Ok(program)
}
