//! Command implementations behind the `gcamkit` binary.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use gcamkit_designer::{load_from_file, save_to_file, Block, BlockId, BlockKind, Program};
use gcamkit_settings::Settings;

/// Generate the G-code of `program` with the configured line ending.
///
/// Blocks that produced a status note are logged as warnings.
pub fn generate(program: &mut Program, settings: &Settings) -> String {
    let gcode = program.make();
    for (_, block) in program.iter() {
        if !block.status().is_empty() {
            warn!("{} '{}': {}", block.kind(), block.comment(), block.status());
        }
    }
    settings.output.line_ending.apply(&gcode)
}

/// Path of the G-code written for `input` when no output is named.
pub fn gcode_path(input: &Path, settings: &Settings) -> PathBuf {
    input.with_extension(&settings.output.gcode_extension)
}

/// Program path with the default format's extension added when it has none.
pub fn program_path(path: &Path, settings: &Settings) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(settings.output.default_format.extension())
    }
}

/// Load `input`, generate its G-code and write it out. Returns the path
/// written.
pub fn make_file(input: &Path, output: Option<&Path>, settings: &Settings) -> Result<PathBuf> {
    let mut program = load_from_file(input)?;
    let gcode = generate(&mut program, settings);
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| gcode_path(input, settings));
    std::fs::write(&output, gcode)
        .with_context(|| format!("Failed to write G-code to {}", output.display()))?;
    info!("Wrote G-code to {}", output.display());
    Ok(output)
}

/// Rewrite a program file in the format implied by `output`.
pub fn convert_file(input: &Path, output: &Path) -> Result<()> {
    let program = load_from_file(input)?;
    save_to_file(&program, output)
}

/// A program holding the usual Begin, Tool, End skeleton built from the
/// settings defaults.
pub fn new_program(settings: &Settings) -> Result<Program> {
    let config = settings.new_program_config();
    let mut program = Program::new(config.clone());
    for kind in [BlockKind::Begin, BlockKind::Tool, BlockKind::End] {
        program
            .insert(None, Block::new(kind, &config))
            .with_context(|| format!("Failed to add {} block", kind))?;
    }
    Ok(program)
}

/// Human readable summary of a program.
pub fn describe(program: &Program) -> String {
    let config = &program.config;
    let mut out = String::new();
    let _ = writeln!(out, "Program:  {}", config.name);
    let _ = writeln!(out, "Units:    {}", config.units);
    let _ = writeln!(out, "Dialect:  {}", config.dialect);
    let _ = writeln!(
        out,
        "Material: {} {} x {} x {} {}",
        config.material_type,
        config.material_size.x,
        config.material_size.y,
        config.material_size.z,
        config.units.abbreviation()
    );
    let _ = writeln!(out, "Blocks:   {}", program.len());
    for &root in program.roots() {
        describe_block(program, root, 1, &mut out);
    }
    out
}

fn describe_block(program: &Program, id: BlockId, depth: usize, out: &mut String) {
    let Some(block) = program.get(id) else {
        return;
    };
    let mut line = format!("{:indent$}{}", "", block.kind(), indent = depth * 2);
    if !block.comment().is_empty() {
        let _ = write!(line, " \"{}\"", block.comment());
    }
    if block.is_suppressed() {
        line.push_str(" [suppressed]");
    }
    let _ = writeln!(out, "{}", line);

    if let Some(extruder) = program.extruder(id) {
        describe_block(program, extruder, depth + 1, out);
    }
    if block.kind().persists_children() {
        for &child in program.children(id) {
            describe_block(program, child, depth + 1, out);
        }
    } else if !program.children(id).is_empty() {
        let _ = writeln!(
            out,
            "{:indent$}({} derived)",
            "",
            program.children(id).len(),
            indent = (depth + 1) * 2
        );
    }
}
