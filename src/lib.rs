//! # GCamKit
//!
//! A CAM program builder for CNC mills. Programs are trees of blocks
//! (setup, sketches, hole groups, surface generators) that are turned into
//! G-code for one of several controller dialects.
//!
//! ## Architecture
//!
//! GCamKit is organized as a workspace with multiple crates:
//!
//! 1. **gcamkit-core** - Math, offsets, units and program configuration
//! 2. **gcamkit-camtools** - G-code writer, drilling cycles, path optimizer, mesh slicer
//! 3. **gcamkit-designer** - Block tree, code generation, binary and XML files
//! 4. **gcamkit-settings** - Persistent defaults for new programs
//! 5. **gcamkit** - Command line front end that ties the crates together

pub mod commands;

pub use gcamkit_core::{
    Aabb, Dialect, DrillingMotion, MachineOptions, MaterialType, Offset, ProgramConfig, Units,
    Vec2, Vec3,
};

pub use gcamkit_designer::{
    load_from_file, save_to_file, Block, BlockId, BlockKind, Format, Payload, Program,
};

pub use gcamkit_settings::{LineEnding, OutputSettings, ProgramFormat, Settings};

/// Build date stamped by the build script.
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize tracing. `RUST_LOG` directives refine the default `info` level.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    // stdout carries G-code when no output file is given
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
