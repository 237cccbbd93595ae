//! # GCamKit CAM Tools
//!
//! Toolpath building blocks shared by the block generators:
//!
//! - **G-code writer**: fixed-precision line formatting with arc and comment helpers
//! - **Drill cycles**: canned G81/G83, simple peck drilling and helical boring
//! - **Optimizer**: greedy nearest-neighbor ordering with duplicate merging
//! - **Slicer**: horizontal waterline cuts through triangle meshes

pub mod drill_cycle;
pub mod error;
pub mod gcode;
pub mod optimizer;
pub mod slicer;

pub use drill_cycle::{
    helical_bore, peck_levels, DrillCycleGenerator, DrillCycleParameters, HelicalPass,
    MAX_PECK_LEVELS, PECK_RELIEF_RATIO,
};
pub use error::{CamToolError, CamToolResult};
pub use gcode::{format_number, ArcDirection, GcodeWriter};
pub use optimizer::PathOptimizer;
pub use slicer::{slice_mesh, slice_triangle, z_range, Segment};
