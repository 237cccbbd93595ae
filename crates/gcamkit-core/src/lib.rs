//! # GCamKit Core
//!
//! Core types shared by the GCamKit crates: the math kernel, the offset
//! record inherited through block trees, length units and the program-wide
//! configuration.

pub mod config;
pub mod error;
pub mod math;
pub mod offset;
pub mod units;

pub use config::{Dialect, DrillingMotion, MachineOptions, MaterialType, ProgramConfig};
pub use error::{Error, Result};
pub use math::{Aabb, Vec2, Vec3, ANGULAR_PRECISION, PRECISION};
pub use offset::Offset;
pub use units::Units;

/// Progress callback invoked with a completion fraction in `[0, 1]`.
/// Returning `false` requests cancellation.
pub type ProgressCallback<'a> = &'a mut dyn FnMut(f64) -> bool;
