//! GCamKit Settings Crate
//!
//! Defaults applied to new programs and output preferences, persisted as TOML
//! or JSON in the platform configuration directory.

pub mod config;
pub mod error;

pub use config::{LineEnding, OutputSettings, ProgramFormat, Settings};
pub use error::{SettingsError, SettingsResult};
