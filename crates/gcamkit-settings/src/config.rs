//! Settings file handling
//!
//! Settings hold the defaults given to new programs and a few output
//! preferences. They are stored as TOML or JSON, chosen by file extension.

use gcamkit_core::ProgramConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{SettingsError, SettingsResult};

/// Directory name under the platform config dir.
pub const APP_DIR: &str = "gcamkit";

/// Settings file name inside [`APP_DIR`].
pub const SETTINGS_FILE: &str = "settings.toml";

/// File format used when a program path has no recognized extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramFormat {
    #[default]
    Binary,
    Xml,
}

impl ProgramFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Binary => "gcam",
            Self::Xml => "xml",
        }
    }
}

impl std::fmt::Display for ProgramFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Binary => write!(f, "binary"),
            Self::Xml => write!(f, "xml"),
        }
    }
}

/// Line terminator of written G-code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }

    /// Rewrite `text` (LF separated) with this line ending.
    pub fn apply(&self, text: &str) -> String {
        match self {
            Self::Lf => text.to_string(),
            Self::CrLf => text.replace('\n', "\r\n"),
        }
    }
}

/// Output preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Format for saved programs without a recognized extension
    pub default_format: ProgramFormat,
    /// Line ending of generated G-code
    pub line_ending: LineEnding,
    /// Extension given to generated G-code files
    pub gcode_extension: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            default_format: ProgramFormat::Binary,
            line_ending: LineEnding::Lf,
            gcode_extension: "ngc".to_string(),
        }
    }
}

/// Complete settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Configuration given to new programs
    pub program: ProgramConfig,
    /// Output preferences
    pub output: OutputSettings,
}

enum FileKind {
    Json,
    Toml,
}

fn file_kind(path: &Path) -> SettingsResult<FileKind> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(FileKind::Json),
        Some("toml") => Ok(FileKind::Toml),
        other => Err(SettingsError::UnsupportedFormat(
            other.unwrap_or("none").to_string(),
        )),
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// `<config dir>/gcamkit/settings.toml`, when the platform has a config
    /// directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Load settings from a `.toml` or `.json` file.
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let kind = file_kind(path)?;
        let content = std::fs::read_to_string(path)?;
        let settings: Self = match kind {
            FileKind::Json => serde_json::from_str(&content)?,
            FileKind::Toml => toml::from_str(&content)?,
        };
        settings.validate()?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            debug!("no settings at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save settings as `.toml` or `.json`, creating parent directories.
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        let content = match file_kind(path)? {
            FileKind::Json => serde_json::to_string_pretty(self)?,
            FileKind::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                SettingsError::ConfigDirectory(format!("{}: {}", parent.display(), e))
            })?;
        }
        std::fs::write(path, content)?;
        info!("Saved settings to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> SettingsResult<()> {
        self.program.validate()?;

        let ext = &self.output.gcode_extension;
        if ext.is_empty() {
            return Err(SettingsError::InvalidSetting {
                key: "output.gcode_extension".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if ext.contains(['.', '/', '\\']) {
            return Err(SettingsError::InvalidSetting {
                key: "output.gcode_extension".to_string(),
                reason: format!("'{}' must be a bare extension", ext),
            });
        }
        Ok(())
    }

    /// Configuration for a new program.
    pub fn new_program_config(&self) -> ProgramConfig {
        self.program.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcamkit_core::{Dialect, Units};

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::new();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.output.default_format, ProgramFormat::Binary);
        assert_eq!(settings.output.gcode_extension, "ngc");
    }

    #[test]
    fn test_validation_errors() {
        let mut settings = Settings::new();
        settings.output.gcode_extension = ".nc".to_string();
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvalidSetting { .. })
        ));

        let mut settings = Settings::new();
        settings.program.decimals = 12;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Program(_))
        ));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [program]
            units = "inch"
            dialect = "grbl"

            [output]
            line_ending = "crlf"
            "#,
        )
        .unwrap();
        assert_eq!(settings.program.units, Units::Inch);
        assert_eq!(settings.program.dialect, Dialect::Grbl);
        assert_eq!(settings.program.decimals, ProgramConfig::default().decimals);
        assert_eq!(settings.output.line_ending, LineEnding::CrLf);
        assert_eq!(settings.output.gcode_extension, "ngc");
    }

    #[test]
    fn test_line_ending_apply() {
        assert_eq!(LineEnding::Lf.apply("G0\nG1\n"), "G0\nG1\n");
        assert_eq!(LineEnding::CrLf.apply("G0\nG1\n"), "G0\r\nG1\r\n");
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            Settings::load_from_file(Path::new("settings.yaml")),
            Err(SettingsError::UnsupportedFormat(ext)) if ext == "yaml"
        ));
    }

    #[test]
    fn test_default_path_shape() {
        if let Some(path) = Settings::default_path() {
            assert!(path.ends_with("gcamkit/settings.toml"));
        }
    }
}
