use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::export::ExportFormat;
use crate::logging::LogConfig;
use crate::models::UserProfile;
use crate::zones::{MaxHrFormula, ZoneSystem};

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub zones: ZoneSettings,

    /// Values that win over the profile estimated from the data
    pub profile: ProfileOverrides,

    pub import: ImportSettings,

    pub export: ExportSettings,

    pub logging: LogConfig,
}

/// Zone calculation settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneSettings {
    pub zone_system: ZoneSystem,
    pub max_hr_formula: MaxHrFormula,
}

/// Pinned physiological values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileOverrides {
    pub age: Option<u16>,
    pub max_heart_rate: Option<u16>,
    pub resting_heart_rate: Option<u16>,
}

impl ProfileOverrides {
    /// Apply these overrides to an estimated profile
    pub fn apply(&self, estimated: UserProfile) -> UserProfile {
        estimated.with_overrides(self.age, self.max_heart_rate, self.resting_heart_rate)
    }
}

/// Takeout parsing preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Worker threads, `min(cpus, 8)` when unset
    pub num_threads: Option<usize>,

    pub show_progress: bool,

    /// Files taking longer than this are reported as slow
    pub slow_file_secs: u64,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            num_threads: None,
            show_progress: true,
            slow_file_secs: 300,
        }
    }
}

/// Output preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub output_dir: PathBuf,
    pub formats: Vec<ExportFormat>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("fitbridge_output"),
            formats: vec![ExportFormat::Csv, ExportFormat::Tcx],
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// `~/.fitbridge/config.toml`
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".fitbridge")
            .join("config.toml")
    }

    /// Load from `path`; a missing file yields defaults, a broken one is an error
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::load_from_file(&path)
    }
}
