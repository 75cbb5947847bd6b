//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Configuration is layered. Every layer uses the same
//! [`ConfigFile`] schema and only states the values it overrides.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values (the reference lens)
//! 2. Global config file
//! 3. Project config file
//! 4. CLI flags (applied with [`Config::with_overrides`])
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$METALENS_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/metalens/config.toml`
//! 3. `~/.metalens/config.toml` (canonical write location)
//!
//! # Project Config Locations
//!
//! 1. The path given with `--config`
//! 2. `./metalens.toml` if present
//!
//! # Example
//!
//! ```no_run
//! use metalens_mask::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("lens.toml"))).unwrap();
//! let config = result.config;
//!
//! let params = config.lens_parameters().unwrap();
//! println!("Diameter: {}", params.diameter());
//! println!("Output: {}", config.output_path().display());
//! ```

pub mod schema;

pub use schema::{
    CellsSection, ConfigFile, LayoutFormat, LensSection, OutputSection, TilingSection,
};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::errors::LensError;
use super::library::UnitCellLibrary;
use super::params::{GenerationConfig, LensParameters};
use super::shape::{Ellipse, LayerSpec};

/// File name looked up in the working directory.
pub const PROJECT_CONFIG_NAME: &str = "metalens.toml";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

impl From<LensError> for ConfigError {
    fn from(e: LensError) -> Self {
        ConfigError::InvalidValue(e.to_string())
    }
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// Accessors apply built-in defaults for anything no layer set.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Merged values from every layer
    merged: ConfigFile,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the project config file (if loaded)
    project_path: Option<PathBuf>,
}

impl Config {
    pub const DEFAULT_FOCAL_LENGTH: f64 = 8000.0;
    pub const DEFAULT_WAVELENGTH: f64 = 10.0;
    pub const DEFAULT_PERIOD: f64 = 2.0;
    pub const DEFAULT_ARRAY_SIZE: u32 = 1500;
    pub const DEFAULT_MIN_SIZE: f64 = 0.2;
    pub const DEFAULT_MAX_SIZE: f64 = 0.8;
    pub const DEFAULT_CELL_COUNT: usize = 16;
    pub const DEFAULT_OUTPUT: &'static str = "metalens_mask.json";
    pub const DEFAULT_TOP_NAME: &'static str = "aperture";

    /// Load configuration from default locations.
    ///
    /// `project` is an explicit project file; when `None`, `./metalens.toml`
    /// is used if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed, or if an
    /// explicitly requested project file does not exist.
    pub fn load(project: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let global = Self::find_global();
        let project = match project {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let local = PathBuf::from(PROJECT_CONFIG_NAME);
                local.exists().then_some(local)
            }
        };
        Self::load_from(global.as_deref(), project.as_deref())
    }

    /// Load configuration from explicit file paths.
    ///
    /// A missing global file is skipped; a missing project file is an error.
    pub fn load_from(
        global: Option<&Path>,
        project: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();
        let mut merged = ConfigFile::default();
        let mut global_path = None;
        let mut project_path = None;

        if let Some(path) = global.filter(|p| p.exists()) {
            let layer = Self::read_config_file(path)?;
            layer.validate()?;
            Self::collect_warnings(&layer, path, &mut warnings);
            merged = merged.merged_with(layer);
            global_path = Some(path.to_path_buf());
        }

        if let Some(path) = project {
            let layer = Self::read_config_file(path)?;
            layer.validate()?;
            Self::collect_warnings(&layer, path, &mut warnings);
            merged = merged.merged_with(layer);
            project_path = Some(path.to_path_buf());
        }

        Ok(ConfigLoadResult {
            config: Config {
                merged,
                global_path,
                project_path,
            },
            warnings,
        })
    }

    /// Locate the global config file, if any.
    fn find_global() -> Option<PathBuf> {
        // 1. Check $METALENS_CONFIG
        if let Ok(path) = std::env::var("METALENS_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/metalens/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("metalens/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.metalens/config.toml
        dirs::home_dir()
            .map(|home| home.join(".metalens/config.toml"))
            .filter(|path| path.exists())
    }

    fn collect_warnings(layer: &ConfigFile, path: &Path, warnings: &mut Vec<ConfigWarning>) {
        if layer.cells.as_ref().is_some_and(|c| c.sizes_shadow_sweep()) {
            warnings.push(ConfigWarning {
                message: "cells.sizes is set; min_size, max_size and count are ignored"
                    .to_string(),
                path: path.to_path_buf(),
            });
        }
    }

    /// Read and parse a config file.
    fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply a final override layer (typically CLI flags).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the override layer is invalid.
    pub fn with_overrides(mut self, overrides: ConfigFile) -> Result<Self, ConfigError> {
        overrides.validate()?;
        self.merged = self.merged.merged_with(overrides);
        Ok(self)
    }

    /// Get the canonical path for global config.
    ///
    /// Returns `~/.metalens/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".metalens/config.toml"))
    }

    /// A config layer holding every default value explicitly.
    pub fn defaults() -> ConfigFile {
        ConfigFile {
            lens: Some(LensSection {
                focal_length: Some(Self::DEFAULT_FOCAL_LENGTH),
                wavelength: Some(Self::DEFAULT_WAVELENGTH),
                period: Some(Self::DEFAULT_PERIOD),
                array_size: Some(Self::DEFAULT_ARRAY_SIZE),
            }),
            cells: Some(CellsSection {
                min_size: Some(Self::DEFAULT_MIN_SIZE),
                max_size: Some(Self::DEFAULT_MAX_SIZE),
                count: Some(Self::DEFAULT_CELL_COUNT),
                sizes: None,
                vertices: Some(Ellipse::DEFAULT_VERTICES),
                aspect: Some(1.0),
                layer: Some(LayerSpec::default().layer),
                datatype: Some(LayerSpec::default().datatype),
            }),
            tiling: Some(TilingSection {
                inner_radius: Some(GenerationConfig::DEFAULT_INNER_RADIUS),
                sector_count: Some(GenerationConfig::DEFAULT_SECTOR_COUNT),
                sector_span_deg: Some(GenerationConfig::DEFAULT_SECTOR_SPAN_DEG),
                phase_table_resolution: None,
            }),
            output: Some(OutputSection {
                path: Some(PathBuf::from(Self::DEFAULT_OUTPUT)),
                format: None,
                top_name: Some(Self::DEFAULT_TOP_NAME.to_string()),
            }),
        }
    }

    /// The merged configuration with defaults filled in.
    pub fn effective(&self) -> ConfigFile {
        Self::defaults().merged_with(self.merged.clone())
    }

    /// Write a config file atomically.
    ///
    /// Creates parent directories if needed. Uses atomic write
    /// (write to temp file, then rename) to prevent corruption.
    pub fn write_file(path: &Path, config: &ConfigFile) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        // Write to temp file in same directory (for atomic rename)
        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // Accessors with defaults
    // =========================================================================

    fn lens(&self) -> LensSection {
        self.merged.lens.clone().unwrap_or_default()
    }

    fn cells(&self) -> CellsSection {
        self.merged.cells.clone().unwrap_or_default()
    }

    fn tiling(&self) -> TilingSection {
        self.merged.tiling.clone().unwrap_or_default()
    }

    /// Build validated lens parameters.
    pub fn lens_parameters(&self) -> Result<LensParameters, LensError> {
        let lens = self.lens();
        LensParameters::new(
            lens.focal_length.unwrap_or(Self::DEFAULT_FOCAL_LENGTH),
            lens.wavelength.unwrap_or(Self::DEFAULT_WAVELENGTH),
            lens.period.unwrap_or(Self::DEFAULT_PERIOD),
            lens.array_size.unwrap_or(Self::DEFAULT_ARRAY_SIZE),
        )
    }

    /// Build the validated tiling configuration for a lens.
    pub fn generation_config(&self, params: &LensParameters) -> Result<GenerationConfig, LensError> {
        let tiling = self.tiling();
        GenerationConfig::new(
            params,
            tiling
                .inner_radius
                .unwrap_or(GenerationConfig::DEFAULT_INNER_RADIUS),
            tiling
                .sector_count
                .unwrap_or(GenerationConfig::DEFAULT_SECTOR_COUNT),
            tiling
                .sector_span_deg
                .unwrap_or(GenerationConfig::DEFAULT_SECTOR_SPAN_DEG),
        )
    }

    /// Build the unit-cell catalog.
    pub fn library(&self) -> Result<UnitCellLibrary, LensError> {
        let cells = self.cells();
        match cells.sizes {
            Some(sizes) => UnitCellLibrary::new(sizes),
            None => UnitCellLibrary::from_sweep(
                cells.min_size.unwrap_or(Self::DEFAULT_MIN_SIZE),
                cells.max_size.unwrap_or(Self::DEFAULT_MAX_SIZE),
                cells.count.unwrap_or(Self::DEFAULT_CELL_COUNT),
            ),
        }
    }

    /// Build the unit-cell outline generator.
    pub fn shape(&self) -> Result<Ellipse, LensError> {
        let cells = self.cells();
        let default_layer = LayerSpec::default();
        Ellipse::new(
            cells.vertices.unwrap_or(Ellipse::DEFAULT_VERTICES),
            cells.aspect.unwrap_or(1.0),
            LayerSpec {
                layer: cells.layer.unwrap_or(default_layer.layer),
                datatype: cells.datatype.unwrap_or(default_layer.datatype),
            },
        )
    }

    /// Explicit phase table resolution, if configured.
    pub fn phase_table_resolution(&self) -> Option<usize> {
        self.tiling().phase_table_resolution
    }

    /// Format of the layout file.
    ///
    /// An explicit `output.format` wins, then the extension of an explicit
    /// `output.path`, then JSON.
    pub fn output_format(&self) -> LayoutFormat {
        let output = self.merged.output.as_ref();
        output
            .and_then(|o| o.format)
            .or_else(|| {
                output
                    .and_then(|o| o.path.as_deref())
                    .and_then(LayoutFormat::from_path)
            })
            .unwrap_or_default()
    }

    /// Path of the layout file.
    ///
    /// Without an explicit path, the default name carries the extension of
    /// [`Config::output_format`].
    pub fn output_path(&self) -> PathBuf {
        self.merged
            .output
            .as_ref()
            .and_then(|o| o.path.clone())
            .unwrap_or_else(|| {
                Path::new(Self::DEFAULT_OUTPUT).with_extension(self.output_format().extension())
            })
    }

    /// Name of the top-level group.
    pub fn top_name(&self) -> &str {
        self.merged
            .output
            .as_ref()
            .and_then(|o| o.top_name.as_deref())
            .unwrap_or(Self::DEFAULT_TOP_NAME)
    }

    /// Check that every core parameter can be built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let params = self.lens_parameters()?;
        self.generation_config(&params)?;
        self.library()?;
        self.shape()?;
        Ok(())
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded project config file.
    pub fn project_config_loaded_from(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_empty_defaults() {
        let result = Config::load_from(None, None).unwrap();
        let config = result.config;

        let params = config.lens_parameters().unwrap();
        assert_eq!(params.focal_length(), 8000.0);
        assert_eq!(params.diameter(), 6000.0);
        assert_eq!(config.library().unwrap().len(), 16);
        assert_eq!(config.output_path(), PathBuf::from("metalens_mask.json"));
        assert_eq!(config.top_name(), "aperture");
        assert!(config.global_config_loaded_from().is_none());
    }

    #[test]
    fn output_format_precedence() {
        let output = |path: Option<&str>, format: Option<LayoutFormat>| {
            Config::default()
                .with_overrides(ConfigFile {
                    output: Some(OutputSection {
                        path: path.map(PathBuf::from),
                        format,
                        top_name: None,
                    }),
                    ..Default::default()
                })
                .unwrap()
        };

        let by_extension = output(Some("out/mask.gds"), None);
        assert_eq!(by_extension.output_format(), LayoutFormat::Gds);
        assert_eq!(by_extension.output_path(), PathBuf::from("out/mask.gds"));

        let by_flag = output(None, Some(LayoutFormat::Gds));
        assert_eq!(by_flag.output_path(), PathBuf::from("metalens_mask.gds"));

        let explicit_wins = output(Some("mask.json"), Some(LayoutFormat::Gds));
        assert_eq!(explicit_wins.output_format(), LayoutFormat::Gds);

        assert_eq!(output(Some("mask.dat"), None).output_format(), LayoutFormat::Json);
    }

    #[test]
    fn load_project_file() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("lens.toml");

        fs::write(
            &config_path,
            r#"
            [lens]
            period = 1.0
            array_size = 600

            [tiling]
            inner_radius = 100.0
            "#,
        )
        .unwrap();

        let result = Config::load_from(None, Some(&config_path)).unwrap();
        let config = result.config;

        let params = config.lens_parameters().unwrap();
        assert_eq!(params.period(), 1.0);
        assert_eq!(params.aperture_radius(), 600.0);
        assert_eq!(params.wavelength(), 10.0);
        assert_eq!(config.generation_config(&params).unwrap().inner_radius(), 100.0);
        assert_eq!(config.project_config_loaded_from(), Some(config_path.as_path()));
    }

    #[test]
    fn project_overrides_global() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("global.toml");
        let project = temp.path().join("project.toml");
        fs::write(&global, "[lens]\nwavelength = 1.55\nperiod = 0.5\n").unwrap();
        fs::write(&project, "[lens]\nperiod = 0.6\n").unwrap();

        let config = Config::load_from(Some(&global), Some(&project))
            .unwrap()
            .config;
        let params = config.lens_parameters().unwrap();
        assert_eq!(params.wavelength(), 1.55);
        assert_eq!(params.period(), 0.6);
    }

    #[test]
    fn overrides_win_over_files() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("project.toml");
        fs::write(&project, "[lens]\narray_size = 100\n").unwrap();

        let config = Config::load_from(None, Some(&project))
            .unwrap()
            .config
            .with_overrides(ConfigFile {
                lens: Some(LensSection {
                    array_size: Some(250),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(config.lens_parameters().unwrap().array_size(), 250);
    }

    #[test]
    fn missing_global_is_skipped() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");
        let result = Config::load_from(Some(&missing), None).unwrap();
        assert!(result.config.global_config_loaded_from().is_none());
    }

    #[test]
    fn missing_project_is_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");
        assert!(matches!(
            Config::load_from(None, Some(&missing)),
            Err(ConfigError::ReadError { .. })
        ));
    }

    #[test]
    fn explicit_sizes_warn_and_win() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("project.toml");
        fs::write(
            &project,
            "[cells]\ncount = 16\nsizes = [0.1, 0.2, 0.3, 0.4]\n",
        )
        .unwrap();

        let result = Config::load_from(None, Some(&project)).unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].message.contains("cells.sizes"));
        assert_eq!(result.config.library().unwrap().len(), 4);
    }

    #[test]
    fn invalid_value_rejected() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("project.toml");
        fs::write(&project, "[lens]\nwavelength = -1.0\n").unwrap();

        assert!(matches!(
            Config::load_from(None, Some(&project)),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("project.toml");
        fs::write(&project, "[lens]\nfocus = 1.0\n").unwrap();

        assert!(matches!(
            Config::load_from(None, Some(&project)),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn cross_field_validation() {
        let config = Config::default()
            .with_overrides(ConfigFile {
                tiling: Some(TilingSection {
                    inner_radius: Some(5000.0),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn write_file_atomic() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/metalens.toml");

        Config::write_file(&path, &Config::defaults()).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("toml.tmp").exists());
        let loaded = Config::load_from(None, Some(&path)).unwrap().config;
        assert_eq!(loaded.effective(), Config::defaults());
    }
}
