//! core::config::schema
//!
//! Configuration file schema.
//!
//! The same schema is used for every scope (global, project, CLI flags).
//! All fields are optional so a layer only states what it overrides.
//!
//! # Validation
//!
//! Values are checked for plausibility after parsing. Cross-field checks
//! that need the whole lens (e.g. inner radius versus aperture) happen when
//! the merged [`super::Config`] is turned into core parameters.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// One configuration layer.
///
/// # Example
///
/// ```toml
/// [lens]
/// focal_length = 8000.0
/// wavelength = 10.0
/// period = 2.0
/// array_size = 1500
///
/// [cells]
/// min_size = 0.2
/// max_size = 0.8
/// count = 16
/// vertices = 64
///
/// [tiling]
/// inner_radius = 400.0
/// sector_count = 36
/// sector_span_deg = 10.0
///
/// [output]
/// path = "metalens_mask.gds"
/// format = "gds"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Optical and lattice constants
    pub lens: Option<LensSection>,

    /// Unit-cell catalog
    pub cells: Option<CellsSection>,

    /// Inner disk and sector geometry
    pub tiling: Option<TilingSection>,

    /// Output settings
    pub output: Option<OutputSection>,
}

impl ConfigFile {
    /// Validate the values present in this layer.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(lens) = &self.lens {
            lens.validate()?;
        }
        if let Some(cells) = &self.cells {
            cells.validate()?;
        }
        if let Some(tiling) = &self.tiling {
            tiling.validate()?;
        }
        if let Some(output) = &self.output {
            output.validate()?;
        }
        Ok(())
    }

    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merged_with(self, other: ConfigFile) -> ConfigFile {
        ConfigFile {
            lens: merge_section(self.lens, other.lens, LensSection::merged_with),
            cells: merge_section(self.cells, other.cells, CellsSection::merged_with),
            tiling: merge_section(self.tiling, other.tiling, TilingSection::merged_with),
            output: merge_section(self.output, other.output, OutputSection::merged_with),
        }
    }
}

fn merge_section<T>(base: Option<T>, over: Option<T>, merge: fn(T, T) -> T) -> Option<T> {
    match (base, over) {
        (Some(b), Some(o)) => Some(merge(b, o)),
        (b, None) => b,
        (None, o) => o,
    }
}

/// `[lens]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LensSection {
    /// Focal length
    pub focal_length: Option<f64>,

    /// Design wavelength
    pub wavelength: Option<f64>,

    /// Unit-cell period (lattice spacing)
    pub period: Option<f64>,

    /// Number of periods from centre to rim
    pub array_size: Option<u32>,
}

impl LensSection {
    /// Validate the section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("lens.focal_length", self.focal_length)?;
        positive("lens.wavelength", self.wavelength)?;
        positive("lens.period", self.period)?;
        if self.array_size == Some(0) {
            return Err(ConfigError::InvalidValue(
                "lens.array_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn merged_with(self, o: LensSection) -> LensSection {
        LensSection {
            focal_length: o.focal_length.or(self.focal_length),
            wavelength: o.wavelength.or(self.wavelength),
            period: o.period.or(self.period),
            array_size: o.array_size.or(self.array_size),
        }
    }
}

/// `[cells]` section.
///
/// Either a linear sweep (`min_size`, `max_size`, `count`) or an explicit,
/// strictly increasing `sizes` list. An explicit list takes precedence.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CellsSection {
    /// Smallest size of the sweep
    pub min_size: Option<f64>,

    /// Largest size of the sweep
    pub max_size: Option<f64>,

    /// Number of designs in the sweep
    pub count: Option<usize>,

    /// Explicit size list (overrides the sweep)
    pub sizes: Option<Vec<f64>>,

    /// Polygon vertices per cell outline
    pub vertices: Option<usize>,

    /// Ellipse aspect ratio (y radius / x radius)
    pub aspect: Option<f64>,

    /// Output layer number
    pub layer: Option<u16>,

    /// Output datatype number
    pub datatype: Option<u16>,
}

impl CellsSection {
    /// Validate the section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("cells.min_size", self.min_size)?;
        positive("cells.max_size", self.max_size)?;
        positive("cells.aspect", self.aspect)?;
        if let (Some(min), Some(max)) = (self.min_size, self.max_size) {
            if max <= min {
                return Err(ConfigError::InvalidValue(format!(
                    "cells.max_size ({}) must be greater than cells.min_size ({})",
                    max, min
                )));
            }
        }
        if let Some(count) = self.count {
            if count < 2 {
                return Err(ConfigError::InvalidValue(format!(
                    "cells.count must be at least 2, got {}",
                    count
                )));
            }
        }
        if let Some(vertices) = self.vertices {
            if vertices < 3 {
                return Err(ConfigError::InvalidValue(format!(
                    "cells.vertices must be at least 3, got {}",
                    vertices
                )));
            }
        }
        Ok(())
    }

    /// Whether both an explicit list and sweep fields are set.
    pub fn sizes_shadow_sweep(&self) -> bool {
        self.sizes.is_some()
            && (self.min_size.is_some() || self.max_size.is_some() || self.count.is_some())
    }

    fn merged_with(self, o: CellsSection) -> CellsSection {
        CellsSection {
            min_size: o.min_size.or(self.min_size),
            max_size: o.max_size.or(self.max_size),
            count: o.count.or(self.count),
            sizes: o.sizes.or(self.sizes),
            vertices: o.vertices.or(self.vertices),
            aspect: o.aspect.or(self.aspect),
            layer: o.layer.or(self.layer),
            datatype: o.datatype.or(self.datatype),
        }
    }
}

/// `[tiling]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TilingSection {
    /// Radius below which the full-disk lattice is used
    pub inner_radius: Option<f64>,

    /// Number of rotated sector copies
    pub sector_count: Option<u32>,

    /// Angular span of one sector in degrees
    pub sector_span_deg: Option<f64>,

    /// Number of phase table edges (must be designs + 1)
    pub phase_table_resolution: Option<usize>,
}

impl TilingSection {
    /// Validate the section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(inner) = self.inner_radius {
            if !inner.is_finite() || inner < 0.0 {
                return Err(ConfigError::InvalidValue(format!(
                    "tiling.inner_radius must be non-negative, got {}",
                    inner
                )));
            }
        }
        if self.sector_count == Some(0) {
            return Err(ConfigError::InvalidValue(
                "tiling.sector_count must be at least 1".to_string(),
            ));
        }
        positive("tiling.sector_span_deg", self.sector_span_deg)?;
        Ok(())
    }

    fn merged_with(self, o: TilingSection) -> TilingSection {
        TilingSection {
            inner_radius: o.inner_radius.or(self.inner_radius),
            sector_count: o.sector_count.or(self.sector_count),
            sector_span_deg: o.sector_span_deg.or(self.sector_span_deg),
            phase_table_resolution: o.phase_table_resolution.or(self.phase_table_resolution),
        }
    }
}

/// File format of the written layout.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LayoutFormat {
    /// `metalens-layout/1` JSON document
    #[default]
    Json,
    /// GDSII stream
    Gds,
}

impl LayoutFormat {
    /// Guess the format from a file extension (`.json`, `.gds`, `.gds2`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(LayoutFormat::Json),
            "gds" | "gds2" | "gdsii" => Some(LayoutFormat::Gds),
            _ => None,
        }
    }

    /// Conventional file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            LayoutFormat::Json => "json",
            LayoutFormat::Gds => "gds",
        }
    }
}

impl std::fmt::Display for LayoutFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// `[output]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    /// Path of the layout file
    pub path: Option<PathBuf>,

    /// Layout format (guessed from the path extension when unset)
    pub format: Option<LayoutFormat>,

    /// Name of the top-level group
    pub top_name: Option<String>,
}

impl OutputSection {
    /// Validate the section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "output.path cannot be empty".to_string(),
                ));
            }
        }
        if let Some(name) = &self.top_name {
            if name.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "output.top_name cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn merged_with(self, o: OutputSection) -> OutputSection {
        OutputSection {
            path: o.path.or(self.path),
            format: o.format.or(self.format),
            top_name: o.top_name.or(self.top_name),
        }
    }
}

fn positive(name: &str, value: Option<f64>) -> Result<(), ConfigError> {
    match value {
        Some(v) if !(v.is_finite() && v > 0.0) => Err(ConfigError::InvalidValue(format!(
            "{} must be finite and positive, got {}",
            name, v
        ))),
        _ => Ok(()),
    }
}
