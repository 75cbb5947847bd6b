//! core::params
//!
//! Immutable lens and tiling parameters.
//!
//! # Types
//!
//! - [`LensParameters`] - Optical and lattice constants, plus derived diameter
//! - [`GenerationConfig`] - Inner-disk threshold and sector geometry
//!
//! Both are validated at construction and never mutated afterwards. They are
//! passed by reference to every component that needs them.

use std::f64::consts::{PI, TAU};

use serde::Serialize;

use super::errors::LensError;

/// Tolerance used when comparing the sector geometry against a full turn.
const GEOMETRY_TOLERANCE: f64 = 1e-9;

/// Optical and lattice constants of the lens.
///
/// Lengths share one unit (microns in the reference design).
///
/// # Example
///
/// ```
/// use metalens_mask::core::params::LensParameters;
///
/// let params = LensParameters::new(8000.0, 10.0, 2.0, 1500).unwrap();
/// assert_eq!(params.diameter(), 6000.0);
/// assert_eq!(params.aperture_radius(), 3000.0);
///
/// assert!(LensParameters::new(-1.0, 10.0, 2.0, 1500).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LensParameters {
    focal_length: f64,
    wavelength: f64,
    period: f64,
    array_size: u32,
}

impl LensParameters {
    /// Create validated lens parameters.
    ///
    /// # Errors
    ///
    /// Returns `LensError::Configuration` if any length is not finite and
    /// strictly positive, or if `array_size` is zero.
    pub fn new(
        focal_length: f64,
        wavelength: f64,
        period: f64,
        array_size: u32,
    ) -> Result<Self, LensError> {
        require_positive("focal_length", focal_length)?;
        require_positive("wavelength", wavelength)?;
        require_positive("period", period)?;
        if array_size == 0 {
            return Err(LensError::config("array_size must be at least 1"));
        }

        let params = Self {
            focal_length,
            wavelength,
            period,
            array_size,
        };

        if params.period >= params.diameter() {
            return Err(LensError::config(format!(
                "period {} must be smaller than diameter {}",
                params.period,
                params.diameter()
            )));
        }

        Ok(params)
    }

    /// Distance from the lens plane to the focal point.
    pub fn focal_length(&self) -> f64 {
        self.focal_length
    }

    /// Design wavelength.
    pub fn wavelength(&self) -> f64 {
        self.wavelength
    }

    /// Lattice spacing between unit cells.
    pub fn period(&self) -> f64 {
        self.period
    }

    /// Number of periods from the centre to the rim.
    pub fn array_size(&self) -> u32 {
        self.array_size
    }

    /// Lens diameter: `2 * array_size * period`.
    pub fn diameter(&self) -> f64 {
        2.0 * f64::from(self.array_size) * self.period
    }

    /// Physical aperture radius: `array_size * period`.
    pub fn aperture_radius(&self) -> f64 {
        f64::from(self.array_size) * self.period
    }
}

/// Tiling parameters: where the inner disk ends and how the outer region is
/// split into symmetric sectors.
///
/// # Example
///
/// ```
/// use metalens_mask::core::params::{GenerationConfig, LensParameters};
///
/// let params = LensParameters::new(8000.0, 10.0, 2.0, 1500).unwrap();
/// let config = GenerationConfig::new(&params, 400.0, 36, 10.0).unwrap();
/// assert_eq!(config.sector_count(), 36);
///
/// // 36 sectors of 12 degrees do not close the circle.
/// assert!(GenerationConfig::new(&params, 400.0, 36, 12.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationConfig {
    inner_radius: f64,
    sector_count: u32,
    sector_span_deg: f64,
}

impl GenerationConfig {
    /// Default inner-disk radius threshold.
    pub const DEFAULT_INNER_RADIUS: f64 = 400.0;
    /// Default number of rotated sector copies.
    pub const DEFAULT_SECTOR_COUNT: u32 = 36;
    /// Default angular span of one sector, in degrees.
    pub const DEFAULT_SECTOR_SPAN_DEG: f64 = 10.0;

    /// Create a validated tiling configuration for the given lens.
    ///
    /// # Errors
    ///
    /// Returns `LensError::Configuration` if the inner radius is negative or
    /// reaches the aperture radius, or if `sector_count * sector_span_deg`
    /// is not a full turn.
    pub fn new(
        params: &LensParameters,
        inner_radius: f64,
        sector_count: u32,
        sector_span_deg: f64,
    ) -> Result<Self, LensError> {
        if !inner_radius.is_finite() || inner_radius < 0.0 {
            return Err(LensError::config(format!(
                "inner_radius must be finite and non-negative, got {}",
                inner_radius
            )));
        }
        if inner_radius >= params.aperture_radius() {
            return Err(LensError::config(format!(
                "inner_radius {} must be smaller than the aperture radius {}",
                inner_radius,
                params.aperture_radius()
            )));
        }
        if sector_count == 0 {
            return Err(LensError::config("sector_count must be at least 1"));
        }
        require_positive("sector_span_deg", sector_span_deg)?;

        let turn = f64::from(sector_count) * sector_span_deg;
        if (turn - 360.0).abs() > GEOMETRY_TOLERANCE * 360.0 {
            return Err(LensError::config(format!(
                "{} sectors of {} degrees cover {} degrees, not 360",
                sector_count, sector_span_deg, turn
            )));
        }

        Ok(Self {
            inner_radius,
            sector_count,
            sector_span_deg,
        })
    }

    /// Default tiling (400 length units, 36 × 10°) for the given lens.
    ///
    /// # Errors
    ///
    /// Fails when the lens is too small for the default inner radius.
    pub fn with_defaults(params: &LensParameters) -> Result<Self, LensError> {
        Self::new(
            params,
            Self::DEFAULT_INNER_RADIUS,
            Self::DEFAULT_SECTOR_COUNT,
            Self::DEFAULT_SECTOR_SPAN_DEG,
        )
    }

    /// Radius below which the full-disk lattice is used.
    pub fn inner_radius(&self) -> f64 {
        self.inner_radius
    }

    /// Number of rotated sector copies.
    pub fn sector_count(&self) -> u32 {
        self.sector_count
    }

    /// Angular span of a sector in degrees.
    pub fn sector_span_deg(&self) -> f64 {
        self.sector_span_deg
    }

    /// Angular span of a sector in radians.
    ///
    /// Derived from the count so that `count * span == 2π` exactly.
    pub fn sector_span_rad(&self) -> f64 {
        TAU / f64::from(self.sector_count)
    }

    /// Rotation of the `k`-th sector copy, in degrees.
    pub fn rotation_deg(&self, k: u32) -> f64 {
        f64::from(k) * 360.0 / f64::from(self.sector_count)
    }

    /// Rotation of the `k`-th sector copy, in radians.
    pub fn rotation_rad(&self, k: u32) -> f64 {
        self.rotation_deg(k) * PI / 180.0
    }
}

fn require_positive(name: &str, value: f64) -> Result<(), LensError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(LensError::config(format!(
            "{} must be finite and strictly positive, got {}",
            name, value
        )))
    }
}
