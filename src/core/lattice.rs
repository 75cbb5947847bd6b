//! core::lattice
//!
//! Ring-based sampling of the aperture and the aperture boundary test.
//!
//! # Modes
//!
//! - **Sector**: rings from the inner threshold out to the rim, each sampled
//!   over one half-open wedge `[0, span)`. The wedge is later replicated.
//! - **Full disk**: rings from the centre up to (not including) the inner
//!   threshold, each sampled over `[0, 2π)`.
//!
//! Both modes share one radial grid `k * period`. An inner threshold that is
//! not a multiple of the period only moves the index where the sector mode
//! takes over, so the last full-disk ring and the first sector ring are
//! always exactly one period apart.
//!
//! # Invariants
//!
//! - Ring radii are `k * period`, computed per index, never summed
//! - The two modes never produce the same radius
//! - The centre ring (`r = 0`) is always a single full-disk site
//! - Every ring with `r > 0` has at least one angular sample

use std::f64::consts::TAU;

use serde::Serialize;

use super::errors::LensError;
use super::params::{GenerationConfig, LensParameters};
use super::types::{LatticeSite, Point};

/// Relative guard (in periods) against float noise at ring boundaries.
const RING_EPSILON: f64 = 1e-9;

/// Which sampling scheme a ring belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LatticeMode {
    /// One wedge of the outer region, replicated later.
    Sector,
    /// Full 360° sampling of the inner disk.
    FullDisk,
}

impl std::fmt::Display for LatticeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LatticeMode::Sector => write!(f, "sector"),
            LatticeMode::FullDisk => write!(f, "full-disk"),
        }
    }
}

/// One ring of lattice sites.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ring {
    /// Ring radius.
    pub radius: f64,
    /// Sampling scheme.
    pub mode: LatticeMode,
    /// Number of angular samples `T`.
    pub samples: usize,
    /// Angular extent sampled, in radians (half-open).
    pub span: f64,
}

impl Ring {
    /// Angle of the `j`-th sample.
    pub fn angle(&self, j: usize) -> f64 {
        self.span * j as f64 / self.samples as f64
    }

    /// All sample angles in ascending order, `[0, span)`.
    pub fn angles(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.samples).map(move |j| self.angle(j))
    }

    /// Sample positions in ascending angle order.
    pub fn positions(&self) -> impl Iterator<Item = (f64, Point)> + '_ {
        self.angles()
            .map(move |theta| (theta, Point::from_polar(self.radius, theta)))
    }
}

/// Produces the ring plan for both lattice modes.
///
/// # Example
///
/// ```
/// use metalens_mask::core::lattice::LatticeGenerator;
/// use metalens_mask::core::params::{GenerationConfig, LensParameters};
///
/// let params = LensParameters::new(8000.0, 10.0, 2.0, 1500).unwrap();
/// let config = GenerationConfig::with_defaults(&params).unwrap();
/// let lattice = LatticeGenerator::new(&params, &config);
///
/// let inner = lattice.full_disk_radii();
/// let outer = lattice.sector_radii();
/// assert_eq!(inner.first(), Some(&0.0));
/// assert_eq!(inner.last(), Some(&398.0));
/// assert_eq!(outer.first(), Some(&400.0));
/// assert_eq!(outer.last(), Some(&3000.0));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LatticeGenerator {
    period: f64,
    aperture_radius: f64,
    inner_radius: f64,
    sector_count: u32,
    sector_span: f64,
}

impl LatticeGenerator {
    /// Create a generator for a lens and tiling configuration.
    pub fn new(params: &LensParameters, config: &GenerationConfig) -> Self {
        Self {
            period: params.period(),
            aperture_radius: params.aperture_radius(),
            inner_radius: config.inner_radius(),
            sector_count: config.sector_count(),
            sector_span: config.sector_span_rad(),
        }
    }

    /// Index of the first sector-mode ring on the `k * period` grid.
    ///
    /// The smallest `k >= 1` with `k * period >= inner`. Also the number of
    /// full-disk rings.
    pub fn boundary_index(&self) -> usize {
        ((self.inner_radius / self.period) - RING_EPSILON).ceil().max(1.0) as usize
    }

    /// Radii of the sector-mode rings: `k * period` from the boundary index
    /// up to the rim, rim included.
    pub fn sector_radii(&self) -> Vec<f64> {
        let p = self.period;
        let first = self.boundary_index();
        let last = (self.aperture_radius / p + RING_EPSILON).floor();
        if last < first as f64 {
            return Vec::new();
        }
        (first..=last as usize)
            .map(|k| {
                let r = k as f64 * p;
                if r > self.aperture_radius {
                    // Only reachable within RING_EPSILON of the rim.
                    self.aperture_radius
                } else {
                    r
                }
            })
            .collect()
    }

    /// Radii of the full-disk rings: `k * period` strictly below the inner
    /// threshold. Always contains the centre.
    pub fn full_disk_radii(&self) -> Vec<f64> {
        let p = self.period;
        (0..self.boundary_index()).map(|k| k as f64 * p).collect()
    }

    /// Number of angular samples for a ring.
    ///
    /// Sector mode uses `ceil(2πr / period / count)`, full-disk mode
    /// `ceil(2πr / period)`. The centre ring has exactly one sample.
    ///
    /// # Errors
    ///
    /// Returns `LensError::DegenerateLattice` if a ring with positive radius
    /// resolves to zero (or a non-finite number of) samples.
    pub fn angular_samples(&self, radius: f64, mode: LatticeMode) -> Result<usize, LensError> {
        if radius == 0.0 {
            return Ok(1);
        }
        let circumference_in_periods = TAU * radius / self.period;
        let samples = match mode {
            LatticeMode::Sector => (circumference_in_periods / f64::from(self.sector_count)).ceil(),
            LatticeMode::FullDisk => circumference_in_periods.ceil(),
        };
        if !samples.is_finite() || samples < 1.0 {
            return Err(LensError::DegenerateLattice { radius });
        }
        Ok(samples as usize)
    }

    /// Build one ring.
    pub fn ring(&self, radius: f64, mode: LatticeMode) -> Result<Ring, LensError> {
        let samples = self.angular_samples(radius, mode)?;
        let span = match mode {
            LatticeMode::Sector => self.sector_span,
            LatticeMode::FullDisk => TAU,
        };
        Ok(Ring {
            radius,
            mode,
            samples,
            span,
        })
    }

    /// All sector-mode rings, innermost first.
    pub fn sector_rings(&self) -> Result<Vec<Ring>, LensError> {
        self.sector_radii()
            .into_iter()
            .map(|r| self.ring(r, LatticeMode::Sector))
            .collect()
    }

    /// All full-disk rings, centre first.
    pub fn full_disk_rings(&self) -> Result<Vec<Ring>, LensError> {
        self.full_disk_radii()
            .into_iter()
            .map(|r| self.ring(r, LatticeMode::FullDisk))
            .collect()
    }
}

/// Discards lattice sites outside the lens.
///
/// A site is kept when `2 * radius <= diameter`, so sites exactly on the rim
/// are included. The ring radius is used rather than a distance recomputed
/// from Cartesian coordinates, which would pick up rounding noise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApertureFilter {
    diameter: f64,
}

impl ApertureFilter {
    /// Filter for a lens.
    pub fn for_lens(params: &LensParameters) -> Self {
        Self {
            diameter: params.diameter(),
        }
    }

    /// Whether a site at `radius` from the origin lies inside the aperture.
    pub fn accepts_radius(&self, radius: f64) -> bool {
        2.0 * radius <= self.diameter
    }

    /// Whether a site lies inside the aperture.
    pub fn accepts(&self, site: &LatticeSite) -> bool {
        self.accepts_radius(site.radius)
    }
}
