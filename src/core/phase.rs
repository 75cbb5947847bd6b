//! core::phase
//!
//! Target phase profile and its quantization onto the unit-cell catalog.
//!
//! # Quantization rule
//!
//! The wrapped phase is compared against `N + 1` evenly spaced edges over
//! `[0, 2π]`. The first nearest edge wins; if the phase lies strictly above
//! it the next edge is taken instead. The catalog index is that edge index
//! minus one. In effect every phase in `(e_i, e_{i+1}]` maps to design `i`.
//!
//! An exact hit on edge 0 (phase zero) would resolve to index `-1`. Phase
//! zero is the same point as `2π`, whose bin is `N - 1`, so it wraps there.

use std::f64::consts::TAU;

use super::errors::LensError;
use super::library::{linspace, UnitCellDesign, UnitCellLibrary};
use super::params::LensParameters;
use super::types::Point;

/// Wrap a phase into `[0, 2π)`.
///
/// `rem_euclid` can round a tiny negative input up to exactly `2π`; that
/// case is folded back to zero.
pub fn wrap_phase(phase: f64) -> f64 {
    let wrapped = phase.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Ideal hyperbolic phase profile of a focusing lens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseProfile {
    focal_length: f64,
    wavelength: f64,
}

impl PhaseProfile {
    /// Create a profile.
    ///
    /// # Errors
    ///
    /// Returns `LensError::Configuration` unless both arguments are finite
    /// and strictly positive.
    pub fn new(focal_length: f64, wavelength: f64) -> Result<Self, LensError> {
        if !(focal_length.is_finite() && focal_length > 0.0) {
            return Err(LensError::config(format!(
                "focal_length must be finite and positive, got {}",
                focal_length
            )));
        }
        if !(wavelength.is_finite() && wavelength > 0.0) {
            return Err(LensError::config(format!(
                "wavelength must be finite and positive, got {}",
                wavelength
            )));
        }
        Ok(Self {
            focal_length,
            wavelength,
        })
    }

    /// Profile for already validated lens parameters.
    pub fn for_lens(params: &LensParameters) -> Self {
        Self {
            focal_length: params.focal_length(),
            wavelength: params.wavelength(),
        }
    }

    /// Unwrapped phase at `(x, y)`:
    /// `2π (sqrt(x² + y² + f²) - f) / λ`.
    ///
    /// # Example
    ///
    /// ```
    /// use metalens_mask::core::phase::PhaseProfile;
    ///
    /// let profile = PhaseProfile::new(8000.0, 10.0).unwrap();
    /// assert_eq!(profile.ideal_phase(0.0, 0.0), 0.0);
    /// assert!(profile.ideal_phase(100.0, 0.0) < profile.ideal_phase(200.0, 0.0));
    /// ```
    pub fn ideal_phase(&self, x: f64, y: f64) -> f64 {
        let path = x.hypot(y).hypot(self.focal_length);
        TAU * (path - self.focal_length) / self.wavelength
    }

    /// Unwrapped phase at a point.
    pub fn at(&self, p: Point) -> f64 {
        self.ideal_phase(p.x, p.y)
    }
}

/// Quantization bin edges: `M` evenly spaced phases over `[0, 2π]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseShiftTable {
    edges: Vec<f64>,
}

impl PhaseShiftTable {
    /// Build a table with `resolution` edges.
    ///
    /// # Errors
    ///
    /// Returns `LensError::Configuration` when fewer than three edges are
    /// requested (two bins are the minimum for a meaningful quantizer).
    pub fn new(resolution: usize) -> Result<Self, LensError> {
        if resolution < 3 {
            return Err(LensError::config(format!(
                "phase table needs at least 3 edges, got {}",
                resolution
            )));
        }
        Ok(Self {
            edges: linspace(0.0, TAU, resolution),
        })
    }

    /// Table matching a catalog: `N + 1` edges.
    pub fn for_library(library: &UnitCellLibrary) -> Self {
        Self {
            edges: linspace(0.0, TAU, library.len() + 1),
        }
    }

    /// Number of edges `M`.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Always false for a constructed table.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Edge values in ascending order.
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }
}

/// Maps unwrapped target phases to catalog designs.
///
/// # Example
///
/// ```
/// use metalens_mask::core::library::UnitCellLibrary;
/// use metalens_mask::core::phase::PhaseQuantizer;
///
/// let library = UnitCellLibrary::from_sweep(0.2, 0.8, 16).unwrap();
/// let quantizer = PhaseQuantizer::new(&library, None).unwrap();
///
/// let step = std::f64::consts::TAU / 16.0;
/// assert_eq!(quantizer.quantize(2.5 * step).unwrap(), 2);
/// // Whole turns do not change the result.
/// assert_eq!(quantizer.quantize(2.5 * step + 4.0 * std::f64::consts::TAU).unwrap(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct PhaseQuantizer<'a> {
    library: &'a UnitCellLibrary,
    table: PhaseShiftTable,
}

impl<'a> PhaseQuantizer<'a> {
    /// Create a quantizer over a catalog.
    ///
    /// `resolution` overrides the table size; when given it must equal
    /// `N + 1`.
    ///
    /// # Errors
    ///
    /// Returns `LensError::Configuration` if the resolution does not match
    /// the catalog.
    pub fn new(library: &'a UnitCellLibrary, resolution: Option<usize>) -> Result<Self, LensError> {
        let expected = library.len() + 1;
        let table = match resolution {
            Some(m) if m != expected => {
                return Err(LensError::config(format!(
                    "phase table resolution {} does not match {} designs (expected {})",
                    m,
                    library.len(),
                    expected
                )));
            }
            Some(m) => PhaseShiftTable::new(m)?,
            None => PhaseShiftTable::for_library(library),
        };
        Ok(Self { library, table })
    }

    /// The catalog this quantizer selects from.
    pub fn library(&self) -> &'a UnitCellLibrary {
        self.library
    }

    /// The bin-edge table.
    pub fn table(&self) -> &PhaseShiftTable {
        &self.table
    }

    /// Quantize an unwrapped phase to a catalog index.
    ///
    /// # Errors
    ///
    /// Returns `LensError::OutOfRange` if the phase is not finite or the
    /// rule resolves outside `0..N`.
    pub fn quantize(&self, phase: f64) -> Result<usize, LensError> {
        self.quantize_wrapped(wrap_phase(phase))
    }

    /// Quantize a phase already wrapped into `[0, 2π)`.
    pub fn quantize_wrapped(&self, wrapped: f64) -> Result<usize, LensError> {
        let n = self.library.len();
        let out_of_range = |index: i64| LensError::OutOfRange {
            index,
            catalog_size: n,
            phase: wrapped,
        };

        if !wrapped.is_finite() {
            return Err(out_of_range(-1));
        }

        let mut nearest = 0;
        let mut best = f64::INFINITY;
        for (i, edge) in self.table.edges.iter().enumerate() {
            let distance = (wrapped - edge).abs();
            if distance < best {
                best = distance;
                nearest = i;
            }
        }

        let mut edge = nearest;
        if wrapped - self.table.edges[nearest] > 0.0 {
            edge += 1;
        }

        match edge {
            0 => Ok(n - 1),
            e if e <= n => Ok(e - 1),
            e => Err(out_of_range(e as i64 - 1)),
        }
    }

    /// Quantize and return the design itself.
    pub fn design_for(&self, phase: f64) -> Result<&'a UnitCellDesign, LensError> {
        let index = self.quantize(phase)?;
        self.library.design(index).ok_or(LensError::OutOfRange {
            index: index as i64,
            catalog_size: self.library.len(),
            phase: wrap_phase(phase),
        })
    }
}
