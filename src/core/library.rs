//! core::library
//!
//! The ordered catalog of unit-cell designs.
//!
//! # Calibration assumption
//!
//! The catalog index encodes phase: design `i` of `N` is assumed to impart
//! `i * 2π / N`. This treats the size sweep as a linear phase ramp over one
//! period. Nothing here checks that assumption against electromagnetic
//! simulation; a real calibration would replace the sweep with measured
//! size-to-phase data while keeping the ordering contract.

use std::f64::consts::TAU;

use serde::Serialize;

use super::errors::LensError;

/// One unit-cell design and the phase it stands for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnitCellDesign {
    /// Geometric size of the cell (the ellipse radius for the default shape).
    pub size_parameter: f64,
    /// Position in the catalog, `0..N`.
    pub phase_index: usize,
    /// Phase this design is assumed to impart: `phase_index * 2π / N`.
    pub assigned_phase: f64,
}

/// Read-only catalog of unit-cell designs, built once and shared.
///
/// # Example
///
/// ```
/// use metalens_mask::core::library::UnitCellLibrary;
///
/// let library = UnitCellLibrary::from_sweep(0.2, 0.8, 16).unwrap();
/// assert_eq!(library.len(), 16);
/// assert_eq!(library.design(0).unwrap().phase_index, 0);
///
/// // Sizes must increase strictly.
/// assert!(UnitCellLibrary::new(vec![0.3, 0.2]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitCellLibrary {
    designs: Vec<UnitCellDesign>,
}

impl UnitCellLibrary {
    /// Build a catalog from a strictly increasing size sequence.
    ///
    /// # Errors
    ///
    /// Returns `LensError::Configuration` if fewer than two sizes are given,
    /// if a size is not finite and positive, or if the sequence does not
    /// strictly increase.
    pub fn new(sizes: Vec<f64>) -> Result<Self, LensError> {
        if sizes.len() < 2 {
            return Err(LensError::config(format!(
                "unit-cell catalog needs at least 2 designs, got {}",
                sizes.len()
            )));
        }

        if let Some(bad) = sizes.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
            return Err(LensError::config(format!(
                "unit-cell size must be finite and positive, got {}",
                bad
            )));
        }

        if let Some(i) = sizes.windows(2).position(|w| w[1] <= w[0]) {
            return Err(LensError::config(format!(
                "unit-cell sizes must strictly increase: {} at index {} is followed by {}",
                sizes[i],
                i,
                sizes[i + 1]
            )));
        }

        let n = sizes.len();
        let designs = sizes
            .into_iter()
            .enumerate()
            .map(|(phase_index, size_parameter)| UnitCellDesign {
                size_parameter,
                phase_index,
                assigned_phase: phase_index as f64 * TAU / n as f64,
            })
            .collect();

        Ok(Self { designs })
    }

    /// Build a catalog from `count` evenly spaced sizes over `[min, max]`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`UnitCellLibrary::new`].
    pub fn from_sweep(min: f64, max: f64, count: usize) -> Result<Self, LensError> {
        Self::new(linspace(min, max, count))
    }

    /// Number of designs `N`.
    pub fn len(&self) -> usize {
        self.designs.len()
    }

    /// Always false; a valid catalog holds at least two designs.
    pub fn is_empty(&self) -> bool {
        self.designs.is_empty()
    }

    /// Look up a design by phase index.
    pub fn design(&self, phase_index: usize) -> Option<&UnitCellDesign> {
        self.designs.get(phase_index)
    }

    /// All designs in phase order.
    pub fn designs(&self) -> &[UnitCellDesign] {
        &self.designs
    }

    /// Phase step between neighbouring designs, `2π / N`.
    pub fn phase_step(&self) -> f64 {
        TAU / self.designs.len() as f64
    }
}

/// `count` evenly spaced values over `[start, end]`, both ends included.
///
/// Each value is computed from its index, never accumulated.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count)
                .map(|i| {
                    if i == count - 1 {
                        end
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}
