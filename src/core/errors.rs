//! core::errors
//!
//! Error taxonomy for the tiling core.
//!
//! Every variant is fatal. The computation is deterministic and has no I/O,
//! so nothing here is retried or recovered internally.

use thiserror::Error;

/// Errors raised by the phase-quantization and tessellation core.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LensError {
    /// Invalid parameters, catalog, sector geometry, or coincident placements.
    ///
    /// Raised before any lattice generation begins, except for position
    /// collisions which are detected while a group is assembled.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Quantization resolved to an index outside the catalog.
    #[error("phase {phase} quantized to index {index}, outside catalog of {catalog_size} designs")]
    OutOfRange {
        /// The resolved (invalid) catalog index.
        index: i64,
        /// Number of designs in the catalog.
        catalog_size: usize,
        /// The wrapped target phase that was being quantized.
        phase: f64,
    },

    /// A ring requested zero angular samples.
    #[error("degenerate lattice: ring at radius {radius} produced no angular samples")]
    DegenerateLattice {
        /// Radius of the offending ring.
        radius: f64,
    },
}

impl LensError {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        LensError::Configuration(message.into())
    }
}
