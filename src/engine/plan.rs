//! engine::plan
//!
//! The ring plan: every ring the generator will sample, in order.
//!
//! Plans are pure data. Building one performs no quantization, so it is
//! cheap enough for `inspect` to show what a full run would produce.

use serde::Serialize;

use crate::core::errors::LensError;
use crate::core::lattice::{LatticeGenerator, Ring};

/// Rings for both lattice modes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RingPlan {
    /// Full-disk rings, centre first.
    pub full_disk: Vec<Ring>,
    /// Sector rings, innermost first.
    pub sector: Vec<Ring>,
}

impl RingPlan {
    /// Build the plan from a lattice generator.
    ///
    /// # Errors
    ///
    /// Propagates `LensError::DegenerateLattice` from ring construction.
    pub fn build(lattice: &LatticeGenerator) -> Result<Self, LensError> {
        Ok(Self {
            full_disk: lattice.full_disk_rings()?,
            sector: lattice.sector_rings()?,
        })
    }

    /// Number of sites sampled in one sector (before the aperture filter).
    pub fn sector_sites(&self) -> usize {
        self.sector.iter().map(|r| r.samples).sum()
    }

    /// Number of sites sampled in the inner disk.
    pub fn full_disk_sites(&self) -> usize {
        self.full_disk.iter().map(|r| r.samples).sum()
    }

    /// All ring radii, ascending.
    pub fn radii(&self) -> Vec<f64> {
        self.full_disk
            .iter()
            .chain(self.sector.iter())
            .map(|r| r.radius)
            .collect()
    }

    /// Outermost sampled radius.
    pub fn outer_radius(&self) -> f64 {
        self.sector
            .last()
            .or(self.full_disk.last())
            .map(|r| r.radius)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::{GenerationConfig, LensParameters};

    #[test]
    fn plan_is_ordered_and_gapless() {
        let params = LensParameters::new(100.0, 1.0, 1.0, 40).unwrap();
        let config = GenerationConfig::new(&params, 10.0, 36, 10.0).unwrap();
        let plan = RingPlan::build(&LatticeGenerator::new(&params, &config)).unwrap();

        let radii = plan.radii();
        assert_eq!(radii.len(), 41);
        for (k, r) in radii.iter().enumerate() {
            assert_eq!(*r, k as f64);
        }
        assert_eq!(plan.outer_radius(), 40.0);
        assert_eq!(plan.full_disk_sites(), plan.full_disk.iter().map(|r| r.samples).sum::<usize>());
        assert_eq!(plan.full_disk[0].samples, 1);
    }
}
