//! engine::generate
//!
//! The full tiling run and its result.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use super::assemble::{InnerDiskFiller, SectorAssembler, SiteResolver};
use super::plan::RingPlan;
use super::replicate::{self, SymmetryReplicator};
use crate::core::errors::LensError;
use crate::core::lattice::LatticeGenerator;
use crate::core::library::UnitCellLibrary;
use crate::core::params::{GenerationConfig, LensParameters};
use crate::core::phase::PhaseQuantizer;
use crate::core::types::{Fingerprint, Placement, PlacementGroup, Point, Transform};

/// The tiled aperture.
///
/// Holds the sector once, the rotations that replicate it, and the inner
/// disk placed directly. The final structure is
/// `top = { sector × instances, inner_disk }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApertureLayout {
    /// Wedge placements, replicated by `instances`.
    pub sector: PlacementGroup,
    /// Rotations applied to the sector.
    pub instances: Vec<Transform>,
    /// Centre placements, not replicated.
    pub inner_disk: PlacementGroup,
    /// Rings the placements were sampled from.
    pub plan: RingPlan,
}

impl ApertureLayout {
    /// Placements in the final aperture after replication.
    pub fn total_placements(&self) -> usize {
        self.sector.len() * self.instances.len() + self.inner_disk.len()
    }

    /// Materialize every placement: replicated sector copies first, then the
    /// inner disk.
    pub fn flatten(&self) -> impl Iterator<Item = Placement> + '_ {
        replicate::flatten(&self.sector, &self.instances).chain(self.inner_disk.iter().copied())
    }

    /// Content hash over the sector, the rotations and the inner disk.
    pub fn fingerprint(&self) -> Fingerprint {
        let rotations: Vec<Placement> = self
            .instances
            .iter()
            .enumerate()
            .map(|(k, t)| Placement {
                position: Point::new(t.rotation_deg, 0.0),
                cell: k,
            })
            .collect();
        Fingerprint::compute([
            self.sector.placements.as_slice(),
            rotations.as_slice(),
            self.inner_disk.placements.as_slice(),
        ])
    }

    /// How often each design is used in the final aperture.
    pub fn cell_histogram(&self) -> BTreeMap<usize, usize> {
        let copies = self.instances.len();
        let mut histogram = BTreeMap::new();
        for p in self.sector.iter() {
            *histogram.entry(p.cell).or_insert(0) += copies;
        }
        for p in self.inner_disk.iter() {
            *histogram.entry(p.cell).or_insert(0) += 1;
        }
        histogram
    }
}

/// Runs the tiling algorithm for one lens.
///
/// # Example
///
/// ```
/// use metalens_mask::core::library::UnitCellLibrary;
/// use metalens_mask::core::params::{GenerationConfig, LensParameters};
/// use metalens_mask::engine::generate::Generator;
///
/// let params = LensParameters::new(800.0, 1.0, 1.0, 60).unwrap();
/// let config = GenerationConfig::new(&params, 20.0, 36, 10.0).unwrap();
/// let library = UnitCellLibrary::from_sweep(0.1, 0.4, 8).unwrap();
///
/// let generator = Generator::new(&params, &config, &library, None).unwrap();
/// let layout = generator.generate().unwrap();
///
/// assert_eq!(layout.instances.len(), 36);
/// assert_eq!(
///     layout.total_placements(),
///     layout.sector.len() * 36 + layout.inner_disk.len()
/// );
/// ```
#[derive(Debug)]
pub struct Generator<'a> {
    params: &'a LensParameters,
    config: &'a GenerationConfig,
    quantizer: PhaseQuantizer<'a>,
}

impl<'a> Generator<'a> {
    /// Prepare a run. All configuration errors surface here, before any
    /// lattice site is generated.
    ///
    /// # Errors
    ///
    /// Returns `LensError::Configuration` if the phase table resolution does
    /// not match the catalog.
    pub fn new(
        params: &'a LensParameters,
        config: &'a GenerationConfig,
        library: &'a UnitCellLibrary,
        phase_table_resolution: Option<usize>,
    ) -> Result<Self, LensError> {
        let quantizer = PhaseQuantizer::new(library, phase_table_resolution)?;
        Ok(Self {
            params,
            config,
            quantizer,
        })
    }

    /// The ring plan this run samples.
    pub fn plan(&self) -> Result<RingPlan, LensError> {
        RingPlan::build(&LatticeGenerator::new(self.params, self.config))
    }

    /// Run the full tiling.
    ///
    /// # Errors
    ///
    /// Any `LensError` from ring construction, quantization or collision
    /// checks fails the whole run.
    pub fn generate(&self) -> Result<ApertureLayout, LensError> {
        let plan = self.plan()?;
        debug!(
            full_disk_rings = plan.full_disk.len(),
            sector_rings = plan.sector.len(),
            "ring plan built"
        );

        let resolver = SiteResolver::new(self.params, &self.quantizer);
        let sector = SectorAssembler::new(&resolver).assemble(&plan.sector)?;
        let inner_disk = InnerDiskFiller::new(&resolver).fill(&plan.full_disk)?;
        let instances = SymmetryReplicator::new(self.config).instances();

        let layout = ApertureLayout {
            sector,
            instances,
            inner_disk,
            plan,
        };

        info!(
            sector = layout.sector.len(),
            copies = layout.instances.len(),
            inner_disk = layout.inner_disk.len(),
            total = layout.total_placements(),
            "aperture tiled"
        );
        Ok(layout)
    }
}
