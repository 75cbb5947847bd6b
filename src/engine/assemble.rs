//! engine::assemble
//!
//! Turns rings into placement groups.
//!
//! # Architecture
//!
//! [`SiteResolver`] holds the per-site pipeline: position → ideal phase →
//! wrapped phase → quantized design, gated by the aperture filter. Both the
//! [`SectorAssembler`] and the [`InnerDiskFiller`] run it, over different
//! rings and into different groups.
//!
//! Rings are resolved in parallel. Each worker only reads the shared lens
//! parameters and quantizer; results are collected in ring order, so the
//! output does not depend on the number of threads.
//!
//! # Invariants
//!
//! - Every placement's cell index is in `0..N`
//! - No two placements in a group coincide
//! - Any per-site error fails the whole group

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::debug;

use crate::core::errors::LensError;
use crate::core::lattice::{ApertureFilter, LatticeMode, Ring};
use crate::core::params::LensParameters;
use crate::core::phase::{wrap_phase, PhaseProfile, PhaseQuantizer};
use crate::core::types::{LatticeSite, Placement, PlacementGroup, Point};

/// Name of the replicated wedge group.
pub const SECTOR_GROUP: &str = "sector";
/// Name of the directly placed centre group.
pub const INNER_DISK_GROUP: &str = "inner_disk";

/// Collision tolerance, in periods.
const COLLISION_TOLERANCE: f64 = 1e-9;

/// Resolves lattice sites to placements.
#[derive(Debug, Clone)]
pub struct SiteResolver<'q, 'l> {
    profile: PhaseProfile,
    filter: ApertureFilter,
    quantizer: &'q PhaseQuantizer<'l>,
    period: f64,
}

impl<'q, 'l> SiteResolver<'q, 'l> {
    /// Create a resolver for a lens.
    pub fn new(params: &LensParameters, quantizer: &'q PhaseQuantizer<'l>) -> Self {
        Self {
            profile: PhaseProfile::for_lens(params),
            filter: ApertureFilter::for_lens(params),
            quantizer,
            period: params.period(),
        }
    }

    /// Resolve one site. Returns `None` when the aperture filter rejects it.
    pub fn resolve(&self, radius: f64, angle: f64, position: Point) -> Result<Option<LatticeSite>, LensError> {
        if !self.filter.accepts_radius(radius) {
            return Ok(None);
        }
        let target_phase_wrapped = wrap_phase(self.profile.at(position));
        let chosen_cell = self.quantizer.quantize_wrapped(target_phase_wrapped)?;
        Ok(Some(LatticeSite {
            position,
            radius,
            angle,
            target_phase_wrapped,
            chosen_cell,
        }))
    }

    /// Resolve every accepted site of a ring, in angle order.
    pub fn resolve_ring(&self, ring: &Ring) -> Result<Vec<LatticeSite>, LensError> {
        if ring.radius > 0.0 && ring.samples == 0 {
            return Err(LensError::DegenerateLattice {
                radius: ring.radius,
            });
        }
        let mut sites = Vec::with_capacity(ring.samples);
        for (angle, position) in ring.positions() {
            if let Some(site) = self.resolve(ring.radius, angle, position)? {
                sites.push(site);
            }
        }
        Ok(sites)
    }

    /// Resolve rings in parallel into one named group.
    ///
    /// # Errors
    ///
    /// Fails on the first quantization or lattice error, and with
    /// `LensError::Configuration` if two placements coincide.
    pub fn assemble(&self, name: &str, rings: &[Ring]) -> Result<PlacementGroup, LensError> {
        let per_ring: Vec<Vec<Placement>> = rings
            .par_iter()
            .map(|ring| {
                self.resolve_ring(ring)
                    .map(|sites| sites.iter().map(LatticeSite::placement).collect())
            })
            .collect::<Result<_, _>>()?;

        let mut group = PlacementGroup::new(name);
        group.placements = per_ring.into_iter().flatten().collect();
        check_collisions(&group, self.period * COLLISION_TOLERANCE)?;

        debug!(
            group = name,
            rings = rings.len(),
            placements = group.len(),
            "assembled group"
        );
        Ok(group)
    }
}

/// Builds the wedge that is later replicated around the lens.
#[derive(Debug, Clone)]
pub struct SectorAssembler<'r, 'q, 'l> {
    resolver: &'r SiteResolver<'q, 'l>,
}

impl<'r, 'q, 'l> SectorAssembler<'r, 'q, 'l> {
    pub fn new(resolver: &'r SiteResolver<'q, 'l>) -> Self {
        Self { resolver }
    }

    /// Assemble the `sector` group from sector-mode rings.
    ///
    /// # Errors
    ///
    /// Returns `LensError::Configuration` if a full-disk ring is passed.
    pub fn assemble(&self, rings: &[Ring]) -> Result<PlacementGroup, LensError> {
        require_mode(rings, LatticeMode::Sector)?;
        self.resolver.assemble(SECTOR_GROUP, rings)
    }
}

/// Fills the centre of the lens directly, without replication.
#[derive(Debug, Clone)]
pub struct InnerDiskFiller<'r, 'q, 'l> {
    resolver: &'r SiteResolver<'q, 'l>,
}

impl<'r, 'q, 'l> InnerDiskFiller<'r, 'q, 'l> {
    pub fn new(resolver: &'r SiteResolver<'q, 'l>) -> Self {
        Self { resolver }
    }

    /// Assemble the `inner_disk` group from full-disk rings.
    ///
    /// # Errors
    ///
    /// Returns `LensError::Configuration` if a sector ring is passed.
    pub fn fill(&self, rings: &[Ring]) -> Result<PlacementGroup, LensError> {
        require_mode(rings, LatticeMode::FullDisk)?;
        self.resolver.assemble(INNER_DISK_GROUP, rings)
    }
}

fn require_mode(rings: &[Ring], mode: LatticeMode) -> Result<(), LensError> {
    match rings.iter().find(|r| r.mode != mode) {
        Some(ring) => Err(LensError::config(format!(
            "ring at radius {} is {}, expected {}",
            ring.radius, ring.mode, mode
        ))),
        None => Ok(()),
    }
}

/// Fail if two placements lie within `tolerance` of each other.
///
/// Positions are bucketed on a grid of `tolerance`; each point is compared
/// against its own and the eight neighbouring buckets.
pub fn check_collisions(group: &PlacementGroup, tolerance: f64) -> Result<(), LensError> {
    let key = |p: Point| ((p.x / tolerance).round() as i64, (p.y / tolerance).round() as i64);
    let mut seen: HashMap<(i64, i64), Point> = HashMap::with_capacity(group.len());

    for placement in group.iter() {
        let p = placement.position;
        let (kx, ky) = key(p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(other) = seen.get(&(kx + dx, ky + dy)) {
                    if (other.x - p.x).hypot(other.y - p.y) <= tolerance {
                        return Err(LensError::config(format!(
                            "placements in '{}' coincide at ({}, {})",
                            group.name, p.x, p.y
                        )));
                    }
                }
            }
        }
        seen.insert((kx, ky), p);
    }
    Ok(())
}
