//! engine::verify
//!
//! Post-generation invariant verification.
//!
//! # Invariants Checked
//!
//! A finished aperture layout is self-consistent when:
//! 1. Every placement references a design in `0..N`
//! 2. Every placement, after replication, lies within the aperture radius
//! 3. Ring radii step by exactly one lattice period from the centre to the
//!    rim, across the seam between the full-disk and sector lattices
//! 4. Sector copies are pure rotations spaced evenly around the full turn
//! 5. Every sector placement lies in the half-open wedge `[0, span)`
//!
//! Verification is read-only and deterministic. A failure after generation
//! indicates a bug in the tiling core, not bad input.

use std::f64::consts::TAU;

use thiserror::Error;
use tracing::debug;

use super::generate::ApertureLayout;
use super::plan::RingPlan;
use crate::core::params::{GenerationConfig, LensParameters};
use crate::core::types::PlacementGroup;

/// Slack for floating-point comparisons, in periods (or degrees for
/// rotations).
const TOLERANCE: f64 = 1e-9;

/// Errors from verification.
#[derive(Debug, Error, PartialEq)]
pub enum VerifyError {
    /// A placement references a design outside the catalog.
    #[error("placement in '{group}' references design {index}, catalog has {catalog_size}")]
    CellOutOfRange {
        group: String,
        index: usize,
        catalog_size: usize,
    },

    /// A placement lies outside the aperture.
    #[error("placement in '{group}' at radius {radius} exceeds aperture radius {limit}")]
    OutsideAperture {
        group: String,
        radius: f64,
        limit: f64,
    },

    /// The ring radii do not step evenly from the centre to the rim.
    #[error("ring {index} has radius {found}, expected {expected}")]
    RingGap {
        index: usize,
        expected: f64,
        found: f64,
    },

    /// The rings stop short of the rim.
    #[error("outermost ring at {outer} does not reach the rim at {rim}")]
    RimNotCovered { outer: f64, rim: f64 },

    /// A sector copy is not the expected rotation.
    #[error("sector copy {index} has rotation {found}°, expected {expected}°")]
    BadRotation {
        index: usize,
        expected: f64,
        found: f64,
    },

    /// The number of sector copies does not close the full turn.
    #[error("expected {expected} sector copies, found {found}")]
    CopyCount { expected: usize, found: usize },

    /// A sector placement falls outside the wedge.
    #[error("sector placement at angle {angle} rad is outside the wedge [0, {span})")]
    OutsideWedge { angle: f64, span: f64 },
}

/// Verify a generated layout against its lens and tiling configuration.
///
/// # Errors
///
/// Returns the first violated invariant.
pub fn verify(
    layout: &ApertureLayout,
    params: &LensParameters,
    config: &GenerationConfig,
    catalog_size: usize,
) -> Result<(), VerifyError> {
    let slack = params.period() * TOLERANCE;

    check_cells(&layout.sector, catalog_size)?;
    check_cells(&layout.inner_disk, catalog_size)?;

    // Rotations preserve the norm, so the sector itself bounds every copy.
    check_radius(&layout.sector, params.aperture_radius() + slack)?;
    check_radius(&layout.inner_disk, params.aperture_radius() + slack)?;

    check_rings(&layout.plan, params, config, slack)?;
    check_rotations(layout, config)?;
    check_wedge(&layout.sector, config.sector_span_rad(), slack / params.aperture_radius())?;

    debug!(
        total = layout.total_placements(),
        "layout verified"
    );
    Ok(())
}

fn check_cells(group: &PlacementGroup, catalog_size: usize) -> Result<(), VerifyError> {
    match group.iter().find(|p| p.cell >= catalog_size) {
        Some(p) => Err(VerifyError::CellOutOfRange {
            group: group.name.clone(),
            index: p.cell,
            catalog_size,
        }),
        None => Ok(()),
    }
}

fn check_radius(group: &PlacementGroup, limit: f64) -> Result<(), VerifyError> {
    match group.iter().find(|p| p.position.norm() > limit) {
        Some(p) => Err(VerifyError::OutsideAperture {
            group: group.name.clone(),
            radius: p.position.norm(),
            limit,
        }),
        None => Ok(()),
    }
}

fn check_rings(
    plan: &RingPlan,
    params: &LensParameters,
    config: &GenerationConfig,
    slack: f64,
) -> Result<(), VerifyError> {
    let period = params.period();
    let rim = params.aperture_radius();
    let close = |found: f64, expected: f64| {
        (found - expected).abs() <= slack.max(expected * f64::EPSILON * 4.0)
    };

    // Both lattices share one grid: ring i sits at i * period.
    let rings = plan.full_disk.iter().chain(plan.sector.iter());
    for (index, ring) in rings.enumerate() {
        let expected = (index as f64 * period).min(rim);
        if !close(ring.radius, expected) {
            return Err(VerifyError::RingGap {
                index,
                expected,
                found: ring.radius,
            });
        }
    }

    // The full disk stops below the inner radius, the sector takes over at
    // the next grid ring.
    let offset = plan.full_disk.len();
    if let (Some(last), Some(first)) = (plan.full_disk.last(), plan.sector.first()) {
        let gap = first.radius - last.radius;
        let crossed = last.radius > 0.0 && last.radius >= config.inner_radius();
        if crossed || (gap - period).abs() > slack {
            return Err(VerifyError::RingGap {
                index: offset,
                expected: last.radius + period,
                found: first.radius,
            });
        }
    }

    let outer = plan.outer_radius();
    if outer + period <= rim + slack {
        return Err(VerifyError::RimNotCovered { outer, rim });
    }
    Ok(())
}

fn check_rotations(layout: &ApertureLayout, config: &GenerationConfig) -> Result<(), VerifyError> {
    let expected_count = config.sector_count() as usize;
    if layout.instances.len() != expected_count {
        return Err(VerifyError::CopyCount {
            expected: expected_count,
            found: layout.instances.len(),
        });
    }
    for (index, transform) in layout.instances.iter().enumerate() {
        let expected = config.rotation_deg(index as u32);
        let shifted = transform.translation.norm() > 0.0;
        if shifted || (transform.rotation_deg - expected).abs() > TOLERANCE {
            return Err(VerifyError::BadRotation {
                index,
                expected,
                found: transform.rotation_deg,
            });
        }
    }
    Ok(())
}

fn check_wedge(group: &PlacementGroup, span: f64, angular_slack: f64) -> Result<(), VerifyError> {
    for p in group.iter() {
        if p.position.norm() == 0.0 {
            continue;
        }
        let angle = p.position.angle();
        // Points just below the positive x-axis wrap to nearly TAU.
        let in_wedge = angle < span - angular_slack || angle > TAU - angular_slack;
        if !in_wedge {
            return Err(VerifyError::OutsideWedge { angle, span });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lattice::Ring;
    use crate::core::library::UnitCellLibrary;
    use crate::core::types::{Placement, Point, Transform};
    use crate::engine::generate::Generator;

    fn fixture() -> (LensParameters, GenerationConfig, UnitCellLibrary) {
        let params = LensParameters::new(800.0, 1.0, 1.0, 60).unwrap();
        let config = GenerationConfig::new(&params, 20.0, 36, 10.0).unwrap();
        let library = UnitCellLibrary::from_sweep(0.1, 0.4, 8).unwrap();
        (params, config, library)
    }

    fn generated() -> (ApertureLayout, LensParameters, GenerationConfig) {
        let (params, config, library) = fixture();
        let layout = Generator::new(&params, &config, &library, None)
            .unwrap()
            .generate()
            .unwrap();
        (layout, params, config)
    }

    #[test]
    fn generated_layout_verifies() {
        let (layout, params, config) = generated();
        assert_eq!(verify(&layout, &params, &config, 8), Ok(()));
    }

    #[test]
    fn foreign_cell_index_detected() {
        let (mut layout, params, config) = generated();
        layout.inner_disk.placements[0].cell = 8;
        assert!(matches!(
            verify(&layout, &params, &config, 8),
            Err(VerifyError::CellOutOfRange { index: 8, .. })
        ));
    }

    #[test]
    fn placement_past_rim_detected() {
        let (mut layout, params, config) = generated();
        layout.sector.placements.push(Placement {
            position: Point::new(61.0, 0.0),
            cell: 0,
        });
        assert!(matches!(
            verify(&layout, &params, &config, 8),
            Err(VerifyError::OutsideAperture { .. })
        ));
    }

    #[test]
    fn missing_ring_detected() {
        let (mut layout, params, config) = generated();
        layout.plan.sector.remove(3);
        assert!(matches!(
            verify(&layout, &params, &config, 8),
            Err(VerifyError::RingGap { .. })
        ));
    }

    #[test]
    fn unaligned_inner_radius_verifies() {
        let (params, _, library) = fixture();
        let config = GenerationConfig::new(&params, 20.5, 36, 10.0).unwrap();
        let layout = Generator::new(&params, &config, &library, None)
            .unwrap()
            .generate()
            .unwrap();
        assert_eq!(layout.plan.sector[0].radius, 21.0);
        assert_eq!(verify(&layout, &params, &config, 8), Ok(()));
    }

    #[test]
    fn sector_ring_off_grid_detected() {
        let (mut layout, params, config) = generated();
        // A sector lattice started at the inner radius plus float noise.
        layout.plan.sector[0].radius = 20.00001;
        assert!(matches!(
            verify(&layout, &params, &config, 8),
            Err(VerifyError::RingGap { index: 20, .. })
        ));
    }

    #[test]
    fn near_duplicate_seam_ring_detected() {
        let (params, _, library) = fixture();
        let config = GenerationConfig::new(&params, 20.00001, 36, 10.0).unwrap();
        let mut layout = Generator::new(&params, &config, &library, None)
            .unwrap()
            .generate()
            .unwrap();
        assert_eq!(verify(&layout, &params, &config, 8), Ok(()));

        // Full disk ends at 20 and a sector ring sits just past it.
        let first = layout.plan.sector[0];
        layout.plan.sector.insert(0, Ring { radius: 20.00001, ..first });
        assert!(matches!(
            verify(&layout, &params, &config, 8),
            Err(VerifyError::RingGap { index: 21, .. })
        ));
    }

    #[test]
    fn truncated_rings_detected() {
        let (mut layout, params, config) = generated();
        layout.plan.sector.pop();
        layout.plan.sector.pop();
        assert!(matches!(
            verify(&layout, &params, &config, 8),
            Err(VerifyError::RimNotCovered { .. })
        ));
    }

    #[test]
    fn skewed_rotation_detected() {
        let (mut layout, params, config) = generated();
        layout.instances[4] = Transform::rotation(41.0);
        assert!(matches!(
            verify(&layout, &params, &config, 8),
            Err(VerifyError::BadRotation { index: 4, .. })
        ));

        layout.instances.pop();
        assert!(matches!(
            verify(&layout, &params, &config, 8),
            Err(VerifyError::CopyCount { expected: 36, found: 35 })
        ));
    }

    #[test]
    fn wedge_boundary_is_half_open() {
        let span = 10f64.to_radians();
        let mut group = PlacementGroup::new("sector");
        group.placements.push(Placement {
            position: Point::from_polar(30.0, span * 0.5),
            cell: 0,
        });
        assert!(check_wedge(&group, span, 1e-12).is_ok());

        group.placements.push(Placement {
            position: Point::from_polar(30.0, span),
            cell: 0,
        });
        assert!(matches!(
            check_wedge(&group, span, 1e-12),
            Err(VerifyError::OutsideWedge { .. })
        ));
    }
}
