//! engine::replicate
//!
//! Rotational replication of the sector group.
//!
//! The replicator produces transforms, not placements: the sector is handed
//! to the backend once and referenced by every rotated instance.

use crate::core::params::GenerationConfig;
use crate::core::types::{Placement, PlacementGroup, Transform};

/// Produces the rotated instances that tile the outer region.
#[derive(Debug, Clone, Copy)]
pub struct SymmetryReplicator {
    config: GenerationConfig,
}

impl SymmetryReplicator {
    pub fn new(config: &GenerationConfig) -> Self {
        Self { config: *config }
    }

    /// One pure rotation per sector copy: 0°, span, 2·span, …
    ///
    /// # Example
    ///
    /// ```
    /// use metalens_mask::core::params::{GenerationConfig, LensParameters};
    /// use metalens_mask::engine::replicate::SymmetryReplicator;
    ///
    /// let params = LensParameters::new(8000.0, 10.0, 2.0, 1500).unwrap();
    /// let config = GenerationConfig::with_defaults(&params).unwrap();
    /// let instances = SymmetryReplicator::new(&config).instances();
    ///
    /// assert_eq!(instances.len(), 36);
    /// assert_eq!(instances[1].rotation_deg, 10.0);
    /// assert_eq!(instances[35].rotation_deg, 350.0);
    /// ```
    pub fn instances(&self) -> Vec<Transform> {
        (0..self.config.sector_count())
            .map(|k| Transform::rotation(self.config.rotation_deg(k)))
            .collect()
    }
}

/// Materialize the placements of a group under each transform.
///
/// Only used for verification and tests; the layout itself keeps the
/// hierarchy.
pub fn flatten<'a>(
    group: &'a PlacementGroup,
    instances: &'a [Transform],
) -> impl Iterator<Item = Placement> + 'a {
    instances.iter().flat_map(move |t| {
        group.iter().map(move |p| Placement {
            position: t.apply(p.position),
            cell: p.cell,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::LensParameters;
    use crate::core::types::Point;

    #[test]
    fn instances_are_pure_rotations() {
        let params = LensParameters::new(100.0, 1.0, 1.0, 100).unwrap();
        let config = GenerationConfig::new(&params, 10.0, 12, 30.0).unwrap();
        let instances = SymmetryReplicator::new(&config).instances();

        assert_eq!(instances.len(), 12);
        for (k, t) in instances.iter().enumerate() {
            assert_eq!(t.rotation_deg, 30.0 * k as f64);
            assert_eq!(t.translation, Point::default());
        }
    }

    #[test]
    fn flatten_rotates_every_copy() {
        let params = LensParameters::new(100.0, 1.0, 1.0, 100).unwrap();
        let config = GenerationConfig::new(&params, 10.0, 4, 90.0).unwrap();
        let instances = SymmetryReplicator::new(&config).instances();

        let mut group = PlacementGroup::new("sector");
        group.placements.push(Placement {
            position: Point::new(2.0, 0.0),
            cell: 5,
        });

        let flat: Vec<_> = flatten(&group, &instances).collect();
        assert_eq!(flat.len(), 4);
        assert!((flat[1].position.y - 2.0).abs() < 1e-12);
        assert!((flat[2].position.x + 2.0).abs() < 1e-12);
        assert!(flat.iter().all(|p| p.cell == 5));
    }
}
