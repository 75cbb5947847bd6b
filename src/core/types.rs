//! core::types
//!
//! Small value types shared by the core, the engine and layout backends.
//!
//! # Types
//!
//! - [`Point`] - Cartesian position in lens coordinates
//! - [`LatticeSite`] - A transient sample point with its quantization result
//! - [`Placement`] - "Instantiate design `cell` at `position`"
//! - [`PlacementGroup`] - Named, ordered set of placements
//! - [`Transform`] - Rigid 2-D transform (rotation + translation)
//! - [`CellRef`] / [`GroupRef`] - Opaque handles issued by a layout backend
//! - [`Fingerprint`] - Content hash of a placement set

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A position in the lens plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a point from Cartesian coordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Create a point from polar coordinates (angle in radians).
    pub fn from_polar(radius: f64, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            x: radius * cos,
            y: radius * sin,
        }
    }

    /// Euclidean distance from the origin.
    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Polar angle in `[0, 2π)`.
    pub fn angle(&self) -> f64 {
        self.y.atan2(self.x).rem_euclid(std::f64::consts::TAU)
    }

    /// Rotate about the origin by `angle` radians.
    pub fn rotated(&self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }
}

/// A candidate sample point on the lattice and its quantization result.
///
/// Sites are created per ring and consumed immediately into a [`Placement`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticeSite {
    /// Cartesian position.
    pub position: Point,
    /// Ring radius the site was sampled on.
    pub radius: f64,
    /// Polar angle in radians.
    pub angle: f64,
    /// Target phase wrapped into `[0, 2π)`.
    pub target_phase_wrapped: f64,
    /// Catalog index chosen by the quantizer.
    pub chosen_cell: usize,
}

impl LatticeSite {
    /// The placement this site turns into.
    pub fn placement(&self) -> Placement {
        Placement {
            position: self.position,
            cell: self.chosen_cell,
        }
    }
}

/// Instantiate the unit-cell design with phase index `cell` at `position`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub position: Point,
    pub cell: usize,
}

/// A named, ordered collection of placements.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlacementGroup {
    /// Group name as handed to the layout backend.
    pub name: String,
    /// Placements in ring-then-angle order.
    pub placements: Vec<Placement>,
}

impl PlacementGroup {
    /// Create an empty group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            placements: Vec::new(),
        }
    }

    /// Number of placements.
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    /// Whether the group has no placements.
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Iterate over placements.
    pub fn iter(&self) -> impl Iterator<Item = &Placement> {
        self.placements.iter()
    }
}

/// Rigid 2-D transform: rotate about the origin, then translate.
///
/// Magnification is always 1 and there is no mirroring.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    /// Counter-clockwise rotation in degrees.
    pub rotation_deg: f64,
    /// Translation applied after the rotation.
    pub translation: Point,
}

impl Transform {
    /// Pure rotation about the origin.
    pub fn rotation(degrees: f64) -> Self {
        Self {
            rotation_deg: degrees,
            translation: Point::default(),
        }
    }

    /// Pure translation.
    pub fn translation(to: Point) -> Self {
        Self {
            rotation_deg: 0.0,
            translation: to,
        }
    }

    /// Apply the transform to a point.
    pub fn apply(&self, p: Point) -> Point {
        let r = p.rotated(self.rotation_deg.to_radians());
        Point::new(r.x + self.translation.x, r.y + self.translation.y)
    }
}

/// Handle to a unit-cell definition inside a layout backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRef(pub usize);

/// Handle to a group (hierarchical cell) inside a layout backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupRef(pub usize);

/// Content hash of a placement set.
///
/// Placements are hashed in order, with coordinates taken bit-for-bit, so
/// two fingerprints match only when the runs produced identical layouts.
///
/// # Example
///
/// ```
/// use metalens_mask::core::types::{Fingerprint, Placement, Point};
///
/// let placements = vec![Placement { position: Point::new(1.0, 0.0), cell: 3 }];
/// let a = Fingerprint::compute([placements.as_slice()]);
/// let b = Fingerprint::compute([placements.as_slice()]);
/// assert_eq!(a, b);
/// assert_eq!(a.as_str().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute a fingerprint over one or more placement slices.
    ///
    /// Slices are separated in the digest so moving a placement from one
    /// group to the next changes the result.
    pub fn compute<'a>(groups: impl IntoIterator<Item = &'a [Placement]>) -> Self {
        let mut hasher = Sha256::new();
        for group in groups {
            hasher.update((group.len() as u64).to_le_bytes());
            for placement in group {
                hasher.update(placement.position.x.to_bits().to_le_bytes());
                hasher.update(placement.position.y.to_bits().to_le_bytes());
                hasher.update((placement.cell as u64).to_le_bytes());
            }
            hasher.update(b"\n");
        }
        Self(hex::encode(hasher.finalize()))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
