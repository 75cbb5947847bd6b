//! core::shape
//!
//! Parametric outlines for unit-cell designs.
//!
//! The tiling core only knows a design's size parameter. A [`UnitCellShape`]
//! turns that parameter into a closed polygon for backends that store
//! geometry.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use super::errors::LensError;
use super::library::UnitCellDesign;
use super::types::Point;

/// Layer/datatype pair the outline is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub layer: u16,
    pub datatype: u16,
}

impl Default for LayerSpec {
    fn default() -> Self {
        Self {
            layer: 1,
            datatype: 0,
        }
    }
}

/// Generates the outline polygon of a unit-cell design.
pub trait UnitCellShape: Send + Sync {
    /// Short name used in cell names and logs.
    fn name(&self) -> &str;

    /// Layer the outline belongs to.
    fn layer(&self) -> LayerSpec;

    /// Polygon vertices, centred on the origin, counter-clockwise, not closed.
    fn outline(&self, design: &UnitCellDesign) -> Vec<Point>;
}

/// Axis-aligned ellipse inscribed in `[-r, r] × [-r·aspect, r·aspect]`.
///
/// With `aspect == 1` this is the circular pillar of the reference design.
///
/// # Example
///
/// ```
/// use metalens_mask::core::library::UnitCellLibrary;
/// use metalens_mask::core::shape::{Ellipse, UnitCellShape};
///
/// let library = UnitCellLibrary::from_sweep(0.2, 0.8, 16).unwrap();
/// let shape = Ellipse::circle(64).unwrap();
/// let outline = shape.outline(library.design(0).unwrap());
/// assert_eq!(outline.len(), 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipse {
    vertices: usize,
    aspect: f64,
    layer: LayerSpec,
}

impl Ellipse {
    /// Default number of polygon vertices.
    pub const DEFAULT_VERTICES: usize = 64;

    /// Create an ellipse generator.
    ///
    /// # Errors
    ///
    /// Returns `LensError::Configuration` for fewer than three vertices or a
    /// non-positive aspect ratio.
    pub fn new(vertices: usize, aspect: f64, layer: LayerSpec) -> Result<Self, LensError> {
        if vertices < 3 {
            return Err(LensError::config(format!(
                "ellipse needs at least 3 vertices, got {}",
                vertices
            )));
        }
        if !(aspect.is_finite() && aspect > 0.0) {
            return Err(LensError::config(format!(
                "ellipse aspect ratio must be positive, got {}",
                aspect
            )));
        }
        Ok(Self {
            vertices,
            aspect,
            layer,
        })
    }

    /// Circle on the default layer.
    pub fn circle(vertices: usize) -> Result<Self, LensError> {
        Self::new(vertices, 1.0, LayerSpec::default())
    }

    /// Number of vertices per outline.
    pub fn vertices(&self) -> usize {
        self.vertices
    }
}

impl UnitCellShape for Ellipse {
    fn name(&self) -> &str {
        "ellipse"
    }

    fn layer(&self) -> LayerSpec {
        self.layer
    }

    fn outline(&self, design: &UnitCellDesign) -> Vec<Point> {
        let rx = design.size_parameter;
        let ry = design.size_parameter * self.aspect;
        (0..self.vertices)
            .map(|i| {
                let t = TAU * i as f64 / self.vertices as f64;
                Point::new(rx * t.cos(), ry * t.sin())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn design(size: f64) -> UnitCellDesign {
        UnitCellDesign {
            size_parameter: size,
            phase_index: 0,
            assigned_phase: 0.0,
        }
    }

    #[test]
    fn circle_vertices_lie_on_radius() {
        let shape = Ellipse::circle(32).unwrap();
        for p in shape.outline(&design(0.5)) {
            assert!((p.norm() - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn aspect_stretches_y() {
        let shape = Ellipse::new(4, 2.0, LayerSpec::default()).unwrap();
        let outline = shape.outline(&design(1.0));
        assert!((outline[1].y - 2.0).abs() < 1e-12);
        assert!((outline[0].x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_degenerate_polygon() {
        assert!(Ellipse::circle(2).is_err());
        assert!(Ellipse::new(8, 0.0, LayerSpec::default()).is_err());
    }
}
