//! layout::traits
//!
//! The layout backend contract.
//!
//! # Design
//!
//! A backend stores named unit cells, named groups (hierarchical cells),
//! direct cell placements inside a group, and group instances under a rigid
//! transform. Handles are typed and issued at creation time; nothing is
//! looked up by name.
//!
//! The engine drives a backend in one scoped bulk operation: define every
//! cell, build the groups, then call [`LayoutBackend::finish`] exactly once.
//!
//! # Example
//!
//! ```
//! use metalens_mask::core::library::UnitCellLibrary;
//! use metalens_mask::core::shape::LayerSpec;
//! use metalens_mask::core::types::{Point, Transform};
//! use metalens_mask::layout::{LayoutBackend, MemoryLayout};
//!
//! let library = UnitCellLibrary::from_sweep(0.2, 0.8, 4).unwrap();
//! let mut layout = MemoryLayout::new();
//!
//! let cell = layout
//!     .define_cell("cell_0", library.design(0).unwrap(), LayerSpec::default(), Vec::new())
//!     .unwrap();
//! let wedge = layout.create_group("wedge").unwrap();
//! layout.insert_cell(wedge, cell, Point::new(1.0, 0.0)).unwrap();
//!
//! let top = layout.create_group("top").unwrap();
//! layout.insert_group(top, wedge, Transform::rotation(90.0)).unwrap();
//! layout.finish(top).unwrap();
//!
//! assert_eq!(layout.count_placements(top).unwrap(), 1);
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::core::library::UnitCellDesign;
use crate::core::shape::LayerSpec;
use crate::core::types::{CellRef, GroupRef, Point, Transform};

/// Errors from layout backends.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Writing the serialized layout failed.
    #[error("failed to write layout '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Reading a serialized layout failed.
    #[error("failed to read layout '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The layout could not be serialized or parsed.
    #[error("failed to serialize layout: {0}")]
    Serialize(String),

    /// A cell handle was not issued by this backend.
    #[error("unknown cell handle {0:?}")]
    UnknownCell(CellRef),

    /// A group handle was not issued by this backend.
    #[error("unknown group handle {0:?}")]
    UnknownGroup(GroupRef),

    /// A cell or group name is already taken.
    #[error("name '{0}' is already defined")]
    DuplicateName(String),

    /// Inserting the group would make it (transitively) contain itself.
    #[error("group {child:?} cannot be instanced inside {parent:?}: cycle")]
    Cycle { parent: GroupRef, child: GroupRef },

    /// The layout was already finished.
    #[error("layout already finished")]
    Finished,

    /// The GDSII library could not be built, written or read.
    #[error("GDS error: {0}")]
    Gds(String),

    /// Backend-specific failure.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Storage for hierarchical unit-cell layouts.
pub trait LayoutBackend {
    /// Define a unit cell for a catalog design and return its handle.
    fn define_cell(
        &mut self,
        name: &str,
        design: &UnitCellDesign,
        layer: LayerSpec,
        outline: Vec<Point>,
    ) -> Result<CellRef, LayoutError>;

    /// Create an empty named group.
    fn create_group(&mut self, name: &str) -> Result<GroupRef, LayoutError>;

    /// Place a cell inside a group at a position (translation only).
    fn insert_cell(&mut self, group: GroupRef, cell: CellRef, at: Point) -> Result<(), LayoutError>;

    /// Place a batch of cells inside a group.
    ///
    /// Backends with a cheaper bulk path override this.
    fn insert_cells(
        &mut self,
        group: GroupRef,
        cells: &[(CellRef, Point)],
    ) -> Result<(), LayoutError> {
        for (cell, at) in cells {
            self.insert_cell(group, *cell, *at)?;
        }
        Ok(())
    }

    /// Instance `child` inside `parent` under a rigid transform.
    fn insert_group(
        &mut self,
        parent: GroupRef,
        child: GroupRef,
        transform: Transform,
    ) -> Result<(), LayoutError>;

    /// Mark `top` as the root and release the layout (flush, write, etc.).
    fn finish(&mut self, top: GroupRef) -> Result<(), LayoutError>;
}
