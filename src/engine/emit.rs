//! engine::emit
//!
//! Hands a finished [`ApertureLayout`] to a layout backend.
//!
//! The hierarchy is:
//!
//! ```text
//! <top>
//! ├── sector × sector_count   (rotated instances)
//! └── inner_disk placements   (direct)
//! ```
//!
//! One cell is defined per catalog design, named `cell_<index>`.

use serde::Serialize;
use tracing::debug;

use super::generate::ApertureLayout;
use crate::core::library::UnitCellLibrary;
use crate::core::shape::UnitCellShape;
use crate::core::types::{CellRef, GroupRef, PlacementGroup};
use crate::layout::{LayoutBackend, LayoutError};

/// What was written to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmitSummary {
    pub cells: usize,
    pub sector_placements: usize,
    pub sector_copies: usize,
    pub inner_disk_placements: usize,
    pub total_placements: usize,
}

/// Name of the backend cell for a design.
pub fn cell_name(phase_index: usize) -> String {
    format!("cell_{phase_index}")
}

/// Write `layout` into `backend` and finish it under `top_name`.
///
/// # Errors
///
/// Returns the first `LayoutError` the backend reports. The backend is left
/// unfinished in that case.
pub fn emit<B: LayoutBackend + ?Sized>(
    layout: &ApertureLayout,
    library: &UnitCellLibrary,
    shape: &dyn UnitCellShape,
    backend: &mut B,
    top_name: &str,
) -> Result<EmitSummary, LayoutError> {
    let cells: Vec<CellRef> = library
        .designs()
        .iter()
        .map(|design| {
            backend.define_cell(
                &cell_name(design.phase_index),
                design,
                shape.layer(),
                shape.outline(design),
            )
        })
        .collect::<Result<_, _>>()?;

    let lookup = |index: usize| {
        cells
            .get(index)
            .copied()
            .ok_or(LayoutError::UnknownCell(CellRef(index)))
    };

    let sector = backend.create_group(&layout.sector.name)?;
    insert_group_cells(backend, sector, &layout.sector, &lookup)?;

    let top = backend.create_group(top_name)?;
    for transform in &layout.instances {
        backend.insert_group(top, sector, *transform)?;
    }
    insert_group_cells(backend, top, &layout.inner_disk, &lookup)?;

    backend.finish(top)?;

    let summary = EmitSummary {
        cells: cells.len(),
        sector_placements: layout.sector.len(),
        sector_copies: layout.instances.len(),
        inner_disk_placements: layout.inner_disk.len(),
        total_placements: layout.total_placements(),
    };
    debug!(?summary, top = top_name, "layout emitted");
    Ok(summary)
}

fn insert_group_cells<B, F>(
    backend: &mut B,
    group: GroupRef,
    placements: &PlacementGroup,
    lookup: &F,
) -> Result<(), LayoutError>
where
    B: LayoutBackend + ?Sized,
    F: Fn(usize) -> Result<CellRef, LayoutError>,
{
    let batch = placements
        .iter()
        .map(|p| lookup(p.cell).map(|cell| (cell, p.position)))
        .collect::<Result<Vec<_>, _>>()?;
    backend.insert_cells(group, &batch)
}
