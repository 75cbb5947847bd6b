//! layout::memory
//!
//! In-memory layout backend.
//!
//! # Design
//!
//! Stores cells and groups in a serializable [`LayoutDocument`]. Used for
//! dry runs, for tests, and as the storage behind the JSON writer. It can be
//! configured to fail a specific operation so callers' error paths can be
//! exercised.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::traits::{LayoutBackend, LayoutError};
use crate::core::library::UnitCellDesign;
use crate::core::shape::LayerSpec;
use crate::core::types::{CellRef, GroupRef, Point, Transform};

/// A unit-cell definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellDef {
    pub name: String,
    pub size: f64,
    pub phase_index: usize,
    pub layer: LayerSpec,
    pub outline: Vec<Point>,
}

/// A direct cell placement inside a group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellPlacement {
    pub cell: CellRef,
    pub at: Point,
}

/// An instance of another group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupInstance {
    pub group: GroupRef,
    pub transform: Transform,
}

/// A named hierarchical cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupDef {
    pub name: String,
    pub cells: Vec<CellPlacement>,
    pub instances: Vec<GroupInstance>,
}

/// Everything a backend has been told.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutDocument {
    pub cells: Vec<CellDef>,
    pub groups: Vec<GroupDef>,
    pub top: Option<GroupRef>,
}

impl LayoutDocument {
    /// Look up a group.
    pub fn group(&self, group: GroupRef) -> Result<&GroupDef, LayoutError> {
        self.groups
            .get(group.0)
            .ok_or(LayoutError::UnknownGroup(group))
    }

    /// Look up a cell.
    pub fn cell(&self, cell: CellRef) -> Result<&CellDef, LayoutError> {
        self.cells.get(cell.0).ok_or(LayoutError::UnknownCell(cell))
    }

    /// Find a group by name.
    pub fn group_by_name(&self, name: &str) -> Option<GroupRef> {
        self.groups
            .iter()
            .position(|g| g.name == name)
            .map(GroupRef)
    }

    /// Number of cell placements under `group` after expanding instances.
    pub fn count_placements(&self, group: GroupRef) -> Result<usize, LayoutError> {
        let def = self.group(group)?;
        let mut total = def.cells.len();
        for instance in &def.instances {
            total += self.count_placements(instance.group)?;
        }
        Ok(total)
    }

    /// Expand `group` into absolute `(cell, position)` pairs.
    ///
    /// Children are expanded in insertion order after the group's own cells.
    pub fn flatten(&self, group: GroupRef) -> Result<Vec<(CellRef, Point)>, LayoutError> {
        let mut out = Vec::new();
        self.flatten_into(group, &[], &mut out)?;
        Ok(out)
    }

    fn flatten_into(
        &self,
        group: GroupRef,
        stack: &[Transform],
        out: &mut Vec<(CellRef, Point)>,
    ) -> Result<(), LayoutError> {
        let def = self.group(group)?;
        let apply = |p: Point| stack.iter().rev().fold(p, |acc, t| t.apply(acc));
        out.extend(def.cells.iter().map(|c| (c.cell, apply(c.at))));
        for instance in &def.instances {
            let mut nested = stack.to_vec();
            nested.push(instance.transform);
            self.flatten_into(instance.group, &nested, out)?;
        }
        Ok(())
    }

    /// Whether `needle` is reachable from `group` through instances.
    fn reaches(&self, group: GroupRef, needle: GroupRef) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![group];
        while let Some(current) = stack.pop() {
            if current == needle {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(def) = self.groups.get(current.0) {
                stack.extend(def.instances.iter().map(|i| i.group));
            }
        }
        false
    }
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail define_cell with the given message.
    DefineCell(String),
    /// Fail insert_cell with the given message.
    InsertCell(String),
    /// Fail finish with the given message.
    Finish(String),
}

/// In-memory backend.
#[derive(Debug, Default)]
pub struct MemoryLayout {
    document: LayoutDocument,
    fail_on: Option<FailOn>,
    finished: bool,
}

impl MemoryLayout {
    /// Create an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the layout to fail on a specific operation.
    pub fn fail_on(mut self, fail_on: FailOn) -> Self {
        self.fail_on = Some(fail_on);
        self
    }

    /// The stored document.
    pub fn document(&self) -> &LayoutDocument {
        &self.document
    }

    /// Take the stored document.
    pub fn into_document(self) -> LayoutDocument {
        self.document
    }

    /// Whether `finish` has completed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of cell placements under `group` after expanding instances.
    pub fn count_placements(&self, group: GroupRef) -> Result<usize, LayoutError> {
        self.document.count_placements(group)
    }

    fn check_open(&self) -> Result<(), LayoutError> {
        if self.finished {
            Err(LayoutError::Finished)
        } else {
            Ok(())
        }
    }

    fn name_taken(&self, name: &str) -> bool {
        self.document.cells.iter().any(|c| c.name == name)
            || self.document.groups.iter().any(|g| g.name == name)
    }
}

impl LayoutBackend for MemoryLayout {
    fn define_cell(
        &mut self,
        name: &str,
        design: &UnitCellDesign,
        layer: LayerSpec,
        outline: Vec<Point>,
    ) -> Result<CellRef, LayoutError> {
        self.check_open()?;
        if let Some(FailOn::DefineCell(message)) = &self.fail_on {
            return Err(LayoutError::Backend(message.clone()));
        }
        if self.name_taken(name) {
            return Err(LayoutError::DuplicateName(name.to_string()));
        }
        self.document.cells.push(CellDef {
            name: name.to_string(),
            size: design.size_parameter,
            phase_index: design.phase_index,
            layer,
            outline,
        });
        Ok(CellRef(self.document.cells.len() - 1))
    }

    fn create_group(&mut self, name: &str) -> Result<GroupRef, LayoutError> {
        self.check_open()?;
        if self.name_taken(name) {
            return Err(LayoutError::DuplicateName(name.to_string()));
        }
        self.document.groups.push(GroupDef {
            name: name.to_string(),
            ..Default::default()
        });
        Ok(GroupRef(self.document.groups.len() - 1))
    }

    fn insert_cell(&mut self, group: GroupRef, cell: CellRef, at: Point) -> Result<(), LayoutError> {
        self.check_open()?;
        if let Some(FailOn::InsertCell(message)) = &self.fail_on {
            return Err(LayoutError::Backend(message.clone()));
        }
        self.document.cell(cell)?;
        let def = self
            .document
            .groups
            .get_mut(group.0)
            .ok_or(LayoutError::UnknownGroup(group))?;
        def.cells.push(CellPlacement { cell, at });
        Ok(())
    }

    fn insert_group(
        &mut self,
        parent: GroupRef,
        child: GroupRef,
        transform: Transform,
    ) -> Result<(), LayoutError> {
        self.check_open()?;
        self.document.group(child)?;
        self.document.group(parent)?;
        if self.document.reaches(child, parent) {
            return Err(LayoutError::Cycle { parent, child });
        }
        self.document.groups[parent.0]
            .instances
            .push(GroupInstance {
                group: child,
                transform,
            });
        Ok(())
    }

    fn finish(&mut self, top: GroupRef) -> Result<(), LayoutError> {
        self.check_open()?;
        if let Some(FailOn::Finish(message)) = &self.fail_on {
            return Err(LayoutError::Backend(message.clone()));
        }
        self.document.group(top)?;
        self.document.top = Some(top);
        self.finished = true;
        Ok(())
    }
}
