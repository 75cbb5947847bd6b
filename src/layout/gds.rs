//! layout::gds
//!
//! GDSII stream writer.
//!
//! Collects the layout in a [`MemoryLayout`] and converts it to a GDSII
//! library when the layout is finished:
//!
//! - each unit cell becomes a structure holding one boundary on the cell's
//!   layer and datatype
//! - each group becomes a structure; direct placements are structure
//!   references, group instances are structure references carrying the
//!   rotation angle
//!
//! Lengths are in micrometres. The database unit defaults to 1 nm. The
//! stream goes to a temp file next to the target, which is then renamed
//! into place.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use gds21::{
    GdsBoundary, GdsElement, GdsLibrary, GdsPoint, GdsStrans, GdsStruct, GdsStructRef, GdsUnits,
};

use super::memory::{CellDef, GroupDef, LayoutDocument, MemoryLayout};
use super::traits::{LayoutBackend, LayoutError};
use crate::core::library::UnitCellDesign;
use crate::core::shape::LayerSpec;
use crate::core::types::{CellRef, GroupRef, Point, Transform};

/// Database unit in user units (1 nm per µm).
pub const DEFAULT_DATABASE_UNIT: f64 = 1e-3;

/// Metres per user unit (µm).
const METRES_PER_USER_UNIT: f64 = 1e-6;

/// Layout backend that writes a GDSII stream on `finish`.
#[derive(Debug)]
pub struct GdsLayout {
    path: PathBuf,
    library_name: String,
    database_unit: f64,
    memory: MemoryLayout,
}

impl GdsLayout {
    /// Create a writer targeting `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            library_name: "metalens".to_string(),
            database_unit: DEFAULT_DATABASE_UNIT,
            memory: MemoryLayout::new(),
        }
    }

    /// Set the library name written into the stream header.
    pub fn with_library_name(mut self, name: impl Into<String>) -> Self {
        self.library_name = name.into();
        self
    }

    /// Set the database unit, in user units.
    pub fn with_database_unit(mut self, unit: f64) -> Self {
        self.database_unit = unit;
        self
    }

    /// Target path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The collected document.
    pub fn document(&self) -> &LayoutDocument {
        self.memory.document()
    }

    /// Read a GDSII stream.
    pub fn read(path: &Path) -> Result<GdsLibrary, LayoutError> {
        GdsLibrary::load(path)
            .map_err(|e| LayoutError::Gds(format!("failed to read '{}': {:?}", path.display(), e)))
    }

    /// Convert the collected document into a GDSII library.
    pub fn to_library(&self) -> Result<GdsLibrary, LayoutError> {
        if !(self.database_unit.is_finite() && self.database_unit > 0.0) {
            return Err(LayoutError::Gds(format!(
                "database unit must be positive, got {}",
                self.database_unit
            )));
        }
        let document = self.memory.document();

        let mut library = GdsLibrary::new(self.library_name.as_str());
        library.units = GdsUnits::new(
            self.database_unit,
            self.database_unit * METRES_PER_USER_UNIT,
        );
        for cell in &document.cells {
            library.structs.push(self.cell_struct(cell)?);
        }
        for group in &document.groups {
            library.structs.push(self.group_struct(document, group)?);
        }
        Ok(library)
    }

    fn cell_struct(&self, cell: &CellDef) -> Result<GdsStruct, LayoutError> {
        let mut gds = GdsStruct::new(cell.name.as_str());
        if cell.outline.len() < 3 {
            return Ok(gds);
        }

        let mut xy = cell
            .outline
            .iter()
            .map(|p| self.point(*p))
            .collect::<Result<Vec<_>, _>>()?;
        // Boundaries are closed explicitly.
        if xy.first() != xy.last() {
            xy.push(xy[0].clone());
        }

        gds.elems.push(GdsElement::GdsBoundary(GdsBoundary {
            layer: layer_number("layer", cell.layer.layer)?,
            datatype: layer_number("datatype", cell.layer.datatype)?,
            xy,
            ..Default::default()
        }));
        Ok(gds)
    }

    fn group_struct(
        &self,
        document: &LayoutDocument,
        group: &GroupDef,
    ) -> Result<GdsStruct, LayoutError> {
        let mut gds = GdsStruct::new(group.name.as_str());
        gds.elems.reserve(group.cells.len() + group.instances.len());

        for placement in &group.cells {
            let cell = document.cell(placement.cell)?;
            gds.elems.push(GdsElement::GdsStructRef(GdsStructRef {
                name: cell.name.clone(),
                xy: self.point(placement.at)?,
                ..Default::default()
            }));
        }

        for instance in &group.instances {
            let child = document.group(instance.group)?;
            let rotation = instance.transform.rotation_deg;
            gds.elems.push(GdsElement::GdsStructRef(GdsStructRef {
                name: child.name.clone(),
                xy: self.point(instance.transform.translation)?,
                strans: (rotation != 0.0).then(|| GdsStrans {
                    angle: Some(rotation),
                    ..Default::default()
                }),
                ..Default::default()
            }));
        }
        Ok(gds)
    }

    fn point(&self, p: Point) -> Result<GdsPoint, LayoutError> {
        Ok(GdsPoint::new(self.to_db(p.x)?, self.to_db(p.y)?))
    }

    fn to_db(&self, value: f64) -> Result<i32, LayoutError> {
        let scaled = (value / self.database_unit).round();
        if scaled.is_finite() && scaled >= f64::from(i32::MIN) && scaled <= f64::from(i32::MAX) {
            Ok(scaled as i32)
        } else {
            Err(LayoutError::Gds(format!(
                "coordinate {} does not fit the database grid",
                value
            )))
        }
    }

    fn write(&self) -> Result<(), LayoutError> {
        let library = self.to_library()?;

        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| LayoutError::Write { path, source }
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err(&self.path))?;
        }

        let temp_path = self.path.with_extension("gds.tmp");
        library.save(&temp_path).map_err(|e| {
            LayoutError::Gds(format!("failed to write '{}': {:?}", temp_path.display(), e))
        })?;
        fs::rename(&temp_path, &self.path).map_err(io_err(&self.path))?;
        Ok(())
    }
}

fn layer_number(what: &str, value: u16) -> Result<i16, LayoutError> {
    i16::try_from(value)
        .map_err(|_| LayoutError::Gds(format!("{} {} exceeds the GDSII range", what, value)))
}

/// Structure references inside a structure.
pub fn references(gds: &GdsStruct) -> impl Iterator<Item = &GdsStructRef> + '_ {
    gds.elems.iter().filter_map(|e| match e {
        GdsElement::GdsStructRef(r) => Some(r),
        _ => None,
    })
}

/// Structures no other structure references, in stream order.
pub fn top_structs(library: &GdsLibrary) -> Vec<&str> {
    let referenced: HashSet<&str> = library
        .structs
        .iter()
        .flat_map(references)
        .map(|r| r.name.as_str())
        .collect();
    library
        .structs
        .iter()
        .map(|s| s.name.as_str())
        .filter(|name| !referenced.contains(name))
        .collect()
}

/// Number of leaf cell placements under `name` after expanding references.
///
/// A leaf is a structure without references of its own.
pub fn count_placements<'a>(library: &'a GdsLibrary, name: &'a str) -> Result<usize, LayoutError> {
    let by_name: HashMap<&str, &GdsStruct> = library
        .structs
        .iter()
        .map(|s| (s.name.as_str(), s))
        .collect();
    let mut memo = HashMap::new();
    count_under(&by_name, name, &mut Vec::new(), &mut memo)
}

fn count_under<'a>(
    by_name: &HashMap<&'a str, &'a GdsStruct>,
    name: &'a str,
    stack: &mut Vec<&'a str>,
    memo: &mut HashMap<&'a str, usize>,
) -> Result<usize, LayoutError> {
    if let Some(&count) = memo.get(name) {
        return Ok(count);
    }
    if stack.contains(&name) {
        return Err(LayoutError::Gds(format!("structure '{}' references itself", name)));
    }
    let gds: &'a GdsStruct = by_name
        .get(name)
        .copied()
        .ok_or_else(|| LayoutError::Gds(format!("missing structure '{}'", name)))?;

    stack.push(name);
    let mut total = 0;
    let mut leaf = true;
    for r in references(gds) {
        leaf = false;
        total += count_under(by_name, r.name.as_str(), stack, memo)?;
    }
    stack.pop();

    let count = if leaf { 1 } else { total };
    memo.insert(name, count);
    Ok(count)
}

impl LayoutBackend for GdsLayout {
    fn define_cell(
        &mut self,
        name: &str,
        design: &UnitCellDesign,
        layer: LayerSpec,
        outline: Vec<Point>,
    ) -> Result<CellRef, LayoutError> {
        self.memory.define_cell(name, design, layer, outline)
    }

    fn create_group(&mut self, name: &str) -> Result<GroupRef, LayoutError> {
        self.memory.create_group(name)
    }

    fn insert_cell(&mut self, group: GroupRef, cell: CellRef, at: Point) -> Result<(), LayoutError> {
        self.memory.insert_cell(group, cell, at)
    }

    fn insert_group(
        &mut self,
        parent: GroupRef,
        child: GroupRef,
        transform: Transform,
    ) -> Result<(), LayoutError> {
        self.memory.insert_group(parent, child, transform)
    }

    fn finish(&mut self, top: GroupRef) -> Result<(), LayoutError> {
        self.memory.finish(top)?;
        self.write()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::library::UnitCellLibrary;
    use tempfile::TempDir;

    fn square() -> Vec<Point> {
        vec![
            Point::new(-0.1, -0.1),
            Point::new(0.1, -0.1),
            Point::new(0.1, 0.1),
            Point::new(-0.1, 0.1),
        ]
    }

    fn small_layout(path: &Path) -> GdsLayout {
        let library = UnitCellLibrary::from_sweep(0.2, 0.8, 4).unwrap();
        let mut layout = GdsLayout::new(path);
        let cell = layout
            .define_cell("cell_0", library.design(0).unwrap(), LayerSpec::default(), square())
            .unwrap();
        let wedge = layout.create_group("sector").unwrap();
        layout.insert_cell(wedge, cell, Point::new(3.0, 0.5)).unwrap();
        layout.insert_cell(wedge, cell, Point::new(4.0, 0.25)).unwrap();
        let top = layout.create_group("aperture").unwrap();
        for k in 0..4u32 {
            layout
                .insert_group(top, wedge, Transform::rotation(90.0 * f64::from(k)))
                .unwrap();
        }
        layout.insert_cell(top, cell, Point::new(0.0, 0.0)).unwrap();
        layout.finish(top).unwrap();
        layout
    }

    #[test]
    fn writes_readable_stream() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out/mask.gds");
        small_layout(&path);

        assert!(path.exists());
        assert!(!path.with_extension("gds.tmp").exists());

        let library = GdsLayout::read(&path).unwrap();
        let names: Vec<&str> = library.structs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["cell_0", "sector", "aperture"]);
        assert_eq!(top_structs(&library), vec!["aperture"]);
        assert_eq!(count_placements(&library, "aperture").unwrap(), 4 * 2 + 1);
    }

    #[test]
    fn cell_outline_is_closed_boundary_on_its_layer() {
        let temp = TempDir::new().unwrap();
        let layout = small_layout(&temp.path().join("mask.gds"));
        let library = layout.to_library().unwrap();

        let cell = &library.structs[0];
        let GdsElement::GdsBoundary(boundary) = &cell.elems[0] else {
            panic!("expected a boundary");
        };
        assert_eq!((boundary.layer, boundary.datatype), (1, 0));
        assert_eq!(boundary.xy.len(), 5);
        assert_eq!(boundary.xy.first(), boundary.xy.last());
        assert_eq!(boundary.xy[1], GdsPoint::new(100, -100));
    }

    #[test]
    fn instances_carry_rotation() {
        let temp = TempDir::new().unwrap();
        let layout = small_layout(&temp.path().join("mask.gds"));
        let library = layout.to_library().unwrap();

        let top = &library.structs[2];
        let angles: Vec<Option<f64>> = references(top)
            .filter(|r| r.name == "sector")
            .map(|r| r.strans.as_ref().and_then(|s| s.angle))
            .collect();
        assert_eq!(angles, vec![None, Some(90.0), Some(180.0), Some(270.0)]);

        let sector = &library.structs[1];
        let at: Vec<&GdsPoint> = references(sector).map(|r| &r.xy).collect();
        assert_eq!(at, vec![&GdsPoint::new(3000, 500), &GdsPoint::new(4000, 250)]);
    }

    #[test]
    fn database_unit_scales_coordinates() {
        let temp = TempDir::new().unwrap();
        let library = UnitCellLibrary::from_sweep(0.2, 0.8, 4).unwrap();
        let mut layout = GdsLayout::new(temp.path().join("mask.gds")).with_database_unit(1e-2);
        let cell = layout
            .define_cell("cell_0", library.design(0).unwrap(), LayerSpec::default(), square())
            .unwrap();
        let top = layout.create_group("aperture").unwrap();
        layout.insert_cell(top, cell, Point::new(3.0, 0.5)).unwrap();

        let gds = layout.to_library().unwrap();
        let at: Vec<&GdsPoint> = references(&gds.structs[1]).map(|r| &r.xy).collect();
        assert_eq!(at, vec![&GdsPoint::new(300, 50)]);

        let broken = GdsLayout::new(temp.path().join("x.gds")).with_database_unit(0.0);
        assert!(matches!(broken.to_library(), Err(LayoutError::Gds(_))));
    }

    #[test]
    fn coordinate_overflow_rejected() {
        let temp = TempDir::new().unwrap();
        let library = UnitCellLibrary::from_sweep(0.2, 0.8, 4).unwrap();
        let mut layout = GdsLayout::new(temp.path().join("mask.gds"));
        let cell = layout
            .define_cell("cell_0", library.design(0).unwrap(), LayerSpec::default(), square())
            .unwrap();
        let top = layout.create_group("aperture").unwrap();
        layout.insert_cell(top, cell, Point::new(5.0e6, 0.0)).unwrap();

        assert!(matches!(layout.finish(top), Err(LayoutError::Gds(_))));
        assert!(!temp.path().join("mask.gds").exists());
    }

    #[test]
    fn nothing_written_before_finish() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mask.gds");
        let mut layout = GdsLayout::new(&path);
        layout.create_group("aperture").unwrap();
        assert!(!path.exists());
    }
}
