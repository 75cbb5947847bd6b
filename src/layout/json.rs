//! layout::json
//!
//! JSON layout writer.
//!
//! Collects the layout in a [`MemoryLayout`] and writes one JSON document
//! when the layout is finished. The write is atomic: the document goes to a
//! temp file next to the target, which is then renamed into place.
//!
//! # Format
//!
//! ```text
//! {
//!   "format": "metalens-layout/1",
//!   "generated_at": "2026-01-01T00:00:00Z",
//!   "units": "um",
//!   "cells":  [{ "name", "size", "phase_index", "layer", "outline" }],
//!   "groups": [{ "name", "cells": [{ "cell", "at" }],
//!                "instances": [{ "group", "transform" }] }],
//!   "top": 2
//! }
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::memory::{LayoutDocument, MemoryLayout};
use super::traits::{LayoutBackend, LayoutError};
use crate::core::library::UnitCellDesign;
use crate::core::shape::LayerSpec;
use crate::core::types::{CellRef, GroupRef, Point, Transform};

/// Format tag written into every document.
pub const FORMAT_TAG: &str = "metalens-layout/1";

/// On-disk envelope around a [`LayoutDocument`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonEnvelope {
    pub format: String,
    pub generated_at: DateTime<Utc>,
    pub units: String,
    #[serde(flatten)]
    pub document: LayoutDocument,
}

/// Layout backend that writes a JSON document on `finish`.
#[derive(Debug)]
pub struct JsonLayout {
    path: PathBuf,
    units: String,
    pretty: bool,
    memory: MemoryLayout,
}

impl JsonLayout {
    /// Create a writer targeting `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            units: "um".to_string(),
            pretty: false,
            memory: MemoryLayout::new(),
        }
    }

    /// Set the length unit label recorded in the document.
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    /// Pretty-print the document.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
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

    /// Read a document written by this backend.
    pub fn read(path: &Path) -> Result<JsonEnvelope, LayoutError> {
        let contents = fs::read_to_string(path).map_err(|e| LayoutError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&contents).map_err(|e| LayoutError::Serialize(e.to_string()))
    }

    fn write(&self) -> Result<(), LayoutError> {
        let envelope = JsonEnvelope {
            format: FORMAT_TAG.to_string(),
            generated_at: Utc::now(),
            units: self.units.clone(),
            document: self.memory.document().clone(),
        };

        let contents = if self.pretty {
            serde_json::to_string_pretty(&envelope)
        } else {
            serde_json::to_string(&envelope)
        }
        .map_err(|e| LayoutError::Serialize(e.to_string()))?;

        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| LayoutError::Write { path, source }
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err(&self.path))?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path).map_err(io_err(&temp_path))?;
        file.write_all(contents.as_bytes())
            .map_err(io_err(&temp_path))?;
        file.sync_all().map_err(io_err(&temp_path))?;
        fs::rename(&temp_path, &self.path).map_err(io_err(&self.path))?;
        Ok(())
    }
}

impl LayoutBackend for JsonLayout {
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
