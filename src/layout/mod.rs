//! layout
//!
//! Layout backends: where placements end up.
//!
//! # Architecture
//!
//! The tiling core never talks to a file format. The engine hands its result
//! to a [`LayoutBackend`] in one bulk operation. Backends only need named
//! hierarchical cells with rigid transforms.
//!
//! # Modules
//!
//! - `traits`: the [`LayoutBackend`] contract and [`LayoutError`]
//! - [`memory`]: in-memory backend for dry runs and tests
//! - [`json`]: JSON document writer
//! - [`gds`]: GDSII stream writer

pub mod gds;
pub mod json;
pub mod memory;
mod traits;

pub use gds::GdsLayout;
pub use json::JsonLayout;
pub use memory::{FailOn, LayoutDocument, MemoryLayout};
pub use traits::*;
