//! metalens-mask - phase-quantized unit-cell tiling for flat metalenses
//!
//! Computes the ideal hyperbolic phase profile of a focusing metalens,
//! quantizes it onto a discrete catalog of unit-cell designs, and lays the
//! chosen cells out on a polar lattice. The outer region is built as one
//! angular sector and replicated by rotation; the centre is tiled directly.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Orchestrates Plan → Assemble → Replicate → Verify → Emit
//! - [`core`] - Lens parameters, phase quantization, lattice geometry, config
//! - [`layout`] - Layout backends that receive the cell hierarchy
//! - [`ui`] - User-facing output
//!
//! # Correctness Invariants
//!
//! 1. Every placement references a design in the catalog
//! 2. No placement lies outside the aperture
//! 3. Sector copies are pure rotations evenly spaced around the lens
//! 4. Output is identical for identical input, regardless of thread count

pub mod cli;
pub mod core;
pub mod engine;
pub mod layout;
pub mod ui;
