//! core
//!
//! Domain types and the pure building blocks of the tiling algorithm.
//!
//! # Modules
//!
//! - [`types`] - Points, placements, transforms, handles, fingerprints
//! - [`params`] - Lens parameters and tiling configuration
//! - [`library`] - Ordered unit-cell catalog
//! - [`phase`] - Phase profile, phase table and quantizer
//! - [`lattice`] - Ring generation and the aperture filter
//! - [`shape`] - Unit-cell outline generators
//! - [`config`] - Configuration schema and loading
//! - [`errors`] - Core error taxonomy
//!
//! # Design Principles
//!
//! - Parameters are validated once and immutable afterwards
//! - Nothing in `core` performs I/O except `config`
//! - Every computation is deterministic

pub mod config;
pub mod errors;
pub mod lattice;
pub mod library;
pub mod params;
pub mod phase;
pub mod shape;
pub mod types;
