//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All user-facing output goes through this module so quiet and debug modes
//! are honored consistently. Diagnostic logging goes through `tracing` and
//! is written to stderr.

pub mod output;
