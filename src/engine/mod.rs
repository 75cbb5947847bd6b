//! engine
//!
//! Orchestrates a generation run: Plan -> Assemble -> Replicate -> Verify -> Emit.
//!
//! # Architecture
//!
//! 1. **Plan**: enumerate every ring for both lattice modes
//! 2. **Assemble**: resolve sites to quantized placements, in parallel per ring
//! 3. **Replicate**: produce the rotations that tile the sector around the lens
//! 4. **Verify**: confirm layout invariants hold
//! 5. **Emit**: hand the hierarchy to a layout backend in one bulk operation
//!
//! All configuration is validated when a [`Job`] is built, before any site is
//! generated. Nothing is written to a backend until verification passes.
//!
//! # Example
//!
//! ```
//! use metalens_mask::core::config::{Config, ConfigFile, LensSection, TilingSection};
//! use metalens_mask::engine::{Context, Job};
//! use metalens_mask::layout::MemoryLayout;
//!
//! let overrides = ConfigFile {
//!     lens: Some(LensSection {
//!         focal_length: Some(800.0),
//!         wavelength: Some(1.0),
//!         period: Some(1.0),
//!         array_size: Some(60),
//!     }),
//!     tiling: Some(TilingSection {
//!         inner_radius: Some(20.0),
//!         ..Default::default()
//!     }),
//!     ..Default::default()
//! };
//! let config = Config::load_from(None, None).unwrap().config.with_overrides(overrides).unwrap();
//!
//! let job = Job::from_config(&config).unwrap();
//! let mut backend = MemoryLayout::new();
//! let report = job.run(&Context::default(), &mut backend).unwrap();
//!
//! assert!(backend.is_finished());
//! assert_eq!(report.summary.sector_copies, 36);
//! ```

pub mod assemble;
pub mod emit;
pub mod generate;
pub mod plan;
pub mod replicate;
pub mod verify;

pub use assemble::{InnerDiskFiller, SectorAssembler, SiteResolver};
pub use emit::{emit, EmitSummary};
pub use generate::{ApertureLayout, Generator};
pub use plan::RingPlan;
pub use replicate::SymmetryReplicator;
pub use verify::{verify, VerifyError};

use tracing::{debug, info, warn};

use crate::core::config::{Config, ConfigError};
use crate::core::errors::LensError;
use crate::core::library::UnitCellLibrary;
use crate::core::params::{GenerationConfig, LensParameters};
use crate::core::shape::Ellipse;
use crate::core::types::Fingerprint;
use crate::layout::{LayoutBackend, LayoutError};

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags that affect engine behavior.
#[derive(Debug, Clone)]
pub struct Context {
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// Worker thread count; `None` uses the global rayon pool.
    pub threads: Option<usize>,
    /// Run post-generation verification.
    pub verify: bool,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            debug: false,
            quiet: false,
            threads: None,
            verify: true,
        }
    }
}

/// Errors from engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid lens or tiling input, or a failure in the tiling core.
    #[error(transparent)]
    Lens(#[from] LensError),

    /// Configuration could not be loaded or validated.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Verification failed.
    #[error("verification failed: {0}")]
    Verify(#[from] VerifyError),

    /// The layout backend failed.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// The worker pool could not be built.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

/// Everything needed for one run, fully validated.
#[derive(Debug, Clone)]
pub struct Job {
    pub params: LensParameters,
    pub tiling: GenerationConfig,
    pub library: UnitCellLibrary,
    pub shape: Ellipse,
    pub phase_table_resolution: Option<usize>,
    pub top_name: String,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub layout: ApertureLayout,
    pub summary: EmitSummary,
    pub fingerprint: Fingerprint,
    pub verified: bool,
}

impl Job {
    /// Build and validate a job from merged configuration.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Lens` for any invalid parameter, including a
    /// phase table resolution that does not match the catalog.
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        let params = config.lens_parameters()?;
        let tiling = config.generation_config(&params)?;
        let library = config.library()?;
        let shape = config.shape()?;
        let job = Self {
            params,
            tiling,
            library,
            shape,
            phase_table_resolution: config.phase_table_resolution(),
            top_name: config.top_name().to_string(),
        };
        // Surface table mismatches now rather than mid-run.
        job.generator()?;
        Ok(job)
    }

    /// A generator borrowing this job.
    pub fn generator(&self) -> Result<Generator<'_>, LensError> {
        Generator::new(
            &self.params,
            &self.tiling,
            &self.library,
            self.phase_table_resolution,
        )
    }

    /// The ring plan, without quantizing anything.
    pub fn plan(&self) -> Result<RingPlan, LensError> {
        self.generator()?.plan()
    }

    /// Generate and optionally verify the layout, without emitting it.
    pub fn generate(&self, ctx: &Context) -> Result<ApertureLayout, EngineError> {
        let generator = self.generator()?;
        let layout = match ctx.threads {
            Some(threads) => {
                debug!(threads, "using dedicated worker pool");
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| EngineError::ThreadPool(e.to_string()))?
                    .install(|| generator.generate())?
            }
            None => generator.generate()?,
        };

        if ctx.verify {
            verify(&layout, &self.params, &self.tiling, self.library.len())?;
        } else {
            warn!("verification skipped");
        }
        Ok(layout)
    }

    /// Full run: generate, verify, and emit into `backend`.
    ///
    /// # Errors
    ///
    /// Any error aborts the run. The backend is only written after
    /// generation and verification succeed.
    pub fn run<B: LayoutBackend + ?Sized>(
        &self,
        ctx: &Context,
        backend: &mut B,
    ) -> Result<RunReport, EngineError> {
        let layout = self.generate(ctx)?;
        let summary = emit(&layout, &self.library, &self.shape, backend, &self.top_name)?;
        let fingerprint = layout.fingerprint();
        info!(
            fingerprint = fingerprint.short(12),
            total = summary.total_placements,
            "run complete"
        );
        Ok(RunReport {
            layout,
            summary,
            fingerprint,
            verified: ctx.verify,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ConfigFile, LensSection, TilingSection};
    use crate::layout::{FailOn, MemoryLayout};

    fn small_config(resolution: Option<usize>) -> Config {
        let overrides = ConfigFile {
            lens: Some(LensSection {
                focal_length: Some(800.0),
                wavelength: Some(1.0),
                period: Some(1.0),
                array_size: Some(60),
            }),
            tiling: Some(TilingSection {
                inner_radius: Some(20.0),
                phase_table_resolution: resolution,
                ..Default::default()
            }),
            ..Default::default()
        };
        Config::load_from(None, None)
            .unwrap()
            .config
            .with_overrides(overrides)
            .unwrap()
    }

    #[test]
    fn thread_count_does_not_change_output() {
        let job = Job::from_config(&small_config(None)).unwrap();
        let single = job
            .generate(&Context {
                threads: Some(1),
                ..Default::default()
            })
            .unwrap();
        let many = job
            .generate(&Context {
                threads: Some(4),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(single, many);
        assert_eq!(single.fingerprint(), many.fingerprint());
    }

    #[test]
    fn table_mismatch_rejected_at_build() {
        let err = Job::from_config(&small_config(Some(5))).unwrap_err();
        assert!(matches!(err, EngineError::Lens(LensError::Configuration(_))));
    }

    #[test]
    fn backend_error_surfaces() {
        let job = Job::from_config(&small_config(None)).unwrap();
        let mut backend = MemoryLayout::new().fail_on(FailOn::Finish("read-only".into()));
        let err = job.run(&Context::default(), &mut backend).unwrap_err();
        assert!(matches!(err, EngineError::Layout(LayoutError::Backend(_))));
    }

    #[test]
    fn report_counts_match() {
        let job = Job::from_config(&small_config(Some(17))).unwrap();
        let mut backend = MemoryLayout::new();
        let report = job.run(&Context::default(), &mut backend).unwrap();
        assert!(report.verified);
        assert_eq!(
            report.summary.total_placements,
            report.layout.sector.len() * 36 + report.layout.inner_disk.len()
        );
        let top = backend.document().top.unwrap();
        assert_eq!(
            backend.count_placements(top).unwrap(),
            report.summary.total_placements
        );
    }
}
