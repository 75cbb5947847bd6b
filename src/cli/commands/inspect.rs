//! inspect command - Show the ring plan, or summarize a written layout

use std::path::Path;

use serde::Serialize;

use crate::core::config::{ConfigFile, LayoutFormat};
use crate::engine::{Context, Job, RingPlan};
use crate::layout::{gds, GdsLayout, JsonLayout};
use crate::ui::output::{self, Verbosity};
use anyhow::{Context as _, Result};

/// What `inspect` reports for a configured lens.
#[derive(Debug, Serialize)]
struct PlanReport {
    focal_length: f64,
    wavelength: f64,
    period: f64,
    array_size: u32,
    diameter: f64,
    inner_radius: f64,
    sector_count: u32,
    sector_span_deg: f64,
    catalog_sizes: Vec<f64>,
    phase_step: f64,
    full_disk_rings: usize,
    full_disk_sites: usize,
    sector_rings: usize,
    sector_sites: usize,
    outer_radius: f64,
}

impl PlanReport {
    fn new(job: &Job, plan: &RingPlan) -> Self {
        Self {
            focal_length: job.params.focal_length(),
            wavelength: job.params.wavelength(),
            period: job.params.period(),
            array_size: job.params.array_size(),
            diameter: job.params.diameter(),
            inner_radius: job.tiling.inner_radius(),
            sector_count: job.tiling.sector_count(),
            sector_span_deg: job.tiling.sector_span_deg(),
            catalog_sizes: job
                .library
                .designs()
                .iter()
                .map(|d| d.size_parameter)
                .collect(),
            phase_step: job.library.phase_step(),
            full_disk_rings: plan.full_disk.len(),
            full_disk_sites: plan.full_disk_sites(),
            sector_rings: plan.sector.len(),
            sector_sites: plan.sector_sites(),
            outer_radius: plan.outer_radius(),
        }
    }
}

/// Show the plan for the configured lens, or summarize `layout`.
pub fn inspect(ctx: &Context, config: Option<&Path>, json: bool, layout: Option<&Path>) -> Result<()> {
    if let Some(path) = layout {
        return inspect_layout(ctx, path, json);
    }

    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let config = super::load_config(ctx, config, ConfigFile::default())?;
    let job = Job::from_config(&config).context("Invalid lens configuration")?;
    let plan = job.plan().context("Failed to build ring plan")?;
    let report = PlanReport::new(&job, &plan);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let w = 16;
    output::print("Lens", verbosity);
    output::print(output::format_field("  focal length", report.focal_length, w), verbosity);
    output::print(output::format_field("  wavelength", report.wavelength, w), verbosity);
    output::print(output::format_field("  period", report.period, w), verbosity);
    output::print(
        output::format_field("  diameter", output::format_length(report.diameter), w),
        verbosity,
    );
    output::print("Catalog", verbosity);
    output::print(output::format_field("  designs", report.catalog_sizes.len(), w), verbosity);
    output::print(
        output::format_field("  phase step", format!("{:.4} rad", report.phase_step), w),
        verbosity,
    );
    output::print("Plan", verbosity);
    output::print(
        output::format_field(
            "  inner disk",
            format!(
                "{} rings, {} sites",
                report.full_disk_rings, report.full_disk_sites
            ),
            w,
        ),
        verbosity,
    );
    output::print(
        output::format_field(
            "  sector",
            format!(
                "{} rings, {} sites x {} copies ({}°)",
                report.sector_rings, report.sector_sites, report.sector_count, report.sector_span_deg
            ),
            w,
        ),
        verbosity,
    );
    output::print(
        output::format_field("  outer radius", output::format_length(report.outer_radius), w),
        verbosity,
    );
    Ok(())
}

#[derive(Debug, Serialize)]
struct LayoutReport {
    format: String,
    generated_at: Option<String>,
    units: String,
    cells: usize,
    groups: Vec<String>,
    top: Option<String>,
    placements: usize,
}

impl LayoutReport {
    fn from_json(path: &Path) -> Result<Self> {
        let envelope = JsonLayout::read(path)
            .with_context(|| format!("Failed to read layout {}", path.display()))?;
        let document = &envelope.document;

        let (top, placements) = match document.top {
            Some(top) => (
                Some(document.group(top)?.name.clone()),
                document.count_placements(top)?,
            ),
            None => (None, 0),
        };
        Ok(Self {
            format: envelope.format.clone(),
            generated_at: Some(envelope.generated_at.to_rfc3339()),
            units: envelope.units.clone(),
            cells: document.cells.len(),
            groups: document.groups.iter().map(|g| g.name.clone()).collect(),
            top,
            placements,
        })
    }

    fn from_gds(path: &Path) -> Result<Self> {
        let library = GdsLayout::read(path)
            .with_context(|| format!("Failed to read layout {}", path.display()))?;

        let (cells, groups): (Vec<_>, Vec<_>) = library
            .structs
            .iter()
            .partition(|s| gds::references(s).next().is_none());
        let top = gds::top_structs(&library).first().map(|name| name.to_string());
        let placements = match &top {
            Some(name) => gds::count_placements(&library, name)?,
            None => 0,
        };
        Ok(Self {
            format: format!("gdsii ({})", library.name),
            generated_at: None,
            units: format!("{:?}", library.units),
            cells: cells.len(),
            groups: groups.iter().map(|s| s.name.clone()).collect(),
            top,
            placements,
        })
    }
}

fn inspect_layout(ctx: &Context, path: &Path, json: bool) -> Result<()> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let report = match LayoutFormat::from_path(path) {
        Some(LayoutFormat::Gds) => LayoutReport::from_gds(path)?,
        _ => LayoutReport::from_json(path)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let w = 12;
    output::print(output::format_field("format", &report.format, w), verbosity);
    if let Some(generated_at) = &report.generated_at {
        output::print(output::format_field("generated", generated_at, w), verbosity);
    }
    output::print(output::format_field("units", &report.units, w), verbosity);
    output::print(output::format_field("cells", report.cells, w), verbosity);
    output::print(
        output::format_field("groups", report.groups.join(", "), w),
        verbosity,
    );
    output::print(
        output::format_field("top", report.top.as_deref().unwrap_or("(none)"), w),
        verbosity,
    );
    output::print(output::format_field("placements", report.placements, w), verbosity);
    Ok(())
}
