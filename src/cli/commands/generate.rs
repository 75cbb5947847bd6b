//! generate command - Tile the aperture and write the layout file

use std::path::Path;

use crate::cli::args::GenerateArgs;
use crate::engine::{Context, Job, RunReport};
use crate::core::config::LayoutFormat;
use crate::layout::{GdsLayout, JsonLayout, MemoryLayout};
use crate::ui::output::{self, Verbosity};
use anyhow::{Context as _, Result};

/// Generate the aperture layout.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `config` - Explicit project config file
/// * `args` - Command flags, applied over the config files
pub fn generate(ctx: &Context, config: Option<&Path>, args: &GenerateArgs) -> Result<()> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let config = super::load_config(ctx, config, args.overrides())?;
    let job = Job::from_config(&config).context("Invalid lens configuration")?;

    let ctx = Context {
        threads: args.threads.map(usize::from),
        verify: !args.skip_verify,
        ..ctx.clone()
    };

    output::debug(
        format!(
            "lens: f={} lambda={} p={} n={} (diameter {})",
            job.params.focal_length(),
            job.params.wavelength(),
            job.params.period(),
            job.params.array_size(),
            output::format_length(job.params.diameter()),
        ),
        verbosity,
    );

    let report = if args.dry_run {
        let mut backend = MemoryLayout::new();
        job.run(&ctx, &mut backend).context("Generation failed")?
    } else {
        let path = config.output_path();
        let format = config.output_format();
        let report = match format {
            LayoutFormat::Json => {
                let mut backend = JsonLayout::new(&path).pretty(args.pretty);
                job.run(&ctx, &mut backend)
            }
            LayoutFormat::Gds => {
                if args.pretty {
                    output::warn("--pretty only applies to JSON output", verbosity);
                }
                let mut backend = GdsLayout::new(&path).with_library_name(config.top_name());
                job.run(&ctx, &mut backend)
            }
        }
        .context("Generation failed")?;
        output::success(format!("Wrote {} ({})", path.display(), format), verbosity);
        report
    };

    print_report(&report, args.dry_run, verbosity);
    Ok(())
}

fn print_report(report: &RunReport, dry_run: bool, verbosity: Verbosity) {
    let summary = &report.summary;
    if dry_run {
        output::print("Dry run: nothing written.", verbosity);
    }
    output::print(
        output::format_field(
            "sector",
            format!(
                "{} placements x {} copies",
                summary.sector_placements, summary.sector_copies
            ),
            10,
        ),
        verbosity,
    );
    output::print(
        output::format_field("inner disk", summary.inner_disk_placements, 10),
        verbosity,
    );
    output::print(
        output::format_field("total", summary.total_placements, 10),
        verbosity,
    );
    output::print(
        output::format_field("fingerprint", report.fingerprint.short(16), 10),
        verbosity,
    );
    if !report.verified {
        output::warn("verification was skipped", verbosity);
    }
}
