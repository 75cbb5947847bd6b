//! init command - Write a project config file with the defaults spelled out

use std::path::Path;

use crate::core::config::Config;
use crate::engine::Context;
use crate::ui::output::{self, Verbosity};
use anyhow::{bail, Context as _, Result};

/// Write `path` with every default value set.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `path` - File to create
/// * `force` - Overwrite an existing file
pub fn init(ctx: &Context, path: &Path, force: bool) -> Result<()> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);

    if path.exists() && !force {
        bail!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        );
    }

    Config::write_file(path, &Config::defaults())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    output::success(format!("Wrote {}", path.display()), verbosity);
    Ok(())
}
