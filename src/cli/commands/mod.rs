//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration and applies command-line overrides
//! 2. Calls the engine to execute the command
//! 3. Formats and displays output
//!
//! Handlers never quantize or place cells themselves.

mod completion;
mod config_cmd;
mod generate;
mod init;
mod inspect;

// Re-export command functions for testing and direct invocation
pub use completion::completion;
pub use config_cmd::{get as config_get, list as config_list, set as config_set};
pub use generate::generate;
pub use init::init;
pub use inspect::inspect;

use std::path::Path;

use crate::cli::args::{Command, ConfigAction};
use crate::core::config::{Config, ConfigFile};
use crate::engine::Context;
use crate::ui::output::{self, Verbosity};
use anyhow::{Context as _, Result};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, config: Option<&Path>, ctx: &Context) -> Result<()> {
    match command {
        Command::Generate(args) => generate::generate(ctx, config, &args),
        Command::Inspect { json, layout } => inspect::inspect(ctx, config, json, layout.as_deref()),
        Command::Init { path, force } => init::init(ctx, &path, force),
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_cmd::get(ctx, config, &key),
            ConfigAction::Set { key, value } => config_cmd::set(ctx, config, &key, &value),
            ConfigAction::List => config_cmd::list(ctx, config),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Load layered configuration, report warnings, and apply `overrides`.
pub(crate) fn load_config(
    ctx: &Context,
    project: Option<&Path>,
    overrides: ConfigFile,
) -> Result<Config> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let loaded = Config::load(project).context("Failed to load configuration")?;
    for warning in &loaded.warnings {
        output::warn(
            format!("{}: {}", warning.path.display(), warning.message),
            verbosity,
        );
    }
    if let Some(path) = loaded.config.global_config_loaded_from() {
        output::debug(format!("global config: {}", path.display()), verbosity);
    }
    if let Some(path) = loaded.config.project_config_loaded_from() {
        output::debug(format!("project config: {}", path.display()), verbosity);
    }
    loaded
        .config
        .with_overrides(overrides)
        .context("Invalid command-line value")
}
