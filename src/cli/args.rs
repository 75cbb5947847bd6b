//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Project config file (default `./metalens.toml`)
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::config::{ConfigFile, LayoutFormat, LensSection, OutputSection, TilingSection};

/// metalens - phase-quantized unit-cell layouts for flat metalenses
#[derive(Parser, Debug)]
#[command(name = "metalens")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project config file (defaults to ./metalens.toml if present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate the aperture layout
    #[command(
        name = "generate",
        long_about = "Generate the unit-cell layout of a metalens.\n\n\
            Computes the ideal phase at every lattice site, quantizes it onto the \
            unit-cell catalog, and writes the resulting cell hierarchy as a GDSII \
            stream or a JSON layout document. The outer region is written once as a sector and \
            instanced by rotation; the centre is placed directly.\n\n\
            Flags override values from config files.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Generate the reference lens with defaults
    metalens generate

    # Smaller lens, written to a custom file
    metalens generate --array-size 200 --inner-radius 50 -o small.json

    # GDSII for the mask shop (format follows the extension)
    metalens generate -o metalens_mask.gds

    # Count placements without writing anything
    metalens generate --dry-run

    # Pin the worker pool size
    metalens generate --threads 4"
    )]
    Generate(GenerateArgs),

    /// Show the ring plan and catalog without generating
    #[command(
        name = "inspect",
        long_about = "Show what a generation run would do.\n\n\
            Prints the resolved lens parameters, the unit-cell catalog and the \
            ring plan. No phase is quantized and nothing is written. With \
            --layout, summarizes an existing layout document instead.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Summary of the configured lens
    metalens inspect

    # Machine-readable plan
    metalens inspect --json

    # Summarize a written layout
    metalens inspect --layout metalens_mask.json"
    )]
    Inspect {
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        /// Summarize an existing layout document
        #[arg(long, value_name = "PATH")]
        layout: Option<PathBuf>,
    },

    /// Write a project config file with every default spelled out
    #[command(
        name = "init",
        after_help = "\
WORKFLOW EXAMPLES:
    # Create ./metalens.toml
    metalens init

    # Overwrite an existing file
    metalens init --force"
    )]
    Init {
        /// Where to write the file
        #[arg(long, value_name = "PATH", default_value = crate::core::config::PROJECT_CONFIG_NAME)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Get, set, or list configuration values
    #[command(
        name = "config",
        long_about = "View or modify metalens configuration.\n\n\
            Values are resolved from built-in defaults, the global config file and \
            the project config file. `set` writes to the project config file.",
        after_help = "\
WORKFLOW EXAMPLES:
    # List all effective values
    metalens config list

    # Get a specific value
    metalens config get lens.focal_length

    # Set a value in ./metalens.toml
    metalens config set tiling.inner_radius 200"
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell. Add the output \
            to your shell's configuration to enable tab-completion.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    metalens completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    metalens completion zsh >> ~/.zshrc

    # Fish
    metalens completion fish > ~/.config/fish/completions/metalens.fish

    # PowerShell
    metalens completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for `generate`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Output layout file
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Layout format (defaults to the output extension, else JSON)
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Focal length
    #[arg(long, value_name = "F")]
    pub focal_length: Option<f64>,

    /// Design wavelength
    #[arg(long, value_name = "LAMBDA")]
    pub wavelength: Option<f64>,

    /// Lattice period
    #[arg(long, value_name = "P")]
    pub period: Option<f64>,

    /// Aperture half-width in lattice periods
    #[arg(long, value_name = "N")]
    pub array_size: Option<u32>,

    /// Radius below which the full-disk lattice is used
    #[arg(long, value_name = "R")]
    pub inner_radius: Option<f64>,

    /// Worker threads (defaults to one per core)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub threads: Option<u16>,

    /// Skip post-generation verification
    #[arg(long)]
    pub skip_verify: bool,

    /// Generate in memory and report counts without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Pretty-print the JSON document
    #[arg(long)]
    pub pretty: bool,
}

impl GenerateArgs {
    /// The config layer these flags override.
    pub fn overrides(&self) -> ConfigFile {
        let lens = LensSection {
            focal_length: self.focal_length,
            wavelength: self.wavelength,
            period: self.period,
            array_size: self.array_size,
        };
        let tiling = TilingSection {
            inner_radius: self.inner_radius,
            ..Default::default()
        };
        let output = OutputSection {
            path: self.output.clone(),
            format: self.format.map(LayoutFormat::from),
            top_name: None,
        };
        ConfigFile {
            lens: (lens != LensSection::default()).then_some(lens),
            cells: None,
            tiling: (tiling != TilingSection::default()).then_some(tiling),
            output: (output != OutputSection::default()).then_some(output),
        }
    }
}

/// Layout formats accepted by `--format`.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Json,
    Gds,
}

impl From<FormatArg> for LayoutFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => LayoutFormat::Json,
            FormatArg::Gds => LayoutFormat::Gds,
        }
    }
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key, e.g. `lens.period`
        key: String,
    },
    /// Set a configuration value in the project config file
    Set {
        /// Configuration key
        key: String,
        /// Value to set (TOML literal; bare words are strings)
        value: String,
    },
    /// List all effective configuration values
    List,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "metalens",
            "generate",
            "--array-size",
            "200",
            "--inner-radius",
            "50",
            "-o",
            "out.json",
        ])
        .unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        let overrides = args.overrides();
        assert_eq!(overrides.lens.unwrap().array_size, Some(200));
        assert_eq!(overrides.tiling.unwrap().inner_radius, Some(50.0));
        assert_eq!(
            overrides.output.unwrap().path,
            Some(PathBuf::from("out.json"))
        );
        assert!(overrides.cells.is_none());
    }

    #[test]
    fn format_flag_becomes_override() {
        let cli = Cli::try_parse_from(["metalens", "generate", "--format", "gds"]).unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        let output = args.overrides().output.unwrap();
        assert_eq!(output.format, Some(LayoutFormat::Gds));
        assert!(output.path.is_none());

        assert!(Cli::try_parse_from(["metalens", "generate", "--format", "oasis"]).is_err());
    }

    #[test]
    fn no_flags_no_overrides() {
        assert_eq!(GenerateArgs::default().overrides(), ConfigFile::default());
    }

    #[test]
    fn zero_threads_rejected() {
        assert!(Cli::try_parse_from(["metalens", "generate", "--threads", "0"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["metalens", "inspect", "--config", "lens.toml", "-q"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("lens.toml")));
        assert!(cli.quiet);
    }
}
