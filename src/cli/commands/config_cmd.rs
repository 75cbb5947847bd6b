//! config command - Get, set, or list configuration values
//!
//! Keys are `section.field`, matching the TOML layout of the config files.

use std::path::{Path, PathBuf};

use crate::core::config::{Config, ConfigFile, PROJECT_CONFIG_NAME};
use crate::engine::Context;
use crate::ui::output::{self, Verbosity};
use anyhow::{anyhow, bail, Context as _, Result};

/// Get an effective configuration value.
pub fn get(ctx: &Context, config: Option<&Path>, key: &str) -> Result<()> {
    let config = super::load_config(ctx, config, ConfigFile::default())?;
    let effective = toml::Value::try_from(config.effective())?;

    let (section, field) = split_key(key)?;
    let value = effective
        .get(section)
        .and_then(|s| s.get(field))
        .ok_or_else(|| anyhow!("Unknown or unset configuration key: {}", key))?;

    println!("{}", display_value(value));
    Ok(())
}

/// Set a value in the project config file.
pub fn set(ctx: &Context, config: Option<&Path>, key: &str, value: &str) -> Result<()> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let path = config
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_NAME));
    let (section, field) = split_key(key)?;

    let mut table = if path.exists() {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        contents
            .parse::<toml::Table>()
            .with_context(|| format!("Failed to parse {}", path.display()))?
    } else {
        toml::Table::new()
    };

    let section_table = table
        .entry(section.to_string())
        .or_insert_with(|| toml::Value::Table(toml::Table::new()))
        .as_table_mut()
        .ok_or_else(|| anyhow!("[{}] in {} is not a table", section, path.display()))?;
    section_table.insert(field.to_string(), parse_value(value));

    let file: ConfigFile = toml::Value::Table(table)
        .try_into()
        .map_err(|e| anyhow!("Invalid value for {}: {}", key, e))?;
    file.validate()
        .with_context(|| format!("Invalid value for {}", key))?;

    Config::write_file(&path, &file).context("Failed to write config")?;
    output::success(format!("Set {} = {}", key, value), verbosity);
    Ok(())
}

/// List all effective configuration values.
pub fn list(ctx: &Context, config: Option<&Path>) -> Result<()> {
    let loaded = super::load_config(ctx, config, ConfigFile::default())?;

    println!("# Effective configuration");
    if let Some(path) = loaded.global_config_loaded_from() {
        println!("# global:  {}", path.display());
    }
    if let Some(path) = loaded.project_config_loaded_from() {
        println!("# project: {}", path.display());
    }
    for line in flatten_entries(&toml::Value::try_from(loaded.effective())?) {
        println!("{}", line);
    }
    Ok(())
}

fn split_key(key: &str) -> Result<(&str, &str)> {
    match key.split_once('.') {
        Some((section, field)) if !section.is_empty() && !field.is_empty() => Ok((section, field)),
        _ => bail!("Configuration keys look like section.field, got '{}'", key),
    }
}

/// Parse a TOML literal; anything that does not parse is a bare string.
fn parse_value(raw: &str) -> toml::Value {
    format!("value = {}", raw)
        .parse::<toml::Table>()
        .ok()
        .and_then(|mut t| t.remove("value"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}

fn display_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn flatten_entries(root: &toml::Value) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(sections) = root.as_table() {
        for (section, fields) in sections {
            let Some(fields) = fields.as_table() else {
                continue;
            };
            for (field, value) in fields {
                lines.push(format!("{}.{} = {}", section, field, value));
            }
        }
    }
    lines
}
