//! Config command for listing and changing plugin options.

use std::io::Write;

use anyhow::{Context, Result};
use mn_core::ConfigStore;

use crate::Config;
use crate::commands::util;

/// Writes every option as `name = "value"` followed by its help text.
pub fn write_listing<W: Write>(writer: &mut W, options: &ConfigStore) -> Result<()> {
    for entry in options.entries() {
        writeln!(writer, "{} = {:?}", entry.name, entry.value)?;
        writeln!(
            writer,
            "    {} (default: {:?})",
            entry.description, entry.default
        )?;
    }
    Ok(())
}

/// Runs `config list`.
pub fn list<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let (_store, options) = util::load_options(config)?;
    write_listing(writer, &options)
}

/// Runs `config get`.
pub fn get<W: Write>(writer: &mut W, config: &Config, name: &str) -> Result<()> {
    let (_store, options) = util::load_options(config)?;
    let value = options.get(name)?;
    writeln!(writer, "{value}")?;
    Ok(())
}

/// Runs `config set`.
pub fn set(config: &Config, name: &str, value: &str) -> Result<()> {
    let (mut store, mut options) = util::load_options(config)?;
    options
        .set(&mut store, name, value)
        .with_context(|| format!("failed to set {name}"))?;
    tracing::info!(option = name, value, "option updated");
    Ok(())
}
