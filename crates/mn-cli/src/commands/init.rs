//! Init command for writing default options.

use std::io::Write;

use anyhow::Result;

use crate::Config;
use crate::commands::{options, util};

/// Runs the init command.
pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let (store, opts) = util::load_options(config)?;

    options::write_listing(writer, &opts)?;
    writeln!(writer)?;
    writeln!(writer, "Saved to: {}", store.path().display())?;

    Ok(())
}
