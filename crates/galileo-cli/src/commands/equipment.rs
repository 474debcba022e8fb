//! Equipment command implementation.

use std::path::PathBuf;

use anyhow::{Result, bail};

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::format::{FormatOptions, format_equipment_text};
use crate::util::write_output;

pub fn cmd_equipment(
    name: Option<String>,
    format: OutputFormat,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
    config: &Config,
) -> Result<()> {
    let catalog = config.catalog();

    let profiles: Vec<_> = match &name {
        Some(name) => match catalog.get(name) {
            Some(profile) => vec![profile],
            None => bail!(
                "Unknown equipment '{}'. Known equipment: {}",
                name,
                catalog.names().collect::<Vec<_>>().join(", ")
            ),
        },
        None => catalog.profiles().iter().collect(),
    };

    let content = match format {
        OutputFormat::Json => opts.as_json(&profiles)?,
        OutputFormat::Text => format_equipment_text(&profiles, opts),
    };

    write_output(output, &content)?;
    Ok(())
}
