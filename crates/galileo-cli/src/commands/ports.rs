//! Ports command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};

use galileo_core::available_ports;

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, format_ports_text};
use crate::util::write_output;

pub fn cmd_ports(format: OutputFormat, output: Option<&PathBuf>, opts: &FormatOptions) -> Result<()> {
    let ports = available_ports().context("Failed to enumerate serial ports")?;

    let content = match format {
        OutputFormat::Json => opts.as_json(&ports)?,
        OutputFormat::Text => format_ports_text(&ports, opts),
    };

    write_output(output, &content)?;
    Ok(())
}
