//! Config command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::ConfigAction;
use crate::config::Config;
use crate::format::FormatOptions;
use crate::style;
use crate::util::write_output;

pub fn cmd_config(
    action: ConfigAction,
    mut config: Config,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let content = toml::to_string_pretty(&config).context("Failed to serialize config")?;
            write_output(output, &content)?;
        }
        ConfigAction::Path => {
            write_output(output, &format!("{}\n", Config::path().display()))?;
        }
        ConfigAction::Set { key, value } => {
            config.set(key, &value)?;
            config.save()?;
            eprintln!(
                "{}",
                style::format_success(
                    &format!("Saved configuration to {}", Config::path().display()),
                    opts.no_color
                )
            );
        }
    }
    Ok(())
}
