mod cli;
mod commands;
mod config;
mod format;
mod style;
mod util;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::{DownloadArgs, cmd_config, cmd_download, cmd_equipment, cmd_history, cmd_ports};
use crate::config::Config;
use crate::format::FormatOptions;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load();
    let opts = FormatOptions::new(cli.no_color, cli.compact);
    let output = cli.output.as_ref();

    match cli.command {
        Commands::Download {
            port,
            baud,
            equipment,
            tag,
            no_save,
            format,
        } => {
            cmd_download(DownloadArgs {
                port,
                baud,
                equipment,
                tag,
                no_save,
                format,
                output,
                quiet: cli.quiet,
                opts: &opts,
                config: &config,
            })
            .await?;
        }
        Commands::History { action } => {
            cmd_history(action, output, &opts, &config)?;
        }
        Commands::Equipment { name, format } => {
            cmd_equipment(name, format, output, &opts, &config)?;
        }
        Commands::Ports { format } => {
            cmd_ports(format, output, &opts)?;
        }
        Commands::Config { action } => {
            cmd_config(action, config, output, &opts)?;
        }
    }

    Ok(())
}
