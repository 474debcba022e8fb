//! Download command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use galileo_core::{
    DownloadOptions, ExcursionReport, StopReason, Summary, download_from_port, excursion_report,
    summarize,
};
use galileo_store::Archive;
use galileo_types::{SampleRecord, SessionMetadata};

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::format::{FormatOptions, format_download_text};
use crate::style;
use crate::util::{capture_time, write_output};

/// Arguments for the download command.
pub struct DownloadArgs<'a> {
    pub port: Option<String>,
    pub baud: Option<u32>,
    pub equipment: Option<String>,
    pub tag: Option<String>,
    pub no_save: bool,
    pub format: OutputFormat,
    pub output: Option<&'a PathBuf>,
    pub quiet: bool,
    pub opts: &'a FormatOptions,
    pub config: &'a Config,
}

/// Everything the download command reports.
#[derive(Debug, Serialize)]
pub struct DownloadReport {
    pub port: String,
    pub equipment: String,
    pub tag: Option<String>,
    pub metadata: SessionMetadata,
    pub blocks_read: u16,
    pub stop_reason: StopReason,
    pub partial: bool,
    pub saved_as: Option<String>,
    pub summary: Summary,
    pub excursions: Option<ExcursionReport>,
    pub samples: Vec<SampleRecord>,
}

pub async fn cmd_download(args: DownloadArgs<'_>) -> Result<()> {
    let DownloadArgs {
        port,
        baud,
        equipment,
        tag,
        no_save,
        format,
        output,
        quiet,
        opts,
        config,
    } = args;

    let port = port.unwrap_or_else(|| config.port.clone());
    let baud = baud.unwrap_or(config.baud);
    let equipment = equipment.unwrap_or_else(|| config.default_equipment.clone());

    let catalog = config.catalog();
    if !catalog.contains(&equipment) {
        warn!(
            "Equipment '{}' is not in the catalog; limits will not be evaluated",
            equipment
        );
    }

    // Ctrl-C stops the block scan; samples read so far are kept.
    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let show_progress = !quiet && matches!(format, OutputFormat::Text);
    let pb = show_progress.then(|| style::connecting_spinner(&port));

    let mut options = DownloadOptions::new().cancel_token(cancel);
    if let Some(pb) = pb.clone() {
        options = options.with_progress(move |progress| {
            let len = u64::from(progress.max_blocks);
            if pb.length() != Some(len) {
                style::into_download_bar(&pb, len);
            }
            pb.set_position(u64::from(progress.blocks_read));
            pb.set_message(format!("{} samples", progress.samples));
        });
    }

    info!("Downloading from {} at {} baud", port, baud);
    let result = download_from_port(&port, baud, config.timing(), &options).await;
    ctrl_c.abort();

    let download = match result {
        Ok(download) => download,
        Err(e) => {
            if let Some(pb) = &pb {
                pb.abandon_with_message("Download failed");
            }
            return Err(e).with_context(|| format!("Failed to download from {}", port));
        }
    };

    if let Some(pb) = &pb {
        if download.is_partial() {
            pb.abandon_with_message(format!("Stopped: {}", download.stop_reason));
        } else {
            pb.finish_with_message("Download complete");
        }
    }

    let metadata = download.metadata;
    let blocks_read = download.blocks_read;
    let stop_reason = download.stop_reason.clone();
    let partial = download.is_partial();
    let session = download.into_session(equipment, tag.as_deref());

    let saved_as = if no_save {
        None
    } else if session.is_empty() {
        info!("No samples downloaded; nothing to save");
        None
    } else {
        let archive = Archive::open(config.history_dir()).context("Failed to open history")?;
        let name = archive
            .save(&session, capture_time())
            .context("Failed to save session")?;
        Some(name)
    };

    let summary = summarize(session.samples());
    let excursions = catalog
        .get(session.equipment())
        .map(|profile| excursion_report(session.samples(), profile));

    let report = DownloadReport {
        port,
        equipment: session.equipment().to_string(),
        tag: session.tag().map(str::to_string),
        metadata,
        blocks_read,
        stop_reason,
        partial,
        saved_as,
        summary,
        excursions,
        samples: session.into_samples(),
    };

    let content = match format {
        OutputFormat::Json => opts.as_json(&report)?,
        OutputFormat::Text => format_download_text(&report, opts),
    };

    write_output(output, &content)?;
    Ok(())
}
