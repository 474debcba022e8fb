//! History command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};

use galileo_core::{excursion_report, summarize};
use galileo_store::Archive;

use crate::cli::{HistoryAction, OutputFormat};
use crate::config::Config;
use crate::format::{
    FormatOptions, HistoryEntry, RecordView, format_history_list_text, format_record_text,
};
use crate::util::write_output;

pub fn cmd_history(
    action: HistoryAction,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
    config: &Config,
) -> Result<()> {
    let dir = config.history_dir();
    let archive = Archive::open(&dir)
        .with_context(|| format!("Failed to open history directory {}", dir.display()))?;

    let content = match action {
        HistoryAction::List { format } => {
            let entries: Vec<HistoryEntry> = archive
                .scan()
                .context("Failed to list history")?
                .iter()
                .map(|(name, record)| HistoryEntry::new(name, record))
                .collect();

            match format {
                OutputFormat::Json => opts.as_json(&entries)?,
                OutputFormat::Text => format_history_list_text(&entries, opts),
            }
        }
        HistoryAction::Show { file, format } => {
            let record = archive
                .load(&file)
                .with_context(|| format!("Failed to load {}", file))?;

            let catalog = config.catalog();
            let profile = catalog.get(record.session.equipment());
            let summary = summarize(record.session.samples());
            let excursions = profile.map(|p| excursion_report(record.session.samples(), p));

            match format {
                OutputFormat::Json => opts.as_json(&RecordView {
                    record: &record,
                    summary: &summary,
                    excursions: excursions.as_ref(),
                })?,
                OutputFormat::Text => {
                    format_record_text(&record, &summary, excursions.as_ref(), profile, opts)
                }
            }
        }
    };

    write_output(output, &content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use galileo_types::{SampleRecord, Session};
    use tempfile::TempDir;
    use time::macros::datetime;

    fn config(dir: &TempDir) -> Config {
        Config {
            history_dir: Some(dir.path().join("historial")),
            ..Config::default()
        }
    }

    fn save(config: &Config) -> String {
        let session = Session::new(
            "FREEZER",
            vec![
                SampleRecord::new(datetime!(2024-01-01 0:00), -20.0, 10.0),
                SampleRecord::new(datetime!(2024-01-01 0:10), -14.5, 11.0),
            ],
        )
        .with_tag("LAB1");
        Archive::open(config.history_dir())
            .unwrap()
            .save(&session, datetime!(2024-01-02 08:00))
            .unwrap()
    }

    #[test]
    fn test_show_json_to_file() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let name = save(&config);
        let out = dir.path().join("out.json");

        cmd_history(
            HistoryAction::Show {
                file: name.clone(),
                format: OutputFormat::Json,
            },
            Some(&out),
            &FormatOptions::new(true, false),
            &config,
        )
        .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(value["file_name"], name);
        assert_eq!(value["variant"], "current");
        assert_eq!(value["session"]["equipment"], "FREEZER");
        assert_eq!(value["summary"]["count"], 2);
        assert_eq!(value["excursions"]["temperature"]["action"], 1);
    }

    #[test]
    fn test_list_text_to_file() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let name = save(&config);
        let out = dir.path().join("out.txt");

        cmd_history(
            HistoryAction::List {
                format: OutputFormat::Text,
            },
            Some(&out),
            &FormatOptions::new(true, false),
            &config,
        )
        .unwrap();

        let text = std::fs::read_to_string(&out).unwrap();
        assert!(text.starts_with("Saved sessions (1):"));
        assert!(text.contains(&name));
        assert!(text.contains("2 samples"));
    }

    #[test]
    fn test_show_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = cmd_history(
            HistoryAction::Show {
                file: "nope.csv".to_string(),
                format: OutputFormat::Text,
            },
            None,
            &FormatOptions::default(),
            &config(&dir),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Failed to load nope.csv"));
    }
}
