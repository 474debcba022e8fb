//! Output formatting utilities for text and JSON output.

use std::fmt::Write as _;

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;

use galileo_core::summary::{HUMIDITY_UNIT, TEMPERATURE_UNIT};
use galileo_core::{
    ExcursionReport, LimitLevel, PortInfo, Summary, evaluate_sample,
    limits::FieldExcursions,
};
use galileo_store::{Error as StoreError, HistoricalRecord, format_decimal, parse_file_name};
use galileo_types::equipment::{Bands, Range};
use galileo_types::{EquipmentProfile, SampleRecord, format_timestamp};

use crate::commands::DownloadReport;
use crate::style;

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool, compact: bool) -> Self {
        Self { no_color, compact }
    }

    /// Serialize value to JSON string, respecting compact option.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }
}

fn temp(value: f64) -> String {
    format!("{} {}", format_decimal(value), TEMPERATURE_UNIT)
}

fn hum(value: f64) -> String {
    format!("{} {}", format_decimal(value), HUMIDITY_UNIT)
}

// ============================================================================
// Download
// ============================================================================

pub fn format_download_text(report: &DownloadReport, opts: &FormatOptions) -> String {
    let mut out = String::new();

    let mut title = format!("Session: {}", report.equipment);
    if let Some(tag) = &report.tag {
        let _ = write!(title, " [{}]", tag);
    }
    let _ = writeln!(out, "{}", style::format_title(&title, opts.no_color));
    let _ = writeln!(out, "Header:     {}", report.metadata);
    let _ = writeln!(
        out,
        "Blocks:     {} ({})",
        report.blocks_read, report.stop_reason
    );

    if report.partial {
        let _ = writeln!(
            out,
            "{}",
            style::format_warning(
                "Download ended early; the samples below are a partial session",
                opts.no_color
            )
        );
    }

    match &report.saved_as {
        Some(name) => {
            let _ = writeln!(
                out,
                "{}",
                style::format_success(&format!("Saved as {}", name), opts.no_color)
            );
        }
        None => {
            let _ = writeln!(out, "Not saved.");
        }
    }

    out.push('\n');
    out.push_str(&format_summary_text(&report.summary, opts));

    if let Some(excursions) = &report.excursions {
        out.push('\n');
        out.push_str(&format_excursions_text(excursions, opts));
    }
    out
}

// ============================================================================
// Summary and limits
// ============================================================================

pub fn format_summary_text(summary: &Summary, opts: &FormatOptions) -> String {
    let Some(stats) = summary.stats() else {
        return "No samples.\n".to_string();
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", style::format_title("Summary", opts.no_color));
    let _ = writeln!(out, "Samples:      {}", stats.count);
    let _ = writeln!(out, "First:        {}", format_timestamp(stats.start));
    let _ = writeln!(out, "Last:         {}", format_timestamp(stats.end));
    let _ = writeln!(
        out,
        "Temperature:  min {}  max {}  mean {}",
        temp(stats.temperature.min),
        temp(stats.temperature.max),
        temp(stats.temperature.mean)
    );
    let _ = writeln!(
        out,
        "Humidity:     min {}  max {}  mean {}",
        hum(stats.humidity.min),
        hum(stats.humidity.max),
        hum(stats.humidity.mean)
    );
    out
}

fn field_level(field: &FieldExcursions) -> LimitLevel {
    if field.action > 0 {
        LimitLevel::Action
    } else if field.alert > 0 {
        LimitLevel::Alert
    } else {
        LimitLevel::Normal
    }
}

fn field_excursions_line(name: &str, field: &FieldExcursions, opts: &FormatOptions) -> String {
    if !field.monitored {
        return format!("{:<13} not monitored", name);
    }

    let level = field_level(field);
    let mut line = format!(
        "{:<13} {} alert: {}  action: {}",
        name,
        style::format_level(level, opts.no_color),
        field.alert,
        field.action
    );
    if let Some(first) = field.first_excursion {
        let _ = write!(line, "  first: {}", format_timestamp(first));
    }
    line
}

pub fn format_excursions_text(report: &ExcursionReport, opts: &FormatOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        style::format_title(&format!("Limits: {}", report.equipment), opts.no_color)
    );
    let _ = writeln!(
        out,
        "{}",
        field_excursions_line("Temperature:", &report.temperature, opts)
    );
    let _ = writeln!(
        out,
        "{}",
        field_excursions_line("Humidity:", &report.humidity, opts)
    );
    let worst = field_level(&report.temperature).max(field_level(&report.humidity));
    let _ = writeln!(out, "{:<13} {}", "Status:", worst.description());
    out
}

// ============================================================================
// History
// ============================================================================

/// One row of `history list` output.
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub file: String,
    pub equipment: String,
    pub tag: Option<String>,
    pub captured_at: Option<String>,
    pub samples: Option<usize>,
    pub error: Option<String>,
}

impl HistoryEntry {
    pub fn new(file: &str, record: &Result<HistoricalRecord, StoreError>) -> Self {
        match record {
            Ok(record) => Self {
                file: file.to_string(),
                equipment: record.session.equipment().to_string(),
                tag: record.session.tag().map(str::to_string),
                captured_at: record.captured_at.map(format_timestamp),
                samples: Some(record.session.len()),
                error: None,
            },
            Err(e) => {
                let parts = parse_file_name(file);
                Self {
                    file: file.to_string(),
                    equipment: parts.equipment,
                    tag: (!parts.tag.is_empty()).then_some(parts.tag),
                    captured_at: parts.captured_at.map(format_timestamp),
                    samples: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

pub fn format_history_list_text(entries: &[HistoryEntry], opts: &FormatOptions) -> String {
    if entries.is_empty() {
        return "No saved sessions found.\n".to_string();
    }

    let mut out = format!("Saved sessions ({}):\n\n", entries.len());
    for entry in entries {
        let captured = entry.captured_at.as_deref().unwrap_or("-");
        let tag = entry.tag.as_deref().unwrap_or("");
        let detail = match (&entry.samples, &entry.error) {
            (Some(n), _) => format!("{} samples", n),
            (None, Some(e)) => {
                if opts.no_color {
                    format!("unreadable: {}", e)
                } else {
                    format!("unreadable: {}", e).red().to_string()
                }
            }
            (None, None) => String::new(),
        };
        let _ = writeln!(
            out,
            "{:<19}  {:<22} {:<12} {}",
            captured, entry.equipment, tag, detail
        );
        let _ = writeln!(out, "    {}", entry.file);
    }
    out
}

/// `history show` JSON document.
#[derive(Debug, Serialize)]
pub struct RecordView<'a> {
    #[serde(flatten)]
    pub record: &'a HistoricalRecord,
    pub summary: &'a Summary,
    pub excursions: Option<&'a ExcursionReport>,
}

pub fn format_record_text(
    record: &HistoricalRecord,
    summary: &Summary,
    excursions: Option<&ExcursionReport>,
    profile: Option<&EquipmentProfile>,
    opts: &FormatOptions,
) -> String {
    let session = &record.session;
    let mut out = String::new();

    let mut title = format!("{}: {}", record.file_name, session.equipment());
    if let Some(tag) = session.tag() {
        let _ = write!(title, " [{}]", tag);
    }
    let _ = writeln!(out, "{}", style::format_title(&title, opts.no_color));
    if let Some(at) = record.captured_at {
        let _ = writeln!(out, "Captured:   {}", format_timestamp(at));
    }
    out.push('\n');

    out.push_str(&format_samples_text(session.samples(), profile, opts));
    out.push('\n');
    out.push_str(&format_summary_text(summary, opts));
    if let Some(excursions) = excursions {
        out.push('\n');
        out.push_str(&format_excursions_text(excursions, opts));
    }
    out
}

/// Sample table, with a limit badge per row when `profile` is known.
pub fn format_samples_text(
    samples: &[SampleRecord],
    profile: Option<&EquipmentProfile>,
    opts: &FormatOptions,
) -> String {
    if samples.is_empty() {
        return "No samples.\n".to_string();
    }

    let mut out = format!(
        "{:<19}  {:>12}  {:>12}\n",
        "Timestamp", "Temperature", "Humidity"
    );
    for sample in samples {
        let _ = write!(
            out,
            "{:<19}  {:>12}  {:>12}",
            format_timestamp(sample.timestamp),
            temp(sample.temperature),
            hum(sample.humidity)
        );
        if let Some(profile) = profile {
            let level = evaluate_sample(sample, profile).worst();
            if level.is_excursion() {
                let _ = write!(out, "  {}", style::format_level(level, opts.no_color));
            }
        }
        out.push('\n');
    }
    out
}

// ============================================================================
// Equipment and ports
// ============================================================================

fn format_range(range: &Range, unit: &str) -> String {
    match (range.min, range.max) {
        (Some(min), Some(max)) => {
            format!("{} .. {} {}", format_decimal(min), format_decimal(max), unit)
        }
        (None, Some(max)) => format!("<= {} {}", format_decimal(max), unit),
        (Some(min), None) => format!(">= {} {}", format_decimal(min), unit),
        (None, None) => "any".to_string(),
    }
}

fn format_bands(name: &str, bands: Option<&Bands>, unit: &str) -> String {
    match bands {
        Some(b) => format!(
            "  {:<12} alert {:<20} action {}",
            name,
            format_range(&b.alert, unit),
            format_range(&b.action, unit)
        ),
        None => format!("  {:<12} not monitored", name),
    }
}

pub fn format_equipment_text(profiles: &[&EquipmentProfile], opts: &FormatOptions) -> String {
    let mut out = String::new();
    for (i, profile) in profiles.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if opts.no_color {
            let _ = writeln!(out, "{}", profile.name);
        } else {
            let _ = writeln!(out, "{}", profile.name.cyan());
        }
        let _ = writeln!(
            out,
            "{}",
            format_bands("Temperature", profile.temperature.as_ref(), TEMPERATURE_UNIT)
        );
        let _ = writeln!(
            out,
            "{}",
            format_bands("Humidity", profile.humidity.as_ref(), HUMIDITY_UNIT)
        );
    }
    out
}

pub fn format_ports_text(ports: &[PortInfo], _opts: &FormatOptions) -> String {
    if ports.is_empty() {
        return "No serial ports found.\n".to_string();
    }

    let mut out = format!("Found {} serial port(s):\n\n", ports.len());
    for port in ports {
        let _ = writeln!(out, "  {:<20} {}", port.name, port.description);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use galileo_core::{excursion_report, summarize};
    use galileo_types::EquipmentCatalog;
    use time::macros::datetime;

    const PLAIN: FormatOptions = FormatOptions {
        no_color: true,
        compact: false,
    };

    fn samples() -> Vec<SampleRecord> {
        vec![
            SampleRecord::new(datetime!(2024-01-01 0:00), 5.0, 60.0),
            SampleRecord::new(datetime!(2024-01-01 0:15), 7.5, 61.0),
            SampleRecord::new(datetime!(2024-01-01 0:30), 9.0, 62.0),
        ]
    }

    #[test]
    fn test_as_json_compact_and_pretty() {
        let value = serde_json::json!({"a": 1});
        assert_eq!(
            FormatOptions::new(true, true).as_json(&value).unwrap(),
            "{\"a\":1}\n"
        );
        assert!(PLAIN.as_json(&value).unwrap().contains("\n  \"a\": 1"));
    }

    #[test]
    fn test_summary_text() {
        let text = format_summary_text(&summarize(&samples()), &PLAIN);
        assert!(text.contains("Samples:      3"));
        assert!(text.contains("First:        2024-01-01 00:00:00"));
        assert!(text.contains("min 5.0 °C"));
        assert!(text.contains("max 9.0 °C"));
        assert!(text.contains("mean 61.0 %rH"));
    }

    #[test]
    fn test_empty_summary_text() {
        assert_eq!(format_summary_text(&Summary::default(), &PLAIN), "No samples.\n");
    }

    #[test]
    fn test_excursions_text() {
        let catalog = EquipmentCatalog::default();
        let report = excursion_report(&samples(), catalog.get("HELADERA").unwrap());
        let text = format_excursions_text(&report, &PLAIN);
        assert!(text.contains("Limits: HELADERA"));
        assert!(text.contains("[ACTION] alert: 1  action: 1  first: 2024-01-01 00:15:00"));
        assert!(text.contains("Humidity:     not monitored"));
        assert!(text.ends_with("Status:       Action limit exceeded\n"));
    }

    #[test]
    fn test_excursions_text_within_limits() {
        let catalog = EquipmentCatalog::default();
        let report = excursion_report(&samples()[..1], catalog.get("HELADERA").unwrap());
        let text = format_excursions_text(&report, &PLAIN);
        assert!(text.contains("Status:       Within limits"));
    }

    #[test]
    fn test_samples_text_marks_excursions() {
        let catalog = EquipmentCatalog::default();
        let text = format_samples_text(&samples(), catalog.get("HELADERA"), &PLAIN);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(!lines[1].contains('['));
        assert!(lines[2].ends_with("[ALERT]"));
        assert!(lines[3].ends_with("[ACTION]"));
    }

    #[test]
    fn test_equipment_ranges() {
        let catalog = EquipmentCatalog::default();
        let freezer = catalog.get("FREEZER").unwrap();
        let text = format_equipment_text(&[freezer], &PLAIN);
        assert!(text.starts_with("FREEZER\n"));
        assert!(text.contains("<= -17.0 °C"));
        assert!(text.contains("<= -15.0 °C"));
        assert!(text.contains("Humidity     not monitored"));
    }

    #[test]
    fn test_range_formats() {
        assert_eq!(format_range(&Range::between(3.0, 7.0), "°C"), "3.0 .. 7.0 °C");
        assert_eq!(format_range(&Range::default(), "°C"), "any");
        assert_eq!(
            format_range(
                &Range {
                    min: Some(10.0),
                    max: None
                },
                "%rH"
            ),
            ">= 10.0 %rH"
        );
    }

    #[test]
    fn test_history_entry_for_broken_file() {
        let err: Result<HistoricalRecord, StoreError> = Err(StoreError::InvalidNumber {
            row: 3,
            value: "abc".to_string(),
        });
        let entry = HistoryEntry::new("2024-01-02__00-00-00__FREEZER__LAB1.csv", &err);
        assert_eq!(entry.equipment, "FREEZER");
        assert_eq!(entry.tag.as_deref(), Some("LAB1"));
        assert_eq!(entry.captured_at.as_deref(), Some("2024-01-02 00:00:00"));
        assert!(entry.samples.is_none());
        assert!(entry.error.is_some());

        let text = format_history_list_text(&[entry], &PLAIN);
        assert!(text.contains("unreadable"));
    }

    #[test]
    fn test_ports_text() {
        assert_eq!(format_ports_text(&[], &PLAIN), "No serial ports found.\n");
        let ports = [PortInfo {
            name: "/dev/ttyUSB0".to_string(),
            description: "FT232R USB UART".to_string(),
        }];
        assert!(format_ports_text(&ports, &PLAIN).contains("/dev/ttyUSB0"));
    }
}
