//! Alert and action limit evaluation.
//!
//! Limits come from an [`EquipmentProfile`] supplied by the caller,
//! usually looked up in an [`EquipmentCatalog`](galileo_types::EquipmentCatalog).
//!
//! # Example
//!
//! ```
//! use galileo_core::limits::{LimitLevel, evaluate_sample};
//! use galileo_types::{EquipmentCatalog, SampleRecord};
//! use time::macros::datetime;
//!
//! let catalog = EquipmentCatalog::default();
//! let fridge = catalog.get("HELADERA").unwrap();
//!
//! let sample = SampleRecord::new(datetime!(2024-01-01 0:00), 7.5, 60.0);
//! assert_eq!(evaluate_sample(&sample, fridge).temperature, LimitLevel::Alert);
//! ```

use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use galileo_types::types::option_timestamp_serde;
use galileo_types::{Bands, EquipmentProfile, SampleRecord};

/// Where a value sits relative to its limit bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LimitLevel {
    /// Inside the alert band, or the quantity is not monitored.
    Normal,
    /// Outside the alert band but inside the action band.
    Alert,
    /// Outside the action band.
    Action,
}

impl LimitLevel {
    /// Get a human-readable description of the level.
    pub fn description(&self) -> &'static str {
        match self {
            LimitLevel::Normal => "Within limits",
            LimitLevel::Alert => "Alert limit exceeded",
            LimitLevel::Action => "Action limit exceeded",
        }
    }

    pub fn is_excursion(&self) -> bool {
        *self != LimitLevel::Normal
    }
}

/// Classify `value` against optional bands.
pub fn evaluate(value: f64, bands: Option<&Bands>) -> LimitLevel {
    match bands {
        Some(b) if !b.action.contains(value) => LimitLevel::Action,
        Some(b) if !b.alert.contains(value) => LimitLevel::Alert,
        _ => LimitLevel::Normal,
    }
}

/// Per-field classification of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleEvaluation {
    pub temperature: LimitLevel,
    pub humidity: LimitLevel,
}

impl SampleEvaluation {
    /// The more severe of the two field levels.
    pub fn worst(&self) -> LimitLevel {
        self.temperature.max(self.humidity)
    }
}

/// Classify both fields of `sample` against `profile`.
pub fn evaluate_sample(sample: &SampleRecord, profile: &EquipmentProfile) -> SampleEvaluation {
    SampleEvaluation {
        temperature: evaluate(sample.temperature, profile.temperature.as_ref()),
        humidity: evaluate(sample.humidity, profile.humidity.as_ref()),
    }
}

/// Excursion counts for one measured quantity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldExcursions {
    /// Whether the profile defines limits for this quantity.
    pub monitored: bool,
    /// Samples at [`LimitLevel::Alert`].
    pub alert: usize,
    /// Samples at [`LimitLevel::Action`].
    pub action: usize,
    /// Timestamp of the first sample outside the alert band.
    #[serde(with = "option_timestamp_serde")]
    pub first_excursion: Option<PrimitiveDateTime>,
}

impl FieldExcursions {
    fn record(&mut self, level: LimitLevel, at: PrimitiveDateTime) {
        match level {
            LimitLevel::Normal => return,
            LimitLevel::Alert => self.alert += 1,
            LimitLevel::Action => self.action += 1,
        }
        self.first_excursion.get_or_insert(at);
    }

    /// Total samples outside the alert band.
    pub fn total(&self) -> usize {
        self.alert + self.action
    }
}

/// Limit excursions over a whole session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcursionReport {
    pub equipment: String,
    pub samples: usize,
    pub temperature: FieldExcursions,
    pub humidity: FieldExcursions,
}

impl ExcursionReport {
    /// Whether any sample left its alert band.
    pub fn has_excursions(&self) -> bool {
        self.temperature.total() + self.humidity.total() > 0
    }

    /// Most severe level seen across the session.
    pub fn worst(&self) -> LimitLevel {
        let level = |f: &FieldExcursions| {
            if f.action > 0 {
                LimitLevel::Action
            } else if f.alert > 0 {
                LimitLevel::Alert
            } else {
                LimitLevel::Normal
            }
        };
        level(&self.temperature).max(level(&self.humidity))
    }
}

/// Count alert and action samples per field.
pub fn excursion_report(samples: &[SampleRecord], profile: &EquipmentProfile) -> ExcursionReport {
    let mut report = ExcursionReport {
        equipment: profile.name.clone(),
        samples: samples.len(),
        temperature: FieldExcursions {
            monitored: profile.temperature.is_some(),
            ..Default::default()
        },
        humidity: FieldExcursions {
            monitored: profile.humidity.is_some(),
            ..Default::default()
        },
    };

    for sample in samples {
        let eval = evaluate_sample(sample, profile);
        report.temperature.record(eval.temperature, sample.timestamp);
        report.humidity.record(eval.humidity, sample.timestamp);
    }
    report
}
