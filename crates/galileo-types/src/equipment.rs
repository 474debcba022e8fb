//! Equipment catalog with temperature and humidity limit bands.
//!
//! The catalog is plain configuration data. Collaborators that need alarm
//! thresholds receive it by reference; nothing in the download path reads it.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Equipment label used when a historical file does not name one.
pub const FALLBACK_EQUIPMENT: &str = "HELADERA";

/// A closed or half-open interval. A missing bound never triggers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Range {
    #[cfg_attr(feature = "serde", serde(default))]
    pub min: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub max: Option<f64>,
}

impl Range {
    /// Range bounded on both sides.
    #[must_use]
    pub const fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Range with only an upper bound.
    #[must_use]
    pub const fn at_most(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    /// Whether `value` lies within the range (bounds inclusive).
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// Alert and action bands for one measured quantity.
///
/// The alert band is the inner, tighter one; leaving the action band
/// requires corrective action.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bands {
    pub alert: Range,
    pub action: Range,
}

/// Limits for one kind of monitored equipment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EquipmentProfile {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub temperature: Option<Bands>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub humidity: Option<Bands>,
}

impl EquipmentProfile {
    fn new(name: &str, temperature: Option<Bands>, humidity: Option<Bands>) -> Self {
        Self {
            name: name.to_string(),
            temperature,
            humidity,
        }
    }
}

/// Ordered, immutable list of equipment profiles.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EquipmentCatalog {
    profiles: Vec<EquipmentProfile>,
}

impl EquipmentCatalog {
    /// Build a catalog from explicit profiles.
    pub fn new(profiles: Vec<EquipmentProfile>) -> Self {
        Self { profiles }
    }

    /// Look up a profile by exact name.
    pub fn get(&self, name: &str) -> Option<&EquipmentProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Whether the catalog lists `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Profile names in catalog order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.name.as_str())
    }

    /// All profiles in catalog order.
    pub fn profiles(&self) -> &[EquipmentProfile] {
        &self.profiles
    }
}

impl Default for EquipmentCatalog {
    /// The laboratory catalog the logger ships with.
    fn default() -> Self {
        let standard_area = Bands {
            alert: Range::between(17.0, 23.0),
            action: Range::between(15.0, 25.0),
        };

        Self::new(vec![
            EquipmentProfile::new(
                "HELADERA",
                Some(Bands {
                    alert: Range::between(3.0, 7.0),
                    action: Range::between(2.0, 8.0),
                }),
                None,
            ),
            EquipmentProfile::new(
                "FREEZER",
                Some(Bands {
                    alert: Range::at_most(-17.0),
                    action: Range::at_most(-15.0),
                }),
                None,
            ),
            EquipmentProfile::new(
                "ESTUFA 30-35",
                Some(Bands {
                    alert: Range::between(31.5, 33.5),
                    action: Range::between(30.0, 35.0),
                }),
                None,
            ),
            EquipmentProfile::new(
                "ESTUFA 20-25",
                Some(Bands {
                    alert: Range::between(21.5, 23.5),
                    action: Range::between(20.0, 25.0),
                }),
                None,
            ),
            EquipmentProfile::new(
                "AREAS CALIFICADAS",
                Some(standard_area),
                Some(Bands {
                    alert: Range::at_most(62.0),
                    action: Range::at_most(65.0),
                }),
            ),
            EquipmentProfile::new(
                "AREAS NO CALIFICADAS",
                Some(standard_area),
                Some(Bands {
                    alert: Range::at_most(67.0),
                    action: Range::at_most(70.0),
                }),
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_names() {
        let catalog = EquipmentCatalog::default();
        let names: Vec<_> = catalog.names().collect();
        assert_eq!(names.len(), 6);
        assert_eq!(names[0], "HELADERA");
        assert!(catalog.contains("FREEZER"));
        assert!(!catalog.contains("heladera"));
    }

    #[test]
    fn test_profiles_match_names() {
        let catalog = EquipmentCatalog::default();
        let from_profiles: Vec<_> = catalog.profiles().iter().map(|p| p.name.as_str()).collect();
        let names: Vec<_> = catalog.names().collect();
        assert_eq!(from_profiles, names);
        assert!(catalog.profiles()[0].temperature.is_some());
    }

    #[test]
    fn test_fallback_is_in_catalog() {
        assert!(EquipmentCatalog::default().contains(FALLBACK_EQUIPMENT));
    }

    #[test]
    fn test_range_contains_inclusive() {
        let r = Range::between(2.0, 8.0);
        assert!(r.contains(2.0));
        assert!(r.contains(8.0));
        assert!(!r.contains(1.9));
        assert!(!r.contains(8.1));
    }

    #[test]
    fn test_open_range_never_triggers() {
        let r = Range::at_most(-15.0);
        assert!(r.contains(-40.0));
        assert!(!r.contains(-14.9));
        assert!(Range::default().contains(f64::MAX));
    }

    #[test]
    fn test_humidity_limits_only_for_areas() {
        let catalog = EquipmentCatalog::default();
        assert!(catalog.get("HELADERA").unwrap().humidity.is_none());
        let area = catalog.get("AREAS CALIFICADAS").unwrap();
        assert_eq!(area.humidity.unwrap().action.max, Some(65.0));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_catalog_serializes_as_list() {
        let json = serde_json::to_value(EquipmentCatalog::default()).unwrap();
        assert!(json.is_array());
        assert_eq!(json[1]["name"], "FREEZER");
        assert!(json[1]["temperature"]["alert"]["min"].is_null());
    }
}
