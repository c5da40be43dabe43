//! Property location records as exported by the portfolio generator.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Hazard types carried on every location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Peril {
    Hurricane,
    Earthquake,
    Flood,
    Wildfire,
    Tornado,
    Surge,
    Terrorism,
}

impl Peril {
    pub const ALL: [Peril; 7] = [
        Peril::Hurricane,
        Peril::Earthquake,
        Peril::Flood,
        Peril::Wildfire,
        Peril::Tornado,
        Peril::Surge,
        Peril::Terrorism,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hurricane => "hurricane",
            Self::Earthquake => "earthquake",
            Self::Flood => "flood",
            Self::Wildfire => "wildfire",
            Self::Tornado => "tornado",
            Self::Surge => "surge",
            Self::Terrorism => "terrorism",
        }
    }
}

/// Map a letter grade to the top score of its band.
///
/// Grades are banded A (1-2), B (3-4), C (5-6), D (7-8), F (9-10).
pub fn grade_to_score(grade: &str) -> Option<u8> {
    match grade.trim().to_ascii_uppercase().as_str() {
        "A" => Some(2),
        "B" => Some(4),
        "C" => Some(6),
        "D" => Some(8),
        "F" => Some(10),
        _ => None,
    }
}

/// One insured location.
///
/// Read-only to everything downstream of the loader. Only `location_id` is
/// required; every other field defaults when the export omits it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub location_id: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub named_insured: String,
    #[serde(default)]
    pub building_name: String,

    // Address
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    /// Geocoded position kept even when `lat`/`lon` are flagged missing.
    #[serde(default)]
    pub lat_actual: Option<f64>,
    #[serde(default)]
    pub lon_actual: Option<f64>,

    // Building
    #[serde(default)]
    pub construction_code: Option<String>,
    #[serde(default)]
    pub construction_type: String,
    #[serde(default)]
    pub year_built: Option<i32>,
    #[serde(default)]
    pub stories: Option<u32>,
    #[serde(default)]
    pub sq_footage: Option<u64>,
    #[serde(default)]
    pub occupancy_desc: String,

    // Protection
    #[serde(default)]
    pub sprinkler_status: String,
    #[serde(default)]
    pub fire_protection_class: String,

    // Values
    #[serde(default)]
    pub total_tiv: f64,
    #[serde(default)]
    pub building_value: f64,
    #[serde(default)]
    pub contents_value: f64,
    #[serde(default)]
    pub bii_value: f64,

    // Peril scores (1-10)
    #[serde(default)]
    pub hurricane: Option<u8>,
    #[serde(default)]
    pub earthquake: Option<u8>,
    #[serde(default)]
    pub flood_score: Option<u8>,
    #[serde(default)]
    pub wildfire: Option<u8>,
    #[serde(default)]
    pub tornado_hail: Option<u8>,
    #[serde(default)]
    pub surge_risk: Option<u8>,
    #[serde(default)]
    pub terrorism: Option<u8>,

    // Peril grades (A-F)
    #[serde(default)]
    pub hurricane_grade: Option<String>,
    #[serde(default)]
    pub earthquake_grade: Option<String>,
    #[serde(default)]
    pub flood_grade: Option<String>,
    #[serde(default)]
    pub wildfire_grade: Option<String>,
    #[serde(default)]
    pub tornado_grade: Option<String>,
    #[serde(default)]
    pub flood_zone: Option<String>,

    // Claims
    #[serde(default)]
    pub total_claims: u32,
    #[serde(default)]
    pub total_incurred: f64,

    // Risk control
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub has_recommendations: bool,
    #[serde(default)]
    pub rc_category: String,
    #[serde(default)]
    pub rc_title: String,

    // Data quality
    #[serde(default)]
    pub data_quality_score: Option<i32>,
    #[serde(default)]
    pub data_quality_issues: Vec<String>,
    #[serde(default, alias = "duplicate_candidates")]
    pub potential_duplicates: Vec<String>,
    #[serde(default, alias = "data_conflicts")]
    pub conflicting_fields: Vec<String>,
    #[serde(default)]
    pub enrichment_opportunities: Vec<String>,
    #[serde(default)]
    pub last_inspection_date: Option<NaiveDate>,
}

impl PropertyRecord {
    /// Score for a peril: the numeric field when present, else the grade band.
    pub fn peril_score(&self, peril: Peril) -> Option<u8> {
        let (score, grade) = match peril {
            Peril::Hurricane => (self.hurricane, self.hurricane_grade.as_deref()),
            Peril::Earthquake => (self.earthquake, self.earthquake_grade.as_deref()),
            Peril::Flood => (self.flood_score, self.flood_grade.as_deref()),
            Peril::Wildfire => (self.wildfire, self.wildfire_grade.as_deref()),
            Peril::Tornado => (self.tornado_hail, self.tornado_grade.as_deref()),
            Peril::Surge => (self.surge_risk, None),
            Peril::Terrorism => (self.terrorism, None),
        };
        score.or_else(|| grade.and_then(grade_to_score))
    }

    /// Map position as `(lat, lon)`, falling back to the geocoded pair.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => match (self.lat_actual, self.lon_actual) {
                (Some(lat), Some(lon)) => Some((lat, lon)),
                _ => None,
            },
        }
    }

    pub fn has_issue(&self, issue: &str) -> bool {
        self.data_quality_issues.iter().any(|i| i == issue)
    }
}

/// Accept `"Y"`/`"N"` (as exported) as well as JSON booleans.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Text(s)) => matches!(s.trim(), "Y" | "y" | "Yes" | "yes" | "true"),
        None => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_location_parses() {
        let json = r#"{
            "location_id": "LOC-1",
            "account_id": "ACC-1",
            "account_name": "Summit Logistics Inc.",
            "city": "Miami",
            "state": "FL",
            "lat": null,
            "lon": null,
            "lat_actual": 25.76,
            "lon_actual": -80.19,
            "construction_code": "3",
            "total_tiv": 12500000.0,
            "hurricane": 8,
            "hurricane_grade": "D",
            "has_recommendations": "Y",
            "data_quality_issues": ["missing_coordinates"],
            "last_inspection_date": "2024-03-01",
            "some_future_field": {"ignored": true}
        }"#;
        let rec: PropertyRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.location_id, "LOC-1");
        assert!(rec.has_recommendations);
        assert_eq!(rec.coordinates(), Some((25.76, -80.19)));
        assert!(rec.has_issue("missing_coordinates"));
        assert_eq!(
            rec.last_inspection_date,
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
    }

    #[test]
    fn flag_accepts_bool_and_text() {
        let yes: PropertyRecord =
            serde_json::from_str(r#"{"location_id": "a", "has_recommendations": true}"#).unwrap();
        let no: PropertyRecord =
            serde_json::from_str(r#"{"location_id": "b", "has_recommendations": "N"}"#).unwrap();
        let null: PropertyRecord =
            serde_json::from_str(r#"{"location_id": "c", "has_recommendations": null}"#).unwrap();
        assert!(yes.has_recommendations);
        assert!(!no.has_recommendations);
        assert!(!null.has_recommendations);
    }

    #[test]
    fn numeric_score_wins_over_grade() {
        let rec = PropertyRecord {
            hurricane: Some(3),
            hurricane_grade: Some("F".into()),
            ..Default::default()
        };
        assert_eq!(rec.peril_score(Peril::Hurricane), Some(3));
    }

    #[test]
    fn grade_used_when_score_missing() {
        let rec = PropertyRecord {
            earthquake_grade: Some("d".into()),
            ..Default::default()
        };
        assert_eq!(rec.peril_score(Peril::Earthquake), Some(8));
        assert_eq!(rec.peril_score(Peril::Terrorism), None);
    }

    #[test]
    fn unknown_grade_is_none() {
        assert_eq!(grade_to_score("E"), None);
        assert_eq!(grade_to_score(" a "), Some(2));
    }

    #[test]
    fn duplicate_alias() {
        let rec: PropertyRecord = serde_json::from_str(
            r#"{"location_id": "x", "duplicate_candidates": ["y", "z"]}"#,
        )
        .unwrap();
        assert_eq!(rec.potential_duplicates.len(), 2);
    }
}
