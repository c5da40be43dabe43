//! Read-only portfolio store.
//!
//! Accepts both export shapes produced by the portfolio generator: the full
//! document (`{generated_at, summary, accounts, locations}`) and the bare
//! locations array written for the dashboard.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{PortfolioError, PropertyRecord};

/// States listed in [`PortfolioSummary::state_distribution`].
const TOP_STATES: usize = 15;

#[derive(Deserialize)]
#[serde(untagged)]
enum PortfolioFile {
    Document {
        #[serde(default)]
        generated_at: Option<NaiveDateTime>,
        locations: Vec<PropertyRecord>,
    },
    Locations(Vec<PropertyRecord>),
}

/// Immutable set of locations with an id index.
#[derive(Debug, Clone, Default)]
pub struct Portfolio {
    generated_at: Option<NaiveDateTime>,
    records: Vec<PropertyRecord>,
    by_id: HashMap<String, usize>,
}

/// Portfolio-wide totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub total_accounts: usize,
    pub total_locations: usize,
    pub total_tiv: f64,
    pub avg_tiv: f64,
    pub avg_locations_per_account: f64,
    pub total_claims: u64,
    pub states_represented: usize,
    /// Top states by location count, most first.
    pub state_distribution: Vec<(String, usize)>,
    pub locations_with_data_issues: usize,
    pub locations_with_alerts: usize,
    /// Share of locations without data-quality issues, in percent (one decimal).
    pub data_quality_pct: f64,
}

impl Portfolio {
    /// Build a portfolio from records, rejecting duplicate location ids.
    pub fn from_records(records: Vec<PropertyRecord>) -> Result<Self, PortfolioError> {
        let mut by_id = HashMap::with_capacity(records.len());
        for (i, rec) in records.iter().enumerate() {
            if by_id.insert(rec.location_id.clone(), i).is_some() {
                return Err(PortfolioError::DuplicateId(rec.location_id.clone()));
            }
        }
        Ok(Self {
            generated_at: None,
            records,
            by_id,
        })
    }

    /// Parse either export shape from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, PortfolioError> {
        match serde_json::from_str::<PortfolioFile>(json)? {
            PortfolioFile::Document {
                generated_at,
                locations,
            } => {
                let mut portfolio = Self::from_records(locations)?;
                portfolio.generated_at = generated_at;
                Ok(portfolio)
            }
            PortfolioFile::Locations(locations) => Self::from_records(locations),
        }
    }

    /// Load a portfolio JSON file from disk.
    pub fn load(path: &Path) -> Result<Self, PortfolioError> {
        if !path.exists() {
            return Err(PortfolioError::NotFound(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path)?;
        let portfolio = Self::from_json_str(&json)?;
        info!(
            path = %path.display(),
            count = portfolio.len(),
            "loaded portfolio"
        );
        Ok(portfolio)
    }

    pub fn records(&self) -> &[PropertyRecord] {
        &self.records
    }

    pub fn get(&self, location_id: &str) -> Option<&PropertyRecord> {
        self.by_id.get(location_id).map(|&i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn generated_at(&self) -> Option<NaiveDateTime> {
        self.generated_at
    }

    /// Compute portfolio-wide totals.
    pub fn summary(&self) -> PortfolioSummary {
        let total_locations = self.records.len();
        let accounts: HashSet<&str> = self
            .records
            .iter()
            .map(|r| r.account_id.as_str())
            .filter(|id| !id.is_empty())
            .collect();

        let total_tiv: f64 = self.records.iter().map(|r| r.total_tiv).sum();
        let total_claims: u64 = self.records.iter().map(|r| u64::from(r.total_claims)).sum();

        let mut states: BTreeMap<&str, usize> = BTreeMap::new();
        for rec in &self.records {
            *states.entry(rec.state.as_str()).or_default() += 1;
        }
        let states_represented = states.len();
        let mut state_distribution: Vec<(String, usize)> = states
            .into_iter()
            .map(|(s, n)| (s.to_string(), n))
            .collect();
        // Stable sort keeps alphabetical order among ties.
        state_distribution.sort_by(|a, b| b.1.cmp(&a.1));
        state_distribution.truncate(TOP_STATES);

        let locations_with_data_issues = self
            .records
            .iter()
            .filter(|r| !r.data_quality_issues.is_empty())
            .count();
        let locations_with_alerts = self
            .records
            .iter()
            .filter(|r| r.has_recommendations)
            .count();

        let (avg_tiv, avg_locations_per_account, data_quality_pct) = if total_locations == 0 {
            (0.0, 0.0, 0.0)
        } else {
            let clean = 1.0 - locations_with_data_issues as f64 / total_locations as f64;
            (
                total_tiv / total_locations as f64,
                if accounts.is_empty() {
                    0.0
                } else {
                    total_locations as f64 / accounts.len() as f64
                },
                (clean * 1000.0).round() / 10.0,
            )
        };

        PortfolioSummary {
            total_accounts: accounts.len(),
            total_locations,
            total_tiv,
            avg_tiv,
            avg_locations_per_account,
            total_claims,
            states_represented,
            state_distribution,
            locations_with_data_issues,
            locations_with_alerts,
            data_quality_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn rec(id: &str, account: &str, state: &str, tiv: f64) -> PropertyRecord {
        PropertyRecord {
            location_id: id.into(),
            account_id: account.into(),
            state: state.into(),
            total_tiv: tiv,
            ..Default::default()
        }
    }

    #[test]
    fn parses_full_document() {
        let json = r#"{
            "generated_at": "2025-06-01T09:30:00.123456",
            "summary": {"total_locations": 1},
            "accounts": [{"account_id": "ACC-1"}],
            "locations": [{"location_id": "LOC-1", "account_id": "ACC-1"}]
        }"#;
        let p = Portfolio::from_json_str(json).unwrap();
        assert_eq!(p.len(), 1);
        assert!(p.generated_at().is_some());
        assert_eq!(p.get("LOC-1").unwrap().account_id, "ACC-1");
    }

    #[test]
    fn parses_bare_locations_array() {
        let json = r#"[{"location_id": "A"}, {"location_id": "B"}]"#;
        let p = Portfolio::from_json_str(json).unwrap();
        assert_eq!(p.len(), 2);
        assert!(p.generated_at().is_none());
        assert!(p.get("C").is_none());
    }

    #[test]
    fn duplicate_ids_rejected() {
        let json = r#"[{"location_id": "A"}, {"location_id": "A"}]"#;
        let result = Portfolio::from_json_str(json);
        assert!(matches!(result, Err(PortfolioError::DuplicateId(id)) if id == "A"));
    }

    #[test]
    fn load_missing_file_errors() {
        let result = Portfolio::load(Path::new("/nonexistent/portfolio.json"));
        assert!(matches!(result, Err(PortfolioError::NotFound(_))));
    }

    #[test]
    fn load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"location_id": "LOC-9", "state": "TX"}}]"#).unwrap();
        let p = Portfolio::load(file.path()).unwrap();
        assert_eq!(p.records()[0].state, "TX");
    }

    #[test]
    fn invalid_json_errors() {
        let result = Portfolio::from_json_str("{not json");
        assert!(matches!(result, Err(PortfolioError::Json(_))));
    }

    #[test]
    fn summary_totals() {
        let mut a = rec("1", "ACC-1", "FL", 10.0);
        a.data_quality_issues = vec!["missing_sqft".into()];
        a.total_claims = 3;
        let mut b = rec("2", "ACC-1", "FL", 20.0);
        b.has_recommendations = true;
        let c = rec("3", "ACC-2", "CA", 30.0);
        let p = Portfolio::from_records(vec![a, b, c]).unwrap();

        let s = p.summary();
        assert_eq!(s.total_accounts, 2);
        assert_eq!(s.total_locations, 3);
        assert_eq!(s.total_tiv, 60.0);
        assert_eq!(s.avg_tiv, 20.0);
        assert_eq!(s.avg_locations_per_account, 1.5);
        assert_eq!(s.total_claims, 3);
        assert_eq!(s.states_represented, 2);
        assert_eq!(
            s.state_distribution,
            vec![("FL".to_string(), 2), ("CA".to_string(), 1)]
        );
        assert_eq!(s.locations_with_data_issues, 1);
        assert_eq!(s.locations_with_alerts, 1);
        assert_eq!(s.data_quality_pct, 66.7);
    }

    #[test]
    fn summary_of_empty_portfolio() {
        let s = Portfolio::default().summary();
        assert_eq!(s.total_locations, 0);
        assert_eq!(s.avg_tiv, 0.0);
        assert_eq!(s.data_quality_pct, 0.0);
    }
}
