//! Rule-based query interpretation.
//!
//! Folds the predicate catalog over the record set in category order. Each
//! filter that fires narrows the current working set, so filters compose as
//! a logical AND. When nothing structured fires, a substring search over the
//! free-text fields of the full set takes over.

use riskmap_core::PropertyRecord;
use serde::Serialize;
use tracing::debug;

use crate::filter::{ActiveFilter, Category, Filter, Rule};
use crate::predicates::catalog;

/// Queries that bypass every predicate.
pub const SHOW_ALL_QUERIES: &[&str] = &["", "all", "reset", "clear", "show all"];

pub const SHOW_ALL_MESSAGE: &str = "Showing all locations";

/// Keyword-path result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterpretationResult<'a> {
    pub locations: Vec<&'a PropertyRecord>,
    pub filters: Vec<ActiveFilter>,
    pub interpretation: String,
}

/// Lower-case and trim a query.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_ascii_lowercase()
}

/// Interpret a free-text query against `records`.
///
/// Deterministic: the same query and records always give the same result.
pub fn interpret<'a>(query: &str, records: &'a [PropertyRecord]) -> InterpretationResult<'a> {
    let normalized = normalize_query(query);

    if SHOW_ALL_QUERIES.contains(&normalized.as_str()) {
        return InterpretationResult {
            locations: records.iter().collect(),
            filters: Vec::new(),
            interpretation: SHOW_ALL_MESSAGE.to_string(),
        };
    }

    let mut result: Vec<&PropertyRecord> = records.iter().collect();
    let mut filters = Vec::new();
    let mut fragments = Vec::new();

    for predicate in catalog() {
        if let Some(filter) = predicate.detect(&normalized) {
            result = filter.apply(result);
            fragments.push(filter.fragment);
            filters.push(filter.descriptor);
        }
    }

    if filters.is_empty() {
        let search = text_search(&normalized);
        result = search.apply(records.iter().collect());
        filters.push(search.descriptor);
    }

    let interpretation = if result.is_empty() {
        format!("No locations match: {}", query.trim())
    } else if !fragments.is_empty() {
        format!("{} locations: {}", result.len(), fragments.join(" + "))
    } else {
        format!("{} locations found", result.len())
    };

    debug!(
        query = %normalized,
        filters = ?filters.iter().map(|f| f.id.as_str()).collect::<Vec<_>>(),
        count = result.len(),
        "interpreted query"
    );

    InterpretationResult {
        locations: result,
        filters,
        interpretation,
    }
}

fn text_search(normalized: &str) -> Filter {
    Filter::new(
        Category::Search,
        "text",
        format!("Text: \"{normalized}\""),
        String::new(),
        Rule::Text(normalized.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(id: &str) -> PropertyRecord {
        PropertyRecord {
            location_id: id.into(),
            ..Default::default()
        }
    }

    fn ids(result: &InterpretationResult<'_>) -> Vec<String> {
        result.locations.iter().map(|r| r.location_id.clone()).collect()
    }

    fn filter_ids(result: &InterpretationResult<'_>) -> Vec<String> {
        result.filters.iter().map(|f| f.id.clone()).collect()
    }

    fn sample() -> Vec<PropertyRecord> {
        vec![
            PropertyRecord {
                state: "FL".into(),
                city: "Miami".into(),
                hurricane: Some(8),
                total_tiv: 75_000_000.0,
                sprinkler_status: "N".into(),
                address: "100 Ocean Dr".into(),
                named_insured: "Coastal Summit Hotels".into(),
                ..loc("LOC-1")
            },
            PropertyRecord {
                state: "FL".into(),
                city: "Tampa".into(),
                hurricane: Some(2),
                total_tiv: 5_000_000.0,
                sprinkler_status: "Y".into(),
                address: "42 Bay St".into(),
                ..loc("LOC-2")
            },
            PropertyRecord {
                state: "CA".into(),
                city: "Los Angeles".into(),
                earthquake: Some(9),
                total_tiv: 120_000_000.0,
                year_built: Some(1955),
                total_claims: 6,
                ..loc("LOC-3")
            },
            PropertyRecord {
                state: "TX".into(),
                city: "Houston".into(),
                hurricane_grade: Some("D".into()),
                year_built: Some(2012),
                potential_duplicates: vec!["LOC-9".into(), "LOC-10".into()],
                ..loc("LOC-4")
            },
        ]
    }

    #[test]
    fn empty_and_all_show_everything() {
        let records = sample();
        let empty = interpret("", &records);
        let all = interpret("all", &records);
        assert_eq!(empty, all);
        assert_eq!(empty.locations.len(), records.len());
        assert!(empty.filters.is_empty());
        assert_eq!(empty.interpretation, "Showing all locations");
    }

    #[test]
    fn reset_words_short_circuit() {
        let records = sample();
        for q in ["  RESET ", "clear", "Show All"] {
            let r = interpret(q, &records);
            assert_eq!(r.interpretation, SHOW_ALL_MESSAGE, "query {q:?}");
            assert_eq!(r.locations.len(), 4);
        }
    }

    #[test]
    fn florida_hurricane_risk() {
        let records = vec![
            PropertyRecord {
                state: "FL".into(),
                hurricane: Some(8),
                ..loc("A")
            },
            PropertyRecord {
                state: "FL".into(),
                hurricane: Some(2),
                ..loc("B")
            },
        ];
        let r = interpret("Florida hurricane risk", &records);
        assert_eq!(ids(&r), ["A"]);
        assert_eq!(filter_ids(&r), ["state-FL", "hurricane"]);
        assert!(r.interpretation.contains("FL"));
        assert!(r.interpretation.contains("high hurricane risk"));
        assert_eq!(
            r.interpretation,
            "1 locations: in FL + high hurricane risk (5+)"
        );
    }

    #[test]
    fn duplicate_locations() {
        let records = vec![
            PropertyRecord {
                potential_duplicates: vec!["X".into(), "Y".into()],
                ..loc("C")
            },
            loc("D"),
        ];
        let r = interpret("duplicate locations", &records);
        assert_eq!(ids(&r), ["C"]);
        assert_eq!(filter_ids(&r), ["duplicates"]);
    }

    #[test]
    fn filters_follow_category_order_not_query_order() {
        let records = sample();
        let r = interpret("hurricane exposure in florida", &records);
        assert_eq!(filter_ids(&r), ["state-FL", "hurricane"]);
    }

    #[test]
    fn filters_compose_as_and() {
        let records = sample();
        let r = interpret("unsprinklered high value florida", &records);
        assert_eq!(ids(&r), ["LOC-1"]);
        assert_eq!(filter_ids(&r), ["state-FL", "tiv", "unsprinklered"]);

        let r = interpret("sprinklered high value florida", &records);
        assert!(r.locations.is_empty());
    }

    #[test]
    fn grade_counts_when_score_missing() {
        let records = sample();
        let r = interpret("texas hurricane", &records);
        assert_eq!(ids(&r), ["LOC-4"]);
    }

    #[test]
    fn empty_result_message() {
        let records = sample();
        let r = interpret("  Earthquake in Florida ", &records);
        assert!(r.locations.is_empty());
        assert_eq!(r.interpretation, "No locations match: Earthquake in Florida");
        assert_eq!(filter_ids(&r), ["state-FL", "earthquake"]);
    }

    #[test]
    fn fallback_text_search_uses_full_set() {
        let records = sample();
        let r = interpret("Ocean Dr", &records);
        assert_eq!(ids(&r), ["LOC-1"]);
        assert_eq!(filter_ids(&r), ["text"]);
        assert_eq!(r.filters[0].kind, Category::Search);
        assert_eq!(r.interpretation, "1 locations found");

        let r = interpret("loc-3", &records);
        assert_eq!(ids(&r), ["LOC-3"]);

        let r = interpret("summit", &records);
        assert_eq!(ids(&r), ["LOC-1"]);
    }

    #[test]
    fn total_insured_value_is_a_value_filter() {
        let records = vec![
            PropertyRecord {
                total_tiv: 150_000_000.0,
                ..loc("BIG")
            },
            PropertyRecord {
                total_tiv: 20_000_000.0,
                ..loc("SMALL")
            },
        ];
        let r = interpret("total insured value over 100m", &records);
        assert_eq!(filter_ids(&r), ["tiv"]);
        assert_eq!(ids(&r), ["BIG"]);
        assert_eq!(r.interpretation, "1 locations: TIV over $100M");
    }

    #[test]
    fn street_name_with_peril_stem_uses_text_search() {
        let records = vec![
            PropertyRecord {
                address: "12 Hailey Rd".into(),
                ..loc("LOC-7")
            },
            loc("LOC-8"),
        ];
        let r = interpret("hailey rd", &records);
        assert_eq!(filter_ids(&r), ["text"]);
        assert_eq!(ids(&r), ["LOC-7"]);
    }

    #[test]
    fn fallback_miss_is_empty() {
        let records = sample();
        let r = interpret("zzz nothing", &records);
        assert!(r.locations.is_empty());
        assert_eq!(r.interpretation, "No locations match: zzz nothing");
    }

    #[test]
    fn several_fragments_joined() {
        let records = sample();
        let r = interpret("old buildings with claims in california", &records);
        assert_eq!(ids(&r), ["LOC-3"]);
        assert_eq!(
            r.interpretation,
            "1 locations: in CA + built before 1970 + 1+ claims"
        );
    }

    #[test]
    fn result_is_subset_of_input() {
        let records = sample();
        let queries = [
            "florida",
            "severe earthquake",
            "tiv over 100m",
            "newer buildings",
            "duplicates",
            "miami",
            "random words",
            "claims",
        ];
        for q in queries {
            let r = interpret(q, &records);
            for rec in &r.locations {
                assert!(
                    records.iter().any(|x| std::ptr::eq(x, *rec)),
                    "query {q:?} returned a record outside the input"
                );
            }
        }
    }

    #[test]
    fn interpretation_is_deterministic() {
        let records = sample();
        for q in ["florida hurricane", "high value", "stale", "x"] {
            assert_eq!(interpret(q, &records), interpret(q, &records));
        }
    }

    #[test]
    fn empty_record_set() {
        let r = interpret("florida", &[]);
        assert!(r.locations.is_empty());
        assert_eq!(r.interpretation, "No locations match: florida");
        let r = interpret("", &[]);
        assert_eq!(r.interpretation, SHOW_ALL_MESSAGE);
    }
}
