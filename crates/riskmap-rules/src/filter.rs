//! Filters produced by predicates and the record tests behind them.

use riskmap_core::{Peril, PropertyRecord};
use serde::Serialize;

/// Predicate families, in the order the interpreter applies them.
///
/// The derived `Ord` is the application order. Since filters compose as a
/// sequential AND, this order decides the order of `ActiveFilter`s and of the
/// interpretation fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Geography,
    Peril,
    Value,
    Protection,
    Construction,
    Age,
    Status,
    Claims,
    Occupancy,
    Account,
    DataQuality,
    /// Full-text fallback. Never part of the catalog.
    Search,
}

impl Category {
    pub const ORDER: [Category; 11] = [
        Category::Geography,
        Category::Peril,
        Category::Value,
        Category::Protection,
        Category::Construction,
        Category::Age,
        Category::Status,
        Category::Claims,
        Category::Occupancy,
        Category::Account,
        Category::DataQuality,
    ];
}

/// Presentation descriptor for a filter that fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveFilter {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: Category,
}

/// ISO construction classes as `(code, name)`.
pub const CONSTRUCTION_CLASSES: &[(&str, &str)] = &[
    ("1", "Frame"),
    ("2", "Joisted Masonry"),
    ("3", "Non-Combustible"),
    ("4", "Masonry Non-Combustible"),
    ("5", "Modified Fire Resistive"),
    ("6", "Fire Resistive"),
];

/// Test applied to a single record.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    State(&'static str),
    City(&'static str),
    PerilAtLeast(Peril, u8),
    TivAtLeast(f64),
    Sprinkler(&'static str),
    ProtectionClass(&'static [&'static str]),
    /// ISO construction codes.
    Construction(&'static [&'static str]),
    BuiltBefore(i32),
    BuiltAfter(i32),
    BuiltSince(i32),
    Recommendations,
    ClaimsAtLeast(u32),
    /// Lower-case substrings of the occupancy description.
    Occupancy(&'static [&'static str]),
    /// Lower-case substring of the account name or named insured.
    Account(String),
    Duplicates,
    Conflicts,
    StaleInspection,
    MissingData,
    Enrichment,
    QualityBelow(i32),
    /// Lower-case substring of address, city, insured, account or id.
    Text(String),
}

impl Rule {
    pub fn matches(&self, rec: &PropertyRecord) -> bool {
        match self {
            Rule::State(code) => rec.state.eq_ignore_ascii_case(code),
            Rule::City(city) => rec.city.eq_ignore_ascii_case(city),
            Rule::PerilAtLeast(peril, min) => rec.peril_score(*peril).is_some_and(|s| s >= *min),
            Rule::TivAtLeast(min) => rec.total_tiv >= *min,
            Rule::Sprinkler(status) => rec.sprinkler_status.eq_ignore_ascii_case(status),
            Rule::ProtectionClass(classes) => classes
                .iter()
                .any(|c| rec.fire_protection_class.eq_ignore_ascii_case(c)),
            Rule::Construction(codes) => construction_code(rec).is_some_and(|c| codes.contains(&c)),
            Rule::BuiltBefore(year) => rec.year_built.is_some_and(|y| y < *year),
            Rule::BuiltAfter(year) => rec.year_built.is_some_and(|y| y > *year),
            Rule::BuiltSince(year) => rec.year_built.is_some_and(|y| y >= *year),
            Rule::Recommendations => rec.has_recommendations,
            Rule::ClaimsAtLeast(min) => rec.total_claims >= *min,
            Rule::Occupancy(needles) => {
                let occupancy = rec.occupancy_desc.to_ascii_lowercase();
                needles.iter().any(|n| occupancy.contains(n))
            }
            Rule::Account(name) => {
                rec.account_name.to_ascii_lowercase().contains(name.as_str())
                    || rec.named_insured.to_ascii_lowercase().contains(name.as_str())
            }
            Rule::Duplicates => !rec.potential_duplicates.is_empty(),
            Rule::Conflicts => !rec.conflicting_fields.is_empty(),
            Rule::StaleInspection => rec.has_issue("stale_inspection"),
            Rule::MissingData => rec
                .data_quality_issues
                .iter()
                .any(|i| i.starts_with("missing_")),
            Rule::Enrichment => !rec.enrichment_opportunities.is_empty(),
            Rule::QualityBelow(max) => rec.data_quality_score.is_some_and(|s| s < *max),
            Rule::Text(needle) => [
                rec.address.as_str(),
                rec.city.as_str(),
                rec.named_insured.as_str(),
                rec.account_name.as_str(),
                rec.location_id.as_str(),
            ]
            .iter()
            .any(|field| field.to_ascii_lowercase().contains(needle.as_str())),
        }
    }
}

/// ISO code of a record, resolving the class name when the code is absent.
fn construction_code(rec: &PropertyRecord) -> Option<&'static str> {
    match rec.construction_code.as_deref() {
        Some(code) => CONSTRUCTION_CLASSES
            .iter()
            .find(|(c, _)| *c == code.trim())
            .map(|(c, _)| *c),
        None => CONSTRUCTION_CLASSES
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(rec.construction_type.trim()))
            .map(|(c, _)| *c),
    }
}

/// A predicate that fired for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub descriptor: ActiveFilter,
    /// Interpretation text, e.g. `"high hurricane risk (5+)"`.
    pub fragment: String,
    pub rule: Rule,
}

impl Filter {
    pub fn new(
        kind: Category,
        id: impl Into<String>,
        label: impl Into<String>,
        fragment: impl Into<String>,
        rule: Rule,
    ) -> Self {
        Self {
            descriptor: ActiveFilter {
                id: id.into(),
                label: label.into(),
                kind,
            },
            fragment: fragment.into(),
            rule,
        }
    }

    /// Narrow `records` to those the rule accepts, keeping their order.
    pub fn apply<'a>(&self, mut records: Vec<&'a PropertyRecord>) -> Vec<&'a PropertyRecord> {
        records.retain(|rec| self.rule.matches(rec));
        records
    }
}
