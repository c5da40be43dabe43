//! Predicate library: the ordered catalog of keyword-triggered filters.
//!
//! Every detector is a pure function of the normalized (trimmed, ASCII
//! lower-cased) query. It returns the [`Filter`] to apply, or `None` when its
//! keywords are absent. Keyword tables are scanned in declaration order and
//! the first hit wins, so a detector contributes at most one filter.
//!
//! Place-name and adjective collisions are resolved by keyword choice rather
//! than by precedence: geography matches whole words only, and the age
//! detector never fires on a bare "new" (which would otherwise catch
//! "New York" or "New Orleans").

use std::sync::LazyLock;

use regex::Regex;
use riskmap_core::Peril;

use crate::filter::{CONSTRUCTION_CLASSES, Category, Filter, Rule};

/// Default TIV threshold when the query asks for high value without a number.
pub const DEFAULT_TIV_THRESHOLD: f64 = 50_000_000.0;

/// Peril score required by default.
pub const BASE_PERIL_THRESHOLD: u8 = 5;

/// Peril score required when the query contains an intensity word.
pub const ESCALATED_PERIL_THRESHOLD: u8 = 7;

/// Year before which a building counts as "old".
pub const OLD_BUILDING_YEAR: i32 = 1970;

/// Year from which a building counts as "newer".
pub const NEW_BUILDING_YEAR: i32 = 2000;

/// Claims required when the query asks for many claims without a number.
pub const HIGH_CLAIMS_THRESHOLD: u32 = 5;

/// Data-quality score below which a record counts as poor quality.
pub const POOR_QUALITY_SCORE: i32 = 70;

const INTENSITY_WORDS: &[&str] = &["high", "severe", "extreme"];

static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d+(?:\.\d+)?)\s*(?:m|mm|million)\b").expect("valid amount regex")
});

static BEFORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:built\s+before|before|pre)[\s-]*(\d{4})\b").expect("valid before regex")
});

static AFTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:built\s+after|after|since|post)[\s-]*(\d{4})\b").expect("valid after regex")
});

static CLAIMS_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d+)\s*\+?\s*(?:or more\s+)?claims?\b").expect("valid claims regex")
});

static ACCOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(account|insured|client)\s*[:=]?\s+(.+)$").expect("valid account regex")
});

/// One entry of the catalog.
pub struct Predicate {
    pub name: &'static str,
    pub category: Category,
    detect: fn(&str) -> Option<Filter>,
}

impl Predicate {
    /// Run the trigger against a normalized query.
    pub fn detect(&self, query: &str) -> Option<Filter> {
        (self.detect)(query)
    }
}

static CATALOG: [Predicate; 24] = [
    Predicate { name: "state", category: Category::Geography, detect: detect_state },
    Predicate { name: "city", category: Category::Geography, detect: detect_city },
    Predicate { name: "hurricane", category: Category::Peril, detect: |q| detect_peril(q, Peril::Hurricane) },
    Predicate { name: "earthquake", category: Category::Peril, detect: |q| detect_peril(q, Peril::Earthquake) },
    Predicate { name: "flood", category: Category::Peril, detect: |q| detect_peril(q, Peril::Flood) },
    Predicate { name: "wildfire", category: Category::Peril, detect: |q| detect_peril(q, Peril::Wildfire) },
    Predicate { name: "tornado", category: Category::Peril, detect: |q| detect_peril(q, Peril::Tornado) },
    Predicate { name: "surge", category: Category::Peril, detect: |q| detect_peril(q, Peril::Surge) },
    Predicate { name: "terrorism", category: Category::Peril, detect: |q| detect_peril(q, Peril::Terrorism) },
    Predicate { name: "tiv", category: Category::Value, detect: detect_value },
    Predicate { name: "sprinkler", category: Category::Protection, detect: detect_sprinkler },
    Predicate { name: "protection-class", category: Category::Protection, detect: detect_protection_class },
    Predicate { name: "construction", category: Category::Construction, detect: detect_construction },
    Predicate { name: "age", category: Category::Age, detect: detect_age },
    Predicate { name: "recommendations", category: Category::Status, detect: detect_recommendations },
    Predicate { name: "claims", category: Category::Claims, detect: detect_claims },
    Predicate { name: "occupancy", category: Category::Occupancy, detect: detect_occupancy },
    Predicate { name: "account", category: Category::Account, detect: detect_account },
    Predicate { name: "duplicates", category: Category::DataQuality, detect: detect_duplicates },
    Predicate { name: "conflicts", category: Category::DataQuality, detect: detect_conflicts },
    Predicate { name: "stale-inspections", category: Category::DataQuality, detect: detect_stale },
    Predicate { name: "missing-data", category: Category::DataQuality, detect: detect_missing },
    Predicate { name: "enrichment", category: Category::DataQuality, detect: detect_enrichment },
    Predicate { name: "data-quality", category: Category::DataQuality, detect: detect_low_quality },
];

/// The catalog in application order.
pub fn catalog() -> impl Iterator<Item = &'static Predicate> {
    CATALOG.iter()
}

// ── Keyword helpers ──

/// True when `needle` occurs in `haystack` bounded by non-alphanumerics.
pub(crate) fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(i, _)| {
        let before = haystack[..i].chars().next_back();
        let after = haystack[i + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn contains_any(query: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| query.contains(n))
}

fn contains_any_word(query: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| contains_word(query, n))
}

fn slug(s: &str) -> String {
    s.to_ascii_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// `50_000_000.0` → `"50"`, `2_500_000.0` → `"2.5"`.
fn millions(amount: f64) -> String {
    format!("{}", amount / 1_000_000.0)
}

// ── Geography ──

const STATES: &[(&str, &str)] = &[
    ("new york", "NY"),
    ("new jersey", "NJ"),
    ("new mexico", "NM"),
    ("north carolina", "NC"),
    ("south carolina", "SC"),
    ("west virginia", "WV"),
    ("florida", "FL"),
    ("california", "CA"),
    ("texas", "TX"),
    ("louisiana", "LA"),
    ("georgia", "GA"),
    ("illinois", "IL"),
    ("massachusetts", "MA"),
    ("pennsylvania", "PA"),
    ("connecticut", "CT"),
    ("tennessee", "TN"),
    ("michigan", "MI"),
    ("minnesota", "MN"),
    ("ohio", "OH"),
    ("indiana", "IN"),
    ("wisconsin", "WI"),
    ("missouri", "MO"),
    ("washington", "WA"),
    ("oregon", "OR"),
    ("colorado", "CO"),
    ("arizona", "AZ"),
    ("nevada", "NV"),
    ("utah", "UT"),
    ("alabama", "AL"),
    ("mississippi", "MS"),
    ("virginia", "VA"),
    ("oklahoma", "OK"),
    ("kansas", "KS"),
    ("nebraska", "NE"),
    ("iowa", "IA"),
    ("arkansas", "AR"),
    ("kentucky", "KY"),
    ("maryland", "MD"),
];

const CITIES: &[(&str, &str)] = &[
    ("new york city", "New York"),
    ("nyc", "New York"),
    ("manhattan", "Manhattan"),
    ("brooklyn", "Brooklyn"),
    ("boston", "Boston"),
    ("philadelphia", "Philadelphia"),
    ("fort lauderdale", "Fort Lauderdale"),
    ("miami", "Miami"),
    ("tampa", "Tampa"),
    ("orlando", "Orlando"),
    ("jacksonville", "Jacksonville"),
    ("atlanta", "Atlanta"),
    ("charlotte", "Charlotte"),
    ("nashville", "Nashville"),
    ("chicago", "Chicago"),
    ("detroit", "Detroit"),
    ("minneapolis", "Minneapolis"),
    ("houston", "Houston"),
    ("dallas", "Dallas"),
    ("austin", "Austin"),
    ("new orleans", "New Orleans"),
    ("los angeles", "Los Angeles"),
    ("san francisco", "San Francisco"),
    ("san diego", "San Diego"),
    ("seattle", "Seattle"),
    ("portland", "Portland"),
    ("denver", "Denver"),
    ("phoenix", "Phoenix"),
    ("las vegas", "Las Vegas"),
];

fn detect_state(q: &str) -> Option<Filter> {
    let (_, code) = STATES.iter().find(|(kw, _)| contains_word(q, kw))?;
    Some(Filter::new(
        Category::Geography,
        format!("state-{code}"),
        format!("State: {code}"),
        format!("in {code}"),
        Rule::State(*code),
    ))
}

fn detect_city(q: &str) -> Option<Filter> {
    let (_, city) = CITIES.iter().find(|(kw, _)| contains_word(q, kw))?;
    Some(Filter::new(
        Category::Geography,
        format!("city-{}", slug(city)),
        format!("City: {city}"),
        format!("in {city}"),
        Rule::City(*city),
    ))
}

// ── Peril ──

/// Peril triggers as `(substrings, whole words)`.
///
/// Short stems live in the whole-word list so that "hailey rd" or "surgery
/// center" stay free-text queries.
fn peril_keywords(peril: Peril) -> (&'static [&'static str], &'static [&'static str]) {
    match peril {
        Peril::Hurricane => (&["hurricane", "windstorm", "named storm"], &[]),
        Peril::Earthquake => (&["earthquake", "seismic"], &["quake", "quakes"]),
        Peril::Flood => (&["flood"], &[]),
        Peril::Wildfire => (&["wildfire", "wild fire", "brush fire", "bushfire"], &[]),
        Peril::Tornado => (&["tornado"], &["hail", "hailstorm", "hailstorms"]),
        Peril::Surge => (&["storm surge"], &["surge"]),
        Peril::Terrorism => (&["terrorism", "terrorist"], &["terror"]),
    }
}

fn peril_name(peril: Peril) -> &'static str {
    match peril {
        Peril::Tornado => "tornado/hail",
        Peril::Surge => "storm surge",
        other => other.as_str(),
    }
}

fn detect_peril(q: &str, peril: Peril) -> Option<Filter> {
    let (substrings, words) = peril_keywords(peril);
    if !contains_any(q, substrings) && !contains_any_word(q, words) {
        return None;
    }
    let escalated = contains_any_word(q, INTENSITY_WORDS);
    let (threshold, severity) = if escalated {
        (ESCALATED_PERIL_THRESHOLD, "severe")
    } else {
        (BASE_PERIL_THRESHOLD, "high")
    };
    let name = peril_name(peril);
    Some(Filter::new(
        Category::Peril,
        peril.as_str(),
        format!("{} ≥ {threshold}", capitalize(name)),
        format!("{severity} {name} risk ({threshold}+)"),
        Rule::PerilAtLeast(peril, threshold),
    ))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

// ── Value ──

fn detect_value(q: &str) -> Option<Filter> {
    let explicit = AMOUNT_RE
        .captures(q)
        .and_then(|c| c[1].parse::<f64>().ok())
        .map(|n| n * 1_000_000.0);
    let keyword = contains_any(
        q,
        &["high value", "high-value", "insured value", "valuable", "expensive"],
    )
        || contains_word(q, "tiv");
    if explicit.is_none() && !keyword {
        return None;
    }
    let threshold = explicit.unwrap_or(DEFAULT_TIV_THRESHOLD);
    let m = millions(threshold);
    Some(Filter::new(
        Category::Value,
        "tiv",
        format!("TIV ≥ ${m}M"),
        format!("TIV over ${m}M"),
        Rule::TivAtLeast(threshold),
    ))
}

// ── Protection ──

fn detect_sprinkler(q: &str) -> Option<Filter> {
    if contains_any(
        q,
        &["unsprinklered", "no sprinkler", "without sprinkler", "non-sprinklered", "not sprinklered"],
    ) {
        return Some(Filter::new(
            Category::Protection,
            "unsprinklered",
            "Sprinklered: No",
            "unsprinklered",
            Rule::Sprinkler("N"),
        ));
    }
    if contains_any(q, &["partial sprinkler", "partially sprinklered"]) {
        return Some(Filter::new(
            Category::Protection,
            "partial-sprinkler",
            "Sprinklered: Partial",
            "partially sprinklered",
            Rule::Sprinkler("Partial"),
        ));
    }
    if q.contains("sprinkler") {
        return Some(Filter::new(
            Category::Protection,
            "sprinklered",
            "Sprinklered: Yes",
            "sprinklered",
            Rule::Sprinkler("Y"),
        ));
    }
    None
}

fn detect_protection_class(q: &str) -> Option<Filter> {
    if !contains_any(q, &["poor protection", "protection class", "weak protection"]) {
        return None;
    }
    Some(Filter::new(
        Category::Protection,
        "protection-class",
        "Protection class: P4-P5, PP3-PP4",
        "poor fire protection class",
        Rule::ProtectionClass(&["P4", "P5", "PP3", "PP4"]),
    ))
}

// ── Construction ──

struct ConstructionKeyword {
    keywords: &'static [&'static str],
    codes: &'static [&'static str],
    label: &'static str,
}

/// Longest phrases first: "fire resistive" is a suffix of "modified fire
/// resistive" and "non-combustible" of "masonry non-combustible".
const CONSTRUCTION_KEYWORDS: &[ConstructionKeyword] = &[
    ConstructionKeyword {
        keywords: &["modified fire resistive", "modified fire-resistive"],
        codes: &["5"],
        label: "modified fire resistive",
    },
    ConstructionKeyword {
        keywords: &["fire resistive", "fire-resistive"],
        codes: &["6"],
        label: "fire resistive",
    },
    ConstructionKeyword {
        keywords: &["masonry non-combustible", "masonry noncombustible"],
        codes: &["4"],
        label: "masonry non-combustible",
    },
    ConstructionKeyword {
        keywords: &["joisted masonry"],
        codes: &["2"],
        label: "joisted masonry",
    },
    ConstructionKeyword {
        keywords: &["non-combustible", "noncombustible"],
        codes: &["3"],
        label: "non-combustible",
    },
    ConstructionKeyword {
        keywords: &["combustible"],
        codes: &["1", "2"],
        label: "combustible",
    },
    ConstructionKeyword {
        keywords: &["wood frame", "frame"],
        codes: &["1"],
        label: "frame",
    },
];

fn detect_construction(q: &str) -> Option<Filter> {
    let entry = CONSTRUCTION_KEYWORDS
        .iter()
        .find(|e| contains_any_word(q, e.keywords))?;
    let names: Vec<&str> = entry
        .codes
        .iter()
        .filter_map(|code| CONSTRUCTION_CLASSES.iter().find(|(c, _)| c == code))
        .map(|(_, name)| *name)
        .collect();
    Some(Filter::new(
        Category::Construction,
        format!("construction-{}", entry.codes.join("-")),
        format!("Construction: {}", names.join(", ")),
        format!("{} construction", entry.label),
        Rule::Construction(entry.codes),
    ))
}

// ── Age ──

fn detect_age(q: &str) -> Option<Filter> {
    if let Some(year) = BEFORE_RE.captures(q).and_then(|c| c[1].parse::<i32>().ok()) {
        return Some(built_before(year));
    }
    if let Some(year) = AFTER_RE.captures(q).and_then(|c| c[1].parse::<i32>().ok()) {
        return Some(Filter::new(
            Category::Age,
            "built-after",
            format!("Built after {year}"),
            format!("built after {year}"),
            Rule::BuiltAfter(year),
        ));
    }
    if contains_any_word(q, &["old", "older", "aging", "historic"]) {
        return Some(built_before(OLD_BUILDING_YEAR));
    }
    if contains_any_word(
        q,
        &["newer", "new construction", "new buildings", "newly built", "modern"],
    ) {
        return Some(Filter::new(
            Category::Age,
            "built-since",
            format!("Built {NEW_BUILDING_YEAR} or later"),
            format!("built {NEW_BUILDING_YEAR} or later"),
            Rule::BuiltSince(NEW_BUILDING_YEAR),
        ));
    }
    None
}

fn built_before(year: i32) -> Filter {
    Filter::new(
        Category::Age,
        "built-before",
        format!("Built before {year}"),
        format!("built before {year}"),
        Rule::BuiltBefore(year),
    )
}

// ── Status ──

fn detect_recommendations(q: &str) -> Option<Filter> {
    if !contains_any(q, &["recommendation", "risk control", "alert", "open rc"]) {
        return None;
    }
    Some(Filter::new(
        Category::Status,
        "recommendations",
        "Open risk-control recommendations",
        "with risk-control recommendations",
        Rule::Recommendations,
    ))
}

// ── Claims ──

fn detect_claims(q: &str) -> Option<Filter> {
    if !contains_any(q, &["claim", "loss history", "losses"]) {
        return None;
    }
    let min = CLAIMS_COUNT_RE
        .captures(q)
        .and_then(|c| c[1].parse::<u32>().ok())
        .unwrap_or_else(|| {
            if contains_any_word(q, &["high", "many", "frequent", "severe", "multiple"]) {
                HIGH_CLAIMS_THRESHOLD
            } else {
                1
            }
        });
    Some(Filter::new(
        Category::Claims,
        "claims",
        format!("Claims ≥ {min}"),
        format!("{min}+ claims"),
        Rule::ClaimsAtLeast(min),
    ))
}

// ── Occupancy ──

const OCCUPANCIES: &[(&[&str], &[&str], &str)] = &[
    (&["hospital"], &["hospital"], "hospital"),
    (&["medical", "healthcare", "clinic"], &["medical", "clinic", "hospital", "urgent care"], "healthcare"),
    (&["cold storage"], &["cold storage"], "cold storage"),
    (&["warehouse", "distribution"], &["warehouse", "distribution"], "warehouse"),
    (&["office"], &["office"], "office"),
    (&["retail", "shopping", "mercantile", "store"], &["retail", "mercantile", "shopping", "strip mall"], "retail"),
    (&["university", "college", "campus", "dorm"], &["college", "univ", "dormitory"], "higher education"),
    (&["school"], &["school"], "school"),
    (&["restaurant", "fast food"], &["restaurant", "fast food", "bar/tavern"], "restaurant"),
    (&["hotel", "motel", "resort", "hospitality"], &["hotel", "motel", "resort"], "hospitality"),
    (&["manufacturing", "industrial", "factory"], &["manufacturing", "industrial"], "industrial"),
    (&["parking"], &["parking"], "parking"),
    (&["fire station", "police"], &["fire station", "police station"], "public safety"),
    (&["government", "municipal"], &["government"], "government"),
];

fn detect_occupancy(q: &str) -> Option<Filter> {
    let (_, needles, label) = OCCUPANCIES.iter().find(|(kws, _, _)| contains_any(q, kws))?;
    Some(Filter::new(
        Category::Occupancy,
        format!("occupancy-{}", slug(label)),
        format!("Occupancy: {}", capitalize(label)),
        format!("{label} occupancy"),
        Rule::Occupancy(*needles),
    ))
}

// ── Account ──

fn detect_account(q: &str) -> Option<Filter> {
    let caps = ACCOUNT_RE.captures(q)?;
    let name = caps[2].trim().to_string();
    if name.is_empty() {
        return None;
    }
    // "total insured value" names the TIV, not an insured.
    if &caps[1] == "insured"
        && name
            .split_whitespace()
            .next()
            .is_some_and(|w| w.starts_with("value"))
    {
        return None;
    }
    Some(Filter::new(
        Category::Account,
        "account",
        format!("Account: {name}"),
        format!("account \"{name}\""),
        Rule::Account(name),
    ))
}

// ── Data quality ──

fn detect_duplicates(q: &str) -> Option<Filter> {
    contains_any(q, &["duplicate", "dupe"]).then(|| {
        Filter::new(
            Category::DataQuality,
            "duplicates",
            "Potential duplicates",
            "potential duplicates",
            Rule::Duplicates,
        )
    })
}

fn detect_conflicts(q: &str) -> Option<Filter> {
    q.contains("conflict").then(|| {
        Filter::new(
            Category::DataQuality,
            "conflicts",
            "Conflicting source data",
            "conflicting source data",
            Rule::Conflicts,
        )
    })
}

fn detect_stale(q: &str) -> Option<Filter> {
    contains_any(q, &["stale", "outdated", "overdue inspection", "overdue"]).then(|| {
        Filter::new(
            Category::DataQuality,
            "stale-inspections",
            "Stale inspections",
            "stale inspections",
            Rule::StaleInspection,
        )
    })
}

fn detect_missing(q: &str) -> Option<Filter> {
    contains_any(q, &["missing", "incomplete"]).then(|| {
        Filter::new(
            Category::DataQuality,
            "missing-data",
            "Missing attributes",
            "missing attributes",
            Rule::MissingData,
        )
    })
}

fn detect_enrichment(q: &str) -> Option<Filter> {
    q.contains("enrich").then(|| {
        Filter::new(
            Category::DataQuality,
            "enrichment",
            "Enrichment opportunities",
            "enrichment opportunities",
            Rule::Enrichment,
        )
    })
}

fn detect_low_quality(q: &str) -> Option<Filter> {
    contains_any(q, &["data quality", "poor quality", "low quality", "bad data"]).then(|| {
        Filter::new(
            Category::DataQuality,
            "data-quality",
            format!("Data quality < {POOR_QUALITY_SCORE}"),
            "poor data quality",
            Rule::QualityBelow(POOR_QUALITY_SCORE),
        )
    })
}
