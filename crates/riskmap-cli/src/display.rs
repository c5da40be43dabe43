//! Terminal rendering for portfolio summaries and search outcomes.
//!
//! Cards are grouped into sections in the same `label value` layout for
//! every record. Sections without data are skipped.

use std::fmt::Display;

use riskmap_agent::{SearchMode, SearchOutcome};
use riskmap_core::{MapView, Peril, Portfolio, PropertyRecord};

const MAX_LIST_ITEMS: usize = 20;

// ── Public API ──

pub fn print_summary(portfolio: &Portfolio, json: bool) -> anyhow::Result<()> {
    let summary = portfolio.summary();
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("=== Portfolio ===");
    if let Some(at) = portfolio.generated_at() {
        println!("generated {}", at.format("%Y-%m-%d %H:%M"));
    }
    println!();

    println!("Totals");
    field("accounts", summary.total_accounts);
    field("locations", summary.total_locations);
    field("total TIV", money(summary.total_tiv));
    field("average TIV", money(summary.avg_tiv));
    field(
        "locations per account",
        format!("{:.1}", summary.avg_locations_per_account),
    );
    field("claims", summary.total_claims);
    println!();

    println!("Data Quality");
    field("locations with issues", summary.locations_with_data_issues);
    field("locations with alerts", summary.locations_with_alerts);
    field("clean", format!("{:.1}%", summary.data_quality_pct));
    println!();

    if !summary.state_distribution.is_empty() {
        println!("States ({})", summary.states_represented);
        for (state, count) in &summary.state_distribution {
            let state = if state.is_empty() { "-" } else { state.as_str() };
            field(state, count);
        }
        println!();
    }
    Ok(())
}

pub fn print_outcome(outcome: &SearchOutcome<'_>, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    println!("=== {} ===", outcome.interpretation);
    println!("{} search #{}", mode_label(outcome.mode), outcome.sequence);
    println!();

    if !outcome.filters.is_empty() {
        println!("Filters");
        for f in &outcome.filters {
            println!("  {:<26} {}", f.id, f.label);
        }
        println!();
    }

    println!("Locations ({})", outcome.locations.len());
    for rec in outcome.locations.iter().take(MAX_LIST_ITEMS) {
        println!("  {}", location_line(rec));
    }
    if outcome.locations.len() > MAX_LIST_ITEMS {
        println!("    ... and {} more", outcome.locations.len() - MAX_LIST_ITEMS);
    }
    println!();

    if let Some(rec) = outcome.selected {
        print_location_card(rec);
    }

    if !outcome.suggestions.is_empty() {
        println!("Suggestions");
        for s in &outcome.suggestions {
            println!("  - {s}");
        }
        println!();
    }

    println!("Map");
    println!("  {}", view_line(&outcome.view));
    Ok(())
}

// ── Location card ──

fn print_location_card(rec: &PropertyRecord) {
    println!("--- {} ---", rec.location_id);

    section(
        "Identity",
        &[
            ("account", text(&rec.account_name)),
            ("named insured", text(&rec.named_insured)),
            ("building", text(&rec.building_name)),
            ("address", text(&rec.address)),
            ("city", text(&place(rec))),
            (
                "coordinates",
                rec.coordinates().map(|(lat, lon)| format!("{lat:.4}, {lon:.4}")),
            ),
        ],
    );
    section(
        "Building",
        &[
            ("construction", text(&rec.construction_type)),
            ("year built", rec.year_built.map(|y| y.to_string())),
            ("stories", rec.stories.map(|s| s.to_string())),
            ("square feet", rec.sq_footage.map(|s| s.to_string())),
            ("occupancy", text(&rec.occupancy_desc)),
            ("sprinklered", text(&rec.sprinkler_status)),
            ("protection class", text(&rec.fire_protection_class)),
        ],
    );
    section(
        "Values",
        &[
            ("total TIV", nonzero(rec.total_tiv)),
            ("building", nonzero(rec.building_value)),
            ("contents", nonzero(rec.contents_value)),
            ("business interruption", nonzero(rec.bii_value)),
        ],
    );

    let perils: Vec<(&str, Option<String>)> = Peril::ALL
        .iter()
        .map(|&p| (p.as_str(), rec.peril_score(p).map(|s| format!("{s}/10"))))
        .collect();
    section("Perils", &perils);

    section(
        "Claims",
        &[
            ("claims", Some(rec.total_claims.to_string())),
            ("incurred", nonzero(rec.total_incurred)),
            ("recommendations", rec.has_recommendations.then(|| rec.rc_title.clone())),
        ],
    );
    section(
        "Data Quality",
        &[
            ("score", rec.data_quality_score.map(|s| s.to_string())),
            ("issues", list(&rec.data_quality_issues)),
            ("possible duplicates", list(&rec.potential_duplicates)),
            ("conflicts", list(&rec.conflicting_fields)),
            ("enrichment", list(&rec.enrichment_opportunities)),
            (
                "last inspection",
                rec.last_inspection_date.map(|d| d.to_string()),
            ),
        ],
    );
}

fn section(header: &str, rows: &[(&str, Option<String>)]) {
    if rows.iter().all(|(_, v)| v.is_none()) {
        return;
    }
    println!("{header}");
    for (label, value) in rows {
        if let Some(value) = value {
            field(label, value);
        }
    }
    println!();
}

fn field(label: &str, value: impl Display) {
    println!("  {:<26} {}", label, value);
}

// ── Formatting ──

fn mode_label(mode: SearchMode) -> &'static str {
    match mode {
        SearchMode::Keyword => "keyword",
        SearchMode::Agent => "agent",
        SearchMode::Fallback => "fallback",
    }
}

fn location_line(rec: &PropertyRecord) -> String {
    let mut line = format!("{:<12} {:<28} {:>10}", rec.location_id, place(rec), money(rec.total_tiv));
    let high: Vec<String> = Peril::ALL
        .iter()
        .filter_map(|&p| rec.peril_score(p).filter(|&s| s >= 5).map(|s| format!("{} {s}", p.as_str())))
        .collect();
    if !high.is_empty() {
        line.push_str("  ");
        line.push_str(&high.join(", "));
    }
    line
}

fn view_line(view: &MapView) -> String {
    match view {
        MapView::Bounds { bounds, max_zoom } => format!(
            "fit N {:.3} S {:.3} E {:.3} W {:.3} (max zoom {max_zoom})",
            bounds.north, bounds.south, bounds.east, bounds.west
        ),
        MapView::Center { lat, lon, zoom } => format!("center {lat:.4}, {lon:.4} (zoom {zoom})"),
        MapView::Unchanged => "unchanged".to_string(),
    }
}

fn place(rec: &PropertyRecord) -> String {
    match (rec.city.is_empty(), rec.state.is_empty()) {
        (false, false) => format!("{}, {}", rec.city, rec.state),
        (false, true) => rec.city.clone(),
        (true, false) => rec.state.clone(),
        (true, true) => "-".to_string(),
    }
}

/// Compact dollar amount: `$1.3B`, `$75.0M`, `$750K`, `$900`.
fn money(amount: f64) -> String {
    let abs = amount.abs();
    if abs >= 1e9 {
        format!("${:.1}B", amount / 1e9)
    } else if abs >= 1e6 {
        format!("${:.1}M", amount / 1e6)
    } else if abs >= 1e3 {
        format!("${:.0}K", amount / 1e3)
    } else {
        format!("${amount:.0}")
    }
}

fn text(s: &str) -> Option<String> {
    (!s.trim().is_empty()).then(|| s.to_string())
}

fn nonzero(amount: f64) -> Option<String> {
    (amount != 0.0).then(|| money(amount))
}

fn list(items: &[String]) -> Option<String> {
    (!items.is_empty()).then(|| items.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskmap_core::ViewportBounds;

    #[test]
    fn money_scales() {
        assert_eq!(money(1_300_000_000.0), "$1.3B");
        assert_eq!(money(75_000_000.0), "$75.0M");
        assert_eq!(money(750_000.0), "$750K");
        assert_eq!(money(900.0), "$900");
    }

    #[test]
    fn place_handles_missing_parts() {
        let mut rec = PropertyRecord::default();
        assert_eq!(place(&rec), "-");
        rec.state = "FL".into();
        assert_eq!(place(&rec), "FL");
        rec.city = "Miami".into();
        assert_eq!(place(&rec), "Miami, FL");
    }

    #[test]
    fn location_line_lists_high_perils() {
        let rec = PropertyRecord {
            location_id: "LOC-1".into(),
            city: "Miami".into(),
            state: "FL".into(),
            total_tiv: 75_000_000.0,
            hurricane: Some(8),
            earthquake: Some(1),
            ..Default::default()
        };
        let line = location_line(&rec);
        assert!(line.starts_with("LOC-1"));
        assert!(line.contains("Miami, FL"));
        assert!(line.contains("$75.0M"));
        assert!(line.ends_with("hurricane 8"));
    }

    #[test]
    fn view_lines() {
        assert_eq!(view_line(&MapView::Unchanged), "unchanged");
        let view = MapView::Bounds {
            bounds: ViewportBounds {
                north: 1.0,
                south: 0.0,
                east: 1.0,
                west: 0.0,
            },
            max_zoom: 12,
        };
        assert_eq!(
            view_line(&view),
            "fit N 1.000 S 0.000 E 1.000 W 0.000 (max zoom 12)"
        );
    }

    #[test]
    fn empty_values_hidden() {
        assert_eq!(text("  "), None);
        assert_eq!(nonzero(0.0), None);
        assert_eq!(list(&[]), None);
        assert_eq!(list(&["a".into(), "b".into()]).as_deref(), Some("a, b"));
    }
}
