//! End-to-end tests for the query engine: filtering, flow graphs,
//! correlation and the per-panel dashboard view, on small in-memory tables.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use verification_void::analysis::flow::build_flow_graph;
use verification_void::analysis::stats::{Correlation, summarize};
use verification_void::config::DashboardConfig;
use verification_void::dashboard::{Dashboard, DashboardQuery};
use verification_void::data::filter::{self, FilteredRows, PredicateSet};
use verification_void::data::model::{CategoricalField, NumericField, Table, VideoRecord};
use verification_void::error::{EngineError, Outcome};

const CLAIM: CategoricalField = CategoricalField::ClaimStatus;
const VERIFIED: CategoricalField = CategoricalField::VerifiedStatus;
const BAN: CategoricalField = CategoricalField::AuthorBanStatus;

fn video(claim: Option<&str>, verified: Option<&str>) -> VideoRecord {
    VideoRecord {
        claim_status: claim.map(str::to_string),
        verified_status: verified.map(str::to_string),
        ..Default::default()
    }
}

fn pairs(rows: &[(&str, &str)]) -> Table {
    Table::from_records(rows.iter().map(|&(c, v)| video(Some(c), Some(v))).collect())
}

/// Twelve videos covering every ban status, with engagement numbers.
fn mixed_table() -> Table {
    let bans = ["active", "under review", "banned"];
    let records = (0..12)
        .map(|i| VideoRecord {
            claim_status: Some(if i % 2 == 0 { "claim" } else { "opinion" }.into()),
            verified_status: Some(if i % 5 == 0 { "verified" } else { "not verified" }.into()),
            author_ban_status: Some(bans[i % 3].into()),
            video_duration_sec: Some(5.0 + i as f64),
            video_view_count: Some(100.0 * i as f64),
            video_like_count: Some(10.0 * i as f64 + (i % 4) as f64),
            ..Default::default()
        })
        .collect();
    Table::from_records(records)
}

fn matched(table: &Table, predicates: &PredicateSet) -> BTreeSet<usize> {
    match filter::apply(table, predicates) {
        Outcome::Ready(rows) => rows.indices().iter().copied().collect(),
        Outcome::Empty => BTreeSet::new(),
    }
}

fn node_values(table: &Table, order: &[CategoricalField]) -> Vec<String> {
    build_flow_graph(&FilteredRows::all(table), order)
        .nodes
        .into_iter()
        .map(|n| n.value)
        .collect()
}

#[test]
fn flow_build_is_idempotent() {
    let table = mixed_table();
    let rows = FilteredRows::all(&table);
    let order = [CLAIM, VERIFIED, BAN];
    assert_eq!(build_flow_graph(&rows, &order), build_flow_graph(&rows, &order));
}

#[test]
fn combined_filters_intersect() {
    let table = mixed_table();
    let p1 = PredicateSet::new().with_selection(CLAIM, ["claim"]);
    let p2 = PredicateSet::new()
        .with_selection(BAN, ["active", "banned"])
        .with_range(NumericField::VideoViewCount, 200.0, 900.0)
        .unwrap();

    let both = matched(&table, &p1.and(&p2));
    let expected: BTreeSet<usize> = matched(&table, &p1)
        .intersection(&matched(&table, &p2))
        .copied()
        .collect();
    assert_eq!(both, expected);
    assert_eq!(both, BTreeSet::from([2, 6, 8]));
}

#[test]
fn empty_selection_keeps_every_ban_status() {
    let table = mixed_table();
    assert_eq!(table.distinct_values(BAN).len(), 3);

    let predicates = PredicateSet::new().with_selection(BAN, Vec::<String>::new());
    let rows = filter::apply(&table, &predicates).ready().unwrap();
    assert_eq!(rows.len(), table.len());
    assert_eq!(rows.indices(), (0..12).collect::<Vec<_>>().as_slice());
}

#[test]
fn flow_conserves_rows_with_both_values() {
    let table = Table::from_records(vec![
        video(Some("claim"), Some("verified")),
        video(Some("opinion"), None),
        video(None, Some("verified")),
        video(Some("opinion"), Some("not verified")),
        video(Some("claim"), Some("not verified")),
    ]);
    let graph = build_flow_graph(&FilteredRows::all(&table), &[CLAIM, VERIFIED]);
    let complete = table
        .records()
        .iter()
        .filter(|r| r.categorical(CLAIM).is_some() && r.categorical(VERIFIED).is_some())
        .count();
    assert_eq!(graph.total_weight_between(CLAIM, VERIFIED), complete);
    assert_eq!(complete, 3);
}

#[test]
fn constant_y_has_undefined_correlation() {
    let records = (0..6)
        .map(|i| VideoRecord {
            video_view_count: Some(i as f64 * 50.0),
            video_like_count: Some(7.0),
            ..Default::default()
        })
        .collect();
    let table = Table::from_records(records);
    let summary = summarize(
        &FilteredRows::all(&table),
        NumericField::VideoViewCount,
        NumericField::VideoLikeCount,
        None,
    )
    .ready()
    .unwrap();
    assert_eq!(summary.count(), 6);
    assert_eq!(summary.correlation, Correlation::Undefined);
    assert_eq!(summary.correlation.percent(), None);
}

#[test]
fn nodes_follow_first_seen_order() {
    let table = pairs(&[
        ("claim", "verified"),
        ("opinion", "verified"),
        ("claim", "not verified"),
    ]);
    assert_eq!(
        node_values(&table, &[CLAIM, VERIFIED]),
        ["claim", "opinion", "verified", "not verified"]
    );
}

#[test]
fn five_row_journey() {
    let table = pairs(&[
        ("claim", "verified"),
        ("claim", "not verified"),
        ("opinion", "verified"),
        ("opinion", "verified"),
        ("claim", "not verified"),
    ]);
    let graph = build_flow_graph(&FilteredRows::all(&table), &[CLAIM, VERIFIED]);
    assert_eq!(graph.nodes.len(), 4);
    assert_eq!(graph.edges.iter().map(|e| e.weight).sum::<usize>(), 5);

    let counts: BTreeMap<(&str, &str), usize> = graph
        .edges
        .iter()
        .map(|e| {
            let from = graph.nodes[e.source].value.as_str();
            let to = graph.nodes[e.target].value.as_str();
            ((from, to), e.weight)
        })
        .collect();
    assert_eq!(
        counts,
        BTreeMap::from([
            (("claim", "not verified"), 2),
            (("claim", "verified"), 1),
            (("opinion", "verified"), 2),
        ])
    );
}

#[test]
fn dashboard_reports_each_panel_separately() {
    let dashboard = Dashboard::new(Arc::new(mixed_table()), DashboardConfig::default());
    let mut query = DashboardQuery::from_config(dashboard.config());

    let view = dashboard.build(&query);
    assert_eq!(view.matched_rows, 12);
    assert!(!view.flow.as_ref().unwrap().is_empty());
    assert!(matches!(view.scatter, Ok(Outcome::Ready(_))));

    // a bad axis only breaks the scatter panel
    query.x_axis = "claim_status".into();
    let view = dashboard.build(&query);
    assert_eq!(
        view.scatter.unwrap_err(),
        EngineError::NotNumeric("claim_status".into())
    );
    assert!(view.flow.is_ok());
    assert!(view.density.is_ok());

    // filters nothing survives: empty, not an error
    query.x_axis = "video_view_count".into();
    query.selections.insert("claim_status".into(), vec!["satire".into()]);
    let view = dashboard.build(&query);
    assert_eq!(view.matched_rows, 0);
    assert!(view.flow.as_ref().unwrap().is_empty());
    assert!(matches!(view.scatter, Ok(Outcome::Empty)));
    assert!(matches!(view.terms, Ok(Outcome::Empty)));

    let json = view.to_json();
    assert_eq!(json["scatter"]["status"], "empty");
    assert_eq!(json["total_rows"], 12);
}

#[test]
fn unknown_filter_field_fails_every_panel() {
    let dashboard = Dashboard::new(Arc::new(mixed_table()), DashboardConfig::default());
    let mut query = DashboardQuery::from_config(dashboard.config());
    query.ranges.insert("video_rating".into(), [0.0, 1.0]);

    let view = dashboard.build(&query);
    let expected = EngineError::UnknownField("video_rating".into());
    assert_eq!(view.flow.as_ref().unwrap_err(), &expected);
    assert_eq!(view.terms.as_ref().unwrap_err(), &expected);
    assert_eq!(view.to_json()["density"]["status"], "error");
}
