use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use crate::analysis::flow::{FlowGraph, build_flow_graph};
use crate::analysis::kde::{DensityReport, density_curves};
use crate::analysis::stats::{ScatterSummary, summarize};
use crate::analysis::terms::{TermWeight, term_frequencies};
use crate::config::DashboardConfig;
use crate::data::filter::{self, FilteredRows, PredicateSet};
use crate::data::model::{CategoricalField, NumericField, Table};
use crate::error::{EngineError, EngineResult, Outcome};

// ---------------------------------------------------------------------------
// Query – one snapshot of the controls
// ---------------------------------------------------------------------------

/// Colour-by value meaning "no grouping".
pub const NO_GROUPING: &str = "none";

/// Everything the controls currently say, as plain names and numbers.
///
/// Field names are resolved against the schema when the view is built, so a
/// stale or mistyped name turns into a typed error on the affected panel
/// rather than a crash.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardQuery {
    /// Categorical column → selected values. No values selected means the
    /// column is not filtered.
    pub selections: BTreeMap<String, Vec<String>>,
    /// Numeric column → inclusive `[lo, hi]`.
    pub ranges: BTreeMap<String, [f64; 2]>,
    pub x_axis: String,
    pub y_axis: String,
    /// Categorical column used to colour scatter points, or [`NO_GROUPING`].
    pub color_by: Option<String>,
    pub flow_fields: Vec<String>,
}

impl DashboardQuery {
    /// Unfiltered query with the configured axes and flow columns.
    pub fn from_config(config: &DashboardConfig) -> Self {
        DashboardQuery {
            selections: BTreeMap::new(),
            ranges: BTreeMap::new(),
            x_axis: config.default_x.as_str().to_string(),
            y_axis: config.default_y.as_str().to_string(),
            color_by: None,
            flow_fields: config
                .flow_fields
                .iter()
                .map(|f| f.as_str().to_string())
                .collect(),
        }
    }

    pub fn predicates(&self) -> EngineResult<PredicateSet> {
        let mut predicates = PredicateSet::new();
        for (name, values) in &self.selections {
            let field: CategoricalField = name.parse()?;
            predicates = predicates.with_selection(field, values.iter().cloned());
        }
        for (name, [lo, hi]) in &self.ranges {
            let field: NumericField = name.parse()?;
            predicates = predicates.with_range(field, *lo, *hi)?;
        }
        Ok(predicates)
    }

    pub fn axes(&self) -> EngineResult<(NumericField, NumericField)> {
        Ok((self.x_axis.parse()?, self.y_axis.parse()?))
    }

    pub fn group(&self) -> EngineResult<Option<CategoricalField>> {
        match self.color_by.as_deref() {
            None | Some(NO_GROUPING) | Some("") => Ok(None),
            Some(name) => Ok(Some(name.parse()?)),
        }
    }

    pub fn flow_order(&self) -> EngineResult<Vec<CategoricalField>> {
        let mut order: Vec<CategoricalField> = Vec::with_capacity(self.flow_fields.len());
        for name in &self.flow_fields {
            let field: CategoricalField = name.parse()?;
            if order.contains(&field) {
                return Err(EngineError::DuplicateFlowField(field));
            }
            order.push(field);
        }
        Ok(order)
    }
}

// ---------------------------------------------------------------------------
// View – everything derived from one query
// ---------------------------------------------------------------------------

/// Derived structures for every page. Each panel carries its own result so
/// one bad selection never blanks the others.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub total_rows: usize,
    /// Rows passing the filters; 0 when the filters themselves were invalid.
    pub matched_rows: usize,
    pub flow: EngineResult<FlowGraph>,
    pub scatter: EngineResult<Outcome<ScatterSummary>>,
    pub density: EngineResult<Outcome<DensityReport>>,
    pub terms: EngineResult<Outcome<Vec<TermWeight>>>,
}

impl DashboardView {
    fn failed(total_rows: usize, err: EngineError) -> Self {
        DashboardView {
            total_rows,
            matched_rows: 0,
            flow: Err(err.clone()),
            scatter: Err(err.clone()),
            density: Err(err.clone()),
            terms: Err(err),
        }
    }

    /// JSON document of every panel, as handed to an external renderer.
    pub fn to_json(&self) -> JsonValue {
        json!({
            "total_rows": self.total_rows,
            "matched_rows": self.matched_rows,
            "flow": panel_json(self.flow.as_ref().map(Outcome::Ready)),
            "scatter": panel_json(self.scatter.as_ref().map(Outcome::as_ref)),
            "density": panel_json(self.density.as_ref().map(Outcome::as_ref)),
            "terms": panel_json(self.terms.as_ref().map(Outcome::as_ref)),
        })
    }
}

fn panel_json<T: Serialize>(panel: Result<Outcome<&T>, &EngineError>) -> JsonValue {
    match panel {
        Ok(Outcome::Ready(data)) => json!({ "status": "ready", "data": data }),
        Ok(Outcome::Empty) => json!({ "status": "empty" }),
        Err(err) => json!({ "status": "error", "message": err.to_string() }),
    }
}

/// Choices offered by the filter controls.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    /// Present values per categorical column, first-seen order.
    pub categorical: Vec<(CategoricalField, Vec<String>)>,
    /// Slider bounds per numeric column; columns with no values are left out.
    pub numeric: Vec<(NumericField, (f64, f64))>,
}

// ---------------------------------------------------------------------------
// Dashboard – owns the table, answers queries
// ---------------------------------------------------------------------------

pub struct Dashboard {
    table: Arc<Table>,
    config: DashboardConfig,
}

impl Dashboard {
    pub fn new(table: Arc<Table>, config: DashboardConfig) -> Self {
        Self { table, config }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            categorical: CategoricalField::ALL
                .into_iter()
                .map(|f| (f, self.table.distinct_values(f)))
                .collect(),
            numeric: NumericField::ALL
                .into_iter()
                .filter_map(|f| self.table.numeric_extent(f).map(|range| (f, range)))
                .collect(),
        }
    }

    /// Recompute every page for `query`.
    pub fn build(&self, query: &DashboardQuery) -> DashboardView {
        let total_rows = self.table.len();
        let predicates = match query.predicates() {
            Ok(p) => p,
            Err(err) => {
                log::warn!("rejected filters: {err}");
                return DashboardView::failed(total_rows, err);
            }
        };

        let rows = filter::apply(&self.table, &predicates).ready();
        let matched_rows = rows.as_ref().map_or(0, FilteredRows::len);
        log::debug!("query matched {matched_rows} of {total_rows} rows");

        let flow = query.flow_order().map(|order| match &rows {
            Some(rows) => build_flow_graph(rows, &order),
            None => FlowGraph::default(),
        });

        let scatter = query.axes().and_then(|(x, y)| {
            let group = query.group()?;
            Ok(match &rows {
                Some(rows) => summarize(rows, x, y, group),
                None => Outcome::Empty,
            })
        });

        let density = Ok(match &rows {
            Some(rows) => density_curves(
                rows,
                self.config.density_value,
                self.config.density_group,
                &self.config.kde,
            ),
            None => Outcome::Empty,
        });

        let terms = Ok(match &rows {
            Some(rows) => term_frequencies(rows, &self.config.terms),
            None => Outcome::Empty,
        });

        DashboardView {
            total_rows,
            matched_rows,
            flow,
            scatter,
            density,
            terms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::VideoRecord;

    fn video(claim: &str, verified: &str, ban: &str, views: f64, likes: f64) -> VideoRecord {
        VideoRecord {
            claim_status: Some(claim.into()),
            verified_status: Some(verified.into()),
            author_ban_status: Some(ban.into()),
            video_duration_sec: Some(views / 10.0),
            video_view_count: Some(views),
            video_like_count: Some(likes),
            video_transcription_text: Some(format!("{claim} about rockets")),
            ..Default::default()
        }
    }

    fn dashboard() -> Dashboard {
        let table = Table::from_records(vec![
            video("claim", "not verified", "active", 100.0, 10.0),
            video("claim", "verified", "banned", 300.0, 25.0),
            video("opinion", "verified", "active", 200.0, 30.0),
            video("opinion", "not verified", "under review", 400.0, 45.0),
        ]);
        Dashboard::new(Arc::new(table), DashboardConfig::default())
    }

    #[test]
    fn default_query_builds_every_panel() {
        let d = dashboard();
        let view = d.build(&DashboardQuery::from_config(d.config()));
        assert_eq!(view.matched_rows, 4);
        assert_eq!(view.flow.as_ref().unwrap().nodes.len(), 7);
        let scatter = view.scatter.unwrap().ready().unwrap();
        assert_eq!(scatter.count(), 4);
        assert_eq!(view.density.unwrap().ready().unwrap().curves.len(), 2);
        assert_eq!(view.terms.unwrap().ready().unwrap()[0].term, "rockets");
    }

    #[test]
    fn unknown_axis_fails_only_the_scatter() {
        let d = dashboard();
        let mut query = DashboardQuery::from_config(d.config());
        query.y_axis = "video_vibes".into();
        let view = d.build(&query);
        assert_eq!(view.scatter.unwrap_err(), EngineError::UnknownField("video_vibes".into()));
        assert!(view.flow.is_ok());
    }

    #[test]
    fn categorical_axis_is_rejected() {
        let d = dashboard();
        let mut query = DashboardQuery::from_config(d.config());
        query.x_axis = "claim_status".into();
        assert!(matches!(d.build(&query).scatter, Err(EngineError::NotNumeric(_))));
    }

    #[test]
    fn bad_filter_fails_every_panel() {
        let d = dashboard();
        let mut query = DashboardQuery::from_config(d.config());
        query.ranges.insert("video_view_count".into(), [500.0, 10.0]);
        let view = d.build(&query);
        assert!(matches!(view.flow, Err(EngineError::InvalidRange { .. })));
        assert!(view.terms.is_err());
        assert_eq!(view.matched_rows, 0);
    }

    #[test]
    fn no_matching_rows_is_empty_not_error() {
        let d = dashboard();
        let mut query = DashboardQuery::from_config(d.config());
        query.ranges.insert("video_view_count".into(), [1e9, 2e9]);
        let view = d.build(&query);
        assert!(view.flow.unwrap().is_empty());
        assert!(view.scatter.unwrap().is_empty());
        assert!(view.density.unwrap().is_empty());
        assert!(view.terms.unwrap().is_empty());
    }

    #[test]
    fn duplicate_flow_column_is_rejected() {
        let d = dashboard();
        let mut query = DashboardQuery::from_config(d.config());
        query.flow_fields = vec!["claim_status".into(), "claim_status".into()];
        assert_eq!(
            d.build(&query).flow.unwrap_err(),
            EngineError::DuplicateFlowField(CategoricalField::ClaimStatus)
        );
    }

    #[test]
    fn color_by_groups_points() {
        let d = dashboard();
        let mut query = DashboardQuery::from_config(d.config());
        query.color_by = Some("author_ban_status".into());
        query
            .selections
            .insert("verified_status".into(), vec!["verified".into()]);
        let scatter = d.build(&query).scatter.unwrap().ready().unwrap();
        let groups: Vec<&str> = scatter.points.iter().filter_map(|p| p.group.as_deref()).collect();
        assert_eq!(groups, vec!["banned", "active"]);

        query.color_by = Some(NO_GROUPING.into());
        let scatter = d.build(&query).scatter.unwrap().ready().unwrap();
        assert!(scatter.points.iter().all(|p| p.group.is_none()));
    }

    #[test]
    fn filter_options_list_values_and_bounds() {
        let options = dashboard().filter_options();
        let (field, values) = &options.categorical[2];
        assert_eq!(*field, CategoricalField::AuthorBanStatus);
        assert_eq!(values, &vec!["active".to_string(), "banned".into(), "under review".into()]);
        assert!(options
            .numeric
            .contains(&(NumericField::VideoViewCount, (100.0, 400.0))));
        // no share counts in this table
        assert!(options.numeric.iter().all(|(f, _)| *f != NumericField::VideoShareCount));
    }

    #[test]
    fn json_export_marks_each_panel() {
        let d = dashboard();
        let mut query = DashboardQuery::from_config(d.config());
        query.x_axis = "nope".into();
        let doc = d.build(&query).to_json();
        assert_eq!(doc["flow"]["status"], "ready");
        assert_eq!(doc["scatter"]["status"], "error");
        assert_eq!(doc["flow"]["data"]["edges"][0]["color"], "#de8c9d");
    }
}
