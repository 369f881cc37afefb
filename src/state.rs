use std::sync::Arc;

use verification_void::config::DashboardConfig;
use verification_void::dashboard::{Dashboard, DashboardQuery, DashboardView, FilterOptions};
use verification_void::data::model::{CategoricalField, NumericField, Table};

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    ContentJourney,
    DurationDynamics,
    Correlations,
    ContentThemes,
}

impl Page {
    pub const ALL: [Page; 4] = [
        Page::ContentJourney,
        Page::DurationDynamics,
        Page::Correlations,
        Page::ContentThemes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Page::ContentJourney => "Content Journey",
            Page::DurationDynamics => "Duration Dynamics",
            Page::Correlations => "Correlations",
            Page::ContentThemes => "Content Themes",
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Engine over the loaded table (None until user loads a file).
    pub dashboard: Option<Dashboard>,

    /// Values and bounds offered by the filter widgets.
    pub options: FilterOptions,

    /// Current control values.
    pub query: DashboardQuery,

    /// Result of the last rebuild.
    pub view: Option<DashboardView>,

    pub page: Page,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let query = DashboardQuery::from_config(&config);
        Self {
            config,
            dashboard: None,
            options: FilterOptions::default(),
            query,
            view: None,
            page: Page::ContentJourney,
            status_message: None,
        }
    }

    /// Ingest a newly loaded table, reset the controls and rebuild.
    pub fn set_table(&mut self, table: Table) {
        let dashboard = Dashboard::new(Arc::new(table), self.config.clone());
        self.options = dashboard.filter_options();
        self.query = DashboardQuery::from_config(&self.config);
        self.dashboard = Some(dashboard);
        self.status_message = None;
        self.refresh();
    }

    /// Rebuild the view after any control change.
    pub fn refresh(&mut self) {
        if let Some(dashboard) = &self.dashboard {
            self.view = Some(dashboard.build(&self.query));
        }
    }

    pub fn is_selected(&self, field: CategoricalField, value: &str) -> bool {
        self.query
            .selections
            .get(field.as_str())
            .is_some_and(|selected| selected.iter().any(|v| v == value))
    }

    /// Toggle a single value in a column's selection.
    pub fn toggle_selection(&mut self, field: CategoricalField, value: &str) {
        let selected = self
            .query
            .selections
            .entry(field.as_str().to_string())
            .or_default();
        if let Some(pos) = selected.iter().position(|v| v == value) {
            selected.remove(pos);
        } else {
            selected.push(value.to_string());
        }
        self.refresh();
    }

    /// Drop a column's selection; an empty selection shows every value.
    pub fn clear_selection(&mut self, field: CategoricalField) {
        self.query.selections.remove(field.as_str());
        self.refresh();
    }

    /// Current `[lo, hi]` for a numeric column: the active range, or the
    /// column's full extent when it is not filtered.
    pub fn range(&self, field: NumericField) -> Option<[f64; 2]> {
        self.query
            .ranges
            .get(field.as_str())
            .copied()
            .or_else(|| self.extent(field).map(|(lo, hi)| [lo, hi]))
    }

    pub fn extent(&self, field: NumericField) -> Option<(f64, f64)> {
        self.options
            .numeric
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, extent)| *extent)
    }

    /// Filter a numeric column to `[lo, hi]`. Bounds are reordered if the
    /// widgets crossed.
    pub fn set_range(&mut self, field: NumericField, lo: f64, hi: f64) {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        self.query
            .ranges
            .insert(field.as_str().to_string(), [lo, hi]);
        self.refresh();
    }

    pub fn reset_range(&mut self, field: NumericField) {
        self.query.ranges.remove(field.as_str());
        self.refresh();
    }

    pub fn set_axes(&mut self, x: NumericField, y: NumericField) {
        self.query.x_axis = x.as_str().to_string();
        self.query.y_axis = y.as_str().to_string();
        self.refresh();
    }

    pub fn set_color_by(&mut self, field: Option<CategoricalField>) {
        self.query.color_by = field.map(|f| f.as_str().to_string());
        self.refresh();
    }

    /// Clear every filter, keep axes and page.
    pub fn reset_filters(&mut self) {
        self.query.selections.clear();
        self.query.ranges.clear();
        self.refresh();
    }
}
