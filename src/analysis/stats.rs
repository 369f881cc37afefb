use serde::Serialize;

use crate::data::filter::FilteredRows;
use crate::data::model::{CategoricalField, NumericField, extent};
use crate::error::Outcome;

/// Pearson correlation between the two chosen axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", content = "percent", rename_all = "snake_case")]
pub enum Correlation {
    /// Coefficient × 100.
    Percent(f64),
    /// Fewer than two points, or one axis does not vary.
    Undefined,
}

impl Correlation {
    pub fn percent(self) -> Option<f64> {
        match self {
            Correlation::Percent(p) => Some(p),
            Correlation::Undefined => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    /// Value of the colour-by column, when one was requested and present.
    pub group: Option<String>,
    /// Transcript shown when hovering the point.
    pub hover_text: Option<String>,
}

/// Everything the correlation explorer shows for one filter state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSummary {
    pub x_field: NumericField,
    pub y_field: NumericField,
    pub group_field: Option<CategoricalField>,
    pub points: Vec<ScatterPoint>,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub correlation: Correlation,
}

impl ScatterSummary {
    /// Rows that made it onto the plot.
    pub fn count(&self) -> usize {
        self.points.len()
    }
}

/// Scatter coordinates, axis extents and correlation for `x` against `y`.
///
/// Rows missing either coordinate are dropped first; if none remain the
/// result is [`Outcome::Empty`].
pub fn summarize(
    rows: &FilteredRows<'_>,
    x: NumericField,
    y: NumericField,
    group: Option<CategoricalField>,
) -> Outcome<ScatterSummary> {
    let points: Vec<ScatterPoint> = rows
        .iter()
        .filter_map(|record| {
            let (px, py) = (record.numeric(x)?, record.numeric(y)?);
            Some(ScatterPoint {
                x: px,
                y: py,
                group: group
                    .and_then(|g| record.categorical(g))
                    .map(str::to_string),
                hover_text: record.transcription().map(str::to_string),
            })
        })
        .collect();

    let (Some(x_range), Some(y_range)) = (
        extent(points.iter().map(|p| p.x)),
        extent(points.iter().map(|p| p.y)),
    ) else {
        return Outcome::Empty;
    };

    let correlation = if x_range.0 == x_range.1 || y_range.0 == y_range.1 {
        Correlation::Undefined
    } else {
        let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
        pearson(&xs, &ys)
    };

    log::debug!(
        "scatter {x} vs {y}: {} points, correlation {correlation:?}",
        points.len()
    );

    Outcome::Ready(ScatterSummary {
        x_field: x,
        y_field: y,
        group_field: group,
        points,
        x_range,
        y_range,
        correlation,
    })
}

/// Pearson product-moment correlation of two equal-length samples,
/// as a percentage.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Correlation {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return Correlation::Undefined;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let mean_x = mean(xs);
    let mean_y = mean(ys);

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (&a, &b) in xs.iter().zip(ys) {
        let (dx, dy) = (a - mean_x, b - mean_y);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return Correlation::Undefined;
    }
    let r = sxy / (sxx.sqrt() * syy.sqrt());
    if r.is_finite() {
        Correlation::Percent(r.clamp(-1.0, 1.0) * 100.0)
    } else {
        Correlation::Undefined
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median of a sample; the mean of the middle pair for even sizes.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
