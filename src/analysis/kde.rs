use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::stats::{mean, median};
use crate::data::filter::FilteredRows;
use crate::data::model::{CategoricalField, NumericField};
use crate::error::Outcome;

/// Sampling and smoothing knobs for the density comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdeSettings {
    /// Evenly spaced evaluation points per curve.
    pub points: usize,
    /// Kernel width as a multiple of the group's sample standard deviation.
    pub bandwidth_factor: f64,
}

impl Default for KdeSettings {
    fn default() -> Self {
        Self {
            points: 500,
            bandwidth_factor: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityCurve {
    pub group: String,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub median: f64,
    /// Samples the curve was estimated from.
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OmitReason {
    /// A density needs at least two samples.
    TooFewPoints,
    /// Every sample has the same value.
    NoSpread,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OmittedGroup {
    pub group: String,
    pub count: usize,
    pub reason: OmitReason,
}

/// One density curve per group, plus the groups that could not get one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityReport {
    pub value_field: NumericField,
    pub group_field: CategoricalField,
    pub curves: Vec<DensityCurve>,
    pub omitted: Vec<OmittedGroup>,
}

/// Gaussian kernel density of `value` for each distinct `group`, groups in
/// first-seen order. Rows missing either column are skipped.
pub fn density_curves(
    rows: &FilteredRows<'_>,
    value: NumericField,
    group: CategoricalField,
    settings: &KdeSettings,
) -> Outcome<DensityReport> {
    let mut samples: Vec<(&str, Vec<f64>)> = Vec::new();
    for record in rows.iter() {
        let (Some(g), Some(v)) = (record.categorical(group), record.numeric(value)) else {
            continue;
        };
        match samples.iter_mut().find(|(name, _)| *name == g) {
            Some((_, values)) => values.push(v),
            None => samples.push((g, vec![v])),
        }
    }
    if samples.is_empty() {
        return Outcome::Empty;
    }

    let mut curves = Vec::new();
    let mut omitted = Vec::new();
    for (name, values) in samples {
        match estimate(&values, settings) {
            Ok((xs, ys)) => curves.push(DensityCurve {
                group: name.to_string(),
                xs,
                ys,
                median: median(&values).unwrap_or_default(),
                count: values.len(),
            }),
            Err(reason) => {
                log::warn!(
                    "no density for {group}={name} ({} samples): {reason:?}",
                    values.len()
                );
                omitted.push(OmittedGroup {
                    group: name.to_string(),
                    count: values.len(),
                    reason,
                });
            }
        }
    }

    Outcome::Ready(DensityReport {
        value_field: value,
        group_field: group,
        curves,
        omitted,
    })
}

/// Evaluate the density on `settings.points` points from the sample min to
/// its max.
fn estimate(values: &[f64], settings: &KdeSettings) -> Result<(Vec<f64>, Vec<f64>), OmitReason> {
    if values.len() < 2 {
        return Err(OmitReason::TooFewPoints);
    }
    let bandwidth = settings.bandwidth_factor * sample_std(values);
    if !(bandwidth.is_finite() && bandwidth > 0.0) {
        return Err(OmitReason::NoSpread);
    }

    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let xs = linspace(lo, hi, settings.points);

    let norm = 1.0 / (values.len() as f64 * bandwidth * (2.0 * PI).sqrt());
    let ys = xs
        .iter()
        .map(|&x| {
            norm * values
                .iter()
                .map(|&v| {
                    let z = (x - v) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>()
        })
        .collect();
    Ok((xs, ys))
}

/// Standard deviation with Bessel's correction.
fn sample_std(values: &[f64]) -> f64 {
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() as f64 - 1.0)).sqrt()
}

/// `n` evenly spaced values from `start` to `stop`, both included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            out[n - 1] = stop;
            out
        }
    }
}
