//! Side-by-side comparison of both perimeters on five 0-100 axes.

use zan_dashboard_analytics_models::{
    BenchmarkResult, BenchmarkSeries, DerivedMetrics, FilterSelector, round_to,
};
use zan_dashboard_commune_models::{Dataset, Perimeter};

use crate::filter::filter;
use crate::metrics::{compute_metrics, percent_of};
use crate::{AnalyticsError, require};

/// Axis labels, in score order.
pub const AXES: [&str; 5] = [
    "Artificialisation",
    "Population",
    "Efficience",
    "Sobriété",
    "Reste disponible",
];

/// Fixed ceiling the allowance-usage rate is inverted against.
const USAGE_CEILING: f64 = 100.0;

/// `value` as a percentage of `max`, or 0 when `max` is not positive.
#[must_use]
pub fn normalize(value: f64, max: f64) -> f64 {
    percent_of(value, max)
}

/// `100 - normalize(value, max)`, or 0 when `max` is not positive.
#[must_use]
pub fn inverted(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        100.0 - normalize(value, max)
    } else {
        0.0
    }
}

/// Compares both perimeters, each narrowed by `selector`.
///
/// `dataset` looks up the loaded dataset of a perimeter.
///
/// # Errors
///
/// Returns [`AnalyticsError::DataUnavailable`] if either perimeter's
/// dataset is missing.
pub fn benchmark<'a>(
    dataset: impl Fn(Perimeter) -> Option<&'a Dataset>,
    selector: &FilterSelector,
) -> Result<BenchmarkResult, AnalyticsError> {
    let scot = require(dataset(Perimeter::Scot), Perimeter::Scot)?;
    let cc = require(dataset(Perimeter::Cc), Perimeter::Cc)?;

    let pair = [scot, cc].map(|d| (d, compute_metrics(&filter(d, selector))));
    let [(_, a), (_, b)] = &pair;
    let max_total = a.artif_total_ha.max(b.artif_total_ha);
    let max_population = population(a).max(population(b));
    let max_per_resident = a.conso_par_hab.max(b.conso_par_hab);

    let perimeters = pair
        .iter()
        .map(|(dataset, metrics)| {
            let scores = [
                normalize(metrics.artif_total_ha, max_total),
                normalize(population(metrics), max_population),
                inverted(metrics.conso_par_hab, max_per_resident),
                USAGE_CEILING - metrics.taux_enveloppe.min(USAGE_CEILING),
                percent_of(metrics.reste_disponible, metrics.enveloppe_zan),
            ]
            .map(|score| round_to(score, 1));

            BenchmarkSeries {
                perimeter: dataset.perimeter,
                name: dataset.name.clone(),
                scores,
                metrics: metrics.rounded(),
            }
        })
        .collect();

    Ok(BenchmarkResult {
        axes: AXES.iter().map(ToString::to_string).collect(),
        perimeters,
    })
}

#[allow(clippy::cast_precision_loss)] // population counts stay far below 2^52
fn population(metrics: &DerivedMetrics) -> f64 {
    metrics.population as f64
}
