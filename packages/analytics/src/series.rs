//! Time-series builders: annual evolution, allowance trajectory and
//! densification ratios.

use zan_dashboard_analytics_models::{
    AnnualEvolution, Densification, DensificationPeriod, Trajectory, TrajectoryPoint, round_to,
};
use zan_dashboard_commune_models::{YearPair, to_hectares};

use crate::filter::Selection;
use crate::metrics::{compute_metrics, per_new_resident, sum_m2};

/// First year of the 2021-2031 allowance period.
pub const TRAJECTORY_START: u16 = 2021;
/// Last year of the 2021-2031 allowance period.
pub const TRAJECTORY_END: u16 = 2031;
/// Target consumption per new resident, in m². Informative only.
pub const DENSIFICATION_OBJECTIVE_M2: f64 = 200.0;

/// Years covered by the census population delta (2015-2021).
const CENSUS_YEARS: f64 = 6.0;
/// Years covered by the recent windows (2021-2024).
const RECENT_YEARS: f64 = 3.0;

fn window_ha(selection: &Selection<'_>, pair: YearPair) -> f64 {
    to_hectares(sum_m2(&selection.records, |r| r.consumption(pair)))
}

/// Yearly consumption, one point per window column present in the source.
///
/// Absent windows are skipped, never reported as zero.
#[must_use]
pub fn annual_evolution(selection: &Selection<'_>) -> AnnualEvolution {
    let (periodes, consommations): (Vec<String>, Vec<f64>) = selection
        .columns
        .year_pairs
        .iter()
        .map(|pair| (pair.label(), round_to(window_ha(selection, *pair), 2)))
        .unzip();

    AnnualEvolution {
        periodes,
        consommations,
    }
}

/// Cumulative consumption since 2021 against a linear use of the
/// allowance over 2021-2031.
///
/// The measured curve starts at 0 in 2021 and gains one point per recent
/// window present in the source.
#[must_use]
pub fn trajectory(selection: &Selection<'_>) -> Trajectory {
    let enveloppe_zan = compute_metrics(selection).enveloppe_zan;

    let mut cumulative = 0.0;
    let mut actual = vec![TrajectoryPoint {
        year: TRAJECTORY_START,
        hectares: 0.0,
    }];
    for pair in YearPair::recent().filter(|p| selection.columns.has_year_pair(*p)) {
        cumulative += window_ha(selection, pair);
        actual.push(TrajectoryPoint {
            year: pair.end_year(),
            hectares: round_to(cumulative, 2),
        });
    }

    let span = f64::from(TRAJECTORY_END - TRAJECTORY_START);
    let theoretical = (TRAJECTORY_START..=TRAJECTORY_END)
        .map(|year| TrajectoryPoint {
            year,
            hectares: round_to(
                enveloppe_zan * f64::from(year - TRAJECTORY_START) / span,
                2,
            ),
        })
        .collect();

    Trajectory {
        enveloppe_zan: round_to(enveloppe_zan, 2),
        actual,
        theoretical,
    }
}

/// Land consumed per new resident over 2015-2021 (measured population)
/// and 2021-2024 (population extrapolated from the 2015-2021 trend).
#[must_use]
#[allow(clippy::cast_precision_loss)] // population counts stay far below 2^52
pub fn densification(selection: &Selection<'_>) -> Densification {
    let measured_delta = selection
        .records
        .iter()
        .map(|r| r.population_delta)
        .sum::<i64>() as f64;

    let census_m2 = sum_m2(&selection.records, |r| r.window_m2(YearPair::census_interval()));
    let recent_m2 = sum_m2(&selection.records, |r| r.window_m2(YearPair::recent()));
    let estimated_delta = measured_delta * RECENT_YEARS / CENSUS_YEARS;

    Densification {
        periods: vec![
            period("2015-2021", census_m2, measured_delta, false),
            period("2021-2024", recent_m2, estimated_delta, true),
        ],
        objective_m2_per_new_resident: DENSIFICATION_OBJECTIVE_M2,
    }
}

fn period(label: &str, square_meters: f64, population_delta: f64, estimated: bool) -> DensificationPeriod {
    DensificationPeriod {
        period: label.to_string(),
        artif_ha: round_to(to_hectares(square_meters), 2),
        population_delta: round_to(population_delta, 2),
        estimated,
        m2_per_new_resident: round_to(per_new_resident(square_meters, population_delta), 0),
    }
}
