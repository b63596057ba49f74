#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filter selectors and result types for the ZAN metrics engine.
//!
//! Every builder in `zan_dashboard_analytics` returns one of the types
//! defined here. They serialize to the JSON shapes the dashboard charts
//! consume, with hectare figures already rounded for display.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use zan_dashboard_commune_models::{Destination, Perimeter};

/// Rounds `value` to `decimals` decimal places.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Narrows a dataset by department, commune and typology.
///
/// Each set left empty means "no restriction". A row is kept when it
/// matches every non-empty set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelector {
    /// Department ids to keep.
    #[serde(default)]
    pub departments: BTreeSet<String>,
    /// Commune ids to keep.
    #[serde(default)]
    pub communes: BTreeSet<String>,
    /// Typology codes or labels to keep.
    #[serde(default)]
    pub typologies: BTreeSet<String>,
}

impl FilterSelector {
    /// Whether no restriction is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.departments.is_empty() && self.communes.is_empty() && self.typologies.is_empty()
    }

    /// Restricts to the given departments.
    #[must_use]
    pub fn with_departments<I, S>(mut self, departments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.departments = departments.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts to the given communes.
    #[must_use]
    pub fn with_communes<I, S>(mut self, communes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.communes = communes.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts to the given typologies (codes or labels).
    #[must_use]
    pub fn with_typologies<I, S>(mut self, typologies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.typologies = typologies.into_iter().map(Into::into).collect();
        self
    }
}

/// Allowance-usage tier of a territory.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskStatus {
    /// Less than 30 % of the allowance consumed.
    Conforme,
    /// Between 30 % (inclusive) and 50 %.
    Vigilance,
    /// 50 % or more.
    Critique,
}

impl RiskStatus {
    /// Rate (percent) from which a territory is under vigilance.
    pub const VIGILANCE_THRESHOLD: f64 = 30.0;
    /// Rate (percent) from which a territory is critical.
    pub const CRITICAL_THRESHOLD: f64 = 50.0;

    /// Classifies an allowance-usage rate, in percent.
    #[must_use]
    pub fn from_rate(rate: f64) -> Self {
        if rate >= Self::CRITICAL_THRESHOLD {
            Self::Critique
        } else if rate >= Self::VIGILANCE_THRESHOLD {
            Self::Vigilance
        } else {
            Self::Conforme
        }
    }
}

/// Scalar aggregate metrics of a (possibly filtered) dataset.
///
/// Surfaces are in hectares, except `conso_par_hab` which is in m² per
/// new resident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// NAF consumption 2009-2024.
    pub artif_total_ha: f64,
    /// Artificialized for housing.
    pub artif_habitat_ha: f64,
    /// Artificialized for economic activity.
    pub artif_activites_ha: f64,
    /// Artificialized for mixed use.
    pub artif_mixte_ha: f64,
    /// Artificialized for roads.
    pub artif_routes_ha: f64,
    /// Artificialized for railways.
    pub artif_ferroviaire_ha: f64,
    /// Artificialized for an unknown destination.
    pub artif_inconnu_ha: f64,
    /// 2021 population.
    pub population: i64,
    /// Population change 2015-2021.
    pub evolution_pop: i64,
    /// Consumption per new resident, in m².
    pub conso_par_hab: f64,
    /// Consumption over the 2011-2021 reference decade.
    pub conso_reference: f64,
    /// Allowance for 2021-2031: half the reference decade.
    pub enveloppe_zan: f64,
    /// Consumption counted against the allowance so far.
    pub conso_2021_2024: f64,
    /// Allowance left, never negative.
    pub reste_disponible: f64,
    /// Share of the allowance consumed, in percent.
    pub taux_enveloppe: f64,
    /// Number of communes aggregated.
    pub nb_communes: usize,
    /// Tier of `taux_enveloppe`.
    pub statut: RiskStatus,
}

impl DerivedMetrics {
    /// Returns a copy rounded for display: hectares and rates to 2
    /// decimals, consumption per resident to 0.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            artif_total_ha: round_to(self.artif_total_ha, 2),
            artif_habitat_ha: round_to(self.artif_habitat_ha, 2),
            artif_activites_ha: round_to(self.artif_activites_ha, 2),
            artif_mixte_ha: round_to(self.artif_mixte_ha, 2),
            artif_routes_ha: round_to(self.artif_routes_ha, 2),
            artif_ferroviaire_ha: round_to(self.artif_ferroviaire_ha, 2),
            artif_inconnu_ha: round_to(self.artif_inconnu_ha, 2),
            conso_par_hab: round_to(self.conso_par_hab, 0),
            conso_reference: round_to(self.conso_reference, 2),
            enveloppe_zan: round_to(self.enveloppe_zan, 2),
            conso_2021_2024: round_to(self.conso_2021_2024, 2),
            reste_disponible: round_to(self.reste_disponible, 2),
            taux_enveloppe: round_to(self.taux_enveloppe, 2),
            ..self.clone()
        }
    }

    /// Artificialized hectares toward one destination.
    #[must_use]
    pub const fn destination_ha(&self, destination: Destination) -> f64 {
        match destination {
            Destination::Habitat => self.artif_habitat_ha,
            Destination::Activites => self.artif_activites_ha,
            Destination::Mixte => self.artif_mixte_ha,
            Destination::Routes => self.artif_routes_ha,
            Destination::Ferroviaire => self.artif_ferroviaire_ha,
            Destination::Inconnu => self.artif_inconnu_ha,
        }
    }
}

/// Yearly NAF consumption, one point per window present in the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnualEvolution {
    /// Period labels, e.g. `2009-10`.
    pub periodes: Vec<String>,
    /// Consumption per period, in hectares.
    pub consommations: Vec<f64>,
}

/// Artificialized hectares toward one destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepartitionEntry {
    /// Destination key.
    pub destination: Destination,
    /// Display label.
    pub label: String,
    /// Hectares.
    pub hectares: f64,
}

/// A point on a cumulative consumption curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// Calendar year.
    pub year: u16,
    /// Cumulative hectares since 2021.
    pub hectares: f64,
}

/// Actual consumption since 2021 against a linear use of the allowance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Allowance for 2021-2031, in hectares.
    pub enveloppe_zan: f64,
    /// Cumulative measured consumption, anchored at 0 in 2021.
    pub actual: Vec<TrajectoryPoint>,
    /// Allowance consumed at a constant rate over 2021-2031.
    pub theoretical: Vec<TrajectoryPoint>,
}

/// Land consumed per new resident over one census interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensificationPeriod {
    /// Interval label, e.g. `2015-2021`.
    pub period: String,
    /// Consumption over the interval, in hectares.
    pub artif_ha: f64,
    /// Population change over the interval.
    pub population_delta: f64,
    /// Whether `population_delta` is extrapolated rather than measured.
    pub estimated: bool,
    /// Consumption per new resident, in m².
    pub m2_per_new_resident: f64,
}

/// Densification ratios for the reference and observed intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Densification {
    /// 2015-2021 then 2021-2024.
    pub periods: Vec<DensificationPeriod>,
    /// Target consumption per new resident, in m². Informative only.
    pub objective_m2_per_new_resident: f64,
}

/// One commune in the artificialization ranking. Surfaces in hectares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCommune {
    /// Commune id.
    pub commune_id: String,
    /// Commune name.
    pub commune: String,
    /// Ranking total.
    pub total: f64,
    /// Housing.
    pub habitat: f64,
    /// Economic activity.
    pub activites: f64,
    /// Mixed use.
    pub mixte: f64,
    /// Roads.
    pub routes: f64,
}

/// Allowance usage of a single commune.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommuneRisk {
    /// Commune id.
    pub commune_id: String,
    /// Commune name.
    pub commune: String,
    /// The commune's own allowance, in hectares.
    pub enveloppe_commune: f64,
    /// Consumption 2021-2024, in hectares.
    pub conso_2124: f64,
    /// Share of the allowance consumed, in percent.
    pub taux: f64,
    /// Tier of `taux`.
    pub statut: RiskStatus,
}

/// Number of communes per risk tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSummary {
    /// Communes below 30 %.
    pub conforme: usize,
    /// Communes from 30 % to below 50 %.
    pub vigilance: usize,
    /// Communes at 50 % or more.
    pub critique: usize,
}

impl RiskSummary {
    /// Counts one commune in its tier.
    pub const fn record(&mut self, status: RiskStatus) {
        match status {
            RiskStatus::Conforme => self.conforme += 1,
            RiskStatus::Vigilance => self.vigilance += 1,
            RiskStatus::Critique => self.critique += 1,
        }
    }

    /// Total communes counted.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.conforme + self.vigilance + self.critique
    }
}

/// Highest-risk communes plus tier counts over the whole selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    /// Communes sorted by `taux`, highest first.
    pub communes: Vec<CommuneRisk>,
    /// Tier counts over every commune in the selection.
    pub summary: RiskSummary,
}

/// Aggregated figures for one typology. Surfaces in hectares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypologyGroup {
    /// Typology label, or `Autre`.
    pub typologie: String,
    /// Typology code, when recognized.
    pub code: Option<String>,
    /// Number of communes in the group.
    pub nb_communes: usize,
    /// NAF consumption 2009-2024.
    pub total: f64,
    /// Housing.
    pub habitat: f64,
    /// Economic activity.
    pub activites: f64,
    /// Mixed use.
    pub mixte: f64,
    /// Roads.
    pub routes: f64,
    /// Population change 2015-2021.
    pub population_delta: i64,
    /// Consumption per new resident, in m².
    pub efficience: f64,
}

/// Scores of one perimeter on the benchmark axes, each on a 0-100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSeries {
    /// Perimeter.
    pub perimeter: Perimeter,
    /// Perimeter display name.
    pub name: String,
    /// One score per axis, in [`BenchmarkResult::axes`] order.
    pub scores: [f64; 5],
    /// Unnormalized metrics the scores derive from.
    pub metrics: DerivedMetrics,
}

/// Side-by-side comparison of both perimeters for a radar chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Axis labels.
    pub axes: Vec<String>,
    /// SCOT first, then CC.
    pub perimeters: Vec<BenchmarkSeries>,
}

/// Values available to populate the dashboard filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Distinct department ids, sorted.
    pub departements: Vec<String>,
    /// Distinct commune ids, sorted.
    pub communes: Vec<String>,
    /// Typology labels present in the data, in code order.
    pub typologies: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_thresholds_are_half_open() {
        assert_eq!(RiskStatus::from_rate(0.0), RiskStatus::Conforme);
        assert_eq!(RiskStatus::from_rate(29.99), RiskStatus::Conforme);
        assert_eq!(RiskStatus::from_rate(30.0), RiskStatus::Vigilance);
        assert_eq!(RiskStatus::from_rate(49.99), RiskStatus::Vigilance);
        assert_eq!(RiskStatus::from_rate(50.0), RiskStatus::Critique);
        assert_eq!(RiskStatus::from_rate(250.0), RiskStatus::Critique);
    }

    #[test]
    fn risk_status_serializes_lowercase() {
        assert_eq!(RiskStatus::Vigilance.to_string(), "vigilance");
        assert_eq!("critique".parse::<RiskStatus>().unwrap(), RiskStatus::Critique);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert!((round_to(1.005_1, 2) - 1.01).abs() < 1e-9);
        assert!((round_to(12.345, 1) - 12.3).abs() < 1e-9);
        assert!((round_to(199.5, 0) - 200.0).abs() < 1e-9);
    }

    #[test]
    fn summary_counts_every_tier() {
        let mut summary = RiskSummary::default();
        for status in [
            RiskStatus::Conforme,
            RiskStatus::Critique,
            RiskStatus::Critique,
            RiskStatus::Vigilance,
        ] {
            summary.record(status);
        }
        assert_eq!(summary.conforme, 1);
        assert_eq!(summary.vigilance, 1);
        assert_eq!(summary.critique, 2);
        assert_eq!(summary.total(), 4);
    }

    #[test]
    fn empty_selector_is_empty() {
        assert!(FilterSelector::default().is_empty());
        assert!(!FilterSelector::default().with_departments(["26"]).is_empty());
    }
}
