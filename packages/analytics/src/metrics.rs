//! Scalar aggregate metrics of a selection.

use zan_dashboard_analytics_models::{DerivedMetrics, RiskStatus};
use zan_dashboard_commune_models::{CommuneRecord, Destination, YearPair, to_hectares};

use crate::filter::Selection;

/// Share of the reference-decade consumption allowed over 2021-2031.
pub const ENVELOPE_RATIO: f64 = 0.5;

/// Computes [`DerivedMetrics`] for a selection. Values are unrounded.
#[must_use]
#[allow(clippy::cast_precision_loss)] // population counts stay far below 2^52
pub fn compute_metrics(selection: &Selection<'_>) -> DerivedMetrics {
    let records = &selection.records;

    let total_m2 = sum_m2(records, |r| r.consumption_total_m2);
    let artif_total_ha = to_hectares(total_m2);
    let destination_ha = |d: Destination| to_hectares(sum_m2(records, |r| r.destination(d)));

    let population = records.iter().map(|r| r.population_2021).sum();
    let evolution_pop: i64 = records.iter().map(|r| r.population_delta).sum();

    let conso_reference = to_hectares(sum_m2(records, reference_m2));
    let enveloppe_zan = conso_reference * ENVELOPE_RATIO;
    let conso_2021_2024 = to_hectares(sum_m2(records, recent_m2));
    let taux_enveloppe = percent_of(conso_2021_2024, enveloppe_zan);

    DerivedMetrics {
        artif_total_ha,
        artif_habitat_ha: destination_ha(Destination::Habitat),
        artif_activites_ha: destination_ha(Destination::Activites),
        artif_mixte_ha: destination_ha(Destination::Mixte),
        artif_routes_ha: destination_ha(Destination::Routes),
        artif_ferroviaire_ha: destination_ha(Destination::Ferroviaire),
        artif_inconnu_ha: destination_ha(Destination::Inconnu),
        population,
        evolution_pop,
        conso_par_hab: per_new_resident(total_m2, evolution_pop as f64),
        conso_reference,
        enveloppe_zan,
        conso_2021_2024,
        reste_disponible: (enveloppe_zan - conso_2021_2024).max(0.0),
        taux_enveloppe,
        nb_communes: records.len(),
        statut: RiskStatus::from_rate(taux_enveloppe),
    }
}

/// Sums one per-record figure over a selection.
#[must_use]
pub fn sum_m2(records: &[&CommuneRecord], figure: impl Fn(&CommuneRecord) -> f64) -> f64 {
    records.iter().map(|r| figure(r)).sum()
}

/// Consumption over the 2011-2021 reference decade, in m².
#[must_use]
pub fn reference_m2(record: &CommuneRecord) -> f64 {
    record.window_m2(YearPair::reference_decade())
}

/// Consumption over 2021-2024, in m².
#[must_use]
pub fn recent_m2(record: &CommuneRecord) -> f64 {
    record.window_m2(YearPair::recent())
}

/// A commune's own allowance for 2021-2031, in hectares.
#[must_use]
pub fn commune_envelope_ha(record: &CommuneRecord) -> f64 {
    to_hectares(reference_m2(record)) * ENVELOPE_RATIO
}

/// `part / whole * 100`, or 0 when `whole` is not positive.
#[must_use]
pub fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part / whole * 100.0 } else { 0.0 }
}

/// Square meters consumed per new resident, or 0 when the population did
/// not grow.
#[must_use]
pub fn per_new_resident(square_meters: f64, population_delta: f64) -> f64 {
    if population_delta > 0.0 {
        square_meters / population_delta
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use zan_dashboard_analytics_models::FilterSelector;
    use zan_dashboard_commune_models::{ColumnSet, Dataset, Perimeter};

    use super::*;
    use crate::filter::filter;
    use crate::fixtures::{COMMUNES, dataset};

    fn approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn aggregates_the_whole_perimeter() {
        let data = dataset(Perimeter::Scot, COMMUNES);
        let metrics = compute_metrics(&Selection::all(&data));

        approx(metrics.artif_total_ha, 65.0);
        approx(metrics.artif_habitat_ha, 32.5);
        approx(metrics.artif_activites_ha, 20.5);
        approx(metrics.artif_ferroviaire_ha, 0.0);
        assert_eq!(metrics.population, 20_400);
        assert_eq!(metrics.evolution_pop, 400);
        approx(metrics.conso_par_hab, 650_000.0 / 400.0);
        approx(metrics.conso_reference, 29.0);
        approx(metrics.enveloppe_zan, 14.5);
        approx(metrics.conso_2021_2024, 8.6);
        approx(metrics.reste_disponible, 5.9);
        approx(metrics.taux_enveloppe, 8.6 / 14.5 * 100.0);
        assert_eq!(metrics.nb_communes, 4);
        assert_eq!(metrics.statut, RiskStatus::Critique);
    }

    #[test]
    fn envelope_is_exactly_half_the_reference() {
        let data = dataset(Perimeter::Scot, COMMUNES);
        for department in ["26", "07"] {
            let selection = filter(&data, &FilterSelector::default().with_departments([department]));
            let metrics = compute_metrics(&selection);
            assert_eq!(metrics.enveloppe_zan, 0.5 * metrics.conso_reference);
        }
    }

    #[test]
    fn remaining_allowance_is_never_negative() {
        let data = dataset(
            Perimeter::Cc,
            "idcom;iddep;naf11art12;naf21art22;naf22art23\n\
             26001;26;10000;40000;20000\n",
        );
        let metrics = compute_metrics(&Selection::all(&data));
        approx(metrics.enveloppe_zan, 0.5);
        approx(metrics.conso_2021_2024, 6.0);
        approx(metrics.reste_disponible, 0.0);
        approx(metrics.taux_enveloppe, 1_200.0);
        assert_eq!(metrics.statut, RiskStatus::Critique);
    }

    #[test]
    fn total_derives_from_annual_windows_when_absent() {
        let data = dataset(
            Perimeter::Scot,
            "idcom;iddep;naf23art24\n\
             A;26;50000\n\
             B;26;30000\n\
             C;26;20000\n",
        );
        let metrics = compute_metrics(&Selection::all(&data));
        approx(metrics.artif_total_ha, 10.0);
        approx(metrics.conso_reference, 0.0);
        approx(metrics.taux_enveloppe, 0.0);
        assert_eq!(metrics.statut, RiskStatus::Conforme);
    }

    #[test]
    fn shrinking_population_gives_zero_per_resident() {
        let data = dataset(Perimeter::Scot, COMMUNES);
        let selection = filter(&data, &FilterSelector::default().with_communes(["07002"]));
        let metrics = compute_metrics(&selection);
        assert_eq!(metrics.evolution_pop, -60);
        approx(metrics.conso_par_hab, 0.0);
    }

    #[test]
    fn empty_selection_yields_zeros() {
        let data = Dataset::new(Perimeter::Cc, "CC", ColumnSet::complete(), Vec::new());
        let metrics = compute_metrics(&Selection::all(&data));
        assert_eq!(metrics.nb_communes, 0);
        approx(metrics.artif_total_ha, 0.0);
        approx(metrics.taux_enveloppe, 0.0);
        approx(metrics.reste_disponible, 0.0);
        assert!(!metrics.conso_par_hab.is_nan());
    }

    #[test]
    fn commune_envelope_is_half_its_reference() {
        let data = dataset(Perimeter::Scot, COMMUNES);
        approx(commune_envelope_ha(&data.records[0]), 5.0);
        approx(to_hectares(recent_m2(&data.records[0])), 2.0);
    }

    #[test]
    fn guarded_ratios() {
        approx(percent_of(6.0, 10.0), 60.0);
        approx(percent_of(6.0, 0.0), 0.0);
        approx(per_new_resident(10_000.0, 50.0), 200.0);
        approx(per_new_resident(10_000.0, -5.0), 0.0);
    }
}
