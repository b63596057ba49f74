//! Commune rankings: largest artificialization and allowance risk.

use zan_dashboard_analytics_models::{
    CommuneRisk, RiskReport, RiskStatus, RiskSummary, TopCommune, round_to,
};
use zan_dashboard_commune_models::{CommuneRecord, Destination, to_hectares};

use crate::filter::Selection;
use crate::metrics::{commune_envelope_ha, percent_of, recent_m2};

/// The `n` communes with the largest artificialized total.
///
/// Ties keep dataset order. Returns at most `min(n, rows)` entries.
#[must_use]
pub fn top_communes(selection: &Selection<'_>, n: usize) -> Vec<TopCommune> {
    let mut ranked: Vec<&CommuneRecord> = selection.records.clone();
    ranked.sort_by(|a, b| b.artif_total_ha.total_cmp(&a.artif_total_ha));

    let destination = |r: &CommuneRecord, d: Destination| round_to(to_hectares(r.destination(d)), 2);

    ranked
        .into_iter()
        .take(n)
        .map(|r| TopCommune {
            commune_id: r.commune_id.clone(),
            commune: r.commune_name.clone(),
            total: round_to(r.artif_total_ha, 2),
            habitat: destination(r, Destination::Habitat),
            activites: destination(r, Destination::Activites),
            mixte: destination(r, Destination::Mixte),
            routes: destination(r, Destination::Routes),
        })
        .collect()
}

/// Allowance usage of one commune, unrounded.
#[must_use]
pub fn commune_risk(record: &CommuneRecord) -> CommuneRisk {
    let enveloppe_commune = commune_envelope_ha(record);
    let conso_2124 = to_hectares(recent_m2(record));
    let taux = percent_of(conso_2124, enveloppe_commune);

    CommuneRisk {
        commune_id: record.commune_id.clone(),
        commune: record.commune_name.clone(),
        enveloppe_commune,
        conso_2124,
        taux,
        statut: RiskStatus::from_rate(taux),
    }
}

/// The `n` communes that used the largest share of their own allowance,
/// plus tier counts over the whole selection.
///
/// Tiers are assigned on the unrounded rate; ties keep dataset order.
#[must_use]
pub fn risk_classification(selection: &Selection<'_>, n: usize) -> RiskReport {
    let mut risks: Vec<CommuneRisk> = selection.records.iter().map(|r| commune_risk(r)).collect();

    let mut summary = RiskSummary::default();
    for risk in &risks {
        summary.record(risk.statut);
    }

    risks.sort_by(|a, b| b.taux.total_cmp(&a.taux));
    risks.truncate(n);

    let communes = risks
        .into_iter()
        .map(|risk| CommuneRisk {
            enveloppe_commune: round_to(risk.enveloppe_commune, 2),
            conso_2124: round_to(risk.conso_2124, 2),
            taux: round_to(risk.taux, 1),
            ..risk
        })
        .collect();

    RiskReport { communes, summary }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use zan_dashboard_commune_models::{ColumnSet, Dataset, Perimeter, YearPair};

    use super::*;
    use crate::fixtures::{COMMUNES, dataset};

    fn approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn three_commune_ranking_in_hectares() {
        let data = dataset(
            Perimeter::Scot,
            "idcom;iddep;naf23art24\n\
             A;26;50000\n\
             B;26;30000\n\
             C;26;20000\n",
        );
        let top = top_communes(&Selection::all(&data), 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].commune_id, "A");
        approx(top[0].total, 5.0);
        assert_eq!(top[1].commune_id, "B");
        approx(top[1].total, 3.0);
    }

    #[test]
    fn top_n_is_bounded_descending_and_distinct() {
        let data = dataset(Perimeter::Scot, COMMUNES);
        let selection = Selection::all(&data);

        for n in [0, 1, 3, 4, 10] {
            let top = top_communes(&selection, n);
            assert_eq!(top.len(), n.min(data.len()));
            assert!(top.windows(2).all(|w| w[0].total >= w[1].total));
            let ids: BTreeSet<&str> = top.iter().map(|t| t.commune_id.as_str()).collect();
            assert_eq!(ids.len(), top.len());
        }

        let top = top_communes(&selection, 10);
        let names: Vec<&str> = top.iter().map(|t| t.commune.as_str()).collect();
        assert_eq!(names, vec!["Annonay", "Albon", "Andancette", "Ardoix"]);
        approx(top[0].habitat, 15.0);
        approx(top[0].activites, 10.0);
        approx(top[0].mixte, 3.0);
        approx(top[0].routes, 2.0);
    }

    #[test]
    fn ties_keep_dataset_order() {
        let records = ["first", "second", "third"]
            .into_iter()
            .map(|id| CommuneRecord::new(id, "26").with_total(10_000.0))
            .collect();
        let data = Dataset::new(Perimeter::Cc, "CC", ColumnSet::complete(), records);
        let top = top_communes(&Selection::all(&data), 3);
        let ids: Vec<&str> = top.iter().map(|t| t.commune_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn explicit_hectare_total_drives_the_ranking() {
        let data = dataset(
            Perimeter::Scot,
            "idcom;iddep;naf09art24;artif_total_ha\n\
             A;26;900000;1.5\n\
             B;26;10000;2.5\n",
        );
        let top = top_communes(&Selection::all(&data), 1);
        assert_eq!(top[0].commune_id, "B");
        approx(top[0].total, 2.5);
    }

    #[test]
    fn commune_over_sixty_percent_is_critical() {
        let pair = |start| YearPair::new(start).unwrap();
        let record = CommuneRecord::new("26001", "26")
            .with_consumption(pair(11), 200_000.0)
            .with_consumption(pair(21), 60_000.0);
        let risk = commune_risk(&record);
        approx(risk.enveloppe_commune, 10.0);
        approx(risk.conso_2124, 6.0);
        approx(risk.taux, 60.0);
        assert_eq!(risk.statut, RiskStatus::Critique);
    }

    #[test]
    fn commune_without_reference_has_zero_rate() {
        let record = CommuneRecord::new("26001", "26")
            .with_consumption(YearPair::new(22).unwrap(), 5_000.0);
        let risk = commune_risk(&record);
        approx(risk.taux, 0.0);
        assert_eq!(risk.statut, RiskStatus::Conforme);
    }

    #[test]
    fn risk_report_sorts_and_summarizes() {
        let data = dataset(Perimeter::Scot, COMMUNES);
        let report = risk_classification(&Selection::all(&data), 2);

        let ids: Vec<&str> = report.communes.iter().map(|c| c.commune_id.as_str()).collect();
        assert_eq!(ids, vec!["07001", "26001"]);
        approx(report.communes[0].taux, 80.0);
        assert_eq!(report.communes[0].statut, RiskStatus::Critique);
        approx(report.communes[1].taux, 40.0);
        assert_eq!(report.communes[1].statut, RiskStatus::Vigilance);

        assert_eq!(report.summary.total(), 4);
        assert_eq!(report.summary.critique, 1);
        assert_eq!(report.summary.vigilance, 1);
        assert_eq!(report.summary.conforme, 2);
    }

    #[test]
    fn risk_rates_round_to_one_decimal() {
        let pair = |start| YearPair::new(start).unwrap();
        let record = CommuneRecord::new("26001", "26")
            .with_consumption(pair(11), 60_000.0)
            .with_consumption(pair(21), 10_000.0);
        let data = Dataset::new(Perimeter::Cc, "CC", ColumnSet::complete(), vec![record]);
        let report = risk_classification(&Selection::all(&data), 10);
        approx(report.communes[0].taux, 33.3);
        assert_eq!(report.communes[0].statut, RiskStatus::Vigilance);
    }
}
