//! Breakdowns of a selection by destination and by typology.

use zan_dashboard_analytics_models::{RepartitionEntry, TypologyGroup, round_to};
use zan_dashboard_commune_models::{
    CommuneRecord, Destination, OTHER_TYPOLOGY_LABEL, Typology, to_hectares,
};

use crate::filter::Selection;
use crate::metrics::{compute_metrics, per_new_resident, sum_m2};

/// Artificialized hectares per destination, for every destination column
/// present in the source, in [`Destination::all`] order.
#[must_use]
pub fn repartition(selection: &Selection<'_>) -> Vec<RepartitionEntry> {
    let metrics = compute_metrics(selection);
    Destination::all()
        .iter()
        .copied()
        .filter(|d| selection.columns.has_destination(*d))
        .map(|destination| RepartitionEntry {
            destination,
            label: destination.label().to_string(),
            hectares: round_to(metrics.destination_ha(destination), 2),
        })
        .collect()
}

/// Figures per typology, in code order with unrecognized typologies
/// grouped last under `Autre`. Groups without communes are omitted.
#[must_use]
pub fn typology_aggregation(selection: &Selection<'_>) -> Vec<TypologyGroup> {
    let keys = Typology::all().iter().copied().map(Some).chain([None]);

    keys.filter_map(|key| {
        let members: Vec<&CommuneRecord> = selection
            .records
            .iter()
            .copied()
            .filter(|r| r.typology() == key)
            .collect();
        if members.is_empty() {
            None
        } else {
            Some(group(key, &members))
        }
    })
    .collect()
}

#[allow(clippy::cast_precision_loss)] // population counts stay far below 2^52
fn group(typology: Option<Typology>, members: &[&CommuneRecord]) -> TypologyGroup {
    let total_m2 = sum_m2(members, |r| r.consumption_total_m2);
    let destination = |d: Destination| round_to(to_hectares(sum_m2(members, |r| r.destination(d))), 2);
    let population_delta: i64 = members.iter().map(|r| r.population_delta).sum();

    TypologyGroup {
        typologie: typology.map_or(OTHER_TYPOLOGY_LABEL, Typology::label).to_string(),
        code: typology.map(|t| t.code().to_string()),
        nb_communes: members.len(),
        total: round_to(to_hectares(total_m2), 2),
        habitat: destination(Destination::Habitat),
        activites: destination(Destination::Activites),
        mixte: destination(Destination::Mixte),
        routes: destination(Destination::Routes),
        population_delta,
        efficience: round_to(per_new_resident(total_m2, population_delta as f64), 0),
    }
}
