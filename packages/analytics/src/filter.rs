//! Filter stage: narrows a perimeter dataset with a [`FilterSelector`].

use std::collections::BTreeSet;

use zan_dashboard_analytics_models::FilterSelector;
use zan_dashboard_commune_models::{ColumnSet, CommuneRecord, Dataset, Perimeter, Typology};

/// A borrowed, filtered view of one perimeter's dataset.
///
/// Records keep their dataset order. The column set is that of the
/// underlying dataset: filtering rows never changes which columns exist.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    /// Perimeter the rows belong to.
    pub perimeter: Perimeter,
    /// Columns present in the source.
    pub columns: &'a ColumnSet,
    /// Rows kept by the filter, in dataset order.
    pub records: Vec<&'a CommuneRecord>,
}

impl<'a> Selection<'a> {
    /// Every row of `dataset`.
    #[must_use]
    pub fn all(dataset: &'a Dataset) -> Self {
        Self {
            perimeter: dataset.perimeter,
            columns: &dataset.columns,
            records: dataset.records.iter().collect(),
        }
    }

    /// Keeps the rows that also match `selector`.
    #[must_use]
    pub fn refine(&self, selector: &FilterSelector) -> Self {
        let predicate = Predicate::new(selector);
        Self {
            perimeter: self.perimeter,
            columns: self.columns,
            records: self
                .records
                .iter()
                .copied()
                .filter(|record| predicate.matches(record))
                .collect(),
        }
    }

    /// Number of rows kept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no row is kept.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Applies `selector` to `dataset`.
///
/// An empty selector keeps every row. Zero remaining rows is a valid,
/// empty selection.
#[must_use]
pub fn filter<'a>(dataset: &'a Dataset, selector: &FilterSelector) -> Selection<'a> {
    let selection = Selection::all(dataset);
    if selector.is_empty() {
        return selection;
    }

    let filtered = selection.refine(selector);
    log::debug!(
        "[{}] Filter kept {}/{} communes",
        dataset.perimeter,
        filtered.len(),
        dataset.len()
    );
    filtered
}

/// Maps a typology selector value to the code it designates.
///
/// Display labels resolve to their code; anything else, including codes
/// and unrecognized values, is kept as-is.
#[must_use]
pub fn typology_code(value: &str) -> String {
    Typology::from_label(value).map_or_else(|| value.to_string(), |t| t.code().to_string())
}

struct Predicate<'s> {
    departments: &'s BTreeSet<String>,
    communes: &'s BTreeSet<String>,
    typology_codes: BTreeSet<String>,
}

impl<'s> Predicate<'s> {
    fn new(selector: &'s FilterSelector) -> Self {
        Self {
            departments: &selector.departments,
            communes: &selector.communes,
            typology_codes: selector
                .typologies
                .iter()
                .map(|value| typology_code(value))
                .collect(),
        }
    }

    fn matches(&self, record: &CommuneRecord) -> bool {
        (self.departments.is_empty() || self.departments.contains(&record.department_id))
            && (self.communes.is_empty() || self.communes.contains(&record.commune_id))
            && (self.typology_codes.is_empty()
                || record
                    .typology_code
                    .as_ref()
                    .is_some_and(|code| self.typology_codes.contains(code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{COMMUNES, dataset};

    fn ids(selection: &Selection<'_>) -> Vec<String> {
        selection
            .records
            .iter()
            .map(|r| r.commune_id.clone())
            .collect()
    }

    #[test]
    fn empty_selector_is_identity() {
        let data = dataset(Perimeter::Scot, COMMUNES);
        let selection = filter(&data, &FilterSelector::default());
        assert_eq!(ids(&selection), vec!["26001", "26002", "07001", "07002"]);
        assert_eq!(selection.perimeter, Perimeter::Scot);
    }

    #[test]
    fn filters_by_department() {
        let data = dataset(Perimeter::Scot, COMMUNES);
        let selection = filter(&data, &FilterSelector::default().with_departments(["07"]));
        assert_eq!(ids(&selection), vec!["07001", "07002"]);
    }

    #[test]
    fn selectors_are_conjunctive() {
        let data = dataset(Perimeter::Scot, COMMUNES);
        let selector = FilterSelector::default()
            .with_departments(["26"])
            .with_communes(["26002", "07001"]);
        assert_eq!(ids(&filter(&data, &selector)), vec!["26002"]);
    }

    #[test]
    fn typology_labels_map_to_codes() {
        let data = dataset(Perimeter::Scot, COMMUNES);
        let by_label = filter(
            &data,
            &FilterSelector::default().with_typologies(["Pôles principaux", "30"]),
        );
        assert_eq!(ids(&by_label), vec!["26002", "07001"]);
    }

    #[test]
    fn unknown_typology_passes_through_and_matches_nothing() {
        let data = dataset(Perimeter::Scot, COMMUNES);
        let selection = filter(&data, &FilterSelector::default().with_typologies(["Métropole"]));
        assert!(selection.is_empty());
        assert_eq!(typology_code("Métropole"), "Métropole");
        assert_eq!(typology_code("Couronnes grandes aires"), "12");
    }

    #[test]
    fn no_match_is_an_empty_selection() {
        let data = dataset(Perimeter::Scot, COMMUNES);
        let selection = filter(&data, &FilterSelector::default().with_departments(["69"]));
        assert_eq!(selection.len(), 0);
        assert_eq!(selection.columns, &data.columns);
    }

    #[test]
    fn filtering_is_idempotent() {
        let data = dataset(Perimeter::Scot, COMMUNES);
        let selector = FilterSelector::default()
            .with_departments(["26", "07"])
            .with_typologies(["12", "11", "Hors attraction (rural)"]);
        let once = filter(&data, &selector);
        let twice = once.refine(&selector);
        assert_eq!(ids(&once), ids(&twice));
        assert_eq!(ids(&once), vec!["26001", "26002", "07001"]);
    }
}
