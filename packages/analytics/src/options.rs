//! Values available to populate the dashboard filters.

use std::collections::BTreeSet;

use zan_dashboard_analytics_models::FilterOptions;
use zan_dashboard_commune_models::{Dataset, Typology};

/// Distinct departments, communes and typology labels of `dataset`.
///
/// When `departments` is non-empty, communes are restricted to those
/// departments. Departments and typologies always cover the whole dataset.
#[must_use]
pub fn filter_options(dataset: &Dataset, departments: &BTreeSet<String>) -> FilterOptions {
    let departements: BTreeSet<&str> = dataset
        .records
        .iter()
        .map(|r| r.department_id.as_str())
        .filter(|id| !id.is_empty())
        .collect();

    let communes: BTreeSet<&str> = dataset
        .records
        .iter()
        .filter(|r| departments.is_empty() || departments.contains(&r.department_id))
        .map(|r| r.commune_id.as_str())
        .collect();

    let present: BTreeSet<Typology> = dataset.records.iter().filter_map(|r| r.typology()).collect();

    FilterOptions {
        departements: departements.into_iter().map(ToString::to_string).collect(),
        communes: communes.into_iter().map(ToString::to_string).collect(),
        typologies: present.into_iter().map(|t| t.label().to_string()).collect(),
    }
}
