#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the ZAN dashboard server.
//!
//! Builder results from `zan_dashboard_analytics_models` are returned as-is;
//! this crate only adds the query parameters and the few envelopes that
//! carry server state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use zan_dashboard_analytics_models::{DerivedMetrics, FilterSelector};
use zan_dashboard_commune_models::Perimeter;

/// Perimeter used when a request names none.
pub const DEFAULT_PERIMETER: &str = "scot";
/// Ranking length used when a request names none.
pub const DEFAULT_LIMIT: usize = 10;

/// Splits a comma-separated list, dropping blank items.
#[must_use]
pub fn split_list(value: Option<&str>) -> BTreeSet<String> {
    value
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Query parameters shared by every builder endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectionParams {
    /// `scot` or `cc`.
    pub perimetre: Option<String>,
    /// Comma-separated department ids.
    pub departements: Option<String>,
    /// Comma-separated commune ids.
    pub communes: Option<String>,
    /// Comma-separated typology codes or labels.
    pub typologies: Option<String>,
    /// Ranking length.
    pub n: Option<usize>,
}

impl SelectionParams {
    /// Requested perimeter name, defaulting to `scot`.
    #[must_use]
    pub fn perimeter_name(&self) -> &str {
        self.perimetre
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(DEFAULT_PERIMETER)
    }

    /// Filter selector built from the list parameters.
    #[must_use]
    pub fn selector(&self) -> FilterSelector {
        FilterSelector {
            departments: split_list(self.departements.as_deref()),
            communes: split_list(self.communes.as_deref()),
            typologies: split_list(self.typologies.as_deref()),
        }
    }

    /// Requested ranking length, defaulting to 10.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.n.unwrap_or(DEFAULT_LIMIT)
    }
}

/// Query parameters of the filter options endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterOptionsParams {
    /// `scot` or `cc`.
    pub perimetre: Option<String>,
    /// Comma-separated department ids restricting the commune list.
    pub departements: Option<String>,
}

impl FilterOptionsParams {
    /// Requested perimeter name, defaulting to `scot`.
    #[must_use]
    pub fn perimeter_name(&self) -> &str {
        self.perimetre
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(DEFAULT_PERIMETER)
    }

    /// Selected departments.
    #[must_use]
    pub fn departments(&self) -> BTreeSet<String> {
        split_list(self.departements.as_deref())
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether every perimeter is loaded.
    pub healthy: bool,
    /// Server version.
    pub version: String,
    /// Perimeters whose dataset is available.
    pub loaded: Vec<Perimeter>,
    /// Why loading failed, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_error: Option<String>,
}

/// Aggregate metrics of a perimeter, with its display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMetrics {
    /// Perimeter display name.
    pub perimetre: String,
    /// Rounded metrics.
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
}

/// Outcome of a dataset reload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiReload {
    /// Perimeters available after the reload.
    pub loaded: Vec<Perimeter>,
    /// When the new snapshot was built (RFC 3339).
    pub loaded_at: String,
}
