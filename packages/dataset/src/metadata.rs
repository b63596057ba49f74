//! Provenance of the NAF consumption data, for chart captions and the
//! dashboard footer.

use std::path::Path;

use chrono::{DateTime, Local};
use serde::Serialize;

/// Publisher of the consumption files.
pub const DATA_SOURCE: &str = "Observatoire de l'artificialisation des sols";
/// Publisher website.
pub const DATA_SOURCE_URL: &str = "https://artificialisation.biodiversite.gouv.fr";
/// What the files contain.
pub const DATA_DESCRIPTION: &str =
    "Fichier national de consommation d'espaces NAF (Naturels, Agricoles et Forestiers)";
/// Years covered by the files.
pub const DATA_PERIOD: &str = "2009-2024";

/// Data provenance as served to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataMetadata {
    /// Publisher.
    pub source: String,
    /// Publisher website.
    pub source_url: String,
    /// Description of the files.
    pub description: String,
    /// Years covered.
    pub period: String,
    /// Last modification of the data file, `DD/MM/YYYY`.
    pub last_update: String,
    /// Caption for charts.
    pub source_text: String,
    /// Footer line.
    pub footer_text: String,
}

impl DataMetadata {
    /// Builds the metadata for a given last-update date.
    #[must_use]
    pub fn new(last_update: impl Into<String>) -> Self {
        let last_update = last_update.into();
        Self {
            source: DATA_SOURCE.to_string(),
            source_url: DATA_SOURCE_URL.to_string(),
            description: DATA_DESCRIPTION.to_string(),
            period: DATA_PERIOD.to_string(),
            source_text: format!(
                "Source: {DATA_SOURCE} | Données: {DATA_PERIOD} | Dernière mise à jour: {last_update}"
            ),
            footer_text: format!(
                "Données: {DATA_SOURCE} ({DATA_PERIOD}) | Dernière récolte: {last_update} | Plus d'infos: {DATA_SOURCE_URL}"
            ),
            last_update,
        }
    }

    /// Builds the metadata from the modification time of `data_file`,
    /// falling back to today when the file cannot be read.
    #[must_use]
    pub fn for_file(data_file: &Path) -> Self {
        let modified = std::fs::metadata(data_file)
            .and_then(|m| m.modified())
            .map_or_else(
                |e| {
                    log::debug!("No modification time for {}: {e}", data_file.display());
                    Local::now()
                },
                DateTime::<Local>::from,
            );
        Self::new(format_date(modified))
    }
}

/// Formats a date as `DD/MM/YYYY`.
#[must_use]
pub fn format_date(date: DateTime<Local>) -> String {
    date.format("%d/%m/%Y").to_string()
}
