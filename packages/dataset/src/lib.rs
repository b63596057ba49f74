#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dataset loading for the ZAN dashboard.
//!
//! Each perimeter is declared in an embedded TOML file (see [`registry`])
//! naming its CSV export and the unit of its surface columns. The
//! [`loader`] reads those exports once, coerces every numeric column and
//! normalizes surfaces to m². The resulting datasets live in an immutable
//! [`context::DatasetContext`], shared by request handlers through
//! [`context::SharedContext`].

pub mod context;
pub mod loader;
pub mod metadata;
pub mod registry;

use std::path::PathBuf;

use zan_dashboard_commune_models::Perimeter;

/// Errors that can occur while loading perimeter datasets.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// The CSV export could not be opened or read.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The CSV export is malformed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is missing from the header row.
    #[error("Missing column in {perimeter} dataset: {message}")]
    MissingColumn {
        /// Perimeter being loaded.
        perimeter: Perimeter,
        /// Description of what is missing.
        message: String,
    },

    /// A perimeter definition failed to parse.
    #[error("Invalid perimeter definition '{name}': {source}")]
    Definition {
        /// Registry entry name.
        name: String,
        /// Underlying parse error.
        source: toml::de::Error,
    },
}
