//! Compile-time registry of perimeter definitions.
//!
//! Each entry is a `(name, toml_content)` pair embedded via `include_str!`.
//! A definition names the CSV export of a perimeter and declares the unit
//! its surface columns are expressed in, so the loader can normalize units
//! once instead of guessing per request.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use zan_dashboard_commune_models::{Perimeter, SQUARE_METERS_PER_HECTARE};

use crate::DatasetError;

/// Embedded TOML perimeter definitions.
const PERIMETER_TOMLS: &[(&str, &str)] = &[
    ("scot", include_str!("../perimeters/scot.toml")),
    ("cc", include_str!("../perimeters/cc.toml")),
];

/// Unit a surface column is expressed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceUnit {
    /// Square meters, the stored unit.
    #[default]
    M2,
    /// Hectares.
    Ha,
}

impl SurfaceUnit {
    /// Multiplier converting a value in this unit to m².
    #[must_use]
    pub const fn to_square_meters(self) -> f64 {
        match self {
            Self::M2 => 1.0,
            Self::Ha => SQUARE_METERS_PER_HECTARE,
        }
    }
}

/// Declared units of a perimeter's surface columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ColumnUnits {
    /// Unit of `naf09art24` and the yearly `nafYYartZZ` windows.
    #[serde(default)]
    pub consumption: SurfaceUnit,
    /// Unit of the `art09xxx24` destination columns.
    #[serde(default)]
    pub destinations: SurfaceUnit,
}

/// Everything needed to load one perimeter.
#[derive(Debug, Clone, Deserialize)]
pub struct PerimeterDefinition {
    /// Perimeter identifier.
    pub id: Perimeter,
    /// Display name (e.g. `"SCoT des Rives du Rhône"`).
    pub name: String,
    /// Short label for compact layouts (e.g. `"SCOT"`).
    pub short_label: String,
    /// CSV file name, relative to the data directory.
    pub file: String,
    /// Field delimiter (defaults to `;`).
    #[serde(default)]
    pub delimiter: Option<String>,
    /// Units of the surface columns.
    #[serde(default)]
    pub units: ColumnUnits,
}

impl PerimeterDefinition {
    /// Field delimiter byte.
    #[must_use]
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter
            .as_deref()
            .and_then(|d| d.as_bytes().first().copied())
            .unwrap_or(b';')
    }

    /// Path of the CSV export inside `data_dir`.
    #[must_use]
    pub fn data_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.file)
    }
}

/// Parses a [`PerimeterDefinition`] from a TOML string.
///
/// # Errors
///
/// Returns [`DatasetError::Definition`] if the TOML is malformed or missing
/// required fields.
pub fn parse_definition(name: &str, toml_str: &str) -> Result<PerimeterDefinition, DatasetError> {
    toml::de::from_str(toml_str).map_err(|source| DatasetError::Definition {
        name: name.to_string(),
        source,
    })
}

/// Returns all registered perimeter definitions.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. Since these are
/// compile-time constants, parse failures indicate a development error
/// and are caught by the tests below.
#[must_use]
pub fn all_definitions() -> Vec<PerimeterDefinition> {
    PERIMETER_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            parse_definition(name, toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse perimeter definition: {e}"))
        })
        .collect()
}

/// Returns the definition of one perimeter.
///
/// # Panics
///
/// Panics if the perimeter has no embedded definition, see
/// [`all_definitions`].
#[must_use]
pub fn definition(perimeter: Perimeter) -> PerimeterDefinition {
    all_definitions()
        .into_iter()
        .find(|d| d.id == perimeter)
        .unwrap_or_else(|| panic!("No perimeter definition registered for '{perimeter}'"))
}
