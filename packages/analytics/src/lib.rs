#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! ZAN metrics engine.
//!
//! Every public builder is a pure function over a [`filter::Selection`]:
//! a borrowed, filtered view of one perimeter's [`Dataset`]. Nothing is
//! cached and nothing fails on empty selections or absent columns; every
//! ratio is guarded against a zero denominator. The only errors are about
//! which dataset to read (see [`AnalyticsError`]).

pub mod benchmark;
pub mod breakdown;
pub mod filter;
pub mod metrics;
pub mod options;
pub mod ranking;
pub mod series;

use thiserror::Error;
use zan_dashboard_commune_models::{Dataset, Perimeter};

/// Errors that can occur when resolving the dataset a builder runs on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyticsError {
    /// The perimeter's dataset failed to load.
    #[error("Data unavailable for perimeter '{perimeter}'")]
    DataUnavailable {
        /// Perimeter that was requested.
        perimeter: Perimeter,
    },

    /// The requested perimeter does not exist.
    #[error("Unknown perimeter '{value}': expected 'scot' or 'cc'")]
    UnknownPerimeter {
        /// The rejected value.
        value: String,
    },
}

/// Parses a perimeter name.
///
/// # Errors
///
/// Returns [`AnalyticsError::UnknownPerimeter`] if `value` is neither
/// `scot` nor `cc`.
pub fn resolve_perimeter(value: &str) -> Result<Perimeter, AnalyticsError> {
    value
        .trim()
        .parse()
        .map_err(|_| AnalyticsError::UnknownPerimeter {
            value: value.to_string(),
        })
}

/// Turns an absent dataset into [`AnalyticsError::DataUnavailable`].
///
/// # Errors
///
/// Returns [`AnalyticsError::DataUnavailable`] if `dataset` is `None`.
pub fn require(dataset: Option<&Dataset>, perimeter: Perimeter) -> Result<&Dataset, AnalyticsError> {
    dataset.ok_or(AnalyticsError::DataUnavailable { perimeter })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use zan_dashboard_commune_models::{Dataset, Perimeter};
    use zan_dashboard_dataset::loader::parse_dataset;
    use zan_dashboard_dataset::registry::definition;

    /// Parses a CSV fixture through the real loader.
    pub fn dataset(perimeter: Perimeter, csv: &str) -> Dataset {
        parse_dataset(&definition(perimeter), csv.as_bytes()).unwrap()
    }

    /// Four communes over two departments with every typology, reference
    /// decade and recent windows populated.
    pub const COMMUNES: &str = "\
idcom;idcomtxt;iddep;aav2020_typo;naf09art24;naf11art12;naf15art16;naf20art21;naf21art22;naf22art23;naf23art24;art09hab24;art09act24;art09mix24;art09rou24;pop15;pop21;pop1521
26001;Albon;26;12;200000;40000;20000;40000;10000;5000;5000;100000;60000;20000;20000;1800;1900;100
26002;Andancette;26;30;100000;20000;10000;10000;2000;2000;1000;50000;30000;10000;10000;1200;1260;60
07001;Annonay;07;11;300000;60000;30000;60000;30000;10000;20000;150000;100000;30000;20000;16000;16300;300
07002;Ardoix;07;;50000;0;0;0;1000;0;0;25000;15000;5000;5000;1000;940;-60
";
}

#[cfg(test)]
mod tests {
    use zan_dashboard_commune_models::{ColumnSet, Dataset};

    use super::*;

    #[test]
    fn resolves_known_perimeters() {
        assert_eq!(resolve_perimeter("scot"), Ok(Perimeter::Scot));
        assert_eq!(resolve_perimeter(" cc "), Ok(Perimeter::Cc));
    }

    #[test]
    fn rejects_unknown_perimeter() {
        assert_eq!(
            resolve_perimeter("epci"),
            Err(AnalyticsError::UnknownPerimeter {
                value: "epci".to_string()
            })
        );
    }

    #[test]
    fn require_signals_missing_dataset() {
        assert_eq!(
            require(None, Perimeter::Cc),
            Err(AnalyticsError::DataUnavailable {
                perimeter: Perimeter::Cc
            })
        );
        let dataset = Dataset::new(Perimeter::Cc, "CC", ColumnSet::default(), Vec::new());
        assert!(require(Some(&dataset), Perimeter::Cc).is_ok());
    }
}
