#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Commune record types and the column vocabulary of the NAF consumption files.
//!
//! This crate defines the canonical in-memory shape of one perimeter's
//! dataset: one [`CommuneRecord`] per commune, with yearly NAF consumption
//! windows, artificialization by destination, and population figures. All
//! surface values are stored in square meters; the loader normalizes source
//! units once, so consumers only ever divide by [`SQUARE_METERS_PER_HECTARE`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Conversion factor between the stored unit (m²) and hectares.
pub const SQUARE_METERS_PER_HECTARE: f64 = 10_000.0;

/// Converts a surface in square meters to hectares.
#[must_use]
pub fn to_hectares(square_meters: f64) -> f64 {
    square_meters / SQUARE_METERS_PER_HECTARE
}

/// One of the two territorial groupings the dashboard reports on.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Perimeter {
    /// Schéma de cohérence territoriale des Rives du Rhône.
    Scot,
    /// Communauté de communes Porte de DrômArdèche.
    Cc,
}

impl Perimeter {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Scot, Self::Cc]
    }
}

/// A one-year consumption window `(Y, Y+1)`, identified by its start year
/// of century (`9` for 2009-10 through `23` for 2023-24).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct YearPair(u8);

impl YearPair {
    /// Start year of the earliest window (2009-10).
    pub const FIRST: u8 = 9;
    /// Start year of the latest window (2023-24).
    pub const LAST: u8 = 23;
    /// Number of yearly windows in the source files.
    pub const COUNT: usize = (Self::LAST - Self::FIRST + 1) as usize;

    /// Creates the window starting at `start` (year of century), or `None`
    /// if it is outside `9..=23`.
    #[must_use]
    pub const fn new(start: u8) -> Option<Self> {
        if start >= Self::FIRST && start <= Self::LAST {
            Some(Self(start))
        } else {
            None
        }
    }

    /// Start year of century.
    #[must_use]
    pub const fn start(self) -> u8 {
        self.0
    }

    /// End year of century.
    #[must_use]
    pub const fn end(self) -> u8 {
        self.0 + 1
    }

    /// Full calendar year the window ends in (e.g. `2024` for 2023-24).
    #[must_use]
    pub const fn end_year(self) -> u16 {
        2000 + self.end() as u16
    }

    /// Position of this window in [`CommuneRecord::consumption_m2`].
    #[must_use]
    pub const fn index(self) -> usize {
        (self.0 - Self::FIRST) as usize
    }

    /// Source column holding this window, e.g. `naf21art22`.
    #[must_use]
    pub fn column(self) -> String {
        format!("naf{:02}art{:02}", self.start(), self.end())
    }

    /// Period label, e.g. `2009-10`.
    #[must_use]
    pub fn label(self) -> String {
        format!("20{:02}-{:02}", self.start(), self.end())
    }

    /// Parses a yearly window column name such as `naf15art16`.
    #[must_use]
    pub fn from_column(name: &str) -> Option<Self> {
        let rest = name.strip_prefix("naf")?;
        let (start, end) = rest.split_once("art")?;
        let start: u8 = start.parse().ok()?;
        let end: u8 = end.parse().ok()?;
        let pair = Self::new(start)?;
        (pair.end() == end).then_some(pair)
    }

    /// All 15 windows, oldest first.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::range(Self::FIRST, Self::LAST)
    }

    /// The ten windows 2011-12 through 2020-21 that form the ZAN
    /// reference decade.
    pub fn reference_decade() -> impl Iterator<Item = Self> {
        Self::range(11, 20)
    }

    /// The three windows 2021-22 through 2023-24 counted against the
    /// allowance.
    pub fn recent() -> impl Iterator<Item = Self> {
        Self::range(21, 23)
    }

    /// The six windows 2015-16 through 2020-21 matching the 2015-2021
    /// census interval.
    pub fn census_interval() -> impl Iterator<Item = Self> {
        Self::range(15, 20)
    }

    fn range(first: u8, last: u8) -> impl Iterator<Item = Self> {
        (first..=last).filter_map(Self::new)
    }
}

impl TryFrom<u8> for YearPair {
    type Error = InvalidYearPairError;

    fn try_from(start: u8) -> Result<Self, Self::Error> {
        Self::new(start).ok_or(InvalidYearPairError { start })
    }
}

impl From<YearPair> for u8 {
    fn from(pair: YearPair) -> Self {
        pair.0
    }
}

/// Error returned when a window start year is outside `9..=23`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidYearPairError {
    /// The rejected start year.
    pub start: u8,
}

impl std::fmt::Display for InvalidYearPairError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid year window start {}: expected {}-{}",
            self.start,
            YearPair::FIRST,
            YearPair::LAST
        )
    }
}

impl std::error::Error for InvalidYearPairError {}

/// Destination of artificialized land over 2009-2024.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Destination {
    /// Housing
    Habitat,
    /// Economic activity
    Activites,
    /// Mixed housing/activity
    Mixte,
    /// Roads
    Routes,
    /// Railways
    Ferroviaire,
    /// Unknown destination
    Inconnu,
}

impl Destination {
    /// Number of destinations.
    pub const COUNT: usize = 6;

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Habitat,
            Self::Activites,
            Self::Mixte,
            Self::Routes,
            Self::Ferroviaire,
            Self::Inconnu,
        ]
    }

    /// The four destinations shown in rankings and typology breakdowns.
    #[must_use]
    pub const fn main() -> &'static [Self] {
        &[Self::Habitat, Self::Activites, Self::Mixte, Self::Routes]
    }

    /// Source column for this destination.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Habitat => "art09hab24",
            Self::Activites => "art09act24",
            Self::Mixte => "art09mix24",
            Self::Routes => "art09rou24",
            Self::Ferroviaire => "art09fer24",
            Self::Inconnu => "art09inc24",
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Habitat => "Habitat",
            Self::Activites => "Activités",
            Self::Mixte => "Mixte",
            Self::Routes => "Routes",
            Self::Ferroviaire => "Ferroviaire",
            Self::Inconnu => "Inconnu",
        }
    }

    /// Position of this destination in [`CommuneRecord::destinations_m2`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Finds the destination stored in `column`.
    #[must_use]
    pub fn from_column(column: &str) -> Option<Self> {
        Self::all().iter().copied().find(|d| d.column() == column)
    }
}

/// Commune typology in the 2020 urban attraction area zoning (`aav2020_typo`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Typology {
    /// Code 11: main pole of an attraction area
    MainPole,
    /// Code 12: crown of a large attraction area
    Crown,
    /// Code 20: small and medium attraction areas
    SmallArea,
    /// Code 30: outside any attraction area
    OutsideAttraction,
}

/// Label used for communes without a recognized typology.
pub const OTHER_TYPOLOGY_LABEL: &str = "Autre";

impl Typology {
    /// Returns all variants of this enum, in code order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::MainPole,
            Self::Crown,
            Self::SmallArea,
            Self::OutsideAttraction,
        ]
    }

    /// Source code, as found in `aav2020_typo`.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MainPole => "11",
            Self::Crown => "12",
            Self::SmallArea => "20",
            Self::OutsideAttraction => "30",
        }
    }

    /// Human-readable label shown in filters and charts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MainPole => "Pôles principaux",
            Self::Crown => "Couronnes grandes aires",
            Self::SmallArea => "Petites/moyennes aires",
            Self::OutsideAttraction => "Hors attraction (rural)",
        }
    }

    /// Looks up a typology by source code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.code() == code)
    }

    /// Looks up a typology by display label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.label() == label)
    }
}

/// The source columns that were present when a dataset was loaded.
///
/// Absent columns behave as zero in every sum, but builders that emit one
/// entry per column (annual evolution, repartition) skip them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSet {
    /// Yearly consumption windows present in the source.
    pub year_pairs: BTreeSet<YearPair>,
    /// Destination columns present in the source.
    pub destinations: BTreeSet<Destination>,
}

impl ColumnSet {
    /// A column set with every known column present.
    #[must_use]
    pub fn complete() -> Self {
        Self {
            year_pairs: YearPair::all().collect(),
            destinations: Destination::all().iter().copied().collect(),
        }
    }

    /// Whether the yearly window column was present.
    #[must_use]
    pub fn has_year_pair(&self, pair: YearPair) -> bool {
        self.year_pairs.contains(&pair)
    }

    /// Whether the destination column was present.
    #[must_use]
    pub fn has_destination(&self, destination: Destination) -> bool {
        self.destinations.contains(&destination)
    }
}

/// One commune of a perimeter dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommuneRecord {
    /// Commune identifier, unique within a perimeter.
    pub commune_id: String,
    /// Commune display name.
    pub commune_name: String,
    /// Department identifier.
    pub department_id: String,
    /// `aav2020_typo` code, if any.
    pub typology_code: Option<String>,
    /// NAF consumption per yearly window, in m², indexed by
    /// [`YearPair::index`].
    pub consumption_m2: [f64; YearPair::COUNT],
    /// NAF consumption over 2009-2024 (`naf09art24`), in m².
    pub consumption_total_m2: f64,
    /// Artificialized total used for rankings, in hectares.
    pub artif_total_ha: f64,
    /// Artificialization by destination, in m², indexed by
    /// [`Destination::index`].
    pub destinations_m2: [f64; Destination::COUNT],
    /// 2015 population.
    pub population_2015: i64,
    /// 2021 population.
    pub population_2021: i64,
    /// Population change 2015-2021, as supplied by the source.
    pub population_delta: i64,
}

impl CommuneRecord {
    /// Creates a record with every figure at zero.
    #[must_use]
    pub fn new(commune_id: impl Into<String>, department_id: impl Into<String>) -> Self {
        let commune_id = commune_id.into();
        Self {
            commune_name: commune_id.clone(),
            commune_id,
            department_id: department_id.into(),
            typology_code: None,
            consumption_m2: [0.0; YearPair::COUNT],
            consumption_total_m2: 0.0,
            artif_total_ha: 0.0,
            destinations_m2: [0.0; Destination::COUNT],
            population_2015: 0,
            population_2021: 0,
            population_delta: 0,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.commune_name = name.into();
        self
    }

    /// Sets the typology code.
    #[must_use]
    pub fn with_typology_code(mut self, code: impl Into<String>) -> Self {
        self.typology_code = Some(code.into());
        self
    }

    /// Sets one yearly window, in m².
    #[must_use]
    pub fn with_consumption(mut self, pair: YearPair, square_meters: f64) -> Self {
        self.consumption_m2[pair.index()] = square_meters;
        self
    }

    /// Sets one destination total, in m².
    #[must_use]
    pub fn with_destination(mut self, destination: Destination, square_meters: f64) -> Self {
        self.destinations_m2[destination.index()] = square_meters;
        self
    }

    /// Sets the 2009-2024 total (m²) and derives the ranking total from it.
    #[must_use]
    pub fn with_total(mut self, square_meters: f64) -> Self {
        self.consumption_total_m2 = square_meters;
        self.artif_total_ha = to_hectares(square_meters);
        self
    }

    /// Sets the 2015 and 2021 populations and the supplied delta.
    #[must_use]
    pub const fn with_population(mut self, pop_2015: i64, pop_2021: i64, delta: i64) -> Self {
        self.population_2015 = pop_2015;
        self.population_2021 = pop_2021;
        self.population_delta = delta;
        self
    }

    /// Consumption of one yearly window, in m².
    #[must_use]
    pub const fn consumption(&self, pair: YearPair) -> f64 {
        self.consumption_m2[pair.index()]
    }

    /// Summed consumption over several windows, in m².
    #[must_use]
    pub fn window_m2(&self, pairs: impl IntoIterator<Item = YearPair>) -> f64 {
        pairs.into_iter().map(|pair| self.consumption(pair)).sum()
    }

    /// Artificialization toward one destination, in m².
    #[must_use]
    pub const fn destination(&self, destination: Destination) -> f64 {
        self.destinations_m2[destination.index()]
    }

    /// Recognized typology, if the code is one of the four known ones.
    #[must_use]
    pub fn typology(&self) -> Option<Typology> {
        self.typology_code.as_deref().and_then(Typology::from_code)
    }
}

/// A loaded perimeter: ordered commune records plus the columns that were
/// present in the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Which perimeter this dataset covers.
    pub perimeter: Perimeter,
    /// Display name of the perimeter.
    pub name: String,
    /// Columns present in the source file.
    pub columns: ColumnSet,
    /// One record per commune, in file order.
    pub records: Vec<CommuneRecord>,
}

impl Dataset {
    /// Creates a dataset from already-normalized records.
    #[must_use]
    pub fn new(
        perimeter: Perimeter,
        name: impl Into<String>,
        columns: ColumnSet,
        records: Vec<CommuneRecord>,
    ) -> Self {
        Self {
            perimeter,
            name: name.into(),
            columns,
            records,
        }
    }

    /// Number of communes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no commune.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
