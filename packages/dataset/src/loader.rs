//! CSV loader for the NAF consumption exports.
//!
//! Reads a semicolon-separated export into a [`Dataset`]. Every numeric
//! column is coerced (non-numeric or missing values become 0) and surfaces
//! are converted to m² according to the perimeter's declared
//! [`ColumnUnits`]. Columns absent from the header are recorded in the
//! dataset's [`ColumnSet`] and contribute zero.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use zan_dashboard_commune_models::{
    ColumnSet, CommuneRecord, Dataset, Destination, Perimeter, YearPair, to_hectares,
};

use crate::DatasetError;
use crate::registry::{ColumnUnits, PerimeterDefinition};

/// INSEE commune code.
pub const COMMUNE_ID_COLUMN: &str = "idcom";
/// Commune name.
pub const COMMUNE_NAME_COLUMN: &str = "idcomtxt";
/// Department code.
pub const DEPARTMENT_COLUMN: &str = "iddep";
/// 2020 attraction-area typology.
pub const TYPOLOGY_COLUMN: &str = "aav2020_typo";
/// NAF consumption over 2009-2024.
pub const TOTAL_COLUMN: &str = "naf09art24";
/// Precomputed ranking total, in hectares.
pub const ARTIF_TOTAL_HA_COLUMN: &str = "artif_total_ha";
/// 2015 population.
pub const POPULATION_2015_COLUMN: &str = "pop15";
/// 2021 population.
pub const POPULATION_2021_COLUMN: &str = "pop21";
/// Population change 2015-2021.
pub const POPULATION_DELTA_COLUMN: &str = "pop1521";

/// Header positions of every column the loader understands.
#[derive(Debug, Default)]
struct ColumnLayout {
    commune_id: Option<usize>,
    commune_name: Option<usize>,
    department: Option<usize>,
    typology: Option<usize>,
    total: Option<usize>,
    artif_total_ha: Option<usize>,
    population_2015: Option<usize>,
    population_2021: Option<usize>,
    population_delta: Option<usize>,
    year_pairs: Vec<(YearPair, usize)>,
    destinations: Vec<(Destination, usize)>,
}

impl ColumnLayout {
    fn from_headers(headers: &[String]) -> Self {
        let mut layout = Self::default();

        for (i, header) in headers.iter().enumerate() {
            match header.as_str() {
                COMMUNE_ID_COLUMN => layout.commune_id = Some(i),
                COMMUNE_NAME_COLUMN => layout.commune_name = Some(i),
                DEPARTMENT_COLUMN => layout.department = Some(i),
                TYPOLOGY_COLUMN => layout.typology = Some(i),
                TOTAL_COLUMN => layout.total = Some(i),
                ARTIF_TOTAL_HA_COLUMN => layout.artif_total_ha = Some(i),
                POPULATION_2015_COLUMN => layout.population_2015 = Some(i),
                POPULATION_2021_COLUMN => layout.population_2021 = Some(i),
                POPULATION_DELTA_COLUMN => layout.population_delta = Some(i),
                other => {
                    if let Some(pair) = YearPair::from_column(other) {
                        layout.year_pairs.push((pair, i));
                    } else if let Some(destination) = Destination::from_column(other) {
                        layout.destinations.push((destination, i));
                    }
                }
            }
        }

        layout
    }

    fn columns(&self) -> ColumnSet {
        ColumnSet {
            year_pairs: self.year_pairs.iter().map(|(pair, _)| *pair).collect(),
            destinations: self.destinations.iter().map(|(d, _)| *d).collect(),
        }
    }

    fn read_record(&self, row: &csv::StringRecord, units: ColumnUnits) -> CommuneRecord {
        let text = |idx: Option<usize>| idx.and_then(|i| row.get(i)).map_or("", str::trim);
        let number = |idx: Option<usize>| parse_number(text(idx));

        let id = text(self.commune_id.or(self.commune_name));
        let name = text(self.commune_name.or(self.commune_id));

        let mut record = CommuneRecord::new(id, text(self.department)).with_name(name);
        record.typology_code = normalize_code(text(self.typology));

        let consumption_factor = units.consumption.to_square_meters();
        for (pair, idx) in &self.year_pairs {
            let value = non_negative(number(Some(*idx)), id) * consumption_factor;
            record = record.with_consumption(*pair, value);
        }

        let destination_factor = units.destinations.to_square_meters();
        for (destination, idx) in &self.destinations {
            let value = non_negative(number(Some(*idx)), id) * destination_factor;
            record = record.with_destination(*destination, value);
        }

        record = if self.total.is_some() {
            record.with_total(non_negative(number(self.total), id) * consumption_factor)
        } else {
            let summed = record.window_m2(YearPair::all());
            record.with_total(summed)
        };

        if self.artif_total_ha.is_some() {
            record.artif_total_ha = non_negative(number(self.artif_total_ha), id);
        }

        record.with_population(
            to_count(number(self.population_2015)),
            to_count(number(self.population_2021)),
            to_count(number(self.population_delta)),
        )
    }
}

/// Parses a numeric cell. Accepts `,` as decimal separator; empty,
/// non-numeric and non-finite values coerce to 0.
#[must_use]
pub fn parse_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let value = trimmed
        .parse::<f64>()
        .or_else(|_| trimmed.replace(',', ".").parse::<f64>());
    match value {
        Ok(v) if v.is_finite() => v,
        _ => {
            log::debug!("Coercing non-numeric value '{trimmed}' to 0");
            0.0
        }
    }
}

/// Normalizes a typology code: `"11.0"` becomes `"11"`, blanks become
/// `None`, anything else is kept verbatim.
#[must_use]
pub fn normalize_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        #[allow(clippy::cast_possible_truncation)]
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Some(format!("{}", v as i64)),
        _ => Some(trimmed.to_string()),
    }
}

fn non_negative(value: f64, commune_id: &str) -> f64 {
    if value < 0.0 {
        log::debug!("Clamping negative surface {value} to 0 for commune {commune_id}");
        0.0
    } else {
        value
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_count(value: f64) -> i64 {
    value.round() as i64
}

/// Parses a perimeter export from any reader.
///
/// # Errors
///
/// Returns [`DatasetError::Csv`] if the CSV is malformed, or
/// [`DatasetError::MissingColumn`] if neither `idcom` nor `idcomtxt` is
/// present to identify communes.
pub fn parse_dataset<R: Read>(
    definition: &PerimeterDefinition,
    reader: R,
) -> Result<Dataset, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(definition.delimiter_byte())
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_owned())
        .collect();

    let layout = ColumnLayout::from_headers(&headers);
    if layout.commune_id.is_none() && layout.commune_name.is_none() {
        return Err(DatasetError::MissingColumn {
            perimeter: definition.id,
            message: format!("expected '{COMMUNE_ID_COLUMN}' or '{COMMUNE_NAME_COLUMN}'"),
        });
    }

    let columns = layout.columns();
    log::debug!(
        "[{}] {} yearly windows, {} destination columns, total column {}",
        definition.id,
        columns.year_pairs.len(),
        columns.destinations.len(),
        if layout.total.is_some() {
            "present"
        } else {
            "derived"
        }
    );

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;
        records.push(layout.read_record(&row, definition.units));
    }

    let dataset = Dataset::new(definition.id, definition.name.clone(), columns, records);

    log::info!(
        "[{}] Loaded {} communes ({:.2} ha consumed 2009-2024)",
        definition.id,
        dataset.len(),
        to_hectares(dataset.records.iter().map(|r| r.consumption_total_m2).sum())
    );

    Ok(dataset)
}

/// Loads a perimeter export from `data_dir`.
///
/// # Errors
///
/// Returns [`DatasetError::Io`] if the file cannot be opened, or any error
/// from [`parse_dataset`].
pub fn load_dataset(
    definition: &PerimeterDefinition,
    data_dir: &Path,
) -> Result<Dataset, DatasetError> {
    let path = definition.data_path(data_dir);
    log::info!("[{}] Reading {}", definition.id, path.display());

    let file = File::open(&path).map_err(|source| DatasetError::Io {
        path: path.clone(),
        source,
    })?;

    parse_dataset(definition, BufReader::new(file))
}

/// Loads every perimeter in `definitions`, stopping at the first failure.
///
/// # Errors
///
/// Returns the first error from [`load_dataset`].
pub fn load_all(
    definitions: &[PerimeterDefinition],
    data_dir: &Path,
) -> Result<Vec<(Perimeter, Dataset)>, DatasetError> {
    definitions
        .iter()
        .map(|definition| load_dataset(definition, data_dir).map(|d| (definition.id, d)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{SurfaceUnit, definition, parse_definition};

    fn parse(csv: &str) -> Dataset {
        parse_dataset(&definition(Perimeter::Scot), csv.as_bytes()).unwrap()
    }

    #[test]
    fn parses_core_columns() {
        let dataset = parse(
            "idcom;idcomtxt;iddep;aav2020_typo;naf09art24;naf21art22;art09hab24;pop15;pop21;pop1521\n\
             26001;Albon;26;12;25000;4000;12000;1800;1900;100\n",
        );

        assert_eq!(dataset.perimeter, Perimeter::Scot);
        assert_eq!(dataset.name, "SCoT des Rives du Rhône");
        assert_eq!(dataset.len(), 1);

        let record = &dataset.records[0];
        assert_eq!(record.commune_id, "26001");
        assert_eq!(record.commune_name, "Albon");
        assert_eq!(record.department_id, "26");
        assert_eq!(record.typology_code.as_deref(), Some("12"));
        assert!((record.consumption_total_m2 - 25_000.0).abs() < f64::EPSILON);
        assert!((record.artif_total_ha - 2.5).abs() < f64::EPSILON);
        assert!((record.consumption(YearPair::new(21).unwrap()) - 4_000.0).abs() < f64::EPSILON);
        assert!((record.destination(Destination::Habitat) - 12_000.0).abs() < f64::EPSILON);
        assert_eq!(record.population_2015, 1_800);
        assert_eq!(record.population_2021, 1_900);
        assert_eq!(record.population_delta, 100);
    }

    #[test]
    fn records_which_columns_were_present() {
        let dataset = parse("idcomtxt;naf10art11;naf23art24;art09rou24\nA;1;2;3\n");
        let present: Vec<YearPair> = dataset.columns.year_pairs.iter().copied().collect();
        assert_eq!(present, vec![YearPair::new(10).unwrap(), YearPair::new(23).unwrap()]);
        assert!(dataset.columns.has_destination(Destination::Routes));
        assert!(!dataset.columns.has_destination(Destination::Habitat));
    }

    #[test]
    fn ignores_malformed_window_headers() {
        let dataset = parse("idcom;naf255art00;naf21art22\n26001;5;70000\n");
        let present: Vec<YearPair> = dataset.columns.year_pairs.iter().copied().collect();
        assert_eq!(present, vec![YearPair::new(21).unwrap()]);
        assert!((dataset.records[0].consumption_total_m2 - 70_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn derives_total_from_windows_when_absent() {
        let dataset = parse("idcomtxt;naf22art23;naf23art24\nA;10000;40000\n");
        let record = &dataset.records[0];
        assert!((record.consumption_total_m2 - 50_000.0).abs() < f64::EPSILON);
        assert!((record.artif_total_ha - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn explicit_ranking_total_overrides_derived_one() {
        let dataset = parse("idcomtxt;naf09art24;artif_total_ha\nA;50000;7.5\n");
        let record = &dataset.records[0];
        assert!((record.consumption_total_m2 - 50_000.0).abs() < f64::EPSILON);
        assert!((record.artif_total_ha - 7.5).abs() < f64::EPSILON);
    }

    #[test]
    fn coerces_bad_values_to_zero() {
        let dataset = parse("idcomtxt;naf21art22;naf22art23;naf23art24;pop1521\nA;n/a;;-50;abc\n");
        let record = &dataset.records[0];
        assert!(record.window_m2(YearPair::recent()).abs() < f64::EPSILON);
        assert_eq!(record.population_delta, 0);
    }

    #[test]
    fn keeps_negative_population_change() {
        let dataset = parse("idcomtxt;pop1521\nA;-42\n");
        assert_eq!(dataset.records[0].population_delta, -42);
    }

    #[test]
    fn strips_byte_order_mark_from_first_header() {
        let dataset = parse("\u{feff}idcom;naf23art24\n26001;5\n");
        assert_eq!(dataset.records[0].commune_id, "26001");
    }

    #[test]
    fn falls_back_between_id_and_name() {
        let by_name = parse("idcomtxt;iddep\nAlbon;26\n");
        assert_eq!(by_name.records[0].commune_id, "Albon");
        let by_id = parse("idcom;iddep\n26001;26\n");
        assert_eq!(by_id.records[0].commune_name, "26001");
    }

    #[test]
    fn converts_hectare_columns_to_square_meters() {
        let definition = parse_definition(
            "hectares",
            r#"
id = "cc"
name = "CC"
short_label = "CC"
file = "cc.csv"

[units]
consumption = "ha"
destinations = "ha"
"#,
        )
        .unwrap();
        assert_eq!(definition.units.destinations, SurfaceUnit::Ha);

        let dataset = parse_dataset(
            &definition,
            "idcomtxt;naf09art24;naf23art24;art09act24\nA;2,5;0.5;1\n".as_bytes(),
        )
        .unwrap();
        let record = &dataset.records[0];
        assert!((record.consumption_total_m2 - 25_000.0).abs() < 1e-6);
        assert!((record.consumption(YearPair::new(23).unwrap()) - 5_000.0).abs() < 1e-6);
        assert!((record.destination(Destination::Activites) - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_files_without_commune_identifier() {
        let result = parse_dataset(
            &definition(Perimeter::Cc),
            "iddep;naf23art24\n26;5\n".as_bytes(),
        );
        assert!(matches!(
            result,
            Err(DatasetError::MissingColumn {
                perimeter: Perimeter::Cc,
                ..
            })
        ));
    }

    #[test]
    fn normalizes_typology_codes() {
        assert_eq!(normalize_code("11"), Some("11".to_string()));
        assert_eq!(normalize_code("30.0"), Some("30".to_string()));
        assert_eq!(normalize_code(" "), None);
        assert_eq!(normalize_code("X1"), Some("X1".to_string()));
    }

    #[test]
    fn parses_numbers_leniently() {
        assert!((parse_number("12.5") - 12.5).abs() < f64::EPSILON);
        assert!((parse_number("12,5") - 12.5).abs() < f64::EPSILON);
        assert!(parse_number("NaN").abs() < f64::EPSILON);
        assert!(parse_number("inf").abs() < f64::EPSILON);
        assert!(parse_number("").abs() < f64::EPSILON);
    }

    #[test]
    fn load_dataset_reports_missing_file() {
        let result = load_dataset(
            &definition(Perimeter::Scot),
            Path::new("/nonexistent/zan-dashboard"),
        );
        assert!(matches!(result, Err(DatasetError::Io { .. })));
        let message = result.unwrap_err().to_string();
        assert!(message.contains("/nonexistent/zan-dashboard"));
    }
}
