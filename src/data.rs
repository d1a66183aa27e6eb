use crate::config::AppConfig;
use crate::types::{GeoRecord, JoinedRecord, SchoolRecord};
use csv::{ReaderBuilder, StringRecord};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const TOTAL_COLUMN: &str = "totalstd";
pub const MALE_COLUMN: &str = "totalmale";
pub const FEMALE_COLUMN: &str = "totalfemale";
pub const LATITUDE_COLUMN: &str = "latitude";
pub const LONGITUDE_COLUMN: &str = "longitude";

/// Errors raised while loading the enrollment and coordinate sources.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Source not found: {path}")]
    SourceNotFound { path: PathBuf },
    #[error("Required column '{column}' not found in {path}")]
    Schema { path: PathBuf, column: String },
    #[error("Invalid value {value:?} for column '{column}' in {path} at line {line}")]
    InvalidValue {
        path: PathBuf,
        line: u64,
        column: String,
        value: String,
    },
    #[error("Failed to read {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
}

/// Inner join of the school and geo sources, immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinedTable {
    rows: Vec<JoinedRecord>,
    options: Vec<String>,
}

impl JoinedTable {
    pub fn from_rows(rows: Vec<JoinedRecord>) -> Self {
        let options = {
            let mut seen = HashSet::new();
            rows.iter()
                .filter(|row| seen.insert(row.province.as_str()))
                .map(|row| row.province.clone())
                .collect()
        };
        Self { rows, options }
    }

    pub fn rows(&self) -> &[JoinedRecord] {
        &self.rows
    }

    /// Distinct provinces in first-occurrence order.
    pub fn province_options(&self) -> &[String] {
        &self.options
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn load_data(config: &AppConfig) -> Result<JoinedTable, LoadError> {
    info!("Loading data...");

    let schools = load_school_csv(&config.input.student_csv, &config.input.join_column_student)?;
    info!("Loaded {} school rows from {:?}", schools.len(), config.input.student_csv);

    let geos = load_geo_csv(&config.input.map_csv, &config.input.join_column_map)?;
    info!("Loaded {} coordinate rows from {:?}", geos.len(), config.input.map_csv);

    let table = join(&schools, &geos);
    if table.is_empty() {
        warn!("No province appears in both sources; the dashboard will be empty");
    }
    info!(
        "Joined {} rows across {} provinces",
        table.rows().len(),
        table.province_options().len()
    );

    Ok(table)
}

pub fn load_school_csv(path: &Path, join_column: &str) -> Result<Vec<SchoolRecord>, LoadError> {
    read_school_records(open_source(path)?, path, join_column)
}

pub fn load_geo_csv(path: &Path, join_column: &str) -> Result<Vec<GeoRecord>, LoadError> {
    read_geo_records(open_source(path)?, path, join_column)
}

fn open_source(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => LoadError::SourceNotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Csv {
            path: path.to_path_buf(),
            source: e.into(),
        },
    })
}

pub fn read_school_records<R: Read>(
    reader: R,
    source: &Path,
    join_column: &str,
) -> Result<Vec<SchoolRecord>, LoadError> {
    let mut table = CsvSource::new(reader, source)?;
    let key_idx = table.column(join_column)?;
    let total_idx = table.column(TOTAL_COLUMN)?;
    let male_idx = table.column(MALE_COLUMN)?;
    let female_idx = table.column(FEMALE_COLUMN)?;

    let mut records = Vec::new();
    while let Some(record) = table.next_record()? {
        let province = record.get(key_idx).unwrap_or("");
        if province.is_empty() {
            debug!("Skipping row without province in {:?}", source);
            continue;
        }

        records.push(SchoolRecord {
            province: province.to_string(),
            total: table.count(&record, total_idx, TOTAL_COLUMN)?,
            male: table.count(&record, male_idx, MALE_COLUMN)?,
            female: table.count(&record, female_idx, FEMALE_COLUMN)?,
        });
    }

    Ok(records)
}

pub fn read_geo_records<R: Read>(
    reader: R,
    source: &Path,
    join_column: &str,
) -> Result<Vec<GeoRecord>, LoadError> {
    let mut table = CsvSource::new(reader, source)?;
    let key_idx = table.column(join_column)?;
    let lat_idx = table.column(LATITUDE_COLUMN)?;
    let lon_idx = table.column(LONGITUDE_COLUMN)?;

    let mut records = Vec::new();
    while let Some(record) = table.next_record()? {
        let province = record.get(key_idx).unwrap_or("");
        if province.is_empty() {
            debug!("Skipping row without province in {:?}", source);
            continue;
        }

        records.push(GeoRecord {
            province: province.to_string(),
            latitude: table.coordinate(&record, lat_idx, LATITUDE_COLUMN, 90.0)?,
            longitude: table.coordinate(&record, lon_idx, LONGITUDE_COLUMN, 180.0)?,
        });
    }

    Ok(records)
}

/// Inner join on province name. Output follows school order; a school row
/// is repeated once per matching geo row.
pub fn join(schools: &[SchoolRecord], geos: &[GeoRecord]) -> JoinedTable {
    let mut geo_by_province: HashMap<&str, Vec<&GeoRecord>> = HashMap::new();
    for geo in geos {
        geo_by_province.entry(geo.province.as_str()).or_default().push(geo);
    }

    let rows = schools
        .iter()
        .flat_map(|school| {
            geo_by_province
                .get(school.province.as_str())
                .into_iter()
                .flatten()
                .map(move |geo| JoinedRecord {
                    province: school.province.clone(),
                    total: school.total,
                    male: school.male,
                    female: school.female,
                    latitude: geo.latitude,
                    longitude: geo.longitude,
                })
        })
        .collect();

    JoinedTable::from_rows(rows)
}

struct CsvSource<'a, R: Read> {
    reader: csv::Reader<R>,
    headers: StringRecord,
    path: &'a Path,
}

impl<'a, R: Read> CsvSource<'a, R> {
    fn new(reader: R, path: &'a Path) -> Result<Self, LoadError> {
        let mut reader = ReaderBuilder::new().from_reader(reader);
        let headers = reader.headers().map_err(|e| csv_error(path, e))?.clone();
        Ok(Self { reader, headers, path })
    }

    fn column(&self, name: &str) -> Result<usize, LoadError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LoadError::Schema {
                path: self.path.to_path_buf(),
                column: name.to_string(),
            })
    }

    fn next_record(&mut self) -> Result<Option<StringRecord>, LoadError> {
        let mut record = StringRecord::new();
        match self.reader.read_record(&mut record) {
            Ok(true) => Ok(Some(record)),
            Ok(false) => Ok(None),
            Err(e) => Err(csv_error(self.path, e)),
        }
    }

    // Empty cells count as zero.
    fn count(&self, record: &StringRecord, idx: usize, column: &str) -> Result<u32, LoadError> {
        let raw = record.get(idx).unwrap_or("").trim();
        if raw.is_empty() {
            return Ok(0);
        }
        raw.parse().map_err(|_| self.invalid(record, column, raw))
    }

    fn coordinate(
        &self,
        record: &StringRecord,
        idx: usize,
        column: &str,
        limit: f64,
    ) -> Result<f64, LoadError> {
        let raw = record.get(idx).unwrap_or("").trim();
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() && v.abs() <= limit => Ok(v),
            _ => Err(self.invalid(record, column, raw)),
        }
    }

    fn invalid(&self, record: &StringRecord, column: &str, raw: &str) -> LoadError {
        LoadError::InvalidValue {
            path: self.path.to_path_buf(),
            line: record.position().map(|p| p.line()).unwrap_or(0),
            column: column.to_string(),
            value: raw.to_string(),
        }
    }
}

fn csv_error(path: &Path, source: csv::Error) -> LoadError {
    LoadError::Csv {
        path: path.to_path_buf(),
        source,
    }
}
