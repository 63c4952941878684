//! Feature table loader: per-city, per-date CSV → latest `CitySeed` per city.
//!
//! Expected columns:
//! - `name` (required), `city_id` (defaults to `name`)
//! - `date` (`YYYY-MM-DD`, optional; a trailing time part is ignored)
//! - `lat`, `lon`, `is_captured` (optional)
//! - `dist_to_front_m`, `encirclement_score` (required, numeric)
//! - every other column is read as a numeric feature
//!
//! For each city the row with the latest `date` is the simulation seed.
//! Rows without a date rank below dated ones; among equals, the later row
//! in the file wins.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use front_core::models::keys;
use front_core::{CitySeed, FeatureVector};
use tracing::warn;

const NAME: &str = "name";
const CITY_ID: &str = "city_id";
const DATE: &str = "date";
const LAT: &str = "lat";
const LON: &str = "lon";
const IS_CAPTURED: &str = "is_captured";

/// Descriptive text columns carried by the upstream table; never features.
const TEXT_COLUMNS: [&str; 4] = ["city_name", "oblast", "region", "name_en"];

/// CSV parsing statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub total_rows: u32,
    pub parsed: u32,
    pub failed: u32,
}

#[derive(Debug, Clone)]
struct SeedRow {
    date: Option<NaiveDate>,
    seed: CitySeed,
}

/// Latest seed per city, keyed by `city_id`.
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    rows: BTreeMap<String, SeedRow>,
}

impl FeatureTable {
    pub fn from_reader<R: io::Read>(reader: R) -> Result<(Self, ParseStats)> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers().context("Failed to read CSV header")?.clone();
        let column = |name: &str| headers.iter().position(|h| h == name);

        let name_idx = column(NAME).context("CSV is missing the 'name' column")?;
        for required in [keys::DIST_TO_FRONT, keys::ENCIRCLEMENT] {
            if column(required).is_none() {
                anyhow::bail!("CSV is missing the '{}' column", required);
            }
        }
        let id_idx = column(CITY_ID);
        let date_idx = column(DATE);
        let lat_idx = column(LAT);
        let lon_idx = column(LON);
        let captured_idx = column(IS_CAPTURED);

        let feature_columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(i, h)| {
                *i != name_idx
                    && ![id_idx, date_idx, lat_idx, lon_idx, captured_idx].contains(&Some(*i))
                    && !TEXT_COLUMNS.contains(h)
                    && !h.is_empty()
            })
            .map(|(i, h)| (i, h.to_string()))
            .collect();

        let mut table = FeatureTable::default();
        let mut stats = ParseStats::default();

        for (line, record) in reader.records().enumerate() {
            stats.total_rows += 1;
            // header is line 1
            let line = line + 2;

            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    stats.failed += 1;
                    warn!(line, error = %e, "unreadable CSV row");
                    continue;
                }
            };

            let parsed = parse_row(
                &record,
                name_idx,
                id_idx,
                date_idx,
                lat_idx,
                lon_idx,
                captured_idx,
                &feature_columns,
            );
            match parsed {
                Ok(row) => {
                    stats.parsed += 1;
                    table.insert(row);
                }
                Err(e) => {
                    stats.failed += 1;
                    warn!(line, error = %e, "skipping CSV row");
                }
            }
        }

        Ok((table, stats))
    }

    fn insert(&mut self, row: SeedRow) {
        match self.rows.get(&row.seed.city_id) {
            Some(existing) if existing.date > row.date => {}
            _ => {
                self.rows.insert(row.seed.city_id.clone(), row);
            }
        }
    }

    /// Seed for `city`, matched on `city_id` first, then case-insensitively on name.
    pub fn latest(&self, city: &str) -> Result<&CitySeed> {
        if let Some(row) = self.rows.get(city) {
            return Ok(&row.seed);
        }
        self.rows
            .values()
            .find(|r| r.seed.name.to_lowercase() == city.to_lowercase())
            .map(|r| &r.seed)
            .with_context(|| format!("City '{}' not found", city))
    }

    /// Date of the latest row for `city`, if the table carries dates.
    pub fn seed_date(&self, city_id: &str) -> Option<NaiveDate> {
        self.rows.get(city_id).and_then(|r| r.date)
    }

    /// Most recent date across the whole table.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.values().filter_map(|r| r.date).max()
    }

    pub fn seeds(&self) -> Vec<CitySeed> {
        self.rows.values().map(|r| r.seed.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[allow(clippy::too_many_arguments)]
fn parse_row(
    record: &csv::StringRecord,
    name_idx: usize,
    id_idx: Option<usize>,
    date_idx: Option<usize>,
    lat_idx: Option<usize>,
    lon_idx: Option<usize>,
    captured_idx: Option<usize>,
    feature_columns: &[(usize, String)],
) -> Result<SeedRow> {
    let field = |idx: Option<usize>| idx.and_then(|i| record.get(i)).filter(|s| !s.is_empty());

    let name = field(Some(name_idx)).context("empty city name")?.to_string();
    let city_id = field(id_idx).map(str::to_string).unwrap_or_else(|| name.clone());

    let date = field(date_idx)
        .map(|s| {
            let day = s.get(..10).unwrap_or(s);
            NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .with_context(|| format!("invalid date '{}'", s))
        })
        .transpose()?;

    let mut features = FeatureVector::new();
    for (idx, column) in feature_columns {
        let Some(raw) = field(Some(*idx)) else {
            continue;
        };
        let value: f64 = raw
            .parse()
            .with_context(|| format!("invalid {} value '{}'", column, raw))?;
        features.set(column.clone(), value);
    }

    let mut seed = CitySeed::new(city_id, name, features);

    if let (Some(lat), Some(lon)) = (field(lat_idx), field(lon_idx)) {
        let lat: f64 = lat.parse().with_context(|| format!("invalid lat '{}'", lat))?;
        let lon: f64 = lon.parse().with_context(|| format!("invalid lon '{}'", lon))?;
        seed = seed.with_location(lat, lon);
    }

    if let Some(flag) = field(captured_idx) {
        let captured = match flag.to_ascii_lowercase().as_str() {
            "1" | "1.0" | "true" | "yes" => true,
            "0" | "0.0" | "false" | "no" => false,
            other => anyhow::bail!("invalid is_captured value '{}'", other),
        };
        seed = seed.with_captured(captured);
    }

    Ok(SeedRow { date, seed })
}

/// Load a feature table CSV from disk.
pub fn load_feature_table(csv_path: &Path) -> Result<(FeatureTable, ParseStats)> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open CSV file: {}", csv_path.display()))?;
    FeatureTable::from_reader(file)
        .with_context(|| format!("Failed to parse CSV file: {}", csv_path.display()))
}
