use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use super::index::FloaterIndex;

// ---------------------------------------------------------------------------
// CellValue – a single raw cell before normalisation
// ---------------------------------------------------------------------------

/// A dynamically-typed input cell, mirroring what CSV / JSON / Arrow hand us.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Timestamp(DateTime<Utc>),
    Null,
}

/// Timestamp layouts accepted for text cells, tried in order after RFC 3339.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

impl CellValue {
    /// Interpret the cell as a finite number. Text is parsed.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            CellValue::Float(v) => *v,
            CellValue::Integer(i) => *i as f64,
            CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        v.is_finite().then_some(v)
    }

    /// Interpret the cell as a floater identifier. Empty text is no identifier.
    pub fn as_id(&self) -> Option<String> {
        match self {
            CellValue::Text(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            CellValue::Integer(i) => Some(i.to_string()),
            CellValue::Float(v) if v.fract() == 0.0 && v.abs() < MAX_EXACT_FLOAT => Some(format!("{}", *v as i64)),
            CellValue::Float(v) => Some(v.to_string()),
            _ => None,
        }
    }

    /// Coerce the cell to a UTC timestamp; `None` when it cannot be parsed.
    /// Numbers are epoch milliseconds, or epoch seconds when small enough.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            CellValue::Timestamp(t) => Some(*t),
            CellValue::Text(s) => parse_timestamp(s),
            CellValue::Integer(i) if i.unsigned_abs() < EPOCH_SECONDS_LIMIT as u64 => {
                DateTime::from_timestamp(*i, 0)
            }
            CellValue::Integer(i) => DateTime::from_timestamp_millis(*i),
            CellValue::Float(v) if v.is_finite() => {
                let millis = if v.abs() < EPOCH_SECONDS_LIMIT { v * 1000.0 } else { *v };
                // Out-of-range values saturate and are then rejected by chrono.
                DateTime::from_timestamp_millis(millis.round() as i64)
            }
            _ => None,
        }
    }
}

/// Largest magnitude integral float rendered as an integer id.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// Epoch numbers below this are seconds (up to year 5138); above, milliseconds.
const EPOCH_SECONDS_LIMIT: f64 = 1e11;

/// Parse the timestamp layouts seen in float exports. Naive values are UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    for layout in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ---------------------------------------------------------------------------
// Observation – one reading of one floater
// ---------------------------------------------------------------------------

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    /// Build a position, rejecting non-finite or out-of-range coordinates.
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        valid.then_some(Position { lat, lon })
    }

    /// `[lon, lat]` ordering used by map layers and GeoJSON.
    pub fn lon_lat(&self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = if self.lat < 0.0 { 'S' } else { 'N' };
        let ew = if self.lon < 0.0 { 'W' } else { 'E' };
        write!(f, "{:.3}°{ns} {:.3}°{ew}", self.lat.abs(), self.lon.abs())
    }
}

/// Measurement name → value.
pub type Measurements = BTreeMap<String, f64>;

/// One timestamped (or step-indexed) reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Absent for synthetic data, where order is the generation step.
    pub time: Option<DateTime<Utc>>,
    pub position: Position,
    pub measurements: Measurements,
}

/// Loader output: an observation tagged with its floater.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRow {
    pub float_id: String,
    pub observation: Observation,
}

// ---------------------------------------------------------------------------
// Floater – one drifting unit and its track
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Floater {
    pub id: String,
    /// Never empty; ordered by time or generation step.
    pub observations: Vec<Observation>,
}

impl Floater {
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first_position(&self) -> Option<Position> {
        self.observations.first().map(|o| o.position)
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.observations.iter().map(|o| o.position)
    }

    /// Whether every observation carries a timestamp.
    pub fn is_timed(&self) -> bool {
        self.observations.iter().all(|o| o.time.is_some())
    }
}

// ---------------------------------------------------------------------------
// Dataset – the immutable loaded context
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Synthetic,
    File,
}

impl Variant {
    /// The fixed measurement set of each variant, in display order.
    pub fn measurement_names(&self) -> &'static [&'static str] {
        match self {
            Variant::Synthetic => &["temperature", "salinity", "pH"],
            Variant::File => &["temperature", "salinity", "pressure"],
        }
    }
}

/// Row accounting for one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_read: usize,
    pub dropped_malformed: usize,
    pub dropped_untimed: usize,
}

impl LoadReport {
    pub fn rows_kept(&self) -> usize {
        self.rows_read - self.dropped_malformed - self.dropped_untimed
    }
}

/// Built once per load and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub variant: Variant,
    /// Where the rows came from (file name or seed), for the status bar.
    pub label: String,
    pub index: FloaterIndex,
    pub report: LoadReport,
}

impl Dataset {
    pub fn measurement_names(&self) -> &'static [&'static str] {
        self.variant.measurement_names()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
