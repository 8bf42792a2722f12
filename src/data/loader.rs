use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type, TimeUnit, TimestampMillisecondType};
use chrono::DateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::DataError;
use super::model::{CellValue, LoadReport, Measurements, Observation, ObservationRow, Position, Variant};

pub const ID_COLUMN: &str = "float_id";
pub const TIME_COLUMN: &str = "time";
pub const LAT_COLUMN: &str = "latitude";
pub const LON_COLUMN: &str = "longitude";

static NULL_CELL: CellValue = CellValue::Null;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load float observations from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one observation per line
/// * `.json`    – `[{ "float_id": ..., "time": ..., ... }, ...]`
/// * `.parquet` – one column per field (strings, numbers, timestamps)
///
/// Rows come back sorted by (float_id, time).
pub fn load_file(path: &Path) -> Result<(Vec<ObservationRow>, LoadReport), DataError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => read_csv(open(path)?)?,
        "json" => read_json(open(path)?)?,
        "parquet" | "pq" => read_parquet(path)?,
        other => return Err(DataError::UnsupportedFormat(other.to_string())),
    };
    normalize(&table)
}

fn open(path: &Path) -> Result<BufReader<File>, DataError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })
}

// ---------------------------------------------------------------------------
// RawTable – cells as read, before any validation
// ---------------------------------------------------------------------------

/// Column names plus rows of cells aligned with them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    fn column_index(&self, name: &str) -> Result<usize, DataError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Normalisation: cells → ordered observation rows
// ---------------------------------------------------------------------------

/// Validate and sort a raw table.
///
/// A missing required column fails the whole load. Individual rows with an
/// empty id, bad coordinates, a non-numeric measurement or an unparseable
/// time are dropped and counted in the report.
pub fn normalize(table: &RawTable) -> Result<(Vec<ObservationRow>, LoadReport), DataError> {
    let id_idx = table.column_index(ID_COLUMN)?;
    let time_idx = table.column_index(TIME_COLUMN)?;
    let lat_idx = table.column_index(LAT_COLUMN)?;
    let lon_idx = table.column_index(LON_COLUMN)?;
    let measure_cols = Variant::File
        .measurement_names()
        .iter()
        .map(|name| Ok((*name, table.column_index(name)?)))
        .collect::<Result<Vec<_>, DataError>>()?;

    let mut report = LoadReport {
        rows_read: table.rows.len(),
        ..LoadReport::default()
    };
    let mut rows = Vec::with_capacity(table.rows.len());

    for cells in &table.rows {
        let cell = |i: usize| cells.get(i).unwrap_or(&NULL_CELL);

        let parsed = (|| {
            let float_id = cell(id_idx).as_id()?;
            let position = Position::new(cell(lat_idx).as_f64()?, cell(lon_idx).as_f64()?)?;
            let measurements = measure_cols
                .iter()
                .map(|&(name, idx)| Some((name.to_string(), cell(idx).as_f64()?)))
                .collect::<Option<Measurements>>()?;
            Some((float_id, position, measurements))
        })();

        let Some((float_id, position, measurements)) = parsed else {
            report.dropped_malformed += 1;
            continue;
        };
        let Some(time) = cell(time_idx).as_timestamp() else {
            report.dropped_untimed += 1;
            continue;
        };

        rows.push(ObservationRow {
            float_id,
            observation: Observation {
                time: Some(time),
                position,
                measurements,
            },
        });
    }

    // Stable, so equal timestamps keep file order.
    rows.sort_by(|a, b| {
        a.float_id
            .cmp(&b.float_id)
            .then_with(|| a.observation.time.cmp(&b.observation.time))
    });

    if report.dropped_malformed > 0 {
        log::warn!(
            "dropped {} of {} rows with a missing id, bad coordinates or non-numeric measurements",
            report.dropped_malformed,
            report.rows_read
        );
    }
    if report.dropped_untimed > 0 {
        log::warn!(
            "dropped {} of {} rows with an unparseable '{TIME_COLUMN}'",
            report.dropped_untimed,
            report.rows_read
        );
    }

    Ok((rows, report))
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, every cell kept as text.
/// Short rows are padded with nulls rather than rejected. Fields that are not
/// valid UTF-8 read as nulls, so only their row is lost.
pub fn read_csv<R: Read>(reader: R) -> Result<RawTable, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns: Vec<String> = reader
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();

    let mut rows = Vec::new();
    for result in reader.byte_records() {
        let record = result?;
        let mut cells: Vec<CellValue> = record
            .iter()
            .map(|field| match std::str::from_utf8(field) {
                Ok("") | Err(_) => CellValue::Null,
                Ok(v) => CellValue::Text(v.to_string()),
            })
            .collect();
        cells.resize(columns.len(), CellValue::Null);
        rows.push(cells);
    }

    Ok(RawTable { columns, rows })
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "float_id": "2902746", "time": "2023-01-01T00:00:00Z",
///     "latitude": -5.1, "longitude": 71.3,
///     "temperature": 28.1, "salinity": 34.9, "pressure": 5.0 },
///   ...
/// ]
/// ```
///
/// `time` may also be a number of epoch milliseconds (the pandas default) or
/// epoch seconds. Columns are the union of keys, in first-seen order.
pub fn read_json<R: Read>(reader: R) -> Result<RawTable, DataError> {
    let root: JsonValue = serde_json::from_reader(reader)?;
    let records = root
        .as_array()
        .ok_or_else(|| DataError::Malformed("expected a top-level JSON array".into()))?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| DataError::Malformed(format!("record {i} is not a JSON object")))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            columns
                .iter()
                .map(|col| obj.get(col).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    Ok(RawTable { columns, rows })
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Load a Parquet file of float observations.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`). Dictionary and view-encoded strings are
/// flattened; columns of types other than strings, numbers, timestamps and
/// dates read as nulls.
fn read_parquet(path: &Path) -> Result<RawTable, DataError> {
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        let decoded = batch
            .columns()
            .iter()
            .map(column_cells)
            .collect::<Result<Vec<_>, _>>()?;

        for row in 0..batch.num_rows() {
            rows.push(decoded.iter().map(|col| col[row].clone()).collect());
        }
    }

    Ok(RawTable { columns, rows })
}

/// Decode one Arrow column into cells.
fn column_cells(col: &ArrayRef) -> Result<Vec<CellValue>, DataError> {
    let n = col.len();
    let wrong_type = || DataError::Malformed(format!("unexpected array for {:?}", col.data_type()));

    let cells = match col.data_type() {
        DataType::Utf8 => {
            let arr = col.as_string_opt::<i32>().ok_or_else(wrong_type)?;
            arr.iter()
                .map(|v| v.map(|s| CellValue::Text(s.to_string())).unwrap_or(CellValue::Null))
                .collect()
        }
        DataType::LargeUtf8 => {
            let arr = col.as_string_opt::<i64>().ok_or_else(wrong_type)?;
            arr.iter()
                .map(|v| v.map(|s| CellValue::Text(s.to_string())).unwrap_or(CellValue::Null))
                .collect()
        }
        // Pandas categoricals and string views carry the same text.
        DataType::Dictionary(_, values) => column_cells(&cast(col, values)?)?,
        DataType::Utf8View => column_cells(&cast(col, &DataType::Utf8)?)?,
        DataType::Timestamp(_, tz) => {
            // Keep the zone so the cast only rescales the UTC instant.
            let ms = cast(col, &DataType::Timestamp(TimeUnit::Millisecond, tz.clone()))?;
            timestamp_cells(&ms)?
        }
        DataType::Date32 | DataType::Date64 => {
            let ms = cast(col, &DataType::Timestamp(TimeUnit::Millisecond, None))?;
            timestamp_cells(&ms)?
        }
        dt if dt.is_integer() => {
            let wide = cast(col, &DataType::Int64)?;
            let arr = wide.as_primitive_opt::<Int64Type>().ok_or_else(wrong_type)?;
            arr.iter()
                .map(|v| v.map(CellValue::Integer).unwrap_or(CellValue::Null))
                .collect()
        }
        dt if dt.is_floating() => {
            let wide = cast(col, &DataType::Float64)?;
            let arr = wide.as_primitive_opt::<Float64Type>().ok_or_else(wrong_type)?;
            arr.iter()
                .map(|v| v.map(CellValue::Float).unwrap_or(CellValue::Null))
                .collect()
        }
        other => {
            log::debug!("ignoring parquet column of type {other:?}");
            vec![CellValue::Null; n]
        }
    };
    Ok(cells)
}

fn timestamp_cells(col: &ArrayRef) -> Result<Vec<CellValue>, DataError> {
    let arr = col
        .as_primitive_opt::<TimestampMillisecondType>()
        .ok_or_else(|| DataError::Malformed("expected millisecond timestamps".into()))?;
    Ok(arr
        .iter()
        .map(|v| {
            v.and_then(DateTime::from_timestamp_millis)
                .map(CellValue::Timestamp)
                .unwrap_or(CellValue::Null)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::index::FloaterIndex;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    use arrow::array::{
        DictionaryArray, Float64Array, Int32Array, StringArray, StringViewArray, TimestampMillisecondArray,
        TimestampSecondArray,
    };
    use arrow::datatypes::Int32Type;
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    const HEADER: &str = "float_id,time,latitude,longitude,temperature,salinity,pressure\n";

    fn load_csv(body: &str) -> (Vec<ObservationRow>, LoadReport) {
        let table = read_csv(format!("{HEADER}{body}").as_bytes()).unwrap();
        normalize(&table).unwrap()
    }

    fn times(rows: &[ObservationRow], id: &str) -> Vec<String> {
        rows.iter()
            .filter(|r| r.float_id == id)
            .map(|r| r.observation.time.unwrap().format("%Y-%m-%d").to_string())
            .collect()
    }

    #[test]
    fn csv_rows_are_sorted_by_id_then_time() {
        let (rows, report) = load_csv(
            "B,2023-01-03,1,70,20,35,10\n\
             A,2023-01-02,1,70,20,35,10\n\
             B,2023-01-01,1,70,20,35,10\n\
             A,2023-01-03,1,70,20,35,10\n\
             B,2023-01-02,1,70,20,35,10\n\
             A,2023-01-01,1,70,20,35,10\n",
        );

        assert_eq!(report.rows_read, 6);
        assert_eq!(report.rows_kept(), 6);
        assert_eq!(rows[0].float_id, "A");
        assert_eq!(rows[3].float_id, "B");
        assert_eq!(times(&rows, "A"), vec!["2023-01-01", "2023-01-02", "2023-01-03"]);
        assert_eq!(times(&rows, "B"), vec!["2023-01-01", "2023-01-02", "2023-01-03"]);

        let index = FloaterIndex::from_rows(rows);
        for floater in index.iter() {
            assert!(floater
                .observations
                .windows(2)
                .all(|w| w[0].time <= w[1].time));
        }
    }

    #[test]
    fn non_numeric_latitude_drops_the_row() {
        let (rows, report) = load_csv(
            "A,2023-01-01,north,70,20,35,10\n\
             B,2023-01-01,1,70,20,35,10\n\
             B,2023-01-02,2,71,20,35,10\n",
        );

        assert_eq!(report.dropped_malformed, 1);
        assert!(rows.iter().all(|r| r.float_id == "B"));

        let index = FloaterIndex::from_rows(rows);
        assert!(index.get("A").is_none());
        assert_eq!(index.get("B").map(|f| f.len()), Some(2));
    }

    #[test]
    fn bad_measurements_and_times_are_counted_separately() {
        let (rows, report) = load_csv(
            "A,2023-01-01,1,70,warm,35,10\n\
             A,not-a-date,1,70,20,35,10\n\
             A,2023-01-02,1,70,20,35,\n\
             A,2023-01-03,1,70,20,35,10\n",
        );

        assert_eq!(report.dropped_malformed, 2);
        assert_eq!(report.dropped_untimed, 1);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn extra_columns_are_ignored_and_columns_may_be_reordered() {
        let table = read_csv(
            "time,float_id,cycle,longitude,latitude,pressure,salinity,temperature\n\
             2023-01-01T06:00:00Z,7,1,70.5,-3.25,10,35.1,28.4\n"
                .as_bytes(),
        )
        .unwrap();
        let (rows, _) = normalize(&table).unwrap();

        let obs = &rows[0].observation;
        assert_eq!(rows[0].float_id, "7");
        assert_eq!(obs.position, Position::new(-3.25, 70.5).unwrap());
        assert_eq!(obs.measurements["temperature"], 28.4);
        assert_eq!(obs.measurements["pressure"], 10.0);
    }

    #[test]
    fn missing_required_column_is_a_data_error() {
        let table = read_csv("float_id,time,latitude,longitude,temperature,salinity\n".as_bytes()).unwrap();
        match normalize(&table) {
            Err(DataError::MissingColumn(col)) => assert_eq!(col, "pressure"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn short_csv_rows_are_padded_and_dropped() {
        let (rows, report) = load_csv("A,2023-01-01,1,70\nA,2023-01-02,1,70,20,35,10\n");
        assert_eq!(report.dropped_malformed, 1);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn invalid_utf8_field_drops_only_its_row() {
        let mut bytes = HEADER.as_bytes().to_vec();
        bytes.extend_from_slice(b"A,2023-01-01,1,70,20,35,10\n");
        bytes.extend_from_slice(b"B,2023-01-01,1,70,20,35,\xff\xfe\n");

        let table = read_csv(bytes.as_slice()).unwrap();
        let (rows, report) = normalize(&table).unwrap();

        assert_eq!(report.rows_read, 2);
        assert_eq!(report.dropped_malformed, 1);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].float_id, "A");
    }

    #[test]
    fn json_epoch_times_load() {
        let json = r#"[
            {"float_id": "A", "time": 1672617600000, "latitude": 1.5, "longitude": 60.0,
             "temperature": 27.0, "salinity": 35.0, "pressure": 4.0},
            {"float_id": "A", "time": 1672531200, "latitude": 1.0, "longitude": 60.5,
             "temperature": 27.5, "salinity": 35.0, "pressure": 4.0}
        ]"#;
        let table = read_json(json.as_bytes()).unwrap();
        let (rows, report) = normalize(&table).unwrap();

        assert_eq!(report.dropped_untimed, 0);
        assert_eq!(times(&rows, "A"), vec!["2023-01-01", "2023-01-02"]);
    }

    #[test]
    fn json_records_load_with_numeric_ids() {
        let json = r#"[
            {"float_id": 42, "time": "2023-02-02T00:00:00Z", "latitude": 1.5, "longitude": 60.0,
             "temperature": 27.0, "salinity": 35.0, "pressure": 4.0},
            {"float_id": 42, "time": "2023-02-01T00:00:00Z", "latitude": 1.0, "longitude": 60.5,
             "temperature": 27.5, "salinity": 35.0, "pressure": 4.0},
            {"float_id": 43, "time": "2023-02-01T00:00:00Z", "latitude": null, "longitude": 60.5,
             "temperature": 27.5, "salinity": 35.0, "pressure": 4.0}
        ]"#;
        let table = read_json(json.as_bytes()).unwrap();
        let (rows, report) = normalize(&table).unwrap();

        assert_eq!(report.dropped_malformed, 1);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].float_id, "42");
        assert_eq!(rows[0].observation.position.lat, 1.0);
    }

    #[test]
    fn json_must_be_an_array_of_objects() {
        assert!(matches!(read_json("{}".as_bytes()), Err(DataError::Malformed(_))));
        assert!(matches!(read_json("[1, 2]".as_bytes()), Err(DataError::Malformed(_))));
        assert!(matches!(read_json("[".as_bytes()), Err(DataError::Json(_))));
    }

    #[test]
    fn arrow_columns_decode_to_cells() {
        let ids: ArrayRef = Arc::new(StringArray::from(vec![Some("A"), None]));
        let ints: ArrayRef = Arc::new(Int32Array::from(vec![Some(3), None]));
        let floats: ArrayRef = Arc::new(Float64Array::from(vec![1.5, -2.0]));
        let ts: ArrayRef = Arc::new(TimestampSecondArray::from(vec![1_672_531_200, 1_672_617_600]));

        assert_eq!(
            column_cells(&ids).unwrap(),
            vec![CellValue::Text("A".into()), CellValue::Null]
        );
        assert_eq!(
            column_cells(&ints).unwrap(),
            vec![CellValue::Integer(3), CellValue::Null]
        );
        assert_eq!(
            column_cells(&floats).unwrap(),
            vec![CellValue::Float(1.5), CellValue::Float(-2.0)]
        );
        assert_eq!(
            column_cells(&ts).unwrap()[0],
            CellValue::Timestamp(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn dictionary_and_view_strings_decode_to_text() {
        let dict: DictionaryArray<Int32Type> = vec!["A", "B", "A"].into_iter().collect();
        let dict: ArrayRef = Arc::new(dict);
        let view: ArrayRef = Arc::new(StringViewArray::from(vec!["A", "B"]));

        assert_eq!(
            column_cells(&dict).unwrap(),
            vec![
                CellValue::Text("A".into()),
                CellValue::Text("B".into()),
                CellValue::Text("A".into())
            ]
        );
        assert_eq!(
            column_cells(&view).unwrap(),
            vec![CellValue::Text("A".into()), CellValue::Text("B".into())]
        );
    }

    #[test]
    fn parquet_file_loads_end_to_end() {
        let ids: DictionaryArray<Int32Type> = vec!["B", "A", "B"].into_iter().collect();
        let stamps = TimestampMillisecondArray::from(vec![
            1_672_617_600_000,
            1_672_531_200_000,
            1_672_531_200_000,
        ])
        .with_timezone("UTC");
        let batch = RecordBatch::try_from_iter(vec![
            ("float_id", Arc::new(ids) as ArrayRef),
            ("time", Arc::new(stamps) as ArrayRef),
            ("latitude", Arc::new(Float64Array::from(vec![1.0, 2.0, 3.0])) as ArrayRef),
            ("longitude", Arc::new(Float64Array::from(vec![70.0, 71.0, 72.0])) as ArrayRef),
            ("temperature", Arc::new(Float64Array::from(vec![20.0, 21.0, 22.0])) as ArrayRef),
            ("salinity", Arc::new(Float64Array::from(vec![35.0; 3])) as ArrayRef),
            ("pressure", Arc::new(Int32Array::from(vec![10, 11, 12])) as ArrayRef),
        ])
        .unwrap();

        let path = std::env::temp_dir().join(format!("floatwatch-loader-{}.parquet", std::process::id()));
        let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let loaded = load_file(&path);
        std::fs::remove_file(&path).unwrap();
        let (rows, report) = loaded.unwrap();

        assert_eq!(report.rows_kept(), 3);
        let ids: Vec<&str> = rows.iter().map(|r| r.float_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "B"]);
        assert_eq!(times(&rows, "B"), vec!["2023-01-01", "2023-01-02"]);
        assert_eq!(rows[0].observation.measurements["pressure"], 11.0);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        match load_file(Path::new("floats.xlsx")) {
            Err(DataError::UnsupportedFormat(ext)) => assert_eq!(ext, "xlsx"),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            load_file(Path::new("/nonexistent/floats.csv")),
            Err(DataError::Io { .. })
        ));
    }
}
