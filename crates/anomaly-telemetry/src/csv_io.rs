//! CSV input of raw series and CSV persistence of annotated series

use crate::{Error, Result};
use anomaly_core::{AnnotatedRow, AnnotatedSeries, Sample, TimeSeries};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Column order of annotated CSV output
pub const ANNOTATED_COLUMNS: [&str; 9] = [
    "time",
    "value",
    "rolling_mean",
    "rolling_std",
    "anomaly",
    "anomaly_score",
    "anomaly_svm",
    "reconstruction_error",
    "anomaly_lstm",
];

fn parse_cell(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Read a sensor export with `time` and `sensor` columns
pub fn read_sensor_csv(path: impl AsRef<Path>) -> Result<TimeSeries> {
    let file = File::open(path.as_ref())?;
    read_series_csv(file, "time", "sensor")
}

/// Read one numeric column of a CSV file as a time series
///
/// Cells of the value column that are empty or not numbers become gaps. The
/// time column must be numeric and non-decreasing on every row. A missing
/// column, or a value column without a single numeric cell, is an
/// `InvalidSelection`.
pub fn read_series_csv<R: Read>(reader: R, time_col: &str, value_col: &str) -> Result<TimeSeries> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let position = |name: &str| {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            Error::invalid_selection(format!(
                "column '{name}' not found (columns: {})",
                headers.iter().collect::<Vec<_>>().join(", ")
            ))
        })
    };
    let time_idx = position(time_col)?;
    let value_idx = position(value_col)?;

    let mut samples = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record = record?;
        let time_cell = record.get(time_idx).unwrap_or("");
        let time = parse_cell(time_cell).ok_or_else(|| {
            Error::invalid_input(format!(
                "row {}: time '{time_cell}' is not a number",
                row + 1
            ))
        })?;
        let value = record.get(value_idx).and_then(parse_cell);
        samples.push(Sample { time, value });
    }

    if !samples.is_empty() && samples.iter().all(|s| s.value.is_none()) {
        return Err(Error::invalid_selection(format!(
            "column '{value_col}' has no numeric values"
        )));
    }
    let series = TimeSeries::new(value_col, samples)?;
    if series.missing_count() > 0 {
        warn!(
            column = value_col,
            missing = series.missing_count(),
            "non-numeric cells read as gaps"
        );
    }
    debug!(column = value_col, rows = series.len(), "read series from CSV");
    Ok(series)
}

/// Write an annotated series; absent columns are empty cells, flags are 0/1
pub fn write_annotated_csv<W: Write>(writer: W, series: &AnnotatedSeries) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(ANNOTATED_COLUMNS)?;
    for row in series.rows() {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_annotated_csv_path(path: impl AsRef<Path>, series: &AnnotatedSeries) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_annotated_csv(file, series)?;
    debug!(path = %path.as_ref().display(), rows = series.len(), "wrote annotated CSV");
    Ok(())
}

/// Read back a file written by [`write_annotated_csv`]
///
/// Thresholds are not part of the file and come back as `None`.
pub fn read_annotated_csv<R: Read>(reader: R, name: &str) -> Result<AnnotatedSeries> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let rows = csv_reader
        .deserialize::<AnnotatedRow>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(AnnotatedSeries::from_rows(name, rows))
}

pub fn read_annotated_csv_path(path: impl AsRef<Path>) -> Result<AnnotatedSeries> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    read_annotated_csv(File::open(path)?, &name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anomaly_core::ErrorKind;

    #[test]
    fn test_read_sensor_columns() {
        let data = "time,sensor,other\n0,25.1,a\n1,,b\n2,NaN,c\n3,x,d\n4,26.0,e\n";
        let series = read_series_csv(data.as_bytes(), "time", "sensor").unwrap();
        assert_eq!(series.name(), "sensor");
        assert_eq!(series.len(), 5);
        assert_eq!(series.missing_count(), 3);
        assert_eq!(series.drop_missing().complete_values().unwrap(), vec![25.1, 26.0]);
    }

    #[test]
    fn test_missing_or_empty_column_is_invalid_selection() {
        let data = "time,sensor\n0,1.0\n";
        let err = read_series_csv(data.as_bytes(), "time", "rpm").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSelection);
        assert!(err.to_string().contains("rpm"));

        let data = "time,sensor\n0,a\n1,b\n";
        let err = read_series_csv(data.as_bytes(), "time", "sensor").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSelection);
    }

    #[test]
    fn test_bad_time_rejected() {
        let data = "time,sensor\n0,1.0\nsoon,2.0\n";
        let err = read_series_csv(data.as_bytes(), "time", "sensor").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let data = "time,sensor\n1,1.0\n0,2.0\n";
        let err = read_series_csv(data.as_bytes(), "time", "sensor").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_header_only_file_is_empty_series() {
        let series = read_series_csv("time,sensor\n".as_bytes(), "time", "sensor").unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_annotated_layout() {
        let mut row = AnnotatedRow::new(1.0, 25.5);
        row.anomaly = Some(true);
        row.anomaly_score = Some(0.61);
        let series = AnnotatedSeries::from_rows("sensor", vec![row, AnnotatedRow::new(2.0, 25.0)]);

        let mut out = Vec::new();
        write_annotated_csv(&mut out, &series).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ANNOTATED_COLUMNS.join(","));
        assert_eq!(lines[1], "1.0,25.5,,,1,0.61,,,");
        assert_eq!(lines[2], "2.0,25.0,,,,,,,");
    }

    #[test]
    fn test_empty_annotated_series_keeps_header() {
        let series = AnnotatedSeries::from_rows("sensor", Vec::new());
        let mut out = Vec::new();
        write_annotated_csv(&mut out, &series).unwrap();
        let back = read_annotated_csv(out.as_slice(), "sensor").unwrap();
        assert!(back.is_empty());
    }
}
