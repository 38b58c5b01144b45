//! Persistence of the report artifact and the processed series.

use csv::WriterBuilder;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::types::MetricSeries;
use crate::error::{ReportError, Result};

/// Writes `contents` to `path` via a sibling temporary file and a rename, so
/// `path` holds either the previous artifact or the complete new one.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| ReportError::io(&dir, e))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| ReportError::Config(format!("{} is not a file path", path.display())))?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(".tmp");
    let tmp = dir.join(tmp_name);

    let result = fs::File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(contents)?;
            file.sync_all()
        })
        .and_then(|_| fs::rename(&tmp, path));

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(ReportError::io(path, e));
    }

    debug!(path = %path.display(), bytes = contents.len(), "Artifact written");
    Ok(())
}

/// Writes every normalized row of `series` to a CSV at `path`, one column
/// per rolling window. Undefined averages are left blank.
pub fn write_series_csv(path: &Path, series: &[&MetricSeries]) -> Result<()> {
    let max_window = series.iter().map(|s| s.max_window).max().unwrap_or(0);

    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    let mut header: Vec<String> = [
        "date",
        "metric",
        "vaccine_status",
        "value",
        "rate_total",
        "rate_12plus",
        "normalized",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    header.extend((1..=max_window).map(|w| format!("ma_{w}d")));
    writer.write_record(&header)?;

    let mut rows = 0usize;
    for s in series {
        for row in &s.rows {
            let mut record = vec![
                row.date.format("%Y-%m-%d").to_string(),
                s.metric.name().to_string(),
                row.status.label().to_string(),
                row.value.to_string(),
                row.rate_total.to_string(),
                row.rate_12plus.map(|v| v.to_string()).unwrap_or_default(),
                row.normalized.to_string(),
            ];
            record.extend(
                (1..=max_window).map(|w| row.moving_average(w).map(|v| v.to_string()).unwrap_or_default()),
            );
            writer.write_record(&record)?;
            rows += 1;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ReportError::io(path, e.into_error()))?;
    write_atomic(path, &bytes)?;

    info!(path = %path.display(), rows, "Series exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::{Metric, SeriesRow, VaccineStatus};
    use chrono::NaiveDate;

    fn series() -> MetricSeries {
        MetricSeries {
            metric: Metric::Cases,
            max_window: 2,
            rows: vec![
                SeriesRow {
                    date: NaiveDate::from_ymd_opt(2021, 9, 1).unwrap(),
                    status: VaccineStatus::FullyVaccinated,
                    value: 12.0,
                    rate_total: 70.5,
                    rate_12plus: None,
                    normalized: 0.25,
                    moving_averages: vec![Some(0.25), None],
                },
                SeriesRow {
                    date: NaiveDate::from_ymd_opt(2021, 9, 2).unwrap(),
                    status: VaccineStatus::FullyVaccinated,
                    value: 14.0,
                    rate_total: 71.0,
                    rate_12plus: Some(80.0),
                    normalized: 0.75,
                    moving_averages: vec![Some(0.75), Some(0.5)],
                },
            ],
        }
    }

    #[test]
    fn test_write_atomic_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("figures").join("report.html");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_write_atomic_rejects_directory_path() {
        let err = write_atomic(Path::new("/"), b"x").unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }

    #[test]
    fn test_write_series_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv");
        let s = series();

        write_series_csv(&path, &[&s]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "date,metric,vaccine_status,value,rate_total,rate_12plus,normalized,ma_1d,ma_2d",
                "2021-09-01,cases,Fully Vaccinated (2 doses),12,70.5,,0.25,0.25,",
                "2021-09-02,cases,Fully Vaccinated (2 doses),14,71,80,0.75,0.75,0.5",
            ]
        );
    }
}
