//! CSV readers for the three input datasets.
//!
//! Columns are looked up by header name so extra columns (age group, other
//! population slices) and column order changes are tolerated.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;

use crate::analyzers::types::{Metric, RawRecord, VaccinationRate};
use crate::error::{ReportError, Result};

pub const DATE_COLUMN: &str = "Date";
pub const STATUS_COLUMN: &str = "Statut_Vaccinal";
pub const VACC_DATE_COLUMN: &str = "Date de vaccination";
pub const VACC_TOTAL_COLUMN: &str = "Ensemble du Québec";
pub const VACC_12PLUS_COLUMN: &str = "12 ans et plus";

/// Parses a case or hospitalization CSV. A blank count is kept as `None`
/// so the row's `(date, status)` key still reaches aggregation.
///
/// # Errors
///
/// [`ReportError::Parse`] on a missing column, an unreadable date or a
/// non-numeric count. `file` only labels the error.
pub fn parse_raw_records<R: Read>(reader: R, metric: Metric, file: &str) -> Result<Vec<RawRecord>> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let date_idx = column_index(&headers, DATE_COLUMN, file)?;
    let status_idx = column_index(&headers, STATUS_COLUMN, file)?;
    let value_idx = column_index(&headers, metric.column(), file)?;

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = line_of(&record);

        records.push(RawRecord {
            date: required_date(field(&record, date_idx), file, line)?,
            status: field(&record, status_idx).to_string(),
            value: parse_number(field(&record, value_idx), file, line)?,
        });
    }

    Ok(records)
}

/// Parses the manually exported vaccination-rate CSV into canonical
/// `(date, rate_total, rate_12plus)` rows.
pub fn parse_vaccination_rates<R: Read>(reader: R, file: &str) -> Result<Vec<VaccinationRate>> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let date_idx = column_index(&headers, VACC_DATE_COLUMN, file)?;
    let total_idx = column_index(&headers, VACC_TOTAL_COLUMN, file)?;
    let plus12_idx = column_index(&headers, VACC_12PLUS_COLUMN, file)?;

    let mut rates = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = line_of(&record);

        let rate_total = parse_number(field(&record, total_idx), file, line)?.ok_or_else(|| {
            ReportError::parse(file, line, format!("blank `{VACC_TOTAL_COLUMN}`"))
        })?;

        rates.push(VaccinationRate {
            date: required_date(field(&record, date_idx), file, line)?,
            rate_total,
            rate_12plus: parse_number(field(&record, plus12_idx), file, line)?,
        });
    }

    Ok(rates)
}

/// Parses `YYYY-MM-DD` or `YYYY/MM/DD`, ignoring any time-of-day suffix.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let day = s.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(day, "%Y/%m/%d"))
        .ok()
}

fn column_index(headers: &StringRecord, name: &str, file: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
        .ok_or_else(|| ReportError::parse(file, 1, format!("missing column `{name}`")))
}

fn field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn required_date(s: &str, file: &str, line: u64) -> Result<NaiveDate> {
    parse_date(s).ok_or_else(|| ReportError::parse(file, line, format!("invalid date `{s}`")))
}

/// Blank cells are `None`. Accepts a trailing `%` and a decimal comma.
fn parse_number(s: &str, file: &str, line: u64) -> Result<Option<f64>> {
    let trimmed = s.trim().trim_end_matches('%').trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .map(Some)
        .map_err(|_| ReportError::parse(file, line, format!("invalid number `{s}`")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2021-09-01"), Some(day(2021, 9, 1)));
        assert_eq!(parse_date("2021/09/01"), Some(day(2021, 9, 1)));
        assert_eq!(parse_date("2021-09-01 00:00:00"), Some(day(2021, 9, 1)));
        assert_eq!(parse_date("2021-09-01T00:00:00Z"), Some(day(2021, 9, 1)));
        assert_eq!(parse_date("01/09/2021"), None);
        assert_eq!(parse_date("2021-9-1"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_raw_records_selects_metric_column() {
        let csv = "\
Date,Statut_Vaccinal,Groupe_Age,Nb_Nvx_Cas
2021-09-01,Non-vacciné,0-9 ans,10
2021-09-01,Non-vacciné,10-19 ans,15
2021-09-01,Vacciné 2 doses,10-19 ans,
";
        let records = parse_raw_records(csv.as_bytes(), Metric::Cases, "cases.csv").unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].status, "Non-vacciné");
        assert_eq!(records[1].value, Some(15.0));
        assert_eq!(records[2].status, "Vacciné 2 doses");
        assert_eq!(records[2].value, None);
    }

    #[test]
    fn test_parse_raw_records_missing_column() {
        let csv = "Date,Statut_Vaccinal,Nb_Nvx_Cas\n2021-09-01,Non-vacciné,1\n";
        let err = parse_raw_records(csv.as_bytes(), Metric::Hospitalizations, "hosp.csv")
            .unwrap_err();
        match err {
            ReportError::Parse { file, line, message } => {
                assert_eq!(file, "hosp.csv");
                assert_eq!(line, 1);
                assert!(message.contains("Nb_Nvelles_Hosp"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_raw_records_bad_value_reports_line() {
        let csv = "Date,Statut_Vaccinal,Nb_Nvelles_Hosp\n2021-09-01,Non-vacciné,1\n2021-09-02,Non-vacciné,abc\n";
        let err = parse_raw_records(csv.as_bytes(), Metric::Hospitalizations, "hosp.csv")
            .unwrap_err();
        assert!(matches!(err, ReportError::Parse { line: 3, .. }));
    }

    #[test]
    fn test_parse_vaccination_rates_renames_columns() {
        let csv = "\u{feff}Date de vaccination,Ensemble du Québec,12 ans et plus,5-11 ans\n\
2021-09-01,\"70,5\",80.1%,0\n\
2021-09-02,71,,0\n";
        let rates = parse_vaccination_rates(csv.as_bytes(), "vaccination.csv").unwrap();
        assert_eq!(
            rates,
            vec![
                VaccinationRate {
                    date: day(2021, 9, 1),
                    rate_total: 70.5,
                    rate_12plus: Some(80.1),
                },
                VaccinationRate {
                    date: day(2021, 9, 2),
                    rate_total: 71.0,
                    rate_12plus: None,
                },
            ]
        );
    }

    #[test]
    fn test_parse_vaccination_rates_blank_total_is_error() {
        let csv = "Date de vaccination,Ensemble du Québec,12 ans et plus\n2021-09-01,,80\n";
        assert!(parse_vaccination_rates(csv.as_bytes(), "vaccination.csv").is_err());
    }
}
