//! The report pipeline: acquire, load, process, publish.

use chrono::NaiveDate;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::analyzers::analyzer::analyze;
use crate::analyzers::types::{Metric, MetricSeries, RawRecord, VaccinationRate, VaccineStatus};
use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::fetch::{HttpClient, download_to};
use crate::output::{write_atomic, write_series_csv};
use crate::parser::{parse_raw_records, parse_vaccination_rates};
use crate::report::render_report;

/// Parsed contents of the three input files.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub hospitalizations: Vec<RawRecord>,
    pub cases: Vec<RawRecord>,
    pub rates: Vec<VaccinationRate>,
}

/// Processed series for both panels.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub hospitalizations: MetricSeries,
    pub cases: MetricSeries,
}

impl Report {
    pub fn series(&self, metric: Metric) -> &MetricSeries {
        match metric {
            Metric::Hospitalizations => &self.hospitalizations,
            Metric::Cases => &self.cases,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Reuse previously downloaded files instead of fetching.
    pub skip_fetch: bool,
    /// Also write the processed series to this CSV.
    pub export: Option<PathBuf>,
}

/// Checks the manually provisioned vaccination file, then downloads both
/// remote datasets one after the other.
#[tracing::instrument(skip_all)]
pub async fn acquire<C: HttpClient>(client: &C, config: &ReportConfig) -> Result<()> {
    ensure_vaccination_file(config)?;

    for metric in Metric::ALL {
        let source = metric.source(config);
        info!(%metric, url = %source.url, "Downloading dataset");
        download_to(client, &source.url, &source.file).await?;
    }

    Ok(())
}

/// Reads and parses the three local input files.
#[tracing::instrument(skip_all)]
pub fn load_inputs(config: &ReportConfig) -> Result<Inputs> {
    ensure_vaccination_file(config)?;

    let hospitalizations = load_raw(Metric::Hospitalizations, config)?;
    let cases = load_raw(Metric::Cases, config)?;

    let path = &config.vaccination.file;
    let file = File::open(path).map_err(|e| ReportError::io(path, e))?;
    let rates = parse_vaccination_rates(file, &path.display().to_string())?;

    info!(
        hospitalizations = hospitalizations.len(),
        cases = cases.len(),
        rates = rates.len(),
        "Inputs loaded"
    );

    Ok(Inputs {
        hospitalizations,
        cases,
        rates,
    })
}

fn load_raw(metric: Metric, config: &ReportConfig) -> Result<Vec<RawRecord>> {
    let path = &metric.source(config).file;
    let file = File::open(path).map_err(|e| ReportError::io(path, e))?;
    parse_raw_records(file, metric, &path.display().to_string())
}

fn ensure_vaccination_file(config: &ReportConfig) -> Result<()> {
    let source = &config.vaccination;
    if source.file.is_file() {
        return Ok(());
    }
    Err(ReportError::MissingFile {
        path: source.file.clone(),
        hint: format!(
            "export the figure 2.1 data as CSV from {} and save it at this path",
            source.download_page
        ),
    })
}

/// Normalizes and smooths both metrics.
pub fn process(inputs: &Inputs, config: &ReportConfig) -> Result<Report> {
    config.validate()?;
    Ok(Report {
        hospitalizations: analyze(
            Metric::Hospitalizations,
            &inputs.hospitalizations,
            &inputs.rates,
            config,
        )?,
        cases: analyze(Metric::Cases, &inputs.cases, &inputs.rates, config)?,
    })
}

/// Renders the HTML report titled with `title_date` and writes it to the
/// configured output path, optionally exporting the series as CSV.
#[tracing::instrument(skip_all, fields(output = %config.output_path.display()))]
pub fn publish(
    report: &Report,
    config: &ReportConfig,
    title_date: NaiveDate,
    export: Option<&Path>,
) -> Result<()> {
    let html = render_report(&report.hospitalizations, &report.cases, title_date, config)?;

    if let Some(path) = export {
        write_series_csv(path, &[&report.hospitalizations, &report.cases])?;
    }
    write_atomic(&config.output_path, html.as_bytes())?;

    info!(bytes = html.len(), "Report written");
    Ok(())
}

/// Runs every stage in order. Any failure aborts before the report is
/// written.
pub async fn run<C: HttpClient>(
    client: &C,
    config: &ReportConfig,
    options: &RunOptions,
    title_date: NaiveDate,
) -> Result<Report> {
    config.validate()?;

    if options.skip_fetch {
        info!("Skipping downloads, using local files");
    } else {
        acquire(client, config).await?;
    }

    let inputs = load_inputs(config)?;
    let report = process(&inputs, config)?;
    publish(&report, config, title_date, options.export.as_deref())?;

    log_summary(&report, config.display_window);
    Ok(report)
}

fn log_summary(report: &Report, window: usize) {
    for metric in Metric::ALL {
        let series = report.series(metric);
        for status in VaccineStatus::ALL {
            match series.points(status, window).last() {
                Some((date, value)) => info!(
                    %metric,
                    %status,
                    %date,
                    value = %format_args!("{value:.3}"),
                    window,
                    "Latest moving average"
                ),
                None => warn!(%metric, %status, window, "No moving average to report"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SourceConfig, VaccinationSource};
    use crate::fetch::testing::StaticClient;

    fn config_in(dir: &Path) -> ReportConfig {
        ReportConfig {
            hospitalizations: SourceConfig {
                url: "https://example.test/hosp.csv".into(),
                file: dir.join("hosp.csv"),
            },
            cases: SourceConfig {
                url: "https://example.test/cases.csv".into(),
                file: dir.join("cases.csv"),
            },
            vaccination: VaccinationSource {
                file: dir.join("vaccination.csv"),
                ..Default::default()
            },
            output_path: dir.join("out").join("report.html"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_acquire_missing_vaccination_file_fetches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let client = StaticClient::default();

        let err = acquire(&client, &config).await.unwrap_err();

        match err {
            ReportError::MissingFile { path, hint } => {
                assert_eq!(path, config.vaccination.file);
                assert!(hint.contains("inspq.qc.ca"));
            }
            other => panic!("expected missing file, got {other:?}"),
        }
        assert!(client.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_acquire_downloads_both_sources_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::write(&config.vaccination.file, "Date de vaccination\n").unwrap();
        let client = StaticClient::default()
            .with(&config.hospitalizations.url, b"hosp")
            .with(&config.cases.url, b"cases");

        acquire(&client, &config).await.unwrap();

        assert_eq!(
            *client.requested.lock().unwrap(),
            vec![config.hospitalizations.url.clone(), config.cases.url.clone()]
        );
        assert_eq!(std::fs::read(&config.cases.file).unwrap(), b"cases");
    }

    #[test]
    fn test_process_rejects_invalid_config() {
        let inputs = Inputs {
            hospitalizations: vec![],
            cases: vec![],
            rates: vec![],
        };
        let config = ReportConfig {
            max_window: 0,
            ..Default::default()
        };
        assert!(matches!(process(&inputs, &config), Err(ReportError::Config(_))));
    }
}
