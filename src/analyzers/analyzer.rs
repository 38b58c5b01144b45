use tracing::info;

use crate::analyzers::aggregate::aggregate;
use crate::analyzers::normalize::normalize;
use crate::analyzers::rolling::rolling_averages;
use crate::analyzers::types::{Metric, MetricSeries, RawRecord, VaccinationRate};
use crate::config::ReportConfig;
use crate::error::Result;

/// Runs aggregation, the date join, status filtering, normalization and
/// rolling averages for one metric.
#[tracing::instrument(skip_all, fields(%metric, raw_rows = records.len()))]
pub fn analyze(
    metric: Metric,
    records: &[RawRecord],
    rates: &[VaccinationRate],
    config: &ReportConfig,
) -> Result<MetricSeries> {
    let aggregated = aggregate(records);
    let normalized = normalize(metric, &aggregated, rates, config)?;
    let rows = rolling_averages(normalized, config.max_window);

    let series = MetricSeries {
        metric,
        max_window: config.max_window,
        rows,
    };

    match series.date_range() {
        Some((first, last)) => info!(
            aggregated = aggregated.len(),
            rows = series.rows.len(),
            %first,
            %last,
            "Series normalized"
        ),
        None => info!(aggregated = aggregated.len(), "Series normalized, no rows retained"),
    }

    Ok(series)
}
