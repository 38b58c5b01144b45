//! Two-panel HTML report.

mod figure;
mod html;

pub use figure::{build_figure, report_title};
pub use html::render_html;

use chrono::NaiveDate;

use crate::analyzers::types::MetricSeries;
use crate::config::ReportConfig;
use crate::error::Result;

/// Builds and renders the report page for the hospitalization and case
/// series, titled with `title_date`.
pub fn render_report(
    hospitalizations: &MetricSeries,
    cases: &MetricSeries,
    title_date: NaiveDate,
    config: &ReportConfig,
) -> Result<String> {
    let figure = build_figure([hospitalizations, cases], title_date, config);
    render_html(&figure, &config.plotly_js_url)
}
