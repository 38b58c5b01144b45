//! plotly.js figure for the two-panel report.

use chrono::NaiveDate;
use serde_json::{Value, json};

use crate::analyzers::types::{MetricSeries, VaccineStatus};
use crate::config::ReportConfig;

const ATTRIBUTION: &str = "Hospitalization & Cases Data:  https://www.donneesquebec.ca/recherche/dataset/covid-19-portrait-quotidien-des-cas-confirmes<br>\
Vaccination Status Data: https://www.inspq.qc.ca/covid-19/donnees/vaccination (Figure 2.1)";

/// Horizontal domains of the left and right panels.
const PANEL_DOMAINS: [[f64; 2]; 2] = [[0.0, 0.45], [0.55, 1.0]];

fn status_color(status: VaccineStatus) -> &'static str {
    match status {
        VaccineStatus::Unvaccinated => "#636efa",
        VaccineStatus::FullyVaccinated => "#EF553B",
    }
}

pub fn report_title(date: NaiveDate) -> String {
    format!(
        "Overview of Covid Cases & Hospitalizations in Quebec, CA by Vaccine Status ({})",
        date.format("%d/%m/%Y")
    )
}

/// Builds the figure: hospitalizations on the left, cases on the right, one
/// line per vaccination status showing the configured display window.
///
/// The right axis matches the left one, so zooming or dragging either range
/// slider moves both panels. Only the right panel's traces appear in the
/// legend; toggling an entry hides the status in both panels.
pub fn build_figure(panels: [&MetricSeries; 2], title_date: NaiveDate, config: &ReportConfig) -> Value {
    let window = config.display_window;
    let mut data = Vec::new();
    let mut annotations = Vec::new();
    let mut layout = json!({
        "title": { "text": report_title(title_date), "x": 0.5 },
        "hovermode": "x unified",
        "legend": { "title": { "text": "Vaccine_Status" } },
    });

    for (i, series) in panels.iter().enumerate() {
        let n = i + 1;
        let (xaxis, yaxis) = axis_ids(n);
        let last_panel = n == panels.len();

        for status in series.statuses() {
            let (x, y): (Vec<String>, Vec<f64>) = series
                .points(status, window)
                .map(|(date, v)| (date.format("%Y-%m-%d").to_string(), v))
                .unzip();

            data.push(json!({
                "type": "scatter",
                "mode": "lines",
                "name": status.label(),
                "legendgroup": status.label(),
                "showlegend": last_panel,
                "line": { "color": status_color(status) },
                "x": x,
                "y": y,
                "xaxis": xaxis,
                "yaxis": yaxis,
                "hovertemplate": format!("{}=%{{y:.3f}}<extra></extra>", status.label()),
            }));
        }

        let domain = PANEL_DOMAINS[i];
        layout[layout_key("xaxis", n)] = json!({
            "domain": domain,
            "anchor": yaxis,
            "title": { "text": "Date" },
            "type": "date",
            "nticks": 20,
            "rangeslider": { "visible": true },
        });
        if n > 1 {
            layout[layout_key("xaxis", n)]["matches"] = json!("x");
        }
        layout[layout_key("yaxis", n)] = json!({
            "anchor": xaxis,
            "title": { "text": series.metric.axis_title() },
        });

        annotations.push(json!({
            "text": series.metric.panel_title(window, config.per_population),
            "showarrow": false,
            "xref": "paper",
            "yref": "paper",
            "x": (domain[0] + domain[1]) / 2.0,
            "xanchor": "center",
            "y": 1.0,
            "yanchor": "bottom",
            "font": { "size": 12 },
        }));
    }

    annotations.push(json!({
        "text": ATTRIBUTION,
        "showarrow": false,
        "xref": "x domain",
        "x": 0,
        "yref": "y domain",
        "y": -0.55,
        "xanchor": "left",
        "font": { "size": 9, "color": "grey" },
        "align": "left",
    }));
    layout["annotations"] = Value::Array(annotations);

    json!({ "data": data, "layout": layout })
}

/// Trace references (`x`, `x2`, ...) for panel `n`.
fn axis_ids(n: usize) -> (String, String) {
    if n == 1 {
        ("x".to_string(), "y".to_string())
    } else {
        (format!("x{n}"), format!("y{n}"))
    }
}

/// Layout keys (`xaxis`, `xaxis2`, ...) for panel `n`.
fn layout_key(prefix: &str, n: usize) -> String {
    if n == 1 {
        prefix.to_string()
    } else {
        format!("{prefix}{n}")
    }
}
