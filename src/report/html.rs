use serde_json::Value;

const PLOT_DIV_ID: &str = "vaxreport-figure";

/// Renders a standalone HTML page drawing `figure` with plotly.js loaded
/// from `plotly_js_url`.
pub fn render_html(figure: &Value, plotly_js_url: &str) -> crate::error::Result<String> {
    let title = figure["layout"]["title"]["text"].as_str().unwrap_or("Report");
    // `</` would end the inline script early.
    let figure_json = serde_json::to_string(figure)?.replace("</", "<\\/");

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8" />
<title>{title}</title>
<script src="{plotly_js_url}" charset="utf-8"></script>
</head>
<body>
<div id="{PLOT_DIV_ID}" style="height:100vh; width:100%;"></div>
<script type="text/javascript">
var figure = {figure_json};
Plotly.newPlot("{PLOT_DIV_ID}", figure.data, figure.layout, {{"responsive": true}});
</script>
</body>
</html>
"#,
        title = escape_text(title),
        plotly_js_url = escape_text(plotly_js_url),
    ))
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
