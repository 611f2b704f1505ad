//! HTML views for the three read pages.
//!
//! Pure string rendering over already-fetched readings; no I/O.

use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use thermolog_core::Reading;

const NAV: &str = r#"<nav><a href="/">Current Temperature</a> | <a href="/history">Temperature History</a> | <a href="/graph">Temperature Graph</a></nav>"#;

const BASE_STYLE: &str = "body { font-family: Arial, sans-serif; text-align: center; }
nav { background-color: #3b74c4; color: #fff; padding: 10px; }
nav a { color: #fff; text-decoration: none; padding: 10px; }
nav a:hover { background-color: #555; }";

/// One chart point, ascending by time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphPoint {
    pub timestamp: String,
    pub inside_temp: f64,
    pub outside_temp: f64,
}

pub fn graph_series(readings: &[Reading]) -> Vec<GraphPoint> {
    readings
        .iter()
        .map(|r| GraphPoint {
            timestamp: r.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            inside_temp: r.inside_temp,
            outside_temp: r.outside_temp,
        })
        .collect()
}

/// Whole degrees, truncated toward zero.
pub fn whole_degrees(value: f64) -> i64 {
    value.trunc() as i64
}

/// `DD.MM.YYYY_HH:MM:SS` wall-clock time in the display zone, DST included.
pub fn format_local(ts: &DateTime<Utc>, zone: &Tz) -> String {
    ts.with_timezone(zone).format("%d.%m.%Y_%H:%M:%S").to_string()
}

pub fn render_current(reading: &Reading) -> String {
    format!(
        r#"<html><head><title>Current Temperature</title><style>
body {{ font-family: Arial, sans-serif; background-color: #483D8B; text-align: center; }}
nav {{ background-color: #6A5ACD; color: #fff; padding: 10px 0; }}
nav a {{ color: #fff; text-decoration: none; padding: 10px; }}
nav a:hover {{ background-color: #4B0082; }}
h1 {{ color: #E6E6FA; }}
.widget {{ display: inline-block; width: 18em; height: 18em; margin: 2em 1.2em; padding: 42px; border-radius: 8px; background-color: #E6E6FA; box-shadow: 0 0 1.5em #1c83b0; }}
.degree {{ font-size: 6em; color: #79b0c9; }}
.label {{ font-size: 3em; color: #cbcbcb; }}
</style></head><body><h1>Current Temperature</h1>{nav}
<div class="widget"><div class="degree">{inside} C</div><div class="label"><em>Inside</em></div></div>
<div class="widget"><div class="degree">{outside} C</div><div class="label"><em>Outside</em></div></div>
</body></html>"#,
        nav = NAV,
        inside = whole_degrees(reading.inside_temp),
        outside = whole_degrees(reading.outside_temp),
    )
}

pub fn render_history(readings: &[Reading], zone: &Tz) -> String {
    let rows: String = readings
        .iter()
        .map(|r| {
            format!(
                "<tr><td>{}</td><td>{} C</td><td>{} C</td></tr>",
                format_local(&r.created_at, zone),
                r.inside_temp,
                r.outside_temp
            )
        })
        .collect();

    format!(
        r#"<html><head><meta charset="utf-8"><title>Temperature History</title><style>{style}
table {{ border-collapse: collapse; width: 50%; margin: auto; }}
th, td {{ border: 1px solid #ddd; padding: 8px; text-align: left; }}
th {{ background-color: #f2f2f2; }}
</style></head><body><h1>Temperature History</h1>{nav}<table><tr><th>Timestamp</th><th>Inside Temperature</th><th>Outside Temperature</th></tr>{rows}</table></body></html>"#,
        style = BASE_STYLE,
        nav = NAV,
        rows = rows,
    )
}

pub fn render_graph(series: &[GraphPoint]) -> String {
    let labels: Vec<&str> = series.iter().map(|p| p.timestamp.as_str()).collect();
    let inside: Vec<f64> = series.iter().map(|p| p.inside_temp).collect();
    let outside: Vec<f64> = series.iter().map(|p| p.outside_temp).collect();

    format!(
        r#"<html><head><meta charset="utf-8"><title>Temperature Graph</title>
<script src="https://cdn.jsdelivr.net/npm/chart.js"></script>
<style>{style}
canvas {{ max-width: 1200px; max-height: 800px; }}
</style></head><body><h1>Home Temperature</h1>{nav}<h1>Temperature Graph</h1>
<canvas id="temperatureChart"></canvas>
<script>
const ctx = document.getElementById('temperatureChart').getContext('2d');
new Chart(ctx, {{
  type: 'line',
  data: {{
    labels: {labels},
    datasets: [
      {{ label: 'Inside Temperature (°C)', data: {inside} }},
      {{ label: 'Outside Temperature (°C)', data: {outside} }}
    ]
  }}
}});
</script></body></html>"#,
        style = BASE_STYLE,
        nav = NAV,
        labels = script_json(&labels),
        inside = script_json(&inside),
        outside = script_json(&outside),
    )
}

/// JSON safe to inline inside a `<script>` element.
fn script_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "[]".to_string())
        .replace("</", "<\\/")
}
