//! Prometheus text exposition format.
//!
//! Renders version gauge series into the Prometheus text exposition format
//! for scraping by a Prometheus server or compatible agent.

use crate::gauge::VersionLabels;
use crate::{APP_VERSION_HELP, APP_VERSION_METRIC};

/// Render version gauge series into Prometheus text format.
///
/// The HELP and TYPE lines are always emitted, even with no series.
pub fn render_prometheus(series: &[(VersionLabels, f64)]) -> String {
    let mut out = String::new();

    out.push_str(&format!("# HELP {APP_VERSION_METRIC} {APP_VERSION_HELP}\n"));
    out.push_str(&format!("# TYPE {APP_VERSION_METRIC} gauge\n"));

    for (labels, value) in series {
        let rendered: Vec<String> = labels
            .pairs()
            .iter()
            .map(|(name, value)| format!("{name}=\"{}\"", escape_label_value(value)))
            .collect();
        out.push_str(&format!(
            "{APP_VERSION_METRIC}{{{}}} {}\n",
            rendered.join(","),
            value
        ));
    }

    out
}

/// Escape a label value: backslash, double quote, and newline.
fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}
