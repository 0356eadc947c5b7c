//! Prometheus text exposition format renderer.

use std::fmt::Write;

/// Content type served alongside rendered metrics.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// One gauge family with a single label dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeFamily {
    pub name: String,
    pub help: &'static str,
    pub label: &'static str,
    pub samples: Vec<(String, f64)>,
}

/// Render gauge families in Prometheus text exposition format.
///
/// HELP and TYPE are emitted for every family, even one without samples,
/// so scrapers see a stable set of metric names.
pub fn render_gauges(families: &[GaugeFamily]) -> String {
    let mut output = String::new();

    for family in families {
        let _ = writeln!(output, "# HELP {} {}", family.name, escape_help(family.help));
        let _ = writeln!(output, "# TYPE {} gauge", family.name);
        for (label_value, value) in &family.samples {
            let _ = writeln!(
                output,
                "{}{{{}=\"{}\"}} {}",
                family.name,
                family.label,
                escape_label_value(label_value),
                format_value(*value)
            );
        }
    }

    output
}

/// Escape label values per the exposition format.
fn escape_label_value(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\n', "\\n")
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        if v.is_sign_positive() { "+Inf" } else { "-Inf" }.to_string()
    } else if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v}")
    }
}
