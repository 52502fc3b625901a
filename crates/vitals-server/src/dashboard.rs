//! Minimal HTML view of a snapshot, served on `GET /` for browsers.

use std::fmt::Write;

use vitals_core::{Snapshot, Value};

/// Helper to escape text for HTML bodies.
fn escape_html(v: &str) -> String {
    v.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn render_value(v: &Value) -> String {
    match v {
        Value::Counter(n) => n.to_string(),
        Value::Gauge(n) => n.to_string(),
        Value::Label(s) => escape_html(s),
        Value::Distribution(d) => format!(
            "mean {:.3}, variance {:.3}, count {}, sum {:.3}, min {:.3}, max {:.3}",
            d.mean, d.variance, d.count, d.sum, d.min, d.max
        ),
    }
}

/// Render every metric as one table row, in name order.
pub fn render(sample: &Snapshot) -> String {
    let mut out = String::from(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>vitals</title></head>\n<body>\n\
         <table>\n<tr><th>name</th><th>type</th><th>value</th></tr>\n",
    );
    for (name, value) in sample {
        let _ = writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(name),
            value.kind().tag(),
            render_value(value)
        );
    }
    out.push_str("</table>\n</body></html>\n");
    out
}
