//! JSON layout of the report:
//!
//! ```text
//! {
//! "US" : {
//!   "name" : "US",
//!   "records": {
//!     "Motorway": 1234.50,
//!     "total": 1234.50
//!   }},
//! "CA" : {
//!   ...
//!   }}
//! }
//! ```
//!
//! Values always carry two decimals, which `serde_json` number output
//! cannot express, so the skeleton is written by hand and only string
//! encoding goes through `serde_json`.

use serde_json::Value;

use super::Report;

/// Render `report` (no trailing newline).
pub fn to_json(report: &Report) -> String {
    let mut out = String::from("{\n");

    for (i, entry) in report.entries.iter().enumerate() {
        if i > 0 {
            out.push_str(",\n");
        }
        let name = json_string(&entry.name);
        out.push_str(&format!("{} : {{\n", name));
        out.push_str(&format!("  \"name\" : {},\n", name));
        out.push_str("  \"records\": {\n");

        for (j, (label, value)) in entry.records.iter().enumerate() {
            if j > 0 {
                out.push_str(",\n");
            }
            out.push_str(&format!("    {}: {}", json_string(label), format_value(*value)));
        }
        out.push_str("\n  }}");
    }

    out.push_str("\n}");
    out
}

/// Quote and escape a string as a JSON literal.
fn json_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

/// Fixed-point, two decimals, halves rounded away from zero.
///
/// Non-finite values have no JSON number form and render as `null`.
pub fn format_value(value: f64) -> String {
    if !value.is_finite() {
        return "null".to_string();
    }
    let cents = (value * 100.0).round();
    if !cents.is_finite() {
        // Past ~1.8e306 scaling overflows; such values carry no fraction anyway
        return format!("{:.2}", value);
    }
    // -0.0 would print as "-0.00"
    let cents = if cents == 0.0 { 0.0 } else { cents };
    format!("{:.2}", cents / 100.0)
}
