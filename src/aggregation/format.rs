// Display formatting for metric responses, aggregate keys, durations and ratios.

use serde_json::Value;
use std::time::Duration;

use crate::models::MetricValue;

/// Reduce a raw mbean response to something printable.
///
/// `Value` wins over the rate keys; unrecognised shapes come back unchanged as `Raw`.
pub fn format_metric(raw: &Value) -> MetricValue {
    let Some(obj) = raw.as_object() else {
        return MetricValue::Raw(raw.clone());
    };

    if let Some(value) = obj.get("Value") {
        return match value.as_f64() {
            Some(v) if v == 0.0 => MetricValue::Text("0".to_string()),
            Some(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
                MetricValue::Integer(v as i64)
            }
            Some(v) => MetricValue::Text(format_decimal(v)),
            None => MetricValue::Raw(raw.clone()),
        };
    }

    if let Some(rate) = obj.get("MeanRate").and_then(Value::as_f64) {
        return match obj.get("Count") {
            Some(count) => MetricValue::Text(format!("{}/s ({})", format_decimal(rate), count)),
            None => MetricValue::Text(format!("{}/s", format_decimal(rate))),
        };
    }

    if let Some(t) = obj.get("AverageEnqueueTime").and_then(Value::as_f64) {
        return MetricValue::Text(format!("{}/s", format_decimal(t)));
    }

    MetricValue::Raw(raw.clone())
}

/// Six decimal places with comma thousands separators: `1234567.891` -> `"1,234,567.891000"`.
pub fn format_decimal(v: f64) -> String {
    let fixed = format!("{:.6}", v.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if v.is_sign_negative() && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Row label for an aggregate key. Unknown keys are returned as-is.
pub fn report_metric_name(key: &str, runs_per_day: u64) -> String {
    match key {
        "with_skips" => "With Skipped Resources".to_string(),
        "run_time_max" => "Maximum Runtime".to_string(),
        "with_failures" => "With Failures".to_string(),
        "with_changes" => "With Changes".to_string(),
        "run_count" => "Total Reports".to_string(),
        "run_time_avg" => "Average Runtime".to_string(),
        "with_no_report" => "With No Report".to_string(),
        "with_no_successful_runs" => "With 100% Failed Runs".to_string(),
        "with_50+%_failed" => "With 50-100% Failed Runs".to_string(),
        "with_too_few_runs" => format!("With <{} Runs in 24h", runs_per_day),
        other => other.to_string(),
    }
}

/// `"3d 1h 1m 1s"`; zero components omitted, sub-second part dropped.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs == 0 {
        return "0s".to_string();
    }
    let parts = [
        (secs / 86_400, "d"),
        (secs % 86_400 / 3_600, "h"),
        (secs % 3_600 / 60, "m"),
        (secs % 60, "s"),
    ];
    parts
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| format!("{}{}", n, unit))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `"8 (89%)"`, or just the count when either side is zero.
pub fn count_with_percent(n: u64, total: u64) -> String {
    if n == 0 || total == 0 {
        return n.to_string();
    }
    let pct = (n as f64 / total as f64 * 100.0).round();
    format!("{} ({}%)", n, pct as u64)
}
