//! Value and time rendering for the status panel
//!
//! Floats are printed with the signal precision. Integers honour the display
//! format (`0x` hex, `0b` binary or plain decimal). Text is shown as decoded.

use crate::types::{DisplayFormat, SampleValue, Scalar, NOT_AVAILABLE};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How the x axis labels time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AxisFormat {
    /// Seconds since the measurement start
    #[default]
    #[serde(rename = "phys")]
    Physical,
    /// `H:MM:SS.ffffff` since the measurement start
    #[serde(rename = "time")]
    Time,
    /// Absolute wall-clock date
    #[serde(rename = "date")]
    Date,
}

/// Render one value
pub fn format_value(value: &SampleValue, format: DisplayFormat, precision: usize) -> String {
    match value {
        SampleValue::Float(v) => format!("{:.*}", precision, v),
        SampleValue::Integer(v) => format_integer(*v, format),
        SampleValue::Text(text) => text.clone(),
        SampleValue::NotAvailable => NOT_AVAILABLE.to_string(),
    }
}

pub fn format_scalar(value: Scalar, format: DisplayFormat, precision: usize) -> String {
    format_value(&SampleValue::from(value), format, precision)
}

/// Render a float with `precision` decimals regardless of display format
pub fn format_float(value: f64, precision: usize) -> String {
    format!("{:.*}", precision, value)
}

fn format_integer(value: i64, format: DisplayFormat) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let magnitude = value.unsigned_abs();
    match format {
        DisplayFormat::Physical => value.to_string(),
        DisplayFormat::Hex => format!("{}0x{:X}", sign, magnitude),
        DisplayFormat::Binary => format!("{}0b{:b}", sign, magnitude),
    }
}

/// Cursor label, e.g. `t = 1.234000s`
pub fn cursor_info(position: f64, axis: AxisFormat, origin: Option<DateTime<Utc>>) -> String {
    format!("t = {}", render_time(position, axis, origin))
}

/// Region label, e.g. `Δt = 0.500000s`
pub fn region_info(start: f64, stop: f64, axis: AxisFormat) -> String {
    let delta = stop - start;
    match axis {
        AxisFormat::Physical => format!("Δt = {:.6}s", delta),
        AxisFormat::Time | AxisFormat::Date => format!("Δt = {}", format_timedelta(delta)),
    }
}

fn render_time(position: f64, axis: AxisFormat, origin: Option<DateTime<Utc>>) -> String {
    match (axis, origin) {
        (AxisFormat::Physical, _) => format!("{:.6}s", position),
        (AxisFormat::Date, Some(origin)) => match seconds(position)
            .and_then(|delta| origin.checked_add_signed(delta))
        {
            Some(date) => date.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
            // Past the calendar range: fall back to the offset from the origin
            None => format_timedelta(position),
        },
        (AxisFormat::Time | AxisFormat::Date, _) => format_timedelta(position),
    }
}

/// Whole microseconds, or `None` for non-finite or unrepresentable spans
fn seconds(secs: f64) -> Option<Duration> {
    let micros = (secs * 1e6).round();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(Duration::microseconds(micros as i64))
}

/// `[N day(s), ]H:MM:SS[.ffffff]`, or `n.a.` when `secs` is not a finite span
pub fn format_timedelta(secs: f64) -> String {
    let Some(delta) = seconds(secs) else {
        return NOT_AVAILABLE.to_string();
    };
    let sign = if delta < Duration::zero() { "-" } else { "" };
    let delta = delta.abs();

    let days = delta.num_days();
    let rest = delta - Duration::days(days);
    let hours = rest.num_hours();
    let minutes = rest.num_minutes() % 60;
    let whole = rest.num_seconds() % 60;
    let micros = rest.num_microseconds().unwrap_or(0) % 1_000_000;

    let mut out = String::from(sign);
    if days != 0 {
        out.push_str(&format!("{} day{}, ", days, if days == 1 { "" } else { "s" }));
    }
    out.push_str(&format!("{}:{:02}:{:02}", hours, minutes, whole));
    if micros != 0 {
        out.push_str(&format!(".{:06}", micros));
    }
    out
}
