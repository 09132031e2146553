//! Inline SVG sparklines for the 7-day price series.
//!
//! Coordinates use a top-left origin with a one-pixel inset on every side:
//! the first point sits at `x = 1`, the last at `x = width - 1`, and values
//! are scaled linearly into `[1, height - 1]` with higher prices nearer
//! the top.
//!
//! A single-point series has no horizontal extent to divide by, so it is
//! placed at `x = 1` on the vertical midline and drawn as a flat line
//! across the full width.

use std::fmt::Write as _;

/// Pixel geometry of a sparkline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparklineStyle {
    pub width: u32,
    pub height: u32,
    pub stroke_width: f64,
}

impl Default for SparklineStyle {
    fn default() -> Self {
        Self {
            width: 120,
            height: 28,
            stroke_width: 2.0,
        }
    }
}

/// Direction cue derived from the first and last values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Rising,
    Falling,
}

impl Trend {
    /// CSS color used for the stroke.
    pub fn color(self) -> &'static str {
        match self {
            Self::Rising => "var(--success)",
            Self::Falling => "var(--danger)",
        }
    }
}

/// Non-decreasing series are rising. Empty series have no trend.
pub fn trend(series: &[f64]) -> Option<Trend> {
    let (first, last) = (series.first()?, series.last()?);
    if last >= first {
        Some(Trend::Rising)
    } else {
        Some(Trend::Falling)
    }
}

/// Map a series to chart coordinates.
///
/// Returns one `(x, y)` pair per input value; empty input yields no points.
pub fn points(series: &[f64], width: u32, height: u32) -> Vec<(f64, f64)> {
    let width = f64::from(width);
    let height = f64::from(height);

    match series.len() {
        0 => Vec::new(),
        1 => vec![(1.0, height / 2.0)],
        count => {
            let min = series.iter().copied().fold(f64::INFINITY, f64::min);
            let max = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let range = if max == min { 1.0 } else { max - min };
            let step = (width - 2.0) / (count - 1) as f64;

            series
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    let x = 1.0 + i as f64 * step;
                    let y = height - 1.0 - ((v - min) / range) * (height - 2.0);
                    (x, y)
                })
                .collect()
        }
    }
}

/// Render the series as an `<svg>` element with a single polyline.
///
/// Returns `None` when there is nothing to draw: an empty series or one
/// containing non-finite values.
pub fn render_svg(series: &[f64], style: SparklineStyle) -> Option<String> {
    if series.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let trend = trend(series)?;

    let mut coords = points(series, style.width, style.height);
    if coords.len() == 1 {
        let y = coords[0].1;
        coords.push((f64::from(style.width) - 1.0, y));
    }

    let mut attr = String::new();
    for (i, (x, y)) in coords.iter().enumerate() {
        if i > 0 {
            attr.push(' ');
        }
        let _ = write!(attr, "{},{}", fmt_coord(*x), fmt_coord(*y));
    }

    Some(format!(
        r#"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" role="img"><polyline fill="none" stroke="currentColor" stroke-width="{sw}" points="{attr}" style="color: {color}"/></svg>"#,
        w = style.width,
        h = style.height,
        sw = fmt_coord(style.stroke_width),
        color = trend.color(),
    ))
}

/// Two-decimal coordinate with trailing zeros removed.
fn fmt_coord(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
