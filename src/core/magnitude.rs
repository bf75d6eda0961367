//! Abbreviated rendering of large magnitudes such as volume and market cap.

const NOT_AVAILABLE: &str = "N/A";

fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0 && !v.is_nan())
}

/// Renders a market capitalisation with one decimal place and a K/M/B/T/P suffix.
///
/// Missing, zero or NaN values render as `"N/A"`.
pub fn format_market_cap(value: Option<f64>) -> String {
    let Some(mut value) = present(value) else {
        return NOT_AVAILABLE.to_string();
    };

    for unit in ["", "K", "M", "B", "T"] {
        if value.abs() < 1000.0 {
            return format!("{value:.1}{unit}");
        }
        value /= 1000.0;
    }
    format!("{value:.1}P")
}

/// Renders a traded volume. Values below a thousand are shown as whole units,
/// larger ones scaled with one decimal place and a K/M/B/T suffix.
///
/// Missing, zero or NaN values render as `"N/A"`.
pub fn format_volume(value: Option<f64>) -> String {
    let Some(mut value) = present(value) else {
        return NOT_AVAILABLE.to_string();
    };

    for (step, unit) in ["", "K", "M", "B"].into_iter().enumerate() {
        if value < 1000.0 {
            return if step == 0 {
                format!("{}", value.trunc() as i64)
            } else {
                format!("{value:.1}{unit}")
            };
        }
        value /= 1000.0;
    }
    format!("{value:.1}T")
}
