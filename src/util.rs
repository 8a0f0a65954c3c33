use chrono::{DateTime, Utc};
use std::time::Duration;

const UNAVAILABLE: &str = "N/A";

/// Format a temperature reading (e.g., "24.5°C").
pub fn format_temperature(celsius: Option<f64>) -> String {
    celsius.map_or_else(|| UNAVAILABLE.to_string(), |c| format!("{c:.1}°C"))
}

/// Format a CO2 concentration as given by the sensor (e.g., "1200ppm").
pub fn format_gas(ppm: Option<f64>) -> String {
    ppm.map_or_else(|| UNAVAILABLE.to_string(), |p| format!("{}ppm", format_number(p)))
}

/// Format a dust reading (e.g., "0.8 mg/m³").
pub fn format_dust(mg_m3: Option<f64>) -> String {
    mg_m3.map_or_else(|| UNAVAILABLE.to_string(), |d| format!("{d:.1} mg/m³"))
}

pub fn format_air_quality(score: u8) -> String {
    format!("{score}%")
}

/// Haulage tunnel summary line, gas shown as percent by volume.
pub fn format_haulage(co2_ppm: Option<f64>, pm25: Option<f64>) -> String {
    let gas = co2_ppm.map_or_else(
        || UNAVAILABLE.to_string(),
        |ppm| format!("{:.1}%", ppm / 1000.0),
    );
    format!("Gas: {gas} | Dust: {}", format_dust(pm25))
}

/// Shortest plain rendering of a number: whole values lose the ".0".
pub fn format_number(value: f64) -> String {
    format!("{value}")
}

/// Upper-case the first character, leave the rest untouched.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Format an alert time (e.g., "May 1, 08:15").
pub fn format_alert_time(ts: &DateTime<Utc>) -> String {
    ts.format("%b %-d, %H:%M").to_string()
}

/// Format a refresh interval (e.g., "5.0s" or "750ms").
pub fn format_interval(interval: Duration) -> String {
    let ms = interval.as_millis();
    if ms >= 1000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{ms}ms")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn gauge_values() {
        assert_eq!(format_temperature(Some(24.46)), "24.5°C");
        assert_eq!(format_temperature(None), "N/A");
        assert_eq!(format_gas(Some(1200.0)), "1200ppm");
        assert_eq!(format_gas(Some(812.5)), "812.5ppm");
        assert_eq!(format_dust(Some(0.84)), "0.8 mg/m³");
        assert_eq!(format_air_quality(87), "87%");
    }

    #[test]
    fn haulage_line() {
        assert_eq!(
            format_haulage(Some(1240.0), Some(1.42)),
            "Gas: 1.2% | Dust: 1.4 mg/m³"
        );
        assert_eq!(format_haulage(None, None), "Gas: N/A | Dust: N/A");
    }

    #[test]
    fn capitalize_first_letter_only() {
        assert_eq!(capitalize("gas leak"), "Gas leak");
        assert_eq!(capitalize("CO2"), "CO2");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn alert_time() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 8, 5, 0).unwrap();
        assert_eq!(format_alert_time(&ts), "May 1, 08:05");
    }

    #[test]
    fn interval() {
        assert_eq!(format_interval(Duration::from_millis(5000)), "5.0s");
        assert_eq!(format_interval(Duration::from_millis(750)), "750ms");
    }
}
