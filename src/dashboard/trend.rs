use chrono::{DateTime, Duration, Timelike, Utc};
use rand::Rng;

use crate::source::Reading;

// Placeholder series, not a historical query. Each period gets a fixed
// number of evenly spaced samples ending at `end`.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrendPeriod {
    Day,
    Week,
    Month,
}

impl TrendPeriod {
    pub const ALL: [TrendPeriod; 3] = [TrendPeriod::Day, TrendPeriod::Week, TrendPeriod::Month];

    pub fn label(&self) -> &'static str {
        match self {
            TrendPeriod::Day => "24 Hours",
            TrendPeriod::Week => "7 Days",
            TrendPeriod::Month => "30 Days",
        }
    }

    pub fn key(&self) -> char {
        match self {
            TrendPeriod::Day => 'd',
            TrendPeriod::Week => 'w',
            TrendPeriod::Month => 'm',
        }
    }

    pub fn points(&self) -> usize {
        match self {
            TrendPeriod::Day => 24,
            TrendPeriod::Week => 7,
            TrendPeriod::Month => 30,
        }
    }

    fn step(&self) -> Duration {
        match self {
            TrendPeriod::Day => Duration::hours(1),
            TrendPeriod::Week | TrendPeriod::Month => Duration::days(1),
        }
    }

    fn label_format(&self) -> &'static str {
        match self {
            TrendPeriod::Day => "%H:00",
            TrendPeriod::Week | TrendPeriod::Month => "%b %-d",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrendSeries {
    pub period: TrendPeriod,
    pub labels: Vec<String>,
    /// °C
    pub temperature: Vec<f64>,
    /// percent by volume
    pub gas: Vec<f64>,
    /// mg/m³
    pub dust: Vec<f64>,
}

/// Builds placeholder series for `period`. When an anchor reading is given,
/// values wander around its metrics instead of the generic baselines.
pub fn generate(
    period: TrendPeriod,
    end: DateTime<Utc>,
    anchor: Option<&Reading>,
    rng: &mut impl Rng,
) -> TrendSeries {
    let count = period.points();
    let end = end
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(end);

    let labels = (0..count)
        .map(|i| {
            let back = period.step() * (count - 1 - i) as i32;
            (end - back).format(period.label_format()).to_string()
        })
        .collect();

    let temp_base = anchor.and_then(|r| r.temperature).unwrap_or(24.0);
    let gas_base = anchor.and_then(|r| r.co2).map(|ppm| ppm / 1000.0).unwrap_or(0.8);
    let dust_base = anchor.and_then(|r| r.pm25).unwrap_or(0.6);

    TrendSeries {
        period,
        labels,
        temperature: wander(rng, count, temp_base, 2.0),
        gas: wander(rng, count, gas_base, 0.3),
        dust: wander(rng, count, dust_base, 0.25),
    }
}

fn wander(rng: &mut impl Rng, count: usize, base: f64, spread: f64) -> Vec<f64> {
    (0..count)
        .map(|_| (base + rng.random_range(-spread..=spread)).max(0.0))
        .collect()
}
