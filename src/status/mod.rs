pub mod thresholds;

use crate::source::Reading;
use thresholds::{AirQualityWeights, MetricBand, Thresholds, VentilationLimits, VentilationRules};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricStatus {
    Optimal,
    Warning,
    Critical,
    Unavailable,
}

impl MetricStatus {
    pub fn label(&self) -> &'static str {
        match self {
            MetricStatus::Optimal => "Optimal",
            MetricStatus::Warning => "Warning",
            MetricStatus::Critical => "Critical",
            MetricStatus::Unavailable => "N/A",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum VentilationStatus {
    Optimal,
    Warning,
    Critical,
}

impl VentilationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            VentilationStatus::Optimal => "Optimal",
            VentilationStatus::Warning => "Warning",
            VentilationStatus::Critical => "Critical",
        }
    }
}

/// The four gauges shown per location.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    Temperature,
    Gas,
    AirQuality,
    Dust,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Temperature,
        Metric::Gas,
        Metric::AirQuality,
        Metric::Dust,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Temperature => "Temperature",
            Metric::Gas => "Gas Concentration",
            Metric::AirQuality => "Air Quality",
            Metric::Dust => "Dust Levels",
        }
    }

    /// Value at which the gauge reads 100%.
    pub fn full_scale(&self) -> f64 {
        match self {
            Metric::Temperature => 50.0,
            Metric::Gas => 2000.0,
            Metric::AirQuality => 100.0,
            Metric::Dust => 2.0,
        }
    }

    pub fn band<'a>(&self, thresholds: &'a Thresholds) -> &'a MetricBand {
        match self {
            Metric::Temperature => &thresholds.temperature,
            Metric::Gas => &thresholds.gas,
            Metric::AirQuality => &thresholds.air_quality,
            Metric::Dust => &thresholds.dust,
        }
    }
}

/// Danger is checked before warning; both bands are tested against the raw
/// value, so a value can be inside the danger band and still be a warning.
pub fn classify_metric(value: Option<f64>, band: &MetricBand) -> MetricStatus {
    let Some(value) = value else {
        return MetricStatus::Unavailable;
    };

    if band.danger.excludes(value) {
        MetricStatus::Critical
    } else if band.warning.excludes(value) {
        MetricStatus::Warning
    } else {
        MetricStatus::Optimal
    }
}

/// Composite 0..=100 score. Each present field contributes an independent,
/// capped deduction; absent fields are skipped.
pub fn air_quality(reading: &Reading, weights: &AirQualityWeights) -> u8 {
    let mut score = 100.0_f64;

    if let Some(co2) = reading.co2 {
        score -= (co2 / weights.co2_divisor).min(weights.co2_cap);
    }
    if let Some(pm25) = reading.pm25 {
        score -= (pm25 * weights.pm25_factor).min(weights.pm25_cap);
    }
    if let Some(temperature) = reading.temperature {
        if temperature > weights.temperature_baseline {
            let excess = temperature - weights.temperature_baseline;
            score -= (excess * weights.temperature_factor).min(weights.temperature_cap);
        }
    }

    score.clamp(0.0, 100.0).round() as u8
}

pub fn ventilation_status(reading: &Reading, rules: &VentilationRules) -> VentilationStatus {
    if exceeds(reading, &rules.critical) {
        VentilationStatus::Critical
    } else if exceeds(reading, &rules.warning) {
        VentilationStatus::Warning
    } else {
        VentilationStatus::Optimal
    }
}

fn exceeds(reading: &Reading, limits: &VentilationLimits) -> bool {
    reading.co2.is_some_and(|v| v > limits.co2)
        || reading.pm25.is_some_and(|v| v > limits.pm25)
        || reading.temperature.is_some_and(|v| v > limits.temperature)
}

#[derive(Clone, Debug, PartialEq)]
pub struct MetricEvaluation {
    pub metric: Metric,
    pub value: Option<f64>,
    pub status: MetricStatus,
}

/// Everything the gauges need for one reading.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub metrics: [MetricEvaluation; 4],
    pub air_quality: u8,
    pub ventilation: VentilationStatus,
}

pub fn evaluate(reading: &Reading, thresholds: &Thresholds) -> Evaluation {
    let score = air_quality(reading, &thresholds.air_score);
    let metrics = Metric::ALL.map(|metric| {
        let value = match metric {
            Metric::Temperature => reading.temperature,
            Metric::Gas => reading.co2,
            Metric::AirQuality => Some(f64::from(score)),
            Metric::Dust => reading.pm25,
        };
        MetricEvaluation {
            metric,
            value,
            status: classify_metric(value, metric.band(thresholds)),
        }
    });

    Evaluation {
        metrics,
        air_quality: score,
        ventilation: ventilation_status(reading, &thresholds.ventilation),
    }
}

#[cfg(test)]
mod tests {
    use super::thresholds::Range;
    use super::*;
    use crate::source::LocationId;
    use chrono::{TimeZone, Utc};

    fn reading(temperature: Option<f64>, co2: Option<f64>, pm25: Option<f64>) -> Reading {
        Reading {
            location_id: LocationId::from("1"),
            location_name: Some("Level 1".to_string()),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
            temperature,
            co2,
            pm25,
        }
    }

    fn temperature_band() -> MetricBand {
        MetricBand {
            warning: Range::new(20.0, 30.0),
            danger: Range::new(15.0, 35.0),
        }
    }

    #[test]
    fn missing_value_is_unavailable() {
        assert_eq!(
            classify_metric(None, &temperature_band()),
            MetricStatus::Unavailable
        );
        let odd = MetricBand {
            warning: Range::new(-1.0, 1.0),
            danger: Range::new(-5.0, 5.0),
        };
        assert_eq!(classify_metric(None, &odd), MetricStatus::Unavailable);
    }

    #[test]
    fn temperature_classification() {
        let band = temperature_band();
        assert_eq!(classify_metric(Some(36.0), &band), MetricStatus::Critical);
        assert_eq!(classify_metric(Some(32.0), &band), MetricStatus::Warning);
        assert_eq!(classify_metric(Some(25.0), &band), MetricStatus::Optimal);
        assert_eq!(classify_metric(Some(14.0), &band), MetricStatus::Critical);
    }

    #[test]
    fn value_inside_danger_but_below_warning_is_a_warning() {
        assert_eq!(
            classify_metric(Some(18.0), &temperature_band()),
            MetricStatus::Warning
        );
    }

    #[test]
    fn band_edges_do_not_trip() {
        let band = temperature_band();
        assert_eq!(classify_metric(Some(20.0), &band), MetricStatus::Optimal);
        assert_eq!(classify_metric(Some(30.0), &band), MetricStatus::Optimal);
        assert_eq!(classify_metric(Some(35.0), &band), MetricStatus::Warning);
        assert_eq!(classify_metric(Some(15.0), &band), MetricStatus::Warning);
    }

    #[test]
    fn default_gas_band_flags_values_below_the_danger_floor() {
        let gas = Thresholds::default().gas;
        assert_eq!(classify_metric(Some(1000.0), &gas), MetricStatus::Optimal);
        assert_eq!(classify_metric(Some(1500.0), &gas), MetricStatus::Warning);
        assert_eq!(classify_metric(Some(2500.0), &gas), MetricStatus::Critical);
        assert_eq!(classify_metric(Some(400.0), &gas), MetricStatus::Critical);
    }

    #[test]
    fn air_quality_perfect_reading() {
        let weights = AirQualityWeights::default();
        let r = reading(Some(20.0), Some(0.0), Some(0.0));
        assert_eq!(air_quality(&r, &weights), 100);
    }

    #[test]
    fn air_quality_deductions_are_capped_and_additive() {
        let weights = AirQualityWeights::default();
        let r = reading(Some(40.0), Some(2000.0), Some(5.0));
        assert_eq!(air_quality(&r, &weights), 20);
    }

    #[test]
    fn air_quality_skips_missing_fields() {
        let weights = AirQualityWeights::default();
        assert_eq!(air_quality(&reading(None, None, None), &weights), 100);
        // 100 - 400/20
        assert_eq!(air_quality(&reading(None, Some(400.0), None), &weights), 80);
        // 100 - 0.25*10 = 97.5, rounds up
        assert_eq!(air_quality(&reading(None, None, Some(0.25)), &weights), 98);
        // temperature at the baseline deducts nothing
        assert_eq!(air_quality(&reading(Some(25.0), None, None), &weights), 100);
        assert_eq!(air_quality(&reading(Some(27.5), None, None), &weights), 95);
    }

    #[test]
    fn air_quality_is_clamped() {
        let weights = AirQualityWeights {
            co2_cap: 80.0,
            pm25_cap: 80.0,
            ..AirQualityWeights::default()
        };
        let r = reading(Some(50.0), Some(5000.0), Some(50.0));
        assert_eq!(air_quality(&r, &weights), 0);
    }

    #[test]
    fn ventilation_warning_from_gas() {
        let rules = VentilationRules::default();
        let r = reading(Some(22.0), Some(1200.0), Some(0.5));
        assert_eq!(ventilation_status(&r, &rules), VentilationStatus::Warning);
    }

    #[test]
    fn ventilation_critical_from_gas_regardless_of_other_fields() {
        let rules = VentilationRules::default();
        for r in [
            reading(None, Some(1600.0), None),
            reading(Some(10.0), Some(1600.0), Some(0.0)),
            reading(Some(22.0), Some(1600.0), Some(0.5)),
        ] {
            assert_eq!(ventilation_status(&r, &rules), VentilationStatus::Critical);
        }
    }

    #[test]
    fn ventilation_ignores_absent_fields() {
        let rules = VentilationRules::default();
        assert_eq!(
            ventilation_status(&reading(None, None, None), &rules),
            VentilationStatus::Optimal
        );
        assert_eq!(
            ventilation_status(&reading(Some(31.0), None, None), &rules),
            VentilationStatus::Warning
        );
        assert_eq!(
            ventilation_status(&reading(None, None, Some(2.1)), &rules),
            VentilationStatus::Critical
        );
    }

    #[test]
    fn evaluate_fills_every_gauge() {
        let thresholds = Thresholds::default();
        let eval = evaluate(&reading(Some(22.0), Some(1200.0), None), &thresholds);
        assert_eq!(eval.air_quality, 70);
        assert_eq!(eval.ventilation, VentilationStatus::Warning);

        let statuses: Vec<_> = eval.metrics.iter().map(|m| m.status).collect();
        assert_eq!(
            statuses,
            vec![
                MetricStatus::Optimal,
                MetricStatus::Warning,
                MetricStatus::Warning,
                MetricStatus::Unavailable,
            ]
        );
        assert_eq!(eval.metrics[2].value, Some(70.0));
    }
}
