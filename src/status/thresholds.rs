use serde::Deserialize;

/// Inclusive band a value is expected to stay within.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct Range {
    pub low: f64,
    pub high: f64,
}

impl Range {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// True when `value` lies strictly below `low` or strictly above `high`.
    pub fn excludes(&self, value: f64) -> bool {
        value < self.low || value > self.high
    }
}

/// Warning and danger bands for one gauge. The two bands are checked
/// independently against the raw value, danger first.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct MetricBand {
    pub warning: Range,
    pub danger: Range,
}

/// Upper limits above which a single field escalates the ventilation status.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct VentilationLimits {
    pub co2: f64,
    pub pm25: f64,
    pub temperature: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct VentilationRules {
    pub critical: VentilationLimits,
    pub warning: VentilationLimits,
}

impl Default for VentilationRules {
    fn default() -> Self {
        Self {
            critical: VentilationLimits {
                co2: 1500.0,
                pm25: 2.0,
                temperature: 35.0,
            },
            warning: VentilationLimits {
                co2: 1000.0,
                pm25: 1.0,
                temperature: 30.0,
            },
        }
    }
}

/// Deductions applied to the 100-point air quality score.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AirQualityWeights {
    pub co2_divisor: f64,
    pub co2_cap: f64,
    pub pm25_factor: f64,
    pub pm25_cap: f64,
    pub temperature_baseline: f64,
    pub temperature_factor: f64,
    pub temperature_cap: f64,
}

impl Default for AirQualityWeights {
    fn default() -> Self {
        Self {
            co2_divisor: 20.0,
            co2_cap: 30.0,
            pm25_factor: 10.0,
            pm25_cap: 30.0,
            temperature_baseline: 25.0,
            temperature_factor: 2.0,
            temperature_cap: 20.0,
        }
    }
}

/// Every threshold the evaluator uses. Any subset may be overridden from a
/// TOML file; missing tables keep their defaults.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub temperature: MetricBand,
    pub gas: MetricBand,
    pub air_quality: MetricBand,
    pub dust: MetricBand,
    pub ventilation: VentilationRules,
    pub air_score: AirQualityWeights,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temperature: MetricBand {
                warning: Range::new(20.0, 30.0),
                danger: Range::new(15.0, 35.0),
            },
            gas: MetricBand {
                warning: Range::new(0.0, 1000.0),
                danger: Range::new(1000.0, 2000.0),
            },
            // Higher is better here; the bands sit below the ideal range.
            air_quality: MetricBand {
                warning: Range::new(80.0, 100.0),
                danger: Range::new(60.0, 80.0),
            },
            dust: MetricBand {
                warning: Range::new(0.0, 1.0),
                danger: Range::new(1.0, 2.0),
            },
            ventilation: VentilationRules::default(),
            air_score: AirQualityWeights::default(),
        }
    }
}

impl Thresholds {
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}
