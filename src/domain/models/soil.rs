//! Soil sensor thresholds and reading classification.
//!
//! Each monitored soil parameter carries a `(min, optimal, max)` triple.
//! Readings are classified against that triple and non-optimal values are
//! mapped to an agronomic action.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

use serde::Serialize;

use crate::domain::errors::NumericRange;

/// Fraction of the `[min, max]` span around `optimal` that still counts as optimal.
const OPTIMAL_BAND: f64 = 0.1;

/// The six soil parameters every configuration must define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SoilParameter {
    Moisture,
    Ph,
    Nitrogen,
    Phosphorus,
    Potassium,
    Temperature,
}

impl SoilParameter {
    /// All parameters in document order.
    pub const ALL: [Self; 6] = [
        Self::Moisture,
        Self::Ph,
        Self::Nitrogen,
        Self::Phosphorus,
        Self::Potassium,
        Self::Temperature,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Moisture => "moisture",
            Self::Ph => "ph",
            Self::Nitrogen => "nitrogen",
            Self::Phosphorus => "phosphorus",
            Self::Potassium => "potassium",
            Self::Temperature => "temperature",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }

    /// Physically meaningful range for `min`, `max` and `optimal`.
    pub const fn valid_range(self) -> NumericRange {
        match self {
            Self::Moisture => NumericRange::inclusive(0.0, 100.0),
            Self::Ph => NumericRange::inclusive(0.0, 14.0),
            Self::Nitrogen | Self::Phosphorus | Self::Potassium => {
                NumericRange::inclusive(0.0, 1000.0)
            }
            Self::Temperature => NumericRange::inclusive(-50.0, 80.0),
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Self::Moisture => "%",
            Self::Ph => "pH",
            Self::Nitrogen | Self::Phosphorus | Self::Potassium => "ppm",
            Self::Temperature => "°C",
        }
    }

    /// Corrective action for a non-optimal condition.
    pub const fn recommendation(self, condition: SoilCondition) -> Option<&'static str> {
        let action = match (self, condition) {
            (_, SoilCondition::Optimal) => return None,
            (Self::Moisture, SoilCondition::Low) => "Increase irrigation frequency",
            (Self::Moisture, SoilCondition::High) => "Reduce irrigation and improve drainage",
            (Self::Moisture, SoilCondition::Suboptimal) => "Adjust irrigation schedule",
            (Self::Ph, SoilCondition::Low) => "Apply lime to increase pH",
            (Self::Ph, SoilCondition::High) => "Apply sulfur to decrease pH",
            (Self::Ph, SoilCondition::Suboptimal) => "Monitor pH levels",
            (Self::Nitrogen, SoilCondition::Low) => "Apply nitrogen-rich fertilizer",
            (Self::Nitrogen, SoilCondition::High) => "Reduce nitrogen application",
            (Self::Nitrogen, SoilCondition::Suboptimal) => "Adjust nitrogen levels gradually",
            (Self::Phosphorus, SoilCondition::Low) => "Apply phosphate fertilizer",
            (Self::Phosphorus, SoilCondition::High) => "Reduce phosphorus application",
            (Self::Phosphorus, SoilCondition::Suboptimal) => "Monitor phosphorus levels",
            (Self::Potassium, SoilCondition::Low) => "Apply potassium-rich fertilizer",
            (Self::Potassium, SoilCondition::High) => "Reduce potassium application",
            (Self::Potassium, SoilCondition::Suboptimal) => "Adjust potassium levels",
            (Self::Temperature, SoilCondition::Low) => "Consider soil warming techniques",
            (Self::Temperature, SoilCondition::High) => "Apply mulch for temperature regulation",
            (Self::Temperature, SoilCondition::Suboptimal) => "Monitor soil temperature",
        };
        Some(action)
    }
}

impl fmt::Display for SoilParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a reading falls relative to its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SoilCondition {
    Low,
    Optimal,
    Suboptimal,
    High,
}

impl fmt::Display for SoilCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Optimal => "optimal",
            Self::Suboptimal => "suboptimal",
            Self::High => "high",
        };
        f.write_str(s)
    }
}

/// Acceptable and ideal bounds for one soil parameter.
///
/// A validated threshold always satisfies `min <= optimal <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SoilThreshold {
    pub min: f64,
    pub max: f64,
    pub optimal: f64,
}

impl SoilThreshold {
    pub const fn new(min: f64, optimal: f64, max: f64) -> Self {
        Self { min, max, optimal }
    }

    pub fn is_ordered(&self) -> bool {
        self.min <= self.optimal && self.optimal <= self.max
    }

    /// Classify a reading: outside `[min, max]` is low/high, within 10% of
    /// the span around `optimal` is optimal, anything else suboptimal.
    pub fn classify(&self, value: f64) -> SoilCondition {
        if value < self.min {
            SoilCondition::Low
        } else if value > self.max {
            SoilCondition::High
        } else if (value - self.optimal).abs() <= (self.max - self.min) * OPTIMAL_BAND {
            SoilCondition::Optimal
        } else {
            SoilCondition::Suboptimal
        }
    }
}

/// Thresholds for all six soil parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoilThresholds {
    pub moisture: SoilThreshold,
    pub ph: SoilThreshold,
    pub nitrogen: SoilThreshold,
    pub phosphorus: SoilThreshold,
    pub potassium: SoilThreshold,
    pub temperature: SoilThreshold,
}

impl SoilThresholds {
    pub const fn get(&self, parameter: SoilParameter) -> &SoilThreshold {
        match parameter {
            SoilParameter::Moisture => &self.moisture,
            SoilParameter::Ph => &self.ph,
            SoilParameter::Nitrogen => &self.nitrogen,
            SoilParameter::Phosphorus => &self.phosphorus,
            SoilParameter::Potassium => &self.potassium,
            SoilParameter::Temperature => &self.temperature,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (SoilParameter, &SoilThreshold)> {
        SoilParameter::ALL.into_iter().map(move |p| (p, self.get(p)))
    }
}

impl Index<SoilParameter> for SoilThresholds {
    type Output = SoilThreshold;

    fn index(&self, parameter: SoilParameter) -> &Self::Output {
        self.get(parameter)
    }
}

impl Default for SoilThresholds {
    fn default() -> Self {
        Self {
            moisture: SoilThreshold::new(20.0, 50.0, 80.0),
            ph: SoilThreshold::new(5.5, 6.5, 7.5),
            nitrogen: SoilThreshold::new(0.0, 60.0, 100.0),
            phosphorus: SoilThreshold::new(0.0, 45.0, 100.0),
            potassium: SoilThreshold::new(0.0, 50.0, 100.0),
            temperature: SoilThreshold::new(10.0, 25.0, 35.0),
        }
    }
}

/// A set of sensor values keyed by parameter. Parameters may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SoilReading {
    pub values: BTreeMap<SoilParameter, f64>,
}

impl SoilReading {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, parameter: SoilParameter, value: f64) -> Self {
        self.values.insert(parameter, value);
        self
    }
}

/// Action suggested for a parameter outside its optimal band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub parameter: SoilParameter,
    pub current_value: f64,
    pub condition: SoilCondition,
    pub action: &'static str,
}

/// Result of classifying a [`SoilReading`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SoilAnalysis {
    pub conditions: BTreeMap<SoilParameter, SoilCondition>,
    pub recommendations: Vec<Recommendation>,
}

impl SoilAnalysis {
    pub fn is_healthy(&self) -> bool {
        self.recommendations.is_empty()
    }
}

/// Classify every value in `reading` against `thresholds`.
pub fn analyze(thresholds: &SoilThresholds, reading: &SoilReading) -> SoilAnalysis {
    let mut analysis = SoilAnalysis::default();
    for (&parameter, &value) in &reading.values {
        let condition = thresholds[parameter].classify(value);
        analysis.conditions.insert(parameter, condition);
        if let Some(action) = parameter.recommendation(condition) {
            analysis.recommendations.push(Recommendation {
                parameter,
                current_value: value,
                condition,
                action,
            });
        }
    }
    analysis
}
