//! Unit conversion policy
//!
//! Each observation code has exactly one canonical UCUM unit and a closed list
//! of accepted source units with a linear conversion. Nothing is inferred: a
//! code without a rule, or a unit outside the accepted list, is rejected.

use crate::config::UnitsConfig;
use crate::domain::NormalizationError;
use std::collections::BTreeMap;

/// Accepted source unit: `canonical = value * factor + offset`
#[derive(Debug, Clone, PartialEq)]
pub struct UnitConversion {
    pub unit: String,
    pub factor: f64,
    pub offset: f64,
}

impl UnitConversion {
    pub fn new(unit: impl Into<String>, factor: f64, offset: f64) -> Self {
        Self {
            unit: unit.into(),
            factor,
            offset,
        }
    }

    /// Applies the conversion, rounded to six decimals
    pub fn apply(&self, value: f64) -> f64 {
        let converted = value * self.factor + self.offset;
        (converted * 1e6).round() / 1e6
    }
}

/// Canonical unit and accepted source units for one code
#[derive(Debug, Clone, PartialEq)]
pub struct UnitRule {
    pub canonical: String,
    pub accepted: Vec<UnitConversion>,
}

impl UnitRule {
    /// Finds the conversion for a source unit; the canonical unit itself needs none
    fn conversion_for(&self, unit: &str) -> Option<Option<&UnitConversion>> {
        if unit == self.canonical {
            return Some(None);
        }
        if let Some(exact) = self.accepted.iter().find(|c| c.unit == unit) {
            return Some(Some(exact));
        }
        if unit.eq_ignore_ascii_case(&self.canonical) {
            return Some(None);
        }
        self.accepted
            .iter()
            .find(|c| c.unit.eq_ignore_ascii_case(unit))
            .map(Some)
    }

    /// Dimensionless rules accept a missing unit
    fn is_dimensionless(&self) -> bool {
        self.canonical == "1"
    }
}

/// A value expressed in canonical units
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub value: f64,
    pub unit: String,
}

/// (code, canonical unit, accepted source units as (unit, factor, offset))
type UnitSeed = (&'static str, &'static str, &'static [(&'static str, f64, f64)]);

const BUILTIN_RULES: &[UnitSeed] = &[
    // Body temperature
    ("8310-5", "Cel", &[("degF", 5.0 / 9.0, -160.0 / 9.0), ("[degF]", 5.0 / 9.0, -160.0 / 9.0), ("F", 5.0 / 9.0, -160.0 / 9.0), ("C", 1.0, 0.0)]),
    // Body weight
    ("29463-7", "kg", &[("[lb_av]", 0.45359237, 0.0), ("lb", 0.45359237, 0.0), ("lbs", 0.45359237, 0.0), ("g", 0.001, 0.0)]),
    // Body height
    ("8302-2", "cm", &[("[in_i]", 2.54, 0.0), ("in", 2.54, 0.0), ("m", 100.0, 0.0)]),
    // Glucose
    ("2345-7", "mg/dL", &[("mmol/L", 18.016, 0.0)]),
    // Systolic / diastolic blood pressure
    ("8480-6", "mm[Hg]", &[("mmHg", 1.0, 0.0)]),
    ("8462-4", "mm[Hg]", &[("mmHg", 1.0, 0.0)]),
    // Heart rate / respiratory rate
    ("8867-4", "/min", &[("bpm", 1.0, 0.0), ("beats/min", 1.0, 0.0)]),
    ("9279-1", "/min", &[("breaths/min", 1.0, 0.0)]),
    // Oxygen saturation
    ("59408-5", "%", &[]),
    ("2708-6", "%", &[]),
    // BMI
    ("39156-5", "kg/m2", &[("kg/m^2", 1.0, 0.0)]),
    // HbA1c
    ("4548-4", "%", &[]),
    // FEV1/FVC
    ("19926-5", "%", &[]),
    // Environmental exposures
    ("pm25", "ug/m3", &[("µg/m3", 1.0, 0.0), ("ug/m^3", 1.0, 0.0)]),
    ("pm10", "ug/m3", &[("µg/m3", 1.0, 0.0), ("ug/m^3", 1.0, 0.0)]),
    ("ozone", "ppb", &[("ppm", 1000.0, 0.0)]),
    ("aqi", "1", &[]),
    ("pollen", "/m3", &[("grains/m3", 1.0, 0.0)]),
    ("temperature", "Cel", &[("degF", 5.0 / 9.0, -160.0 / 9.0), ("F", 5.0 / 9.0, -160.0 / 9.0), ("C", 1.0, 0.0)]),
    ("humidity", "%", &[]),
];

/// Code to canonical unit policy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitPolicy {
    rules: BTreeMap<String, UnitRule>,
}

impl UnitPolicy {
    /// An empty policy that rejects every observation
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in vital sign, lab, and environmental rules
    pub fn builtin() -> Self {
        let mut policy = Self::empty();
        for (code, canonical, accepted) in BUILTIN_RULES {
            policy.insert(
                *code,
                UnitRule {
                    canonical: (*canonical).to_string(),
                    accepted: accepted
                        .iter()
                        .map(|(unit, factor, offset)| UnitConversion::new(*unit, *factor, *offset))
                        .collect(),
                },
            );
        }
        policy
    }

    /// Built-in rules overlaid with configured ones (configured rules replace
    /// built-in rules for the same code)
    pub fn from_config(config: &UnitsConfig) -> Self {
        let mut policy = Self::builtin();
        for rule in &config.rules {
            policy.insert(
                rule.code.trim(),
                UnitRule {
                    canonical: rule.canonical.trim().to_string(),
                    accepted: rule
                        .accepted
                        .iter()
                        .map(|c| UnitConversion::new(c.unit.trim(), c.factor, c.offset))
                        .collect(),
                },
            );
        }
        policy
    }

    pub fn insert(&mut self, code: impl Into<String>, rule: UnitRule) {
        self.rules.insert(code.into(), rule);
    }

    pub fn rule(&self, code: &str) -> Option<&UnitRule> {
        self.rules.get(code)
    }

    pub fn canonical_unit(&self, code: &str) -> Option<&str> {
        self.rules.get(code).map(|r| r.canonical.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Converts `value` in `unit` to the canonical unit for `code`
    ///
    /// # Errors
    ///
    /// Returns `NormalizationError::IncompatibleUnit` when the code has no rule,
    /// the unit is missing (and the rule is not dimensionless), or the unit is
    /// not accepted for the code
    ///
    /// # Examples
    ///
    /// ```
    /// use aegis::core::normalize::UnitPolicy;
    ///
    /// let policy = UnitPolicy::builtin();
    /// let m = policy.convert("observations[0]", "8310-5", 98.6, Some("degF")).unwrap();
    /// assert_eq!(m.unit, "Cel");
    /// assert_eq!(m.value, 37.0);
    /// ```
    pub fn convert(
        &self,
        field: &str,
        code: &str,
        value: f64,
        unit: Option<&str>,
    ) -> Result<Measurement, NormalizationError> {
        let incompatible = |unit: &str| NormalizationError::IncompatibleUnit {
            field: field.to_string(),
            code: code.to_string(),
            unit: unit.to_string(),
        };

        let rule = self
            .rules
            .get(code)
            .ok_or_else(|| incompatible(unit.unwrap_or("<none>")))?;

        let unit = match unit.map(str::trim).filter(|u| !u.is_empty()) {
            Some(unit) => unit,
            None if rule.is_dimensionless() => {
                return Ok(Measurement {
                    value,
                    unit: rule.canonical.clone(),
                })
            }
            None => return Err(incompatible("<none>")),
        };

        match rule.conversion_for(unit) {
            Some(None) => Ok(Measurement {
                value,
                unit: rule.canonical.clone(),
            }),
            Some(Some(conversion)) => Ok(Measurement {
                value: conversion.apply(value),
                unit: rule.canonical.clone(),
            }),
            None => Err(incompatible(unit)),
        }
    }
}
