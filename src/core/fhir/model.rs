//! FHIR wire models
//!
//! Serialization structures for the `RiskAssessment` resource as it appears on
//! the wire. These are separate from [`ForecastResource`](super::ForecastResource):
//! every element is optional here so that resources received from consumers
//! can be deserialized and then checked by the validator.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A `RiskAssessment` resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    #[serde(default)]
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrence_date_time: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub basis: Vec<Reference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prediction: Vec<Prediction>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub note: Vec<Annotation>,
}

impl RiskAssessment {
    /// Extensions with the given url
    pub fn extensions(&self, url: &str) -> impl Iterator<Item = &Extension> {
        let url = url.to_string();
        self.extension.iter().filter(move |e| e.url == url)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profile: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    /// A concept carrying only text
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            coding: Vec::new(),
            text: Some(text.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Reference {
    pub fn to(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            display: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability_decimal: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_range: Option<Range>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Range {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<Quantity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<Quantity>,
}

/// Quantity; also used for `Duration` values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub text: String,
}

/// A FHIR extension
///
/// Nested extensions go in `extension`; the single `value[x]` element (if
/// any) is kept under its wire name in `values` so that a wrongly typed value
/// survives deserialization and can be reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extension {
    #[serde(default)]
    pub url: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(flatten)]
    pub values: BTreeMap<String, Value>,
}

impl Extension {
    /// A simple extension with one `value[x]`, e.g. `("valueString", json!("x"))`
    pub fn with_value(url: impl Into<String>, kind: &str, value: Value) -> Self {
        let mut values = BTreeMap::new();
        values.insert(kind.to_string(), value);
        Self {
            url: url.into(),
            extension: Vec::new(),
            values,
        }
    }

    /// A complex extension made of sub-extensions
    pub fn nested(url: impl Into<String>, extension: Vec<Extension>) -> Self {
        Self {
            url: url.into(),
            extension,
            values: BTreeMap::new(),
        }
    }

    /// Names of the `value[x]` elements present
    pub fn value_kinds(&self) -> Vec<&str> {
        self.values
            .keys()
            .filter(|k| k.starts_with("value"))
            .map(String::as_str)
            .collect()
    }

    pub fn value_string(&self) -> Option<&str> {
        self.values.get("valueString").and_then(Value::as_str)
    }

    pub fn value_decimal(&self) -> Option<f64> {
        self.values
            .get("valueDecimal")
            .filter(|v| v.is_number())
            .and_then(Value::as_f64)
    }

    pub fn value_duration(&self) -> Option<Quantity> {
        self.values
            .get("valueDuration")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Sub-extensions with the given url
    pub fn children(&self, url: &str) -> Vec<&Extension> {
        self.extension.iter().filter(|e| e.url == url).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extension_value_roundtrip_keeps_wire_name() {
        let ext = Extension::with_value("modelName", "valueString", json!("AegisBERT"));
        let value = serde_json::to_value(&ext).unwrap();
        assert_eq!(value, json!({"url": "modelName", "valueString": "AegisBERT"}));

        let back: Extension = serde_json::from_value(value).unwrap();
        assert_eq!(back.value_string(), Some("AegisBERT"));
        assert_eq!(back.value_kinds(), vec!["valueString"]);
    }

    #[test]
    fn test_extension_typed_accessors_reject_wrong_types() {
        let ext: Extension = serde_json::from_value(json!({
            "url": "confidenceScore",
            "valueString": "0.9"
        }))
        .unwrap();
        assert_eq!(ext.value_decimal(), None);
        assert_eq!(ext.value_duration(), None);
    }

    #[test]
    fn test_risk_assessment_camel_case() {
        let ra = RiskAssessment {
            resource_type: "RiskAssessment".to_string(),
            occurrence_date_time: Some("2024-03-01T00:00:00Z".to_string()),
            prediction: vec![Prediction {
                probability_decimal: Some(0.5),
                ..Default::default()
            }],
            ..Default::default()
        };
        let value = serde_json::to_value(&ra).unwrap();
        assert_eq!(value["resourceType"], "RiskAssessment");
        assert_eq!(value["occurrenceDateTime"], "2024-03-01T00:00:00Z");
        assert_eq!(value["prediction"][0]["probabilityDecimal"], 0.5);
        assert!(value.get("basis").is_none());
    }
}
