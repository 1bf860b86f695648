//! AegisHealthForecast profile validator
//!
//! Checks a candidate `RiskAssessment` against the structural, cardinality,
//! terminology, and type constraints of the profile. Every check runs, so the
//! caller receives the complete set of violations in one pass.

use super::model::{Extension, Prediction, RiskAssessment};
use super::profile::{self, Cardinality};
use crate::domain::{ForecastMethod, HorizonUnit, ValidationError, Violation, ViolationKind};
use serde_json::{Map, Value};

const ROOT: &str = "RiskAssessment";

/// Validates a wire resource
///
/// # Errors
///
/// Returns a `ValidationError` carrying every violation found
///
/// # Examples
///
/// ```
/// use aegis::core::fhir::{validator, RiskAssessment};
///
/// let empty = RiskAssessment {
///     resource_type: "RiskAssessment".to_string(),
///     ..Default::default()
/// };
/// let err = validator::validate(&empty).unwrap_err();
/// assert!(err.violations.len() > 1);
/// ```
pub fn validate(resource: &RiskAssessment) -> Result<(), ValidationError> {
    let violations = check(resource);
    if violations.is_empty() {
        Ok(())
    } else {
        tracing::debug!(violations = violations.len(), "Profile validation failed");
        Err(ValidationError::new(violations))
    }
}

/// Validates arbitrary JSON received from a consumer
///
/// Elements of the wrong JSON type are reported as type violations at their
/// own paths and then dropped, so the profile checks still run over the rest
/// of the document.
///
/// ```
/// use aegis::core::fhir::validate_json;
/// use serde_json::json;
///
/// let err = validate_json(&json!({
///     "resourceType": "RiskAssessment",
///     "subject": "Patient/1",
///     "prediction": "soon"
/// }))
/// .unwrap_err();
/// assert!(err.violations.len() >= 4);
/// ```
pub fn validate_json(value: &Value) -> Result<(), ValidationError> {
    if !value.is_object() {
        return Err(ValidationError::new(vec![Violation::new(
            ROOT,
            ViolationKind::Structure,
            "resource must be a JSON object",
        )]));
    }

    let mut document = value.clone();
    let mut violations = Vec::new();
    Shape::Object(RISK_ASSESSMENT).sanitize(ROOT, &mut document, &mut violations);

    let resource: RiskAssessment = match serde_json::from_value(document) {
        Ok(resource) => resource,
        Err(e) => {
            violations.push(Violation::new(
                ROOT,
                ViolationKind::Structure,
                format!("not a readable RiskAssessment: {e}"),
            ));
            return Err(ValidationError::new(violations));
        }
    };

    let reported: Vec<String> = violations.iter().map(|v| v.path.clone()).collect();
    violations.extend(
        check(&resource)
            .into_iter()
            .filter(|v| !reported.iter().any(|p| covers(p, &v.path))),
    );

    if violations.is_empty() {
        Ok(())
    } else {
        tracing::debug!(violations = violations.len(), "Profile validation failed");
        Err(ValidationError::new(violations))
    }
}

/// Whether a violation at `path` is already explained by one at `reported`
fn covers(reported: &str, path: &str) -> bool {
    path.strip_prefix(reported)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.') || rest.starts_with('['))
}

/// Expected JSON type of a wire element
enum Shape {
    String,
    Number,
    Object(&'static [(&'static str, Shape)]),
    Array(&'static Shape),
    /// An extension: `url` string, nested extensions, free `value[x]`
    Extension,
}

const CODING: Shape = Shape::Object(&[
    ("system", Shape::String),
    ("code", Shape::String),
    ("display", Shape::String),
]);
const CODEABLE_CONCEPT: Shape =
    Shape::Object(&[("coding", Shape::Array(&CODING)), ("text", Shape::String)]);
const REFERENCE: Shape = Shape::Object(&[("reference", Shape::String), ("display", Shape::String)]);
const QUANTITY: Shape = Shape::Object(&[
    ("value", Shape::Number),
    ("unit", Shape::String),
    ("system", Shape::String),
    ("code", Shape::String),
]);
const RANGE: Shape = Shape::Object(&[("low", QUANTITY), ("high", QUANTITY)]);
const PREDICTION: Shape = Shape::Object(&[
    ("outcome", CODEABLE_CONCEPT),
    ("probabilityDecimal", Shape::Number),
    ("whenRange", RANGE),
    ("rationale", Shape::String),
]);
const ANNOTATION: Shape = Shape::Object(&[("text", Shape::String)]);
const EXTENSIONS: Shape = Shape::Array(&Shape::Extension);

const RISK_ASSESSMENT: &[(&str, Shape)] = &[
    ("resourceType", Shape::String),
    ("id", Shape::String),
    ("meta", Shape::Object(&[("profile", Shape::Array(&Shape::String))])),
    ("extension", EXTENSIONS),
    ("status", Shape::String),
    ("method", CODEABLE_CONCEPT),
    ("subject", REFERENCE),
    ("occurrenceDateTime", Shape::String),
    ("basis", Shape::Array(&REFERENCE)),
    ("prediction", Shape::Array(&PREDICTION)),
    ("note", Shape::Array(&ANNOTATION)),
];

impl Shape {
    fn name(&self) -> &'static str {
        match self {
            Shape::String => "a string",
            Shape::Number => "a number",
            Shape::Object(_) | Shape::Extension => "an object",
            Shape::Array(_) => "an array",
        }
    }

    /// Checks `value` against the shape, removing every mistyped element
    /// below it; returns whether `value` itself may stay
    ///
    /// Mistyped objects inside arrays are replaced by `{}` so that later
    /// element paths keep their indices. Extensions without a usable `url`
    /// are dropped.
    fn sanitize(&self, path: &str, value: &mut Value, out: &mut Vec<Violation>) -> bool {
        let admissible = match self {
            Shape::String => value.is_string(),
            Shape::Number => value.is_number(),
            Shape::Array(item) => match value.as_array_mut() {
                Some(items) => {
                    let mut index = 0;
                    items.retain_mut(|element| {
                        let keep = item.sanitize(&format!("{path}[{index}]"), element, out);
                        index += 1;
                        if !keep && matches!(item, Shape::Object(_)) {
                            *element = Value::Object(Map::new());
                            return true;
                        }
                        keep
                    });
                    true
                }
                None => false,
            },
            Shape::Object(fields) => match value.as_object_mut() {
                Some(map) => {
                    sanitize_fields(path, fields, map, out);
                    true
                }
                None => false,
            },
            Shape::Extension => match value.as_object_mut() {
                Some(map) => return sanitize_extension(path, map, out),
                None => false,
            },
        };
        if !admissible {
            out.push(type_violation(
                path,
                &format!("expected {}, found {}", self.name(), json_type(value)),
            ));
        }
        admissible
    }
}

fn sanitize_fields(
    path: &str,
    fields: &[(&str, Shape)],
    map: &mut Map<String, Value>,
    out: &mut Vec<Violation>,
) {
    for (name, shape) in fields {
        let keep = match map.get_mut(*name) {
            None => continue,
            Some(Value::Null) => false,
            Some(child) => shape.sanitize(&format!("{path}.{name}"), child, out),
        };
        if !keep {
            map.remove(*name);
        }
    }
}

/// Returns whether the extension has a usable `url`
fn sanitize_extension(path: &str, map: &mut Map<String, Value>, out: &mut Vec<Violation>) -> bool {
    let url_path = format!("{path}.url");
    match map.get("url") {
        Some(Value::String(url)) if !url.trim().is_empty() => {}
        Some(Value::String(_)) | Some(Value::Null) | None => {
            out.push(missing(url_path, "extension url is required"));
            return false;
        }
        Some(other) => {
            let message = format!("expected a string, found {}", json_type(other));
            out.push(type_violation(&url_path, &message));
            return false;
        }
    }
    sanitize_fields(path, &[("extension", EXTENSIONS)], map, out);
    true
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Runs every check and returns all violations (empty when conformant)
pub fn check(resource: &RiskAssessment) -> Vec<Violation> {
    let mut violations = Vec::new();

    check_resource_type(resource, &mut violations);
    check_status(resource, &mut violations);
    check_subject(resource, &mut violations);
    check_method(resource, &mut violations);
    check_basis(resource, &mut violations);
    check_predictions(resource, &mut violations);
    check_forecast_horizon(resource, &mut violations);
    check_model_metadata(resource, &mut violations);

    violations
}

fn check_resource_type(resource: &RiskAssessment, out: &mut Vec<Violation>) {
    if resource.resource_type != profile::RESOURCE_TYPE {
        out.push(Violation::new(
            format!("{ROOT}.resourceType"),
            ViolationKind::Structure,
            format!(
                "expected '{}', found '{}'",
                profile::RESOURCE_TYPE,
                resource.resource_type
            ),
        ));
    }
}

fn check_status(resource: &RiskAssessment, out: &mut Vec<Violation>) {
    let path = format!("{ROOT}.status");
    match resource.status.as_deref().map(str::trim) {
        None | Some("") => out.push(missing(path, "status is required")),
        Some(status) if !profile::RISK_ASSESSMENT_STATUSES.contains(&status) => {
            out.push(Violation::new(
                path,
                ViolationKind::Terminology,
                format!("'{status}' is not a RiskAssessment status"),
            ))
        }
        Some(_) => {}
    }
}

fn check_subject(resource: &RiskAssessment, out: &mut Vec<Violation>) {
    let reference = resource
        .subject
        .as_ref()
        .and_then(|s| s.reference.as_deref())
        .map(str::trim)
        .filter(|r| !r.is_empty());
    if reference.is_none() {
        out.push(missing(
            format!("{ROOT}.subject"),
            "subject reference is required",
        ));
    }
}

fn check_method(resource: &RiskAssessment, out: &mut Vec<Violation>) {
    let path = format!("{ROOT}.method");
    let Some(method) = &resource.method else {
        out.push(missing(path, "method is required"));
        return;
    };

    let codings: Vec<_> = method
        .coding
        .iter()
        .filter(|c| c.system.as_deref() == Some(profile::FORECAST_METHOD_SYSTEM))
        .collect();

    if codings.is_empty() {
        out.push(Violation::new(
            path,
            ViolationKind::Terminology,
            format!(
                "method must be coded from {}",
                profile::FORECAST_METHOD_SYSTEM
            ),
        ));
        return;
    }

    for coding in codings {
        let code = coding.code.as_deref().unwrap_or_default();
        if code.parse::<ForecastMethod>().is_err() {
            out.push(Violation::new(
                format!("{path}.coding"),
                ViolationKind::Terminology,
                format!(
                    "code '{code}' is not in the forecast-method code system ({})",
                    ForecastMethod::allowed_codes()
                ),
            ));
        }
    }
}

fn check_basis(resource: &RiskAssessment, out: &mut Vec<Violation>) {
    for (i, basis) in resource.basis.iter().enumerate() {
        let empty = basis
            .reference
            .as_deref()
            .map_or(true, |r| r.trim().is_empty());
        if empty {
            out.push(missing(
                format!("{ROOT}.basis[{i}].reference"),
                "basis entries must reference UDM evidence",
            ));
        }
    }
}

fn check_predictions(resource: &RiskAssessment, out: &mut Vec<Violation>) {
    if resource.prediction.is_empty() {
        out.push(missing(
            format!("{ROOT}.prediction"),
            "at least one prediction is required",
        ));
        return;
    }
    for (i, prediction) in resource.prediction.iter().enumerate() {
        check_prediction(&format!("{ROOT}.prediction[{i}]"), prediction, out);
    }
}

fn check_prediction(path: &str, prediction: &Prediction, out: &mut Vec<Violation>) {
    let has_outcome = prediction.outcome.as_ref().is_some_and(|o| {
        o.text.as_deref().is_some_and(|t| !t.trim().is_empty()) || !o.coding.is_empty()
    });
    if !has_outcome {
        out.push(missing(format!("{path}.outcome"), "outcome is required"));
    }

    match prediction.probability_decimal {
        None => out.push(missing(
            format!("{path}.probabilityDecimal"),
            "probabilityDecimal is required",
        )),
        Some(p) if !(p.is_finite() && (0.0..=1.0).contains(&p)) => out.push(Violation::new(
            format!("{path}.probabilityDecimal"),
            ViolationKind::Range,
            format!("{p} is outside [0, 1]"),
        )),
        Some(_) => {}
    }

    let Some(range) = &prediction.when_range else {
        out.push(missing(format!("{path}.whenRange"), "whenRange is required"));
        return;
    };
    let high = range.high.as_ref().and_then(|q| q.value);
    let low = range.low.as_ref().and_then(|q| q.value);
    match (low, high) {
        (_, None) => out.push(missing(
            format!("{path}.whenRange.high"),
            "whenRange must have an upper bound",
        )),
        (Some(low), Some(high)) if low > high => out.push(Violation::new(
            format!("{path}.whenRange"),
            ViolationKind::Range,
            format!("low ({low}) is greater than high ({high})"),
        )),
        _ => {}
    }
}

fn check_forecast_horizon(resource: &RiskAssessment, out: &mut Vec<Violation>) {
    let path = format!("{ROOT}.extension:forecastHorizon");
    let horizons: Vec<_> = resource.extensions(profile::FORECAST_HORIZON_URL).collect();
    if !check_count(&path, horizons.len(), Cardinality::EXACTLY_ONE, out) {
        return;
    }

    for ext in horizons {
        if ext.value_kinds() != ["valueDuration"] {
            out.push(type_violation(&path, "value must be a single valueDuration"));
            continue;
        }
        let Some(duration) = ext.value_duration() else {
            out.push(type_violation(&path, "valueDuration is not a Duration"));
            continue;
        };

        match duration.value {
            Some(v) if v.is_finite() && v > 0.0 => {}
            _ => out.push(Violation::new(
                format!("{path}.valueDuration.value"),
                ViolationKind::Range,
                "duration value must be a positive number",
            )),
        }
        let ucum = duration.system.as_deref() == Some(profile::UCUM_SYSTEM);
        let time_unit = duration
            .code
            .as_deref()
            .and_then(HorizonUnit::from_ucum)
            .is_some();
        if !(ucum && time_unit) {
            out.push(type_violation(
                &format!("{path}.valueDuration"),
                "duration must carry a UCUM time unit (h, d, wk, mo, a)",
            ));
        }
    }
}

fn check_model_metadata(resource: &RiskAssessment, out: &mut Vec<Violation>) {
    let path = format!("{ROOT}.extension:modelMetadata");
    let blocks: Vec<_> = resource.extensions(profile::MODEL_METADATA_URL).collect();
    if !check_count(&path, blocks.len(), Cardinality::EXACTLY_ONE, out) {
        return;
    }

    for block in blocks {
        if !block.value_kinds().is_empty() {
            out.push(Violation::new(
                &path,
                ViolationKind::Structure,
                "modelMetadata is a complex extension and cannot carry a value",
            ));
        }

        for (url, cardinality) in profile::MODEL_METADATA_SLICES {
            let slice_path = format!("{path}.extension:{url}");
            let children = block.children(url);
            check_count(&slice_path, children.len(), cardinality, out);
            for child in children {
                check_slice_type(&slice_path, url, child, out);
            }
        }

        for child in &block.extension {
            let known = profile::MODEL_METADATA_SLICES
                .iter()
                .any(|(url, _)| *url == child.url);
            if !known {
                out.push(Violation::new(
                    format!("{path}.extension"),
                    ViolationKind::Structure,
                    format!("unknown modelMetadata sub-extension '{}'", child.url),
                ));
            }
        }
    }
}

fn check_slice_type(path: &str, url: &str, ext: &Extension, out: &mut Vec<Violation>) {
    if url == profile::CONFIDENCE_SCORE {
        if ext.value_kinds() != ["valueDecimal"] {
            out.push(type_violation(path, "value must be a valueDecimal"));
            return;
        }
        match ext.value_decimal() {
            Some(score) if (0.0..=1.0).contains(&score) => {}
            Some(score) => out.push(Violation::new(
                path,
                ViolationKind::Range,
                format!("{score} is outside [0, 1]"),
            )),
            None => out.push(type_violation(path, "valueDecimal must be a number")),
        }
        return;
    }

    let is_string = ext.value_kinds() == ["valueString"]
        && ext.value_string().is_some_and(|s| !s.trim().is_empty());
    if !is_string {
        out.push(type_violation(path, "value must be a non-empty valueString"));
    }
}

/// Records a cardinality violation; returns whether the count is admissible
fn check_count(path: &str, count: usize, cardinality: Cardinality, out: &mut Vec<Violation>) -> bool {
    if cardinality.admits(count) {
        return true;
    }
    if count < cardinality.min {
        out.push(missing(
            path,
            format!("required element is absent (cardinality {cardinality})"),
        ));
    } else {
        out.push(Violation::new(
            path,
            ViolationKind::Cardinality,
            format!("found {count}, cardinality is {cardinality}"),
        ));
    }
    false
}

fn missing(path: impl Into<String>, message: impl Into<String>) -> Violation {
    Violation::new(path, ViolationKind::MissingRequired, message)
}

fn type_violation(path: &str, message: &str) -> Violation {
    Violation::new(path, ViolationKind::Type, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fhir::model::{CodeableConcept, Coding, Quantity, Range, Reference};
    use serde_json::json;

    fn conformant() -> RiskAssessment {
        RiskAssessment {
            resource_type: "RiskAssessment".to_string(),
            id: Some("r-1".to_string()),
            meta: None,
            extension: vec![
                Extension::with_value(
                    profile::FORECAST_HORIZON_URL,
                    "valueDuration",
                    json!({"value": 30, "unit": "days", "system": profile::UCUM_SYSTEM, "code": "d"}),
                ),
                Extension::nested(
                    profile::MODEL_METADATA_URL,
                    vec![
                        Extension::with_value(profile::MODEL_NAME, "valueString", json!("AegisBERT")),
                        Extension::with_value(profile::MODEL_VERSION, "valueString", json!("1.2.0")),
                    ],
                ),
            ],
            status: Some("final".to_string()),
            method: Some(CodeableConcept {
                coding: vec![Coding {
                    system: Some(profile::FORECAST_METHOD_SYSTEM.to_string()),
                    code: Some("bert-clinical".to_string()),
                    display: None,
                }],
                text: None,
            }),
            subject: Some(Reference::to("Patient/patient-123")),
            occurrence_date_time: Some("2024-03-01T00:00:00Z".to_string()),
            basis: vec![Reference::to("Condition/patient-123-cond-1")],
            prediction: vec![Prediction {
                outcome: Some(CodeableConcept::text("Asthma exacerbation")),
                probability_decimal: Some(0.72),
                when_range: Some(Range {
                    low: Some(Quantity { value: Some(0.0), ..Default::default() }),
                    high: Some(Quantity { value: Some(30.0), ..Default::default() }),
                }),
                rationale: None,
            }],
            note: vec![],
        }
    }

    fn metadata_mut(resource: &mut RiskAssessment) -> &mut Extension {
        resource
            .extension
            .iter_mut()
            .find(|e| e.url == profile::MODEL_METADATA_URL)
            .unwrap()
    }

    #[test]
    fn test_conformant_resource_passes() {
        assert_eq!(check(&conformant()), vec![]);
        assert!(validate(&conformant()).is_ok());
    }

    #[test]
    fn test_missing_model_version_is_a_single_violation() {
        let mut resource = conformant();
        metadata_mut(&mut resource)
            .extension
            .retain(|e| e.url != profile::MODEL_VERSION);

        let err = validate(&resource).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(
            err.violations[0].path,
            "RiskAssessment.extension:modelMetadata.extension:modelVersion"
        );
        assert_eq!(err.violations[0].kind, ViolationKind::MissingRequired);
    }

    #[test]
    fn test_every_violation_is_reported() {
        let mut resource = conformant();
        resource.status = None;
        resource.method.as_mut().unwrap().coding[0].code = Some("random-forest".to_string());
        resource.prediction[0].probability_decimal = Some(1.5);
        resource.extension.retain(|e| e.url != profile::FORECAST_HORIZON_URL);

        let kinds: Vec<ViolationKind> = check(&resource).into_iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ViolationKind::MissingRequired,
                ViolationKind::Terminology,
                ViolationKind::Range,
                ViolationKind::MissingRequired,
            ]
        );
    }

    #[test]
    fn test_method_code_is_case_sensitive() {
        let mut resource = conformant();
        resource.method.as_mut().unwrap().coding[0].code = Some("BERT-Clinical".to_string());
        let violations = check(&resource);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::Terminology);
    }

    #[test]
    fn test_method_from_foreign_system() {
        let mut resource = conformant();
        resource.method.as_mut().unwrap().coding[0].system = Some("http://example.org".to_string());
        assert_eq!(check(&resource)[0].kind, ViolationKind::Terminology);
    }

    #[test]
    fn test_duplicate_horizon_is_a_cardinality_violation() {
        let mut resource = conformant();
        let horizon = resource.extension[0].clone();
        resource.extension.push(horizon);
        let violations = check(&resource);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::Cardinality);
        assert_eq!(violations[0].path, "RiskAssessment.extension:forecastHorizon");
    }

    #[test]
    fn test_horizon_must_be_a_duration() {
        let mut resource = conformant();
        resource.extension[0] =
            Extension::with_value(profile::FORECAST_HORIZON_URL, "valueString", json!("30 days"));
        let violations = check(&resource);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::Type);

        resource.extension[0] = Extension::with_value(
            profile::FORECAST_HORIZON_URL,
            "valueDuration",
            json!({"value": 30, "system": profile::UCUM_SYSTEM, "code": "kg"}),
        );
        assert_eq!(check(&resource)[0].kind, ViolationKind::Type);
    }

    #[test]
    fn test_model_metadata_types() {
        let mut resource = conformant();
        let meta = metadata_mut(&mut resource);
        meta.extension[0] = Extension::with_value(profile::MODEL_NAME, "valueInteger", json!(7));
        meta.extension.push(Extension::with_value(
            profile::CONFIDENCE_SCORE,
            "valueDecimal",
            json!(1.2),
        ));
        meta.extension.push(Extension::with_value(
            profile::TRAINING_DATA,
            "valueString",
            json!("MIMIC-IV"),
        ));

        let violations = check(&resource);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].kind, ViolationKind::Type);
        assert!(violations[0].path.ends_with("extension:modelName"));
        assert_eq!(violations[1].kind, ViolationKind::Range);
        assert!(violations[1].path.ends_with("extension:confidenceScore"));
    }

    #[test]
    fn test_optional_sub_extension_at_most_once() {
        let mut resource = conformant();
        let meta = metadata_mut(&mut resource);
        for _ in 0..2 {
            meta.extension.push(Extension::with_value(
                profile::TRAINING_DATA,
                "valueString",
                json!("MIMIC-IV"),
            ));
        }
        let violations = check(&resource);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::Cardinality);
    }

    fn paths(err: &ValidationError) -> Vec<(&str, ViolationKind)> {
        err.violations.iter().map(|v| (v.path.as_str(), v.kind)).collect()
    }

    #[test]
    fn test_validate_json() {
        let value = serde_json::to_value(conformant()).unwrap();
        assert!(validate_json(&value).is_ok());

        let err = validate_json(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.violations[0].kind, ViolationKind::Structure);
    }

    #[test]
    fn test_mistyped_elements_do_not_hide_other_violations() {
        let err = validate_json(&json!({
            "resourceType": "RiskAssessment",
            "subject": "Patient/1",
            "prediction": "soon"
        }))
        .unwrap_err();

        assert_eq!(
            paths(&err),
            vec![
                ("RiskAssessment.subject", ViolationKind::Type),
                ("RiskAssessment.prediction", ViolationKind::Type),
                ("RiskAssessment.status", ViolationKind::MissingRequired),
                ("RiskAssessment.method", ViolationKind::MissingRequired),
                ("RiskAssessment.extension:forecastHorizon", ViolationKind::MissingRequired),
                ("RiskAssessment.extension:modelMetadata", ViolationKind::MissingRequired),
            ]
        );
    }

    #[test]
    fn test_extension_without_url() {
        let err = validate_json(&json!({
            "resourceType": "RiskAssessment",
            "extension": [{"valueString": "x"}]
        }))
        .unwrap_err();

        let found = paths(&err);
        assert_eq!(found.len(), 7);
        assert_eq!(
            found[0],
            ("RiskAssessment.extension[0].url", ViolationKind::MissingRequired)
        );
        for path in [
            "RiskAssessment.status",
            "RiskAssessment.subject",
            "RiskAssessment.method",
            "RiskAssessment.prediction",
            "RiskAssessment.extension:forecastHorizon",
            "RiskAssessment.extension:modelMetadata",
        ] {
            assert!(found.contains(&(path, ViolationKind::MissingRequired)), "{path}");
        }
    }

    #[test]
    fn test_mistyped_nested_elements() {
        let mut value = serde_json::to_value(conformant()).unwrap();
        value["prediction"][0]["probabilityDecimal"] = json!("0.5");
        value["extension"][1]["extension"][0]
            .as_object_mut()
            .unwrap()
            .remove("url");

        let err = validate_json(&value).unwrap_err();
        assert_eq!(
            paths(&err),
            vec![
                (
                    "RiskAssessment.extension[1].extension[0].url",
                    ViolationKind::MissingRequired
                ),
                (
                    "RiskAssessment.prediction[0].probabilityDecimal",
                    ViolationKind::Type
                ),
                (
                    "RiskAssessment.extension:modelMetadata.extension:modelName",
                    ViolationKind::MissingRequired
                ),
            ]
        );
    }

    #[test]
    fn test_mistyped_array_items_keep_their_index() {
        let mut value = serde_json::to_value(conformant()).unwrap();
        value["basis"] = json!(["Condition/x", {"display": "no reference"}]);

        let err = validate_json(&value).unwrap_err();
        assert_eq!(
            paths(&err),
            vec![
                ("RiskAssessment.basis[0]", ViolationKind::Type),
                ("RiskAssessment.basis[1].reference", ViolationKind::MissingRequired),
            ]
        );
    }

    #[test]
    fn test_wrong_resource_type() {
        let mut value = serde_json::to_value(conformant()).unwrap();
        value["resourceType"] = json!("Observation");
        let err = validate_json(&value).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.violations[0].path, "RiskAssessment.resourceType");
    }
}
