//! Transaction bundles
//!
//! [`forecast_bundle`] packs a forecast together with the evidence it cites:
//! the Patient, one Condition per UDM condition and one Observation per UDM
//! observation. Entry ids are the ids used in `RiskAssessment.subject` and
//! `RiskAssessment.basis`, and every entry is a `PUT` to `Type/id`, so each
//! literal reference of the forecast resolves inside the bundle.

use super::model::{CodeableConcept, Coding, Quantity, Reference, RiskAssessment};
use super::{profile, ForecastResource};
use crate::domain::udm::{self, AdministrativeGender, UdmRecord};
use crate::domain::{AegisError, BuildError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;

const BUNDLE_TYPE: &str = "transaction";

/// A FHIR transaction `Bundle`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub resource_type: String,
    #[serde(rename = "type")]
    pub bundle_type: String,
    pub entry: Vec<BundleEntry>,
}

impl Bundle {
    /// `Type/id` of every entry, in bundle order
    pub fn entry_references(&self) -> Vec<&str> {
        self.entry.iter().map(|e| e.request.url.as_str()).collect()
    }

    /// Whether a literal reference points at an entry of this bundle
    pub fn resolves(&self, reference: &str) -> bool {
        self.entry.iter().any(|e| e.request.url == reference)
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| AegisError::Serialization(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    pub full_url: String,
    pub resource: BundleResource,
    pub request: BundleRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BundleRequest {
    pub method: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BundleResource {
    Patient(Patient),
    Condition(Condition),
    Observation(Observation),
    RiskAssessment(Box<RiskAssessment>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub resource_type: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<AdministrativeGender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub resource_type: String,
    pub id: String,
    pub subject: Reference,
    pub code: CodeableConcept,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onset_date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abatement_date_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub resource_type: String,
    pub id: String,
    pub status: String,
    pub code: CodeableConcept,
    pub subject: Reference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date_time: Option<String>,
    pub value_quantity: Quantity,
}

/// Bundles a forecast with the Patient, Conditions and Observations of the
/// record it was built from
///
/// # Errors
///
/// Returns `BuildError::RecordMismatch` when `record` is not the record the
/// forecast was built from
pub fn forecast_bundle(record: &UdmRecord, forecast: &ForecastResource) -> Result<Bundle> {
    let found = record.fingerprint()?;
    if found != forecast.record_fingerprint() {
        return Err(BuildError::RecordMismatch {
            resource: forecast.id().to_string(),
            expected: forecast.record_fingerprint().to_string(),
            found,
        }
        .into());
    }

    let stem = record.subject().fhir_id();
    let subject = Reference::to(record.subject().reference());
    let demographics = record.demographics();

    let mut entries = Vec::with_capacity(2 + record.conditions().len() + record.observations().len());
    entries.push(entry(
        "Patient",
        &stem,
        BundleResource::Patient(Patient {
            resource_type: "Patient".to_string(),
            id: stem.clone(),
            gender: demographics.gender,
            birth_date: demographics.birth_date.map(|d| d.format("%Y-%m-%d").to_string()),
        }),
    ));

    for condition in record.conditions() {
        let id = format!("{stem}-{}", condition.id);
        entries.push(entry(
            "Condition",
            &id,
            BundleResource::Condition(Condition {
                resource_type: "Condition".to_string(),
                id: id.clone(),
                subject: subject.clone(),
                code: concept(&condition.coding),
                onset_date_time: condition.onset.map(instant),
                abatement_date_time: condition.abatement.map(instant),
            }),
        ));
    }

    for observation in record.observations() {
        let id = format!("{stem}-{}", observation.id);
        entries.push(entry(
            "Observation",
            &id,
            BundleResource::Observation(Observation {
                resource_type: "Observation".to_string(),
                id: id.clone(),
                status: "final".to_string(),
                code: concept(&observation.coding),
                subject: subject.clone(),
                effective_date_time: observation.effective.map(instant),
                value_quantity: Quantity {
                    value: Some(observation.value),
                    unit: Some(observation.unit.clone()),
                    system: Some(profile::UCUM_SYSTEM.to_string()),
                    code: Some(observation.unit.clone()),
                },
            }),
        ));
    }

    let forecast_id = forecast.id().to_string();
    entries.push(BundleEntry {
        full_url: format!("urn:uuid:{forecast_id}"),
        resource: BundleResource::RiskAssessment(Box::new(forecast.to_fhir())),
        request: BundleRequest {
            method: "PUT".to_string(),
            url: format!("{}/{forecast_id}", profile::RESOURCE_TYPE),
        },
    });

    tracing::debug!(
        subject = %record.subject(),
        resource_id = %forecast_id,
        entries = entries.len(),
        "Forecast bundle assembled"
    );

    Ok(Bundle {
        resource_type: "Bundle".to_string(),
        bundle_type: BUNDLE_TYPE.to_string(),
        entry: entries,
    })
}

/// `PUT Type/id` entry with a stable `urn:uuid` full URL
fn entry(resource_type: &str, id: &str, resource: BundleResource) -> BundleEntry {
    let url = format!("{resource_type}/{id}");
    let full_url = Uuid::new_v5(
        &Uuid::NAMESPACE_URL,
        format!("{}/{url}", profile::PROFILE_URL).as_bytes(),
    );
    BundleEntry {
        full_url: format!("urn:uuid:{full_url}"),
        resource,
        request: BundleRequest {
            method: "PUT".to_string(),
            url,
        },
    }
}

fn concept(coding: &udm::Coding) -> CodeableConcept {
    CodeableConcept {
        coding: vec![Coding {
            system: Some(coding.system.uri().to_string()),
            code: Some(coding.code.clone()),
            display: coding.display.clone(),
        }],
        text: None,
    }
}

fn instant(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fhir::ForecastBuilder;
    use crate::core::normalize::Normalizer;
    use crate::domain::{
        keys, Attributes, AttributeBag, ForecastHorizon, ForecastInput, ModelMetadata, RawValue,
        Section, VendorId,
    };

    fn record(subject: &str) -> UdmRecord {
        let mut bag = AttributeBag::new(VendorId::new("epic").unwrap());
        bag.set_demographic(keys::SUBJECT_ID, subject);
        bag.set_demographic(keys::GENDER, "F");
        bag.set_demographic(keys::BIRTH_DATE, "1980-01-15");
        bag.set_demographic(keys::REFERENCE_TIME, "2024-03-01T00:00:00Z");

        let mut dx = Attributes::new();
        dx.insert(keys::CODE.to_string(), RawValue::from("J45"));
        dx.insert(keys::ONSET.to_string(), RawValue::from("2019-06-01"));
        bag.push_entry(Section::Condition, dx);

        let mut bp = Attributes::new();
        bp.insert(keys::CODE.to_string(), RawValue::from("8480-6"));
        bp.insert(keys::SYSTEM.to_string(), RawValue::from("LN"));
        bp.insert(keys::VALUE.to_string(), RawValue::from(142.0));
        bp.insert(keys::UNIT.to_string(), RawValue::from("mm[Hg]"));
        bag.push_entry(Section::Observation, bp);

        Normalizer::default().normalize(&bag).unwrap()
    }

    fn forecast(record: &UdmRecord) -> ForecastResource {
        let input = ForecastInput::new(
            "bert-clinical",
            0.72,
            ForecastHorizon::days(30),
            ModelMetadata::new("AegisBERT", "1.2.0"),
        );
        ForecastBuilder::default().build(record, &input).unwrap()
    }

    #[test]
    fn test_every_forecast_reference_resolves() {
        let record = record("patient-123");
        let forecast = forecast(&record);
        let bundle = forecast_bundle(&record, &forecast).unwrap();

        assert_eq!(forecast.basis().len(), 2);
        for reference in forecast.basis() {
            assert!(bundle.resolves(reference), "{reference} not in bundle");
        }
        assert!(bundle.resolves(&forecast.subject().reference()));
        assert_eq!(
            bundle.entry_references(),
            vec![
                "Patient/patient-123".to_string(),
                "Condition/patient-123-cond-1".to_string(),
                "Observation/patient-123-obs-1".to_string(),
                format!("RiskAssessment/{}", forecast.id()),
            ]
        );
    }

    #[test]
    fn test_references_resolve_for_unsafe_subjects() {
        let record = record("MRN: 0042 77");
        let forecast = forecast(&record);
        let bundle = forecast_bundle(&record, &forecast).unwrap();

        let fhir = forecast.to_fhir();
        let subject = fhir.subject.and_then(|s| s.reference).unwrap();
        assert!(bundle.resolves(&subject));
        for basis in fhir.basis {
            assert!(bundle.resolves(&basis.reference.unwrap()));
        }
    }

    #[test]
    fn test_bundle_wire_shape() {
        let record = record("patient-123");
        let forecast = forecast(&record);
        let value = serde_json::to_value(forecast_bundle(&record, &forecast).unwrap()).unwrap();

        assert_eq!(value["resourceType"], "Bundle");
        assert_eq!(value["type"], "transaction");
        let entries = value["entry"].as_array().unwrap();
        assert_eq!(entries.len(), 4);
        assert!(entries
            .iter()
            .all(|e| e["fullUrl"].as_str().unwrap().starts_with("urn:uuid:")));

        let patient = &entries[0]["resource"];
        assert_eq!(patient["gender"], "female");
        assert_eq!(patient["birthDate"], "1980-01-15");

        let condition = &entries[1]["resource"];
        assert_eq!(condition["subject"]["reference"], "Patient/patient-123");
        assert_eq!(condition["code"]["coding"][0]["code"], "J45");
        assert_eq!(condition["onsetDateTime"], "2019-06-01T00:00:00Z");

        let observation = &entries[2]["resource"];
        assert_eq!(observation["status"], "final");
        assert_eq!(observation["valueQuantity"]["value"], 142.0);
        assert_eq!(observation["valueQuantity"]["system"], profile::UCUM_SYSTEM);

        assert_eq!(entries[3]["resource"]["resourceType"], "RiskAssessment");
        assert_eq!(entries[3]["request"]["method"], "PUT");
    }

    #[test]
    fn test_bundle_is_deterministic() {
        let record = record("patient-123");
        let forecast = forecast(&record);
        assert_eq!(
            forecast_bundle(&record, &forecast).unwrap(),
            forecast_bundle(&record, &forecast).unwrap()
        );
    }

    #[test]
    fn test_record_mismatch_rejected() {
        let built_from = record("patient-123");
        let forecast = forecast(&built_from);
        let err = forecast_bundle(&record("patient-456"), &forecast).unwrap_err();
        assert!(matches!(err, AegisError::Build(BuildError::RecordMismatch { .. })));
        assert_eq!(err.stage(), "build");
    }
}
