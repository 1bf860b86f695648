//! Terminology mapping
//!
//! Resolves vendor codes onto declared terminology systems. Resolution order:
//!
//! 1. Vendor-local code mappings (vendor-specific first, then global)
//! 2. Known concepts in the declared (or section default) system, with an
//!    ICD-10 category fallback (`J45.909` resolves through `J45`)
//! 3. The configured fallback policy
//!
//! Conditions can optionally be re-coded from ICD-10 to SNOMED CT through the
//! cross-map.

use crate::config::{FallbackPolicy, TerminologyConfig};
use crate::domain::{
    AegisError, Coding, NormalizationError, Result, Section, TerminologySystem, VendorId,
};
use std::collections::BTreeMap;

use crate::domain::TerminologySystem::{Cpt, Environmental, Icd10, Loinc, RxNorm, Snomed};

const BUILTIN_CONCEPTS: &[(TerminologySystem, &str, &str)] = &[
    (Icd10, "J45", "Asthma"),
    (Icd10, "I10", "Essential (primary) hypertension"),
    (Icd10, "E11", "Type 2 diabetes mellitus"),
    (Icd10, "J44", "Chronic obstructive pulmonary disease"),
    (Icd10, "I50", "Heart failure"),
    (Icd10, "E66", "Overweight and obesity"),
    (Icd10, "N18", "Chronic kidney disease"),
    (Snomed, "195967001", "Asthma"),
    (Snomed, "38341003", "Hypertensive disorder"),
    (Snomed, "44054006", "Diabetes mellitus type 2"),
    (Snomed, "13645005", "Chronic obstructive lung disease"),
    (Snomed, "84114007", "Heart failure"),
    (Snomed, "414916001", "Obesity"),
    (Snomed, "709044004", "Chronic kidney disease"),
    (Loinc, "8310-5", "Body temperature"),
    (Loinc, "29463-7", "Body weight"),
    (Loinc, "8302-2", "Body height"),
    (Loinc, "2345-7", "Glucose [Mass/volume] in Serum or Plasma"),
    (Loinc, "8480-6", "Systolic blood pressure"),
    (Loinc, "8462-4", "Diastolic blood pressure"),
    (Loinc, "8867-4", "Heart rate"),
    (Loinc, "9279-1", "Respiratory rate"),
    (Loinc, "59408-5", "Oxygen saturation in Arterial blood by Pulse oximetry"),
    (Loinc, "2708-6", "Oxygen saturation in Arterial blood"),
    (Loinc, "39156-5", "Body mass index (BMI) [Ratio]"),
    (Loinc, "4548-4", "Hemoglobin A1c/Hemoglobin.total in Blood"),
    (Loinc, "19926-5", "FEV1/FVC"),
    (Loinc, "85354-9", "Blood pressure panel"),
    (RxNorm, "435", "Albuterol"),
    (RxNorm, "29046", "Lisinopril"),
    (RxNorm, "17767", "Amlodipine"),
    (RxNorm, "6809", "Metformin"),
    (RxNorm, "88249", "Montelukast"),
    (RxNorm, "41126", "Fluticasone"),
    (Cpt, "94010", "Spirometry"),
    (Cpt, "99213", "Office or other outpatient visit"),
    (Environmental, "pm25", "Fine particulate matter (PM2.5)"),
    (Environmental, "pm10", "Particulate matter (PM10)"),
    (Environmental, "ozone", "Ground-level ozone"),
    (Environmental, "aqi", "Air quality index"),
    (Environmental, "pollen", "Pollen count"),
    (Environmental, "temperature", "Ambient temperature"),
    (Environmental, "humidity", "Relative humidity"),
];

/// ICD-10-CM category to SNOMED CT concept
const ICD10_TO_SNOMED: &[(&str, &str)] = &[
    ("J45", "195967001"),
    ("I10", "38341003"),
    ("E11", "44054006"),
    ("J44", "13645005"),
    ("I50", "84114007"),
    ("E66", "414916001"),
    ("N18", "709044004"),
];

/// System assumed when an entry carries no system label
pub fn default_system(section: Section) -> TerminologySystem {
    match section {
        Section::Observation => Loinc,
        Section::Condition => Icd10,
        Section::Medication => RxNorm,
        Section::Environmental => Environmental,
    }
}

/// Vendor-local code target
#[derive(Debug, Clone, PartialEq)]
struct LocalTarget {
    system: TerminologySystem,
    code: String,
    display: Option<String>,
}

const ANY_VENDOR: &str = "*";

/// Immutable code mapping tables
#[derive(Debug, Clone, PartialEq)]
pub struct TerminologyMap {
    concepts: BTreeMap<(TerminologySystem, String), String>,
    local_codes: BTreeMap<(String, String), LocalTarget>,
    cross_map: BTreeMap<String, String>,
    fallback: FallbackPolicy,
    cross_map_conditions: bool,
}

impl TerminologyMap {
    /// Built-in catalogue, reject fallback, no cross-mapping
    pub fn builtin() -> Self {
        let concepts = BUILTIN_CONCEPTS
            .iter()
            .map(|(system, code, display)| ((*system, (*code).to_string()), (*display).to_string()))
            .collect();
        let cross_map = ICD10_TO_SNOMED
            .iter()
            .map(|(icd, sct)| ((*icd).to_string(), (*sct).to_string()))
            .collect();

        Self {
            concepts,
            local_codes: BTreeMap::new(),
            cross_map,
            fallback: FallbackPolicy::Reject,
            cross_map_conditions: false,
        }
    }

    /// Built-in catalogue extended with configured concepts and local codes
    ///
    /// # Errors
    ///
    /// Returns `AegisError::Configuration` for an unknown system key or vendor
    pub fn from_config(config: &TerminologyConfig) -> Result<Self> {
        let mut map = Self::builtin()
            .with_fallback(config.fallback)
            .with_condition_cross_map(config.cross_map_conditions_to_snomed);

        for concept in &config.concepts {
            let system = parse_system(&concept.system)?;
            map.add_concept(system, concept.code.trim(), concept.display.trim());
        }

        for local in &config.local_codes {
            let system = parse_system(&local.system)?;
            let vendor = match &local.vendor {
                Some(v) => Some(VendorId::new(v.as_str()).map_err(AegisError::Configuration)?),
                None => None,
            };
            map.add_local_code(
                vendor.as_ref(),
                local.code.trim(),
                system,
                local.target.trim(),
                local.display.clone(),
            );
        }

        Ok(map)
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_condition_cross_map(mut self, enabled: bool) -> Self {
        self.cross_map_conditions = enabled;
        self
    }

    pub fn add_concept(&mut self, system: TerminologySystem, code: &str, display: &str) {
        self.concepts
            .insert((system, code.to_string()), display.to_string());
    }

    /// Registers a vendor-local code; `None` applies it to every vendor
    pub fn add_local_code(
        &mut self,
        vendor: Option<&VendorId>,
        code: &str,
        system: TerminologySystem,
        target: &str,
        display: Option<String>,
    ) {
        let vendor = vendor.map_or(ANY_VENDOR, VendorId::as_str).to_string();
        self.local_codes.insert(
            (vendor, code.to_string()),
            LocalTarget {
                system,
                code: target.to_string(),
                display,
            },
        );
    }

    /// Display text of a known concept
    pub fn display(&self, system: TerminologySystem, code: &str) -> Option<&str> {
        self.concepts
            .get(&(system, code.to_string()))
            .map(String::as_str)
    }

    pub fn is_known(&self, system: TerminologySystem, code: &str) -> bool {
        self.lookup(system, code).is_some()
    }

    /// Known concept, or its ICD-10 category
    fn lookup(&self, system: TerminologySystem, code: &str) -> Option<&str> {
        if let Some(display) = self.display(system, code) {
            return Some(display);
        }
        if system == Icd10 {
            let category = code.split('.').next().unwrap_or(code);
            if category != code {
                return self.display(system, category);
            }
        }
        None
    }

    /// Resolves one vendor code
    ///
    /// `system_label` is the vendor's system label, if the entry carried one.
    ///
    /// # Errors
    ///
    /// Returns `NormalizationError::UnmappableCode` when the code resolves to
    /// no known concept and the fallback policy does not accept it
    ///
    /// # Examples
    ///
    /// ```
    /// use aegis::core::normalize::TerminologyMap;
    /// use aegis::domain::{Section, TerminologySystem, VendorId};
    ///
    /// let map = TerminologyMap::builtin();
    /// let vendor = VendorId::new("epic").unwrap();
    /// let coding = map
    ///     .resolve(&vendor, Section::Condition, "conditions[0]", Some("ICD-10-CM"), "J45.909", None)
    ///     .unwrap();
    /// assert_eq!(coding.system, TerminologySystem::Icd10);
    /// assert_eq!(coding.display.as_deref(), Some("Asthma"));
    /// ```
    pub fn resolve(
        &self,
        vendor: &VendorId,
        section: Section,
        field: &str,
        system_label: Option<&str>,
        code: &str,
        display: Option<&str>,
    ) -> std::result::Result<Coding, NormalizationError> {
        let code = code.trim();
        let unmappable = |system: &str| NormalizationError::UnmappableCode {
            vendor: vendor.to_string(),
            field: field.to_string(),
            system: system.to_string(),
            code: code.to_string(),
        };

        if let Some(target) = self.local_target(vendor, code) {
            let display = target
                .display
                .clone()
                .or_else(|| self.lookup(target.system, &target.code).map(str::to_string));
            return Ok(self.cross_mapped(
                section,
                Coding::new(target.system, target.code.clone(), display),
            ));
        }

        let declared = match system_label {
            Some(label) => {
                Some(TerminologySystem::from_label(label).ok_or_else(|| unmappable(label))?)
            }
            None => None,
        };
        let system = declared.unwrap_or_else(|| default_system(section));

        if let Some(known) = self.lookup(system, code) {
            let display = Some(known.to_string());
            return Ok(self.cross_mapped(section, Coding::new(system, code, display)));
        }

        match (self.fallback, declared) {
            (FallbackPolicy::AcceptDeclaredSystem, Some(system)) => {
                tracing::debug!(vendor = %vendor, field, code, system = %system, "Accepting unknown code in declared system");
                let display = display.map(str::trim).filter(|d| !d.is_empty());
                Ok(Coding::new(system, code, display.map(str::to_string)))
            }
            _ => Err(unmappable(system.key())),
        }
    }

    fn local_target(&self, vendor: &VendorId, code: &str) -> Option<&LocalTarget> {
        self.local_codes
            .get(&(vendor.as_str().to_string(), code.to_string()))
            .or_else(|| {
                self.local_codes
                    .get(&(ANY_VENDOR.to_string(), code.to_string()))
            })
    }

    fn cross_mapped(&self, section: Section, coding: Coding) -> Coding {
        if !self.cross_map_conditions || section != Section::Condition || coding.system != Icd10 {
            return coding;
        }
        let category = coding.code.split('.').next().unwrap_or(&coding.code);
        match self.cross_map.get(category) {
            Some(sct) => {
                let display = self.display(Snomed, sct).map(str::to_string);
                Coding::new(Snomed, sct.clone(), display)
            }
            None => coding,
        }
    }
}

impl Default for TerminologyMap {
    fn default() -> Self {
        Self::builtin()
    }
}

fn parse_system(key: &str) -> Result<TerminologySystem> {
    key.parse::<TerminologySystem>()
        .map_err(AegisError::Configuration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConceptConfig, LocalCodeConfig};

    fn epic() -> VendorId {
        VendorId::new("epic").unwrap()
    }

    #[test]
    fn test_known_code_with_section_default_system() {
        let map = TerminologyMap::builtin();
        let coding = map
            .resolve(&epic(), Section::Condition, "conditions[0]", None, "J45", None)
            .unwrap();
        assert_eq!(coding, Coding::new(Icd10, "J45", Some("Asthma".to_string())));

        let coding = map
            .resolve(&epic(), Section::Medication, "medications[0]", None, "435", None)
            .unwrap();
        assert_eq!(coding.system, RxNorm);
    }

    #[test]
    fn test_icd10_subcode_resolves_through_category() {
        let map = TerminologyMap::builtin();
        let coding = map
            .resolve(&epic(), Section::Condition, "c", Some("I10"), "J45.909", Some("Asthma, unspecified"))
            .unwrap();
        assert_eq!(coding.code, "J45.909");
        assert_eq!(coding.display.as_deref(), Some("Asthma"));
    }

    #[test]
    fn test_unknown_code_is_rejected_with_context() {
        let map = TerminologyMap::builtin();
        let err = map
            .resolve(&epic(), Section::Observation, "observations[1].code", Some("LN"), "99999-9", None)
            .unwrap_err();
        assert_eq!(
            err,
            NormalizationError::UnmappableCode {
                vendor: "epic".to_string(),
                field: "observations[1].code".to_string(),
                system: "loinc".to_string(),
                code: "99999-9".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_system_label_is_rejected() {
        let map = TerminologyMap::builtin().with_fallback(FallbackPolicy::AcceptDeclaredSystem);
        let err = map
            .resolve(&epic(), Section::Condition, "c", Some("LOCAL-DX"), "A1", None)
            .unwrap_err();
        assert!(matches!(err, NormalizationError::UnmappableCode { ref system, .. } if system == "LOCAL-DX"));
    }

    #[test]
    fn test_accept_declared_system_fallback() {
        let map = TerminologyMap::builtin().with_fallback(FallbackPolicy::AcceptDeclaredSystem);
        let coding = map
            .resolve(&epic(), Section::Condition, "c", Some("SNOMED"), "22298006", Some("Myocardial infarction"))
            .unwrap();
        assert_eq!(coding.system, Snomed);
        assert_eq!(coding.display.as_deref(), Some("Myocardial infarction"));

        // Without a declared system the fallback does not apply
        assert!(map
            .resolve(&epic(), Section::Condition, "c", None, "Z99", None)
            .is_err());
    }

    #[test]
    fn test_local_codes_prefer_vendor_specific_mapping() {
        let mut map = TerminologyMap::builtin();
        let cerner = VendorId::new("cerner").unwrap();
        map.add_local_code(None, "GLU", Loinc, "2345-7", None);
        map.add_local_code(Some(&cerner), "GLU", Loinc, "2339-0", Some("Glucose [Mass/volume] in Blood".to_string()));

        let epic_coding = map.resolve(&epic(), Section::Observation, "o", None, "GLU", None).unwrap();
        assert_eq!(epic_coding.code, "2345-7");
        assert_eq!(epic_coding.display.as_deref(), Some("Glucose [Mass/volume] in Serum or Plasma"));

        let cerner_coding = map.resolve(&cerner, Section::Observation, "o", None, "GLU", None).unwrap();
        assert_eq!(cerner_coding.code, "2339-0");
    }

    #[test]
    fn test_condition_cross_map_to_snomed() {
        let map = TerminologyMap::builtin().with_condition_cross_map(true);
        let coding = map
            .resolve(&epic(), Section::Condition, "c", Some("ICD10"), "I10", None)
            .unwrap();
        assert_eq!(coding, Coding::new(Snomed, "38341003", Some("Hypertensive disorder".to_string())));

        // Observations are never cross-mapped
        let obs = map.resolve(&epic(), Section::Observation, "o", None, "8867-4", None).unwrap();
        assert_eq!(obs.system, Loinc);
    }

    #[test]
    fn test_from_config() {
        let config = TerminologyConfig {
            fallback: FallbackPolicy::Reject,
            cross_map_conditions_to_snomed: false,
            local_codes: vec![LocalCodeConfig {
                vendor: Some("Epic".to_string()),
                code: "ASTHMA-DX".to_string(),
                system: "icd10".to_string(),
                target: "J45".to_string(),
                display: None,
            }],
            concepts: vec![ConceptConfig {
                system: "loinc".to_string(),
                code: "2160-0".to_string(),
                display: "Creatinine".to_string(),
            }],
        };
        let map = TerminologyMap::from_config(&config).unwrap();
        assert!(map.is_known(Loinc, "2160-0"));
        let coding = map
            .resolve(&epic(), Section::Condition, "c", None, "ASTHMA-DX", None)
            .unwrap();
        assert_eq!(coding, Coding::new(Icd10, "J45", Some("Asthma".to_string())));
    }

    #[test]
    fn test_from_config_rejects_unknown_system() {
        let config = TerminologyConfig {
            concepts: vec![ConceptConfig {
                system: "mesh".to_string(),
                code: "D001249".to_string(),
                display: "Asthma".to_string(),
            }],
            ..Default::default()
        };
        assert!(matches!(
            TerminologyMap::from_config(&config),
            Err(AegisError::Configuration(_))
        ));
    }
}
