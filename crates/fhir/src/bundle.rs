//! Document bundle and its YAML boundary.
//!
//! A [`Bundle`] owns every resource of one death record. Resources are located by profile
//! URL, and the `*_or_insert` helpers create a resource the first time a write needs it.
//! Reads never create anything.

use crate::elements::{Identifier, Meta};
use crate::resources::{Location, Observation, Patient, ProfiledResource, Resource};
use crate::{FhirError, FhirResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DOCUMENT_BUNDLE_TYPE: &str = "document";

/// A document bundle holding one record's resources.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Bundle {
    pub id: String,

    #[serde(rename = "type")]
    pub bundle_type: String,

    #[serde(default)]
    pub meta: Meta,

    #[serde(default, skip_serializing_if = "Identifier::is_empty")]
    pub identifier: Identifier,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<Resource>,
}

impl Default for Bundle {
    fn default() -> Self {
        Self::document()
    }
}

impl Bundle {
    /// Create an empty document bundle with a freshly generated id.
    pub fn document() -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            bundle_type: DOCUMENT_BUNDLE_TYPE.to_string(),
            meta: Meta::default(),
            identifier: Identifier::default(),
            entry: Vec::new(),
        }
    }

    /// Returns the first resource of kind `T` tagged with `profile`.
    pub fn find<T: ProfiledResource>(&self, profile: &str) -> Option<&T> {
        self.entry
            .iter()
            .filter_map(T::from_resource)
            .find(|r| r.meta().has_profile(profile))
    }

    /// Returns the first resource of kind `T` tagged with `profile`, mutably.
    pub fn find_mut<T: ProfiledResource>(&mut self, profile: &str) -> Option<&mut T> {
        self.entry
            .iter_mut()
            .filter_map(T::from_resource_mut)
            .find(|r| r.meta().has_profile(profile))
    }

    /// Returns the resource of kind `T` tagged with `profile`, appending `make()` if none exists.
    ///
    /// `make` must produce a resource tagged with `profile`, otherwise the next call will
    /// create another one.
    pub fn find_or_insert_with<T, F>(&mut self, profile: &str, make: F) -> &mut T
    where
        T: ProfiledResource,
        F: FnOnce() -> T,
    {
        let existing = self
            .entry
            .iter()
            .position(|r| T::from_resource(r).is_some_and(|r| r.meta().has_profile(profile)));

        let index = match existing {
            Some(index) => index,
            None => {
                self.entry.push(make().into_resource());
                self.entry.len() - 1
            }
        };

        match T::from_resource_mut(&mut self.entry[index]) {
            Some(resource) => resource,
            None => unreachable!("bundle entry {index} was matched as the requested kind"),
        }
    }

    pub fn patient(&self, profile: &str) -> Option<&Patient> {
        self.find(profile)
    }

    pub fn patient_mut_or_insert(&mut self, profile: &str) -> &mut Patient {
        self.find_or_insert_with(profile, || Patient::new(profile))
    }

    pub fn observation(&self, profile: &str) -> Option<&Observation> {
        self.find(profile)
    }

    pub fn observation_mut_or_insert(
        &mut self,
        profile: &str,
        code: impl FnOnce() -> crate::CodeableConcept,
    ) -> &mut Observation {
        self.find_or_insert_with(profile, || Observation::new(profile, code()))
    }

    pub fn location(&self, profile: &str) -> Option<&Location> {
        self.find(profile)
    }

    pub fn location_mut_or_insert(&mut self, profile: &str) -> &mut Location {
        self.find_or_insert_with(profile, || Location::new(profile))
    }

    /// Parse a bundle from YAML text.
    ///
    /// This uses `serde_path_to_error` to surface a best-effort "path" (e.g.
    /// `entry[0].Observation.code`) to the failing field when the YAML does not match the
    /// document schema.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - the YAML does not represent a bundle,
    /// - any field has an unexpected type,
    /// - any unknown keys are present (due to `#[serde(deny_unknown_fields)]`),
    /// - the bundle type is not `document`.
    pub fn parse_yaml(yaml_text: &str) -> FhirResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

        let bundle = match serde_path_to_error::deserialize::<_, Bundle>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(FhirError::Translation(format!(
                    "Bundle schema mismatch at {path}: {source}"
                )));
            }
        };

        if bundle.bundle_type != DOCUMENT_BUNDLE_TYPE {
            return Err(FhirError::InvalidInput(format!(
                "Expected bundle type '{DOCUMENT_BUNDLE_TYPE}', got '{}'",
                bundle.bundle_type
            )));
        }

        Ok(bundle)
    }

    /// Render this bundle as YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidYaml`] if serialisation fails.
    pub fn render_yaml(&self) -> FhirResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{CodeableConcept, Extension, HasExtensions, Primitive, Value};

    const DECEDENT: &str = "http://example.org/decedent";
    const DEATH_DATE: &str = "http://example.org/death-date";

    fn death_date_code() -> CodeableConcept {
        CodeableConcept::from_coding("http://loinc.org", "81956-5", "Date and time of death")
    }

    #[test]
    fn reads_do_not_create_resources() {
        let bundle = Bundle::document();
        assert!(bundle.patient(DECEDENT).is_none());
        assert!(bundle.observation(DEATH_DATE).is_none());
        assert!(bundle.entry.is_empty());
    }

    #[test]
    fn find_or_insert_creates_once_per_profile() {
        let mut bundle = Bundle::document();
        bundle.patient_mut_or_insert(DECEDENT).gender = Some("female".into());
        bundle.patient_mut_or_insert(DECEDENT);
        bundle.observation_mut_or_insert(DEATH_DATE, death_date_code);
        bundle.observation_mut_or_insert(DEATH_DATE, death_date_code);

        assert_eq!(bundle.entry.len(), 2);
        assert_eq!(
            bundle.patient(DECEDENT).and_then(|p| p.gender.as_deref()),
            Some("female")
        );
        assert!(bundle.patient(DEATH_DATE).is_none());
    }

    #[test]
    fn round_trips_through_yaml() {
        let mut bundle = Bundle::document();
        bundle.identifier.value = Some("2022GA000042".into());

        let obs = bundle.observation_mut_or_insert(DEATH_DATE, death_date_code);
        let mut primitive: Primitive<String> = Primitive::empty();
        primitive
            .extension_or_insert("http://example.org/partial")
            .extension
            .push(Extension::with_value(
                "date-year",
                Value::UnsignedInt(Primitive::unknown()),
            ));
        obs.value = Some(Value::DateTime(primitive));

        let yaml = bundle.render_yaml().expect("render bundle");
        let reparsed = Bundle::parse_yaml(&yaml).expect("reparse bundle");
        assert_eq!(bundle, reparsed);
    }

    #[test]
    fn parses_minimal_bundle() {
        let input = r#"id: 90a8d1ea318041d9adb070a834d4e0f6
type: document
"#;

        let bundle = Bundle::parse_yaml(input).expect("should parse minimal bundle");
        assert_eq!(bundle.id, "90a8d1ea318041d9adb070a834d4e0f6");
        assert!(bundle.entry.is_empty());
        assert!(bundle.identifier.is_empty());
    }

    #[test]
    fn strict_validation_rejects_unknown_keys() {
        let input = r#"id: 90a8d1ea318041d9adb070a834d4e0f6
type: document
unexpected_key: should_fail
"#;

        let err = Bundle::parse_yaml(input).expect_err("should reject unknown key");
        match err {
            FhirError::Translation(msg) => assert!(msg.contains("unexpected_key")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_document_bundle() {
        let input = r#"id: 90a8d1ea318041d9adb070a834d4e0f6
type: message
"#;

        let err = Bundle::parse_yaml(input).expect_err("should reject bundle type");
        match err {
            FhirError::InvalidInput(msg) => {
                assert!(msg.contains("document"));
                assert!(msg.contains("message"));
            }
            other => panic!("expected InvalidInput error, got {other:?}"),
        }
    }
}
