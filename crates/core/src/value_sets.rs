//! Value sets injected into every record.
//!
//! Code tables map a known code to its `(system, display)` pair. They are resolved once (the
//! built-in [`ValueSets::standard`] set, or a YAML override) and then shared read-only between
//! records behind an `Arc`. Nothing here is process-global.

use crate::constants::{NULL_FLAVOR_SYSTEM, OTHER_CODE, OTHER_DISPLAY, UNKNOWN_CODE, UNKNOWN_DISPLAY};
use crate::{RecordError, RecordResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MARITAL_STATUS_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v3-MaritalStatus";
const SNOMED_SYSTEM: &str = "http://snomed.info/sct";
const ADMINISTRATIVE_GENDER_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/v3-AdministrativeGender";
const EDUCATION_LEVEL_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v3-EducationLevel";
const EDIT_BYPASS_SYSTEM: &str = "http://hl7.org/fhir/us/vrdr/CodeSystem/vrdr-bypass-edit-flag-cs";

/// The system and display a known code encodes to.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CodeEntry {
    pub system: String,
    pub display: String,
}

/// An immutable `code -> (system, display)` lookup table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct CodeTable(BTreeMap<String, CodeEntry>);

impl CodeTable {
    /// Build a table whose codes all come from one `system`.
    pub fn from_system(system: &str, entries: &[(&str, &str)]) -> Self {
        Self::default().with_codes(system, entries)
    }

    /// Returns this table extended with `entries` from `system`.
    pub fn with_codes(mut self, system: &str, entries: &[(&str, &str)]) -> Self {
        for (code, display) in entries {
            self.0.insert(
                (*code).to_string(),
                CodeEntry {
                    system: system.to_string(),
                    display: (*display).to_string(),
                },
            );
        }
        self
    }

    pub fn get(&self, code: &str) -> Option<&CodeEntry> {
        self.0.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.0.contains_key(code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, CodeEntry)> for CodeTable {
    fn from_iter<I: IntoIterator<Item = (String, CodeEntry)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The code tables a death record encodes against.
///
/// Missing tables in a YAML override fall back to the standard ones.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValueSets {
    marital_status: CodeTable,
    manner_of_death: CodeTable,
    sex_at_death: CodeTable,
    education_level: CodeTable,
    edit_bypass: CodeTable,
}

impl Default for ValueSets {
    fn default() -> Self {
        Self::standard()
    }
}

impl ValueSets {
    /// The built-in tables.
    pub fn standard() -> Self {
        let unknown = [(UNKNOWN_CODE, UNKNOWN_DISPLAY)];

        Self {
            marital_status: CodeTable::from_system(
                MARITAL_STATUS_SYSTEM,
                &[
                    ("A", "Annulled"),
                    ("D", "Divorced"),
                    ("I", "Interlocutory"),
                    ("L", "Legally Separated"),
                    ("M", "Married"),
                    ("P", "Polygamous"),
                    ("S", "Never Married"),
                    ("T", "Domestic partner"),
                    ("W", "Widowed"),
                ],
            )
            .with_codes(NULL_FLAVOR_SYSTEM, &unknown),
            manner_of_death: CodeTable::from_system(
                SNOMED_SYSTEM,
                &[
                    ("38605008", "Natural death"),
                    ("7878000", "Accidental death"),
                    ("44301001", "Suicide"),
                    ("27935005", "Homicide"),
                    ("185973002", "Patient awaiting investigation"),
                    ("65037004", "Death, manner undetermined"),
                ],
            ),
            sex_at_death: CodeTable::from_system(
                ADMINISTRATIVE_GENDER_SYSTEM,
                &[("M", "Male"), ("F", "Female")],
            )
            .with_codes(NULL_FLAVOR_SYSTEM, &unknown),
            education_level: CodeTable::from_system(
                EDUCATION_LEVEL_SYSTEM,
                &[
                    ("ELEM", "Elementary School"),
                    ("SEC", "Some secondary or high school education"),
                    ("HS", "High School or secondary school degree complete"),
                    ("SCOL", "Some College education"),
                    ("ASSOC", "Associate's or technical degree complete"),
                    ("BD", "College or baccalaureate degree complete"),
                    ("GD", "Graduate or professional Degree complete"),
                    ("POSTG", "Doctoral or post graduate education"),
                ],
            )
            .with_codes(NULL_FLAVOR_SYSTEM, &unknown)
            .with_codes(NULL_FLAVOR_SYSTEM, &[(OTHER_CODE, OTHER_DISPLAY)]),
            edit_bypass: CodeTable::from_system(
                EDIT_BYPASS_SYSTEM,
                &[
                    ("0", "Edit Passed"),
                    ("1", "Edit Failed, Data Queried, and Verified"),
                    ("2", "Edit Failed, Data Queried, but not Verified"),
                ],
            ),
        }
    }

    /// Parse value sets from YAML text.
    ///
    /// Tables present in the YAML replace the standard ones; absent tables keep their standard
    /// contents.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidValueSet`] if the YAML does not match the value set
    /// schema. The message names the failing path.
    pub fn from_yaml(yaml_text: &str) -> RecordResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

        serde_path_to_error::deserialize::<_, ValueSets>(deserializer).map_err(|err| {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() {
                "<root>"
            } else {
                path.as_str()
            };
            RecordError::InvalidValueSet(format!("value set schema mismatch at {path}: {source}"))
        })
    }

    pub fn marital_status(&self) -> &CodeTable {
        &self.marital_status
    }

    pub fn manner_of_death(&self) -> &CodeTable {
        &self.manner_of_death
    }

    pub fn sex_at_death(&self) -> &CodeTable {
        &self.sex_at_death
    }

    pub fn education_level(&self) -> &CodeTable {
        &self.education_level
    }

    pub fn edit_bypass(&self) -> &CodeTable {
        &self.edit_bypass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_tables_cover_known_codes() {
        let sets = ValueSets::standard();
        assert_eq!(
            sets.marital_status().get("M").map(|e| e.display.as_str()),
            Some("Married")
        );
        assert_eq!(
            sets.marital_status().get("UNK").map(|e| e.system.as_str()),
            Some(NULL_FLAVOR_SYSTEM)
        );
        assert!(sets.manner_of_death().contains("7878000"));
        assert!(!sets.sex_at_death().contains("Z9"));
        assert_eq!(sets.edit_bypass().len(), 3);
    }

    #[test]
    fn yaml_override_replaces_only_named_tables() {
        let input = r#"manner_of_death:
  N:
    system: http://example.org/manner
    display: Natural
"#;

        let sets = ValueSets::from_yaml(input).expect("parse value sets");
        assert_eq!(sets.manner_of_death().len(), 1);
        assert_eq!(
            sets.manner_of_death().get("N").map(|e| e.system.as_str()),
            Some("http://example.org/manner")
        );
        assert_eq!(sets.marital_status(), ValueSets::standard().marital_status());
    }

    #[test]
    fn yaml_override_reports_failing_path() {
        let input = r#"marital_status:
  M:
    system: http://example.org/marital
    label: Married
"#;

        let err = ValueSets::from_yaml(input).expect_err("should reject unknown key");
        match err {
            RecordError::InvalidValueSet(msg) => {
                assert!(msg.contains("marital_status"));
                assert!(msg.contains("label"));
            }
            other => panic!("expected InvalidValueSet error, got {other:?}"),
        }
    }

    #[test]
    fn tables_collect_from_entries() {
        let table: CodeTable = [(
            "X".to_string(),
            CodeEntry {
                system: "http://example.org".into(),
                display: "Ex".into(),
            },
        )]
        .into_iter()
        .collect();

        assert_eq!(table.codes().collect::<Vec<_>>(), vec!["X"]);
        assert!(!table.is_empty());
    }
}
