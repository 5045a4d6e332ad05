//! Resources carried by a death record bundle.
//!
//! Only the resource types and fields the record engine touches are modelled:
//! - [`Patient`] for the decedent (birth date, marital status, extensions)
//! - [`Observation`] for dated or coded facts (death date, age, manner of death, ...)
//! - [`Location`] for the place of death and its jurisdiction
//!
//! Resources are told apart by their `meta.profile` tag, not by position. See
//! [`crate::Bundle`] for lookup.

use crate::elements::{
    impl_has_extensions, Address, CodeableConcept, Extension, Meta, Primitive, Value,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A resource kind that can be found in, and inserted into, a bundle by profile.
pub trait ProfiledResource: Sized {
    fn from_resource(resource: &Resource) -> Option<&Self>;

    fn from_resource_mut(resource: &mut Resource) -> Option<&mut Self>;

    fn into_resource(self) -> Resource;

    fn meta(&self) -> &Meta;
}

/// Any resource a bundle entry may hold.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub enum Resource {
    Patient(Patient),
    Observation(Observation),
    Location(Location),
}

impl Resource {
    pub fn meta(&self) -> &Meta {
        match self {
            Resource::Patient(r) => &r.meta,
            Resource::Observation(r) => &r.meta,
            Resource::Location(r) => &r.meta,
        }
    }
}

macro_rules! impl_profiled_resource {
    ($($variant:ident),* $(,)?) => {
        $(
            impl ProfiledResource for $variant {
                fn from_resource(resource: &Resource) -> Option<&Self> {
                    match resource {
                        Resource::$variant(r) => Some(r),
                        _ => None,
                    }
                }

                fn from_resource_mut(resource: &mut Resource) -> Option<&mut Self> {
                    match resource {
                        Resource::$variant(r) => Some(r),
                        _ => None,
                    }
                }

                fn into_resource(self) -> Resource {
                    Resource::$variant(self)
                }

                fn meta(&self) -> &Meta {
                    &self.meta
                }
            }
        )*
    };
}

impl_profiled_resource!(Patient, Observation, Location);
impl_has_extensions!(Patient, Observation, ObservationComponent, Location);

fn new_resource_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// The decedent.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Patient {
    pub id: String,

    #[serde(default)]
    pub meta: Meta,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    /// Birth date primitive. Partial birth dates live in its extensions.
    #[serde(rename = "birthDate", default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<Primitive<String>>,

    #[serde(rename = "maritalStatus", default, skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
}

impl Patient {
    /// A new patient tagged with `profile`.
    pub fn new(profile: &str) -> Self {
        Self {
            id: new_resource_id(),
            meta: Meta::tagged(profile),
            ..Self::default()
        }
    }
}

/// A single observation.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Observation {
    pub id: String,

    #[serde(default)]
    pub meta: Meta,

    pub status: String,

    pub code: CodeableConcept,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub component: Vec<ObservationComponent>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
}

impl Observation {
    /// A new final observation tagged with `profile` and coded with `code`.
    pub fn new(profile: &str, code: CodeableConcept) -> Self {
        Self {
            id: new_resource_id(),
            meta: Meta::tagged(profile),
            status: "final".to_string(),
            code,
            ..Self::default()
        }
    }

    /// Returns the first component coded with `system`/`code`.
    pub fn component(&self, system: &str, code: &str) -> Option<&ObservationComponent> {
        self.component.iter().find(|c| c.code.has_coding(system, code))
    }

    /// Returns the component coded with `system`/`code`, appending a new one if none exists.
    pub fn component_or_insert(
        &mut self,
        system: &str,
        code: &str,
        display: &str,
    ) -> &mut ObservationComponent {
        let index = match self
            .component
            .iter()
            .position(|c| c.code.has_coding(system, code))
        {
            Some(index) => index,
            None => {
                self.component.push(ObservationComponent::new(
                    CodeableConcept::from_coding(system, code, display),
                ));
                self.component.len() - 1
            }
        };
        &mut self.component[index]
    }
}

/// A coded sub-observation.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ObservationComponent {
    pub code: CodeableConcept,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
}

impl ObservationComponent {
    pub fn new(code: CodeableConcept) -> Self {
        Self {
            code,
            value: None,
            extension: Vec::new(),
        }
    }
}

/// A place, such as the place of death.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Location {
    pub id: String,

    #[serde(default)]
    pub meta: Meta,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
}

impl Location {
    /// A new location tagged with `profile`.
    pub fn new(profile: &str) -> Self {
        Self {
            id: new_resource_id(),
            meta: Meta::tagged(profile),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::HasExtensions;

    const SYSTEM: &str = "http://example.org/components";

    #[test]
    fn resources_expose_their_extension_lists() {
        let mut patient = Patient::new("http://example.org/decedent");
        patient.extension_or_insert("http://example.org/a").value = Some(Value::code("F"));
        patient.extension_or_insert("http://example.org/a");

        assert_eq!(patient.extension.len(), 1);
        assert_eq!(
            patient
                .find_extension("http://example.org/a")
                .and_then(|e| e.value.as_ref())
                .and_then(Value::as_str),
            Some("F")
        );
    }

    #[test]
    fn component_or_insert_creates_once() {
        let mut obs = Observation::new(
            "http://example.org/profile",
            CodeableConcept::from_coding("http://loinc.org", "81956-5", "Date of death"),
        );

        obs.component_or_insert(SYSTEM, "A", "A").value = Some(Value::boolean(true));
        obs.component_or_insert(SYSTEM, "A", "A");
        obs.component_or_insert(SYSTEM, "B", "B");

        assert_eq!(obs.component.len(), 2);
        assert_eq!(
            obs.component(SYSTEM, "A")
                .and_then(|c| c.value.as_ref())
                .and_then(Value::as_boolean),
            Some(true)
        );
        assert!(obs.component(SYSTEM, "C").is_none());
    }

    #[test]
    fn new_resources_are_tagged_and_identified() {
        let patient = Patient::new("http://example.org/decedent");
        assert!(patient.meta.has_profile("http://example.org/decedent"));
        assert_eq!(patient.id.len(), 32);

        let location = Location::new("http://example.org/death-location");
        assert_ne!(patient.id, location.id);
    }

    #[test]
    fn profiled_resource_downcasts_by_variant() {
        let resource = Patient::new("http://example.org/decedent").into_resource();
        assert!(Patient::from_resource(&resource).is_some());
        assert!(Observation::from_resource(&resource).is_none());
        assert!(resource.meta().has_profile("http://example.org/decedent"));
    }
}
