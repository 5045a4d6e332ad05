//! The death record accessor layer.
//!
//! A [`DeathRecord`] owns one document bundle. Its accessors read and write flat caller values,
//! delegating each encoding to a codec from [`crate::codec`]:
//! - reads never create document nodes
//! - writes create their resource lazily, tagged with its profile
//! - setters for the identifier sources recompose the record identifier before returning
//!
//! Accessors are grouped by the resource that owns them: identity, decedent, death, injury and
//! surgery events, and age at death.

mod age;
mod death;
mod decedent;
mod events;
mod identity;

use crate::constants::{DECEDENT_PROFILE, LOINC_SYSTEM};
use crate::value_sets::ValueSets;
use crate::RecordResult;
use fhir::{Bundle, CodeableConcept, Location, Observation, Patient, Quantity, Value};
use std::sync::Arc;

/// One death record and the value sets it encodes against.
#[derive(Clone, Debug, PartialEq)]
pub struct DeathRecord {
    bundle: Bundle,
    value_sets: Arc<ValueSets>,
}

impl Default for DeathRecord {
    fn default() -> Self {
        Self::new(Arc::new(ValueSets::standard()))
    }
}

impl DeathRecord {
    /// An empty record.
    pub fn new(value_sets: Arc<ValueSets>) -> Self {
        Self::from_bundle(Bundle::document(), value_sets)
    }

    /// Wrap an existing bundle. The record identifier is recomposed from the bundle's contents.
    pub fn from_bundle(bundle: Bundle, value_sets: Arc<ValueSets>) -> Self {
        let mut record = Self { bundle, value_sets };
        record.refresh_record_identifier();
        record
    }

    /// Parse a record from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RecordError::Fhir`] if the YAML is not a valid document bundle.
    pub fn from_yaml(yaml_text: &str, value_sets: Arc<ValueSets>) -> RecordResult<Self> {
        let bundle = Bundle::parse_yaml(yaml_text)?;
        Ok(Self::from_bundle(bundle, value_sets))
    }

    /// Render the record's bundle as YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RecordError::Fhir`] if serialisation fails.
    pub fn to_yaml(&self) -> RecordResult<String> {
        Ok(self.bundle.render_yaml()?)
    }

    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    pub fn into_bundle(self) -> Bundle {
        self.bundle
    }

    pub fn value_sets(&self) -> &ValueSets {
        &self.value_sets
    }

    fn decedent(&self) -> Option<&Patient> {
        self.bundle.patient(DECEDENT_PROFILE)
    }

    fn decedent_mut(&mut self) -> &mut Patient {
        if self.decedent().is_none() {
            tracing::trace!(profile = DECEDENT_PROFILE, "creating decedent");
        }
        self.bundle.patient_mut_or_insert(DECEDENT_PROFILE)
    }

    fn observation_mut(
        &mut self,
        profile: &str,
        system: &str,
        (code, display): (&str, &str),
    ) -> &mut Observation {
        if self.bundle.observation(profile).is_none() {
            tracing::trace!(profile, code, "creating observation");
        }
        self.bundle
            .observation_mut_or_insert(profile, || CodeableConcept::from_coding(system, code, display))
    }

    fn loinc_observation_mut(&mut self, profile: &str, code: (&str, &str)) -> &mut Observation {
        self.observation_mut(profile, LOINC_SYSTEM, code)
    }

    fn location_mut(&mut self, profile: &str) -> &mut Location {
        if self.bundle.location(profile).is_none() {
            tracing::trace!(profile, "creating location");
        }
        self.bundle.location_mut_or_insert(profile)
    }

    fn observation_concept(&self, profile: &str) -> Option<&CodeableConcept> {
        self.bundle
            .observation(profile)?
            .value
            .as_ref()?
            .as_codeable_concept()
    }

    fn observation_quantity(&self, profile: &str) -> Option<&Quantity> {
        self.bundle.observation(profile)?.value.as_ref()?.as_quantity()
    }
}

/// Run `f` on the concept held in a `value[x]` slot, storing the result back.
fn with_concept_slot<R>(
    slot: &mut Option<Value>,
    f: impl FnOnce(&mut Option<CodeableConcept>) -> R,
) -> R {
    let mut concept = slot.take().and_then(Value::into_codeable_concept);
    let result = f(&mut concept);
    *slot = concept.map(Value::CodeableConcept);
    result
}

/// Run `f` on the quantity held in a `value[x]` slot, storing the result back.
fn with_quantity_slot<R>(slot: &mut Option<Value>, f: impl FnOnce(&mut Option<Quantity>) -> R) -> R {
    let mut quantity = slot.take().and_then(Value::into_quantity);
    let result = f(&mut quantity);
    *slot = quantity.map(Value::Quantity);
    result
}

#[cfg(test)]
pub(crate) mod test_support {
    use tracing_subscriber::EnvFilter;

    /// Install a test-writer subscriber so trace events show up under `--nocapture`.
    pub(crate) fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("vrdr_core=trace"))
            .with_test_writer()
            .try_init();
    }
}
