//! FHIR-aligned document model for death records.
//!
//! This crate provides the **in-memory node graph** that the record engine reads and writes:
//! - element building blocks (extensions, primitives with extensions, coded concepts,
//!   quantities, identifiers)
//! - the handful of resources a death record bundle carries (decedent, observations, death
//!   location)
//! - a document bundle with profile-keyed lookup and lazy resource creation
//! - a YAML boundary for snapshotting a bundle
//!
//! This crate focuses on structure only. It knows nothing about vital-records semantics such
//! as partial dates or derived identifiers; those live in `vrdr-core`.

pub mod bundle;
pub mod elements;
pub mod resources;

pub use bundle::Bundle;
pub use elements::{
    Address, CodeableConcept, Coding, Extension, HasExtensions, Identifier, Meta, Primitive,
    Quantity, Value, DATA_ABSENT_REASON_URL,
};
pub use resources::{Location, Observation, ObservationComponent, Patient, ProfiledResource, Resource};

/// Errors returned by the `fhir` document crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
