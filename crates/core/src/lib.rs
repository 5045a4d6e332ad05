//! # VRDR Core
//!
//! Value mapping between a flat death-record surface and its FHIR document encoding.
//!
//! This crate contains:
//! - codecs for coded concepts, partial dates and quantities ([`codec`])
//! - the derived record identifier ([`identifier`])
//! - injected code tables ([`value_sets`])
//! - componentized race input ([`race`])
//! - the accessor layer binding them to one document ([`record::DeathRecord`])
//!
//! **No transport concerns**: parsing and rendering stop at YAML text. The document model
//! itself lives in the `fhir` crate.

pub mod codec;
pub mod constants;
pub mod error;
pub mod identifier;
pub mod race;
pub mod record;
pub mod value_sets;

pub use codec::coded::CodedValue;
pub use codec::partial::{DatePart, PartialKind, PronouncementValue, TriState};
pub use codec::quantity::{AgeUnit, QuantityUpdate, QuantityWithUnit};
pub use error::{RecordError, RecordResult};
pub use identifier::IdentifierSources;
pub use race::{RaceLiteral, RaceValue};
pub use record::DeathRecord;
pub use value_sets::{CodeEntry, CodeTable, ValueSets};
