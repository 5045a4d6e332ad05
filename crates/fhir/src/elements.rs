//! FHIR element building blocks.
//!
//! These are the general-purpose data types every resource is assembled from. They mirror the
//! FHIR element shapes closely enough that extension-heavy profiles (partial dates, edit flags,
//! data-absent reasons) can be represented without loss:
//! - [`Extension`]: a URL-keyed node with an optional `value[x]` and nested extensions.
//! - [`Primitive`]: a primitive value that may be missing while still carrying extensions,
//!   matching the FHIR `_valueX` sidecar shape.
//! - [`Value`]: the typed `value[x]` choice.
//!
//! Every struct uses `#[serde(deny_unknown_fields)]` so that a snapshot with unexpected keys is
//! rejected rather than silently truncated.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// Standard FHIR extension recording why a value is missing.
pub const DATA_ABSENT_REASON_URL: &str = "http://hl7.org/fhir/StructureDefinition/data-absent-reason";

/// Data-absent reason code for "the value is not known".
const DATA_ABSENT_UNKNOWN: &str = "unknown";

/// Access to the `extension` list carried by most FHIR elements.
///
/// Lookups are by exact URL. When an element carries several extensions with the same URL,
/// the first one wins.
pub trait HasExtensions {
    fn extensions(&self) -> &[Extension];

    fn extensions_mut(&mut self) -> &mut Vec<Extension>;

    /// Returns the first extension with the given URL.
    fn find_extension(&self, url: &str) -> Option<&Extension> {
        self.extensions().iter().find(|e| e.url == url)
    }

    /// Returns the extension with the given URL, appending an empty one if none exists.
    fn extension_or_insert(&mut self, url: &str) -> &mut Extension {
        let extensions = self.extensions_mut();
        let index = match extensions.iter().position(|e| e.url == url) {
            Some(index) => index,
            None => {
                extensions.push(Extension::new(url));
                extensions.len() - 1
            }
        };
        &mut extensions[index]
    }
}

macro_rules! impl_has_extensions {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::elements::HasExtensions for $ty {
                fn extensions(&self) -> &[$crate::elements::Extension] {
                    &self.extension
                }

                fn extensions_mut(&mut self) -> &mut Vec<$crate::elements::Extension> {
                    &mut self.extension
                }
            }
        )*
    };
}

pub(crate) use impl_has_extensions;

impl_has_extensions!(Extension, CodeableConcept, Quantity, Identifier, Address);

/// A FHIR extension: a URL, an optional value and optional nested extensions.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Extension {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
}

impl Extension {
    /// Create an empty extension for `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            value: None,
            extension: Vec::new(),
        }
    }

    /// Create an extension for `url` carrying `value`.
    pub fn with_value(url: impl Into<String>, value: Value) -> Self {
        Self {
            url: url.into(),
            value: Some(value),
            extension: Vec::new(),
        }
    }
}

/// A primitive value plus the extensions FHIR allows beside it.
///
/// `value` may be `None` while `extension` is populated. That is how FHIR records a
/// data-absent reason or a partial date on an otherwise empty primitive.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Primitive<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<T>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
}

impl<T> Default for Primitive<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> HasExtensions for Primitive<T> {
    fn extensions(&self) -> &[Extension] {
        &self.extension
    }

    fn extensions_mut(&mut self) -> &mut Vec<Extension> {
        &mut self.extension
    }
}

impl<T> Primitive<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Some(value),
            extension: Vec::new(),
        }
    }

    /// A primitive with neither a value nor extensions.
    pub fn empty() -> Self {
        Self {
            value: None,
            extension: Vec::new(),
        }
    }

    /// A value-less primitive marked with the data-absent reason `unknown`.
    pub fn unknown() -> Self {
        Self {
            value: None,
            extension: vec![Extension::with_value(
                DATA_ABSENT_REASON_URL,
                Value::code(DATA_ABSENT_UNKNOWN),
            )],
        }
    }

    /// Returns the data-absent reason code, if one is recorded.
    pub fn absent_reason(&self) -> Option<&str> {
        self.find_extension(DATA_ABSENT_REASON_URL)
            .and_then(|e| e.value.as_ref())
            .and_then(Value::as_str)
    }

    /// Returns `true` if this primitive is marked absent with reason `unknown`.
    pub fn is_absent_unknown(&self) -> bool {
        self.absent_reason() == Some(DATA_ABSENT_UNKNOWN)
    }
}

/// The FHIR `value[x]` choice, restricted to the types death records use.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    Boolean(Primitive<bool>),
    UnsignedInt(Primitive<u32>),
    String(Primitive<String>),
    Code(Primitive<String>),
    Date(Primitive<String>),
    DateTime(Primitive<String>),
    Time(Primitive<String>),
    CodeableConcept(CodeableConcept),
    Quantity(Quantity),
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Value::String(Primitive::new(value.into()))
    }

    pub fn code(value: impl Into<String>) -> Self {
        Value::Code(Primitive::new(value.into()))
    }

    pub fn boolean(value: bool) -> Self {
        Value::Boolean(Primitive::new(value))
    }

    /// Returns the text of a `string` or `code` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(p) | Value::Code(p) => p.value.as_deref(),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(p) => p.value,
            _ => None,
        }
    }

    pub fn as_codeable_concept(&self) -> Option<&CodeableConcept> {
        match self {
            Value::CodeableConcept(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_codeable_concept(self) -> Option<CodeableConcept> {
        match self {
            Value::CodeableConcept(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_quantity(&self) -> Option<&Quantity> {
        match self {
            Value::Quantity(q) => Some(q),
            _ => None,
        }
    }

    pub fn into_quantity(self) -> Option<Quantity> {
        match self {
            Value::Quantity(q) => Some(q),
            _ => None,
        }
    }
}

/// A single code from a code system.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Coding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// A concept expressed as codings plus optional free text.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
}

impl CodeableConcept {
    /// A concept with a single coding.
    pub fn from_coding(
        system: impl Into<String>,
        code: impl Into<String>,
        display: impl Into<String>,
    ) -> Self {
        Self {
            coding: vec![Coding {
                system: Some(system.into()),
                code: Some(code.into()),
                display: Some(display.into()),
            }],
            text: None,
            extension: Vec::new(),
        }
    }

    pub fn first_coding(&self) -> Option<&Coding> {
        self.coding.first()
    }

    /// Returns `true` if any coding matches both `system` and `code`.
    pub fn has_coding(&self, system: &str, code: &str) -> bool {
        self.coding
            .iter()
            .any(|c| c.system.as_deref() == Some(system) && c.code.as_deref() == Some(code))
    }
}

/// A measured amount with its unit.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Quantity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<BigDecimal>,

    /// Human-readable unit label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Coded unit (for example a UCUM code).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
}

/// A business identifier.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Identifier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
}

impl Identifier {
    pub fn is_empty(&self) -> bool {
        self.system.is_none() && self.value.is_none() && self.extension.is_empty()
    }
}

/// Resource metadata. Only profile tagging is modelled.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profile: Vec<String>,
}

impl Meta {
    pub fn tagged(profile: impl Into<String>) -> Self {
        Self {
            profile: vec![profile.into()],
        }
    }

    pub fn has_profile(&self, profile: &str) -> bool {
        self.profile.iter().any(|p| p == profile)
    }
}

/// A postal address, reduced to the parts death records use.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
}
