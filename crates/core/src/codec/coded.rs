//! Coded concept codec.
//!
//! Converts between the flat [`CodedValue`] callers work with and `CodeableConcept` nodes.
//!
//! Encoding merges into whatever concept already occupies the slot: the coding is replaced,
//! but sibling extensions (edit flags and the like) and any prior free text are kept. A code
//! outside the table handed to [`encode_helper`] is recorded as the null-flavor `OTH` with
//! the caller's value preserved as free text.

use crate::constants::{NULL_FLAVOR_SYSTEM, OTHER_CODE, OTHER_DISPLAY};
use crate::value_sets::CodeTable;
use fhir::{CodeableConcept, Coding, HasExtensions, Value};

/// Flat view of a coded concept.
///
/// The all-`None` default is the canonical "nothing recorded" value. It reads the same as a
/// missing node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodedValue {
    pub code: Option<String>,
    pub system: Option<String>,
    pub display: Option<String>,
    /// Free text. For `OTH` this is the caller's literal description.
    pub text: Option<String>,
}

impl CodedValue {
    pub fn new(
        code: impl Into<String>,
        system: impl Into<String>,
        display: impl Into<String>,
    ) -> Self {
        Self {
            code: non_blank(code.into()),
            system: non_blank(system.into()),
            display: non_blank(display.into()),
            text: None,
        }
    }

    /// The `OTH` escape hatch carrying `text` as the description.
    pub fn other(text: impl Into<String>) -> Self {
        Self::new(OTHER_CODE, NULL_FLAVOR_SYSTEM, OTHER_DISPLAY).with_text(text)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = non_blank(text.into());
        self
    }

    /// `true` when every field is missing or whitespace.
    pub fn is_blank(&self) -> bool {
        [&self.code, &self.system, &self.display, &self.text]
            .into_iter()
            .all(|field| field.as_deref().map_or(true, |s| s.trim().is_empty()))
    }

    fn has_coding(&self) -> bool {
        self.code.is_some() || self.system.is_some() || self.display.is_some()
    }

    fn normalized(&self) -> Self {
        Self {
            code: self.code.clone().and_then(non_blank),
            system: self.system.clone().and_then(non_blank),
            display: self.display.clone().and_then(non_blank),
            text: self.text.clone().and_then(non_blank),
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

fn non_blank_str(value: &str) -> Option<String> {
    non_blank(value.to_string())
}

/// Decode a concept. A missing node decodes to [`CodedValue::default`].
pub fn decode(node: Option<&CodeableConcept>) -> CodedValue {
    let Some(concept) = node else {
        return CodedValue::default();
    };
    let coding = concept.first_coding();

    CodedValue {
        code: coding.and_then(|c| c.code.as_deref()).and_then(non_blank_str),
        system: coding.and_then(|c| c.system.as_deref()).and_then(non_blank_str),
        display: coding.and_then(|c| c.display.as_deref()).and_then(non_blank_str),
        text: concept.text.as_deref().and_then(non_blank_str),
    }
}

/// Encode `value` into `slot`, merging with any concept already there.
///
/// A blank value is a no-op. Free text is only overwritten when `value` carries some.
pub fn encode(slot: &mut Option<CodeableConcept>, value: &CodedValue) {
    if value.is_blank() {
        return;
    }
    let value = value.normalized();

    let concept = slot.get_or_insert_with(CodeableConcept::default);
    if value.has_coding() {
        concept.coding = vec![Coding {
            system: value.system,
            code: value.code,
            display: value.display,
        }];
    }
    if let Some(text) = value.text {
        concept.text = Some(text);
    }
}

/// Decode just the code, resolving `OTH` to its free text (or `"Other"` when there is none).
pub fn decode_helper(node: Option<&CodeableConcept>) -> Option<String> {
    let value = decode(node);
    let code = value.code?;
    if code == OTHER_CODE {
        Some(value.text.unwrap_or_else(|| OTHER_DISPLAY.to_string()))
    } else {
        Some(code)
    }
}

/// Encode a bare code against `table`.
///
/// Known codes take the table's system and display. Unknown codes become `OTH` with the code
/// kept as free text. A blank code is a no-op.
pub fn encode_helper(slot: &mut Option<CodeableConcept>, code: &str, table: &CodeTable) {
    let code = code.trim();
    if code.is_empty() {
        return;
    }
    encode(slot, &resolve(code, table));
}

fn resolve(code: &str, table: &CodeTable) -> CodedValue {
    match table.get(code) {
        Some(entry) => CodedValue::new(code, &entry.system, &entry.display),
        None => CodedValue::other(code),
    }
}

/// Decode the coded extension `url` hung off `host`.
pub fn decode_extension<H: HasExtensions + ?Sized>(host: &H, url: &str) -> CodedValue {
    decode(
        host.find_extension(url)
            .and_then(|e| e.value.as_ref())
            .and_then(Value::as_codeable_concept),
    )
}

/// Encode `value` into the coded extension `url` on `host`, merging like [`encode`].
pub fn encode_extension<H: HasExtensions + ?Sized>(host: &mut H, url: &str, value: &CodedValue) {
    if value.is_blank() {
        return;
    }

    let extension = host.extension_or_insert(url);
    let mut slot = extension.value.take().and_then(Value::into_codeable_concept);
    encode(&mut slot, value);
    extension.value = slot.map(Value::CodeableConcept);
}

/// [`decode_helper`] for a coded extension.
pub fn decode_extension_helper<H: HasExtensions + ?Sized>(host: &H, url: &str) -> Option<String> {
    decode_helper(
        host.find_extension(url)
            .and_then(|e| e.value.as_ref())
            .and_then(Value::as_codeable_concept),
    )
}

/// [`encode_helper`] for a coded extension.
pub fn encode_extension_helper<H: HasExtensions + ?Sized>(
    host: &mut H,
    url: &str,
    code: &str,
    table: &CodeTable,
) {
    let code = code.trim();
    if code.is_empty() {
        return;
    }
    encode_extension(host, url, &resolve(code, table));
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhir::Extension;

    const MARITAL: &str = "http://terminology.hl7.org/CodeSystem/v3-MaritalStatus";
    const EDIT_FLAG: &str = "http://example.org/edit-flag";

    fn table() -> CodeTable {
        CodeTable::from_system(MARITAL, &[("M", "Married"), ("S", "Never Married")])
    }

    #[test]
    fn missing_node_decodes_to_blank_default() {
        assert_eq!(decode(None), CodedValue::default());
        assert!(decode(None).is_blank());
        assert_eq!(decode(Some(&CodeableConcept::default())), CodedValue::default());
        assert_eq!(decode_helper(None), None);
    }

    #[test]
    fn decode_inverts_encode_for_real_codes() {
        let values = [
            CodedValue::new("M", MARITAL, "Married"),
            CodedValue::new("M", MARITAL, "Married").with_text("married in 1990"),
            CodedValue {
                code: Some("X1".into()),
                system: None,
                display: None,
                text: None,
            },
            CodedValue::other("Common law"),
        ];

        for value in values {
            let mut slot = None;
            encode(&mut slot, &value);
            assert_eq!(decode(slot.as_ref()), value);
        }
    }

    #[test]
    fn blank_values_are_ignored_on_write() {
        let mut slot = None;
        encode(&mut slot, &CodedValue::default());
        encode(
            &mut slot,
            &CodedValue {
                code: Some("   ".into()),
                ..CodedValue::default()
            },
        );
        encode_helper(&mut slot, "  ", &table());
        assert!(slot.is_none());
    }

    #[test]
    fn encode_merges_with_existing_metadata() {
        let mut concept = CodeableConcept {
            text: Some("prior note".into()),
            ..CodeableConcept::default()
        };
        concept
            .extension
            .push(Extension::with_value(EDIT_FLAG, Value::code("0")));
        let mut slot = Some(concept);

        encode(&mut slot, &CodedValue::new("S", MARITAL, "Never Married"));

        let concept = slot.expect("concept kept");
        assert_eq!(concept.coding.len(), 1);
        assert_eq!(concept.coding[0].code.as_deref(), Some("S"));
        assert_eq!(concept.text.as_deref(), Some("prior note"));
        assert!(concept.find_extension(EDIT_FLAG).is_some());
    }

    #[test]
    fn helper_uses_table_for_known_codes() {
        let mut slot = None;
        encode_helper(&mut slot, "M", &table());

        assert_eq!(decode(slot.as_ref()), CodedValue::new("M", MARITAL, "Married"));
        assert_eq!(decode_helper(slot.as_ref()).as_deref(), Some("M"));
    }

    #[test]
    fn helper_routes_unknown_codes_through_other() {
        let mut slot = None;
        encode_helper(&mut slot, "Z9", &table());

        let decoded = decode(slot.as_ref());
        assert_eq!(decoded.code.as_deref(), Some("OTH"));
        assert_eq!(decoded.system.as_deref(), Some(NULL_FLAVOR_SYSTEM));
        assert_eq!(decoded.display.as_deref(), Some("Other"));
        assert_eq!(decoded.text.as_deref(), Some("Z9"));
        assert_eq!(decode_helper(slot.as_ref()).as_deref(), Some("Z9"));
    }

    #[test]
    fn other_without_text_reads_as_literal_other() {
        let mut slot = None;
        encode(
            &mut slot,
            &CodedValue::new(OTHER_CODE, NULL_FLAVOR_SYSTEM, "Other (unspecified)"),
        );
        assert_eq!(decode_helper(slot.as_ref()).as_deref(), Some("Other"));
    }

    #[test]
    fn text_only_update_keeps_coding() {
        let mut slot = None;
        encode(&mut slot, &CodedValue::new("M", MARITAL, "Married"));
        encode(&mut slot, &CodedValue::default().with_text("second marriage"));

        let decoded = decode(slot.as_ref());
        assert_eq!(decoded.code.as_deref(), Some("M"));
        assert_eq!(decoded.text.as_deref(), Some("second marriage"));
    }

    #[test]
    fn extension_codec_round_trips_and_merges() {
        let mut host = CodeableConcept::from_coding(MARITAL, "M", "Married");
        let flags = CodeTable::from_system("http://example.org/bypass", &[("0", "Edit Passed")]);

        assert!(decode_extension(&host, EDIT_FLAG).is_blank());
        encode_extension_helper(&mut host, EDIT_FLAG, "0", &flags);
        assert_eq!(decode_extension_helper(&host, EDIT_FLAG).as_deref(), Some("0"));

        encode_extension(&mut host, EDIT_FLAG, &CodedValue::default().with_text("checked"));
        let flag = decode_extension(&host, EDIT_FLAG);
        assert_eq!(flag.code.as_deref(), Some("0"));
        assert_eq!(flag.text.as_deref(), Some("checked"));

        encode_extension_helper(&mut host, EDIT_FLAG, "7", &flags);
        assert_eq!(decode_extension_helper(&host, EDIT_FLAG).as_deref(), Some("7"));
        assert_eq!(host.extension.len(), 1);
    }
}
