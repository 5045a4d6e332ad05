//! Quantity-with-unit codec.
//!
//! Age at death is a single `Quantity` node with exactly one active unit. The per-unit
//! accessors (`years`, `months`, ...) are views of that one node: setting one replaces the
//! value and unit together, and reading one answers only if its unit is the active one.

use crate::constants::UCUM_SYSTEM;
use bigdecimal::{BigDecimal, ToPrimitive};
use fhir::Quantity;
use std::str::FromStr;

/// The UCUM time units an age may be expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AgeUnit {
    Years,
    Months,
    Days,
    Hours,
    Minutes,
}

impl AgeUnit {
    pub const ALL: [AgeUnit; 5] = [
        AgeUnit::Years,
        AgeUnit::Months,
        AgeUnit::Days,
        AgeUnit::Hours,
        AgeUnit::Minutes,
    ];

    /// UCUM code.
    pub fn code(self) -> &'static str {
        match self {
            AgeUnit::Years => "a",
            AgeUnit::Months => "mo",
            AgeUnit::Days => "d",
            AgeUnit::Hours => "h",
            AgeUnit::Minutes => "min",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeUnit::Years => "Years",
            AgeUnit::Months => "Months",
            AgeUnit::Days => "Days",
            AgeUnit::Hours => "Hours",
            AgeUnit::Minutes => "Minutes",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL.into_iter().find(|unit| unit.code() == code)
    }
}

/// Dictionary view of a quantity node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuantityWithUnit {
    pub value: Option<BigDecimal>,
    pub unit_code: Option<String>,
    pub system: Option<String>,
    pub unit_label: Option<String>,
}

impl QuantityWithUnit {
    /// The unit the stored value is expressed in, if it is a known age unit.
    pub fn active_unit(&self) -> Option<AgeUnit> {
        self.unit_code.as_deref().and_then(AgeUnit::from_code)
    }

    pub fn is_blank(&self) -> bool {
        self.value.is_none()
            && self.unit_code.is_none()
            && self.system.is_none()
            && self.unit_label.is_none()
    }
}

/// A partial update: only the keys named here are written.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuantityUpdate {
    value: Option<BigDecimal>,
    unit_code: Option<String>,
    system: Option<String>,
    unit_label: Option<String>,
}

fn non_blank(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl QuantityUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(mut self, value: BigDecimal) -> Self {
        self.value = Some(value);
        self
    }

    /// Set the value from a decimal literal. Malformed or blank literals are ignored.
    pub fn parse_value(mut self, raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return self;
        }
        match BigDecimal::from_str(raw) {
            Ok(value) => self.value = Some(value),
            Err(err) => tracing::debug!(value = raw, error = %err, "ignoring malformed quantity value"),
        }
        self
    }

    pub fn unit_code(mut self, code: impl Into<String>) -> Self {
        if let Some(code) = non_blank(code) {
            self.unit_code = Some(code);
        }
        self
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        if let Some(system) = non_blank(system) {
            self.system = Some(system);
        }
        self
    }

    pub fn unit_label(mut self, label: impl Into<String>) -> Self {
        if let Some(label) = non_blank(label) {
            self.unit_label = Some(label);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
            && self.unit_code.is_none()
            && self.system.is_none()
            && self.unit_label.is_none()
    }

    /// Write the named keys into `quantity`, leaving the rest untouched.
    pub fn apply(self, quantity: &mut Quantity) {
        if let Some(value) = self.value {
            quantity.value = Some(value);
        }
        if let Some(code) = self.unit_code {
            quantity.code = Some(code);
        }
        if let Some(system) = self.system {
            quantity.system = Some(system);
        }
        if let Some(label) = self.unit_label {
            quantity.unit = Some(label);
        }
    }
}

/// Decode a quantity node. A missing node decodes to the blank default.
pub fn decode(node: Option<&Quantity>) -> QuantityWithUnit {
    let Some(quantity) = node else {
        return QuantityWithUnit::default();
    };
    QuantityWithUnit {
        value: quantity.value.clone(),
        unit_code: quantity.code.as_deref().and_then(non_blank),
        system: quantity.system.as_deref().and_then(non_blank),
        unit_label: quantity.unit.as_deref().and_then(non_blank),
    }
}

/// Replace the value and unit fields of `slot` with `value`.
///
/// Extensions on an existing node are kept. A blank value is a no-op.
pub fn encode(slot: &mut Option<Quantity>, value: &QuantityWithUnit) {
    if value.is_blank() {
        return;
    }
    let quantity = slot.get_or_insert_with(Quantity::default);
    quantity.value = value.value.clone();
    quantity.code = value.unit_code.as_deref().and_then(non_blank);
    quantity.system = value.system.as_deref().and_then(non_blank);
    quantity.unit = value.unit_label.as_deref().and_then(non_blank);
}

/// Apply a partial update to `slot`. An empty update is a no-op.
pub fn update(slot: &mut Option<Quantity>, update: QuantityUpdate) {
    if update.is_empty() {
        return;
    }
    update.apply(slot.get_or_insert_with(Quantity::default));
}

/// The integer part of the value, if `unit` is the active unit.
pub fn get_unit(node: Option<&Quantity>, unit: AgeUnit) -> Option<i64> {
    let quantity = node?;
    if quantity.code.as_deref().map(str::trim) != Some(unit.code()) {
        return None;
    }
    quantity.value.as_ref()?.with_scale(0).to_i64()
}

/// Make `unit` the active unit with `value`. `None` is a no-op.
pub fn set_unit(slot: &mut Option<Quantity>, unit: AgeUnit, value: Option<i64>) {
    let Some(value) = value else {
        return;
    };
    let quantity = slot.get_or_insert_with(Quantity::default);
    quantity.value = Some(BigDecimal::from(value));
    quantity.code = Some(unit.code().to_string());
    quantity.system = Some(UCUM_SYSTEM.to_string());
    quantity.unit = Some(unit.label().to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhir::{Extension, HasExtensions, Value};

    const EDIT_FLAG: &str = "http://example.org/edit-flag";

    fn decimal(raw: &str) -> BigDecimal {
        BigDecimal::from_str(raw).expect("valid decimal")
    }

    #[test]
    fn one_unit_is_active_at_a_time() {
        let mut slot = None;
        set_unit(&mut slot, AgeUnit::Years, Some(57));
        assert_eq!(get_unit(slot.as_ref(), AgeUnit::Years), Some(57));
        assert_eq!(get_unit(slot.as_ref(), AgeUnit::Months), None);

        set_unit(&mut slot, AgeUnit::Months, Some(7));
        assert_eq!(get_unit(slot.as_ref(), AgeUnit::Years), None);
        assert_eq!(get_unit(slot.as_ref(), AgeUnit::Months), Some(7));

        let decoded = decode(slot.as_ref());
        assert_eq!(decoded.active_unit(), Some(AgeUnit::Months));
        assert_eq!(decoded.system.as_deref(), Some(UCUM_SYSTEM));
        assert_eq!(decoded.unit_label.as_deref(), Some("Months"));
    }

    #[test]
    fn unset_unit_write_is_a_no_op() {
        let mut slot = None;
        set_unit(&mut slot, AgeUnit::Days, None);
        assert!(slot.is_none());

        set_unit(&mut slot, AgeUnit::Days, Some(3));
        set_unit(&mut slot, AgeUnit::Hours, None);
        assert_eq!(get_unit(slot.as_ref(), AgeUnit::Days), Some(3));
    }

    #[test]
    fn get_unit_returns_integer_part() {
        let slot = Some(Quantity {
            value: Some(decimal("57.9")),
            code: Some("a".into()),
            ..Quantity::default()
        });
        assert_eq!(get_unit(slot.as_ref(), AgeUnit::Years), Some(57));
    }

    #[test]
    fn unit_writes_keep_node_extensions() {
        let mut quantity = Quantity::default();
        quantity
            .extension
            .push(Extension::with_value(EDIT_FLAG, Value::code("0")));
        let mut slot = Some(quantity);

        set_unit(&mut slot, AgeUnit::Years, Some(80));
        encode(
            &mut slot,
            &QuantityWithUnit {
                value: Some(decimal("2")),
                unit_code: Some("d".into()),
                ..QuantityWithUnit::default()
            },
        );

        let quantity = slot.expect("node kept");
        assert!(quantity.find_extension(EDIT_FLAG).is_some());
        assert_eq!(quantity.code.as_deref(), Some("d"));
        assert!(quantity.system.is_none());
    }

    #[test]
    fn dictionary_form_round_trips() {
        let value = QuantityWithUnit {
            value: Some(decimal("12.5")),
            unit_code: Some("h".into()),
            system: Some(UCUM_SYSTEM.into()),
            unit_label: Some("Hours".into()),
        };
        let mut slot = None;
        encode(&mut slot, &value);
        assert_eq!(decode(slot.as_ref()), value);

        assert!(decode(None).is_blank());
        encode(&mut slot, &QuantityWithUnit::default());
        assert_eq!(decode(slot.as_ref()), value);
    }

    #[test]
    fn update_touches_only_named_keys() {
        let mut slot = None;
        set_unit(&mut slot, AgeUnit::Years, Some(44));

        update(&mut slot, QuantityUpdate::new().unit_label("yrs").system("  "));

        let decoded = decode(slot.as_ref());
        assert_eq!(decoded.value, Some(BigDecimal::from(44)));
        assert_eq!(decoded.unit_code.as_deref(), Some("a"));
        assert_eq!(decoded.system.as_deref(), Some(UCUM_SYSTEM));
        assert_eq!(decoded.unit_label.as_deref(), Some("yrs"));
    }

    #[test]
    fn malformed_value_literal_is_ignored() {
        let update_request = QuantityUpdate::new().parse_value("fifty");
        assert!(update_request.is_empty());

        let mut slot = None;
        update(&mut slot, update_request);
        assert!(slot.is_none());

        update(&mut slot, QuantityUpdate::new().parse_value(" 3.25 "));
        assert_eq!(decode(slot.as_ref()).value, Some(decimal("3.25")));
    }

    #[test]
    fn unit_codes_resolve() {
        for unit in AgeUnit::ALL {
            assert_eq!(AgeUnit::from_code(unit.code()), Some(unit));
        }
        assert_eq!(AgeUnit::from_code("wk"), None);
    }
}
