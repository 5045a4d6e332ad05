//! Input race and ethnicity.
//!
//! Race is recorded as a set of coded components on one observation: a yes/no flag per
//! category, free-text literals for the "other" categories, and a missing-value reason. The
//! whole set is validated before any component is written, and a write replaces the set.

use crate::constants::COMPONENT_SYSTEM;
use crate::{RecordError, RecordResult};
use fhir::{CodeableConcept, Observation, ObservationComponent, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How a race component stores its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaceKind {
    Flag,
    Literal,
    MissingValueReason,
}

/// One NVSS race component. Declaration order is the canonical output order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RaceLiteral {
    White,
    BlackOrAfricanAmerican,
    AmericanIndianOrAlaskanNative,
    AsianIndian,
    Chinese,
    Filipino,
    Japanese,
    Korean,
    Vietnamese,
    OtherAsian,
    NativeHawaiian,
    GuamanianOrChamorro,
    Samoan,
    OtherPacificIslander,
    OtherRace,
    FirstAmericanIndianOrAlaskanNativeLiteral,
    SecondAmericanIndianOrAlaskanNativeLiteral,
    FirstOtherAsianLiteral,
    SecondOtherAsianLiteral,
    FirstOtherPacificIslanderLiteral,
    SecondOtherPacificIslanderLiteral,
    FirstOtherRaceLiteral,
    SecondOtherRaceLiteral,
    MissingValueReason,
}

impl RaceLiteral {
    pub const ALL: [RaceLiteral; 24] = [
        RaceLiteral::White,
        RaceLiteral::BlackOrAfricanAmerican,
        RaceLiteral::AmericanIndianOrAlaskanNative,
        RaceLiteral::AsianIndian,
        RaceLiteral::Chinese,
        RaceLiteral::Filipino,
        RaceLiteral::Japanese,
        RaceLiteral::Korean,
        RaceLiteral::Vietnamese,
        RaceLiteral::OtherAsian,
        RaceLiteral::NativeHawaiian,
        RaceLiteral::GuamanianOrChamorro,
        RaceLiteral::Samoan,
        RaceLiteral::OtherPacificIslander,
        RaceLiteral::OtherRace,
        RaceLiteral::FirstAmericanIndianOrAlaskanNativeLiteral,
        RaceLiteral::SecondAmericanIndianOrAlaskanNativeLiteral,
        RaceLiteral::FirstOtherAsianLiteral,
        RaceLiteral::SecondOtherAsianLiteral,
        RaceLiteral::FirstOtherPacificIslanderLiteral,
        RaceLiteral::SecondOtherPacificIslanderLiteral,
        RaceLiteral::FirstOtherRaceLiteral,
        RaceLiteral::SecondOtherRaceLiteral,
        RaceLiteral::MissingValueReason,
    ];

    /// Component code, as used on the wire and in caller input.
    pub fn code(self) -> &'static str {
        match self {
            RaceLiteral::White => "White",
            RaceLiteral::BlackOrAfricanAmerican => "BlackOrAfricanAmerican",
            RaceLiteral::AmericanIndianOrAlaskanNative => "AmericanIndianOrAlaskanNative",
            RaceLiteral::AsianIndian => "AsianIndian",
            RaceLiteral::Chinese => "Chinese",
            RaceLiteral::Filipino => "Filipino",
            RaceLiteral::Japanese => "Japanese",
            RaceLiteral::Korean => "Korean",
            RaceLiteral::Vietnamese => "Vietnamese",
            RaceLiteral::OtherAsian => "OtherAsian",
            RaceLiteral::NativeHawaiian => "NativeHawaiian",
            RaceLiteral::GuamanianOrChamorro => "GuamanianOrChamorro",
            RaceLiteral::Samoan => "Samoan",
            RaceLiteral::OtherPacificIslander => "OtherPacificIslander",
            RaceLiteral::OtherRace => "OtherRace",
            RaceLiteral::FirstAmericanIndianOrAlaskanNativeLiteral => {
                "FirstAmericanIndianOrAlaskanNativeLiteral"
            }
            RaceLiteral::SecondAmericanIndianOrAlaskanNativeLiteral => {
                "SecondAmericanIndianOrAlaskanNativeLiteral"
            }
            RaceLiteral::FirstOtherAsianLiteral => "FirstOtherAsianLiteral",
            RaceLiteral::SecondOtherAsianLiteral => "SecondOtherAsianLiteral",
            RaceLiteral::FirstOtherPacificIslanderLiteral => "FirstOtherPacificIslanderLiteral",
            RaceLiteral::SecondOtherPacificIslanderLiteral => "SecondOtherPacificIslanderLiteral",
            RaceLiteral::FirstOtherRaceLiteral => "FirstOtherRaceLiteral",
            RaceLiteral::SecondOtherRaceLiteral => "SecondOtherRaceLiteral",
            RaceLiteral::MissingValueReason => "RaceMissingValueReason",
        }
    }

    pub fn kind(self) -> RaceKind {
        match self {
            RaceLiteral::FirstAmericanIndianOrAlaskanNativeLiteral
            | RaceLiteral::SecondAmericanIndianOrAlaskanNativeLiteral
            | RaceLiteral::FirstOtherAsianLiteral
            | RaceLiteral::SecondOtherAsianLiteral
            | RaceLiteral::FirstOtherPacificIslanderLiteral
            | RaceLiteral::SecondOtherPacificIslanderLiteral
            | RaceLiteral::FirstOtherRaceLiteral
            | RaceLiteral::SecondOtherRaceLiteral => RaceKind::Literal,
            RaceLiteral::MissingValueReason => RaceKind::MissingValueReason,
            _ => RaceKind::Flag,
        }
    }

    fn component_code(self) -> CodeableConcept {
        CodeableConcept::from_coding(COMPONENT_SYSTEM, self.code(), self.code())
    }
}

impl FromStr for RaceLiteral {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|literal| literal.code() == s)
            .ok_or_else(|| RecordError::InvalidRaceLiteral(s.to_string()))
    }
}

impl fmt::Display for RaceLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A validated component value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RaceValue {
    Flag(bool),
    Text(String),
}

impl RaceValue {
    fn parse(literal: RaceLiteral, raw: &str) -> Self {
        let raw = raw.trim();
        match literal.kind() {
            RaceKind::Flag => RaceValue::Flag(
                ["y", "yes", "true"]
                    .iter()
                    .any(|truthy| raw.eq_ignore_ascii_case(truthy)),
            ),
            RaceKind::Literal | RaceKind::MissingValueReason => RaceValue::Text(raw.to_string()),
        }
    }

    /// Render for callers: flags as `Y`/`N`, everything else verbatim.
    pub fn render(&self) -> String {
        match self {
            RaceValue::Flag(true) => "Y".to_string(),
            RaceValue::Flag(false) => "N".to_string(),
            RaceValue::Text(text) => text.clone(),
        }
    }
}

/// A validated race set, keyed in canonical order. Later duplicates win.
pub type RaceEntries = BTreeMap<RaceLiteral, RaceValue>;

/// Validate every `(name, value)` pair.
///
/// # Errors
///
/// Returns [`RecordError::InvalidRaceLiteral`] naming the first unknown component.
pub fn parse_entries(entries: &[(&str, &str)]) -> RecordResult<RaceEntries> {
    entries
        .iter()
        .map(|(name, raw)| {
            let literal = name.parse::<RaceLiteral>()?;
            Ok((literal, RaceValue::parse(literal, raw)))
        })
        .collect()
}

fn component(literal: RaceLiteral, value: RaceValue) -> Option<ObservationComponent> {
    let value = match (literal.kind(), value) {
        (_, RaceValue::Flag(flag)) => Value::boolean(flag),
        (_, RaceValue::Text(text)) if text.is_empty() => return None,
        (RaceKind::MissingValueReason, RaceValue::Text(text)) => Value::code(text),
        (_, RaceValue::Text(text)) => Value::string(text),
    };
    let mut component = ObservationComponent::new(literal.component_code());
    component.value = Some(value);
    Some(component)
}

/// Replace the race components of `observation` with `entries`.
pub fn write(observation: &mut Observation, entries: RaceEntries) {
    observation.component = entries
        .into_iter()
        .filter_map(|(literal, value)| component(literal, value))
        .collect();
}

/// Read the race components in canonical order.
pub fn read(observation: Option<&Observation>) -> Vec<(RaceLiteral, RaceValue)> {
    let Some(observation) = observation else {
        return Vec::new();
    };

    RaceLiteral::ALL
        .into_iter()
        .filter_map(|literal| {
            let value = observation
                .component(COMPONENT_SYSTEM, literal.code())?
                .value
                .as_ref()?;
            let value = match value {
                Value::Boolean(_) => RaceValue::Flag(value.as_boolean()?),
                _ => RaceValue::Text(value.as_str()?.to_string()),
            };
            Some((literal, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation() -> Observation {
        Observation::new(
            "http://example.org/input-race",
            CodeableConcept::from_coding("http://example.org/obs", "inputrace", "Input race"),
        )
    }

    #[test]
    fn literal_names_parse_and_display() {
        for literal in RaceLiteral::ALL {
            assert_eq!(literal.code().parse::<RaceLiteral>().ok(), Some(literal));
            assert_eq!(literal.to_string(), literal.code());
        }
        assert_eq!(
            RaceLiteral::MissingValueReason.kind(),
            RaceKind::MissingValueReason
        );
        assert_eq!(RaceLiteral::FirstOtherRaceLiteral.kind(), RaceKind::Literal);
        assert_eq!(RaceLiteral::Samoan.kind(), RaceKind::Flag);
    }

    #[test]
    fn unknown_names_are_rejected_before_anything_is_parsed() {
        let err = parse_entries(&[("White", "Y"), ("Martian", "Y")]).expect_err("reject");
        assert!(matches!(err, RecordError::InvalidRaceLiteral(name) if name == "Martian"));
    }

    #[test]
    fn flags_accept_common_truthy_spellings() {
        let entries = parse_entries(&[
            ("White", "yes"),
            ("Chinese", "TRUE"),
            ("Korean", "y"),
            ("Samoan", "no"),
            ("Filipino", "maybe"),
        ])
        .expect("valid names");

        let rendered: Vec<_> = entries.values().map(RaceValue::render).collect();
        assert_eq!(rendered, vec!["Y", "Y", "N", "Y", "N"]);
    }

    #[test]
    fn write_replaces_the_set_and_reads_in_canonical_order() {
        let mut obs = observation();
        write(
            &mut obs,
            parse_entries(&[("OtherRace", "Y"), ("White", "N")]).expect("valid"),
        );
        write(
            &mut obs,
            parse_entries(&[
                ("FirstOtherRaceLiteral", "Basque"),
                ("SecondOtherRaceLiteral", ""),
                ("White", "Y"),
                ("RaceMissingValueReason", "R"),
            ])
            .expect("valid"),
        );

        let read_back: Vec<_> = read(Some(&obs))
            .into_iter()
            .map(|(literal, value)| (literal.code(), value.render()))
            .collect();
        assert_eq!(
            read_back,
            vec![
                ("White", "Y".to_string()),
                ("FirstOtherRaceLiteral", "Basque".to_string()),
                ("RaceMissingValueReason", "R".to_string()),
            ]
        );
        assert!(matches!(
            obs.component(COMPONENT_SYSTEM, "RaceMissingValueReason")
                .and_then(|c| c.value.as_ref()),
            Some(Value::Code(_))
        ));
    }

    #[test]
    fn missing_observation_reads_empty() {
        assert!(read(None).is_empty());
    }
}
