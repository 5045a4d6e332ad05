//! Decedent demographics.

use super::events::{event_accessors, EventSite};
use super::{with_concept_slot, DeathRecord};
use crate::codec::coded::{self, CodedValue};
use crate::constants::{
    BYPASS_EDIT_FLAG_URL, EDUCATION_LEVEL_CODE, EDUCATION_LEVEL_PROFILE, INPUT_RACE_CODE,
    INPUT_RACE_PROFILE, OBSERVATIONS_SYSTEM, SEX_AT_DEATH_URL,
};
use crate::race::{self, RaceLiteral, RaceValue};
use crate::RecordResult;
use fhir::CodeableConcept;
use std::sync::Arc;

event_accessors! {
    EventSite::Birth;
    year: birth_year / set_birth_year,
    month: birth_month / set_birth_month,
    day: birth_day / set_birth_day,
    composite: date_of_birth / set_date_of_birth,
}

impl DeathRecord {
    pub fn sex_at_death(&self) -> CodedValue {
        self.decedent()
            .map(|p| coded::decode_extension(p, SEX_AT_DEATH_URL))
            .unwrap_or_default()
    }

    pub fn set_sex_at_death(&mut self, value: &CodedValue) {
        if value.is_blank() {
            return;
        }
        coded::encode_extension(self.decedent_mut(), SEX_AT_DEATH_URL, value);
    }

    pub fn sex_at_death_helper(&self) -> Option<String> {
        coded::decode_extension_helper(self.decedent()?, SEX_AT_DEATH_URL)
    }

    pub fn set_sex_at_death_helper(&mut self, code: &str) {
        if code.trim().is_empty() {
            return;
        }
        let value_sets = Arc::clone(&self.value_sets);
        coded::encode_extension_helper(
            self.decedent_mut(),
            SEX_AT_DEATH_URL,
            code,
            value_sets.sex_at_death(),
        );
    }

    fn marital_status_concept(&self) -> Option<&CodeableConcept> {
        self.decedent()?.marital_status.as_ref()
    }

    pub fn marital_status(&self) -> CodedValue {
        coded::decode(self.marital_status_concept())
    }

    pub fn set_marital_status(&mut self, value: &CodedValue) {
        if value.is_blank() {
            return;
        }
        coded::encode(&mut self.decedent_mut().marital_status, value);
    }

    pub fn marital_status_helper(&self) -> Option<String> {
        coded::decode_helper(self.marital_status_concept())
    }

    pub fn set_marital_status_helper(&mut self, code: &str) {
        if code.trim().is_empty() {
            return;
        }
        let value_sets = Arc::clone(&self.value_sets);
        coded::encode_helper(
            &mut self.decedent_mut().marital_status,
            code,
            value_sets.marital_status(),
        );
    }

    /// Edit-bypass flag carried on the marital status concept.
    pub fn marital_status_edit_flag(&self) -> CodedValue {
        self.marital_status_concept()
            .map(|c| coded::decode_extension(c, BYPASS_EDIT_FLAG_URL))
            .unwrap_or_default()
    }

    pub fn set_marital_status_edit_flag(&mut self, value: &CodedValue) {
        if value.is_blank() {
            return;
        }
        let concept = self
            .decedent_mut()
            .marital_status
            .get_or_insert_with(CodeableConcept::default);
        coded::encode_extension(concept, BYPASS_EDIT_FLAG_URL, value);
    }

    pub fn marital_status_edit_flag_helper(&self) -> Option<String> {
        coded::decode_extension_helper(self.marital_status_concept()?, BYPASS_EDIT_FLAG_URL)
    }

    pub fn set_marital_status_edit_flag_helper(&mut self, code: &str) {
        if code.trim().is_empty() {
            return;
        }
        let value_sets = Arc::clone(&self.value_sets);
        let concept = self
            .decedent_mut()
            .marital_status
            .get_or_insert_with(CodeableConcept::default);
        coded::encode_extension_helper(concept, BYPASS_EDIT_FLAG_URL, code, value_sets.edit_bypass());
    }

    pub fn education_level(&self) -> CodedValue {
        coded::decode(self.observation_concept(EDUCATION_LEVEL_PROFILE))
    }

    pub fn set_education_level(&mut self, value: &CodedValue) {
        if value.is_blank() {
            return;
        }
        let observation = self.loinc_observation_mut(EDUCATION_LEVEL_PROFILE, EDUCATION_LEVEL_CODE);
        with_concept_slot(&mut observation.value, |slot| coded::encode(slot, value));
    }

    pub fn education_level_helper(&self) -> Option<String> {
        coded::decode_helper(self.observation_concept(EDUCATION_LEVEL_PROFILE))
    }

    pub fn set_education_level_helper(&mut self, code: &str) {
        if code.trim().is_empty() {
            return;
        }
        let value_sets = Arc::clone(&self.value_sets);
        let observation = self.loinc_observation_mut(EDUCATION_LEVEL_PROFILE, EDUCATION_LEVEL_CODE);
        with_concept_slot(&mut observation.value, |slot| {
            coded::encode_helper(slot, code, value_sets.education_level());
        });
    }

    /// Edit-bypass flag carried on the education level concept.
    pub fn education_level_edit_flag(&self) -> CodedValue {
        self.observation_concept(EDUCATION_LEVEL_PROFILE)
            .map(|c| coded::decode_extension(c, BYPASS_EDIT_FLAG_URL))
            .unwrap_or_default()
    }

    pub fn set_education_level_edit_flag(&mut self, value: &CodedValue) {
        if value.is_blank() {
            return;
        }
        let observation = self.loinc_observation_mut(EDUCATION_LEVEL_PROFILE, EDUCATION_LEVEL_CODE);
        with_concept_slot(&mut observation.value, |slot| {
            let concept = slot.get_or_insert_with(CodeableConcept::default);
            coded::encode_extension(concept, BYPASS_EDIT_FLAG_URL, value);
        });
    }

    pub fn education_level_edit_flag_helper(&self) -> Option<String> {
        coded::decode_extension_helper(
            self.observation_concept(EDUCATION_LEVEL_PROFILE)?,
            BYPASS_EDIT_FLAG_URL,
        )
    }

    pub fn set_education_level_edit_flag_helper(&mut self, code: &str) {
        if code.trim().is_empty() {
            return;
        }
        let value_sets = Arc::clone(&self.value_sets);
        let observation = self.loinc_observation_mut(EDUCATION_LEVEL_PROFILE, EDUCATION_LEVEL_CODE);
        with_concept_slot(&mut observation.value, |slot| {
            let concept = slot.get_or_insert_with(CodeableConcept::default);
            coded::encode_extension_helper(
                concept,
                BYPASS_EDIT_FLAG_URL,
                code,
                value_sets.edit_bypass(),
            );
        });
    }

    /// Replace the decedent's race components.
    ///
    /// Every name is validated before anything is written.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RecordError::InvalidRaceLiteral`] for an unknown component name. The
    /// record is left unchanged.
    pub fn set_race(&mut self, entries: &[(&str, &str)]) -> RecordResult<()> {
        let entries = race::parse_entries(entries)?;
        if entries.is_empty() && self.bundle.observation(INPUT_RACE_PROFILE).is_none() {
            return Ok(());
        }
        let observation = self.observation_mut(INPUT_RACE_PROFILE, OBSERVATIONS_SYSTEM, INPUT_RACE_CODE);
        race::write(observation, entries);
        Ok(())
    }

    /// Race components in canonical order, flags rendered `Y`/`N`.
    pub fn race(&self) -> Vec<(RaceLiteral, String)> {
        race::read(self.bundle.observation(INPUT_RACE_PROFILE))
            .into_iter()
            .map(|(literal, value)| (literal, value.render()))
            .collect()
    }

    /// Race components with their typed values.
    pub fn race_values(&self) -> Vec<(RaceLiteral, RaceValue)> {
        race::read(self.bundle.observation(INPUT_RACE_PROFILE))
    }
}

#[cfg(test)]
mod tests {
    use crate::codec::coded::CodedValue;
    use crate::codec::partial::TriState;
    use crate::constants::{DECEDENT_PROFILE, INPUT_RACE_PROFILE};
    use crate::race::{RaceLiteral, RaceValue};
    use crate::record::test_support::init_tracing;
    use crate::record::DeathRecord;
    use crate::value_sets::ValueSets;
    use crate::RecordError;
    use std::sync::Arc;

    #[test]
    fn birth_date_is_date_only_on_the_decedent() {
        init_tracing();
        let mut record = DeathRecord::default();
        record.set_date_of_birth("1950-07-14T09:00:00");

        assert_eq!(record.birth_year(), TriState::Value(1950));
        assert_eq!(record.date_of_birth().as_deref(), Some("1950-07-14"));
        let decedent = record.bundle().patient(DECEDENT_PROFILE).expect("created");
        assert!(decedent.birth_date.is_some());

        record.set_birth_day(TriState::ExplicitlyUnknown);
        assert_eq!(record.date_of_birth(), None);
        assert_eq!(record.birth_month(), TriState::Value(7));
    }

    #[test]
    fn edit_flag_survives_marital_status_re_encode() {
        init_tracing();
        let mut record = DeathRecord::default();
        record.set_marital_status_helper("M");
        record.set_marital_status_edit_flag_helper("0");
        record.set_marital_status_helper("S");
        record.set_marital_status(&CodedValue::default().with_text("separated 2010"));

        let status = record.marital_status();
        assert_eq!(status.code.as_deref(), Some("S"));
        assert_eq!(status.display.as_deref(), Some("Never Married"));
        assert_eq!(status.text.as_deref(), Some("separated 2010"));
        assert_eq!(record.marital_status_edit_flag_helper().as_deref(), Some("0"));
        assert_eq!(
            record.marital_status_edit_flag().display.as_deref(),
            Some("Edit Passed")
        );
    }

    #[test]
    fn edit_flag_may_precede_its_host_value() {
        init_tracing();
        let mut record = DeathRecord::default();
        record.set_education_level_edit_flag_helper("1");
        assert_eq!(record.education_level_helper(), None);

        record.set_education_level_helper("BD");
        assert_eq!(record.education_level_helper().as_deref(), Some("BD"));
        assert_eq!(record.education_level_edit_flag_helper().as_deref(), Some("1"));
    }

    #[test]
    fn sex_at_death_uses_injected_table() {
        init_tracing();
        let yaml = "sex_at_death:\n  U:\n    system: http://example.org/sex\n    display: Undifferentiated\n";
        let sets = ValueSets::from_yaml(yaml).expect("parse value sets");
        assert!(!sets.sex_at_death().contains("M"));
        let mut record = DeathRecord::new(Arc::new(sets));

        record.set_sex_at_death_helper("U");
        assert_eq!(record.sex_at_death().system.as_deref(), Some("http://example.org/sex"));

        record.set_sex_at_death_helper("M");
        assert_eq!(record.sex_at_death().code.as_deref(), Some("OTH"));
        assert_eq!(record.sex_at_death_helper().as_deref(), Some("M"));
    }

    #[test]
    fn invalid_race_literal_aborts_without_writing() {
        init_tracing();
        let mut record = DeathRecord::default();
        record.set_race(&[("White", "Y")]).expect("valid race");

        let err = record
            .set_race(&[("Asian", "Y"), ("Martian", "Y")])
            .expect_err("unknown literal");
        assert!(matches!(err, RecordError::InvalidRaceLiteral(_)));
        assert_eq!(record.race(), vec![(RaceLiteral::White, "Y".to_string())]);

        let mut empty = DeathRecord::default();
        assert!(empty.set_race(&[("Nope", "Y")]).is_err());
        assert!(empty.bundle().observation(INPUT_RACE_PROFILE).is_none());
    }

    #[test]
    fn race_reads_in_canonical_order() {
        init_tracing();
        let mut record = DeathRecord::default();
        record
            .set_race(&[
                ("OtherRace", "true"),
                ("FirstOtherRaceLiteral", "Basque"),
                ("White", "No"),
            ])
            .expect("valid race");

        assert_eq!(
            record.race(),
            vec![
                (RaceLiteral::White, "N".to_string()),
                (RaceLiteral::OtherRace, "Y".to_string()),
                (RaceLiteral::FirstOtherRaceLiteral, "Basque".to_string()),
            ]
        );
        assert_eq!(record.race_values()[1].1, RaceValue::Flag(true));
    }
}
