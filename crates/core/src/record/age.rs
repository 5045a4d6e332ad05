use super::{with_quantity_slot, DeathRecord};
use crate::codec::coded::{self, CodedValue};
use crate::codec::quantity::{self, AgeUnit, QuantityUpdate, QuantityWithUnit};
use crate::constants::{BYPASS_EDIT_FLAG_URL, DECEDENT_AGE_CODE, DECEDENT_AGE_PROFILE};
use fhir::{Observation, Quantity};
use std::sync::Arc;

impl DeathRecord {
    fn age_observation_mut(&mut self) -> &mut Observation {
        self.loinc_observation_mut(DECEDENT_AGE_PROFILE, DECEDENT_AGE_CODE)
    }

    /// Age at death in dictionary form.
    pub fn age_at_death(&self) -> QuantityWithUnit {
        quantity::decode(self.observation_quantity(DECEDENT_AGE_PROFILE))
    }

    /// Replace the age at death. A blank value is ignored.
    pub fn set_age_at_death(&mut self, value: &QuantityWithUnit) {
        if value.is_blank() {
            return;
        }
        with_quantity_slot(&mut self.age_observation_mut().value, |slot| {
            quantity::encode(slot, value);
        });
    }

    /// Write only the keys named by `update`.
    pub fn update_age_at_death(&mut self, update: QuantityUpdate) {
        if update.is_empty() {
            return;
        }
        with_quantity_slot(&mut self.age_observation_mut().value, |slot| {
            quantity::update(slot, update);
        });
    }

    /// Age in `unit`, if `unit` is the one recorded.
    pub fn age_at_death_in(&self, unit: AgeUnit) -> Option<i64> {
        quantity::get_unit(self.observation_quantity(DECEDENT_AGE_PROFILE), unit)
    }

    /// Record the age in `unit`, replacing any other unit. `None` is ignored.
    pub fn set_age_at_death_in(&mut self, unit: AgeUnit, value: Option<i64>) {
        if value.is_none() {
            return;
        }
        with_quantity_slot(&mut self.age_observation_mut().value, |slot| {
            quantity::set_unit(slot, unit, value);
        });
    }

    pub fn age_at_death_years(&self) -> Option<i64> {
        self.age_at_death_in(AgeUnit::Years)
    }

    pub fn set_age_at_death_years(&mut self, value: Option<i64>) {
        self.set_age_at_death_in(AgeUnit::Years, value);
    }

    pub fn age_at_death_months(&self) -> Option<i64> {
        self.age_at_death_in(AgeUnit::Months)
    }

    pub fn set_age_at_death_months(&mut self, value: Option<i64>) {
        self.set_age_at_death_in(AgeUnit::Months, value);
    }

    pub fn age_at_death_days(&self) -> Option<i64> {
        self.age_at_death_in(AgeUnit::Days)
    }

    pub fn set_age_at_death_days(&mut self, value: Option<i64>) {
        self.set_age_at_death_in(AgeUnit::Days, value);
    }

    pub fn age_at_death_hours(&self) -> Option<i64> {
        self.age_at_death_in(AgeUnit::Hours)
    }

    pub fn set_age_at_death_hours(&mut self, value: Option<i64>) {
        self.set_age_at_death_in(AgeUnit::Hours, value);
    }

    pub fn age_at_death_minutes(&self) -> Option<i64> {
        self.age_at_death_in(AgeUnit::Minutes)
    }

    pub fn set_age_at_death_minutes(&mut self, value: Option<i64>) {
        self.set_age_at_death_in(AgeUnit::Minutes, value);
    }

    /// Edit-bypass flag carried on the age quantity.
    pub fn age_at_death_edit_flag(&self) -> CodedValue {
        self.observation_quantity(DECEDENT_AGE_PROFILE)
            .map(|q| coded::decode_extension(q, BYPASS_EDIT_FLAG_URL))
            .unwrap_or_default()
    }

    pub fn set_age_at_death_edit_flag(&mut self, value: &CodedValue) {
        if value.is_blank() {
            return;
        }
        with_quantity_slot(&mut self.age_observation_mut().value, |slot| {
            let quantity = slot.get_or_insert_with(Quantity::default);
            coded::encode_extension(quantity, BYPASS_EDIT_FLAG_URL, value);
        });
    }

    pub fn age_at_death_edit_flag_helper(&self) -> Option<String> {
        coded::decode_extension_helper(
            self.observation_quantity(DECEDENT_AGE_PROFILE)?,
            BYPASS_EDIT_FLAG_URL,
        )
    }

    pub fn set_age_at_death_edit_flag_helper(&mut self, code: &str) {
        if code.trim().is_empty() {
            return;
        }
        let value_sets = Arc::clone(&self.value_sets);
        with_quantity_slot(&mut self.age_observation_mut().value, |slot| {
            let quantity = slot.get_or_insert_with(Quantity::default);
            coded::encode_extension_helper(
                quantity,
                BYPASS_EDIT_FLAG_URL,
                code,
                value_sets.edit_bypass(),
            );
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::codec::quantity::{AgeUnit, QuantityUpdate, QuantityWithUnit};
    use crate::constants::UCUM_SYSTEM;
    use crate::record::test_support::init_tracing;
    use crate::record::DeathRecord;
    use bigdecimal::BigDecimal;

    #[test]
    fn one_age_unit_is_active() {
        init_tracing();
        let mut record = DeathRecord::default();
        record.set_age_at_death_years(Some(57));

        assert_eq!(record.age_at_death_years(), Some(57));
        assert_eq!(record.age_at_death_months(), None);

        record.set_age_at_death_minutes(Some(30));
        assert_eq!(record.age_at_death_years(), None);
        assert_eq!(record.age_at_death_minutes(), Some(30));
        assert_eq!(record.age_at_death().active_unit(), Some(AgeUnit::Minutes));
    }

    #[test]
    fn edit_flag_survives_unit_changes() {
        init_tracing();
        let mut record = DeathRecord::default();
        record.set_age_at_death_edit_flag_helper("2");
        record.set_age_at_death_days(Some(3));
        record.set_age_at_death_hours(Some(70));

        assert_eq!(record.age_at_death_edit_flag_helper().as_deref(), Some("2"));
        assert_eq!(record.age_at_death_hours(), Some(70));
    }

    #[test]
    fn dictionary_updates_touch_only_named_keys() {
        init_tracing();
        let mut record = DeathRecord::default();
        record.set_age_at_death(&QuantityWithUnit {
            value: Some(BigDecimal::from(12)),
            unit_code: Some("mo".into()),
            system: Some(UCUM_SYSTEM.into()),
            unit_label: Some("Months".into()),
        });

        record.update_age_at_death(QuantityUpdate::new().parse_value("not-a-number"));
        record.update_age_at_death(QuantityUpdate::new().unit_label("months"));

        let age = record.age_at_death();
        assert_eq!(age.value, Some(BigDecimal::from(12)));
        assert_eq!(age.unit_label.as_deref(), Some("months"));
        assert_eq!(record.age_at_death_months(), Some(12));
    }

    #[test]
    fn empty_age_writes_create_nothing() {
        init_tracing();
        let mut record = DeathRecord::default();
        record.set_age_at_death(&QuantityWithUnit::default());
        record.update_age_at_death(QuantityUpdate::new());
        record.set_age_at_death_days(None);
        assert!(record.bundle().entry.is_empty());
        assert!(record.age_at_death().is_blank());
    }
}
