//! Death event, pronouncement, manner and place of death.

use super::events::{event_accessors, EventSite};
use super::{with_concept_slot, DeathRecord};
use crate::codec::coded::{self, CodedValue};
use crate::codec::partial::{self, DatePart, PronouncementValue};
use crate::constants::{
    DEATH_DATE_CODE, DEATH_DATE_PROFILE, DEATH_LOCATION_PROFILE, JURISDICTION_ID_URL,
    LOINC_SYSTEM, MANNER_OF_DEATH_CODE, MANNER_OF_DEATH_PROFILE, NEW_YORK_CITY_JURISDICTION,
    NEW_YORK_STATE, PRONOUNCEMENT_CODE,
};
use fhir::{Address, HasExtensions, ObservationComponent, Value};
use std::sync::Arc;

event_accessors! {
    EventSite::Death;
    year: death_year / set_death_year,
    month: death_month / set_death_month,
    day: death_day / set_death_day,
    time: death_time / set_death_time,
    composite: date_of_death / set_date_of_death,
}

impl DeathRecord {
    fn pronouncement_component(&self) -> Option<&ObservationComponent> {
        self.bundle
            .observation(DEATH_DATE_PROFILE)?
            .component(LOINC_SYSTEM, PRONOUNCEMENT_CODE.0)
    }

    /// The pronouncement of death, as recorded so far.
    pub fn pronouncement(&self) -> PronouncementValue {
        PronouncementValue::from_value(self.pronouncement_component().and_then(|c| c.value.as_ref()))
    }

    /// Apply `f` to the stored pronouncement. `None` leaves it untouched.
    fn update_pronouncement(
        &mut self,
        f: impl FnOnce(PronouncementValue) -> Option<PronouncementValue>,
    ) {
        let current = self.pronouncement();
        let Some(next) = f(current) else {
            return;
        };
        if matches!(current, PronouncementValue::Time(_))
            && matches!(next, PronouncementValue::Timestamp(_))
        {
            tracing::debug!(
                time = ?current.time_of_day(),
                "promoted pronouncement time to a full timestamp"
            );
        }

        let Some(value) = next.to_value() else {
            return;
        };
        self.loinc_observation_mut(DEATH_DATE_PROFILE, DEATH_DATE_CODE)
            .component_or_insert(LOINC_SYSTEM, PRONOUNCEMENT_CODE.0, PRONOUNCEMENT_CODE.1)
            .value = Some(value);
    }

    /// The pronouncement as `HH:MM:SS` or an ISO timestamp.
    pub fn date_of_death_pronouncement(&self) -> Option<String> {
        self.pronouncement().render()
    }

    /// Replace the pronouncement with a bare time or a timestamp. Malformed input is ignored.
    pub fn set_date_of_death_pronouncement(&mut self, value: &str) {
        match PronouncementValue::parse(value) {
            Some(parsed) => self.update_pronouncement(|_| Some(parsed)),
            None => tracing::debug!(value, "ignoring malformed pronouncement"),
        }
    }

    pub fn pronouncement_year(&self) -> Option<u32> {
        self.pronouncement().date_part(DatePart::Year)
    }

    pub fn set_pronouncement_year(&mut self, year: u32) {
        self.update_pronouncement(|p| p.with_date_part(DatePart::Year, year));
    }

    pub fn pronouncement_month(&self) -> Option<u32> {
        self.pronouncement().date_part(DatePart::Month)
    }

    pub fn set_pronouncement_month(&mut self, month: u32) {
        self.update_pronouncement(|p| p.with_date_part(DatePart::Month, month));
    }

    pub fn pronouncement_day(&self) -> Option<u32> {
        self.pronouncement().date_part(DatePart::Day)
    }

    pub fn set_pronouncement_day(&mut self, day: u32) {
        self.update_pronouncement(|p| p.with_date_part(DatePart::Day, day));
    }

    pub fn pronouncement_time(&self) -> Option<String> {
        self.pronouncement().time_of_day()
    }

    /// Set the time-of-day, keeping any date already recorded. Malformed input is ignored.
    pub fn set_pronouncement_time(&mut self, time: &str) {
        match partial::parse_time(time) {
            Some(parsed) => self.update_pronouncement(|p| Some(p.with_time(parsed))),
            None => tracing::debug!(time, "ignoring malformed pronouncement time"),
        }
    }

    pub fn manner_of_death(&self) -> CodedValue {
        coded::decode(self.observation_concept(MANNER_OF_DEATH_PROFILE))
    }

    pub fn set_manner_of_death(&mut self, value: &CodedValue) {
        if value.is_blank() {
            return;
        }
        let observation = self.loinc_observation_mut(MANNER_OF_DEATH_PROFILE, MANNER_OF_DEATH_CODE);
        with_concept_slot(&mut observation.value, |slot| coded::encode(slot, value));
    }

    pub fn manner_of_death_helper(&self) -> Option<String> {
        coded::decode_helper(self.observation_concept(MANNER_OF_DEATH_PROFILE))
    }

    pub fn set_manner_of_death_helper(&mut self, code: &str) {
        if code.trim().is_empty() {
            return;
        }
        let value_sets = Arc::clone(&self.value_sets);
        let observation = self.loinc_observation_mut(MANNER_OF_DEATH_PROFILE, MANNER_OF_DEATH_CODE);
        with_concept_slot(&mut observation.value, |slot| {
            coded::encode_helper(slot, code, value_sets.manner_of_death());
        });
    }

    /// The jurisdiction the death is registered in.
    pub fn death_location_jurisdiction(&self) -> Option<&str> {
        self.bundle
            .location(DEATH_LOCATION_PROFILE)?
            .find_extension(JURISDICTION_ID_URL)?
            .value
            .as_ref()?
            .as_str()
    }

    /// Set the death jurisdiction and the death location's state, then recompose the record
    /// identifier.
    ///
    /// New York City (`YC`) is its own jurisdiction but lies in the state of New York, so its
    /// address state is `NY`.
    pub fn set_death_location_jurisdiction(&mut self, jurisdiction: &str) {
        let jurisdiction = jurisdiction.trim();
        if jurisdiction.is_empty() {
            return;
        }
        let state = if jurisdiction.eq_ignore_ascii_case(NEW_YORK_CITY_JURISDICTION) {
            NEW_YORK_STATE
        } else {
            jurisdiction
        };

        let location = self.location_mut(DEATH_LOCATION_PROFILE);
        location.extension_or_insert(JURISDICTION_ID_URL).value = Some(Value::string(jurisdiction));
        location.address.get_or_insert_with(Address::default).state = Some(state.to_string());
        self.refresh_record_identifier();
    }

    pub fn death_location_state(&self) -> Option<&str> {
        self.bundle
            .location(DEATH_LOCATION_PROFILE)?
            .address
            .as_ref()?
            .state
            .as_deref()
    }
}
