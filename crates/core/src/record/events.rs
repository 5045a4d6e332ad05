//! Partial-date plumbing shared by every dated event, plus the injury and surgery events.

use super::DeathRecord;
use crate::codec::partial::{self, DatePart, PartialKind, TriState};
use crate::constants::{
    DEATH_DATE_CODE, DEATH_DATE_PROFILE, INJURY_INCIDENT_CODE, INJURY_INCIDENT_PROFILE,
    SURGERY_DATE_CODE, SURGERY_DATE_PROFILE,
};
use fhir::{Primitive, Value};

/// Where a dated event lives in the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EventSite {
    /// Death date observation, `valueDateTime`.
    Death,
    /// Decedent `birthDate`.
    Birth,
    /// Injury incident observation, `effectiveDateTime`.
    Injury,
    /// Surgery date observation, `valueDate`.
    Surgery,
}

impl EventSite {
    pub(crate) fn kind(self) -> PartialKind {
        match self {
            EventSite::Death | EventSite::Injury => PartialKind::DateTime,
            EventSite::Birth | EventSite::Surgery => PartialKind::Date,
        }
    }
}

fn temporal(value: Option<&Value>) -> Option<&Primitive<String>> {
    match value? {
        Value::Date(primitive) | Value::DateTime(primitive) => Some(primitive),
        _ => None,
    }
}

/// Run `f` on the temporal primitive held in `slot`, storing it back as `kind`'s value type.
fn with_temporal_value<R>(
    slot: &mut Option<Value>,
    kind: PartialKind,
    f: impl FnOnce(&mut Primitive<String>) -> R,
) -> R {
    let mut primitive = match slot.take() {
        Some(Value::Date(primitive) | Value::DateTime(primitive)) => primitive,
        _ => Primitive::empty(),
    };
    let result = f(&mut primitive);
    *slot = Some(match kind {
        PartialKind::Date => Value::Date(primitive),
        PartialKind::DateTime => Value::DateTime(primitive),
    });
    result
}

impl DeathRecord {
    fn temporal_primitive(&self, site: EventSite) -> Option<&Primitive<String>> {
        match site {
            EventSite::Birth => self.decedent()?.birth_date.as_ref(),
            EventSite::Death => temporal(self.bundle.observation(DEATH_DATE_PROFILE)?.value.as_ref()),
            EventSite::Injury => temporal(
                self.bundle
                    .observation(INJURY_INCIDENT_PROFILE)?
                    .effective
                    .as_ref(),
            ),
            EventSite::Surgery => {
                temporal(self.bundle.observation(SURGERY_DATE_PROFILE)?.value.as_ref())
            }
        }
    }

    fn with_temporal_slot<R>(
        &mut self,
        site: EventSite,
        f: impl FnOnce(&mut Primitive<String>) -> R,
    ) -> R {
        let kind = site.kind();
        match site {
            EventSite::Birth => f(self
                .decedent_mut()
                .birth_date
                .get_or_insert_with(Primitive::empty)),
            EventSite::Death => {
                let observation = self.loinc_observation_mut(DEATH_DATE_PROFILE, DEATH_DATE_CODE);
                with_temporal_value(&mut observation.value, kind, f)
            }
            EventSite::Injury => {
                let observation =
                    self.loinc_observation_mut(INJURY_INCIDENT_PROFILE, INJURY_INCIDENT_CODE);
                with_temporal_value(&mut observation.effective, kind, f)
            }
            EventSite::Surgery => {
                let observation = self.loinc_observation_mut(SURGERY_DATE_PROFILE, SURGERY_DATE_CODE);
                with_temporal_value(&mut observation.value, kind, f)
            }
        }
    }

    fn after_event_write(&mut self, site: EventSite, year_written: bool) {
        if site == EventSite::Death && year_written {
            self.refresh_record_identifier();
        }
    }

    pub(crate) fn event_part(&self, site: EventSite, part: DatePart) -> TriState<u32> {
        partial::read_date_part(self.temporal_primitive(site), site.kind(), part)
    }

    pub(crate) fn set_event_part(&mut self, site: EventSite, part: DatePart, input: TriState<u32>) {
        if input.is_unset() {
            return;
        }
        let kind = site.kind();
        self.with_temporal_slot(site, |primitive| {
            partial::write_date_part(primitive, kind, part, input);
        });
        self.after_event_write(site, part == DatePart::Year);
    }

    pub(crate) fn event_time(&self, site: EventSite) -> TriState<String> {
        partial::read_time(self.temporal_primitive(site), site.kind())
    }

    pub(crate) fn set_event_time(&mut self, site: EventSite, input: TriState<String>) {
        let kind = site.kind();
        if !kind.has_time() {
            return;
        }
        let input = match input {
            TriState::Value(raw) => TriState::from_time_sentinel(Some(raw.as_str())),
            other => other,
        };
        if input.is_unset() {
            return;
        }
        self.with_temporal_slot(site, |primitive| partial::write_time(primitive, kind, input));
    }

    pub(crate) fn event_composite(&self, site: EventSite) -> Option<String> {
        partial::read_composite(self.temporal_primitive(site), site.kind())
    }

    pub(crate) fn set_event_composite(&mut self, site: EventSite, raw: &str) {
        let Some(parsed) = partial::parse_composite(raw) else {
            return;
        };
        let kind = site.kind();
        self.with_temporal_slot(site, |primitive| {
            partial::write_composite(primitive, kind, &parsed);
        });
        self.after_event_write(site, true);
    }
}

/// Generate the component and composite accessors of one dated event.
macro_rules! event_accessors {
    (
        $site:expr;
        year: $year:ident / $set_year:ident,
        month: $month:ident / $set_month:ident,
        day: $day:ident / $set_day:ident,
        $(time: $time:ident / $set_time:ident,)?
        composite: $composite:ident / $set_composite:ident $(,)?
    ) => {
        impl $crate::record::DeathRecord {
            pub fn $year(&self) -> $crate::codec::partial::TriState<u32> {
                self.event_part($site, $crate::codec::partial::DatePart::Year)
            }

            pub fn $set_year(&mut self, value: impl Into<$crate::codec::partial::TriState<u32>>) {
                self.set_event_part($site, $crate::codec::partial::DatePart::Year, value.into());
            }

            pub fn $month(&self) -> $crate::codec::partial::TriState<u32> {
                self.event_part($site, $crate::codec::partial::DatePart::Month)
            }

            pub fn $set_month(&mut self, value: impl Into<$crate::codec::partial::TriState<u32>>) {
                self.set_event_part($site, $crate::codec::partial::DatePart::Month, value.into());
            }

            pub fn $day(&self) -> $crate::codec::partial::TriState<u32> {
                self.event_part($site, $crate::codec::partial::DatePart::Day)
            }

            pub fn $set_day(&mut self, value: impl Into<$crate::codec::partial::TriState<u32>>) {
                self.set_event_part($site, $crate::codec::partial::DatePart::Day, value.into());
            }

            $(
                pub fn $time(&self) -> $crate::codec::partial::TriState<String> {
                    self.event_time($site)
                }

                pub fn $set_time(
                    &mut self,
                    value: impl Into<$crate::codec::partial::TriState<String>>,
                ) {
                    self.set_event_time($site, value.into());
                }
            )?

            /// ISO composite, present only when year, month and day are all known.
            pub fn $composite(&self) -> Option<String> {
                self.event_composite($site)
            }

            /// Decompose an ISO timestamp into components. Malformed input is ignored.
            pub fn $set_composite(&mut self, value: &str) {
                self.set_event_composite($site, value);
            }
        }
    };
}

pub(crate) use event_accessors;

event_accessors! {
    EventSite::Injury;
    year: injury_year / set_injury_year,
    month: injury_month / set_injury_month,
    day: injury_day / set_injury_day,
    time: injury_time / set_injury_time,
    composite: injury_date / set_injury_date,
}

event_accessors! {
    EventSite::Surgery;
    year: surgery_year / set_surgery_year,
    month: surgery_month / set_surgery_month,
    day: surgery_day / set_surgery_day,
    composite: surgery_date / set_surgery_date,
}

#[cfg(test)]
mod tests {
    use crate::codec::partial::TriState;
    use crate::constants::{INJURY_INCIDENT_PROFILE, PARTIAL_DATE_URL, SURGERY_DATE_PROFILE};
    use crate::record::test_support::init_tracing;
    use crate::record::DeathRecord;
    use fhir::{HasExtensions, Value};

    #[test]
    fn injury_lives_on_effective_date_time() {
        init_tracing();
        let mut record = DeathRecord::default();
        record.set_injury_date("2021-11-30T17:05:00");

        let observation = record
            .bundle()
            .observation(INJURY_INCIDENT_PROFILE)
            .expect("created");
        assert!(observation.value.is_none());
        assert!(matches!(observation.effective, Some(Value::DateTime(_))));
        assert_eq!(record.injury_time(), TriState::Value("17:05:00".into()));
        assert_eq!(
            record.injury_date().as_deref(),
            Some("2021-11-30T17:05:00")
        );
    }

    #[test]
    fn surgery_is_date_only() {
        init_tracing();
        let mut record = DeathRecord::default();
        record.set_surgery_year(2019);
        record.set_surgery_month(TriState::from_sentinel(Some(-1)));
        record.set_surgery_day(3);

        assert_eq!(record.surgery_month().to_sentinel(), Some(-1));
        assert_eq!(record.surgery_date(), None);

        record.set_surgery_month(4);
        assert_eq!(record.surgery_date().as_deref(), Some("2019-04-03"));

        let observation = record
            .bundle()
            .observation(SURGERY_DATE_PROFILE)
            .expect("created");
        match &observation.value {
            Some(Value::Date(primitive)) => {
                assert!(primitive.find_extension(PARTIAL_DATE_URL).is_some());
            }
            other => panic!("expected valueDate, got {other:?}"),
        }
    }

    #[test]
    fn injury_time_sentinel_marks_unknown_without_creating_on_garbage() {
        init_tracing();
        let mut record = DeathRecord::default();
        record.set_injury_time("later");
        assert!(record.bundle().entry.is_empty());

        record.set_injury_time("17:05");
        record.set_injury_time(String::from(" -1 "));
        assert_eq!(record.injury_time(), TriState::ExplicitlyUnknown);

        record.set_injury_time(TriState::from_time_sentinel(Some("18:10")));
        assert_eq!(record.injury_time(), TriState::Value("18:10:00".into()));
    }

    #[test]
    fn event_writes_do_not_touch_the_identifier_except_for_death() {
        init_tracing();
        let mut record = DeathRecord::default();
        record.set_certificate_number("5");
        record.set_injury_year(2001);
        record.set_surgery_date("2002-02-02");

        assert_eq!(record.death_record_identifier(), Some("0000XX000005"));
    }
}
