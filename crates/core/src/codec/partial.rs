//! Partial temporal codec.
//!
//! Dates in a death record are frequently incomplete: the year may be known while the day is
//! not, or a component may have been deliberately recorded as "unknown". Each component is
//! therefore a [`TriState`]:
//! - `Value(x)`: concretely known
//! - `ExplicitlyUnknown`: recorded as undeterminable (data-absent reason `unknown`)
//! - `Unset`: never supplied
//!
//! On the document side the components live as sub-extensions of a partial-date (or
//! partial-dateTime) extension attached to a `date`/`dateTime` primitive:
//!
//! ```text
//! valueDateTime:
//!   value: ~                      <- optional direct timestamp, wins on read
//!   extension:
//!     - url: .../PartialDateTime
//!       extension:
//!         - url: date-year   valueUnsignedInt: 2022
//!         - url: date-month  valueUnsignedInt: { data-absent-reason: unknown }
//!         - url: date-day    ...
//!         - url: date-time   valueTime: "14:30:00"
//! ```
//!
//! Component writes never regress a component to `Unset`: writing `Unset` is a no-op.
//!
//! The pronouncement of death is modelled separately as [`PronouncementValue`]. That value is
//! a bare time-of-day until a date part arrives, at which point it is promoted to a full
//! timestamp carrying the time forward.

use crate::constants::{
    DATE_DAY_URL, DATE_MONTH_URL, DATE_TIME_URL, DATE_YEAR_URL, PARTIAL_DATE_TIME_URL,
    PARTIAL_DATE_URL,
};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use fhir::{Extension, HasExtensions, Primitive, Value};

const TIME_FORMAT: &str = "%H:%M:%S";
const TIME_INPUT_FORMATS: [&str; 3] = ["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"];
const DATE_TIME_INPUT_FORMATS: [&str; 3] =
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
const UNKNOWN_SENTINEL: i32 = -1;
const UNKNOWN_TIME_SENTINEL: &str = "-1";
const MAX_YEAR: u32 = 9999;

/// A component that is known, explicitly unknown, or never supplied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TriState<T> {
    Value(T),
    ExplicitlyUnknown,
    Unset,
}

impl<T> Default for TriState<T> {
    fn default() -> Self {
        TriState::Unset
    }
}

impl<T> From<T> for TriState<T> {
    fn from(value: T) -> Self {
        TriState::Value(value)
    }
}

/// Time literals convert through [`TriState::from_time_sentinel`], so `"-1"` is unknown.
impl From<&str> for TriState<String> {
    fn from(value: &str) -> Self {
        TriState::from_time_sentinel(Some(value))
    }
}

impl<T> TriState<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            TriState::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            TriState::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, TriState::Unset)
    }
}

impl TriState<u32> {
    /// Convert a legacy nullable integer: `None` is unset, `-1` is unknown.
    ///
    /// Any other negative number is not a valid component and maps to `Unset`, which makes
    /// the write a no-op.
    pub fn from_sentinel(input: Option<i32>) -> Self {
        match input {
            None => TriState::Unset,
            Some(UNKNOWN_SENTINEL) => TriState::ExplicitlyUnknown,
            Some(value) => u32::try_from(value).map_or(TriState::Unset, TriState::Value),
        }
    }

    pub fn to_sentinel(&self) -> Option<i32> {
        match self {
            TriState::Value(value) => i32::try_from(*value).ok(),
            TriState::ExplicitlyUnknown => Some(UNKNOWN_SENTINEL),
            TriState::Unset => None,
        }
    }
}

impl TriState<String> {
    /// Convert a legacy nullable time string: `None` is unset, `"-1"` is unknown.
    ///
    /// Times are normalized to `HH:MM:SS`; a malformed time maps to `Unset`.
    pub fn from_time_sentinel(input: Option<&str>) -> Self {
        match input.map(str::trim) {
            None => TriState::Unset,
            Some(UNKNOWN_TIME_SENTINEL) => TriState::ExplicitlyUnknown,
            Some(raw) => match normalize_time(raw) {
                Some(time) => TriState::Value(time),
                None => {
                    tracing::debug!(time = raw, "ignoring malformed time-of-day");
                    TriState::Unset
                }
            },
        }
    }

    pub fn to_time_sentinel(&self) -> Option<String> {
        match self {
            TriState::Value(value) => Some(value.clone()),
            TriState::ExplicitlyUnknown => Some(UNKNOWN_TIME_SENTINEL.to_string()),
            TriState::Unset => None,
        }
    }
}

/// A calendar component of a partial date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatePart {
    Year,
    Month,
    Day,
}

impl DatePart {
    pub const ALL: [DatePart; 3] = [DatePart::Year, DatePart::Month, DatePart::Day];

    pub fn url(self) -> &'static str {
        match self {
            DatePart::Year => DATE_YEAR_URL,
            DatePart::Month => DATE_MONTH_URL,
            DatePart::Day => DATE_DAY_URL,
        }
    }

    /// Whether `value` is in range for this part in at least one calendar year.
    pub fn accepts(self, value: u32) -> bool {
        match self {
            DatePart::Year => (1..=MAX_YEAR).contains(&value),
            DatePart::Month => (1..=12).contains(&value),
            DatePart::Day => (1..=31).contains(&value),
        }
    }
}

/// Whether an event records a bare date or a date with time-of-day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartialKind {
    Date,
    DateTime,
}

impl PartialKind {
    pub fn url(self) -> &'static str {
        match self {
            PartialKind::Date => PARTIAL_DATE_URL,
            PartialKind::DateTime => PARTIAL_DATE_TIME_URL,
        }
    }

    pub fn has_time(self) -> bool {
        matches!(self, PartialKind::DateTime)
    }
}

/// Parse `HH:MM` or `HH:MM:SS[.fff]`.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    TIME_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
}

fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Normalize `HH:MM` or `HH:MM:SS[.fff]` to `HH:MM:SS`.
pub fn normalize_time(raw: &str) -> Option<String> {
    parse_time(raw).map(format_time)
}

fn tri_state_of<T: Clone>(primitive: &Primitive<T>) -> TriState<T> {
    match &primitive.value {
        Some(value) => TriState::Value(value.clone()),
        None if primitive.is_absent_unknown() => TriState::ExplicitlyUnknown,
        None => TriState::Unset,
    }
}

/// Read a calendar component from a partial-date extension.
pub fn get_date_part(extension: &Extension, part: DatePart) -> TriState<u32> {
    match extension.find_extension(part.url()).and_then(|e| e.value.as_ref()) {
        Some(Value::UnsignedInt(primitive)) => tri_state_of(primitive),
        _ => TriState::Unset,
    }
}

/// Write a calendar component into a partial-date extension.
pub fn set_date_part(extension: &mut Extension, part: DatePart, input: TriState<u32>) {
    let primitive = match input {
        TriState::Unset => return,
        TriState::ExplicitlyUnknown => Primitive::unknown(),
        TriState::Value(value) => Primitive::new(value),
    };
    extension.extension_or_insert(part.url()).value = Some(Value::UnsignedInt(primitive));
}

/// Read the time-of-day component from a partial-dateTime extension.
pub fn get_time(extension: &Extension) -> TriState<String> {
    match extension.find_extension(DATE_TIME_URL).and_then(|e| e.value.as_ref()) {
        Some(Value::Time(primitive)) => tri_state_of(primitive),
        _ => TriState::Unset,
    }
}

/// Write the time-of-day component into a partial-dateTime extension.
pub fn set_time(extension: &mut Extension, input: TriState<String>) {
    let primitive = match input {
        TriState::Unset => return,
        TriState::ExplicitlyUnknown => Primitive::unknown(),
        TriState::Value(raw) if raw.trim() == UNKNOWN_TIME_SENTINEL => Primitive::unknown(),
        TriState::Value(raw) => match normalize_time(&raw) {
            Some(time) => Primitive::new(time),
            None => {
                tracing::debug!(time = %raw, "ignoring malformed time-of-day");
                return;
            }
        },
    };
    extension.extension_or_insert(DATE_TIME_URL).value = Some(Value::Time(primitive));
}

/// An ISO-ish timestamp broken into its parts.
///
/// Reduced-precision forms (`YYYY`, `YYYY-MM`) parse with the missing parts as `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParsedTimestamp {
    pub year: u32,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub time: Option<NaiveTime>,
}

impl ParsedTimestamp {
    /// Parse RFC 3339, `YYYY-MM-DDTHH:MM[:SS]`, `YYYY-MM-DD`, `YYYY-MM` or `YYYY`.
    ///
    /// An offset, when present, is dropped and the wall-clock parts are kept.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
            return Self::from_naive(timestamp.naive_local());
        }
        if let Some(timestamp) = DATE_TIME_INPUT_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        {
            return Self::from_naive(timestamp);
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Self::from_date(date, None);
        }
        Self::parse_reduced(raw)
    }

    fn from_naive(timestamp: NaiveDateTime) -> Option<Self> {
        Self::from_date(timestamp.date(), Some(timestamp.time()))
    }

    fn from_date(date: NaiveDate, time: Option<NaiveTime>) -> Option<Self> {
        Some(Self {
            year: u32::try_from(date.year()).ok()?,
            month: Some(date.month()),
            day: Some(date.day()),
            time,
        })
    }

    fn parse_reduced(raw: &str) -> Option<Self> {
        fn digits(s: &str, len: usize) -> Option<u32> {
            if s.len() == len && s.bytes().all(|b| b.is_ascii_digit()) {
                s.parse().ok()
            } else {
                None
            }
        }

        let (year, month) = match raw.split_once('-') {
            Some((year, month)) => (year, Some(month)),
            None => (raw, None),
        };
        let year = digits(year, 4)?;
        let month = match month {
            Some(month) => Some(digits(month, 2).filter(|m| (1..=12).contains(m))?),
            None => None,
        };

        Some(Self {
            year,
            month,
            day: None,
            time: None,
        })
    }

    /// Year, month and day, if all three are present.
    pub fn full_date(&self) -> Option<(u32, u32, u32)> {
        Some((self.year, self.month?, self.day?))
    }

    pub fn date_part(&self, part: DatePart) -> Option<u32> {
        match part {
            DatePart::Year => Some(self.year),
            DatePart::Month => self.month,
            DatePart::Day => self.day,
        }
    }

    /// Time-of-day formatted as `HH:MM:SS`.
    pub fn time_of_day(&self) -> Option<String> {
        self.time.map(format_time)
    }
}

fn direct_timestamp(primitive: &Primitive<String>) -> Option<ParsedTimestamp> {
    primitive.value.as_deref().and_then(ParsedTimestamp::parse)
}

/// Read a calendar component of an event.
///
/// A direct timestamp on the primitive wins over the partial-date extension.
pub fn read_date_part(
    primitive: Option<&Primitive<String>>,
    kind: PartialKind,
    part: DatePart,
) -> TriState<u32> {
    let Some(primitive) = primitive else {
        return TriState::Unset;
    };
    if let Some(direct) = direct_timestamp(primitive) {
        return direct.date_part(part).map_or(TriState::Unset, TriState::Value);
    }
    primitive
        .find_extension(kind.url())
        .map_or(TriState::Unset, |extension| get_date_part(extension, part))
}

/// Read the time-of-day of an event. Date-only events always read `Unset`.
pub fn read_time(primitive: Option<&Primitive<String>>, kind: PartialKind) -> TriState<String> {
    let Some(primitive) = primitive.filter(|_| kind.has_time()) else {
        return TriState::Unset;
    };
    if let Some(direct) = direct_timestamp(primitive) {
        return direct
            .time_of_day()
            .map_or(TriState::Unset, TriState::Value);
    }
    primitive
        .find_extension(kind.url())
        .map_or(TriState::Unset, get_time)
}

/// Read an event as a single ISO string.
///
/// Returns the direct timestamp when one is set. Otherwise returns `YYYY-MM-DD` when year,
/// month and day are all known, with `THH:MM:SS` appended when the time is known too.
/// Anything less complete reads as `None`.
pub fn read_composite(primitive: Option<&Primitive<String>>, kind: PartialKind) -> Option<String> {
    let primitive = primitive?;
    if let Some(direct) = direct_timestamp(primitive) {
        direct.full_date()?;
        return primitive.value.as_deref().map(|raw| raw.trim().to_string());
    }

    let extension = primitive.find_extension(kind.url())?;
    let (TriState::Value(year), TriState::Value(month), TriState::Value(day)) = (
        get_date_part(extension, DatePart::Year),
        get_date_part(extension, DatePart::Month),
        get_date_part(extension, DatePart::Day),
    ) else {
        return None;
    };

    let date = format!("{year:04}-{month:02}-{day:02}");
    if !kind.has_time() {
        return Some(date);
    }
    match get_time(extension) {
        TriState::Value(time) => Some(format!("{date}T{time}")),
        _ => Some(date),
    }
}

/// Move a direct timestamp into the partial-date extension and clear it.
///
/// After this the componentized form is authoritative, with every part the direct value
/// recorded carried over.
fn materialize_direct(primitive: &mut Primitive<String>, kind: PartialKind) {
    let Some(raw) = primitive.value.take() else {
        return;
    };
    let Some(parsed) = ParsedTimestamp::parse(&raw) else {
        tracing::debug!(value = %raw, "dropping unparsable direct timestamp");
        return;
    };

    let extension = primitive.extension_or_insert(kind.url());
    for part in DatePart::ALL {
        if let Some(value) = parsed.date_part(part) {
            set_date_part(extension, part, TriState::Value(value));
        }
    }
    if kind.has_time() {
        if let Some(time) = parsed.time_of_day() {
            set_time(extension, TriState::Value(time));
        }
    }
}

/// Write a calendar component of an event. `Unset` is a no-op.
pub fn write_date_part(
    primitive: &mut Primitive<String>,
    kind: PartialKind,
    part: DatePart,
    input: TriState<u32>,
) {
    if input.is_unset() {
        return;
    }
    materialize_direct(primitive, kind);
    set_date_part(primitive.extension_or_insert(kind.url()), part, input);
}

/// Write the time-of-day of an event. `Unset`, and any write to a date-only event, is a no-op.
pub fn write_time(primitive: &mut Primitive<String>, kind: PartialKind, input: TriState<String>) {
    if input.is_unset() || !kind.has_time() {
        return;
    }
    materialize_direct(primitive, kind);
    set_time(primitive.extension_or_insert(kind.url()), input);
}

/// Parse a composite write, requiring at least a full date.
///
/// Malformed input yields `None`; callers treat that as a silent no-op.
pub fn parse_composite(raw: &str) -> Option<ParsedTimestamp> {
    let parsed = ParsedTimestamp::parse(raw).filter(|p| p.full_date().is_some());
    if parsed.is_none() {
        tracing::debug!(value = raw, "ignoring malformed timestamp");
    }
    parsed
}

/// Decompose a parsed composite into component writes.
///
/// Time is written only when the composite carried one, so a date-only write keeps any
/// time-of-day recorded earlier.
pub fn write_composite(primitive: &mut Primitive<String>, kind: PartialKind, parsed: &ParsedTimestamp) {
    let Some((year, month, day)) = parsed.full_date() else {
        return;
    };
    write_date_part(primitive, kind, DatePart::Year, TriState::Value(year));
    write_date_part(primitive, kind, DatePart::Month, TriState::Value(month));
    write_date_part(primitive, kind, DatePart::Day, TriState::Value(day));
    if let Some(time) = parsed.time_of_day() {
        write_time(primitive, kind, TriState::Value(time));
    }
}

/// The full-timestamp form of a pronouncement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PronouncementTimestamp {
    pub year: u32,
    pub month: u32,
    pub day: u32,
    pub time: Option<NaiveTime>,
}

impl PronouncementTimestamp {
    /// Stands in for date parts not yet recorded when a bare time is promoted.
    pub const FILLER: Self = Self {
        year: 1,
        month: 1,
        day: 1,
        time: None,
    };

    /// Decode a stored `YYYY-MM-DD[THH:MM[:SS]]`.
    ///
    /// Parts are range-checked one by one rather than as a calendar date, so a day that the
    /// filler year lacks (`0001-02-29`) still decodes and later year writes can complete it.
    pub fn decode(raw: &str) -> Option<Self> {
        if let Some(parsed) = ParsedTimestamp::parse(raw) {
            let (year, month, day) = parsed.full_date()?;
            return Some(Self {
                year,
                month,
                day,
                time: parsed.time,
            });
        }

        let raw = raw.trim();
        let (date, time) = match raw.split_once('T') {
            Some((date, time)) => (date, Some(parse_time(time)?)),
            None => (raw, None),
        };
        let mut fields = date.splitn(3, '-');
        let mut next = |part: DatePart, len: usize| {
            fields
                .next()
                .filter(|f| f.len() == len && f.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|f| f.parse::<u32>().ok())
                .filter(|value| part.accepts(*value))
        };
        Some(Self {
            year: next(DatePart::Year, 4)?,
            month: next(DatePart::Month, 2)?,
            day: next(DatePart::Day, 2)?,
            time,
        })
    }

    pub fn render(&self) -> String {
        let date = format!("{:04}-{:02}-{:02}", self.year, self.month, self.day);
        match self.time {
            Some(time) => format!("{date}T{}", format_time(time)),
            None => date,
        }
    }
}

/// A pronouncement of death: nothing yet, a bare time-of-day, or a full timestamp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PronouncementValue {
    #[default]
    Empty,
    Time(NaiveTime),
    Timestamp(PronouncementTimestamp),
}

impl PronouncementValue {
    /// Promote to a full timestamp.
    ///
    /// A bare time keeps its time-of-day on [`PronouncementTimestamp::FILLER`]'s date.
    pub fn promote(self) -> PronouncementTimestamp {
        match self {
            PronouncementValue::Empty => PronouncementTimestamp::FILLER,
            PronouncementValue::Time(time) => PronouncementTimestamp {
                time: Some(time),
                ..PronouncementTimestamp::FILLER
            },
            PronouncementValue::Timestamp(timestamp) => timestamp,
        }
    }

    /// Set a date part, promoting first.
    ///
    /// An out-of-range part yields `None` and the caller keeps the current value.
    pub fn with_date_part(self, part: DatePart, value: u32) -> Option<Self> {
        if !part.accepts(value) {
            tracing::debug!(?part, value, "ignoring out-of-range pronouncement date part");
            return None;
        }
        let mut timestamp = self.promote();
        match part {
            DatePart::Year => timestamp.year = value,
            DatePart::Month => timestamp.month = value,
            DatePart::Day => timestamp.day = value,
        }
        Some(PronouncementValue::Timestamp(timestamp))
    }

    /// Set the time-of-day. An untouched value becomes a bare time.
    pub fn with_time(self, time: NaiveTime) -> Self {
        match self {
            PronouncementValue::Empty | PronouncementValue::Time(_) => {
                PronouncementValue::Time(time)
            }
            PronouncementValue::Timestamp(timestamp) => {
                PronouncementValue::Timestamp(PronouncementTimestamp {
                    time: Some(time),
                    ..timestamp
                })
            }
        }
    }

    pub fn date_part(&self, part: DatePart) -> Option<u32> {
        match self {
            PronouncementValue::Timestamp(timestamp) => Some(match part {
                DatePart::Year => timestamp.year,
                DatePart::Month => timestamp.month,
                DatePart::Day => timestamp.day,
            }),
            _ => None,
        }
    }

    pub fn time_of_day(&self) -> Option<String> {
        match self {
            PronouncementValue::Empty => None,
            PronouncementValue::Time(time) => Some(format_time(*time)),
            PronouncementValue::Timestamp(timestamp) => timestamp.time.map(format_time),
        }
    }

    /// Parse a bare time (`HH:MM[:SS]`) or a timestamp with at least a full date.
    pub fn parse(raw: &str) -> Option<Self> {
        match parse_time(raw) {
            Some(time) => Some(PronouncementValue::Time(time)),
            None => Self::parse_timestamp(raw),
        }
    }

    fn parse_timestamp(raw: &str) -> Option<Self> {
        let parsed = ParsedTimestamp::parse(raw)?;
        let (year, month, day) = parsed.full_date()?;
        Some(PronouncementValue::Timestamp(PronouncementTimestamp {
            year,
            month,
            day,
            time: parsed.time,
        }))
    }

    pub fn render(&self) -> Option<String> {
        match self {
            PronouncementValue::Empty => None,
            PronouncementValue::Time(time) => Some(format_time(*time)),
            PronouncementValue::Timestamp(timestamp) => Some(timestamp.render()),
        }
    }

    /// Decode from a `valueTime` or `valueDateTime` node.
    pub fn from_value(value: Option<&Value>) -> Self {
        let decoded = match value {
            Some(Value::Time(primitive)) => primitive
                .value
                .as_deref()
                .and_then(parse_time)
                .map(PronouncementValue::Time),
            Some(Value::DateTime(primitive)) => primitive
                .value
                .as_deref()
                .and_then(PronouncementTimestamp::decode)
                .map(PronouncementValue::Timestamp),
            _ => None,
        };
        decoded.unwrap_or_default()
    }

    /// Encode as `valueTime` or `valueDateTime`. `Empty` has no node.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            PronouncementValue::Empty => None,
            PronouncementValue::Time(time) => Some(Value::Time(Primitive::new(format_time(*time)))),
            PronouncementValue::Timestamp(timestamp) => {
                Some(Value::DateTime(Primitive::new(timestamp.render())))
            }
        }
    }
}
