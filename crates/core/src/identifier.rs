//! Derived record identifier.
//!
//! The record identifier is `YYYY` + `JJ` + `NNNNNN`: death year, two-letter jurisdiction and
//! certificate number. It is never set directly, only recomposed from its sources.

const UNKNOWN_YEAR: u32 = 0;
const UNKNOWN_JURISDICTION: &str = "XX";
const UNKNOWN_CERTIFICATE: u32 = 0;
const MAX_YEAR: u32 = 9_999;
const MAX_CERTIFICATE: u32 = 999_999;

/// The three fields the identifier is derived from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IdentifierSources<'a> {
    pub certificate_number: Option<&'a str>,
    pub death_year: Option<u32>,
    pub jurisdiction: Option<&'a str>,
}

impl IdentifierSources<'_> {
    /// Build the identifier, substituting placeholders for missing sources.
    ///
    /// The result is always 12 characters: a year above 9999 or a certificate number above
    /// 999999 does not fit its field and is replaced by the placeholder.
    pub fn compose(&self) -> String {
        let year = self
            .death_year
            .filter(|year| *year <= MAX_YEAR)
            .unwrap_or(UNKNOWN_YEAR);
        let jurisdiction = self
            .jurisdiction
            .map(|j| j.trim().to_uppercase().chars().take(2).collect::<String>())
            .filter(|j| j.chars().count() == 2)
            .unwrap_or_else(|| UNKNOWN_JURISDICTION.to_string());
        let certificate = self
            .certificate_number
            .and_then(|n| n.trim().parse::<u32>().ok())
            .filter(|n| *n <= MAX_CERTIFICATE)
            .unwrap_or(UNKNOWN_CERTIFICATE);

        format!("{year:04}{jurisdiction}{certificate:06}")
    }
}
