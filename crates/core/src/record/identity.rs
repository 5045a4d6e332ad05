use super::DeathRecord;
use crate::constants::{CERTIFICATE_NUMBER_URL, RECORD_IDENTIFIER_SYSTEM};
use crate::identifier::IdentifierSources;
use fhir::{HasExtensions, Value};

impl DeathRecord {
    /// The jurisdiction-assigned certificate number.
    pub fn certificate_number(&self) -> Option<&str> {
        self.bundle
            .identifier
            .find_extension(CERTIFICATE_NUMBER_URL)?
            .value
            .as_ref()?
            .as_str()
    }

    /// Set the certificate number and recompose the record identifier. Blank input is ignored.
    pub fn set_certificate_number(&mut self, certificate_number: &str) {
        let certificate_number = certificate_number.trim();
        if certificate_number.is_empty() {
            return;
        }
        self.bundle
            .identifier
            .extension_or_insert(CERTIFICATE_NUMBER_URL)
            .value = Some(Value::string(certificate_number));
        self.refresh_record_identifier();
    }

    /// The derived `YYYYJJNNNNNN` record identifier.
    pub fn death_record_identifier(&self) -> Option<&str> {
        self.bundle.identifier.value.as_deref()
    }

    pub(crate) fn refresh_record_identifier(&mut self) {
        let identifier = IdentifierSources {
            certificate_number: self.certificate_number(),
            death_year: self.death_year().into_value(),
            jurisdiction: self.death_location_jurisdiction(),
        }
        .compose();

        if self.death_record_identifier() != Some(identifier.as_str()) {
            tracing::debug!(%identifier, "recomputed death record identifier");
        }
        self.bundle.identifier.system = Some(RECORD_IDENTIFIER_SYSTEM.to_string());
        self.bundle.identifier.value = Some(identifier);
    }
}
