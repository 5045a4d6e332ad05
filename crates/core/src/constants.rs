//! Constants used throughout the death record engine.
//!
//! This module collects every profile URL, extension URL, code system and fixed code so that
//! document layout decisions live in one place.

// Profiles tagging each resource of the record bundle.

pub const DECEDENT_PROFILE: &str = "http://hl7.org/fhir/us/vrdr/StructureDefinition/vrdr-decedent";
pub const DEATH_DATE_PROFILE: &str =
    "http://hl7.org/fhir/us/vrdr/StructureDefinition/vrdr-death-date";
pub const INJURY_INCIDENT_PROFILE: &str =
    "http://hl7.org/fhir/us/vrdr/StructureDefinition/vrdr-injury-incident";
pub const SURGERY_DATE_PROFILE: &str =
    "http://hl7.org/fhir/us/vrdr/StructureDefinition/vrdr-surgery-date";
pub const DECEDENT_AGE_PROFILE: &str =
    "http://hl7.org/fhir/us/vrdr/StructureDefinition/vrdr-decedent-age";
pub const MANNER_OF_DEATH_PROFILE: &str =
    "http://hl7.org/fhir/us/vrdr/StructureDefinition/vrdr-manner-of-death";
pub const EDUCATION_LEVEL_PROFILE: &str =
    "http://hl7.org/fhir/us/vrdr/StructureDefinition/vrdr-decedent-education-level";
pub const DEATH_LOCATION_PROFILE: &str =
    "http://hl7.org/fhir/us/vrdr/StructureDefinition/vrdr-death-location";
pub const INPUT_RACE_PROFILE: &str =
    "http://hl7.org/fhir/us/vrdr/StructureDefinition/vrdr-input-race-and-ethnicity";

// Extensions.

pub const PARTIAL_DATE_URL: &str = "http://hl7.org/fhir/us/vrdr/StructureDefinition/PartialDate";
pub const PARTIAL_DATE_TIME_URL: &str =
    "http://hl7.org/fhir/us/vrdr/StructureDefinition/PartialDateTime";
pub const DATE_YEAR_URL: &str = "date-year";
pub const DATE_MONTH_URL: &str = "date-month";
pub const DATE_DAY_URL: &str = "date-day";
pub const DATE_TIME_URL: &str = "date-time";
pub const BYPASS_EDIT_FLAG_URL: &str =
    "http://hl7.org/fhir/us/vrdr/StructureDefinition/BypassEditFlag";
pub const CERTIFICATE_NUMBER_URL: &str =
    "http://hl7.org/fhir/us/vrdr/StructureDefinition/CertificateNumber";
pub const JURISDICTION_ID_URL: &str =
    "http://hl7.org/fhir/us/vrdr/StructureDefinition/Location-Jurisdiction-Id";
pub const SEX_AT_DEATH_URL: &str = "http://hl7.org/fhir/us/vrdr/StructureDefinition/NVSS-SexAtDeath";

// Code systems.

pub const LOINC_SYSTEM: &str = "http://loinc.org";
pub const UCUM_SYSTEM: &str = "http://unitsofmeasure.org";
pub const NULL_FLAVOR_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v3-NullFlavor";
pub const OBSERVATIONS_SYSTEM: &str =
    "http://hl7.org/fhir/us/vrdr/CodeSystem/vrdr-observations-cs";
pub const COMPONENT_SYSTEM: &str = "http://hl7.org/fhir/us/vrdr/CodeSystem/vrdr-component-cs";
pub const RECORD_IDENTIFIER_SYSTEM: &str = "http://nchs.cdc.gov/vrdr_id";

// Observation and component codes.

pub const DEATH_DATE_CODE: (&str, &str) = ("81956-5", "Date+time of death");
pub const PRONOUNCEMENT_CODE: (&str, &str) = ("80616-6", "Date and time pronounced dead");
pub const INJURY_INCIDENT_CODE: (&str, &str) = ("11374-6", "Injury incident description");
pub const SURGERY_DATE_CODE: (&str, &str) = ("80992-1", "Date and time of surgery");
pub const DECEDENT_AGE_CODE: (&str, &str) = ("39016-1", "Age at death");
pub const MANNER_OF_DEATH_CODE: (&str, &str) = ("69449-7", "Manner of death");
pub const EDUCATION_LEVEL_CODE: (&str, &str) = ("80913-7", "Highest level of education");
pub const INPUT_RACE_CODE: (&str, &str) = ("inputraceandethnicity", "Input Race and Ethnicity");

// Null-flavor sentinels.

pub const OTHER_CODE: &str = "OTH";
pub const OTHER_DISPLAY: &str = "Other";
pub const UNKNOWN_CODE: &str = "UNK";
pub const UNKNOWN_DISPLAY: &str = "unknown";

// Jurisdictions.

/// New York City reports as its own jurisdiction but sits inside the state of New York.
pub const NEW_YORK_CITY_JURISDICTION: &str = "YC";
pub const NEW_YORK_STATE: &str = "NY";
