#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("invalid race literal code: {0}")]
    InvalidRaceLiteral(String),

    #[error("invalid value set: {0}")]
    InvalidValueSet(String),

    #[error("document error: {0}")]
    Fhir(#[from] fhir::FhirError),
}

pub type RecordResult<T> = std::result::Result<T, RecordError>;
