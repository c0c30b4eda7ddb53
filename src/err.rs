//! Errors raised on malformed cohort input.

/// Input-shape errors; any of them aborts the whole run.
#[derive(thiserror::Error, Debug)]
pub enum InputError {
    #[error("cohort file contains no patients")]
    EmptyCohort,
    #[error("patient #{patient}: missing required field {field:?}")]
    MissingField { patient: usize, field: &'static str },
    #[error("patient #{patient}: invalid date of birth {value:?} (expected e.g. 05-Jan-99): {source}")]
    InvalidDate {
        patient: usize,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}
