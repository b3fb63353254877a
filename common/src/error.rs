use thiserror::Error;

use crate::types::{EventKind, Outcome};

/// Rejection of a submitted event before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("invalid value {value:?} for field `{field}`")]
    InvalidValue { field: &'static str, value: String },

    #[error("outcome `{outcome}` is not valid for a {kind} event")]
    OutcomeMismatch { kind: EventKind, outcome: Outcome },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField(field) => field,
            ValidationError::InvalidValue { field, .. } => field,
            ValidationError::OutcomeMismatch { .. } => "outcome",
        }
    }
}
