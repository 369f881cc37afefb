use thiserror::Error;

use crate::data::model::CategoricalField;

pub type EngineResult<T> = Result<T, EngineError>;

/// Input-shape failures: the request names something the schema cannot
/// satisfy. Empty results are not errors, see [`Outcome`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("unknown field: {0}")]
    UnknownField(String),
    #[error("field is not categorical: {0}")]
    NotCategorical(String),
    #[error("field is not numeric: {0}")]
    NotNumeric(String),
    #[error("invalid range for {field}: [{lo}, {hi}]")]
    InvalidRange { field: String, lo: f64, hi: f64 },
    #[error("field appears more than once in the flow order: {0}")]
    DuplicateFlowField(CategoricalField),
}

impl EngineError {
    pub fn unknown_field(name: impl Into<String>) -> Self {
        Self::UnknownField(name.into())
    }

    pub fn not_categorical(name: impl Into<String>) -> Self {
        Self::NotCategorical(name.into())
    }

    pub fn not_numeric(name: impl Into<String>) -> Self {
        Self::NotNumeric(name.into())
    }
}

/// A computation that either produced data or found nothing to work on.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ready(T),
    /// No rows survived filtering (or the missing-value drop that follows).
    Empty,
}

impl<T> Outcome<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Outcome::Empty)
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Outcome::Ready(value) => Some(value),
            Outcome::Empty => None,
        }
    }

    pub fn as_ref(&self) -> Outcome<&T> {
        match self {
            Outcome::Ready(value) => Outcome::Ready(value),
            Outcome::Empty => Outcome::Empty,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Ready(value) => Outcome::Ready(f(value)),
            Outcome::Empty => Outcome::Empty,
        }
    }
}
