//! Runtime errors - single carrier for every failure the object model reports
//!
//! All failures surface synchronously to the immediate caller. Nothing in the
//! runtime retries or recovers; a failed operation leaves reference counts,
//! dict sizes and slot state exactly as they were.

use thiserror::Error;

/// Error raised by object, value, string and dict operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A string (or handle) was built from a null source pointer
    #[error("null pointer: {context}")]
    NullPointer { context: &'static str },

    /// `Any` converted to a type incompatible with its stored tag
    #[error("type mismatch: expected `{expected}`, got `{actual}`")]
    TypeMismatch { expected: String, actual: String },

    /// `UDict::at` found no entry equal to the key
    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    /// Runtime misuse, such as a null handle where non-null is required
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Malformed device or data type text
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid runtime configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// True for `NullPointer`
    pub fn is_null_pointer(&self) -> bool {
        matches!(self, Self::NullPointer { .. })
    }

    /// True for `TypeMismatch`
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. })
    }

    /// True for `KeyNotFound`
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. })
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
