use thiserror::Error;

/// Errors raised by the form core
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Field registry must contain at least one field")]
    EmptyRegistry,

    #[error("Duplicate field label: {0}")]
    DuplicateField(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field '{label}' expects a {expected} value")]
    KindMismatch { label: String, expected: &'static str },

    #[error("Invalid yes/no value for '{label}': {value}")]
    InvalidFlag { label: String, value: String },

    #[error("Missing required parameters: {}", .0.join(", "))]
    MissingMandatory(Vec<String>),

    #[error("Clipboard error: {0}")]
    Clipboard(String),
}

pub type Result<T> = std::result::Result<T, FormError>;
