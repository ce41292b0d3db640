use thiserror::Error;

use crate::fields::{CatalogVersion, FieldType};
use crate::filter::ComparisonOperator;

pub type AudienceResult<T> = Result<T, AudienceError>;

#[derive(Error, Debug)]
pub enum AudienceError {
    #[error("unknown field '{key}' in catalog {version}")]
    UnknownField {
        key: String,
        version: CatalogVersion,
    },

    #[error("operator '{operator}' is not valid for field '{key}' of type {field_type}")]
    TypeMismatch {
        key: String,
        field_type: FieldType,
        operator: ComparisonOperator,
    },

    #[error("invalid filter: {0}")]
    Validation(String),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AudienceError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        AudienceError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Short machine-readable code for the API error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AudienceError::UnknownField { .. } => "unknown_field",
            AudienceError::TypeMismatch { .. } => "type_mismatch",
            AudienceError::Validation(_) => "validation_error",
            AudienceError::NotFound { .. } => "not_found",
            AudienceError::Config(_) => "config_error",
            AudienceError::Serialization(_) => "serialization_error",
        }
    }
}
