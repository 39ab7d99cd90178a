use crate::schema::validate::ValidationErrors;
use thiserror::Error;

/// Error types for the taxparams-rs library.
#[derive(Error, Debug)]
pub enum TaxParamsError {
    /// The adjustment payload does not have the expected scalar/sequence shape.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The operation is not allowed for the named parameter.
    #[error("Invalid operation on parameter '{param}': {reason}")]
    InvalidOperation { param: String, reason: String },

    /// One or more values failed schema validation.
    #[error("Validation failed:\n{0}")]
    Validation(ValidationErrors),

    /// Parameter not found.
    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    /// The parameter definitions are inconsistent.
    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),

    /// A growth rate could not be produced for a year.
    #[error("Rate unavailable: {0}")]
    RateUnavailable(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<ValidationErrors> for TaxParamsError {
    fn from(errors: ValidationErrors) -> Self {
        TaxParamsError::Validation(errors)
    }
}

impl TaxParamsError {
    pub(crate) fn invalid_operation(param: &str, reason: impl Into<String>) -> Self {
        TaxParamsError::InvalidOperation {
            param: param.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for taxparams-rs operations.
pub type Result<T> = std::result::Result<T, TaxParamsError>;
