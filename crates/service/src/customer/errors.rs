use thiserror::Error;

use super::validation::ValidationErrors;

/// Business errors for customer workflows
#[derive(Debug, Error)]
pub enum CustomerError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("email is already registered")]
    Conflict,
    #[error("invalid email or password")]
    Unauthorized,
    #[error("customer not found")]
    NotFound,
    #[error("hashing error: {0}")]
    HashError(String),
    #[error("token error: {0}")]
    TokenError(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl CustomerError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            CustomerError::Validation(_) => 1001,
            CustomerError::Conflict => 1002,
            CustomerError::NotFound => 1003,
            CustomerError::Unauthorized => 1004,
            CustomerError::HashError(_) => 1101,
            CustomerError::TokenError(_) => 1102,
            CustomerError::Repository(_) => 1200,
        }
    }
}

impl From<ValidationErrors> for CustomerError {
    fn from(e: ValidationErrors) -> Self {
        CustomerError::Validation(e)
    }
}

impl From<models::errors::ModelError> for CustomerError {
    fn from(e: models::errors::ModelError) -> Self {
        use models::errors::ModelError;
        match e {
            ModelError::Conflict(_) => CustomerError::Conflict,
            ModelError::Validation(msg) | ModelError::Db(msg) => CustomerError::Repository(msg),
        }
    }
}
