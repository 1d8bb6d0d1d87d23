//! Error types for the Gantry template service

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GantryError {
    #[error("{entity} {id} does not exist")]
    NotFound { entity: String, id: String },

    #[error("{message}")]
    Forbidden { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("SCM error: {message}")]
    ScmError { message: String },

    #[error("Database error: {message}")]
    DatabaseError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("JWT error: {message}")]
    JwtError { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl GantryError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn scm_error(message: impl Into<String>) -> Self {
        Self::ScmError {
            message: message.into(),
        }
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::DatabaseError {
            message: message.into(),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn jwt_error(message: impl Into<String>) -> Self {
        Self::JwtError {
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GantryError>;
