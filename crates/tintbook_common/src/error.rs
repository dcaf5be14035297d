// --- File: crates/tintbook_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The base error type for all Tintbook errors.
///
/// This enum provides a common set of error variants that can be used across all crates.
/// Each crate can extend this by implementing From<SpecificError> for TintbookError.
#[derive(Error, Debug)]
pub enum TintbookError {
    /// Error occurred during validation of caller input
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error occurred due to a conflict (e.g., slot already booked)
    #[error("Conflict: {0}")]
    ConflictError(String),

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Error occurred due to an illegal reservation lifecycle change
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// Error occurred due to missing or inconsistent configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred during authentication or authorization
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred during an HTTP request
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Error occurred during a storage operation
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Error occurred during external service call
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
///
/// This trait can be implemented by error types to provide a consistent way
/// to convert errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for TintbookError {
    fn status_code(&self) -> u16 {
        match self {
            TintbookError::ValidationError(_) => 400,
            TintbookError::ConflictError(_) => 409,
            TintbookError::NotFoundError(_) => 404,
            TintbookError::InvalidStateTransition(_) => 422,
            TintbookError::ConfigError(_) => 500,
            TintbookError::AuthError(_) => 401,
            TintbookError::ParseError(_) => 400,
            TintbookError::HttpError(_) => 500,
            TintbookError::DatabaseError(_) => 500,
            TintbookError::ExternalServiceError { .. } => 502,
            TintbookError::InternalError(_) => 500,
        }
    }
}

// Common error conversions
impl From<reqwest::Error> for TintbookError {
    fn from(err: reqwest::Error) -> Self {
        TintbookError::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for TintbookError {
    fn from(err: serde_json::Error) -> Self {
        TintbookError::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for TintbookError {
    fn from(err: std::io::Error) -> Self {
        TintbookError::InternalError(err.to_string())
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> TintbookError {
    TintbookError::ConfigError(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> TintbookError {
    TintbookError::ValidationError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> TintbookError {
    TintbookError::NotFoundError(message.to_string())
}

pub fn conflict<T: fmt::Display>(message: T) -> TintbookError {
    TintbookError::ConflictError(message.to_string())
}

pub fn external_service_error<T: fmt::Display>(service_name: &str, message: T) -> TintbookError {
    TintbookError::ExternalServiceError {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}

pub fn internal_error<T: fmt::Display>(message: T) -> TintbookError {
    TintbookError::InternalError(message.to_string())
}
