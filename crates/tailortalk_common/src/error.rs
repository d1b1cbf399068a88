use std::fmt;
use thiserror::Error;

/// The base error type surfaced at the HTTP boundary.
///
/// Each crate keeps its own error enum and implements `From<CrateError> for TailorError`
/// so handlers can return a uniform JSON error body.
#[derive(Error, Debug)]
pub enum TailorError {
    /// Error occurred during an HTTP request
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred during validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error occurred during external service call
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// Error occurred due to a conflict (e.g., slot already taken)
    #[error("Conflict: {0}")]
    ConflictError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for TailorError {
    fn status_code(&self) -> u16 {
        match self {
            TailorError::HttpError(_) => 500,
            TailorError::ParseError(_) => 400,
            TailorError::ConfigError(_) => 500,
            TailorError::ValidationError(_) => 400,
            TailorError::ExternalServiceError { .. } => 502,
            TailorError::ConflictError(_) => 409,
            TailorError::InternalError(_) => 500,
        }
    }
}

// Common error conversions
impl From<reqwest::Error> for TailorError {
    fn from(err: reqwest::Error) -> Self {
        TailorError::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for TailorError {
    fn from(err: serde_json::Error) -> Self {
        TailorError::ParseError(err.to_string())
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> TailorError {
    TailorError::ConfigError(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> TailorError {
    TailorError::ValidationError(message.to_string())
}

pub fn external_service_error<T: fmt::Display>(service_name: &str, message: T) -> TailorError {
    TailorError::ExternalServiceError {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}

pub fn internal_error<T: fmt::Display>(message: T) -> TailorError {
    TailorError::InternalError(message.to_string())
}
