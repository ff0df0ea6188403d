//! Error types for Planitry
//!
//! All errors use thiserror for structured error handling.
//! `AppError` covers local storage and setup; `NetworkError` covers the
//! recipe search API and is what the UI turns into an alert.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("{0}")]
    Generic(String),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Failures of a recipe search call.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("The API URL could not be constructed correctly.")]
    InvalidUrl,

    #[error("The search request is invalid: {0}")]
    InvalidRequest(String),

    #[error("{}", describe_status(.0))]
    InvalidResponse(Option<u16>),

    #[error("Failed to decode recipe data: {0}")]
    Decoding(#[source] serde_json::Error),

    #[error("Your search criteria were too restrictive. No recipes were found.")]
    NoResultsFound,
}

fn describe_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(
            "The server returned an error (Status Code: {}). This often means invalid API keys or a problematic query.",
            code
        ),
        None => "The server returned an invalid response.".to_string(),
    }
}

impl NetworkError {
    /// Short machine-readable name, used for the fetch status and in logs
    pub fn kind(&self) -> NetworkErrorKind {
        match self {
            NetworkError::InvalidUrl => NetworkErrorKind::InvalidUrl,
            NetworkError::InvalidRequest(_) => NetworkErrorKind::InvalidRequest,
            NetworkError::InvalidResponse(status) => NetworkErrorKind::InvalidResponse(*status),
            NetworkError::Decoding(_) => NetworkErrorKind::Decoding,
            NetworkError::NoResultsFound => NetworkErrorKind::NoResultsFound,
        }
    }
}

impl serde::Serialize for NetworkError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Copyable mirror of `NetworkError` without the payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    InvalidUrl,
    InvalidRequest,
    InvalidResponse(Option<u16>),
    Decoding,
    NoResultsFound,
}
