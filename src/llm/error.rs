//! Generation backend errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors that can occur while talking to the generation agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BackendError {
    /// API request failed with the given message
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    /// Credentials are missing or were rejected
    AuthenticationError { message: String },

    /// Request timed out after the specified duration (in seconds)
    TimeoutError { seconds: u64 },

    /// The backend answered but the answer carried no usable message
    EmptyResponse,

    /// Configuration error (unknown provider, bad endpoint, etc.)
    ConfigurationError { message: String },

    /// Generic error for other cases
    Other { message: String },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::ApiError {
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "API error ({}): {}", code, message)
                } else {
                    write!(f, "API error: {}", message)
                }
            }
            BackendError::AuthenticationError { message } => {
                write!(f, "Authentication failed: {}", message)
            }
            BackendError::TimeoutError { seconds } => {
                write!(f, "Request timed out after {} seconds", seconds)
            }
            BackendError::EmptyResponse => write!(f, "Backend returned an empty response"),
            BackendError::ConfigurationError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            BackendError::Other { message } => write!(f, "Error: {}", message),
        }
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_with_status() {
        let err = BackendError::ApiError {
            message: "rate limited".to_string(),
            status_code: Some(429),
        };
        assert_eq!(err.to_string(), "API error (429): rate limited");
    }

    #[test]
    fn test_timeout_display() {
        let err = BackendError::TimeoutError { seconds: 90 };
        assert!(err.to_string().contains("90 seconds"));
    }
}
