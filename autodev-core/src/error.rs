//! Error types for the AutoDev client.

use std::{error::Error, fmt};

/// Error type for audit API operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutodevError {
    /// The request never reached the server or no response arrived.
    Network(String),
    /// The server answered with a non-success status.
    Server {
        /// HTTP status code.
        status: u16,
        /// Server-supplied `detail` text, if any.
        detail: Option<String>,
    },
    /// The response body did not match the expected shape.
    Decode(String),
    /// Input was rejected before any request was issued.
    Validation(String),
}

impl AutodevError {
    /// Human-readable detail suitable for showing to a user.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Server { detail, .. } => detail.as_deref(),
            Self::Validation(message) => Some(message),
            Self::Network(_) | Self::Decode(_) => None,
        }
    }

    /// HTTP status for server errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// The detail text, or `fallback` when the error carries none.
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail().unwrap_or(fallback).to_string()
    }
}

impl fmt::Display for AutodevError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(message) => write!(f, "network error: {message}"),
            Self::Server {
                status,
                detail: Some(detail),
            } => write!(f, "server error ({status}): {detail}"),
            Self::Server {
                status,
                detail: None,
            } => write!(f, "server error ({status})"),
            Self::Decode(message) => write!(f, "invalid response: {message}"),
            Self::Validation(message) => write!(f, "{message}"),
        }
    }
}

impl Error for AutodevError {}

/// Convenience result type for AutoDev operations.
pub type Result<T> = std::result::Result<T, AutodevError>;
