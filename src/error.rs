// src/error.rs

//! Unified error handling for the monitor.
//!
//! `Fetch`, `Parse` and `Delivery` are the per-source failures the poll cycle
//! recovers from. Everything else surfaces while loading configuration or
//! building collaborators, before the scheduler starts.

use std::fmt;

use thiserror::Error;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Signal could not be fetched (network, status, missing element, timeout)
    #[error("Fetch error for {source_id}: {message}")]
    Fetch { source_id: String, message: String },

    /// Fetched text did not contain a count
    #[error("Parse error: could not extract a count from '{text}'")]
    Parse { text: String },

    /// Notification could not be delivered
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a fetch error for a source.
    pub fn fetch(source_id: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            source_id: source_id.into(),
            message: message.to_string(),
        }
    }

    /// Create a parse error carrying the offending text.
    pub fn parse(text: impl Into<String>) -> Self {
        Self::Parse { text: text.into() }
    }

    /// Create a delivery error.
    pub fn delivery(message: impl fmt::Display) -> Self {
        Self::Delivery(message.to_string())
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
