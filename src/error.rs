//! Centralized error types for request logging

use thiserror::Error;

/// Request logging error types
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Configuration is missing, malformed, or violates a policy invariant
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HCL parse error
    #[error("HCL parse error: {0}")]
    Hcl(#[from] hcl::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, LoggingError>;
