//! Configuration types for request logging
//!
//! Two layers: `*Properties` types mirror the file format (HCL or TOML) and
//! keep list fields optional so an explicit `null` can be told apart from an
//! omitted field; `LoggingConfig` is the validated, immutable policy the
//! interceptor consumes.

mod mask;
mod side;
mod status;

pub use mask::{MaskProperties, MaskRule};
pub use side::{
    RequestConfig, RequestProperties, ResponseConfig, ResponseProperties, SideFilters,
    DEFAULT_CONTENT_TYPES, DEFAULT_MAX_PAYLOAD_SIZE,
};
pub use status::StatusCodeClass;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{LoggingError, Result};

/// Top-level logging configuration, file shape
///
/// # HCL Example
///
/// ```hcl
/// enabled      = true
/// status_codes = ["4xx", "5xx"]
///
/// request {
///   include_ip_address = true
///   max_payload_size   = 2048
///   masks = [
///     { path_matcher = "/users/**", masked_json_fields = ["password"] }
///   ]
/// }
///
/// response {
///   white_listed_servlet_paths = ["/api/**"]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingProperties {
    /// Master switch
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log elapsed time after each exchange
    #[serde(default = "default_true")]
    pub include_time_elapsed: bool,

    /// Response status classes that produce a log entry
    #[serde(default = "default_status_codes")]
    pub status_codes: Option<Vec<StatusCodeClass>>,

    /// Request side settings
    #[serde(default)]
    pub request: RequestProperties,

    /// Response side settings
    #[serde(default)]
    pub response: ResponseProperties,
}

fn default_true() -> bool {
    true
}

fn default_status_codes() -> Option<Vec<StatusCodeClass>> {
    Some(vec![StatusCodeClass::Any])
}

impl Default for LoggingProperties {
    fn default() -> Self {
        Self {
            enabled: true,
            include_time_elapsed: true,
            status_codes: default_status_codes(),
            request: RequestProperties::default(),
            response: ResponseProperties::default(),
        }
    }
}

impl LoggingProperties {
    /// Load properties from a file; `.toml` files are parsed as TOML,
    /// everything else as HCL.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Reading logging config");
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&content),
            _ => Self::from_hcl(&content),
        }
    }

    /// Parse properties from an HCL string
    pub fn from_hcl(content: &str) -> Result<Self> {
        Ok(hcl::from_str(content)?)
    }

    /// Parse properties from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate and freeze into a `LoggingConfig`
    pub fn into_config(self) -> Result<LoggingConfig> {
        LoggingConfig::try_from(self)
    }

    /// Check the load-time invariants without consuming the properties
    pub fn validate(&self) -> Result<()> {
        LoggingConfig::try_from(self.clone()).map(|_| ())
    }
}

/// Validated logging policy
///
/// Only obtainable through `LoggingConfig::try_from(LoggingProperties)`, so
/// every instance satisfies the load-time invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct LoggingConfig {
    pub enabled: bool,
    pub include_time_elapsed: bool,
    /// Never empty
    pub status_codes: Vec<StatusCodeClass>,
    pub request: RequestConfig,
    pub response: ResponseConfig,
}

impl TryFrom<LoggingProperties> for LoggingConfig {
    type Error = LoggingError;

    fn try_from(props: LoggingProperties) -> Result<Self> {
        let status_codes = match props.status_codes {
            Some(codes) if !codes.is_empty() => codes,
            _ => {
                return Err(LoggingError::Config(
                    "Status codes cannot be null or empty".to_string(),
                ))
            }
        };

        let config = Self {
            enabled: props.enabled,
            include_time_elapsed: props.include_time_elapsed,
            status_codes,
            request: RequestConfig::try_from(props.request)?,
            response: ResponseConfig::try_from(props.response)?,
        };

        tracing::debug!(
            enabled = config.enabled,
            status_codes = ?config.status_codes,
            request_masks = config.request.filters.masks.len(),
            response_masks = config.response.filters.masks.len(),
            "Logging configuration validated"
        );

        Ok(config)
    }
}
