//! Request and response side configuration

use super::mask::{MaskProperties, MaskRule};
use crate::error::{LoggingError, Result};
use serde::{Deserialize, Serialize};

/// Content types whose bodies are logged when no list is configured
pub const DEFAULT_CONTENT_TYPES: [&str; 5] = [
    "application/json",
    "application/x-www-form-urlencoded",
    "text/plain",
    "text/xml",
    "application/xml",
];

/// Default cut-off for logged bodies, in bytes
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 4096;

fn default_true() -> bool {
    true
}

fn default_max_payload_size() -> usize {
    DEFAULT_MAX_PAYLOAD_SIZE
}

fn default_content_types() -> Option<Vec<String>> {
    Some(DEFAULT_CONTENT_TYPES.iter().map(|s| s.to_string()).collect())
}

fn empty_list() -> Option<Vec<String>> {
    Some(Vec::new())
}

fn empty_masks() -> Option<Vec<MaskProperties>> {
    Some(Vec::new())
}

/// Request logging settings as they appear in a configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestProperties {
    /// If false, no request is logged
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// If false, request headers are not logged
    #[serde(default = "default_true")]
    pub include_headers: bool,

    /// If false, request bodies are not captured
    #[serde(default = "default_true")]
    pub include_payload: bool,

    /// If false, query params are not logged
    #[serde(default = "default_true")]
    pub include_query_params: bool,

    /// If true, principal and session id are logged
    #[serde(default)]
    pub include_client_info: bool,

    /// If true, the remote address is logged
    #[serde(default)]
    pub include_ip_address: bool,

    /// Size where the logged body is cut
    #[serde(default = "default_max_payload_size")]
    pub max_payload_size: usize,

    /// Content types whose body is logged
    #[serde(default = "default_content_types")]
    pub white_listed_content_types: Option<Vec<String>>,

    /// Content types whose body is never logged
    #[serde(default = "empty_list")]
    pub black_listed_content_types: Option<Vec<String>>,

    /// Path patterns where requests are logged
    #[serde(default = "empty_list")]
    pub white_listed_servlet_paths: Option<Vec<String>>,

    /// Path patterns where requests are not logged
    #[serde(default = "empty_list")]
    pub black_listed_servlet_paths: Option<Vec<String>>,

    /// Redaction rules for requests
    #[serde(default = "empty_masks")]
    pub masks: Option<Vec<MaskProperties>>,
}

impl Default for RequestProperties {
    fn default() -> Self {
        Self {
            enabled: true,
            include_headers: true,
            include_payload: true,
            include_query_params: true,
            include_client_info: false,
            include_ip_address: false,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            white_listed_content_types: default_content_types(),
            black_listed_content_types: empty_list(),
            white_listed_servlet_paths: empty_list(),
            black_listed_servlet_paths: empty_list(),
            masks: empty_masks(),
        }
    }
}

/// Response logging settings as they appear in a configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseProperties {
    /// If false, no response is logged
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// If false, response headers are not logged
    #[serde(default = "default_true")]
    pub include_headers: bool,

    /// If false, response bodies are not captured
    #[serde(default = "default_true")]
    pub include_payload: bool,

    /// Size where the logged body is cut
    #[serde(default = "default_max_payload_size")]
    pub max_payload_size: usize,

    /// Content types whose body is logged
    #[serde(default = "default_content_types")]
    pub white_listed_content_types: Option<Vec<String>>,

    /// Content types whose body is never logged
    #[serde(default = "empty_list")]
    pub black_listed_content_types: Option<Vec<String>>,

    /// Path patterns where responses are logged
    #[serde(default = "empty_list")]
    pub white_listed_servlet_paths: Option<Vec<String>>,

    /// Path patterns where responses are not logged
    #[serde(default = "empty_list")]
    pub black_listed_servlet_paths: Option<Vec<String>>,

    /// Redaction rules for responses
    #[serde(default = "empty_masks")]
    pub masks: Option<Vec<MaskProperties>>,
}

impl Default for ResponseProperties {
    fn default() -> Self {
        Self {
            enabled: true,
            include_headers: true,
            include_payload: true,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            white_listed_content_types: default_content_types(),
            black_listed_content_types: empty_list(),
            white_listed_servlet_paths: empty_list(),
            black_listed_servlet_paths: empty_list(),
            masks: empty_masks(),
        }
    }
}

/// Filters shared by both sides of an exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideFilters {
    pub max_payload_size: usize,
    pub white_listed_content_types: Vec<String>,
    pub black_listed_content_types: Vec<String>,
    pub white_listed_servlet_paths: Vec<String>,
    pub black_listed_servlet_paths: Vec<String>,
    pub masks: Vec<MaskRule>,
}

impl SideFilters {
    #[allow(clippy::too_many_arguments)]
    fn validate(
        side: &str,
        max_payload_size: usize,
        white_listed_content_types: Option<Vec<String>>,
        black_listed_content_types: Option<Vec<String>>,
        white_listed_servlet_paths: Option<Vec<String>>,
        black_listed_servlet_paths: Option<Vec<String>>,
        masks: Option<Vec<MaskProperties>>,
    ) -> Result<Self> {
        if max_payload_size == 0 {
            return Err(LoggingError::Config(format!(
                "{} max_payload_size must be greater than 0",
                side
            )));
        }
        let white_listed_content_types = required(
            white_listed_content_types,
            "White listed content types cannot be null, empty array required",
        )?;
        let black_listed_content_types = required(
            black_listed_content_types,
            "Black listed content types cannot be null, empty array required",
        )?;
        let white_listed_servlet_paths = required(
            white_listed_servlet_paths,
            "White listed servlet paths cannot be null, empty array required",
        )?;
        let black_listed_servlet_paths = required(
            black_listed_servlet_paths,
            "Black listed servlet paths cannot be null, empty array required",
        )?;
        let masks = required(masks, "Masks cannot be null, empty array required")?;

        if !white_listed_content_types.is_empty() && !black_listed_content_types.is_empty() {
            return Err(LoggingError::Config(format!(
                "{}: you cannot set black list together with white list for content types",
                side
            )));
        }

        let masks = masks
            .into_iter()
            .map(MaskRule::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            max_payload_size,
            white_listed_content_types,
            black_listed_content_types,
            white_listed_servlet_paths,
            black_listed_servlet_paths,
            masks,
        })
    }
}

fn required<T>(value: Option<Vec<T>>, message: &str) -> Result<Vec<T>> {
    value.ok_or_else(|| LoggingError::Config(message.to_string()))
}

/// Validated request-side settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    pub enabled: bool,
    pub include_headers: bool,
    pub include_payload: bool,
    pub include_query_params: bool,
    pub include_client_info: bool,
    pub include_ip_address: bool,
    pub filters: SideFilters,
}

impl TryFrom<RequestProperties> for RequestConfig {
    type Error = LoggingError;

    fn try_from(props: RequestProperties) -> Result<Self> {
        let filters = SideFilters::validate(
            "request",
            props.max_payload_size,
            props.white_listed_content_types,
            props.black_listed_content_types,
            props.white_listed_servlet_paths,
            props.black_listed_servlet_paths,
            props.masks,
        )?;
        Ok(Self {
            enabled: props.enabled,
            include_headers: props.include_headers,
            include_payload: props.include_payload,
            include_query_params: props.include_query_params,
            include_client_info: props.include_client_info,
            include_ip_address: props.include_ip_address,
            filters,
        })
    }
}

/// Validated response-side settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseConfig {
    pub enabled: bool,
    pub include_headers: bool,
    pub include_payload: bool,
    pub filters: SideFilters,
}

impl TryFrom<ResponseProperties> for ResponseConfig {
    type Error = LoggingError;

    fn try_from(props: ResponseProperties) -> Result<Self> {
        let filters = SideFilters::validate(
            "response",
            props.max_payload_size,
            props.white_listed_content_types,
            props.black_listed_content_types,
            props.white_listed_servlet_paths,
            props.black_listed_servlet_paths,
            props.masks,
        )?;
        Ok(Self {
            enabled: props.enabled,
            include_headers: props.include_headers,
            include_payload: props.include_payload,
            filters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let props: RequestProperties = toml::from_str("").unwrap();
        let config = RequestConfig::try_from(props).unwrap();
        assert!(config.enabled);
        assert!(config.include_headers);
        assert!(config.include_payload);
        assert!(config.include_query_params);
        assert!(!config.include_client_info);
        assert!(!config.include_ip_address);
        assert_eq!(config.filters.max_payload_size, 4096);
        assert_eq!(config.filters.white_listed_content_types.len(), 5);
        assert!(config.filters.black_listed_content_types.is_empty());
        assert!(config.filters.masks.is_empty());
    }

    #[test]
    fn test_response_defaults_match_struct_default() {
        let parsed: ResponseProperties = toml::from_str("").unwrap();
        let from_file = ResponseConfig::try_from(parsed).unwrap();
        let from_default = ResponseConfig::try_from(ResponseProperties::default()).unwrap();
        assert_eq!(from_file, from_default);
    }

    #[test]
    fn test_zero_payload_size_rejected() {
        let props = RequestProperties {
            max_payload_size: 0,
            ..Default::default()
        };
        let err = RequestConfig::try_from(props).unwrap_err();
        assert!(err.to_string().contains("max_payload_size"));
    }

    #[test]
    fn test_white_and_black_content_types_rejected() {
        let props = ResponseProperties {
            black_listed_content_types: Some(vec!["image/png".to_string()]),
            ..Default::default()
        };
        let err = ResponseConfig::try_from(props).unwrap_err();
        assert!(err.to_string().contains("black list together with white list"));
    }

    #[test]
    fn test_black_list_alone_accepted() {
        let props = ResponseProperties {
            white_listed_content_types: Some(vec![]),
            black_listed_content_types: Some(vec!["image/png".to_string()]),
            ..Default::default()
        };
        let config = ResponseConfig::try_from(props).unwrap();
        assert_eq!(config.filters.black_listed_content_types, vec!["image/png"]);
    }

    #[test]
    fn test_null_lists_rejected() {
        let props = RequestProperties {
            white_listed_servlet_paths: None,
            ..Default::default()
        };
        assert!(RequestConfig::try_from(props).is_err());

        let props = RequestProperties {
            masks: None,
            ..Default::default()
        };
        let err = RequestConfig::try_from(props).unwrap_err();
        assert!(err.to_string().contains("Masks cannot be null"));
    }

    #[test]
    fn test_invalid_mask_propagates() {
        let props = RequestProperties {
            masks: Some(vec![MaskProperties::default()]),
            ..Default::default()
        };
        assert!(RequestConfig::try_from(props).is_err());
    }
}
