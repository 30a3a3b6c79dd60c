//! Policy evaluator: decides whether to log, capture and emit
//!
//! Every decision is a total function of the validated configuration and
//! request/response metadata: absent content types and unresolved status
//! codes produce a definite answer, never an error.

use crate::config::{LoggingConfig, SideFilters, StatusCodeClass};
use crate::matcher;
use http::{Method, StatusCode};
use std::sync::Arc;

/// Logging policy over an immutable configuration
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    config: Arc<LoggingConfig>,
}

impl PolicyEvaluator {
    /// Create an evaluator over a validated configuration
    pub fn new(config: Arc<LoggingConfig>) -> Self {
        Self { config }
    }

    /// The configuration this evaluator reads
    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }

    /// Whether the request side of an exchange on `path` is logged
    pub fn should_log_request(&self, path: &str) -> bool {
        let request = &self.config.request;
        self.config.enabled
            && request.enabled
            && path_enabled(
                path,
                &request.filters.white_listed_servlet_paths,
                &request.filters.black_listed_servlet_paths,
            )
    }

    /// Whether the response side of an exchange on `path` is logged
    pub fn should_log_response(&self, path: &str) -> bool {
        let response = &self.config.response;
        self.config.enabled
            && response.enabled
            && path_enabled(
                path,
                &response.filters.white_listed_servlet_paths,
                &response.filters.black_listed_servlet_paths,
            )
    }

    /// Whether the request body is captured for logging
    pub fn should_capture_request_body(
        &self,
        path: &str,
        method: &Method,
        content_type: Option<&str>,
    ) -> bool {
        if !self.should_log_request(path) || !self.config.request.include_payload {
            return false;
        }
        if !is_payload_method(method) {
            return false;
        }
        content_type_enabled(content_type, &self.config.request.filters)
    }

    /// Whether the response body is buffered so it can be logged and replayed
    ///
    /// Decided before the downstream runs, when the response content type is
    /// not known yet.
    pub fn should_buffer_response(&self, path: &str) -> bool {
        self.should_log_response(path) && self.config.response.include_payload
    }

    /// Whether the (buffered) response body is logged
    pub fn should_capture_response_body(&self, path: &str, content_type: Option<&str>) -> bool {
        self.should_buffer_response(path)
            && content_type_enabled(content_type, &self.config.response.filters)
    }

    /// Whether an assembled message is emitted for a response status
    ///
    /// `None` is an unresolved status (downstream fault, or a code outside
    /// 100–599) and is always emitted.
    pub fn should_emit(&self, status: Option<StatusCode>) -> bool {
        let Some(status) = status.filter(|s| (100..600).contains(&s.as_u16())) else {
            return true;
        };
        let codes = &self.config.status_codes;
        if codes.contains(&StatusCodeClass::Any) {
            return true;
        }
        codes.iter().any(|class| class.contains(status))
    }
}

/// Only methods that carry a body are captured; the comparison is exact.
fn is_payload_method(method: &Method) -> bool {
    matches!(method.as_str(), "POST" | "PUT" | "PATCH")
}

/// Path filter: a non-empty whitelist takes absolute precedence and the
/// blacklist is then ignored.
pub fn path_enabled(path: &str, white_list: &[String], black_list: &[String]) -> bool {
    if white_list.is_empty() && black_list.is_empty() {
        return true;
    }
    if !white_list.is_empty() {
        return white_list.iter().any(|pattern| matcher::matches(pattern, path));
    }
    !black_list.iter().any(|pattern| matcher::matches(pattern, path))
}

/// Content-type gate, substring based
fn content_type_enabled(content_type: Option<&str>, filters: &SideFilters) -> bool {
    if !filters.white_listed_content_types.is_empty() {
        return content_type.is_some_and(|ct| {
            filters
                .white_listed_content_types
                .iter()
                .any(|allowed| ct.contains(allowed.as_str()))
        });
    }
    if !filters.black_listed_content_types.is_empty() {
        return !content_type.is_some_and(|ct| {
            filters
                .black_listed_content_types
                .iter()
                .any(|denied| ct.contains(denied.as_str()))
        });
    }
    true
}
