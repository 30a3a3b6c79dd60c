//! Mask rule configuration: which fields to redact, scoped by method and path

use crate::error::{LoggingError, Result};
use crate::mask::redact;
use http::Method;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Mask rule as it appears in a configuration file
///
/// # Example
///
/// ```hcl
/// masks {
///   method             = "POST"
///   path_matcher       = "/users/**"
///   masked_json_fields = ["password", "newPassword"]
///   masked_headers     = ["authorization"]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskProperties {
    /// HTTP method to apply for (absent = any method)
    #[serde(default)]
    pub method: Option<String>,

    /// Path pattern like `/users/**`, `/users/*`, `/users`
    #[serde(default)]
    pub path_matcher: Option<String>,

    /// JSON field names to mask
    #[serde(default = "empty_names")]
    pub masked_json_fields: Option<Vec<String>>,

    /// Query params (and form body params) to mask
    #[serde(default = "empty_names")]
    pub masked_query_params: Option<Vec<String>>,

    /// Header names to mask, matched exactly
    #[serde(default = "empty_names")]
    pub masked_headers: Option<Vec<String>>,
}

fn empty_names() -> Option<Vec<String>> {
    Some(Vec::new())
}

impl Default for MaskProperties {
    fn default() -> Self {
        Self {
            method: None,
            path_matcher: None,
            masked_json_fields: empty_names(),
            masked_query_params: empty_names(),
            masked_headers: empty_names(),
        }
    }
}

/// A validated redaction rule
///
/// Body patterns for the JSON and form passes are compiled once, when the
/// rule is built, and reused for every exchange.
#[derive(Debug, Clone)]
pub struct MaskRule {
    /// Method filter; `None` matches every method
    pub method: Option<Method>,
    /// Glob path pattern
    pub path_matcher: String,
    json_fields: Vec<String>,
    query_params: Vec<String>,
    headers: Vec<String>,
    json_patterns: Vec<Regex>,
    form_patterns: Vec<(Regex, String)>,
}

impl MaskRule {
    /// Create a rule matching any method on `path_matcher`
    pub fn new(path_matcher: impl Into<String>) -> Self {
        Self {
            method: None,
            path_matcher: path_matcher.into(),
            json_fields: Vec::new(),
            query_params: Vec::new(),
            headers: Vec::new(),
            json_patterns: Vec::new(),
            form_patterns: Vec::new(),
        }
    }

    /// Restrict the rule to one method
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Mask these JSON fields
    pub fn with_json_fields<I, S>(mut self, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.json_fields = fields.into_iter().map(Into::into).collect();
        self.json_patterns = self
            .json_fields
            .iter()
            .map(|field| compile(field, redact::json_field_pattern(field)))
            .collect::<Result<_>>()?;
        Ok(self)
    }

    /// Mask these query/form params
    pub fn with_query_params<I, S>(mut self, params: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query_params = params.into_iter().map(Into::into).collect();
        self.form_patterns = self
            .query_params
            .iter()
            .map(|param| {
                let re = compile(param, redact::form_param_pattern(param))?;
                Ok((re, redact::form_param_replacement(param)))
            })
            .collect::<Result<_>>()?;
        Ok(self)
    }

    /// Mask these headers
    pub fn with_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// JSON field names whose string values are masked
    pub fn masked_json_fields(&self) -> &[String] {
        &self.json_fields
    }

    /// Query/form parameter names whose values are masked
    pub fn masked_query_params(&self) -> &[String] {
        &self.query_params
    }

    /// Header names whose values are masked
    pub fn masked_headers(&self) -> &[String] {
        &self.headers
    }

    pub(crate) fn json_patterns(&self) -> &[Regex] {
        &self.json_patterns
    }

    pub(crate) fn form_patterns(&self) -> &[(Regex, String)] {
        &self.form_patterns
    }
}

fn compile(name: &str, pattern: std::result::Result<Regex, regex::Error>) -> Result<Regex> {
    pattern.map_err(|e| LoggingError::Config(format!("Invalid mask name '{}': {}", name, e)))
}

/// Compiled patterns follow from the names, so they take no part in equality
impl PartialEq for MaskRule {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method
            && self.path_matcher == other.path_matcher
            && self.json_fields == other.json_fields
            && self.query_params == other.query_params
            && self.headers == other.headers
    }
}

impl Eq for MaskRule {}

impl TryFrom<MaskProperties> for MaskRule {
    type Error = LoggingError;

    fn try_from(props: MaskProperties) -> Result<Self> {
        let (Some(masked_json_fields), Some(masked_query_params), Some(masked_headers)) = (
            props.masked_json_fields,
            props.masked_query_params,
            props.masked_headers,
        ) else {
            return Err(LoggingError::Config(
                "Mask query params, headers and json fields are not allowed to be null".to_string(),
            ));
        };

        let path_matcher = match props.path_matcher {
            Some(p) if !p.trim().is_empty() => p,
            _ => {
                return Err(LoggingError::Config(
                    "Mask path_matcher is required".to_string(),
                ))
            }
        };

        let method = props
            .method
            .map(|m| {
                Method::from_bytes(m.as_bytes()).map_err(|e| {
                    LoggingError::Config(format!("Invalid mask method '{}': {}", m, e))
                })
            })
            .transpose()?;

        let mut rule = Self::new(path_matcher)
            .with_json_fields(masked_json_fields)?
            .with_query_params(masked_query_params)?
            .with_headers(masked_headers);
        rule.method = method;
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mask_defaults() {
        let props: MaskProperties = toml::from_str(r#"path_matcher = "/users/**""#).unwrap();
        let rule = MaskRule::try_from(props).unwrap();
        assert!(rule.method.is_none());
        assert_eq!(rule.path_matcher, "/users/**");
        assert!(rule.masked_json_fields().is_empty());
        assert!(rule.masked_query_params().is_empty());
        assert!(rule.masked_headers().is_empty());
    }

    #[test]
    fn test_parse_full_mask() {
        let toml = r#"
            method = "POST"
            path_matcher = "/login"
            masked_json_fields = ["password"]
            masked_query_params = ["token"]
            masked_headers = ["authorization", "cookie"]
        "#;
        let props: MaskProperties = toml::from_str(toml).unwrap();
        let rule = MaskRule::try_from(props).unwrap();
        assert_eq!(rule.method, Some(Method::POST));
        assert_eq!(rule.masked_json_fields(), ["password"]);
        assert_eq!(rule.masked_query_params(), ["token"]);
        assert_eq!(rule.masked_headers().len(), 2);
        assert_eq!(rule.json_patterns().len(), 1);
        assert_eq!(rule.form_patterns().len(), 1);
    }

    #[test]
    fn test_null_name_set_rejected() {
        let props = MaskProperties {
            path_matcher: Some("/a".to_string()),
            masked_headers: None,
            ..Default::default()
        };
        let err = MaskRule::try_from(props).unwrap_err();
        assert!(err.to_string().contains("not allowed to be null"));
    }

    #[test]
    fn test_missing_path_matcher_rejected() {
        let err = MaskRule::try_from(MaskProperties::default()).unwrap_err();
        assert!(err.to_string().contains("path_matcher"));
    }

    #[test]
    fn test_invalid_method_rejected() {
        let props = MaskProperties {
            method: Some("PO ST".to_string()),
            path_matcher: Some("/a".to_string()),
            ..Default::default()
        };
        assert!(MaskRule::try_from(props).is_err());
    }

    #[test]
    fn test_lowercase_method_kept_verbatim() {
        let props = MaskProperties {
            method: Some("post".to_string()),
            path_matcher: Some("/a".to_string()),
            ..Default::default()
        };
        let rule = MaskRule::try_from(props).unwrap();
        assert_ne!(rule.method, Some(Method::POST));
        assert_eq!(rule.method.unwrap().as_str(), "post");
    }

    #[test]
    fn test_builder() {
        let rule = MaskRule::new("/users/*")
            .with_method(Method::PUT)
            .with_json_fields(["password"])
            .unwrap()
            .with_headers(["authorization"]);
        assert_eq!(rule.method, Some(Method::PUT));
        assert_eq!(rule.masked_json_fields(), ["password"]);
        assert_eq!(rule.masked_headers(), ["authorization"]);
        assert!(rule.masked_query_params().is_empty());
    }

    #[test]
    fn test_equality_ignores_compiled_patterns() {
        let built = MaskRule::new("/a")
            .with_json_fields(["password"])
            .unwrap()
            .with_query_params(["token"])
            .unwrap();
        let parsed = MaskRule::try_from(MaskProperties {
            path_matcher: Some("/a".to_string()),
            masked_json_fields: Some(vec!["password".to_string()]),
            masked_query_params: Some(vec!["token".to_string()]),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(built, parsed);
        assert_ne!(built, MaskRule::new("/a"));
    }
}
