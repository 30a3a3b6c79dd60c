//! Redaction engine: applies resolved mask rules to logged text

use crate::config::MaskRule;
use crate::snapshot::{Headers, QueryParams};
use regex::{NoExpand, Regex};

/// Replacement for every masked value
pub const MASK: &str = "*****";

const JSON_CONTENT_TYPE: &str = "application/json";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

const JSON_REPLACEMENT: &str = r#"${1}"*****""#;

/// Overwrite the value of every header named by a rule
///
/// Lookup is by exact name. Header names captured from `http` are
/// lowercase, so a rule naming `Authorization` does not match.
pub fn mask_headers(headers: &mut Headers, rules: &[&MaskRule]) {
    for rule in rules {
        for name in rule.masked_headers() {
            if let Some(value) = headers.get_mut(name) {
                *value = MASK.to_string();
            }
        }
    }
}

/// Replace the whole value list of every param named by a rule with a
/// single mask token
pub fn mask_query_params(params: &mut QueryParams, rules: &[&MaskRule]) {
    for rule in rules {
        for name in rule.masked_query_params() {
            if let Some(values) = params.get_mut(name) {
                *values = vec![MASK.to_string()];
            }
        }
    }
}

/// Mask field values inside a body excerpt
///
/// The JSON pass only rewrites quoted string values; numbers, booleans and
/// nulls pass through. When the content type is unknown both the JSON and
/// the form pass run over the same text.
pub fn mask_body(body: &str, content_type: Option<&str>, rules: &[&MaskRule]) -> String {
    let mut masked = body.to_string();

    if content_type.is_none_or(|ct| ct.contains(JSON_CONTENT_TYPE)) {
        for re in rules.iter().flat_map(|rule| rule.json_patterns()) {
            masked = re.replace_all(&masked, JSON_REPLACEMENT).into_owned();
        }
    }

    if content_type.is_none_or(|ct| ct.contains(FORM_CONTENT_TYPE)) {
        for (re, replacement) in rules.iter().flat_map(|rule| rule.form_patterns()) {
            masked = re
                .replace_all(&masked, NoExpand(replacement.as_str()))
                .into_owned();
        }
    }

    masked
}

/// `"field":"value"` with the field name taken literally
pub(crate) fn json_field_pattern(field: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r#"("{}":)("[^"]+")"#, regex::escape(field)))
}

/// `param=value` up to the next `&`, with the name taken literally
pub(crate) fn form_param_pattern(param: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("{}=([^&]+)", regex::escape(param)))
}

pub(crate) fn form_param_replacement(param: &str) -> String {
    format!("{}={}", param, MASK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::parse_query;

    #[test]
    fn test_mask_json_string_field() {
        let rule = MaskRule::new("/**")
            .with_json_fields(["password"])
            .unwrap();
        let body = r#"{"password":"secret","user":"alice"}"#;
        assert_eq!(
            mask_body(body, Some("application/json"), &[&rule]),
            r#"{"password":"*****","user":"alice"}"#
        );
    }

    #[test]
    fn test_mask_json_leaves_non_strings() {
        let rule = MaskRule::new("/**")
            .with_json_fields(["pin", "ok", "token"])
            .unwrap();
        let body = r#"{"pin":1234,"ok":true,"token":null}"#;
        assert_eq!(mask_body(body, Some("application/json"), &[&rule]), body);
    }

    #[test]
    fn test_mask_json_every_occurrence() {
        let rule = MaskRule::new("/**")
            .with_json_fields(["password"])
            .unwrap();
        let body = r#"[{"password":"a"},{"password":"b"}]"#;
        assert_eq!(
            mask_body(body, Some("application/json; charset=UTF-8"), &[&rule]),
            r#"[{"password":"*****"},{"password":"*****"}]"#
        );
    }

    #[test]
    fn test_mask_form_param() {
        let rule = MaskRule::new("/**")
            .with_query_params(["password"])
            .unwrap();
        let body = "user=alice&password=secret";
        assert_eq!(
            mask_body(body, Some("application/x-www-form-urlencoded"), &[&rule]),
            "user=alice&password=*****"
        );
    }

    #[test]
    fn test_mask_form_param_middle() {
        let rule = MaskRule::new("/**")
            .with_query_params(["token"])
            .unwrap();
        assert_eq!(
            mask_body("a=1&token=xyz&b=2", Some(FORM_CONTENT_TYPE), &[&rule]),
            "a=1&token=*****&b=2"
        );
    }

    #[test]
    fn test_json_pass_skipped_for_form_content() {
        let rule = MaskRule::new("/**")
            .with_json_fields(["password"])
            .unwrap();
        let body = r#"{"password":"secret"}"#;
        assert_eq!(mask_body(body, Some(FORM_CONTENT_TYPE), &[&rule]), body);
    }

    #[test]
    fn test_unknown_content_type_runs_both_passes() {
        let rule = MaskRule::new("/**")
            .with_json_fields(["password"])
            .unwrap()
            .with_query_params(["pin"])
            .unwrap();
        let body = r#"{"password":"secret"} pin=1234"#;
        assert_eq!(
            mask_body(body, None, &[&rule]),
            r#"{"password":"*****"} pin=*****"#
        );
    }

    #[test]
    fn test_other_content_type_untouched() {
        let rule = MaskRule::new("/**")
            .with_json_fields(["password"])
            .unwrap()
            .with_query_params(["password"])
            .unwrap();
        let body = r#"<password>"secret"</password> password=secret"#;
        assert_eq!(mask_body(body, Some("text/xml"), &[&rule]), body);
    }

    #[test]
    fn test_field_names_are_literal() {
        let rule = MaskRule::new("/**")
            .with_json_fields(["a.b"])
            .unwrap();
        let body = r#"{"aXb":"keep","a.b":"hide"}"#;
        assert_eq!(
            mask_body(body, None, &[&rule]),
            r#"{"aXb":"keep","a.b":"*****"}"#
        );

        let rule = MaskRule::new("/**")
            .with_query_params(["$1"])
            .unwrap();
        assert_eq!(mask_body("$1=x", None, &[&rule]), "$1=*****");
    }

    #[test]
    fn test_mask_headers_exact_name() {
        let mut headers: Headers = [
            ("authorization", "Bearer abc".to_string()),
            ("accept", "*/*".to_string()),
        ]
        .into_iter()
        .collect();
        let exact = MaskRule::new("/**")
            .with_headers(["authorization"]);
        let cased = MaskRule::new("/**")
            .with_headers(["Accept", "x-missing"]);
        mask_headers(&mut headers, &[&exact, &cased]);
        assert_eq!(headers.get("authorization").unwrap(), MASK);
        assert_eq!(headers.get("accept").unwrap(), "*/*");
        assert!(headers.get("x-missing").is_none());
    }

    #[test]
    fn test_mask_query_params_replaces_all_values() {
        let mut params = parse_query("token=a&token=b&page=1");
        let rule = MaskRule::new("/**")
            .with_query_params(["token"])
            .unwrap();
        mask_query_params(&mut params, &[&rule]);
        assert_eq!(params.get("token").unwrap(), &vec![MASK.to_string()]);
        assert_eq!(params.get("page").unwrap(), &vec!["1".to_string()]);
    }

    #[test]
    fn test_mask_query_params_twice() {
        let mut params = parse_query("token=a&token=b");
        let rule = MaskRule::new("/**")
            .with_query_params(["token"])
            .unwrap();
        mask_query_params(&mut params, &[&rule]);
        mask_query_params(&mut params, &[&rule, &rule]);
        assert_eq!(params.get("token").unwrap(), &vec![MASK.to_string()]);
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_no_rules_is_identity() {
        let body = r#"{"password":"secret"}"#;
        assert_eq!(mask_body(body, None, &[]), body);
    }
}
