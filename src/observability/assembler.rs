//! Log assembler: renders request and response blocks as text
//!
//! ```text
//! --- REQUEST START ---
//! Method: POST
//! Url: http://api.example.com/login
//! Query-Params: {next=[/home]}
//! Headers: {host=api.example.com, authorization=*****}
//! Content-Type: application/json
//! Content-Length: 38
//! Character-Encoding: null
//! Body: {"user":"alice","password":"*****"}
//! --- REQUEST END ---
//! ```

use crate::config::{MaskRule, RequestConfig, ResponseConfig};
use crate::mask;
use crate::snapshot::{RequestSnapshot, ResponseSnapshot};
use std::fmt::Display;

pub const BEFORE_REQUEST_MESSAGE: &str = "--- REQUEST START ---";
pub const AFTER_REQUEST_MESSAGE: &str = "--- REQUEST END ---";
pub const BEFORE_RESPONSE_MESSAGE: &str = "--- RESPONSE START ---";
pub const AFTER_RESPONSE_MESSAGE: &str = "--- RESPONSE END ---";

const NULL: &str = "null";

/// Ordered `Label: value` lines between a begin and an end marker
#[derive(Debug)]
pub struct LogBlock {
    begin: &'static str,
    end: &'static str,
    lines: Vec<(&'static str, String)>,
}

impl LogBlock {
    pub fn new(begin: &'static str, end: &'static str) -> Self {
        Self {
            begin,
            end,
            lines: Vec::new(),
        }
    }

    pub fn field(&mut self, label: &'static str, value: impl Display) -> &mut Self {
        self.lines.push((label, value.to_string()));
        self
    }

    /// Absent values render as `null`
    pub fn optional<T: Display>(&mut self, label: &'static str, value: Option<T>) -> &mut Self {
        match value {
            Some(v) => self.field(label, v),
            None => self.field(label, NULL),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push('\n');
        out.push_str(self.begin);
        out.push('\n');
        let body = self
            .lines
            .iter()
            .map(|(label, value)| format!("{}: {}", label, value))
            .collect::<Vec<_>>()
            .join("\n");
        out.push_str(&body);
        out.push('\n');
        out.push_str(self.end);
        out
    }
}

/// Render the request block
///
/// `body` is the decoded excerpt when body capture was allowed, `None` to
/// leave the `Body` line out.
pub fn request_block(
    config: &RequestConfig,
    request: &RequestSnapshot,
    body: Option<&str>,
    rules: &[&MaskRule],
) -> String {
    let mut block = LogBlock::new(BEFORE_REQUEST_MESSAGE, AFTER_REQUEST_MESSAGE);
    block
        .field("Method", &request.method)
        .field("Url", &request.url);

    if config.include_query_params {
        let mut params = request.query_params.clone();
        mask::mask_query_params(&mut params, rules);
        block.field("Query-Params", params);
    }

    if config.include_headers {
        let mut headers = request.headers.clone();
        mask::mask_headers(&mut headers, rules);
        block.field("Headers", headers);
    }

    if config.include_client_info {
        block
            .optional("Principal", request.client.principal.as_deref())
            .optional("Session-Id", request.client.session_id.as_deref());
    }

    if config.include_ip_address {
        block.optional("Ip-Address", request.client.remote_addr.as_deref());
    }

    block
        .optional("Content-Type", request.content_type.as_deref())
        .field("Content-Length", request.content_length)
        .optional("Character-Encoding", request.character_encoding.as_deref());

    if let Some(body) = body {
        block.field(
            "Body",
            mask::mask_body(body, request.content_type.as_deref(), rules),
        );
    }

    block.render()
}

/// Render the response block
pub fn response_block(
    config: &ResponseConfig,
    response: &ResponseSnapshot,
    body: Option<&str>,
    rules: &[&MaskRule],
) -> String {
    let mut block = LogBlock::new(BEFORE_RESPONSE_MESSAGE, AFTER_RESPONSE_MESSAGE);
    block
        .field("Status-Code", response.status.as_u16())
        .optional("Content-Type", response.content_type.as_deref())
        .optional("Character-Encoding", response.character_encoding.as_deref());

    if config.include_headers {
        let mut headers = response.headers.clone();
        mask::mask_headers(&mut headers, rules);
        block.field("Headers", headers);
    }

    if let Some(body) = body {
        block.field(
            "Body",
            mask::mask_body(body, response.content_type.as_deref(), rules),
        );
    }

    block.render()
}
