//! Status code classes: which responses produce a log entry

use http::StatusCode;
use serde::{Deserialize, Serialize};

/// Coarse grouping of HTTP status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCodeClass {
    /// 100–199
    #[serde(rename = "1xx", alias = "SC_1XX")]
    Informational,
    /// 200–299
    #[serde(rename = "2xx", alias = "SC_2XX")]
    Success,
    /// 300–399
    #[serde(rename = "3xx", alias = "SC_3XX")]
    Redirection,
    /// 400–499
    #[serde(rename = "4xx", alias = "SC_4XX")]
    ClientError,
    /// 500–599
    #[serde(rename = "5xx", alias = "SC_5XX")]
    ServerError,
    /// Every status, including unresolved ones
    #[serde(rename = "any", alias = "SC_ANY")]
    Any,
}

impl StatusCodeClass {
    /// Check whether a status code falls into this class
    pub fn contains(&self, status: StatusCode) -> bool {
        match self {
            Self::Informational => status.is_informational(),
            Self::Success => status.is_success(),
            Self::Redirection => status.is_redirection(),
            Self::ClientError => status.is_client_error(),
            Self::ServerError => status.is_server_error(),
            Self::Any => true,
        }
    }
}

impl std::fmt::Display for StatusCodeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Informational => write!(f, "1xx"),
            Self::Success => write!(f, "2xx"),
            Self::Redirection => write!(f, "3xx"),
            Self::ClientError => write!(f, "4xx"),
            Self::ServerError => write!(f, "5xx"),
            Self::Any => write!(f, "any"),
        }
    }
}
