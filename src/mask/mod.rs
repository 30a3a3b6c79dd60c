//! Masking: selects redaction rules for an exchange and applies them
//!
//! Rules are resolved per side by method and path, then applied to headers,
//! query params and body text. Masking only changes what is logged; the
//! exchange itself is never touched.

pub(crate) mod redact;
mod resolver;

pub use redact::{mask_body, mask_headers, mask_query_params, MASK};
pub use resolver::resolve;
