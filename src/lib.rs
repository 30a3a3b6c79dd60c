//! # Request Logging
//!
//! Policy-driven HTTP request/response logging for server pipelines. Decides
//! whether, what and how redacted to log for each exchange, without altering
//! the bytes that reach the handler or the client.
//!
//! ## Architecture
//!
//! ```text
//! Request → Interceptor ─ capture ─→ next() → Response ─ buffer ─→ replay
//!                 │                                  │
//!                 └──── Policy → Masks → Assembler ──┴→ LogSink
//! ```
//!
//! ## Core Features
//!
//! - **Path filters**: Ant-style globs (`*`, `?`, `**`) with whitelist precedence
//! - **Content-type filters**: Per-side whitelist or blacklist
//! - **Status filter**: Emit only for selected status classes (`4xx`, `5xx`, ...)
//! - **Masking**: Headers, query params, JSON fields and form fields per path and method
//! - **Bounded capture**: Only the logged excerpt is limited; delivery is never truncated
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use request_logging::{config::LoggingProperties, Interceptor};
//! use std::sync::Arc;
//!
//! let config = LoggingProperties::from_file("logging.hcl").await?.into_config()?;
//! let interceptor = Interceptor::new(Arc::new(config));
//!
//! let response = interceptor
//!     .intercept(request, |req| async move { handler(req).await })
//!     .await?;
//! ```

pub mod capture;
pub mod config;
pub mod error;
pub mod interceptor;
pub mod mask;
pub mod matcher;
pub mod observability;
pub mod policy;
pub mod snapshot;

// Re-export main types
pub use capture::{BufferedResponse, CaptureHandle, CapturingBody, ResponseBody};
pub use config::{LoggingConfig, LoggingProperties};
pub use error::{LoggingError, Result};
pub use interceptor::Interceptor;
pub use observability::{LogSink, TracingSink};
pub use policy::PolicyEvaluator;
pub use snapshot::ClientInfo;
