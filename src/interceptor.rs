//! Interceptor: wraps one downstream invocation with request logging
//!
//! ```text
//! INIT → MAYBE_WRAP_REQUEST → MAYBE_WRAP_RESPONSE → INVOKE_DOWNSTREAM
//!      → SUCCESS | FAULT → FINALIZE → MAYBE_EMIT_TIMING → DONE
//! ```
//!
//! One `Interceptor` is shared by every in-flight request. It only holds the
//! immutable configuration and the sink; snapshots and capture buffers
//! belong to a single invocation.

use crate::capture::{self, BufferedResponse, CaptureHandle, CapturingBody, ResponseBody, NOTHING};
use crate::config::LoggingConfig;
use crate::mask;
use crate::observability::{assembler, LogSink, TracingSink};
use crate::policy::PolicyEvaluator;
use crate::snapshot::{ClientInfo, RequestSnapshot, ResponseSnapshot};
use bytes::Bytes;
use http::{Request, Response};
use http_body::Body;
use http_body_util::BodyExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Request logging interceptor
pub struct Interceptor {
    policy: PolicyEvaluator,
    sink: Arc<dyn LogSink>,
}

impl Interceptor {
    /// Create an interceptor logging through `tracing`
    pub fn new(config: Arc<LoggingConfig>) -> Self {
        Self::with_sink(config, Arc::new(TracingSink::new()))
    }

    /// Create an interceptor logging to a custom sink
    pub fn with_sink(config: Arc<LoggingConfig>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            policy: PolicyEvaluator::new(config),
            sink,
        }
    }

    pub fn policy(&self) -> &PolicyEvaluator {
        &self.policy
    }

    /// Run `next` exactly once and log the exchange
    ///
    /// The request body handed to `next` records its leading bytes when the
    /// policy asks for the request body. The response body is buffered when
    /// the policy may log it, and replayed in full to the caller after the
    /// log entry is written. Client identity is read from a [`ClientInfo`]
    /// request extension when the host provides one.
    ///
    /// A downstream error is returned unchanged, after the exchange has been
    /// logged. If the returned future is dropped before completion, whatever
    /// was captured is still logged.
    ///
    /// When [`LogSink::enabled`] is false the request and response pass
    /// through untouched and nothing is assembled.
    pub async fn intercept<B, R, E, F, Fut>(
        &self,
        request: Request<B>,
        next: F,
    ) -> Result<Response<ResponseBody<R>>, E>
    where
        B: Body<Data = Bytes>,
        R: Body<Data = Bytes>,
        R::Error: Into<E>,
        F: FnOnce(Request<CapturingBody<B>>) -> Fut,
        Fut: Future<Output = Result<Response<R>, E>>,
    {
        // Nothing is captured or buffered when the sink would drop the entry
        let active = self.sink.enabled();
        let started = (active && self.policy.config().include_time_elapsed).then(Instant::now);

        let (mut parts, body) = request.into_parts();
        let client = parts
            .extensions
            .get::<ClientInfo>()
            .cloned()
            .unwrap_or_default();
        let snapshot = RequestSnapshot::from_parts(&parts, client);

        let (body, request_capture) = if active {
            self.wrap_request(&mut parts, &snapshot, body)
        } else {
            (CapturingBody::passthrough(body), None)
        };
        let buffer_response = active && self.policy.should_buffer_response(&snapshot.path);

        let mut finalizer = Finalizer {
            interceptor: self,
            request: snapshot,
            request_capture,
            response: None,
            response_body: None,
            armed: active,
        };

        let (mut parts, body) = match next(Request::from_parts(parts, body)).await {
            Ok(response) => response.into_parts(),
            Err(e) => {
                finalizer.finish();
                return Err(e);
            }
        };
        finalizer.response = Some(ResponseSnapshot::from_parts(&parts));

        let body = if !buffer_response {
            ResponseBody::streaming(body)
        } else if let Some(buffered) = parts.extensions.get::<BufferedResponse>() {
            // an inner interceptor already buffered this body and replays it
            finalizer.response_body = Some(buffered.data().clone());
            ResponseBody::streaming(body)
        } else {
            match body.collect().await {
                Ok(collected) => {
                    let trailers = collected.trailers().cloned();
                    let buffered = BufferedResponse::new(collected.to_bytes(), trailers);
                    finalizer.response_body = Some(buffered.data().clone());
                    parts.extensions.insert(buffered.clone());
                    ResponseBody::replayed(buffered)
                }
                Err(e) => {
                    finalizer.finish();
                    return Err(e.into());
                }
            }
        };

        finalizer.finish();

        if let Some(started) = started {
            self.sink.emit(&format!(
                "Request time elapsed: {} ms",
                started.elapsed().as_millis()
            ));
        }

        Ok(Response::from_parts(parts, body))
    }

    /// Attach a capture to the request body unless one is already attached
    fn wrap_request<B>(
        &self,
        parts: &mut http::request::Parts,
        snapshot: &RequestSnapshot,
        body: B,
    ) -> (CapturingBody<B>, Option<CaptureHandle>) {
        let capture = self.policy.should_capture_request_body(
            &snapshot.path,
            &snapshot.method,
            snapshot.content_type.as_deref(),
        );
        if !capture {
            return (CapturingBody::passthrough(body), None);
        }

        if let Some(existing) = parts.extensions.get::<CaptureHandle>() {
            return (CapturingBody::passthrough(body), Some(existing.clone()));
        }

        let handle = CaptureHandle::new(self.policy.config().request.filters.max_payload_size);
        parts.extensions.insert(handle.clone());
        (CapturingBody::new(body, handle.clone()), Some(handle))
    }

    /// Build and emit the log message for one exchange
    fn finalize(
        &self,
        request: &RequestSnapshot,
        request_capture: Option<&CaptureHandle>,
        response: Option<&ResponseSnapshot>,
        response_body: Option<&[u8]>,
    ) {
        let config = self.policy.config();
        let path = request.path.as_str();
        let mut message = String::new();

        if self.policy.should_log_request(path) {
            let rules = mask::resolve(&config.request.filters.masks, &request.method, path);
            let body = self
                .policy
                .should_capture_request_body(path, &request.method, request.content_type.as_deref())
                .then(|| match request_capture {
                    Some(handle) => capture::decode_payload(
                        &handle.captured(),
                        request.character_encoding.as_deref(),
                        config.request.filters.max_payload_size,
                    ),
                    None => NOTHING.to_string(),
                });
            message.push_str(&assembler::request_block(
                &config.request,
                request,
                body.as_deref(),
                &rules,
            ));
        }

        if let Some(response) = response.filter(|_| self.policy.should_log_response(path)) {
            let rules = mask::resolve(&config.response.filters.masks, &request.method, path);
            let body = self
                .policy
                .should_capture_response_body(path, response.content_type.as_deref())
                .then(|| match response_body {
                    Some(bytes) => capture::decode_payload(
                        bytes,
                        response.character_encoding.as_deref(),
                        config.response.filters.max_payload_size,
                    ),
                    None => NOTHING.to_string(),
                });
            message.push_str(&assembler::response_block(
                &config.response,
                response,
                body.as_deref(),
                &rules,
            ));
        }

        let status = response.map(|r| r.status);
        if !message.is_empty() && self.policy.should_emit(status) {
            self.sink.emit(&message);
        }
    }
}

/// Runs FINALIZE exactly once: explicitly on completion, or on drop when the
/// invocation was cancelled or the downstream panicked.
struct Finalizer<'a> {
    interceptor: &'a Interceptor,
    request: RequestSnapshot,
    request_capture: Option<CaptureHandle>,
    response: Option<ResponseSnapshot>,
    response_body: Option<Bytes>,
    armed: bool,
}

impl Finalizer<'_> {
    fn finish(&mut self) {
        if !self.armed {
            return;
        }
        self.armed = false;
        self.interceptor.finalize(
            &self.request,
            self.request_capture.as_ref(),
            self.response.as_ref(),
            self.response_body.as_deref(),
        );
    }
}

impl Drop for Finalizer<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!(
                path = %self.request.path,
                "Exchange did not complete, logging what was captured"
            );
            self.finish();
        }
    }
}
