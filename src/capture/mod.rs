//! Body capture: bounded, non-destructive copies of transmitted bytes
//!
//! Only the logged excerpt is bounded. Every byte still reaches the
//! downstream handler or the client, in order.

mod body;

pub use body::{CapturingBody, ResponseBody};

use bytes::{Bytes, BytesMut};
use encoding_rs::Encoding;
use http::HeaderMap;
use std::sync::{Arc, Mutex};

/// Logged when nothing was captured
pub const NOTHING: &str = "[nothing]";

/// Logged when the captured bytes cannot be decoded
pub const UNKNOWN: &str = "[unknown]";

const DEFAULT_ENCODING: &str = "UTF-8";

/// Records at most `limit` leading bytes of a stream
#[derive(Debug)]
pub struct CaptureBuffer {
    limit: usize,
    captured: BytesMut,
    total: u64,
}

impl CaptureBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            captured: BytesMut::new(),
            total: 0,
        }
    }

    /// Record a chunk that passed through
    pub fn record(&mut self, chunk: &[u8]) {
        self.total += chunk.len() as u64;
        let room = self.limit.saturating_sub(self.captured.len());
        if room > 0 {
            self.captured
                .extend_from_slice(&chunk[..chunk.len().min(room)]);
        }
    }

    /// Captured prefix
    pub fn bytes(&self) -> &[u8] {
        &self.captured
    }

    /// Bytes seen in total, captured or not
    pub fn total_bytes(&self) -> u64 {
        self.total
    }

    /// Whether bytes were seen beyond the capture limit
    pub fn is_truncated(&self) -> bool {
        self.total > self.captured.len() as u64
    }
}

/// Shared handle to one invocation's request capture
///
/// Also stored in the request extensions; its presence marks a request whose
/// body is already being captured.
#[derive(Debug, Clone)]
pub struct CaptureHandle {
    buffer: Arc<Mutex<CaptureBuffer>>,
}

impl CaptureHandle {
    pub fn new(limit: usize) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(CaptureBuffer::new(limit))),
        }
    }

    pub(crate) fn record(&self, chunk: &[u8]) {
        self.buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .record(chunk);
    }

    /// Copy of the bytes captured so far
    pub fn captured(&self) -> Bytes {
        let buffer = self
            .buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Bytes::copy_from_slice(buffer.bytes())
    }

    /// Bytes that passed through so far
    pub fn total_bytes(&self) -> u64 {
        self.buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .total_bytes()
    }
}

/// A completely buffered response body
///
/// Stored in the response extensions by the interceptor that buffered it;
/// an outer interceptor reads it from there instead of buffering again.
#[derive(Debug, Clone)]
pub struct BufferedResponse {
    data: Bytes,
    trailers: Option<HeaderMap>,
}

impl BufferedResponse {
    pub fn new(data: Bytes, trailers: Option<HeaderMap>) -> Self {
        Self { data, trailers }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn trailers(&self) -> Option<&HeaderMap> {
        self.trailers.as_ref()
    }
}

/// Decode up to `limit` captured bytes for logging
///
/// `encoding` is a charset label (`UTF-8`, `ISO-8859-1`, `windows-1252`, ...)
/// and defaults to UTF-8. Unknown labels yield [`UNKNOWN`]; empty input
/// yields [`NOTHING`]. Malformed sequences are replaced, never raised.
pub fn decode_payload(bytes: &[u8], encoding: Option<&str>, limit: usize) -> String {
    if bytes.is_empty() {
        return NOTHING.to_string();
    }
    let label = encoding.unwrap_or(DEFAULT_ENCODING);
    let Some(encoding) = Encoding::for_label(label.trim().as_bytes()) else {
        tracing::warn!(encoding = label, "Unsupported encoding in request or response");
        return UNKNOWN.to_string();
    };
    let end = bytes.len().min(limit);
    encoding
        .decode_without_bom_handling(&bytes[..end])
        .0
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_within_limit() {
        let mut buffer = CaptureBuffer::new(16);
        buffer.record(b"hello ");
        buffer.record(b"world");
        assert_eq!(buffer.bytes(), b"hello world");
        assert_eq!(buffer.total_bytes(), 11);
        assert!(!buffer.is_truncated());
    }

    #[test]
    fn test_capture_truncates_across_chunks() {
        let mut buffer = CaptureBuffer::new(10);
        buffer.record(&[b'a'; 6]);
        buffer.record(&[b'b'; 6]);
        buffer.record(&[b'c'; 88]);
        assert_eq!(buffer.bytes(), b"aaaaaabbbb");
        assert_eq!(buffer.total_bytes(), 100);
        assert!(buffer.is_truncated());
    }

    #[test]
    fn test_handle_shared_between_clones() {
        let handle = CaptureHandle::new(4);
        let clone = handle.clone();
        clone.record(b"abcdef");
        assert_eq!(handle.captured(), Bytes::from_static(b"abcd"));
        assert_eq!(handle.total_bytes(), 6);
    }

    #[test]
    fn test_decode_utf8_default() {
        assert_eq!(decode_payload("héllo".as_bytes(), None, 100), "héllo");
    }

    #[test]
    fn test_decode_respects_limit() {
        let body = vec![b'x'; 100];
        assert_eq!(decode_payload(&body, Some("UTF-8"), 10), "xxxxxxxxxx");
    }

    #[test]
    fn test_decode_latin1() {
        assert_eq!(decode_payload(&[0x63, 0x61, 0x66, 0xE9], Some("ISO-8859-1"), 10), "café");
    }

    #[test]
    fn test_decode_unknown_encoding() {
        assert_eq!(decode_payload(b"data", Some("no-such-charset"), 10), UNKNOWN);
    }

    #[test]
    fn test_decode_nothing() {
        assert_eq!(decode_payload(b"", Some("UTF-8"), 10), NOTHING);
        assert_eq!(decode_payload(b"", Some("no-such-charset"), 10), NOTHING);
    }

    #[test]
    fn test_decode_malformed_utf8_replaced() {
        let decoded = decode_payload(&[b'o', b'k', 0xFF], None, 10);
        assert!(decoded.starts_with("ok"));
        assert!(decoded.contains('\u{FFFD}'));
    }
}
