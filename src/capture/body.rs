//! Body wrappers that observe frames without altering them

use super::{BufferedResponse, CaptureHandle};
use bytes::Bytes;
use http::HeaderMap;
use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};

pin_project! {
    /// Request body handed to the downstream handler
    ///
    /// Forwards every frame unchanged. When a capture handle is attached, the
    /// leading bytes of each data frame are recorded as they are read.
    #[derive(Debug)]
    pub struct CapturingBody<B> {
        #[pin]
        inner: B,
        capture: Option<CaptureHandle>,
    }
}

impl<B> CapturingBody<B> {
    /// Wrap `inner`, recording into `capture`
    pub fn new(inner: B, capture: CaptureHandle) -> Self {
        Self {
            inner,
            capture: Some(capture),
        }
    }

    /// Wrap `inner` without recording anything
    pub fn passthrough(inner: B) -> Self {
        Self {
            inner,
            capture: None,
        }
    }

    /// Handle to the capture, if any
    pub fn capture(&self) -> Option<&CaptureHandle> {
        self.capture.as_ref()
    }

    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B> Body for CapturingBody<B>
where
    B: Body<Data = Bytes>,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.project();
        let polled = this.inner.poll_frame(cx);
        if let (Poll::Ready(Some(Ok(frame))), Some(capture)) = (&polled, this.capture.as_ref()) {
            if let Some(data) = frame.data_ref() {
                capture.record(data);
            }
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

pin_project! {
    /// Response body handed back to the host transport
    ///
    /// `Replayed` carries the complete buffered body and its trailers,
    /// delivered once after they were logged; `Streaming` is the downstream
    /// body, untouched.
    #[project = ResponseBodyProj]
    #[derive(Debug)]
    pub enum ResponseBody<B> {
        Streaming {
            #[pin]
            body: B,
        },
        Replayed {
            data: Option<Bytes>,
            trailers: Option<HeaderMap>,
        },
    }
}

impl<B> ResponseBody<B> {
    pub fn streaming(body: B) -> Self {
        Self::Streaming { body }
    }

    /// Replay a buffered body: its data, then its trailers if any
    pub fn replayed(buffered: BufferedResponse) -> Self {
        Self::Replayed {
            data: Some(buffered.data).filter(|d| !d.is_empty()),
            trailers: buffered.trailers,
        }
    }

    /// Whether the body was buffered and is being replayed
    pub fn is_replayed(&self) -> bool {
        matches!(self, Self::Replayed { .. })
    }
}

impl<B> Body for ResponseBody<B>
where
    B: Body<Data = Bytes>,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.project() {
            ResponseBodyProj::Streaming { body } => body.poll_frame(cx),
            ResponseBodyProj::Replayed { data, trailers } => {
                let frame = match data.take() {
                    Some(data) => Some(Frame::data(data)),
                    None => trailers.take().map(Frame::trailers),
                };
                Poll::Ready(frame.map(Ok))
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Streaming { body } => body.is_end_stream(),
            Self::Replayed { data, trailers } => data.is_none() && trailers.is_none(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            Self::Streaming { body } => body.size_hint(),
            Self::Replayed { data, .. } => {
                SizeHint::with_exact(data.as_ref().map_or(0, |d| d.len() as u64))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::{BodyExt, Full};
    use std::collections::VecDeque;
    use std::convert::Infallible;

    /// Body yielding one data frame per chunk
    struct Chunks(VecDeque<Bytes>);

    impl Chunks {
        fn new(chunks: &[&'static [u8]]) -> Self {
            Self(chunks.iter().map(|c| Bytes::from_static(*c)).collect())
        }
    }

    impl Body for Chunks {
        type Data = Bytes;
        type Error = Infallible;

        fn poll_frame(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, Infallible>>> {
            Poll::Ready(self.0.pop_front().map(|chunk| Ok(Frame::data(chunk))))
        }
    }

    #[tokio::test]
    async fn test_capturing_body_delivers_everything() {
        let handle = CaptureHandle::new(10);
        let body = CapturingBody::new(Full::new(Bytes::from(vec![b'z'; 100])), handle.clone());
        let delivered = body.collect().await.unwrap().to_bytes();
        assert_eq!(delivered, Bytes::from(vec![b'z'; 100]));
        assert_eq!(handle.captured(), Bytes::from(vec![b'z'; 10]));
        assert_eq!(handle.total_bytes(), 100);
    }

    #[tokio::test]
    async fn test_capturing_body_across_chunks() {
        let handle = CaptureHandle::new(8);
        let body = CapturingBody::new(Chunks::new(&[b"abc", b"defg", b"hijkl"]), handle.clone());
        let delivered = body.collect().await.unwrap().to_bytes();
        assert_eq!(delivered, Bytes::from_static(b"abcdefghijkl"));
        assert_eq!(handle.captured(), Bytes::from_static(b"abcdefgh"));
    }

    #[tokio::test]
    async fn test_passthrough_records_nothing() {
        let body = CapturingBody::passthrough(Chunks::new(&[b"abc"]));
        assert!(body.capture().is_none());
        let delivered = body.collect().await.unwrap().to_bytes();
        assert_eq!(delivered, Bytes::from_static(b"abc"));
    }

    #[test]
    fn test_unread_body_captures_nothing() {
        let handle = CaptureHandle::new(8);
        let body = CapturingBody::new(Chunks::new(&[b"abc"]), handle.clone());
        drop(body);
        assert!(handle.captured().is_empty());
    }

    #[tokio::test]
    async fn test_response_body_variants() {
        let replayed: ResponseBody<Chunks> =
            ResponseBody::replayed(BufferedResponse::new(Bytes::from_static(b"full"), None));
        assert!(replayed.is_replayed());
        assert_eq!(replayed.size_hint().exact(), Some(4));
        assert_eq!(
            replayed.collect().await.unwrap().to_bytes(),
            Bytes::from_static(b"full")
        );

        let streaming = ResponseBody::streaming(Chunks::new(&[b"st", b"ream"]));
        assert!(!streaming.is_replayed());
        assert_eq!(
            streaming.collect().await.unwrap().to_bytes(),
            Bytes::from_static(b"stream")
        );
    }

    #[tokio::test]
    async fn test_replayed_body_keeps_trailers() {
        let mut trailers = HeaderMap::new();
        trailers.insert("grpc-status", "0".parse().unwrap());
        let replayed: ResponseBody<Chunks> = ResponseBody::replayed(BufferedResponse::new(
            Bytes::from_static(b"payload"),
            Some(trailers.clone()),
        ));

        let collected = replayed.collect().await.unwrap();
        assert_eq!(collected.trailers(), Some(&trailers));
        assert_eq!(collected.to_bytes(), Bytes::from_static(b"payload"));
    }

    #[tokio::test]
    async fn test_replayed_empty_body() {
        let mut replayed: ResponseBody<Chunks> =
            ResponseBody::replayed(BufferedResponse::new(Bytes::new(), None));
        assert!(replayed.is_end_stream());
        assert!(replayed.frame().await.is_none());
    }
}
