//! Frame sinks: where a receiver delivers decoded frames
//!
//! A receiver awaits its sink for every frame, so a slow sink slows the
//! receiver down instead of queueing frames. [`channel`] gives a pull-style
//! [`FrameStream`] with exactly one frame in flight.

use futures::Stream;
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::types::SensorFrame;

/// The consumer went away; the receiver stops as if cancelled.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[error("Frame sink closed")]
pub struct SinkClosed;

/// Consumer of decoded frames.
#[async_trait::async_trait]
pub trait FrameSink: Send + 'static {
    /// Deliver one frame. Frames arrive in header order, one at a time.
    async fn on_frame(&mut self, frame: SensorFrame) -> Result<(), SinkClosed>;
}

/// Sink wrapping a synchronous callback. Never reports closed.
pub struct FnSink<F> {
    callback: F,
}

impl<F> FnSink<F>
where
    F: FnMut(SensorFrame) + Send + 'static,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

#[async_trait::async_trait]
impl<F> FrameSink for FnSink<F>
where
    F: FnMut(SensorFrame) + Send + 'static,
{
    async fn on_frame(&mut self, frame: SensorFrame) -> Result<(), SinkClosed> {
        (self.callback)(frame);
        Ok(())
    }
}

/// Sending half of [`channel`].
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<SensorFrame>,
}

#[async_trait::async_trait]
impl FrameSink for ChannelSink {
    async fn on_frame(&mut self, frame: SensorFrame) -> Result<(), SinkClosed> {
        self.tx.send(frame).await.map_err(|_| SinkClosed)
    }
}

pin_project! {
    /// Stream of decoded frames from a running receiver.
    ///
    /// Ends once the receiver stops. Dropping it makes the receiver stop at
    /// its next frame.
    #[derive(Debug)]
    pub struct FrameStream {
        #[pin]
        inner: ReceiverStream<SensorFrame>,
    }
}

impl Stream for FrameStream {
    type Item = SensorFrame;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Sink and stream pair with one frame in flight.
pub fn channel() -> (ChannelSink, FrameStream) {
    let (tx, rx) = mpsc::channel(1);
    (ChannelSink { tx }, FrameStream { inner: ReceiverStream::new(rx) })
}
