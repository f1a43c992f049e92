//! Handles to running stream receivers

use futures::Stream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::StreamConfig;
use crate::receiver::StreamReceiver;
use crate::sink::FrameSink;
use crate::transport::Transport;
use crate::types::{ConnectionState, ReceiverStats};
use crate::{Result, StreamError};

#[cfg(test)]
mod tests;

/// Owner of one running receiver task.
///
/// Dropping the handle cancels the receiver. Use [`join`](Self::join) to wait
/// for it to finish and collect its final stats.
pub struct StreamHandle {
    endpoint: String,
    stats: watch::Receiver<ReceiverStats>,
    cancel: CancellationToken,
    task: Option<JoinHandle<ReceiverStats>>,
}

impl StreamHandle {
    /// Validate `config` and spawn a receiver task on the current runtime.
    pub(crate) fn spawn<T, S>(config: StreamConfig, transport: T, sink: S) -> Result<Self>
    where
        T: Transport,
        S: FrameSink,
    {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| StreamError::Task { reason: e.to_string() })?;

        let (stats_tx, stats_rx) = watch::channel(ReceiverStats::default());
        let cancel = CancellationToken::new();
        let endpoint = config.endpoint();

        let receiver = StreamReceiver::new(config, transport, sink, cancel.clone(), stats_tx);
        let task = runtime.spawn(receiver.run());

        info!(%endpoint, "Stream receiver spawned");
        Ok(Self { endpoint, stats: stats_rx, cancel, task: Some(task) })
    }

    /// Ask the receiver to stop. Returns immediately.
    ///
    /// A frame being read when cancellation lands is dropped, never yielded.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether [`cancel`](Self::cancel) has been called. The receiver may
    /// still be winding down; use [`join`](Self::join) to wait for it.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Latest stats snapshot.
    pub fn stats(&self) -> ReceiverStats {
        self.stats.borrow().clone()
    }

    /// Current connection state, from the latest stats snapshot.
    pub fn state(&self) -> ConnectionState {
        self.stats.borrow().state
    }

    /// `host:port` this handle's receiver connects to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Stats updates as a stream.
    ///
    /// Yields the current snapshot immediately, then every change. Ends when
    /// the receiver task has finished.
    pub fn stats_updates(&self) -> impl Stream<Item = ReceiverStats> + 'static {
        WatchStream::new(self.stats.clone())
    }

    /// Wait for the receiver to stop and return its final stats.
    ///
    /// Does not cancel; call [`cancel`](Self::cancel) first to stop a
    /// receiver whose sink is still open.
    pub async fn join(mut self) -> Result<ReceiverStats> {
        let Some(task) = self.task.take() else {
            return Ok(self.stats());
        };

        task.await.map_err(|e| StreamError::Task { reason: e.to_string() })
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        debug!(endpoint = %self.endpoint, "Dropping stream handle");
        self.cancel.cancel();
    }
}
