// ── Data sources ──
//
// The two collaborators a sync driver talks to: something that answers
// snapshot requests and something that streams push events. Drivers are
// generic over both so they can run against in-memory fakes.

use std::future::Future;

use devwatch_api::{ChannelEvent, PushChannel, SnapshotClient};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::CoreError;
use crate::model::DeviceCount;

/// Answers `GET ?n=<count>` style snapshot requests.
///
/// Each call returns an owned future so several requests can be in
/// flight at once.
pub trait SnapshotSource: Clone + Send + Sync + 'static {
    fn fetch(&self, count: DeviceCount) -> BoxFuture<'static, Result<Value, CoreError>>;
}

/// A long-lived stream of push events.
pub trait UpdateSource: Send {
    /// Tell the server how many devices to stream.
    fn announce(&mut self, count: DeviceCount);

    /// Next event, or `None` once the source has shut down.
    fn recv(&mut self) -> impl Future<Output = Option<ChannelEvent>> + Send;
}

// ── HTTP snapshot source ─────────────────────────────────────────────

/// Snapshot source backed by the HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpSnapshotSource {
    client: SnapshotClient,
    seed: Option<i64>,
}

impl HttpSnapshotSource {
    pub fn new(client: SnapshotClient) -> Self {
        Self { client, seed: None }
    }

    /// Ask the server for reproducible device data.
    pub fn with_seed(mut self, seed: Option<i64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn client(&self) -> &SnapshotClient {
        &self.client
    }
}

impl SnapshotSource for HttpSnapshotSource {
    fn fetch(&self, count: DeviceCount) -> BoxFuture<'static, Result<Value, CoreError>> {
        let client = self.client.clone();
        let seed = self.seed;
        async move {
            client
                .fetch_devices(count.get(), seed)
                .await
                .map_err(CoreError::from)
        }
        .boxed()
    }
}

// ── Push channel source ──────────────────────────────────────────────

impl UpdateSource for PushChannel {
    fn announce(&mut self, count: DeviceCount) {
        if !self.subscribe_devices(count.get()) {
            tracing::debug!(%count, "push channel closed, announcement dropped");
        }
    }

    fn recv(&mut self) -> impl Future<Output = Option<ChannelEvent>> + Send {
        PushChannel::recv(self)
    }
}
