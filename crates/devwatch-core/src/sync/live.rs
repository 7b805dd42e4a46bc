// ── Runtime-selected driver ──
//
// Hosts pick pull or push from configuration at startup. This enum lets
// them hold either behind one concrete type.

use std::future::Future;

use devwatch_api::{PushChannel, ReconnectConfig};
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::{
    DriverEvent, HttpSnapshotSource, PresentationSink, PullDriver, PushDriver, ResponseOrdering,
    SyncDriver, SyncMode,
};
use crate::dashboard::Dashboard;
use crate::model::DeviceCount;

/// Everything needed to build a live driver besides the snapshot source.
#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub mode: SyncMode,
    pub count: DeviceCount,
    pub ordering: ResponseOrdering,
    pub push_url: Url,
    pub event_name: String,
    pub reconnect: ReconnectConfig,
}

/// A pull or push driver over the real transports.
pub enum LiveDriver {
    Pull(PullDriver<HttpSnapshotSource>),
    Push(PushDriver<HttpSnapshotSource, PushChannel>),
}

impl LiveDriver {
    /// Build the driver for `options.mode`. In push mode this spawns the
    /// channel's connection loop, so it must run inside a Tokio runtime.
    pub fn connect(
        source: HttpSnapshotSource,
        options: &DriverOptions,
        cancel: CancellationToken,
    ) -> Self {
        match options.mode {
            SyncMode::Pull => Self::Pull(
                PullDriver::new(source, options.count).with_ordering(options.ordering),
            ),
            SyncMode::Push => {
                let channel = PushChannel::connect(
                    options.push_url.clone(),
                    options.event_name.clone(),
                    options.reconnect.clone(),
                    cancel,
                );
                Self::Push(
                    PushDriver::new(source, channel, options.count)
                        .with_ordering(options.ordering),
                )
            }
        }
    }
}

impl SyncDriver for LiveDriver {
    fn mode(&self) -> SyncMode {
        match self {
            Self::Pull(d) => d.mode(),
            Self::Push(d) => d.mode(),
        }
    }

    fn count(&self) -> DeviceCount {
        match self {
            Self::Pull(d) => d.count(),
            Self::Push(d) => d.count(),
        }
    }

    fn start<S: PresentationSink>(&mut self, dashboard: &mut Dashboard<S>) {
        match self {
            Self::Pull(d) => d.start(dashboard),
            Self::Push(d) => d.start(dashboard),
        }
    }

    fn refresh<S: PresentationSink>(&mut self, dashboard: &mut Dashboard<S>) {
        match self {
            Self::Pull(d) => d.refresh(dashboard),
            Self::Push(d) => d.refresh(dashboard),
        }
    }

    fn set_count<S: PresentationSink>(&mut self, count: DeviceCount, dashboard: &mut Dashboard<S>) {
        match self {
            Self::Pull(d) => d.set_count(count, dashboard),
            Self::Push(d) => d.set_count(count, dashboard),
        }
    }

    fn clear<S: PresentationSink>(&mut self, dashboard: &mut Dashboard<S>) {
        match self {
            Self::Pull(d) => d.clear(dashboard),
            Self::Push(d) => d.clear(dashboard),
        }
    }

    fn is_busy(&self) -> bool {
        match self {
            Self::Pull(d) => d.is_busy(),
            Self::Push(d) => d.is_busy(),
        }
    }

    fn next_event(&mut self) -> impl Future<Output = DriverEvent> + Send {
        match self {
            Self::Pull(d) => d.next_event().left_future(),
            Self::Push(d) => d.next_event().right_future(),
        }
    }

    fn apply<S: PresentationSink>(&mut self, event: DriverEvent, dashboard: &mut Dashboard<S>) {
        match self {
            Self::Pull(d) => d.apply(event, dashboard),
            Self::Push(d) => d.apply(event, dashboard),
        }
    }
}
