//! `devwatch-api`: async transport for device dashboards.
//!
//! Two surfaces, both payload-agnostic:
//!
//! - **[`SnapshotClient`]**: `GET <endpoint>?n=<count>` returning the raw
//!   JSON body. Non-success statuses and transport failures are errors;
//!   deciding what a body *means* is left to `devwatch-core`.
//! - **[`PushChannel`]**: a WebSocket connection speaking
//!   `{"event", "data"}` frames, with exponential-backoff reconnects and
//!   lifecycle events delivered in arrival order.

pub mod error;
pub mod push;
pub mod snapshot;
pub mod transport;

pub use error::Error;
pub use push::{ChannelEvent, EventFrame, PushChannel, ReconnectConfig};
pub use snapshot::{HealthStatus, SnapshotClient};
pub use transport::{TlsMode, TransportConfig};
