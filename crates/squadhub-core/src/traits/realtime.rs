//! Real-time transport contract.

use async_trait::async_trait;

use crate::result::AppResult;

/// Fire-and-forget publisher into the real-time transport.
///
/// The transport's own at-most-once semantics apply; there is no
/// acknowledgement step. The socket server lives outside this service and
/// consumes the published events.
#[async_trait]
pub trait RealtimePublisher: Send + Sync + std::fmt::Debug + 'static {
    /// Publish an event payload to a room (e.g. `user:<id>`).
    async fn publish(&self, room: &str, event: &str, payload: serde_json::Value) -> AppResult<()>;
}
