//! Best-effort request activity logging.

use async_trait::async_trait;

/// Records which authenticated user performed which request.
///
/// Recording is strictly best effort. Implementations must swallow their
/// own failures; a broken activity sink never fails a request.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    /// Records one request by an authenticated user.
    async fn record(&self, user_id: &str, method: &str, path: &str);
}

/// Activity log that emits a structured tracing event.
#[derive(Default)]
pub struct TracingActivityLog;

#[async_trait]
impl ActivityLog for TracingActivityLog {
    async fn record(&self, user_id: &str, method: &str, path: &str) {
        tracing::info!(user_id, method, path, "user activity");
    }
}
