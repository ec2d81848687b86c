//! Correlation bookkeeping types: a pending request and an ID generator.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::oneshot;

use crate::schema::{JsonRpcResponse, RequestId};

use super::error::CorrelationResult;

/// A request awaiting correlation with its response.
#[derive(Debug)]
pub struct PendingRequest {
    pub sender: oneshot::Sender<CorrelationResult<JsonRpcResponse>>,
    pub created_at: DateTime<Utc>,
    pub timeout: TimeDelta,
    pub request_method: String,
}

impl PendingRequest {
    pub fn new(
        sender: oneshot::Sender<CorrelationResult<JsonRpcResponse>>,
        timeout: TimeDelta,
        request_method: String,
    ) -> Self {
        Self {
            sender,
            created_at: Utc::now(),
            timeout,
            request_method,
        }
    }

    pub fn is_expired_at(&self, now: &DateTime<Utc>) -> bool {
        now.signed_duration_since(self.created_at) > self.timeout
    }
}

/// Thread-safe, monotonically increasing request ID generator.
///
/// IDs are `<session-prefix>-<counter>`: the prefix is chosen once per
/// `Session` (a short random string) so that IDs stay unique even across a
/// process restart that reuses the same counter start value, per spec
/// §4.3's outbound-request algorithm.
#[derive(Debug)]
pub struct RequestIdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl Default for RequestIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestIdGenerator {
    pub fn new() -> Self {
        let full = uuid::Uuid::new_v4().simple().to_string();
        Self {
            prefix: full[..8].to_string(),
            counter: AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> RequestId {
        let id = self.counter.fetch_add(1, Ordering::SeqCst);
        RequestId::new_string(format!("{}-{id}", self.prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_unique_sequential_ids() {
        let generator = RequestIdGenerator::new();
        let a = generator.next_id();
        let b = generator.next_id();
        assert_ne!(a, b);
    }
}
