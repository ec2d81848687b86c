//! Enforces that at most one prompt turn runs at a time for a given session.
//!
//! The slot is scoped per `sessionId` rather than globally per connection,
//! matching ACP's multi-session ("trains of thought") design; see
//! DESIGN.md.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::schema::{RequestId, SessionId};

use super::cancellation::{cancellation_pair, CancellationSignal, CancellationTrigger};

/// What occupies a session's turn slot: the request ID of the in-flight
/// `session/prompt` and the trigger to cooperatively cancel it.
struct ActiveTurn {
    request_id: RequestId,
    trigger: CancellationTrigger,
}

/// Per-`sessionId` compare-and-set slot for the single active prompt.
pub struct TurnController {
    slots: DashMap<SessionId, ActiveTurn>,
}

/// A successfully claimed turn slot. Holding this value implies the slot
/// is occupied; [`TurnGuard::release`] or drop-without-release leaves the
/// claim as-is — callers MUST call `release` on completion so the slot is
/// compare-and-cleared rather than left stuck.
pub struct TurnGuard {
    session_id: SessionId,
    request_id: RequestId,
    cancellation: CancellationSignal,
}

impl TurnGuard {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Cooperative cancellation signal the handler should race against its
    /// own work (e.g. via `tokio::select!`).
    pub fn cancellation(&self) -> &CancellationSignal {
        &self.cancellation
    }
}

/// Why a claim attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnConflict {
    pub session_id: SessionId,
}

impl Default for TurnController {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnController {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Attempt to claim the turn slot for `session_id` on behalf of
    /// `request_id`. Fails with [`TurnConflict`] if a prompt is already
    /// active for that session.
    pub fn try_claim(&self, session_id: SessionId, request_id: RequestId) -> Result<TurnGuard, TurnConflict> {
        let (signal, trigger) = cancellation_pair();
        match self.slots.entry(session_id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(TurnConflict { session_id }),
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(ActiveTurn {
                    request_id: request_id.clone(),
                    trigger,
                });
                debug!(target: "acp_core::turn", %session_id, %request_id, "claimed turn slot");
                Ok(TurnGuard {
                    session_id,
                    request_id,
                    cancellation: signal,
                })
            }
        }
    }

    /// Release the slot for `session_id`, but only if it still matches
    /// `request_id` — idempotent and race-safe against a concurrent
    /// `session/cancel` that may have already cleared or reclaimed it.
    pub fn release(&self, guard: TurnGuard) {
        self.release_if_matches(&guard.session_id, &guard.request_id);
    }

    fn release_if_matches(&self, session_id: &SessionId, request_id: &RequestId) {
        if let dashmap::mapref::entry::Entry::Occupied(entry) = self.slots.entry(session_id.clone()) {
            if &entry.get().request_id == request_id {
                entry.remove();
                debug!(target: "acp_core::turn", %session_id, %request_id, "released turn slot");
            }
        }
    }

    /// Handle an inbound `session/cancel` notification: if the slot matches
    /// `session_id`, clear it and fire the cooperative cancellation signal.
    /// A cancel on an idle session has no observable effect.
    pub fn cancel(&self, session_id: &SessionId) {
        if let Some((_, active)) = self.slots.remove(session_id) {
            debug!(target: "acp_core::turn", %session_id, request_id = %active.request_id, "cancelling active turn");
            active.trigger.cancel();
        }
    }

    /// Whether a prompt is currently active for `session_id`.
    pub fn is_active(&self, session_id: &SessionId) -> bool {
        self.slots.contains_key(session_id)
    }

    /// Number of sessions with an in-flight prompt right now.
    pub fn active_count(&self) -> usize {
        self.slots.len()
    }
}

/// Thread-safe handle for sharing one controller across a `Session` and its
/// dispatcher-registered handlers.
pub type SharedTurnController = Arc<TurnController>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(s: &str) -> SessionId {
        SessionId::new(s)
    }

    #[test]
    fn second_claim_for_same_session_conflicts() {
        let controller = TurnController::new();
        let guard = controller
            .try_claim(sid("s1"), RequestId::new_number(1))
            .unwrap();

        let conflict = controller.try_claim(sid("s1"), RequestId::new_number(2));
        assert!(conflict.is_err());

        controller.release(guard);
        assert!(!controller.is_active(&sid("s1")));
    }

    #[test]
    fn different_sessions_do_not_conflict() {
        let controller = TurnController::new();
        let _g1 = controller.try_claim(sid("s1"), RequestId::new_number(1)).unwrap();
        let _g2 = controller.try_claim(sid("s2"), RequestId::new_number(2)).unwrap();
        assert_eq!(controller.active_count(), 2);
    }

    #[tokio::test]
    async fn cancel_clears_slot_and_wakes_handler() {
        let controller = TurnController::new();
        let guard = controller
            .try_claim(sid("s1"), RequestId::new_number(1))
            .unwrap();
        let signal = guard.cancellation().clone();

        controller.cancel(&sid("s1"));
        assert!(!controller.is_active(&sid("s1")));

        tokio::time::timeout(std::time::Duration::from_millis(50), signal.cancelled())
            .await
            .expect("cancellation should have fired");
    }

    #[test]
    fn cancel_on_idle_session_is_a_no_op() {
        let controller = TurnController::new();
        controller.cancel(&sid("idle"));
        assert_eq!(controller.active_count(), 0);
    }

    #[test]
    fn release_is_a_no_op_if_slot_was_already_reclaimed() {
        let controller = TurnController::new();
        let guard = controller
            .try_claim(sid("s1"), RequestId::new_number(1))
            .unwrap();
        controller.cancel(&sid("s1"));
        // A subsequent prompt may have already re-claimed the slot by the
        // time the original handler's cleanup runs; releasing the stale
        // guard must not evict the new claim.
        let _new_guard = controller
            .try_claim(sid("s1"), RequestId::new_number(2))
            .unwrap();
        controller.release(guard);
        assert!(controller.is_active(&sid("s1")));
    }
}
