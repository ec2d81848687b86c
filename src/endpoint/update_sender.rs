//! A handle prompt handlers use to stream `session/update` notifications.

use std::sync::Weak;

use crate::schema::{SessionId, SessionNotification, SessionUpdate, SESSION_UPDATE_NOTIFICATION};
use crate::session::{CorrelationError, CorrelationResult, Session};

/// Passed into [`super::Agent::prompt`] so a handler can push progress
/// notifications without holding a reference back into the endpoint that
/// owns it — only a non-owning [`Weak`] handle to the underlying
/// [`Session`].
#[derive(Clone)]
pub struct SessionUpdateSender {
    session: Weak<Session>,
    session_id: SessionId,
}

impl SessionUpdateSender {
    pub(crate) fn new(session: Weak<Session>, session_id: SessionId) -> Self {
        Self { session, session_id }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Stream one `session/update` notification for this turn.
    pub async fn send(&self, update: SessionUpdate) -> CorrelationResult<()> {
        let Some(session) = self.session.upgrade() else {
            return Err(CorrelationError::SessionClosed);
        };
        let notification = SessionNotification {
            session_id: self.session_id.clone(),
            update,
        };
        session
            .send_notification(SESSION_UPDATE_NOTIFICATION, Some(notification))
            .await
    }
}
