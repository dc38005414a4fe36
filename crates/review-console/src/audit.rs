//! Fire-and-forget delivery of audit events to the action log.

use std::sync::Arc;

use tracing::{debug, warn};

use caseflow::events::{ActionRecord, AuditEvent, AuditSink};
use caseflow::session::SessionContext;

use crate::client::ApiClient;

/// Audit sink that posts events to the backend on a detached task.
///
/// Dispatch never blocks and never reports failure to the caller:
/// delivery problems are logged and dropped. Events raised while nobody
/// is logged in are suppressed entirely.
pub struct HttpAuditSink {
    client: Arc<ApiClient>,
    session: SessionContext,
}

impl HttpAuditSink {
    pub fn new(client: Arc<ApiClient>, session: SessionContext) -> Self {
        Self { client, session }
    }
}

impl AuditSink for HttpAuditSink {
    fn dispatch(&self, event: AuditEvent) {
        // Stamp and capture the token while the credentials that raised
        // the event are still installed; logout may clear them before the
        // spawned send runs.
        let Some(credentials) = self.session.credentials() else {
            debug!(action = event.action(), "audit event suppressed: no active session");
            return;
        };
        let record = ActionRecord::stamp(&credentials.username, &event);
        let client = Arc::clone(&self.client);
        tokio::spawn(async move {
            if let Err(e) = client.log_action(&credentials.token, &record).await {
                warn!(action = %record.action, "audit delivery failed: {e}");
            }
        });
    }
}
