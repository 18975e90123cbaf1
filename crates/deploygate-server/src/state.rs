use std::sync::Arc;

use deploygate_core::ApprovalManager;
use tokio::sync::{broadcast, mpsc, watch};

use crate::broadcast::OrgOutcome;
use crate::decisions::DecisionEvent;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<ApprovalManager>,
    /// In-process outcome bus feeding the SSE endpoint.
    pub outcomes: broadcast::Sender<OrgOutcome>,
    /// Reviewer decisions handed to the background listener.
    pub decision_tx: mpsc::Sender<DecisionEvent>,
    /// Slack signing secret; `None` skips callback verification.
    pub signing_secret: Option<Arc<str>>,
    /// Flips to `true` when the server is shutting down.
    pub shutdown: watch::Receiver<bool>,
}

impl AppState {
    pub fn new(
        manager: Arc<ApprovalManager>,
        outcomes: broadcast::Sender<OrgOutcome>,
        decision_tx: mpsc::Sender<DecisionEvent>,
        signing_secret: Option<String>,
    ) -> Self {
        // A receiver whose sender is gone never reports shutdown; `serve_on`
        // swaps in the real one.
        let (_, shutdown) = watch::channel(false);
        Self {
            manager,
            outcomes,
            decision_tx,
            signing_secret: signing_secret.map(Arc::from),
            shutdown,
        }
    }

    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = shutdown;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_keeps_secret() {
        let (outcomes, _) = broadcast::channel(4);
        let (tx, _rx) = mpsc::channel(4);
        let state = AppState::new(
            Arc::new(ApprovalManager::default()),
            outcomes,
            tx,
            Some("s3cret".into()),
        );
        assert_eq!(state.signing_secret.as_deref(), Some("s3cret"));
        assert!(!*state.shutdown.borrow());
    }
}
