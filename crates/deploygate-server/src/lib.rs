pub mod broadcast;
pub mod decisions;
pub mod dispatch;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use deploygate_core::config::Config;
use deploygate_core::ApprovalManager;
use slack_notify::SlackClient;
use tokio::sync::{broadcast as bus, mpsc, watch};
use tower_http::trace::TraceLayer;

use crate::broadcast::{NatsPublisher, OUTCOME_BUS_CAPACITY};
use crate::decisions::{DecisionEvent, DECISION_QUEUE_CAPACITY};
use crate::dispatch::Dispatcher;
use crate::state::AppState;

/// Build the axum Router with all routes and middleware.
/// Used by `serve_on()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/{org_id}/approvals",
            get(routes::approvals::list_approvals).post(routes::approvals::create_approval),
        )
        .route(
            "/{org_id}/approvals/{approval_id}",
            get(routes::approvals::get_approval),
        )
        .route(
            "/{org_id}/approvals/{approval_id}/approve",
            post(routes::approvals::approve),
        )
        .route(
            "/{org_id}/approvals/{approval_id}/reject",
            post(routes::approvals::reject),
        )
        .route("/{org_id}/events", get(routes::events::sse_events))
        .route(
            "/slack/interactions",
            post(routes::interactions::slack_interaction),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Everything `serve_on` needs: router state plus the receiving end of the
/// decision queue and the client the listener answers reviewers with.
pub struct Services {
    pub state: AppState,
    decisions: mpsc::Receiver<DecisionEvent>,
    slack: Option<SlackClient>,
}

impl Services {
    /// Wire Slack and NATS from `config`. Must run inside a tokio runtime.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let (outcomes, _) = bus::channel(OUTCOME_BUS_CAPACITY);
        let mut dispatcher = Dispatcher::new(outcomes.clone());

        let slack = match &config.slack.bot_token {
            Some(token) => {
                let client = SlackClient::new(token.clone(), config.slack.api_base.clone())?;
                tracing::info!(channel = %config.reviewer.channel, "slack reviewer prompts enabled");
                dispatcher = dispatcher.with_slack(client.clone(), config.reviewer.clone());
                Some(client)
            }
            None => None,
        };
        if let Some(nats) = NatsPublisher::connect(&config.broadcast).await? {
            dispatcher = dispatcher.with_nats(nats);
        }

        let manager = Arc::new(ApprovalManager::new(Arc::new(dispatcher)));
        let (decision_tx, decisions) = mpsc::channel(DECISION_QUEUE_CAPACITY);
        let state = AppState::new(
            manager,
            outcomes,
            decision_tx,
            config.slack.signing_secret.clone(),
        );
        Ok(Self {
            state,
            decisions,
            slack,
        })
    }

    /// No reviewer channel and no external broadcast. Decisions arrive only
    /// through the approve/reject endpoints.
    pub fn standalone() -> Self {
        let (outcomes, _) = bus::channel(OUTCOME_BUS_CAPACITY);
        let manager = Arc::new(ApprovalManager::new(Arc::new(Dispatcher::new(
            outcomes.clone(),
        ))));
        let (decision_tx, decisions) = mpsc::channel(DECISION_QUEUE_CAPACITY);
        Self {
            state: AppState::new(manager, outcomes, decision_tx, None),
            decisions,
            slack: None,
        }
    }

    pub fn manager(&self) -> Arc<ApprovalManager> {
        self.state.manager.clone()
    }
}

/// Serve on a pre-bound listener until `shutdown` flips to `true`.
///
/// Accepts a `TcpListener` that was already bound so the caller can read the
/// actual port before starting (useful with port 0). After the HTTP server
/// drains, waits for the decision listener to finish its current event.
pub async fn serve_on(
    listener: tokio::net::TcpListener,
    services: Services,
    shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    let Services {
        state,
        decisions,
        slack,
    } = services;
    let state = state.with_shutdown(shutdown.clone());

    let listener_task = decisions::spawn_listener(
        state.manager.clone(),
        slack,
        decisions,
        shutdown.clone(),
    );

    tracing::info!("deploygate listening on http://{addr}");

    let mut http_shutdown = shutdown.clone();
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move {
            decisions::wait_for_shutdown(&mut http_shutdown).await;
            tracing::info!("shutting down");
        })
        .await?;

    // The router's sender clones are gone; the listener drains and exits even
    // if shutdown never fired.
    if let Err(e) = listener_task.await {
        tracing::warn!(error = %e, "decision listener panicked");
    }
    Ok(())
}

/// Bind `config.listen` and serve until `shutdown` flips.
pub async fn serve(config: &Config, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
    for w in config.validate() {
        match w.level {
            deploygate_core::config::WarnLevel::Error => {
                anyhow::bail!("invalid config: {}", w.message)
            }
            deploygate_core::config::WarnLevel::Warning => tracing::warn!("{}", w.message),
        }
    }
    let services = Services::from_config(config).await?;
    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    serve_on(listener, services, shutdown).await
}
