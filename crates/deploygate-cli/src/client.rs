//! Blocking HTTP client for the approval service, and the bounded wait loop
//! built on it.
//!
//! The wait is strictly sequential: sleep to the next tick, poll once,
//! evaluate. Any poll failure ends the wait; nothing is retried.

use std::time::{Duration, Instant};

use deploygate_core::{Approval, ApprovalStatus};
use serde::de::DeserializeOwned;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} returned HTTP {status}: {body}")]
    UnexpectedStatus {
        url: String,
        status: u16,
        body: String,
    },

    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("wait time {0:?} is out of range")]
    WaitOutOfRange(Duration),
}

/// How a wait ended, short of a hard error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Approved,
    Rejected,
    TimedOut,
}

impl WaitOutcome {
    pub fn label(self) -> &'static str {
        match self {
            WaitOutcome::Approved => "approved",
            WaitOutcome::Rejected => "rejected",
            WaitOutcome::TimedOut => "timeout",
        }
    }
}

#[derive(Deserialize)]
struct Created {
    id: String,
}

#[derive(Deserialize)]
struct StatusOnly {
    status: ApprovalStatus,
}

#[derive(Deserialize)]
struct One<T> {
    approval: T,
}

#[derive(Deserialize)]
struct Many {
    approvals: Vec<Approval>,
}

pub struct ApprovalClient {
    agent: ureq::Agent,
    base_url: String,
    org_id: String,
}

impl ApprovalClient {
    /// `request_timeout` bounds each individual HTTP round trip.
    pub fn new(base_url: &str, org_id: &str, request_timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(request_timeout)
            .user_agent(concat!("deploygate/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            org_id: org_id.to_string(),
        }
    }

    fn approvals_url(&self) -> String {
        format!("{}/{}/approvals", self.base_url, self.org_id)
    }

    /// POST a new approval request; returns its id.
    pub fn create_approval(&self, message: Option<&str>) -> Result<String, ClientError> {
        let url = self.approvals_url();
        let body = match message {
            Some(m) => serde_json::json!({ "message": m }),
            None => serde_json::json!({}),
        };
        let response = self
            .agent
            .post(&url)
            .send_json(body)
            .map_err(|e| from_ureq(&url, e))?;
        let created: Created = decode(&url, response)?;
        Ok(created.id)
    }

    pub fn fetch_status(&self, id: &str) -> Result<ApprovalStatus, ClientError> {
        let url = format!("{}/{id}", self.approvals_url());
        let response = self.agent.get(&url).call().map_err(|e| from_ureq(&url, e))?;
        let one: One<StatusOnly> = decode(&url, response)?;
        Ok(one.approval.status)
    }

    pub fn list(&self) -> Result<Vec<Approval>, ClientError> {
        let url = self.approvals_url();
        let response = self.agent.get(&url).call().map_err(|e| from_ureq(&url, e))?;
        let many: Many = decode(&url, response)?;
        Ok(many.approvals)
    }

    /// Poll `id` every `interval` until it resolves or `total` elapses.
    pub fn wait_for_approval(
        &self,
        id: &str,
        total: Duration,
        interval: Duration,
    ) -> Result<WaitOutcome, ClientError> {
        wait_with(|| self.fetch_status(id), total, interval)
    }
}

/// The wait loop, independent of transport.
///
/// The first poll happens one `interval` after the call. When the next tick
/// would land at or past the deadline the loop sleeps to the deadline and
/// reports a timeout. A poll that returns after the deadline also reports a
/// timeout, whatever it returned. A `total` too large to add to the clock is
/// an error and nothing is polled.
pub fn wait_with<F>(mut poll: F, total: Duration, interval: Duration) -> Result<WaitOutcome, ClientError>
where
    F: FnMut() -> Result<ApprovalStatus, ClientError>,
{
    let start = Instant::now();
    let deadline = start
        .checked_add(total)
        .ok_or(ClientError::WaitOutOfRange(total))?;
    let mut tick = start;

    loop {
        // An unrepresentable tick lies past any representable deadline.
        tick = match tick.checked_add(interval) {
            Some(next) if next < deadline => next,
            _ => {
                std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
                return Ok(WaitOutcome::TimedOut);
            }
        };
        std::thread::sleep(tick.saturating_duration_since(Instant::now()));

        let polled = poll();
        if Instant::now() >= deadline {
            return Ok(WaitOutcome::TimedOut);
        }
        match polled? {
            ApprovalStatus::Approved => return Ok(WaitOutcome::Approved),
            ApprovalStatus::Rejected => return Ok(WaitOutcome::Rejected),
            ApprovalStatus::Pending => {
                tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "still pending");
            }
        }
    }
}

fn decode<T: DeserializeOwned>(url: &str, response: ureq::Response) -> Result<T, ClientError> {
    response.into_json().map_err(|e| ClientError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

fn from_ureq(url: &str, err: ureq::Error) -> ClientError {
    match err {
        ureq::Error::Status(status, response) => ClientError::UnexpectedStatus {
            url: url.to_string(),
            status,
            body: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(transport) => ClientError::Transport {
            url: url.to_string(),
            message: transport.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
