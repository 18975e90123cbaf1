use clap::Args;
use serde::Serialize;
use std::time::Duration;

use super::ServerArgs;
use crate::client::{ApprovalClient, WaitOutcome};
use crate::duration::parse_duration;
use crate::output::print_json_line;

pub const EXIT_APPROVED: i32 = 0;
pub const EXIT_REJECTED: i32 = 1;
pub const EXIT_TIMEOUT: i32 = 2;
pub const EXIT_ERROR: i32 = 3;

#[derive(Args, Debug)]
pub struct WaitArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    /// How long to wait for a decision (e.g. 30s, 5m)
    #[arg(long, default_value = "30s", value_parser = parse_duration)]
    pub wait_time: Duration,

    /// Time between status checks
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    pub poll_interval: Duration,

    /// Text shown to the reviewer
    #[arg(long)]
    pub message: Option<String>,
}

/// The single JSON object written to stdout.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct WaitReport {
    pub id: Option<String>,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WaitReport {
    fn outcome(id: String, outcome: WaitOutcome) -> Self {
        Self {
            id: Some(id),
            status: outcome.label(),
            error: None,
        }
    }

    fn error(id: Option<String>, err: impl std::fmt::Display) -> Self {
        Self {
            id,
            status: "error",
            error: Some(err.to_string()),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.status {
            "approved" => EXIT_APPROVED,
            "rejected" => EXIT_REJECTED,
            "timeout" => EXIT_TIMEOUT,
            _ => EXIT_ERROR,
        }
    }
}

/// Create an approval and block until it resolves or the wait runs out.
/// Returns the process exit code.
pub fn run(args: WaitArgs) -> anyhow::Result<i32> {
    let report = if args.poll_interval.is_zero() {
        WaitReport::error(None, "--poll-interval must be greater than zero")
    } else {
        execute(&args.server.client(), &args)
    };
    print_json_line(&report)?;
    Ok(report.exit_code())
}

fn execute(client: &ApprovalClient, args: &WaitArgs) -> WaitReport {
    let id = match client.create_approval(args.message.as_deref()) {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "could not create approval");
            return WaitReport::error(None, e);
        }
    };
    tracing::info!(approval_id = %id, wait = ?args.wait_time, "waiting for approval");

    match client.wait_for_approval(&id, args.wait_time, args.poll_interval) {
        Ok(outcome) => WaitReport::outcome(id, outcome),
        Err(e) => {
            tracing::error!(approval_id = %id, error = %e, "wait aborted");
            WaitReport::error(Some(id), e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let approved = WaitReport::outcome("a".into(), WaitOutcome::Approved);
        let rejected = WaitReport::outcome("a".into(), WaitOutcome::Rejected);
        let timeout = WaitReport::outcome("a".into(), WaitOutcome::TimedOut);
        let error = WaitReport::error(None, "boom");
        assert_eq!(approved.exit_code(), 0);
        assert_eq!(rejected.exit_code(), 1);
        assert_eq!(timeout.exit_code(), 2);
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn report_json_shape() {
        let timeout = WaitReport::outcome("abc".into(), WaitOutcome::TimedOut);
        assert_eq!(
            serde_json::to_value(&timeout).unwrap(),
            serde_json::json!({"id": "abc", "status": "timeout"})
        );

        let error = WaitReport::error(None, "connection refused");
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            serde_json::json!({"id": null, "status": "error", "error": "connection refused"})
        );
    }
}
