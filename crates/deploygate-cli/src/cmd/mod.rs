pub mod config;
pub mod list;
pub mod serve;
pub mod wait;

use clap::Args;
use std::time::Duration;

use crate::duration::parse_duration;

/// Where the approval service lives. Shared by the client subcommands.
#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Base URL of the approval service
    #[arg(long, env = "DEPLOYGATE_URL", default_value = "http://localhost:8080")]
    pub base_url: String,

    /// Organization the approvals belong to
    #[arg(long, env = "DEPLOYGATE_ORG", default_value = "example-org")]
    pub org_id: String,

    /// Timeout for each HTTP request (e.g. 500ms, 10s)
    #[arg(long, default_value = "10s", value_parser = parse_duration)]
    pub request_timeout: Duration,
}

impl ServerArgs {
    pub fn client(&self) -> crate::client::ApprovalClient {
        crate::client::ApprovalClient::new(&self.base_url, &self.org_id, self.request_timeout)
    }
}
