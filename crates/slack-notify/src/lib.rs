//! `slack-notify`: the reviewer-channel side of deploygate.
//!
//! Covers the three Slack touch points the approval service needs:
//!
//! ```text
//! SlackClient::post_message   ← approve/deny prompt (Block Kit buttons)
//! interaction::parse_form     ← button click arrives as a form-encoded callback
//! SlackClient::respond        ← replace the prompt with the outcome
//! ```
//!
//! Callback authenticity is checked with [`interaction::verify_signature`].
//! Nothing in here knows about approvals; the server crate builds the blocks.

pub mod client;
pub mod error;
pub mod interaction;
pub mod types;


pub use client::SlackClient;
pub use error::SlackError;
pub use types::{
    ApiResponse, Block, BlockAction, Button, ButtonStyle, InteractionPayload, PostMessage,
    ResponseMessage, Text,
};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, SlackError>;
