use crate::approval::ApprovalStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("approval already exists: {org_id}/{id}")]
    AlreadyExists { org_id: String, id: String },

    #[error("approval not found: {org_id}/{id}")]
    NotFound { org_id: String, id: String },

    #[error("approval {id} already resolved as {current}, cannot mark it {requested}")]
    AlreadyResolved {
        id: String,
        current: ApprovalStatus,
        requested: ApprovalStatus,
    },

    #[error("invalid status '{0}': must be pending, approved, or rejected")]
    InvalidStatus(String),

    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl GateError {
    pub fn not_found(org_id: &str, id: &str) -> Self {
        Self::NotFound {
            org_id: org_id.to_string(),
            id: id.to_string(),
        }
    }
}

/// Failure delivering a side effect to a reviewer channel or event channel.
///
/// Never propagated out of the lifecycle manager; it exists so notifier
/// implementations have something typed to log.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("reviewer channel: {0}")]
    Reviewer(String),

    #[error("event channel: {0}")]
    Broadcast(String),

    #[error("no async runtime available to dispatch notification")]
    NoRuntime,
}

pub type Result<T> = std::result::Result<T, GateError>;
