pub mod action;
pub mod approval;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod notify;
pub mod store;

pub use approval::{Approval, ApprovalStatus, Decision};
pub use error::{GateError, NotificationError, Result};
pub use lifecycle::{ApprovalManager, Resolution};
pub use notify::{Notifier, OutcomeEvent};
