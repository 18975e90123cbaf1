pub mod approvals;
pub mod events;
pub mod interactions;
