//! Invitation issuance

pub mod commands;
pub mod routes;

pub use commands::IssueInvitationCommand;
pub use routes::invitations_routes;
