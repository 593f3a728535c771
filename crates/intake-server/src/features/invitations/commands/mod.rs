pub mod issue;

pub use issue::{invitation_link, IssueInvitationCommand};
