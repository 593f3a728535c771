//! Issue invitation command
//!
//! Creates an empty record under a fresh token and builds the link the
//! respondent opens to fill in the questionnaire.

use crate::issuer;
use crate::store::{Store, StoreResult};
use intake_common::{Invitation, Token};

#[derive(Debug, Clone)]
pub struct IssueInvitationCommand {
    /// Base URL of the questionnaire front end
    pub public_base_url: String,
}

/// `{base}/questionnaire/{token}`, tolerating a trailing slash on the base.
pub fn invitation_link(base_url: &str, token: &Token) -> String {
    format!("{}/questionnaire/{}", base_url.trim_end_matches('/'), token)
}

#[tracing::instrument(skip(store, command))]
pub async fn handle(store: Store, command: IssueInvitationCommand) -> StoreResult<Invitation> {
    let record = issuer::issue(&store).await?;
    let link = invitation_link(&command.public_base_url, &record.token);

    Ok(Invitation {
        token: record.token,
        link,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_invitation_link() {
        let token = Token::from("abc");
        assert_eq!(
            invitation_link("https://apply.example.org", &token),
            "https://apply.example.org/questionnaire/abc"
        );
        assert_eq!(
            invitation_link("https://apply.example.org/", &token),
            "https://apply.example.org/questionnaire/abc"
        );
    }

    #[tokio::test]
    async fn test_issued_token_resolves_to_empty_record() {
        let store = Store::in_memory();
        let invitation = handle(
            store.clone(),
            IssueInvitationCommand {
                public_base_url: "http://localhost:3000".into(),
            },
        )
        .await
        .unwrap();

        assert!(invitation.link.ends_with(invitation.token.as_str()));
        let record = store.get(&invitation.token).await.unwrap();
        assert!(record.fields.is_empty());
    }
}
