//! Explicit session context.
//!
//! A [`Session`] is built once by the composition root and handed to every
//! client constructor. Nothing in this crate reads credentials from global
//! state.

/// Client id used by the twitch.tv web player. GraphQL only accepts tokens
/// minted for this client.
pub const WEB_CLIENT_ID: &str = "kimne78kx3ncx6brgo4mv6wki5h1ko";

/// Auth tokens and identity of the signed-in user.
#[derive(Debug, Clone)]
pub struct Session {
    /// Client id registered for Helix calls.
    pub helix_client_id: String,
    /// User access token for Helix (`Authorization: Bearer ...`).
    pub helix_token: Option<String>,
    /// Client id sent to the GraphQL endpoint.
    pub gql_client_id: String,
    /// OAuth token for GraphQL (`Authorization: OAuth ...`).
    pub gql_token: Option<String>,
    pub user_id: Option<String>,
    pub user_login: Option<String>,
}

impl Session {
    /// An anonymous session: no tokens, no user.
    pub fn anonymous(helix_client_id: impl Into<String>) -> Self {
        Self {
            helix_client_id: helix_client_id.into(),
            helix_token: None,
            gql_client_id: WEB_CLIENT_ID.to_string(),
            gql_token: None,
            user_id: None,
            user_login: None,
        }
    }

    pub fn with_helix_token(mut self, token: impl Into<String>) -> Self {
        self.helix_token = Some(token.into());
        self
    }

    pub fn with_gql_token(mut self, token: impl Into<String>) -> Self {
        self.gql_token = Some(token.into());
        self
    }

    pub fn with_gql_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.gql_client_id = client_id.into();
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>, login: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self.user_login = Some(login.into());
        self
    }

    pub fn is_signed_in(&self) -> bool {
        self.user_id.is_some() && (self.helix_token.is_some() || self.gql_token.is_some())
    }
}
