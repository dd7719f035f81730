//! Session construction
//!
//! A session binds a credential bundle to an access token. Building one is
//! pure in-memory work; the service validates the token on first use.

use std::fmt;

use crate::config::{AccessToken, Credentials};

/// Authenticated context for requests to the mailbox service
///
/// Sessions are built per facade call and never cached or shared.
#[derive(Clone)]
pub struct Session {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    token: AccessToken,
    authorization: String,
}

impl Session {
    /// Bind `credentials` to `token`. Only the first redirect URI is used.
    pub fn new(credentials: &Credentials, token: &AccessToken) -> Self {
        Self {
            client_id: credentials.client_id().to_string(),
            client_secret: credentials.client_secret().to_string(),
            redirect_uri: credentials.redirect_uri().to_string(),
            authorization: format!("{} {}", token.token_type(), token.access_token),
            token: token.clone(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    /// Value for the `Authorization` header
    pub fn authorization_header(&self) -> &str {
        &self.authorization
    }
}

// Keeps the secret and token out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .finish_non_exhaustive()
    }
}
