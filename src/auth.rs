//! Auth session
//!
//! Holds the bearer token (persisted across restarts) and an in-memory
//! copy of the signed-in profile. Token storage is best-effort like the
//! cart's: a failed write degrades to a session-only login.

use std::sync::Arc;

use crate::api::models::User;
use crate::api::ApiClient;
use crate::storage::{KeyValueStorage, TOKEN_KEY};
use crate::Result;

pub struct AuthSession {
    storage: Arc<dyn KeyValueStorage>,
    token: Option<String>,
    user: Option<User>,
}

impl AuthSession {
    /// Restore the persisted token, if any. The profile is never
    /// persisted; it is re-fetched after login.
    pub fn load(storage: Arc<dyn KeyValueStorage>) -> Self {
        let token = match storage.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Token storage unavailable, starting signed out");
                None
            }
        };
        Self { storage, token, user: None }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Wire the current token into an [`ApiClient`] so it is attached
    /// to every request. Call once at startup and after login/logout.
    pub fn attach(&self, api: &ApiClient) {
        api.set_token(self.token.clone());
    }

    /// Exchange credentials for a token, persist it, and fetch the
    /// profile.
    pub async fn login(&mut self, api: &ApiClient, email: &str, password: &str) -> Result<User> {
        let token = api.login(email, password).await?;
        self.set_token(token.access_token);
        self.attach(api);
        let user = api.me().await?;
        self.user = Some(user.clone());
        tracing::info!(user_id = %user.id, "Signed in");
        Ok(user)
    }

    /// Drop the token and profile and detach from the client.
    pub fn logout(&mut self, api: &ApiClient) {
        self.token = None;
        self.user = None;
        api.set_token(None);
        if let Err(e) = self.storage.remove(TOKEN_KEY) {
            tracing::warn!(error = %e, "Failed to remove persisted token");
        }
    }

    fn set_token(&mut self, token: String) {
        if let Err(e) = self.storage.put(TOKEN_KEY, &token) {
            tracing::warn!(error = %e, "Failed to persist token, keeping session-only sign-in");
        }
        self.token = Some(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_token_restored_across_sessions() {
        let storage = Arc::new(MemoryStorage::new());
        storage.put(TOKEN_KEY, "tok-123").unwrap();
        let session = AuthSession::load(storage);
        assert!(session.is_authenticated());
        assert_eq!(session.token(), Some("tok-123"));
    }

    #[test]
    fn test_logout_clears_persisted_token() {
        let storage = Arc::new(MemoryStorage::new());
        storage.put(TOKEN_KEY, "tok-123").unwrap();
        let api = ApiClient::new("http://localhost:8000");
        let mut session = AuthSession::load(storage.clone());
        session.logout(&api);
        assert!(!session.is_authenticated());
        assert!(storage.get(TOKEN_KEY).unwrap().is_none());
    }
}
