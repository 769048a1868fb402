//! Authentication endpoints

use super::models::{LoginRequest, RegisterRequest, Token, User, UserRole};
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Exchange credentials for a bearer token.
    pub async fn login(&self, email: &str, password: &str) -> Result<Token, ApiError> {
        let request = LoginRequest { email: email.into(), password: password.into() };
        self.post_json("/auth/login", &request).await
    }

    /// Register a new customer account. Returns the created profile;
    /// a follow-up [`login`](Self::login) is needed for a token.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        phone: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let request = RegisterRequest {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            password: password.into(),
            role: UserRole::Customer,
        };
        self.post_json("/auth/register", &request).await
    }

    /// Profile of the authenticated user.
    pub async fn me(&self) -> Result<User, ApiError> {
        self.get_json("/auth/me").await
    }
}
