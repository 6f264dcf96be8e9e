use super::ApiClient;
use crate::error::ClientError;
use lila_commerce::user::UserProfile;
use lila_data::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

/// `POST /auth/token` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResult {
    pub token: String,
    #[serde(default)]
    pub authenticated: bool,
}

/// Sign-in, sign-out and the current account.
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Exchange credentials for a token and store it.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ClientError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ClientError::Validation(
                "email and password are required".into(),
            ));
        }
        let result: LoginResult = self
            .client
            .send(
                self.client
                    .request(Method::Post, "/auth/token")
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;
        if result.token.trim().is_empty() {
            return Err(ClientError::Unauthorized);
        }
        self.client.store().set_token(&result.token)?;
        let me = self.my_info().await?;
        info!(user_id = %me.id, role = %me.role, "signed in");
        Ok(me)
    }

    /// Invalidate the token on the backend and forget it locally. The local
    /// token is dropped even when the backend call fails.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let Some(token) = self.client.token() else {
            return Ok(());
        };
        let outcome = self
            .client
            .send_unit(
                self.client
                    .request(Method::Post, "/auth/logout")
                    .json(&json!({ "token": token })),
            )
            .await;
        if let Err(e) = &outcome {
            warn!(error = %e, "logout call failed; clearing local session anyway");
        }
        self.client.store().clear_token()?;
        debug!("session cleared");
        Ok(())
    }

    /// `GET /users/my-info`.
    pub async fn my_info(&self) -> Result<UserProfile, ClientError> {
        if !self.client.is_signed_in() {
            return Err(ClientError::Unauthorized);
        }
        self.client.get("/users/my-info").await
    }
}
