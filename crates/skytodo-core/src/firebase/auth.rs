use std::rc::Rc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Credentials, FirebaseClient, expiry_from};
use crate::error::ServiceError;
use crate::session::{IdentityService, User, UserId};

/// Email/password accounts through the Identity Toolkit REST API.
#[derive(Debug, Clone)]
pub struct FirebaseAuth {
    client: Rc<FirebaseClient>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

impl FirebaseAuth {
    pub(crate) fn new(client: Rc<FirebaseClient>) -> Self {
        Self { client }
    }

    fn accounts_url(&self, method: &str) -> String {
        let cfg = self.client.config();
        format!(
            "{}/v1/accounts:{method}?key={}",
            cfg.auth_endpoint.trim_end_matches('/'),
            cfg.api_key
        )
    }

    async fn password_call(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, Credentials), ServiceError> {
        let response: PasswordResponse = self
            .client
            .post_json(
                &self.accounts_url(method),
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        let user = User {
            uid: UserId::new(response.local_id),
            email: response.email.unwrap_or_else(|| email.to_string()),
        };
        let credentials = Credentials {
            user: user.clone(),
            id_token: response.id_token,
            refresh_token: response.refresh_token,
            expires_at: expiry_from(response.expires_in.as_deref(), Utc::now()),
        };
        Ok((user, credentials))
    }
}

#[async_trait(?Send)]
impl IdentityService for FirebaseAuth {
    #[tracing::instrument(skip(self, password))]
    async fn create_account(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        // The endpoint hands back tokens for the new account; they are
        // dropped so the user still has to sign in.
        let (user, _) = self.password_call("signUp", email, password).await?;
        info!(uid = %user.uid, "firebase account created");
        Ok(user)
    }

    #[tracing::instrument(skip(self, password))]
    async fn authenticate(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        let (user, credentials) = self
            .password_call("signInWithPassword", email, password)
            .await?;
        self.client.store_credentials(credentials);
        Ok(user)
    }

    async fn end_session(&self) -> Result<(), ServiceError> {
        match self.client.clear_credentials() {
            Some(user) => debug!(uid = %user.uid, "dropped firebase credentials"),
            None => debug!("end_session without credentials"),
        }
        Ok(())
    }
}
