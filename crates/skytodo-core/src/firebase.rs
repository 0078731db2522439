//! Firebase REST backends: Identity Toolkit for accounts and Cloud Firestore
//! for the per-user task document.
//!
//! [`connect`] returns both halves sharing one HTTP client and one set of
//! in-memory credentials; nothing is written to browser storage.

pub mod auth;
pub mod firestore;

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub use auth::FirebaseAuth;
pub use firestore::FirestoreStore;

use crate::config::FirebaseConfig;
use crate::error::ServiceError;
use crate::session::{User, UserId};

/// Refresh the id token when it has less than this left.
const REFRESH_MARGIN_SECS: i64 = 60;
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

pub fn connect(config: &FirebaseConfig) -> (FirebaseAuth, FirestoreStore) {
    let client = Rc::new(FirebaseClient::new(config.clone()));
    info!(project = %config.project_id, collection = %config.collection, "firebase backend ready");
    (FirebaseAuth::new(client.clone()), FirestoreStore::new(client))
}

#[derive(Debug, Clone)]
struct Credentials {
    user: User,
    id_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl Credentials {
    fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - now < Duration::seconds(REFRESH_MARGIN_SECS)
    }
}

#[derive(Debug)]
pub(crate) struct FirebaseClient {
    http: reqwest::Client,
    config: FirebaseConfig,
    credentials: RefCell<Option<Credentials>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

impl FirebaseClient {
    fn new(config: FirebaseConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            credentials: RefCell::new(None),
        }
    }

    fn config(&self) -> &FirebaseConfig {
        &self.config
    }

    fn store_credentials(&self, credentials: Credentials) {
        debug!(uid = %credentials.user.uid, expires_at = %credentials.expires_at, "stored credentials");
        *self.credentials.borrow_mut() = Some(credentials);
    }

    fn clear_credentials(&self) -> Option<User> {
        self.credentials.borrow_mut().take().map(|creds| creds.user)
    }

    fn signed_in_uid(&self) -> Option<UserId> {
        self.credentials
            .borrow()
            .as_ref()
            .map(|creds| creds.user.uid.clone())
    }

    /// A currently valid id token, refreshing it first when close to expiry.
    async fn id_token(&self) -> Result<String, ServiceError> {
        let Some(creds) = self.credentials.borrow().clone() else {
            return Err(ServiceError::NotSignedIn);
        };
        if !creds.needs_refresh(Utc::now()) {
            return Ok(creds.id_token);
        }

        debug!(uid = %creds.user.uid, "refreshing id token");
        let url = format!(
            "{}/v1/token?key={}",
            self.config.token_endpoint.trim_end_matches('/'),
            self.config.api_key
        );
        let refreshed: RefreshResponse = self
            .post_json(
                &url,
                &RefreshRequest {
                    grant_type: "refresh_token",
                    refresh_token: &creds.refresh_token,
                },
            )
            .await?;

        let next = Credentials {
            id_token: refreshed.id_token.clone(),
            refresh_token: refreshed.refresh_token,
            expires_at: expiry_from(refreshed.expires_in.as_deref(), Utc::now()),
            user: creds.user,
        };
        // A sign-out while the refresh was in flight wins.
        if self.signed_in_uid().as_ref() == Some(&next.user.uid) {
            self.store_credentials(next);
        }
        Ok(refreshed.id_token)
    }

    async fn post_json<B, R>(&self, url: &str, body: &B) -> Result<R, ServiceError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let payload =
            serde_json::to_string(body).map_err(|err| ServiceError::Decode(err.to_string()))?;
        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        decode_response(status, &text)
    }
}

fn decode_response<R: DeserializeOwned>(status: StatusCode, body: &str) -> Result<R, ServiceError> {
    if !status.is_success() {
        return Err(rejection(status, body));
    }
    serde_json::from_str(body).map_err(|err| ServiceError::Decode(err.to_string()))
}

/// The service's own message when the body carries one.
fn rejection(status: StatusCode, body: &str) -> ServiceError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => ServiceError::Rejected(parsed.error.message),
        Err(_) => {
            warn!(%status, "error response without a message");
            ServiceError::Rejected(format!("HTTP {status}"))
        }
    }
}

fn expiry_from(expires_in: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    let secs = expires_in
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
    now + Duration::seconds(secs)
}
