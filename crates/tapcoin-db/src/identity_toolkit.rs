//! REST identity provider backend.
//!
//! Talks to an Identity Toolkit compatible endpoint:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | create account | `POST {api_url}/v1/accounts:signUp?key={api_key}` |
//! | authenticate | `POST {api_url}/v1/accounts:signInWithPassword?key={api_key}` |
//!
//! Both take `{email, password, returnSecureToken}` and answer with the
//! account's `localId`, which becomes the [`Identity`]. Failures come back
//! as `{"error": {"message": "EMAIL_EXISTS", ...}}`.

use serde::Deserialize;
use tapcoin_types::{Credentials, Identity};

use crate::error::AuthError;

/// Default public endpoint.
pub const DEFAULT_IDENTITY_API_URL: &str = "https://identitytoolkit.googleapis.com";

/// Successful sign-up / sign-in body (only the fields we use).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
}

/// Error envelope.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client for an Identity Toolkit compatible provider.
#[derive(Clone)]
pub struct IdentityToolkitClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl IdentityToolkitClient {
    /// Create a client for `api_url` (no trailing slash) with `api_key`.
    pub fn new(api_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
        }
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`AuthError`] for a provider refusal, or
    /// [`AuthError::Transport`] if the call fails.
    pub async fn create_account(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        self.call("accounts:signUp", credentials).await
    }

    /// Authenticate an existing account.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`AuthError`] for a provider refusal, or
    /// [`AuthError::Transport`] if the call fails.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        self.call("accounts:signInWithPassword", credentials).await
    }

    async fn call(&self, method: &str, credentials: &Credentials) -> Result<Identity, AuthError> {
        let url = format!("{}/v1/{method}", self.api_url);
        let body = serde_json::json!({
            "email": credentials.email,
            "password": credentials.password,
            "returnSecureToken": true,
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let account: AccountResponse = response.json().await?;
            return Ok(Identity::new(account.local_id));
        }

        let text = response.text().await?;
        let code = serde_json::from_str::<ErrorEnvelope>(&text)
            .map_or_else(|_err| format!("HTTP {status}: {text}"), |e| e.error.message);
        tracing::debug!(method, %status, code = %code, "Identity provider refused request");
        Err(map_provider_error(&code, &credentials.email))
    }
}

/// Map a provider error code onto [`AuthError`].
///
/// Codes may carry a suffix (`"WEAK_PASSWORD : Password should be ..."`),
/// so only the leading token is matched.
fn map_provider_error(code: &str, email: &str) -> AuthError {
    let token = code.split([' ', ':']).next().unwrap_or(code);
    match token {
        "EMAIL_EXISTS" => AuthError::EmailExists {
            email: email.to_owned(),
        },
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            AuthError::InvalidCredentials
        }
        _ => AuthError::Provider(code.to_owned()),
    }
}
