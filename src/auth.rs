use crate::session::SessionWatch;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use thiserror::Error;

pub const DEFAULT_AUTH_ENDPOINT: &str = "https://identitytoolkit.googleapis.com/v1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub uid: String,
    pub email: String,
    pub id_token: String,
}

/// Errors from the identity provider. Their display text is shown to the
/// user verbatim next to the triggering form.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("no account found for this email")]
    UnknownEmail,
    #[error("an account with this email already exists")]
    EmailInUse,
    #[error("password must be at least 6 characters")]
    WeakPassword,
    #[error("too many attempts, try again later")]
    RateLimited,
    #[error("auth service error: {0}")]
    Provider(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl AuthError {
    /// Provider error codes sometimes carry a trailing reason, e.g.
    /// "WEAK_PASSWORD : Password should be at least 6 characters".
    fn from_code(code: &str) -> Self {
        let head = code.split_whitespace().next().unwrap_or(code);
        match head {
            "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => AuthError::InvalidCredentials,
            "EMAIL_NOT_FOUND" => AuthError::UnknownEmail,
            "EMAIL_EXISTS" => AuthError::EmailInUse,
            "WEAK_PASSWORD" => AuthError::WeakPassword,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthError::RateLimited,
            _ => AuthError::Provider(code.to_string()),
        }
    }
}

pub fn valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"\S+@\S+\.\S+").expect("hardcoded email pattern"))
        .is_match(email)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(rename = "localId")]
    local_id: String,
    #[serde(rename = "idToken")]
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Client for an identitytoolkit-style email/password provider. Sign-in
/// publishes the session through the watch; sign-up leaves the watch
/// untouched so the app lands back on the sign-in form.
pub struct AuthClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    watch: SessionWatch,
}

impl AuthClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        AuthClient {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            watch: SessionWatch::new(),
        }
    }

    pub fn watch(&self) -> SessionWatch {
        self.watch.clone()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let token = self
            .call(
                "accounts:signInWithPassword",
                serde_json::json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;
        let session = Session {
            uid: token.local_id,
            email: email.to_string(),
            id_token: token.id_token,
        };
        tracing::info!(email = %session.email, "signed in");
        self.watch.set(Some(session.clone()));
        Ok(session)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let token = self
            .call(
                "accounts:signUp",
                serde_json::json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;
        tracing::info!(email = %email, "account created");
        Ok(Session {
            uid: token.local_id,
            email: email.to_string(),
            id_token: token.id_token,
        })
    }

    pub async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.call_raw(
            "accounts:sendOobCode",
            serde_json::json!({
                "requestType": "PASSWORD_RESET",
                "email": email,
            }),
        )
        .await?;
        tracing::info!(email = %email, "password reset requested");
        Ok(())
    }

    /// Local-only: drops the current session and notifies observers.
    pub fn sign_out(&self) -> Result<(), AuthError> {
        self.watch.set(None);
        tracing::info!("signed out");
        Ok(())
    }

    async fn call(
        &self,
        action: &str,
        body: serde_json::Value,
    ) -> Result<TokenResponse, AuthError> {
        let response = self.call_raw(action, body).await?;
        Ok(response.json::<TokenResponse>().await?)
    }

    async fn call_raw(
        &self,
        action: &str,
        body: serde_json::Value,
    ) -> Result<reqwest::Response, AuthError> {
        let url = format!("{}/{}?key={}", self.endpoint, action, self.api_key);
        let response = self.http.post(&url).json(&body).send().await?;
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(body) => Err(AuthError::from_code(&body.error.message)),
            Err(_) => Err(AuthError::Provider(format!("unexpected status {status}"))),
        }
    }
}
