use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use url::form_urlencoded;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub mod callback;

/// Cookie carrying the provider access token between requests.
pub const SESSION_COOKIE: &str = "km_session";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("auth provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Session material returned by a successful code or password exchange.
/// Only the access token is persisted client-side; the provider's other
/// token fields are ignored on decode.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

/// The three provider operations the callback state machine consumes. Kept
/// behind a trait so the machine can run against a scripted provider in
/// tests.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchanges a one-time redirect code for a session.
    async fn exchange_code(&self, code: &str) -> Result<Session, AuthError>;

    /// Resolves the user behind an access token. `Ok(None)` means no live
    /// session, which callers treat as "signed out", not as a failure.
    async fn get_user(&self, access_token: Option<&str>) -> Result<Option<AuthUser>, AuthError>;
}

/// Result of a sign-up call: the provider returns a session immediately when
/// email confirmation is disabled, otherwise only the pending user.
#[derive(Debug, Clone)]
pub struct SignUpResult {
    pub user: Option<AuthUser>,
    pub session: Option<Session>,
}

#[derive(Deserialize)]
struct SignUpReply {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<AuthUser>,
    // Confirmation-pending replies carry the user fields at the top level.
    #[serde(default)]
    id: Option<Uuid>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize)]
struct ProviderError {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for a GoTrue-style auth provider. Session persistence is the
/// provider's concern; this client only moves tokens.
pub struct AuthClient {
    http: Client,
    base: String,
    api_key: String,
}

impl AuthClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn request(&self, builder: RequestBuilder, bearer: Option<&str>) -> RequestBuilder {
        let builder = builder.header("apikey", &self.api_key);
        match bearer {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check(resp: Response) -> Result<Response, AuthError> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let message = match resp.json::<ProviderError>().await {
            Ok(body) => body
                .error_description
                .or(body.msg)
                .or(body.error)
                .unwrap_or_else(|| format!("HTTP {status}")),
            Err(_) => format!("HTTP {status}"),
        };
        Err(AuthError::Rejected(message))
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResult, AuthError> {
        let resp = self
            .request(self.http.post(format!("{}/signup", self.base)), None)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let reply: SignUpReply = Self::check(resp).await?.json().await?;

        let user = reply.user.clone().or_else(|| {
            reply.id.map(|id| AuthUser { id, email: reply.email.clone() })
        });
        let session = reply
            .access_token
            .map(|access_token| Session { access_token, user: reply.user });
        Ok(SignUpResult { user, session })
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let resp = self
            .request(
                self.http
                    .post(format!("{}/token?grant_type=password", self.base)),
                None,
            )
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let resp = self
            .request(
                self.http.post(format!("{}/logout", self.base)),
                Some(access_token),
            )
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// Provider page that starts an OAuth dance for `provider`, sending the
    /// browser back to `redirect_to` with a one-time code.
    pub fn oauth_authorize_url(&self, provider: &str, redirect_to: &str) -> String {
        let query: String = form_urlencoded::Serializer::new(String::new())
            .append_pair("provider", provider)
            .append_pair("redirect_to", redirect_to)
            .finish();
        format!("{}/authorize?{}", self.base, query)
    }
}

#[async_trait]
impl AuthApi for AuthClient {
    async fn exchange_code(&self, code: &str) -> Result<Session, AuthError> {
        let resp = self
            .request(
                self.http
                    .post(format!("{}/token?grant_type=authorization_code", self.base)),
                None,
            )
            .json(&json!({ "auth_code": code }))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn get_user(&self, access_token: Option<&str>) -> Result<Option<AuthUser>, AuthError> {
        let Some(token) = access_token else {
            return Ok(None);
        };
        let resp = self
            .request(self.http.get(format!("{}/user", self.base)), Some(token))
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED
            || resp.status() == reqwest::StatusCode::FORBIDDEN
        {
            return Ok(None);
        }
        Ok(Some(Self::check(resp).await?.json().await?))
    }
}

/// Extracts the calling user from a bearer token or the session cookie.
/// Rejects with 401 when neither resolves to a live session.
pub struct CurrentUser(pub AuthUser);

impl CurrentUser {
    /// Token the request authenticated with, for routes that need to pass
    /// it back to the provider (sign-out).
    pub fn token_from(parts_headers: &axum::http::HeaderMap) -> Option<String> {
        bearer_token(parts_headers)
            .or_else(|| session_cookie_token(parts_headers))
    }
}

fn bearer_token(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned)
}

fn session_cookie_token(headers: &axum::http::HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_owned())
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = Self::token_from(&parts.headers) else {
            return Err(AppError::Unauthorized);
        };
        match state.auth.get_user(Some(&token)).await? {
            Some(user) => Ok(Self(user)),
            None => Err(AppError::Unauthorized),
        }
    }
}
