use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Redirect;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use crate::auth::callback::{run_callback, CallbackFlow};
use crate::auth::{AuthApi, AuthError, CurrentUser, Session, SESSION_COOKIE};
use crate::db::{PgProfiles, ProfileStore};
use crate::error::AppError;
use crate::models::ActionResponse;
use crate::profile::is_profile_complete;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/auth/callback", get(callback))
        .route("/auth/signup", post(sign_up))
        .route("/auth/login", post(sign_in))
        .route("/auth/logout", post(sign_out))
        .route("/auth/login/google", get(sign_in_with_google))
        .with_state(state)
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Entry point for every provider redirect: signup confirmations, OAuth
/// returns and password-recovery links all land here and get classified.
async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> (CookieJar, Redirect) {
    let flow = CallbackFlow::classify(query.code, query.kind);
    let bearer = jar.get(SESSION_COOKIE).map(|c| c.value().to_owned());
    let profiles = PgProfiles(state.pool.clone());

    let (outcome, session) =
        run_callback(flow, state.auth.as_ref(), &profiles, bearer.as_deref()).await;

    let jar = match session {
        Some(session) => jar.add(session_cookie(session)),
        None => jar,
    };
    (jar, Redirect::to(&outcome.location()))
}

fn session_cookie(session: Session) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session.access_token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

#[derive(Deserialize)]
pub struct Credentials {
    email: String,
    password: String,
}

async fn sign_up(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<Credentials>,
) -> Result<(CookieJar, Json<ActionResponse>), AppError> {
    if body.email.is_empty() || body.password.is_empty() {
        return Err(AppError::Validation("Email and password are required".to_string()));
    }

    let result = match state.auth.sign_up(&body.email, &body.password).await {
        Ok(result) => result,
        // A rejected sign-up (taken email, weak password) is a form error,
        // not an HTTP failure.
        Err(AuthError::Rejected(msg)) => return Ok((jar, Json(ActionResponse::failure(msg)))),
        Err(e) => return Err(e.into()),
    };

    let Some(user) = result.user else {
        return Ok((jar, Json(ActionResponse::failure("Failed to create account"))));
    };

    let profiles = PgProfiles(state.pool.clone());
    profiles
        .insert_minimal(user.id, user.email.as_deref().unwrap_or(&body.email))
        .await?;

    match result.session {
        Some(session) => {
            let profile = profiles.fetch(user.id).await?;
            let to = if is_profile_complete(profile.as_ref()) {
                "/dashboard"
            } else {
                "/onboarding"
            };
            Ok((jar.add(session_cookie(session)), Json(ActionResponse::redirect(to))))
        }
        // Confirmation pending; the session arrives later via the callback.
        None => Ok((jar, Json(ActionResponse::redirect("/auth/confirm-email")))),
    }
}

async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<Credentials>,
) -> Result<(CookieJar, Json<ActionResponse>), AppError> {
    if body.email.is_empty() || body.password.is_empty() {
        return Err(AppError::Validation("Email and password are required".to_string()));
    }

    let session = match state.auth.sign_in_with_password(&body.email, &body.password).await {
        Ok(session) => session,
        Err(AuthError::Rejected(msg)) => return Ok((jar, Json(ActionResponse::failure(msg)))),
        Err(e) => return Err(e.into()),
    };

    let user = match session.user.clone() {
        Some(user) => user,
        None => state
            .auth
            .get_user(Some(&session.access_token))
            .await?
            .ok_or(AppError::Unauthorized)?,
    };

    let profile = PgProfiles(state.pool.clone()).fetch(user.id).await?;
    let to = if is_profile_complete(profile.as_ref()) {
        "/dashboard"
    } else {
        "/onboarding"
    };
    Ok((jar.add(session_cookie(session)), Json(ActionResponse::redirect(to))))
}

async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> (CookieJar, Json<ActionResponse>) {
    if let Some(token) = CurrentUser::token_from(&headers) {
        if let Err(e) = state.auth.sign_out(&token).await {
            tracing::warn!("provider sign-out failed: {e}");
        }
    }
    let removal = Cookie::build(SESSION_COOKIE).path("/").build();
    (jar.remove(removal), Json(ActionResponse::redirect("/")))
}

async fn sign_in_with_google(State(state): State<AppState>) -> Redirect {
    let redirect_to = format!("{}/auth/callback", state.site_url);
    Redirect::to(&state.auth.oauth_authorize_url("google", &redirect_to))
}
