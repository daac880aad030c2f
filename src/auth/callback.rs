//! Classifies an inbound auth redirect and drives it to one of five
//! redirect surfaces. Earlier revisions of this flow grew duplicate `if`
//! blocks over the same two query parameters; normalizing to a single
//! first-match-wins classification makes a dead branch unrepresentable.

use super::{AuthApi, AuthUser, Session};
use crate::db::ProfileStore;
use crate::profile::is_profile_complete;

/// The one flow a `{code, type}` pair selects. Precedence: recovery, then
/// OAuth, then signup, then the session-check fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackFlow {
    Recovery { code: String },
    OAuth { code: String },
    Signup { code: String },
    SessionCheck,
}

impl CallbackFlow {
    pub fn classify(code: Option<String>, kind: Option<String>) -> Self {
        match (code, kind.as_deref()) {
            (Some(code), Some("recovery")) => Self::Recovery { code },
            (Some(code), None) => Self::OAuth { code },
            (Some(code), Some("signup")) => Self::Signup { code },
            _ => Self::SessionCheck,
        }
    }
}

/// Error codes surfaced to the login page via the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackError {
    ConfirmationFailed,
    OauthFailed,
    AuthFailed,
    ResetFailed,
    SessionExpired,
}

impl CallbackError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfirmationFailed => "confirmation_failed",
            Self::OauthFailed => "oauth_failed",
            Self::AuthFailed => "auth_failed",
            Self::ResetFailed => "reset_failed",
            Self::SessionExpired => "session_expired",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    ResetPassword,
    Onboarding,
    Dashboard,
    Landing,
    LoginError(CallbackError),
}

impl CallbackOutcome {
    pub fn location(self) -> String {
        match self {
            Self::ResetPassword => "/auth/reset-password?reset=true".to_string(),
            Self::Onboarding => "/onboarding".to_string(),
            Self::Dashboard => "/dashboard".to_string(),
            Self::Landing => "/".to_string(),
            Self::LoginError(e) => format!("/login?error={}", e.as_str()),
        }
    }
}

/// Runs the classified flow to completion. Every external call is awaited in
/// sequence and checked individually; any failure is terminal for the
/// request and degrades to a login redirect, never to a raised error. The
/// returned session, when present, is the one the handler should persist.
pub async fn run_callback(
    flow: CallbackFlow,
    auth: &dyn AuthApi,
    profiles: &dyn ProfileStore,
    bearer: Option<&str>,
) -> (CallbackOutcome, Option<Session>) {
    match flow {
        CallbackFlow::Recovery { code } => match auth.exchange_code(&code).await {
            Err(e) => {
                tracing::warn!("recovery code exchange failed: {e}");
                (CallbackOutcome::LoginError(CallbackError::ResetFailed), None)
            }
            // The reset page needs a live session; verify one actually came
            // out of the exchange before sending the user there.
            Ok(session) => match auth.get_user(Some(&session.access_token)).await {
                Ok(Some(_)) => (CallbackOutcome::ResetPassword, Some(session)),
                Ok(None) | Err(_) => {
                    (CallbackOutcome::LoginError(CallbackError::SessionExpired), None)
                }
            },
        },
        CallbackFlow::OAuth { code } => match auth.exchange_code(&code).await {
            Err(e) => {
                tracing::warn!("oauth code exchange failed: {e}");
                (CallbackOutcome::LoginError(CallbackError::OauthFailed), None)
            }
            Ok(session) => match settle_signed_in(auth, profiles, &session).await {
                Ok(outcome) => (outcome, Some(session)),
                Err(e) => (CallbackOutcome::LoginError(e), None),
            },
        },
        CallbackFlow::Signup { code } => match auth.exchange_code(&code).await {
            Err(e) => {
                tracing::warn!("signup confirmation exchange failed: {e}");
                (CallbackOutcome::LoginError(CallbackError::ConfirmationFailed), None)
            }
            Ok(session) => match settle_signed_in(auth, profiles, &session).await {
                Ok(outcome) => (outcome, Some(session)),
                Err(e) => (CallbackOutcome::LoginError(e), None),
            },
        },
        CallbackFlow::SessionCheck => match auth.get_user(bearer).await {
            Ok(Some(user)) => match route_by_completeness(profiles, &user).await {
                Ok(outcome) => (outcome, None),
                Err(e) => (CallbackOutcome::LoginError(e), None),
            },
            // No live session, or a provider we could not reach: back to the
            // public landing page either way.
            Ok(None) | Err(_) => (CallbackOutcome::Landing, None),
        },
    }
}

/// Shared tail of the OAuth and signup flows: resolve the user, make sure a
/// profile row exists (the only conditional write in the system), then route
/// on completeness.
async fn settle_signed_in(
    auth: &dyn AuthApi,
    profiles: &dyn ProfileStore,
    session: &Session,
) -> Result<CallbackOutcome, CallbackError> {
    let user = match auth.get_user(Some(&session.access_token)).await {
        Ok(Some(user)) => user,
        Ok(None) | Err(_) => return Err(CallbackError::AuthFailed),
    };

    let existing = profiles
        .fetch(user.id)
        .await
        .map_err(|_| CallbackError::AuthFailed)?;
    if existing.is_none() {
        profiles
            .insert_minimal(user.id, user.email.as_deref().unwrap_or(""))
            .await
            .map_err(|_| CallbackError::AuthFailed)?;
    }

    route_by_completeness(profiles, &user).await
}

async fn route_by_completeness(
    profiles: &dyn ProfileStore,
    user: &AuthUser,
) -> Result<CallbackOutcome, CallbackError> {
    let profile = profiles
        .fetch(user.id)
        .await
        .map_err(|_| CallbackError::AuthFailed)?;
    if is_profile_complete(profile.as_ref()) {
        Ok(CallbackOutcome::Dashboard)
    } else {
        Ok(CallbackOutcome::Onboarding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthError;
    use crate::models::Profile;
    use crate::profile::tests::{blank_profile, complete_profile};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use uuid::Uuid;

    struct ScriptedAuth {
        exchange_ok: bool,
        user: Option<AuthUser>,
    }

    impl ScriptedAuth {
        fn signed_in(id: Uuid) -> Self {
            Self {
                exchange_ok: true,
                user: Some(AuthUser { id, email: Some("a@example.com".into()) }),
            }
        }
    }

    #[async_trait]
    impl AuthApi for ScriptedAuth {
        async fn exchange_code(&self, _code: &str) -> Result<Session, AuthError> {
            if self.exchange_ok {
                Ok(Session { access_token: "tok".into(), user: self.user.clone() })
            } else {
                Err(AuthError::Rejected("bad code".into()))
            }
        }

        async fn get_user(&self, token: Option<&str>) -> Result<Option<AuthUser>, AuthError> {
            Ok(token.and_then(|_| self.user.clone()))
        }
    }

    #[derive(Default)]
    struct MemProfiles {
        profile: Mutex<Option<Profile>>,
        fetches: AtomicUsize,
        inserts: AtomicUsize,
    }

    impl MemProfiles {
        fn with(profile: Profile) -> Self {
            Self { profile: Mutex::new(Some(profile)), ..Self::default() }
        }
    }

    #[async_trait]
    impl ProfileStore for MemProfiles {
        async fn fetch(&self, _user_id: Uuid) -> Result<Option<Profile>, sqlx::Error> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.profile.lock().unwrap().clone())
        }

        async fn insert_minimal(&self, user_id: Uuid, email: &str) -> Result<(), sqlx::Error> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            let mut slot = self.profile.lock().unwrap();
            if slot.is_none() {
                *slot = Some(Profile {
                    id: user_id,
                    email: email.into(),
                    ..blank_profile()
                });
            }
            Ok(())
        }
    }

    #[test]
    fn classification_precedence() {
        let code = || Some("abc".to_string());
        assert_eq!(
            CallbackFlow::classify(code(), Some("recovery".into())),
            CallbackFlow::Recovery { code: "abc".into() }
        );
        assert_eq!(
            CallbackFlow::classify(code(), None),
            CallbackFlow::OAuth { code: "abc".into() }
        );
        assert_eq!(
            CallbackFlow::classify(code(), Some("signup".into())),
            CallbackFlow::Signup { code: "abc".into() }
        );
        assert_eq!(CallbackFlow::classify(None, None), CallbackFlow::SessionCheck);
        assert_eq!(
            CallbackFlow::classify(None, Some("recovery".into())),
            CallbackFlow::SessionCheck
        );
    }

    #[tokio::test]
    async fn recovery_redirects_to_reset_without_touching_profiles() {
        let auth = ScriptedAuth::signed_in(Uuid::new_v4());
        let profiles = MemProfiles::default();

        let (outcome, session) = run_callback(
            CallbackFlow::Recovery { code: "abc".into() },
            &auth,
            &profiles,
            None,
        )
        .await;

        assert_eq!(outcome.location(), "/auth/reset-password?reset=true");
        assert!(session.is_some());
        assert_eq!(profiles.fetches.load(Ordering::SeqCst), 0);
        assert_eq!(profiles.inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_recovery_exchange_reports_reset_failed() {
        let auth = ScriptedAuth { exchange_ok: false, user: None };
        let profiles = MemProfiles::default();

        let (outcome, session) = run_callback(
            CallbackFlow::Recovery { code: "abc".into() },
            &auth,
            &profiles,
            None,
        )
        .await;

        assert_eq!(outcome.location(), "/login?error=reset_failed");
        assert!(session.is_none());
    }

    #[tokio::test]
    async fn signup_inserts_one_profile_then_routes_to_onboarding() {
        let auth = ScriptedAuth::signed_in(Uuid::new_v4());
        let profiles = MemProfiles::default();

        let (outcome, session) = run_callback(
            CallbackFlow::Signup { code: "abc".into() },
            &auth,
            &profiles,
            None,
        )
        .await;

        // The minimal row lacks city and fasting goal, so onboarding it is.
        assert_eq!(outcome, CallbackOutcome::Onboarding);
        assert!(session.is_some());
        assert_eq!(profiles.inserts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn oauth_with_complete_profile_lands_on_dashboard() {
        let user_id = Uuid::new_v4();
        let auth = ScriptedAuth::signed_in(user_id);
        let profiles = MemProfiles::with(Profile { id: user_id, ..complete_profile() });

        let (outcome, _) = run_callback(
            CallbackFlow::OAuth { code: "abc".into() },
            &auth,
            &profiles,
            None,
        )
        .await;

        assert_eq!(outcome, CallbackOutcome::Dashboard);
        assert_eq!(profiles.inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_oauth_exchange_reports_oauth_failed() {
        let auth = ScriptedAuth { exchange_ok: false, user: None };
        let profiles = MemProfiles::default();

        let (outcome, _) =
            run_callback(CallbackFlow::OAuth { code: "abc".into() }, &auth, &profiles, None).await;

        assert_eq!(outcome.location(), "/login?error=oauth_failed");
    }

    #[tokio::test]
    async fn no_code_and_no_session_lands_on_landing_page() {
        let auth = ScriptedAuth { exchange_ok: true, user: None };
        let profiles = MemProfiles::default();

        let (outcome, session) =
            run_callback(CallbackFlow::SessionCheck, &auth, &profiles, None).await;

        assert_eq!(outcome, CallbackOutcome::Landing);
        assert!(session.is_none());
    }

    #[tokio::test]
    async fn existing_session_routes_by_completeness() {
        let user_id = Uuid::new_v4();
        let auth = ScriptedAuth::signed_in(user_id);
        let profiles = MemProfiles::with(Profile { id: user_id, ..blank_profile() });

        let (outcome, _) =
            run_callback(CallbackFlow::SessionCheck, &auth, &profiles, Some("tok")).await;

        assert_eq!(outcome, CallbackOutcome::Onboarding);
        // Read-only: the fallback never inserts.
        assert_eq!(profiles.inserts.load(Ordering::SeqCst), 0);
    }
}
