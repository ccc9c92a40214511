use axum::extract::{FromRequestParts, OriginalUri};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::PrivateCookieJar;
use tracing::debug;

use crate::auth::session::{self, SessionUser, login_url};
use crate::error::AgencyError;
use crate::router::AppState;

/// Path and query the client originally asked for, used as `next`.
fn requested_target(parts: &Parts) -> String {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or(&parts.uri);
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

fn redirect_to_login(parts: &Parts) -> Redirect {
    Redirect::to(&login_url(Some(&requested_target(parts))))
}

/// Requires a live session. Anonymous requests are redirected to
/// `/login?next=...`; a session for a user that no longer exists is dropped.
#[derive(Debug, Clone)]
pub struct RequireSession(pub SessionUser);

impl FromRequestParts<AppState> for RequireSession {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = match PrivateCookieJar::from_request_parts(parts, state).await {
            Ok(jar) => jar,
            Err(never) => match never {},
        };

        let Some(user_id) = session::session_user_id(&jar) else {
            debug!(path = %parts.uri.path(), "anonymous request to protected route");
            return Err(redirect_to_login(parts).into_response());
        };

        match state.store.get_user(user_id).await {
            Ok(Some(user)) => Ok(Self(SessionUser::from(&user))),
            Ok(None) => {
                debug!(user_id, "session refers to a deleted user");
                let jar = session::clear(jar);
                Err((jar, redirect_to_login(parts)).into_response())
            }
            Err(err) => Err(err.into_response()),
        }
    }
}

/// A session whose user carries the admin flag; others get 403.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub SessionUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireSession(user) = RequireSession::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AgencyError::Forbidden.into_response());
        }
        Ok(Self(user))
    }
}
