use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use tracing::{info, warn};

use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::session::{self, login_url, safe_next};
use crate::auth::{Flash, flash};
use crate::db::models::NewUser;
use crate::error::AgencyError;
use crate::handlers::pages::{PageContext, render_page};
use crate::middleware::form::RequiredForm;
use crate::router::AppState;
use crate::types::forms::{LoginForm, NextQuery, SignupForm};

const INVALID_CREDENTIALS: &str = "Username or Password is invalid";
const THROTTLED: &str = "Too many login attempts; try again later";

/// GET /login
pub async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
    jar: PrivateCookieJar,
) -> Result<Response, AgencyError> {
    let ctx = PageContext {
        next: query.next,
        ..PageContext::default()
    };
    render_page(&state, jar, "login.html", ctx)
}

/// POST /login
pub async fn login_submit(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
    jar: PrivateCookieJar,
    RequiredForm(form): RequiredForm<LoginForm>,
) -> Result<Response, AgencyError> {
    let next = query.next.as_deref();
    let rejected = |jar: PrivateCookieJar, message: &str| {
        let jar = flash::push(jar, Flash::error(message), &state.cookies);
        (jar, Redirect::to(&login_url(next))).into_response()
    };

    if !state.throttle.allow(&form.username) {
        warn!(username = %form.username, "login throttled");
        return Ok(rejected(jar, THROTTLED));
    }

    let remember = form.remember();
    let user = state.store.find_user_by_username(&form.username).await?;
    // unknown usernames still pay for one verification
    let stored = match &user {
        Some(user) => user.password_hash.clone(),
        None => state.decoy_hash.to_string(),
    };
    let verified = verify_password_blocking(form.password, stored).await?;
    let Some(user) = user.filter(|_| verified) else {
        info!(username = %form.username, "login rejected");
        return Ok(rejected(jar, INVALID_CREDENTIALS));
    };

    let jar = session::establish(jar, user.id, remember, &state.cookies);
    let jar = flash::push(jar, Flash::message("Logged in Successfully"), &state.cookies);
    info!(user_id = user.id, username = %user.username, remember, "login succeeded");
    Ok((jar, Redirect::to(safe_next(next))).into_response())
}

/// GET /logout
pub async fn logout(jar: PrivateCookieJar) -> impl IntoResponse {
    if let Some(user_id) = session::session_user_id(&jar) {
        info!(user_id, "logout");
    }
    (session::clear(jar), Redirect::to("/"))
}

/// GET /signup
pub async fn signup_page(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<Response, AgencyError> {
    render_page(&state, jar, "signup.html", PageContext::default())
}

/// POST /signup
pub async fn signup_submit(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    RequiredForm(form): RequiredForm<SignupForm>,
) -> Result<Response, AgencyError> {
    let dob = form.date_of_birth()?;
    let password_hash = hash_password_blocking(form.password).await?;
    let new_user = NewUser {
        first: form.first,
        last: form.last,
        username: form.username,
        password_hash,
        phonenumber: form.phonenumber,
        dob,
    };

    match state.store.insert_user(new_user).await {
        Ok(user) => {
            info!(user_id = user.id, username = %user.username, "user signed up");
            let jar = flash::push(jar, Flash::message("User successfully created!"), &state.cookies);
            Ok((jar, Redirect::to("/login")).into_response())
        }
        Err(AgencyError::Conflict(_)) => {
            let jar = flash::push(jar, Flash::error("That username is already taken"), &state.cookies);
            Ok((jar, Redirect::to("/signup")).into_response())
        }
        Err(err) => Err(err),
    }
}
