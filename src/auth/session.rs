use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use serde::Serialize;
use time::Duration;

use crate::config::Config;
use crate::db::models::User;

pub const SESSION_COOKIE: &str = "agency_session";

/// The authenticated principal. Carries only what a request needs to know
/// about who is signed in, never credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    admin: bool,
}

impl SessionUser {
    pub fn is_admin(&self) -> bool {
        self.admin
    }
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: format!("{} {}", user.first, user.last),
            admin: user.admin,
        }
    }
}

/// Attributes shared by every cookie the app issues.
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub secure: bool,
    pub remember_for: Duration,
}

impl CookieSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            secure: !cfg.insecure_cookie,
            remember_for: Duration::days(cfg.remember_days.max(1)),
        }
    }

    pub(crate) fn build(&self, name: &str, value: String, max_age: Option<Duration>) -> Cookie<'static> {
        let mut builder = Cookie::build(Cookie::new(name.to_string(), value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax);
        if let Some(max_age) = max_age {
            builder = builder.max_age(max_age);
        }
        builder.build()
    }
}

pub(crate) fn removal_cookie(name: &str) -> Cookie<'static> {
    Cookie::build(Cookie::new(name.to_string(), ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Mark `user_id` as signed in. `remember` makes the cookie outlive the
/// browser session.
pub fn establish(
    jar: PrivateCookieJar,
    user_id: i64,
    remember: bool,
    settings: &CookieSettings,
) -> PrivateCookieJar {
    let max_age = remember.then_some(settings.remember_for);
    jar.add(settings.build(SESSION_COOKIE, user_id.to_string(), max_age))
}

/// Drop the session. Harmless when there is none.
pub fn clear(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(removal_cookie(SESSION_COOKIE))
}

pub fn session_user_id(jar: &PrivateCookieJar) -> Option<i64> {
    jar.get(SESSION_COOKIE)
        .and_then(|c| c.value().parse::<i64>().ok())
}

/// `next` if it is a local absolute path, else the landing page.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

/// `/login`, carrying `next` when there is somewhere to return to.
pub fn login_url(next: Option<&str>) -> String {
    match next {
        Some(next) if !next.is_empty() => {
            let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
            format!("/login?next={encoded}")
        }
        _ => "/login".to_string(),
    }
}
