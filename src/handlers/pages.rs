use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use minijinja::Environment;
use serde::Serialize;

use crate::auth::{Flash, SessionUser, flash};
use crate::error::AgencyError;
use crate::middleware::auth::RequireSession;
use crate::router::AppState;

const PAGES: &[(&str, &str)] = &[
    ("base.html", include_str!("../../templates/base.html")),
    ("login.html", include_str!("../../templates/login.html")),
    ("signup.html", include_str!("../../templates/signup.html")),
    ("index.html", include_str!("../../templates/index.html")),
    ("reports.html", include_str!("../../templates/reports.html")),
    ("results.html", include_str!("../../templates/results.html")),
    ("management.html", include_str!("../../templates/management.html")),
    ("history.html", include_str!("../../templates/history.html")),
    ("settings.html", include_str!("../../templates/settings.html")),
    ("admin.html", include_str!("../../templates/admin.html")),
    ("profile.html", include_str!("../../templates/profile.html")),
];

/// Page templates compiled into the binary.
pub fn page_environment() -> Result<Environment<'static>, AgencyError> {
    let mut env = Environment::new();
    for &(name, source) in PAGES {
        env.add_template(name, source)?;
    }
    Ok(env)
}

#[derive(Debug, Default, Serialize)]
pub struct PageContext {
    pub user: Option<SessionUser>,
    pub flashes: Vec<Flash>,
    pub next: Option<String>,
    pub name: Option<String>,
}

/// Render `template`, consuming any pending flash messages.
pub fn render_page(
    state: &AppState,
    jar: PrivateCookieJar,
    template: &str,
    mut ctx: PageContext,
) -> Result<Response, AgencyError> {
    let (jar, flashes) = flash::take(jar);
    ctx.flashes = flashes;
    let html = state.pages.get_template(template)?.render(&ctx)?;
    Ok((jar, Html(html)).into_response())
}

fn signed_in(user: SessionUser) -> PageContext {
    PageContext {
        user: Some(user),
        ..PageContext::default()
    }
}

/// GET /
pub async fn index(
    State(state): State<AppState>,
    RequireSession(user): RequireSession,
    jar: PrivateCookieJar,
) -> Result<Response, AgencyError> {
    render_page(&state, jar, "index.html", signed_in(user))
}

/// GET /reports
pub async fn reports(
    State(state): State<AppState>,
    RequireSession(user): RequireSession,
    jar: PrivateCookieJar,
) -> Result<Response, AgencyError> {
    render_page(&state, jar, "reports.html", signed_in(user))
}

/// GET /results
pub async fn results(
    State(state): State<AppState>,
    RequireSession(user): RequireSession,
    jar: PrivateCookieJar,
) -> Result<Response, AgencyError> {
    render_page(&state, jar, "results.html", signed_in(user))
}

/// GET /management
pub async fn management(
    State(state): State<AppState>,
    RequireSession(user): RequireSession,
    jar: PrivateCookieJar,
) -> Result<Response, AgencyError> {
    render_page(&state, jar, "management.html", signed_in(user))
}

/// GET /history
pub async fn history(
    State(state): State<AppState>,
    RequireSession(user): RequireSession,
    jar: PrivateCookieJar,
) -> Result<Response, AgencyError> {
    render_page(&state, jar, "history.html", signed_in(user))
}

/// GET /settings
pub async fn settings(
    State(state): State<AppState>,
    RequireSession(user): RequireSession,
    jar: PrivateCookieJar,
) -> Result<Response, AgencyError> {
    render_page(&state, jar, "settings.html", signed_in(user))
}

/// GET /admin
pub async fn admin(
    State(state): State<AppState>,
    RequireSession(user): RequireSession,
    jar: PrivateCookieJar,
) -> Result<Response, AgencyError> {
    render_page(&state, jar, "admin.html", signed_in(user))
}

/// GET /profile/{name}
pub async fn profile(
    State(state): State<AppState>,
    RequireSession(user): RequireSession,
    Path(name): Path<String>,
    jar: PrivateCookieJar,
) -> Result<Response, AgencyError> {
    let ctx = PageContext {
        name: Some(name),
        ..signed_in(user)
    };
    render_page(&state, jar, "profile.html", ctx)
}
