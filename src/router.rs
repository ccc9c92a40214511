use axum::{
    Router,
    extract::FromRef,
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use minijinja::Environment;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::auth::CookieSettings;
use crate::auth::password::decoy_hash;
use crate::config::Config;
use crate::db::sqlite::AgencyStore;
use crate::error::AgencyError;
use crate::handlers::{admin, auth, health, letters, pages, search};
use crate::service::pdf::{PdfRenderer, WkhtmltopdfRenderer};
use crate::service::search::MatchMode;
use crate::service::throttle::LoginThrottle;

/// Everything a request handler may reach. Built once in `main` (or a test)
/// and cloned into each request.
#[derive(Clone)]
pub struct AppState {
    pub store: AgencyStore,
    pub config: Arc<Config>,
    pub key: Key,
    pub cookies: CookieSettings,
    pub pages: Arc<Environment<'static>>,
    pub renderer: Arc<dyn PdfRenderer>,
    pub throttle: LoginThrottle,
    /// Verified in place of a stored hash when the username is unknown.
    pub decoy_hash: Arc<str>,
}

impl AppState {
    pub fn new(
        store: AgencyStore,
        config: Config,
        key: Key,
        renderer: Arc<dyn PdfRenderer>,
    ) -> Result<Self, AgencyError> {
        Ok(Self {
            store,
            cookies: CookieSettings::from_config(&config),
            throttle: LoginThrottle::per_minute(config.login_attempts_per_minute),
            pages: Arc::new(pages::page_environment()?),
            decoy_hash: Arc::from(decoy_hash()?),
            config: Arc::new(config),
            key,
            renderer,
        })
    }

    /// Connect the store, derive the cookie key and wire the wkhtmltopdf engine.
    pub async fn from_config(config: Config) -> Result<Self, AgencyError> {
        let store = AgencyStore::connect(&config.database_url).await?;
        let key = match config.session_key_bytes()? {
            Some(bytes) => Key::from(bytes.as_slice()),
            None => {
                warn!("no session_key configured; sessions will not survive a restart");
                Key::generate()
            }
        };
        let renderer: Arc<dyn PdfRenderer> = Arc::new(WkhtmltopdfRenderer::new(
            config.wkhtmltopdf.clone(),
            config.pdf_timeout(),
        ));
        Self::new(store, config, key, renderer)
    }

    pub fn search_mode(&self) -> MatchMode {
        MatchMode::from_flag(self.config.case_sensitive_search)
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

pub fn agency_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/login", get(auth::login_page).post(auth::login_submit))
        .route("/logout", get(auth::logout))
        .route("/signup", get(auth::signup_page).post(auth::signup_submit))
        .route("/", get(pages::index))
        .route("/reports", get(pages::reports))
        .route("/results", get(pages::results))
        .route("/management", get(pages::management))
        .route("/history", get(pages::history))
        .route("/settings", get(pages::settings))
        .route("/admin", get(pages::admin))
        .route("/profile/{name}", get(pages::profile))
        .route("/process", post(search::process))
        .route("/genreport", get(letters::genreport))
        .nest("/admin/api", admin::admin_api_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
