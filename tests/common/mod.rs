#![allow(dead_code)]

use agency_office::auth::password::hash_password;
use agency_office::config::Config;
use agency_office::db::models::{ContactForm, NewUser, User, UserUpdate};
use agency_office::db::sqlite::AgencyStore;
use agency_office::router::{AppState, agency_router};
use agency_office::service::pdf::PdfRenderer;
use agency_office::AgencyError;
use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use axum_extra::extract::cookie::Key;
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

/// Renderer double: wraps the HTML in PDF markers and remembers it.
#[derive(Default)]
pub struct StubRenderer {
    pub last_html: Mutex<Option<String>>,
}

#[async_trait]
impl PdfRenderer for StubRenderer {
    async fn render(&self, html: &str) -> Result<Vec<u8>, AgencyError> {
        *self.last_html.lock().expect("renderer lock poisoned") = Some(html.to_string());
        Ok(format!("%PDF-1.4\n{html}\n%%EOF").into_bytes())
    }
}

pub struct FailingRenderer;

#[async_trait]
impl PdfRenderer for FailingRenderer {
    async fn render(&self, _html: &str) -> Result<Vec<u8>, AgencyError> {
        Err(AgencyError::PdfEngine("engine exited with 1".to_string()))
    }
}

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    _dir: TempDir,
}

pub fn test_config() -> Config {
    Config {
        insecure_cookie: true,
        ..Config::default()
    }
}

pub async fn spawn_app() -> (TestApp, Arc<StubRenderer>) {
    let renderer = Arc::new(StubRenderer::default());
    let app = spawn_app_with(test_config(), renderer.clone()).await;
    (app, renderer)
}

pub async fn spawn_app_with(mut cfg: Config, renderer: Arc<dyn PdfRenderer>) -> TestApp {
    let dir = TempDir::new().expect("failed to create temp dir");
    cfg.database_url = format!("sqlite:{}", dir.path().join("agency.sqlite").display());
    let store = AgencyStore::connect(&cfg.database_url)
        .await
        .expect("failed to open test database");
    let state = AppState::new(store, cfg, Key::generate(), renderer).expect("failed to build state");
    TestApp {
        app: agency_router(state.clone()),
        state,
        _dir: dir,
    }
}

impl TestApp {
    pub fn client(&self) -> Client {
        Client {
            app: self.app.clone(),
            cookies: BTreeMap::new(),
        }
    }

    pub async fn create_user(&self, username: &str, password: &str, admin: bool) -> User {
        let dob = NaiveDate::from_ymd_opt(1985, 6, 15).expect("valid date");
        let user = self
            .state
            .store
            .insert_user(NewUser {
                first: "Test".into(),
                last: "User".into(),
                username: username.into(),
                password_hash: hash_password(password).expect("hash failed"),
                phonenumber: "555-0000".into(),
                dob,
            })
            .await
            .expect("failed to insert user");
        if !admin {
            return user;
        }
        self.state
            .store
            .update_user(
                user.id,
                UserUpdate {
                    first: user.first,
                    last: user.last,
                    username: user.username,
                    password_hash: None,
                    phonenumber: user.phonenumber,
                    dob: user.dob,
                    admin: true,
                },
            )
            .await
            .expect("failed to promote user")
            .expect("user vanished")
    }

    pub async fn create_contact(&self, first: &str, last: &str, phone: &str) -> i64 {
        self.state
            .store
            .insert_contact(ContactForm {
                first: first.into(),
                last: last.into(),
                street: "1 Main St".into(),
                city: "Springfield".into(),
                state: "IL".into(),
                zipcode: "62701".into(),
                phonenumber: phone.into(),
            })
            .await
            .expect("failed to insert contact")
            .id
    }

    /// A client already signed in as a fresh user.
    pub async fn signed_in(&self, username: &str, admin: bool) -> Client {
        self.create_user(username, "correct horse", admin).await;
        let mut client = self.client();
        let resp = client
            .post_form(
                "/login",
                &format!("inputEmail={username}&inputPassword=correct+horse"),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert!(client.has_cookie("agency_session"));
        client
    }
}

/// Minimal cookie-carrying client over the router.
pub struct Client {
    app: Router,
    cookies: BTreeMap<String, String>,
}

impl Client {
    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    pub async fn get(&mut self, uri: &str) -> Response<Body> {
        let req = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .expect("failed to build request");
        self.send(req).await
    }

    pub async fn post_form(&mut self, uri: &str, body: &str) -> Response<Body> {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .expect("failed to build request");
        self.send(req).await
    }

    pub async fn send_json(&mut self, method: &str, uri: &str, body: Value) -> Response<Body> {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("failed to build request");
        self.send(req).await
    }

    pub async fn send(&mut self, mut req: Request<Body>) -> Response<Body> {
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            req.headers_mut().insert(
                header::COOKIE,
                cookie.parse().expect("invalid cookie header"),
            );
        }
        let resp = self.app.clone().oneshot(req).await.expect("request failed");
        self.absorb(&resp);
        resp
    }

    fn absorb(&mut self, resp: &Response<Body>) {
        for value in resp.headers().get_all(header::SET_COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            let pair = raw.split(';').next().unwrap_or_default();
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let removed = value.is_empty() || raw.contains("Max-Age=0");
            if removed {
                self.cookies.remove(name.trim());
            } else {
                self.cookies.insert(name.trim().to_string(), value.to_string());
            }
        }
    }
}

pub fn location(resp: &Response<Body>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub fn set_cookie_for(resp: &Response<Body>, name: &str) -> Option<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|raw| raw.starts_with(&format!("{name}=")))
        .map(str::to_string)
}

pub async fn body_bytes(resp: Response<Body>) -> Vec<u8> {
    to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body")
        .to_vec()
}

pub async fn body_json(resp: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).expect("response body was not JSON")
}

pub async fn body_text(resp: Response<Body>) -> String {
    String::from_utf8(body_bytes(resp).await).expect("response body was not utf-8")
}
