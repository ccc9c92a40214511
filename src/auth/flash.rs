use axum_extra::extract::cookie::PrivateCookieJar;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::session::{CookieSettings, removal_cookie};

pub const FLASH_COOKIE: &str = "agency_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Message,
    Error,
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: FlashCategory,
    pub message: String,
}

impl Flash {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            category: FlashCategory::Message,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            category: FlashCategory::Error,
            message: message.into(),
        }
    }
}

fn pending(jar: &PrivateCookieJar) -> Vec<Flash> {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return Vec::new();
    };
    serde_json::from_str(cookie.value())
        .inspect_err(|e| warn!(error = %e, "discarding unreadable flash cookie"))
        .unwrap_or_default()
}

/// Queue `flash` behind any messages not yet shown.
pub fn push(jar: PrivateCookieJar, flash: Flash, settings: &CookieSettings) -> PrivateCookieJar {
    let mut queued = pending(&jar);
    queued.push(flash);
    match serde_json::to_string(&queued) {
        Ok(value) => jar.add(settings.build(FLASH_COOKIE, value, None)),
        Err(e) => {
            warn!(error = %e, "failed to encode flash messages");
            jar
        }
    }
}

/// Pop every queued message, clearing the cookie.
pub fn take(jar: PrivateCookieJar) -> (PrivateCookieJar, Vec<Flash>) {
    let queued = pending(&jar);
    if queued.is_empty() && jar.get(FLASH_COOKIE).is_none() {
        return (jar, queued);
    }
    (jar.remove(removal_cookie(FLASH_COOKIE)), queued)
}
