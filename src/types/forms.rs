//! Request shapes for the staff-facing HTML forms and query strings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::record::FieldMap;
use crate::error::AgencyError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextQuery {
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    #[serde(rename = "inputEmail")]
    pub username: String,
    #[serde(rename = "inputPassword")]
    pub password: String,
    /// Checkbox: present means checked, whatever its value.
    #[serde(default)]
    pub remember_me: Option<String>,
}

impl LoginForm {
    pub fn remember(&self) -> bool {
        self.remember_me.is_some()
    }
}

/// Signup fields. Address fields the page may also post are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SignupForm {
    #[serde(rename = "inputFirst")]
    pub first: String,
    #[serde(rename = "inputLast")]
    pub last: String,
    #[serde(rename = "inputEmail")]
    pub username: String,
    #[serde(rename = "inputPassword")]
    pub password: String,
    pub dob: String,
    #[serde(rename = "inputPhone")]
    pub phonenumber: String,
}

impl SignupForm {
    /// `dob` as posted by an HTML date input (`YYYY-MM-DD`).
    pub fn date_of_birth(&self) -> Result<NaiveDate, AgencyError> {
        NaiveDate::parse_from_str(self.dob.trim(), "%Y-%m-%d")
            .map_err(|e| AgencyError::bad_request(format!("dob must be YYYY-MM-DD: {e}")))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportQuery {
    pub lid: i64,
    #[serde(rename = "policyId")]
    pub policy_id: i64,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub contacts: Vec<FieldMap>,
}
