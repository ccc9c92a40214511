use chrono::NaiveDate;
use serde::Deserialize;

/// Admin edit of a user. Users are never created here.
#[derive(Debug, Clone, Deserialize)]
pub struct UserAdminForm {
    pub first: String,
    pub last: String,
    pub username: String,
    pub phonenumber: String,
    pub dob: NaiveDate,
    #[serde(default)]
    pub admin: bool,
    /// New password; the stored hash is kept when absent.
    #[serde(default)]
    pub password: Option<String>,
}
