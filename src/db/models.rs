use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Staff account row. Session concerns live on `auth::SessionUser`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct User {
    pub id: i64,
    pub first: String,
    pub last: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub phonenumber: String,
    pub dob: NaiveDate,
    #[sqlx(rename = "isadmin")]
    pub admin: bool,
}

/// Fields collected at signup; `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first: String,
    pub last: String,
    pub username: String,
    pub password_hash: String,
    pub phonenumber: String,
    pub dob: NaiveDate,
}

/// Admin edit of a user. A present `password_hash` replaces the stored one.
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub first: String,
    pub last: String,
    pub username: String,
    pub password_hash: Option<String>,
    pub phonenumber: String,
    pub dob: NaiveDate,
    pub admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Contact {
    pub id: i64,
    pub first: String,
    pub last: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub phonenumber: String,
}

/// Editable contact columns; the `policies` back-reference is never part of it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactForm {
    pub first: String,
    pub last: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub phonenumber: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Policy {
    pub id: i64,
    pub policy_number: Option<i64>,
    pub policy_type: Option<String>,
    pub contact_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PolicyForm {
    #[serde(default)]
    pub policy_number: Option<i64>,
    #[serde(default)]
    pub policy_type: Option<String>,
    #[serde(default)]
    pub contact_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Letter {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub template: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LetterForm {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
}

/// Contact with its owned policies, shown read-only.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContactDetail {
    #[serde(flatten)]
    pub contact: Contact,
    pub policies: Vec<Policy>,
}
