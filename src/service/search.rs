use serde::Deserialize;

use crate::db::models::Contact;
use crate::db::sqlite::AgencyStore;
use crate::error::AgencyError;

/// The three search criteria. An empty criterion matches every contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContactQuery {
    #[serde(rename = "searchFirst")]
    pub first: String,
    #[serde(rename = "searchLast")]
    pub last: String,
    #[serde(rename = "searchPhone")]
    pub phone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    CaseSensitive,
    /// Folds ASCII letters only, the way SQLite `LIKE` does.
    AsciiCaseInsensitive,
}

impl MatchMode {
    pub fn from_flag(case_sensitive: bool) -> Self {
        if case_sensitive {
            Self::CaseSensitive
        } else {
            Self::AsciiCaseInsensitive
        }
    }

    fn contains(self, haystack: &str, needle: &str) -> bool {
        match self {
            Self::CaseSensitive => haystack.contains(needle),
            Self::AsciiCaseInsensitive => haystack
                .to_ascii_lowercase()
                .contains(&needle.to_ascii_lowercase()),
        }
    }
}

impl ContactQuery {
    pub fn new(first: impl Into<String>, last: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            last: last.into(),
            phone: phone.into(),
        }
    }

    /// In-memory form of the store predicate.
    pub fn matches(&self, contact: &Contact, mode: MatchMode) -> bool {
        mode.contains(&contact.first, &self.first)
            && mode.contains(&contact.last, &self.last)
            && mode.contains(&contact.phonenumber, &self.phone)
    }
}

/// `%needle%` with `\`, `%` and `_` escaped for `LIKE ... ESCAPE '\'`.
pub fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

pub async fn search_contacts(
    store: &AgencyStore,
    query: &ContactQuery,
    mode: MatchMode,
) -> Result<Vec<Contact>, AgencyError> {
    let contacts = store.search_contacts(query, mode).await?;
    tracing::debug!(
        first = %query.first,
        last = %query.last,
        phone = %query.phone,
        hits = contacts.len(),
        "contact search"
    );
    Ok(contacts)
}
