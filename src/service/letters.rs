//! Letter generation: policy data merged into a stored template, then
//! converted to PDF.
//!
//! Flow: load letter + policy (+ owning contact) → render template with
//! `policy` bound → hand HTML to the configured `PdfRenderer`.

use minijinja::{AutoEscape, Environment, context};
use serde::Serialize;
use tracing::info;

use crate::db::models::{Contact, Letter, Policy};
use crate::db::sqlite::AgencyStore;
use crate::error::AgencyError;
use crate::service::pdf::PdfRenderer;

/// What a letter template sees as `policy`.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyContext {
    pub id: i64,
    pub policy_number: Option<i64>,
    pub policy_type: Option<String>,
    pub contact_id: Option<i64>,
    pub contact: Option<Contact>,
}

impl PolicyContext {
    pub fn new(policy: Policy, contact: Option<Contact>) -> Self {
        Self {
            id: policy.id,
            policy_number: policy.policy_number,
            policy_type: policy.policy_type,
            contact_id: policy.contact_id,
            contact,
        }
    }
}

fn merge_environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_name| AutoEscape::Html);
    env
}

/// Expand a letter's template with `policy` bound. No template renders as "".
pub fn merge_letter(letter: &Letter, policy: &PolicyContext) -> Result<String, AgencyError> {
    let Some(template) = letter.template.as_deref() else {
        return Ok(String::new());
    };
    let env = merge_environment();
    Ok(env.render_str(template, context! { policy => policy })?)
}

/// Load, merge and convert to PDF bytes. Unknown ids are `NotFound`.
pub async fn generate_letter(
    store: &AgencyStore,
    renderer: &dyn PdfRenderer,
    letter_id: i64,
    policy_id: i64,
) -> Result<Vec<u8>, AgencyError> {
    let letter = store
        .get_letter(letter_id)
        .await?
        .ok_or_else(|| AgencyError::not_found(format!("letter {letter_id}")))?;
    let policy = store
        .get_policy(policy_id)
        .await?
        .ok_or_else(|| AgencyError::not_found(format!("policy {policy_id}")))?;
    let contact = match policy.contact_id {
        Some(contact_id) => store.get_contact(contact_id).await?,
        None => None,
    };

    let html = merge_letter(&letter, &PolicyContext::new(policy, contact))?;
    let pdf = renderer.render(&html).await?;

    info!(
        letter_id,
        policy_id,
        html_bytes = html.len(),
        pdf_bytes = pdf.len(),
        "letter generated"
    );
    Ok(pdf)
}
