use axum::{Json, extract::State};

use crate::db::record::to_field_maps;
use crate::error::AgencyError;
use crate::middleware::auth::RequireSession;
use crate::middleware::form::RequiredForm;
use crate::router::AppState;
use crate::service::search::{ContactQuery, search_contacts};
use crate::types::forms::SearchResponse;

/// POST /process
///
/// All three of `searchFirst`, `searchLast`, `searchPhone` must be posted;
/// an empty value disables that criterion.
pub async fn process(
    State(state): State<AppState>,
    RequireSession(_user): RequireSession,
    RequiredForm(query): RequiredForm<ContactQuery>,
) -> Result<Json<SearchResponse>, AgencyError> {
    let contacts = search_contacts(&state.store, &query, state.search_mode()).await?;
    Ok(Json(SearchResponse {
        contacts: to_field_maps(&contacts)?,
    }))
}
