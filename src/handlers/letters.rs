use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use crate::error::AgencyError;
use crate::middleware::auth::RequireSession;
use crate::middleware::form::RequiredQuery;
use crate::router::AppState;
use crate::service::letters::generate_letter;
use crate::types::forms::ReportQuery;

/// GET /genreport?lid=<letter id>&policyId=<policy id>
pub async fn genreport(
    State(state): State<AppState>,
    RequireSession(user): RequireSession,
    RequiredQuery(query): RequiredQuery<ReportQuery>,
) -> Result<Response, AgencyError> {
    tracing::debug!(user_id = user.id, lid = query.lid, policy_id = query.policy_id, "generating letter");
    let pdf =
        generate_letter(&state.store, state.renderer.as_ref(), query.lid, query.policy_id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "inline; filename=output.pdf"),
        ],
        pdf,
    )
        .into_response())
}
