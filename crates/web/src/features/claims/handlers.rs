use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use storage::{
    Leaderboard,
    dto::claim::{ClaimRequest, ClaimResponse},
};

use crate::error::WebError;

#[utoipa::path(
    post,
    path = "/api/claims",
    request_body = ClaimRequest,
    responses(
        (status = 200, description = "Points awarded and ranks reconciled", body = ClaimResponse),
        (status = 400, description = "participant_id is missing"),
        (status = 404, description = "Participant not found")
    ),
    tag = "claims"
)]
pub async fn claim_points(
    State(board): State<Leaderboard>,
    Json(req): Json<ClaimRequest>,
) -> Result<Response, WebError> {
    let participant_id = req
        .participant_id
        .ok_or_else(|| WebError::BadRequest("participant_id is required".to_string()))?;

    let claim = board.claim(participant_id).await?;

    Ok(Json(ClaimResponse::from(claim)).into_response())
}
