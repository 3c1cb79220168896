use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use storage::{Leaderboard, dto::history::HistoryFilter, models::AwardRecord};
use uuid::Uuid;

use crate::error::WebError;

#[utoipa::path(
    get,
    path = "/api/history",
    params(HistoryFilter),
    responses(
        (status = 200, description = "Most recent awards, newest first", body = Vec<AwardRecord>),
        (status = 400, description = "Invalid query parameters"),
        (status = 404, description = "Participant not found")
    ),
    tag = "history"
)]
pub async fn list_history(
    State(board): State<Leaderboard>,
    Query(filter): Query<HistoryFilter>,
) -> Result<Response, WebError> {
    filter.validate().map_err(WebError::BadRequest)?;

    let records = board
        .recent_history(filter.participant_id, filter.limit)
        .await?;

    Ok(Json(records).into_response())
}

#[utoipa::path(
    get,
    path = "/api/history/{participant_id}",
    params(
        ("participant_id" = Uuid, Path, description = "Participant id"),
        ("limit" = Option<usize>, Query, description = "Number of records, at most 20")
    ),
    responses(
        (status = 200, description = "Most recent awards of the participant", body = Vec<AwardRecord>),
        (status = 400, description = "Invalid query parameters"),
        (status = 404, description = "Participant not found")
    ),
    tag = "history"
)]
pub async fn participant_history(
    State(board): State<Leaderboard>,
    Path(participant_id): Path<Uuid>,
    Query(filter): Query<HistoryFilter>,
) -> Result<Response, WebError> {
    let filter = HistoryFilter {
        participant_id: Some(participant_id),
        ..filter
    };
    filter.validate().map_err(WebError::BadRequest)?;

    let records = board
        .recent_history(filter.participant_id, filter.limit)
        .await?;

    Ok(Json(records).into_response())
}
