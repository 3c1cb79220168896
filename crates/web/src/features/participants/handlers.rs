use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{Leaderboard, dto::participant::CreateParticipantRequest, models::Participant};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;

#[utoipa::path(
    get,
    path = "/api/participants",
    responses(
        (status = 200, description = "Participants in standings order", body = Vec<Participant>)
    ),
    tag = "participants"
)]
pub async fn list_participants(State(board): State<Leaderboard>) -> Result<Response, WebError> {
    let participants = board.list_participants().await?;

    Ok(Json(participants).into_response())
}

#[utoipa::path(
    get,
    path = "/api/participants/{id}",
    params(
        ("id" = Uuid, Path, description = "Participant id")
    ),
    responses(
        (status = 200, description = "Participant found", body = Participant),
        (status = 404, description = "Participant not found")
    ),
    tag = "participants"
)]
pub async fn get_participant(
    State(board): State<Leaderboard>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let participant = board.get_participant(id).await?;

    Ok(Json(participant).into_response())
}

#[utoipa::path(
    post,
    path = "/api/participants",
    request_body = CreateParticipantRequest,
    responses(
        (status = 201, description = "Participant created successfully", body = Participant),
        (status = 400, description = "Blank or invalid name"),
        (status = 409, description = "A participant with this name already exists")
    ),
    tag = "participants"
)]
pub async fn create_participant(
    State(board): State<Leaderboard>,
    Json(req): Json<CreateParticipantRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let participant = board.create_participant(&req.name).await?;

    Ok((StatusCode::CREATED, Json(participant)).into_response())
}
