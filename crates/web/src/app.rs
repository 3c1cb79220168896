use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use serde_json::{Value, json};
use storage::Leaderboard;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::features;

#[derive(OpenApi)]
#[openapi(
    paths(
        features::participants::handlers::list_participants,
        features::participants::handlers::get_participant,
        features::participants::handlers::create_participant,
        features::claims::handlers::claim_points,
        features::history::handlers::list_history,
        features::history::handlers::participant_history,
    ),
    components(
        schemas(
            storage::dto::participant::CreateParticipantRequest,
            storage::dto::claim::ClaimRequest,
            storage::dto::claim::ClaimResponse,
            storage::models::Participant,
            storage::models::AwardRecord,
        )
    ),
    tags(
        (name = "participants", description = "Leaderboard participants and standings"),
        (name = "claims", description = "Random point awards"),
        (name = "history", description = "Award activity feed"),
    )
)]
pub struct ApiDoc;

/// CORS policy: a single trusted origin with credentials, or permissive
/// when no origin is configured.
pub fn cors_layer(origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    let Some(origin) = origin else {
        return Ok(CorsLayer::permissive());
    };

    Ok(CorsLayer::new()
        .allow_origin(origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true))
}

pub fn router(board: Leaderboard, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", features::routes())
        .with_state(board)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
