use axum::{Router, routing::get};
use storage::Leaderboard;

use super::handlers::{list_history, participant_history};

pub fn routes() -> Router<Leaderboard> {
    Router::new()
        .route("/", get(list_history))
        .route("/:participant_id", get(participant_history))
}
