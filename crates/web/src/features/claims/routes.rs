use axum::{Router, routing::post};
use storage::Leaderboard;

use super::handlers::claim_points;

pub fn routes() -> Router<Leaderboard> {
    Router::new().route("/", post(claim_points))
}
