use axum::Router;
use storage::Leaderboard;

pub mod claims;
pub mod history;
pub mod participants;

pub fn routes() -> Router<Leaderboard> {
    Router::new()
        .nest("/participants", participants::routes::routes())
        .nest("/claims", claims::routes::routes())
        .nest("/history", history::routes::routes())
}
