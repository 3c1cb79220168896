use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{AwardRecord, Participant, ParticipantName};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence seam of the leaderboard.
///
/// Every method that writes is a single unit of work: it either applies
/// completely or leaves the store untouched, and writers never interleave
/// with a reconciliation pass.
#[async_trait]
pub trait LeaderboardStore: Send + Sync {
    /// Create a participant and rank it in the same unit of work
    async fn insert_participant(&self, name: &ParticipantName) -> Result<Participant>;

    async fn find_participant(&self, id: Uuid) -> Result<Participant>;

    /// All participants, most points first
    async fn list_participants(&self) -> Result<Vec<Participant>>;

    /// Create `names` in order when the store is empty. Returns the created
    /// participants, nothing when the store already had some.
    async fn seed_participants(&self, names: &[ParticipantName]) -> Result<Vec<Participant>>;

    /// Add `points` to the participant, append the history record
    /// `award_id` and reconcile ranks.
    ///
    /// An `award_id` that is already recorded is not applied again; the
    /// recorded award is returned with the participant's current state.
    async fn commit_award(
        &self,
        award_id: Uuid,
        participant_id: Uuid,
        points: i32,
    ) -> Result<(Participant, AwardRecord)>;

    /// Recompute every participant's rank from the current totals
    async fn reconcile(&self) -> Result<()>;

    /// Newest awards first, optionally restricted to one participant
    async fn recent_awards(
        &self,
        participant_id: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<AwardRecord>>;

    async fn count_awards(&self) -> Result<i64>;
}
