use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{AwardRecord, Participant, ParticipantName};
use crate::repository::{
    award::AwardRepository, participant::ParticipantRepository, ranking::RankingRepository,
};

use super::LeaderboardStore;

/// Postgres-backed store. Each write runs in its own transaction behind
/// the leaderboard advisory lock.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaderboardStore for PgStore {
    async fn insert_participant(&self, name: &ParticipantName) -> Result<Participant> {
        let mut tx = self.pool.begin().await?;
        RankingRepository::new(&mut tx).lock_writers().await?;

        let created = ParticipantRepository::new(&mut tx).insert(name).await?;
        RankingRepository::new(&mut tx).reconcile().await?;
        let participant = ParticipantRepository::new(&mut tx)
            .find_by_id(created.participant_id)
            .await?;

        tx.commit().await?;
        Ok(participant)
    }

    async fn find_participant(&self, id: Uuid) -> Result<Participant> {
        let mut conn = self.pool.acquire().await?;
        ParticipantRepository::new(&mut conn).find_by_id(id).await
    }

    async fn list_participants(&self) -> Result<Vec<Participant>> {
        let mut conn = self.pool.acquire().await?;
        ParticipantRepository::new(&mut conn).list().await
    }

    async fn seed_participants(&self, names: &[ParticipantName]) -> Result<Vec<Participant>> {
        let mut tx = self.pool.begin().await?;
        RankingRepository::new(&mut tx).lock_writers().await?;

        if ParticipantRepository::new(&mut tx).count().await? > 0 {
            return Ok(Vec::new());
        }

        let mut created: Vec<Participant> = Vec::with_capacity(names.len());
        for name in names {
            if created.iter().any(|p| p.name == name.as_str()) {
                continue;
            }
            created.push(ParticipantRepository::new(&mut tx).insert(name).await?);
        }

        RankingRepository::new(&mut tx).reconcile().await?;

        let mut seeded = Vec::with_capacity(created.len());
        for participant in &created {
            seeded.push(
                ParticipantRepository::new(&mut tx)
                    .find_by_id(participant.participant_id)
                    .await?,
            );
        }

        tx.commit().await?;
        Ok(seeded)
    }

    async fn commit_award(
        &self,
        award_id: Uuid,
        participant_id: Uuid,
        points: i32,
    ) -> Result<(Participant, AwardRecord)> {
        let mut tx = self.pool.begin().await?;
        RankingRepository::new(&mut tx).lock_writers().await?;

        // An earlier attempt may have committed before its reply was lost
        if let Some(record) = AwardRepository::new(&mut tx).find_by_id(award_id).await? {
            let participant = ParticipantRepository::new(&mut tx)
                .find_by_id(record.participant_id)
                .await?;
            tx.commit().await?;
            return Ok((participant, record));
        }

        let awarded = ParticipantRepository::new(&mut tx)
            .apply_award(participant_id, points)
            .await?;
        let record = AwardRepository::new(&mut tx)
            .append(award_id, awarded.participant_id, &awarded.name, points)
            .await?;
        RankingRepository::new(&mut tx).reconcile().await?;
        let participant = ParticipantRepository::new(&mut tx)
            .find_by_id(participant_id)
            .await?;

        tx.commit().await?;
        Ok((participant, record))
    }

    async fn reconcile(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let mut ranking = RankingRepository::new(&mut tx);
        ranking.lock_writers().await?;
        let changed = ranking.reconcile().await?;
        tx.commit().await?;

        tracing::debug!(changed, "Reconciled participant ranks");
        Ok(())
    }

    async fn recent_awards(
        &self,
        participant_id: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<AwardRecord>> {
        let mut conn = self.pool.acquire().await?;
        let mut awards = AwardRepository::new(&mut conn);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        match participant_id {
            Some(id) => awards.recent_for(id, limit).await,
            None => awards.recent(limit).await,
        }
    }

    async fn count_awards(&self) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        AwardRepository::new(&mut conn).count().await
    }
}
