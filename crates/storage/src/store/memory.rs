use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{AwardRecord, Participant, ParticipantName};
use crate::services::ranking::{Standing, assign_ranks};

use super::LeaderboardStore;

/// Process-local store. Writers hold the write lock for their whole unit
/// of work, which makes every write atomic and serializes reconciliation.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    /// In creation order; the index doubles as the join sequence
    participants: Vec<Participant>,
    by_id: HashMap<Uuid, usize>,
    by_name: HashMap<String, Uuid>,
    /// Oldest first
    awards: Vec<AwardRecord>,
    award_index: HashMap<Uuid, usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryState {
    fn find(&self, id: Uuid) -> Result<&Participant> {
        self.by_id
            .get(&id)
            .map(|&index| &self.participants[index])
            .ok_or(StorageError::ParticipantNotFound(id))
    }

    fn insert(&mut self, name: &ParticipantName) -> Result<Uuid> {
        if self.by_name.contains_key(name.as_str()) {
            return Err(StorageError::DuplicateName(name.to_string()));
        }

        let participant = Participant {
            participant_id: Uuid::new_v4(),
            name: name.to_string(),
            total_points: 0,
            rank: 0,
            created_at: Utc::now(),
        };
        let id = participant.participant_id;

        self.by_id.insert(id, self.participants.len());
        self.by_name.insert(participant.name.clone(), id);
        self.participants.push(participant);

        Ok(id)
    }

    fn apply_award(&mut self, id: Uuid, points: i32) -> Result<&Participant> {
        let index = *self
            .by_id
            .get(&id)
            .ok_or(StorageError::ParticipantNotFound(id))?;

        let participant = &mut self.participants[index];
        participant.total_points += i64::from(points);
        Ok(participant)
    }

    fn append(
        &mut self,
        award_id: Uuid,
        participant_id: Uuid,
        participant_name: String,
        points: i32,
    ) -> AwardRecord {
        let record = AwardRecord {
            award_id,
            participant_id,
            participant_name,
            points_awarded: points,
            awarded_at: Utc::now(),
        };
        self.award_index.insert(award_id, self.awards.len());
        self.awards.push(record.clone());
        record
    }

    fn reconcile(&mut self) -> usize {
        let standings: Vec<Standing> = self
            .participants
            .iter()
            .enumerate()
            .map(|(join_seq, p)| Standing {
                participant_id: p.participant_id,
                total_points: p.total_points,
                join_seq: join_seq as i64,
            })
            .collect();

        let mut changed = 0;
        for (id, rank) in assign_ranks(&standings) {
            let participant = &mut self.participants[self.by_id[&id]];
            if participant.rank != rank {
                participant.rank = rank;
                changed += 1;
            }
        }
        changed
    }

    fn standings(&self) -> Vec<Participant> {
        let mut participants = self.participants.clone();
        participants.sort_by(|a, b| {
            b.total_points
                .cmp(&a.total_points)
                .then_with(|| a.rank.cmp(&b.rank))
        });
        participants
    }
}

#[async_trait]
impl LeaderboardStore for MemoryStore {
    async fn insert_participant(&self, name: &ParticipantName) -> Result<Participant> {
        let mut state = self.state.write().await;
        let id = state.insert(name)?;
        state.reconcile();
        state.find(id).cloned()
    }

    async fn find_participant(&self, id: Uuid) -> Result<Participant> {
        self.state.read().await.find(id).cloned()
    }

    async fn list_participants(&self) -> Result<Vec<Participant>> {
        Ok(self.state.read().await.standings())
    }

    async fn seed_participants(&self, names: &[ParticipantName]) -> Result<Vec<Participant>> {
        let mut state = self.state.write().await;
        if !state.participants.is_empty() {
            return Ok(Vec::new());
        }

        let mut created = Vec::with_capacity(names.len());
        for name in names {
            if !state.by_name.contains_key(name.as_str()) {
                created.push(state.insert(name)?);
            }
        }
        state.reconcile();

        created
            .into_iter()
            .map(|id| state.find(id).cloned())
            .collect()
    }

    async fn commit_award(
        &self,
        award_id: Uuid,
        participant_id: Uuid,
        points: i32,
    ) -> Result<(Participant, AwardRecord)> {
        let mut state = self.state.write().await;

        if let Some(&index) = state.award_index.get(&award_id) {
            let record = state.awards[index].clone();
            return Ok((state.find(record.participant_id)?.clone(), record));
        }

        let name = state.apply_award(participant_id, points)?.name.clone();
        let record = state.append(award_id, participant_id, name, points);
        state.reconcile();

        Ok((state.find(participant_id)?.clone(), record))
    }

    async fn reconcile(&self) -> Result<()> {
        let changed = self.state.write().await.reconcile();
        tracing::debug!(changed, "Reconciled participant ranks");
        Ok(())
    }

    async fn recent_awards(
        &self,
        participant_id: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<AwardRecord>> {
        let state = self.state.read().await;

        Ok(state
            .awards
            .iter()
            .rev()
            .filter(|record| participant_id.is_none_or(|id| record.participant_id == id))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_awards(&self) -> Result<i64> {
        Ok(self.state.read().await.awards.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(raw: &str) -> ParticipantName {
        ParticipantName::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_insert_ranks_new_participant() {
        let store = MemoryStore::new();

        let alice = store.insert_participant(&name("Alice")).await.unwrap();
        let bob = store.insert_participant(&name("Bob")).await.unwrap();

        assert_eq!(alice.rank, 1);
        assert_eq!(bob.rank, 2);
        assert_eq!(bob.total_points, 0);
    }

    #[tokio::test]
    async fn test_duplicate_name_leaves_store_untouched() {
        let store = MemoryStore::new();
        store.insert_participant(&name("Alice")).await.unwrap();

        let err = store.insert_participant(&name(" Alice ")).await.unwrap_err();

        assert!(matches!(err, StorageError::DuplicateName(ref n) if n == "Alice"));
        assert_eq!(store.list_participants().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_commit_award_unknown_participant_has_no_effect() {
        let store = MemoryStore::new();
        store.insert_participant(&name("Alice")).await.unwrap();

        let missing = Uuid::new_v4();
        let err = store.commit_award(Uuid::new_v4(), missing, 5).await.unwrap_err();

        assert!(matches!(err, StorageError::ParticipantNotFound(id) if id == missing));
        assert_eq!(store.count_awards().await.unwrap(), 0);
        assert_eq!(store.list_participants().await.unwrap()[0].total_points, 0);
    }

    #[tokio::test]
    async fn test_seed_deduplicates_and_keeps_order() {
        let store = MemoryStore::new();

        let seeded = store
            .seed_participants(&[name("Alice"), name("Bob"), name("Alice")])
            .await
            .unwrap();

        let names: Vec<_> = seeded.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
        assert_eq!(seeded[0].rank, 1);
        assert_eq!(seeded[1].rank, 2);
    }

    #[tokio::test]
    async fn test_recent_awards_filters_and_limits() {
        let store = MemoryStore::new();
        let alice = store.insert_participant(&name("Alice")).await.unwrap();
        let bob = store.insert_participant(&name("Bob")).await.unwrap();

        for points in 1..=4 {
            store
                .commit_award(Uuid::new_v4(), alice.participant_id, points)
                .await
                .unwrap();
            store
                .commit_award(Uuid::new_v4(), bob.participant_id, points)
                .await
                .unwrap();
        }

        let recent = store.recent_awards(None, 3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].participant_id, bob.participant_id);
        assert_eq!(recent[0].points_awarded, 4);
        assert_eq!(recent[1].participant_id, alice.participant_id);

        let alice_only = store
            .recent_awards(Some(alice.participant_id), 10)
            .await
            .unwrap();
        let points: Vec<_> = alice_only.iter().map(|r| r.points_awarded).collect();
        assert_eq!(points, vec![4, 3, 2, 1]);
    }

    #[tokio::test]
    async fn test_commit_award_is_idempotent_per_award_id() {
        let store = MemoryStore::new();
        let alice = store.insert_participant(&name("Alice")).await.unwrap();
        let award_id = Uuid::new_v4();

        let (first, record) = store
            .commit_award(award_id, alice.participant_id, 6)
            .await
            .unwrap();
        let (again, replayed) = store
            .commit_award(award_id, alice.participant_id, 6)
            .await
            .unwrap();

        assert_eq!(first.total_points, 6);
        assert_eq!(again, first);
        assert_eq!(replayed, record);
        assert_eq!(record.award_id, award_id);
        assert_eq!(store.count_awards().await.unwrap(), 1);
    }
}
