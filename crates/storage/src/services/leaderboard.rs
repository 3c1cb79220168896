use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::error::Result;
use crate::models::{AwardRecord, Participant, ParticipantName};
use crate::services::points::{MAX_AWARD, MIN_AWARD, PointsSource};
use crate::store::LeaderboardStore;

/// Cap of the global activity feed
pub const GLOBAL_HISTORY_LIMIT: usize = 50;
/// Cap of a single participant's activity feed
pub const PARTICIPANT_HISTORY_LIMIT: usize = 20;

/// Participants created on first start when the leaderboard is empty
pub const DEFAULT_PARTICIPANTS: &[&str] = &[
    "Rahul", "Kamal", "Sanak", "Priya", "Amit", "Sneha", "Rohan", "Kavya", "Arjun", "Meera",
];

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(25);

/// Outcome of a successful claim
#[derive(Debug, Clone)]
pub struct Claim {
    pub participant: Participant,
    pub record: AwardRecord,
    pub points_awarded: i32,
}

/// Entry point of the leaderboard engine: creates participants, grants
/// awards and keeps ranks reconciled on top of a [`LeaderboardStore`].
#[derive(Clone)]
pub struct Leaderboard {
    store: Arc<dyn LeaderboardStore>,
    points: Arc<dyn PointsSource>,
}

impl Leaderboard {
    pub fn new(store: Arc<dyn LeaderboardStore>, points: Arc<dyn PointsSource>) -> Self {
        Self { store, points }
    }

    pub async fn create_participant(&self, raw_name: &str) -> Result<Participant> {
        let name = ParticipantName::parse(raw_name)?;
        let participant = self.store.insert_participant(&name).await?;

        tracing::info!(
            participant_id = %participant.participant_id,
            name = %participant.name,
            "Participant created"
        );
        Ok(participant)
    }

    pub async fn get_participant(&self, id: Uuid) -> Result<Participant> {
        self.store.find_participant(id).await
    }

    pub async fn list_participants(&self) -> Result<Vec<Participant>> {
        self.store.list_participants().await
    }

    /// Create the default participants when the leaderboard is empty.
    ///
    /// Blank names are skipped. Returns the participants created, which is
    /// empty when the leaderboard already had participants.
    pub async fn seed_defaults<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Participant>> {
        let names: Vec<ParticipantName> = names
            .iter()
            .filter_map(|raw| match ParticipantName::parse(raw.as_ref()) {
                Ok(name) => Some(name),
                Err(e) => {
                    tracing::warn!("Skipping default participant {:?}: {}", raw.as_ref(), e);
                    None
                }
            })
            .collect();

        let seeded = self.store.seed_participants(&names).await?;
        if !seeded.is_empty() {
            tracing::info!("Seeded {} default participants", seeded.len());
        }
        Ok(seeded)
    }

    /// Grant a random award to a participant.
    ///
    /// Nothing is drawn or written when the participant does not exist. The
    /// commit applies the award, appends its history record and reconciles
    /// ranks as one unit of work. Transient failures retry that unit with
    /// the same award id and amount, so an attempt that committed before its
    /// reply was lost is not applied a second time.
    pub async fn claim(&self, participant_id: Uuid) -> Result<Claim> {
        self.store.find_participant(participant_id).await?;

        let award_id = Uuid::new_v4();
        let points_awarded = self.points.draw();
        debug_assert!((MIN_AWARD..=MAX_AWARD).contains(&points_awarded));

        let (participant, record) = with_retry("commit award", || {
            self.store
                .commit_award(award_id, participant_id, points_awarded)
        })
        .await?;

        tracing::info!(
            participant_id = %participant_id,
            points_awarded,
            total_points = participant.total_points,
            rank = participant.rank,
            "Award claimed"
        );

        Ok(Claim {
            participant,
            record,
            points_awarded,
        })
    }

    /// Recompute all ranks, retrying transient failures so a pass never
    /// stops half way.
    pub async fn reconcile(&self) -> Result<()> {
        with_retry("reconcile ranks", || self.store.reconcile()).await
    }

    /// Newest awards first. The feed is capped at [`GLOBAL_HISTORY_LIMIT`],
    /// or [`PARTICIPANT_HISTORY_LIMIT`] for a single participant; a
    /// requested limit is clamped to that cap.
    pub async fn recent_history(
        &self,
        participant_id: Option<Uuid>,
        limit: Option<usize>,
    ) -> Result<Vec<AwardRecord>> {
        let cap = match participant_id {
            Some(id) => {
                self.store.find_participant(id).await?;
                PARTICIPANT_HISTORY_LIMIT
            }
            None => GLOBAL_HISTORY_LIMIT,
        };
        let limit = limit.unwrap_or(cap).clamp(1, cap);

        self.store.recent_awards(participant_id, limit).await
    }

    pub async fn history_len(&self) -> Result<i64> {
        self.store.count_awards().await
    }
}

async fn with_retry<T, F, Fut>(operation: &str, mut attempt_fn: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match attempt_fn().await {
            Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                tracing::warn!(
                    "{} failed (attempt {}/{}), retrying: {}",
                    operation,
                    attempt,
                    MAX_ATTEMPTS,
                    e
                );
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::StorageError;
    use crate::services::points::SeededPoints;
    use crate::store::MemoryStore;

    /// Hands out a fixed script of amounts, then repeats the last one
    struct ScriptedPoints(Mutex<VecDeque<i32>>);

    impl ScriptedPoints {
        fn new(script: &[i32]) -> Self {
            Self(Mutex::new(script.iter().copied().collect()))
        }
    }

    impl PointsSource for ScriptedPoints {
        fn draw(&self) -> i32 {
            let mut script = self.0.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                *script.front().unwrap()
            }
        }
    }

    fn leaderboard(points: impl PointsSource + 'static) -> Leaderboard {
        Leaderboard::new(Arc::new(MemoryStore::new()), Arc::new(points))
    }

    fn assert_dense_ranks(participants: &[Participant]) {
        let mut ranks: Vec<i32> = participants.iter().map(|p| p.rank).collect();
        ranks.sort_unstable();
        let expected: Vec<i32> = (1..=participants.len() as i32).collect();
        assert_eq!(ranks, expected, "ranks must be a permutation of 1..=N");

        let mut by_rank = participants.to_vec();
        by_rank.sort_by_key(|p| p.rank);
        for pair in by_rank.windows(2) {
            assert!(pair[0].total_points >= pair[1].total_points);
        }
    }

    #[tokio::test]
    async fn test_seed_then_claims_flip_ranks() {
        let board = leaderboard(ScriptedPoints::new(&[4, 9]));

        let seeded = board.seed_defaults(&["Alice", "Bob"]).await.unwrap();
        assert_eq!(seeded.len(), 2);
        assert!(seeded.iter().all(|p| p.total_points == 0));
        assert_dense_ranks(&seeded);
        let alice = seeded[0].participant_id;
        let bob = seeded[1].participant_id;

        let first = board.claim(alice).await.unwrap();
        assert_eq!(first.points_awarded, 4);
        assert_eq!(first.participant.total_points, 4);
        assert_eq!(first.participant.rank, 1);
        assert_eq!(board.get_participant(bob).await.unwrap().rank, 2);

        let second = board.claim(bob).await.unwrap();
        assert_eq!(second.participant.total_points, 9);
        assert_eq!(second.participant.rank, 1);
        assert_eq!(board.get_participant(alice).await.unwrap().rank, 2);

        let history = board.recent_history(None, Some(2)).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].participant_id, bob);
        assert_eq!(history[0].points_awarded, 9);
        assert_eq!(history[1].participant_id, alice);
        assert_eq!(history[1].participant_name, "Alice");
    }

    #[tokio::test]
    async fn test_tied_participants_rank_by_creation_order() {
        let board = leaderboard(FixedPoints(5));
        let first = board.create_participant("Zed").await.unwrap();
        let second = board.create_participant("Amy").await.unwrap();

        board.reconcile().await.unwrap();

        assert_eq!(board.get_participant(first.participant_id).await.unwrap().rank, 1);
        assert_eq!(board.get_participant(second.participant_id).await.unwrap().rank, 2);
    }

    struct FixedPoints(i32);

    impl PointsSource for FixedPoints {
        fn draw(&self) -> i32 {
            self.0
        }
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let board = leaderboard(FixedPoints(5));
        board.create_participant("Existing").await.unwrap();

        let seeded = board.seed_defaults(&["Alice", "Bob"]).await.unwrap();

        assert!(seeded.is_empty());
        let names: Vec<_> = board
            .list_participants()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Existing"]);
    }

    #[tokio::test]
    async fn test_seed_skips_blank_names() {
        let board = leaderboard(FixedPoints(5));
        let seeded = board.seed_defaults(&["Alice", "   ", " Bob "]).await.unwrap();

        let names: Vec<_> = seeded.into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
    }

    #[tokio::test]
    async fn test_create_participant_trims_and_validates() {
        let board = leaderboard(FixedPoints(5));

        let alice = board.create_participant("  Alice  ").await.unwrap();
        assert_eq!(alice.name, "Alice");
        assert_eq!(alice.total_points, 0);

        assert!(matches!(
            board.create_participant(" \t").await,
            Err(StorageError::InvalidName(_))
        ));
        assert!(matches!(
            board.create_participant("Alice ").await,
            Err(StorageError::DuplicateName(_))
        ));
        assert_eq!(board.list_participants().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_names_are_case_sensitive() {
        let board = leaderboard(FixedPoints(5));

        board.create_participant("Alice").await.unwrap();
        let lower = board.create_participant("alice ").await.unwrap();

        assert_eq!(lower.name, "alice");
        let participants = board.list_participants().await.unwrap();
        assert_eq!(participants.len(), 2);
        assert_dense_ranks(&participants);
    }

    #[tokio::test]
    async fn test_claim_unknown_participant_changes_nothing() {
        let board = leaderboard(FixedPoints(5));
        board.seed_defaults(&["Alice", "Bob"]).await.unwrap();
        let before = board.list_participants().await.unwrap();

        let missing = Uuid::new_v4();
        assert!(matches!(
            board.claim(missing).await,
            Err(StorageError::ParticipantNotFound(id)) if id == missing
        ));

        assert_eq!(board.list_participants().await.unwrap(), before);
        assert_eq!(board.history_len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_claim_sequence_keeps_invariants() {
        let board = leaderboard(SeededPoints::new(2024));
        let names: Vec<String> = (0..8).map(|i| format!("Player {i}")).collect();
        let participants = board.seed_defaults(&names).await.unwrap();

        let mut last_totals: HashMap<Uuid, i64> = participants
            .iter()
            .map(|p| (p.participant_id, 0))
            .collect();

        for round in 0..60 {
            let target = participants[(round * 5 + round / 3) % participants.len()].participant_id;
            let history_before = board.history_len().await.unwrap();

            let claim = board.claim(target).await.unwrap();

            assert!((MIN_AWARD..=MAX_AWARD).contains(&claim.points_awarded));
            assert_eq!(claim.record.points_awarded, claim.points_awarded);
            assert_eq!(claim.record.participant_id, target);
            assert_eq!(board.history_len().await.unwrap(), history_before + 1);

            let previous = last_totals[&target];
            assert_eq!(
                claim.participant.total_points,
                previous + i64::from(claim.points_awarded)
            );

            let snapshot = board.list_participants().await.unwrap();
            assert_dense_ranks(&snapshot);
            for p in &snapshot {
                assert!(p.total_points >= last_totals[&p.participant_id]);
                last_totals.insert(p.participant_id, p.total_points);
            }
        }
    }

    #[tokio::test]
    async fn test_history_records_are_never_rewritten() {
        let board = leaderboard(SeededPoints::new(1));
        let alice = board.create_participant("Alice").await.unwrap();

        board.claim(alice.participant_id).await.unwrap();
        let before = board.recent_history(None, None).await.unwrap();

        board.claim(alice.participant_id).await.unwrap();
        let after = board.recent_history(None, None).await.unwrap();

        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(&after[1..], &before[..]);
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let board = leaderboard(SeededPoints::new(99));
        let seeded = board.seed_defaults(&["A", "B", "C", "D"]).await.unwrap();
        for p in seeded.iter().skip(1) {
            board.claim(p.participant_id).await.unwrap();
        }

        board.reconcile().await.unwrap();
        let first = board.list_participants().await.unwrap();
        board.reconcile().await.unwrap();
        let second = board.list_participants().await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_history_limits_are_capped() {
        let board = leaderboard(FixedPoints(5));
        let alice = board.create_participant("Alice").await.unwrap();
        for _ in 0..(GLOBAL_HISTORY_LIMIT + 5) {
            board.claim(alice.participant_id).await.unwrap();
        }

        let global = board.recent_history(None, None).await.unwrap();
        assert_eq!(global.len(), GLOBAL_HISTORY_LIMIT);

        let global = board.recent_history(None, Some(500)).await.unwrap();
        assert_eq!(global.len(), GLOBAL_HISTORY_LIMIT);

        let single = board
            .recent_history(Some(alice.participant_id), None)
            .await
            .unwrap();
        assert_eq!(single.len(), PARTICIPANT_HISTORY_LIMIT);

        let one = board.recent_history(None, Some(0)).await.unwrap();
        assert_eq!(one.len(), 1);

        let missing = Uuid::new_v4();
        assert!(matches!(
            board.recent_history(Some(missing), None).await,
            Err(StorageError::ParticipantNotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_lose_no_increments() {
        let board = leaderboard(SeededPoints::new(7));
        let seeded = board.seed_defaults(&["Alice", "Bob", "Carol"]).await.unwrap();
        let ids: Vec<Uuid> = seeded.iter().map(|p| p.participant_id).collect();

        let mut handles = Vec::new();
        for i in 0..90 {
            let board = board.clone();
            let id = ids[i % ids.len()];
            handles.push(tokio::spawn(async move { board.claim(id).await }));
        }

        let mut awarded: HashMap<Uuid, i64> = HashMap::new();
        for handle in handles {
            let claim = handle.await.unwrap().unwrap();
            *awarded.entry(claim.record.participant_id).or_default() +=
                i64::from(claim.points_awarded);
        }

        let participants = board.list_participants().await.unwrap();
        assert_dense_ranks(&participants);
        for p in &participants {
            assert_eq!(p.total_points, awarded[&p.participant_id]);
        }
        assert_eq!(board.history_len().await.unwrap(), 90);
    }

    /// Fails the first `failures` writes with a transient error before
    /// touching the store, and the first `lost_replies` award commits with
    /// an I/O error after the award was committed.
    struct FlakyStore {
        inner: MemoryStore,
        failures: AtomicU32,
        lost_replies: AtomicU32,
    }

    #[async_trait]
    impl LeaderboardStore for FlakyStore {
        async fn insert_participant(&self, name: &ParticipantName) -> Result<Participant> {
            self.inner.insert_participant(name).await
        }

        async fn find_participant(&self, id: Uuid) -> Result<Participant> {
            self.inner.find_participant(id).await
        }

        async fn list_participants(&self) -> Result<Vec<Participant>> {
            self.inner.list_participants().await
        }

        async fn seed_participants(&self, names: &[ParticipantName]) -> Result<Vec<Participant>> {
            self.inner.seed_participants(names).await
        }

        async fn commit_award(
            &self,
            award_id: Uuid,
            participant_id: Uuid,
            points: i32,
        ) -> Result<(Participant, AwardRecord)> {
            if self.take_failure() {
                return Err(StorageError::Database(sqlx::Error::PoolTimedOut));
            }
            let committed = self
                .inner
                .commit_award(award_id, participant_id, points)
                .await?;
            if self.take_lost_reply() {
                let lost = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reply lost");
                return Err(StorageError::Database(sqlx::Error::Io(lost)));
            }
            Ok(committed)
        }

        async fn reconcile(&self) -> Result<()> {
            if self.take_failure() {
                return Err(StorageError::Database(sqlx::Error::PoolTimedOut));
            }
            self.inner.reconcile().await
        }

        async fn recent_awards(
            &self,
            participant_id: Option<Uuid>,
            limit: usize,
        ) -> Result<Vec<AwardRecord>> {
            self.inner.recent_awards(participant_id, limit).await
        }

        async fn count_awards(&self) -> Result<i64> {
            self.inner.count_awards().await
        }
    }

    impl FlakyStore {
        fn new(failures: u32) -> Self {
            Self::with_lost_replies(failures, 0)
        }

        fn with_lost_replies(failures: u32, lost_replies: u32) -> Self {
            Self {
                inner: MemoryStore::new(),
                failures: AtomicU32::new(failures),
                lost_replies: AtomicU32::new(lost_replies),
            }
        }

        fn take_failure(&self) -> bool {
            take_one(&self.failures)
        }

        fn take_lost_reply(&self) -> bool {
            take_one(&self.lost_replies)
        }
    }

    fn take_one(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let board = Leaderboard::new(Arc::new(FlakyStore::new(2)), Arc::new(FixedPoints(5)));
        let alice = board.create_participant("Alice").await.unwrap();

        let claim = board.claim(alice.participant_id).await.unwrap();

        assert_eq!(claim.participant.total_points, 5);
        assert_eq!(board.history_len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_retry_after_lost_commit_reply_awards_once() {
        let board = Leaderboard::new(
            Arc::new(FlakyStore::with_lost_replies(0, 1)),
            Arc::new(FixedPoints(5)),
        );
        let alice = board.create_participant("Alice").await.unwrap();

        let claim = board.claim(alice.participant_id).await.unwrap();

        assert_eq!(claim.points_awarded, 5);
        assert_eq!(claim.participant.total_points, 5);
        assert_eq!(board.history_len().await.unwrap(), 1);
        assert_eq!(
            board
                .get_participant(alice.participant_id)
                .await
                .unwrap()
                .total_points,
            5
        );
    }

    #[tokio::test]
    async fn test_retries_give_up_after_max_attempts() {
        let board = Leaderboard::new(
            Arc::new(FlakyStore::new(MAX_ATTEMPTS)),
            Arc::new(FixedPoints(5)),
        );

        let err = board.reconcile().await.unwrap_err();
        assert!(err.is_retryable());

        board.reconcile().await.unwrap();
    }
}
