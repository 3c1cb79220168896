use std::cmp::Ordering;

use uuid::Uuid;

/// The inputs the reconciler needs from one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Standing {
    pub participant_id: Uuid,
    pub total_points: i64,
    /// Creation order, strictly increasing across participants
    pub join_seq: i64,
}

/// Total order of the leaderboard: most points first, ties broken by
/// creation order and then by id.
///
/// `repository::ranking` encodes the same order in SQL; the two must stay
/// in sync.
pub fn standings_order(a: &Standing, b: &Standing) -> Ordering {
    b.total_points
        .cmp(&a.total_points)
        .then_with(|| a.join_seq.cmp(&b.join_seq))
        .then_with(|| a.participant_id.cmp(&b.participant_id))
}

/// Computes dense ranks (1..=N) for every standing.
///
/// The result is in rank order. The input order is irrelevant, so repeated
/// calls over unchanged totals always yield the same assignment.
pub fn assign_ranks(standings: &[Standing]) -> Vec<(Uuid, i32)> {
    let mut ordered = standings.to_vec();
    ordered.sort_by(standings_order);

    ordered
        .iter()
        .enumerate()
        .map(|(position, standing)| (standing.participant_id, position as i32 + 1))
        .collect()
}
