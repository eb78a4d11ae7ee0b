//! Score aggregation: the single writer path for idea tallies.

use super::AppState;
use crate::types::*;
use std::collections::HashMap;

/// Why a score batch was refused outright (individual unknown idea ids are
/// skipped, not errors).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    #[error("role {0:?} cannot submit scores")]
    NonScoringRole(Role),
}

impl AppState {
    /// Apply a batch of per-idea score deltas for a scoring role.
    ///
    /// The whole batch commits under one write guard: concurrent judge and
    /// audience submissions for the same idea serialize here, so no update
    /// is lost. For every touched idea the total is re-derived from its two
    /// components rather than incremented alongside them, so the
    /// `total == judge + audience` invariant cannot drift.
    ///
    /// Unknown idea ids are treated as stale client state and skipped.
    /// Returns the number of deltas actually applied.
    pub async fn apply_scores(
        &self,
        role: Role,
        deltas: &HashMap<IdeaId, u32>,
    ) -> Result<usize, ApplyError> {
        if role == Role::Admin {
            return Err(ApplyError::NonScoringRole(role));
        }

        let mut ideas = self.ideas.write().await;
        let mut applied = 0;

        for idea in ideas.iter_mut() {
            if let Some(delta) = deltas.get(&idea.id) {
                // Deltas are client-controlled; saturate instead of
                // wrapping or panicking on absurd values
                match role {
                    Role::Judge => idea.score_judge = idea.score_judge.saturating_add(*delta),
                    Role::Audience => {
                        idea.score_audience = idea.score_audience.saturating_add(*delta)
                    }
                    Role::Admin => unreachable!("rejected above"),
                }
                idea.total_score = idea.score_judge.saturating_add(idea.score_audience);
                applied += 1;
            }
        }

        if applied < deltas.len() {
            tracing::debug!(
                "Skipped {} deltas for unknown idea ids",
                deltas.len() - applied
            );
        }

        Ok(applied)
    }

    /// Consistent point-in-time view of all tallies plus the leader.
    ///
    /// The leader is the idea with the strictly maximal total; on a tie the
    /// first idea in catalog insertion order wins (stable, never re-sorted).
    pub async fn snapshot(&self) -> Snapshot {
        let ideas = self.ideas.read().await;

        let scores: Vec<IdeaScore> = ideas
            .iter()
            .map(|i| IdeaScore {
                id: i.id,
                name: i.name.clone(),
                judge: i.score_judge,
                audience: i.score_audience,
                total: i.total_score,
            })
            .collect();

        let leader = ideas
            .iter()
            .fold(None::<&Idea>, |best, idea| match best {
                Some(b) if idea.total_score > b.total_score => Some(idea),
                Some(b) => Some(b),
                None => Some(idea),
            })
            .map(|i| Leader {
                name: i.name.clone(),
                total: i.total_score,
            });

        Snapshot {
            ideas: scores,
            leader,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn state_with_ideas(names: &[&str]) -> AppState {
        let state = AppState::default();
        *state.ideas.write().await = names
            .iter()
            .enumerate()
            .map(|(i, n)| Idea::new(i as u32 + 1, n.to_string()))
            .collect();
        state
    }

    #[tokio::test]
    async fn test_apply_scores_by_role_component() {
        let state = state_with_ideas(&["Alpha", "Beta"]).await;

        let applied = state
            .apply_scores(Role::Judge, &HashMap::from([(1, 7)]))
            .await
            .unwrap();
        assert_eq!(applied, 1);
        state
            .apply_scores(Role::Audience, &HashMap::from([(1, 4)]))
            .await
            .unwrap();

        let snap = state.snapshot().await;
        assert_eq!(snap.ideas[0].judge, 7);
        assert_eq!(snap.ideas[0].audience, 4);
        assert_eq!(snap.ideas[0].total, 11);
        // Beta untouched by deltas that don't name it
        assert_eq!(snap.ideas[1].total, 0);
    }

    #[tokio::test]
    async fn test_total_always_derived_from_components() {
        let state = state_with_ideas(&["Alpha", "Beta", "Gamma"]).await;

        for round in 0..10u32 {
            let deltas = HashMap::from([(1, round), (2, 1), (3, 2)]);
            state.apply_scores(Role::Judge, &deltas).await.unwrap();
            state.apply_scores(Role::Audience, &deltas).await.unwrap();
        }

        for idea in state.ideas.read().await.iter() {
            assert_eq!(idea.total_score, idea.score_judge + idea.score_audience);
        }
    }

    #[tokio::test]
    async fn test_huge_deltas_saturate_instead_of_overflowing() {
        let state = state_with_ideas(&["Alpha"]).await;

        state
            .apply_scores(Role::Judge, &HashMap::from([(1, u32::MAX)]))
            .await
            .unwrap();
        // A second submission on the already-maxed component must not panic
        state
            .apply_scores(Role::Judge, &HashMap::from([(1, 1)]))
            .await
            .unwrap();
        state
            .apply_scores(Role::Audience, &HashMap::from([(1, u32::MAX)]))
            .await
            .unwrap();

        let snap = state.snapshot().await;
        assert_eq!(snap.ideas[0].judge, u32::MAX);
        assert_eq!(snap.ideas[0].audience, u32::MAX);
        // Total saturates too rather than wrapping past the components
        assert_eq!(snap.ideas[0].total, u32::MAX);
    }

    #[tokio::test]
    async fn test_unknown_idea_ids_silently_skipped() {
        let state = state_with_ideas(&["Alpha"]).await;

        let applied = state
            .apply_scores(Role::Judge, &HashMap::from([(1, 5), (99, 5)]))
            .await
            .unwrap();
        assert_eq!(applied, 1);
        assert_eq!(state.snapshot().await.ideas[0].total, 5);
    }

    #[tokio::test]
    async fn test_admin_cannot_score() {
        let state = state_with_ideas(&["Alpha"]).await;
        let result = state
            .apply_scores(Role::Admin, &HashMap::from([(1, 5)]))
            .await;
        assert_eq!(result, Err(ApplyError::NonScoringRole(Role::Admin)));
        assert_eq!(state.snapshot().await.ideas[0].total, 0);
    }

    #[tokio::test]
    async fn test_leader_strict_max() {
        let state = state_with_ideas(&["A", "B", "C"]).await;
        state
            .apply_scores(Role::Judge, &HashMap::from([(1, 10), (2, 15), (3, 12)]))
            .await
            .unwrap();

        let leader = state.snapshot().await.leader.unwrap();
        assert_eq!(leader.name, "B");
        assert_eq!(leader.total, 15);
    }

    #[tokio::test]
    async fn test_leader_tie_breaks_to_first_in_insertion_order() {
        let state = state_with_ideas(&["A", "B", "C"]).await;
        // B and C tie at 15; B was inserted first and must win
        state
            .apply_scores(Role::Judge, &HashMap::from([(1, 10), (2, 15), (3, 15)]))
            .await
            .unwrap();

        let leader = state.snapshot().await.leader.unwrap();
        assert_eq!(leader.name, "B");
    }

    #[tokio::test]
    async fn test_empty_catalog_has_no_leader() {
        let state = AppState::default();
        let snap = state.snapshot().await;
        assert!(snap.ideas.is_empty());
        assert!(snap.leader.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_judge_and_audience_submissions_lose_nothing() {
        let state = Arc::new(state_with_ideas(&["Alpha"]).await);

        let judge_state = state.clone();
        let audience_state = state.clone();
        let (j, a) = tokio::join!(
            tokio::spawn(async move {
                judge_state
                    .apply_scores(Role::Judge, &HashMap::from([(1, 5)]))
                    .await
            }),
            tokio::spawn(async move {
                audience_state
                    .apply_scores(Role::Audience, &HashMap::from([(1, 3)]))
                    .await
            }),
        );
        j.unwrap().unwrap();
        a.unwrap().unwrap();

        let snap = state.snapshot().await;
        assert_eq!(snap.ideas[0].judge, 5);
        assert_eq!(snap.ideas[0].audience, 3);
        assert_eq!(snap.ideas[0].total, 8);
    }

    #[tokio::test]
    async fn test_many_concurrent_batches_serialize() {
        let state = Arc::new(state_with_ideas(&["Alpha", "Beta"]).await);

        let mut handles = Vec::new();
        for i in 0..50u32 {
            let state = state.clone();
            let role = if i % 2 == 0 { Role::Judge } else { Role::Audience };
            handles.push(tokio::spawn(async move {
                state
                    .apply_scores(role, &HashMap::from([(1, 1), (2, 2)]))
                    .await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let snap = state.snapshot().await;
        assert_eq!(snap.ideas[0].judge + snap.ideas[0].audience, 50);
        assert_eq!(snap.ideas[0].total, 50);
        assert_eq!(snap.ideas[1].total, 100);
    }
}
