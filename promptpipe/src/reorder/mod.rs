//! Reordering of stages with rollback on partial persistence failure.

use tracing::warn;

use crate::errors::ReorderError;
use crate::stage::StageSet;
use crate::storage::StageStore;

/// Applies an ordinal permutation to a stage set and persists it.
///
/// A partial reorder is worse than no reorder: it silently corrupts the
/// deterministic ordering invariant. If any ordinal write fails, the
/// transaction restores the in-memory set to its pre-reorder ordinals and
/// issues best-effort compensating writes for the ordinals already
/// persisted.
pub struct ReorderTransaction<'a> {
    store: &'a dyn StageStore,
    owner_id: String,
}

impl<'a> ReorderTransaction<'a> {
    /// Creates a transaction against a store.
    #[must_use]
    pub fn new(store: &'a dyn StageStore, owner_id: impl Into<String>) -> Self {
        Self {
            store,
            owner_id: owner_id.into(),
        }
    }

    /// Moves `stage_id` to `target_index` among the visible stages.
    ///
    /// The target index is expressed against the `(ordinal, id)`-sorted list
    /// of all stages, enabled or not, matching how callers present them.
    /// Out-of-range indices are clamped. New ordinals are assigned as
    /// strictly increasing integers starting at 1 over the new order; only
    /// changed ordinals are persisted.
    pub async fn apply(
        &self,
        set: &mut StageSet,
        stage_id: &str,
        target_index: usize,
    ) -> Result<(), ReorderError> {
        let mut order: Vec<String> = set
            .visible_sorted()
            .iter()
            .map(|s| s.id.clone())
            .collect();

        let from = order
            .iter()
            .position(|id| id == stage_id)
            .ok_or_else(|| ReorderError::UnknownStage {
                id: stage_id.to_string(),
            })?;

        let to = target_index.min(order.len() - 1);
        let moved = order.remove(from);
        order.insert(to, moved);

        // Snapshot of every prior ordinal, for rollback.
        let prior: Vec<(String, u32)> = set.iter().map(|s| (s.id.clone(), s.ordinal)).collect();

        // Plan: (id, old ordinal, new ordinal) for every stage that moves.
        let mut changes: Vec<(String, u32, u32)> = Vec::new();
        for (index, id) in order.iter().enumerate() {
            let new_ordinal = u32::try_from(index).unwrap_or(u32::MAX).saturating_add(1);
            if let Some(stage) = set.get(id) {
                if stage.ordinal != new_ordinal {
                    changes.push((id.clone(), stage.ordinal, new_ordinal));
                }
            }
        }

        // Apply in memory first so the persisted batch matches what the
        // caller will observe on success.
        for (id, _, new_ordinal) in &changes {
            if let Some(stage) = set.get_mut(id) {
                stage.ordinal = *new_ordinal;
            }
        }

        for (written, (id, _, new_ordinal)) in changes.iter().enumerate() {
            if let Err(source) = self
                .store
                .update_ordinal(&self.owner_id, id, *new_ordinal)
                .await
            {
                self.roll_back(set, &prior, &changes[..written]).await;
                return Err(ReorderError::PersistFailed {
                    stage_id: id.clone(),
                    source,
                });
            }
        }

        Ok(())
    }

    /// Restores prior ordinals in memory and compensates persisted writes.
    async fn roll_back(
        &self,
        set: &mut StageSet,
        prior: &[(String, u32)],
        persisted: &[(String, u32, u32)],
    ) {
        for (id, old_ordinal, _) in persisted {
            if let Err(err) = self
                .store
                .update_ordinal(&self.owner_id, id, *old_ordinal)
                .await
            {
                warn!(stage_id = %id, error = %err, "compensating ordinal write failed");
            }
        }
        for (id, ordinal) in prior {
            if let Some(stage) = set.get_mut(id) {
                stage.ordinal = *ordinal;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{Stage, StageCategory};
    use crate::testing::MemoryStageStore;

    fn stage(id: &str, ordinal: u32) -> Stage {
        Stage::new(StageCategory::Guideline)
            .with_id(id)
            .with_ordinal(ordinal)
    }

    fn set() -> StageSet {
        StageSet::from_stages(vec![
            stage("a", 1),
            stage("b", 2),
            stage("c", 3),
            stage("d", 4),
        ])
    }

    fn ordinals(set: &StageSet) -> Vec<(String, u32)> {
        set.visible_sorted()
            .iter()
            .map(|s| (s.id.clone(), s.ordinal))
            .collect()
    }

    #[tokio::test]
    async fn test_move_last_to_first() {
        let store = MemoryStageStore::new();
        let mut stages = set();

        ReorderTransaction::new(&store, "owner")
            .apply(&mut stages, "d", 0)
            .await
            .unwrap();

        assert_eq!(
            ordinals(&stages),
            vec![
                ("d".to_string(), 1),
                ("a".to_string(), 2),
                ("b".to_string(), 3),
                ("c".to_string(), 4),
            ]
        );
        // Every stage changed ordinal, so four writes were persisted.
        assert_eq!(store.ordinal_writes().len(), 4);
    }

    #[tokio::test]
    async fn test_unchanged_ordinals_are_not_persisted() {
        let store = MemoryStageStore::new();
        let mut stages = set();

        // Moving "b" to its own position is a no-op.
        ReorderTransaction::new(&store, "owner")
            .apply(&mut stages, "b", 1)
            .await
            .unwrap();

        assert!(store.ordinal_writes().is_empty());
    }

    #[tokio::test]
    async fn test_partial_failure_restores_prior_ordinals() {
        let store = MemoryStageStore::new();
        // Moving position 4 to position 1 changes all four ordinals; fail
        // the last of the four writes.
        store.fail_ordinal_writes_after(3);
        let mut stages = set();

        let err = ReorderTransaction::new(&store, "owner")
            .apply(&mut stages, "d", 0)
            .await
            .unwrap_err();

        assert!(matches!(err, ReorderError::PersistFailed { .. }));
        assert_eq!(
            ordinals(&stages),
            vec![
                ("a".to_string(), 1),
                ("b".to_string(), 2),
                ("c".to_string(), 3),
                ("d".to_string(), 4),
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_stage_is_rejected() {
        let store = MemoryStageStore::new();
        let mut stages = set();

        let err = ReorderTransaction::new(&store, "owner")
            .apply(&mut stages, "nope", 0)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ReorderError::UnknownStage {
                id: "nope".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_out_of_range_target_is_clamped() {
        let store = MemoryStageStore::new();
        let mut stages = set();

        ReorderTransaction::new(&store, "owner")
            .apply(&mut stages, "a", 99)
            .await
            .unwrap();

        let ids: Vec<String> = stages
            .visible_sorted()
            .iter()
            .map(|s| s.id.clone())
            .collect();
        assert_eq!(ids, vec!["b", "c", "d", "a"]);
    }

    #[tokio::test]
    async fn test_reorder_normalizes_sparse_ordinals() {
        let store = MemoryStageStore::new();
        let mut stages = StageSet::from_stages(vec![
            stage("a", 2),
            stage("b", 7),
            stage("c", 11),
        ]);

        ReorderTransaction::new(&store, "owner")
            .apply(&mut stages, "c", 0)
            .await
            .unwrap();

        let ords: Vec<u32> = stages.visible_sorted().iter().map(|s| s.ordinal).collect();
        assert_eq!(ords, vec![1, 2, 3]);
    }
}
