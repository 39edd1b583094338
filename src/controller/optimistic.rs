//! Optimistic mutation of loaded records.
//!
//! The new local state goes into the list immediately; the server's answer
//! either confirms it (possibly with a canonical copy) or the snapshot taken
//! beforehand is put back. At any point a record shows either its
//! pre-mutation or its confirmed post-mutation state.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use crate::api::{Changes, changed_fields};
use crate::error::{LabdeskError, Result};
use crate::types::{Record, RecordId};

use super::state::QueryState;

/// A mutation that has been applied locally and sent, awaiting the server
#[derive(Debug, Clone)]
pub struct PendingMutation<R> {
    pub id: RecordId,
    /// Query generation the mutation was applied to
    pub generation: u64,
    /// Fields to send in the `PATCH` body
    pub changes: Changes,
    snapshot: R,
    optimistic: Value,
}

impl<R> PendingMutation<R> {
    pub fn snapshot(&self) -> &R {
        &self.snapshot
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The server accepted the change
    Confirmed { canonical: bool },
    /// The server rejected it; the snapshot was restored
    RolledBack(String),
    /// The list was reloaded for another query while the request was out
    Superseded,
}

/// Tracks which records have a mutation in flight
#[derive(Debug, Default, Clone)]
pub struct OptimisticApplier {
    in_flight: HashSet<RecordId>,
}

impl OptimisticApplier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self, id: RecordId) -> bool {
        self.in_flight.contains(&id)
    }

    pub fn busy_ids(&self) -> Vec<RecordId> {
        let mut ids: Vec<RecordId> = self.in_flight.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Snapshot the record, swap in `new_state` and mark it busy.
    ///
    /// Returns `Ok(None)` when `new_state` does not differ from what is
    /// shown, in which case nothing needs sending.
    pub fn begin<R: Record + Serialize>(
        &mut self,
        state: &mut QueryState<R>,
        new_state: R,
    ) -> Result<Option<PendingMutation<R>>> {
        let id = new_state.id();
        if self.is_busy(id) {
            return Err(LabdeskError::MutationInFlight(id));
        }
        let index = state.position(id).ok_or(LabdeskError::RecordNotFound(id))?;

        let snapshot = state.items[index].clone();
        let changes = changed_fields(&snapshot, &new_state)?;
        if changes.is_empty() {
            return Ok(None);
        }

        let optimistic = serde_json::to_value(&new_state)?;
        state.items[index] = new_state;
        self.in_flight.insert(id);
        tracing::debug!(id, fields = changes.len(), "applied optimistic update");

        Ok(Some(PendingMutation {
            id,
            generation: state.generation,
            changes,
            snapshot,
            optimistic,
        }))
    }

    /// Settle a mutation with the server's answer.
    ///
    /// `Ok(Some(record))` carries the canonical record, `Ok(None)` keeps the
    /// optimistic value, and an error restores the snapshot. Only a row that
    /// still shows the optimistic value is touched; a row already replaced by
    /// a newer page is left alone.
    pub fn complete<R: Record + Serialize>(
        &mut self,
        state: &mut QueryState<R>,
        pending: PendingMutation<R>,
        result: Result<Option<R>>,
    ) -> MutationOutcome {
        self.in_flight.remove(&pending.id);

        if pending.generation != state.generation {
            tracing::debug!(id = pending.id, "mutation settled after a newer query started");
        }
        let index = state.position(pending.id).filter(|&index| {
            serde_json::to_value(&state.items[index]).is_ok_and(|shown| shown == pending.optimistic)
        });

        match (result, index) {
            (Ok(Some(canonical)), Some(index)) => {
                state.items[index] = canonical;
                MutationOutcome::Confirmed { canonical: true }
            }
            (Ok(None), Some(_)) => MutationOutcome::Confirmed { canonical: false },
            (Ok(_), None) => MutationOutcome::Superseded,
            (Err(e), index) => {
                tracing::warn!(id = pending.id, "rolling back optimistic update: {e}");
                if let Some(index) = index {
                    state.items[index] = pending.snapshot;
                }
                MutationOutcome::RolledBack(e.user_message())
            }
        }
    }
}
