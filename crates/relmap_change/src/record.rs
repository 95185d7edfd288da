//! Per-attribute collection change records.
//!
//! A record accumulates the before/after diff of one collection attribute
//! on one object instance. Its lifecycle is an explicit state machine:
//!
//! `Uninitialized -> Accumulating | Deferred -> Finalized -> Consumed`
//!
//! Incremental change tracking feeds the accumulating state; an
//! attribute-setter event produces a deferred record whose diff is
//! postponed until commit. Either way the record is finalized exactly
//! once, consumed by the replayer, and then spent.

use crate::container::{Container, ContainerPolicy};
use crate::error::{ChangeError, ChangeResult};
use crate::multiset::{self, MultisetDelta};
use crate::ordered::{self, IndexDelta, OrderedDelta};
use crate::types::ObjectId;
use relmap_value::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// A finalized collection diff, ready for replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionDelta {
    /// Unordered diff: occurrence counts only.
    Multiset(MultisetDelta),
    /// Ordered diff: per-value index deltas.
    Ordered(OrderedDelta),
}

impl CollectionDelta {
    /// Returns true if the delta carries any change.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        match self {
            CollectionDelta::Multiset(delta) => !delta.is_empty(),
            CollectionDelta::Ordered(delta) => delta.has_changes(),
        }
    }
}

/// The payload handed to the replayer when a record is consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedChange {
    /// The finalized diff.
    pub delta: CollectionDelta,
    /// As-persisted occurrence counts, snapshotted before replay of a
    /// deferred multiset change. A relational delete-by-value removes all
    /// matching rows, so the replayer needs these to know how many rows
    /// to restore.
    pub database_counts: Option<BTreeMap<Value, u64>>,
    /// True when the persisted order was found inconsistent and the
    /// relation rows must be rebuilt wholesale.
    pub order_broken: bool,
}

#[derive(Debug)]
enum RecordState {
    Uninitialized,
    Accumulating {
        additions: BTreeMap<Value, u64>,
        removals: BTreeMap<Value, u64>,
    },
    Deferred {
        original: Option<Container>,
        latest: Container,
    },
    Finalized {
        delta: CollectionDelta,
        database_counts: Option<BTreeMap<Value, u64>>,
        order_broken: bool,
    },
    Consumed,
}

impl RecordState {
    fn name(&self) -> &'static str {
        match self {
            RecordState::Uninitialized => "uninitialized",
            RecordState::Accumulating { .. } => "accumulating",
            RecordState::Deferred { .. } => "deferred",
            RecordState::Finalized { .. } => "finalized",
            RecordState::Consumed => "consumed",
        }
    }
}

/// Change accumulator for one collection attribute of one object.
#[derive(Debug)]
pub struct CollectionChangeRecord {
    owner: ObjectId,
    attribute: String,
    state: RecordState,
}

impl CollectionChangeRecord {
    /// Creates an uninitialized record.
    ///
    /// The record stays inert until the first accumulated entry or
    /// deferred snapshot; if nothing ever arrives it is discarded without
    /// database effect.
    #[must_use]
    pub fn new(owner: ObjectId, attribute: impl Into<String>) -> Self {
        Self {
            owner,
            attribute: attribute.into(),
            state: RecordState::Uninitialized,
        }
    }

    /// Creates a deferred record from an attribute-setter event.
    ///
    /// Holds the before/after snapshots; the diff runs lazily at commit.
    #[must_use]
    pub fn deferred(
        owner: ObjectId,
        attribute: impl Into<String>,
        original: Option<Container>,
        latest: Container,
    ) -> Self {
        Self {
            owner,
            attribute: attribute.into(),
            state: RecordState::Deferred { original, latest },
        }
    }

    /// The owning object instance.
    #[must_use]
    pub fn owner(&self) -> ObjectId {
        self.owner
    }

    /// The attribute this record tracks.
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Name of the current lifecycle state.
    #[must_use]
    pub fn state_name(&self) -> &'static str {
        self.state.name()
    }

    /// True while the record holds snapshots whose diff has not run yet.
    #[must_use]
    pub fn is_deferred(&self) -> bool {
        matches!(self.state, RecordState::Deferred { .. })
    }

    /// True if the record never observed a change.
    #[must_use]
    pub fn is_uninitialized(&self) -> bool {
        matches!(self.state, RecordState::Uninitialized)
    }

    /// Returns true if any addition, removal, or index delta exists.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        match &self.state {
            RecordState::Uninitialized | RecordState::Consumed => false,
            RecordState::Accumulating {
                additions,
                removals,
            } => !additions.is_empty() || !removals.is_empty(),
            // Snapshots not yet compared; assume changed until proven not.
            RecordState::Deferred { .. } => true,
            RecordState::Finalized {
                delta,
                order_broken,
                ..
            } => *order_broken || delta.has_changes(),
        }
    }

    /// Records `count` added occurrences of `value`.
    ///
    /// An addition cancels a pending removal of the same value first, so
    /// an add/remove pair nets out to no change.
    pub fn record_addition(&mut self, value: Value, count: u64) -> ChangeResult<()> {
        self.accumulate(value, count, false)
    }

    /// Records `count` removed occurrences of `value`.
    pub fn record_removal(&mut self, value: Value, count: u64) -> ChangeResult<()> {
        self.accumulate(value, count, true)
    }

    fn accumulate(&mut self, value: Value, count: u64, removal: bool) -> ChangeResult<()> {
        if count == 0 {
            return Ok(());
        }

        let operation = if removal {
            "record a removal on"
        } else {
            "record an addition on"
        };

        if matches!(self.state, RecordState::Uninitialized) {
            self.state = RecordState::Accumulating {
                additions: BTreeMap::new(),
                removals: BTreeMap::new(),
            };
        }

        match &mut self.state {
            RecordState::Accumulating {
                additions,
                removals,
            } => {
                let (target, opposite) = if removal {
                    (removals, additions)
                } else {
                    (additions, removals)
                };
                let mut remaining = count;

                // Cancel against the opposite side first.
                if let Some(pending) = opposite.get_mut(&value) {
                    let cancelled = remaining.min(*pending);
                    *pending -= cancelled;
                    remaining -= cancelled;
                    if *pending == 0 {
                        opposite.remove(&value);
                    }
                }
                if remaining > 0 {
                    *target.entry(value).or_insert(0) += remaining;
                }
                Ok(())
            }
            state => Err(ChangeError::invalid_transition(state.name(), operation)),
        }
    }

    /// Replaces the record with a deferred snapshot pair.
    ///
    /// An attribute setter overwrites whatever was accumulated so far:
    /// the snapshots are now the single source of truth.
    pub fn defer(&mut self, original: Option<Container>, latest: Container) -> ChangeResult<()> {
        match &self.state {
            RecordState::Uninitialized
            | RecordState::Accumulating { .. }
            | RecordState::Deferred { .. } => {
                self.state = RecordState::Deferred { original, latest };
                Ok(())
            }
            state => Err(ChangeError::invalid_transition(state.name(), "defer")),
        }
    }

    /// Installs an externally computed ordered diff.
    ///
    /// Used when the mapping runs the differencer itself during a commit
    /// compare instead of finalizing a deferred snapshot pair.
    pub fn set_changed_indexes(
        &mut self,
        changed: BTreeMap<Value, IndexDelta>,
        old_size: usize,
        new_size: usize,
    ) -> ChangeResult<()> {
        match &self.state {
            RecordState::Uninitialized | RecordState::Accumulating { .. } => {
                self.state = RecordState::Finalized {
                    delta: CollectionDelta::Ordered(OrderedDelta {
                        changed,
                        old_size,
                        new_size,
                        latest: Vec::new(),
                    }),
                    database_counts: None,
                    order_broken: false,
                };
                Ok(())
            }
            state => Err(ChangeError::invalid_transition(
                state.name(),
                "set changed indexes on",
            )),
        }
    }

    /// Runs the full comparison and finalizes the record.
    ///
    /// Returns `Ok(true)` when the record carries changes to replay, and
    /// `Ok(false)` when the diff came up empty for an existing owner — in
    /// that case the record reverts to uninitialized so the change set can
    /// prune it.
    pub fn finalize(
        &mut self,
        policy: &dyn ContainerPolicy,
        owner_is_new: bool,
    ) -> ChangeResult<bool> {
        if matches!(
            self.state,
            RecordState::Finalized { .. } | RecordState::Consumed
        ) {
            return Err(ChangeError::invalid_transition(
                self.state.name(),
                "finalize",
            ));
        }
        let state = std::mem::replace(&mut self.state, RecordState::Consumed);
        let (next, changed) = Self::finalized_state(state, policy, owner_is_new, &self.attribute)?;
        debug!(
            attribute = %self.attribute,
            state = next.name(),
            changed,
            "finalized collection change record"
        );
        self.state = next;
        Ok(changed)
    }

    fn finalized_state(
        state: RecordState,
        policy: &dyn ContainerPolicy,
        owner_is_new: bool,
        attribute: &str,
    ) -> ChangeResult<(RecordState, bool)> {
        match state {
            RecordState::Uninitialized => Ok((RecordState::Uninitialized, false)),
            RecordState::Accumulating {
                additions,
                removals,
            } => {
                let delta = MultisetDelta {
                    additions,
                    removals,
                };
                if delta.is_empty() && !owner_is_new {
                    return Ok((RecordState::Uninitialized, false));
                }
                Ok((
                    RecordState::Finalized {
                        delta: CollectionDelta::Multiset(delta),
                        database_counts: None,
                        order_broken: false,
                    },
                    true,
                ))
            }
            RecordState::Deferred { original, latest } => {
                if policy.is_ordered() {
                    let empty: &[Value] = &[];
                    let before = original
                        .as_ref()
                        .and_then(Container::as_ordered)
                        .unwrap_or(empty);
                    let after = latest
                        .as_ordered()
                        .ok_or_else(|| ChangeError::not_ordered(attribute))?;

                    let delta = ordered::diff(before, after);
                    if !delta.has_changes() && !owner_is_new {
                        return Ok((RecordState::Uninitialized, false));
                    }
                    Ok((
                        RecordState::Finalized {
                            delta: CollectionDelta::Ordered(delta),
                            database_counts: None,
                            order_broken: false,
                        },
                        true,
                    ))
                } else {
                    match multiset::compare(policy, original.as_ref(), Some(&latest), owner_is_new)
                    {
                        None => Ok((RecordState::Uninitialized, false)),
                        Some(delta) => Ok((
                            RecordState::Finalized {
                                delta: CollectionDelta::Multiset(delta),
                                database_counts: None,
                                order_broken: false,
                            },
                            true,
                        )),
                    }
                }
            }
            state @ (RecordState::Finalized { .. } | RecordState::Consumed) => {
                Err(ChangeError::invalid_transition(state.name(), "finalize"))
            }
        }
    }

    /// Snapshots the as-persisted occurrence counts for replay.
    ///
    /// Only meaningful on a finalized multiset record: a delete-by-value
    /// statement removes every matching row, so the replayer uses these
    /// counts to restore the surviving occurrences afterwards.
    pub fn store_database_counts(&mut self, counts: BTreeMap<Value, u64>) -> ChangeResult<()> {
        match &mut self.state {
            RecordState::Finalized {
                database_counts, ..
            } => {
                *database_counts = Some(counts);
                Ok(())
            }
            state => Err(ChangeError::invalid_transition(
                state.name(),
                "store database counts on",
            )),
        }
    }

    /// Flags the persisted order as inconsistent.
    ///
    /// `latest` is the current in-memory sequence; replay will drop every
    /// relation row and rebuild from it. This is a designed recovery path,
    /// not an error.
    pub fn mark_order_broken(&mut self, latest: Vec<Value>) -> ChangeResult<()> {
        match &mut self.state {
            RecordState::Finalized {
                delta: CollectionDelta::Ordered(delta),
                order_broken,
                ..
            } => {
                *order_broken = true;
                delta.latest = latest;
                Ok(())
            }
            state => Err(ChangeError::invalid_transition(
                state.name(),
                "mark broken order on",
            )),
        }
    }

    /// Consumes the record, yielding the finalized change for replay.
    pub fn consume(&mut self) -> ChangeResult<FinalizedChange> {
        let state = std::mem::replace(&mut self.state, RecordState::Consumed);
        match state {
            RecordState::Finalized {
                delta,
                database_counts,
                order_broken,
            } => Ok(FinalizedChange {
                delta,
                database_counts,
                order_broken,
            }),
            state => {
                let name = state.name();
                self.state = state;
                Err(ChangeError::invalid_transition(name, "consume"))
            }
        }
    }
}
