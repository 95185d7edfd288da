//! Per-object change sets.

use crate::container::Container;
use crate::record::CollectionChangeRecord;
use crate::types::ObjectId;
use std::collections::BTreeMap;

/// All collection change records for one object instance.
///
/// A change set belongs to exactly one object; each record belongs to
/// exactly one attribute. The `is_new` flag marks objects created within
/// the current unit of work — their records survive even when the diff
/// comes up empty, because the insert path expects one record per
/// collection attribute regardless.
#[derive(Debug)]
pub struct ObjectChangeSet {
    owner: ObjectId,
    is_new: bool,
    records: BTreeMap<String, CollectionChangeRecord>,
}

impl ObjectChangeSet {
    /// Creates a change set for an object instance.
    #[must_use]
    pub fn new(owner: ObjectId, is_new: bool) -> Self {
        Self {
            owner,
            is_new,
            records: BTreeMap::new(),
        }
    }

    /// The owning object instance.
    #[must_use]
    pub fn owner(&self) -> ObjectId {
        self.owner
    }

    /// True when the owner was created in the current unit of work.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Returns the record for an attribute, creating an uninitialized one
    /// on first access.
    pub fn record_mut(&mut self, attribute: &str) -> &mut CollectionChangeRecord {
        let owner = self.owner;
        self.records
            .entry(attribute.to_string())
            .or_insert_with(|| CollectionChangeRecord::new(owner, attribute))
    }

    /// Returns the record for an attribute, if one exists.
    #[must_use]
    pub fn record(&self, attribute: &str) -> Option<&CollectionChangeRecord> {
        self.records.get(attribute)
    }

    /// Installs a deferred record for an attribute-setter event,
    /// replacing any prior record for the attribute.
    pub fn set_deferred(
        &mut self,
        attribute: impl Into<String>,
        original: Option<Container>,
        latest: Container,
    ) {
        let attribute = attribute.into();
        let record =
            CollectionChangeRecord::deferred(self.owner, attribute.clone(), original, latest);
        self.records.insert(attribute, record);
    }

    /// Removes and returns the record for an attribute.
    pub fn take_record(&mut self, attribute: &str) -> Option<CollectionChangeRecord> {
        self.records.remove(attribute)
    }

    /// Drops records that never observed a change.
    ///
    /// Called after finalization: a record that reverted to uninitialized
    /// must not reach the replayer.
    pub fn prune_unchanged(&mut self) {
        self.records.retain(|_, record| !record.is_uninitialized());
    }

    /// Returns true if any attribute carries changes.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.records.values().any(CollectionChangeRecord::has_changes)
    }

    /// Number of tracked attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no attribute is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over (attribute, record) pairs in attribute order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CollectionChangeRecord)> {
        self.records.iter()
    }

    /// Iterates mutably over (attribute, record) pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut CollectionChangeRecord)> {
        self.records.iter_mut()
    }
}
