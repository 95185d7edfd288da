//! # relmap Change
//!
//! The collection diff core of relmap.
//!
//! This crate provides:
//! - Container policies abstracting over list/bag/set collection families
//! - The multiset comparator (frequency-count diff, duplicates and nulls
//!   as first-class members)
//! - The ordered list differencer (per-value index deltas enabling
//!   update-at-index reconciliation)
//! - Collection change records with an explicit lifecycle state machine
//! - Object change sets and the attribute-level change-tracking listener
//!
//! The comparator and differencer are pure over their input snapshots:
//! they never mutate a collection they are handed.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod changeset;
pub mod container;
pub mod error;
pub mod listener;
pub mod multiset;
pub mod ordered;
pub mod record;
pub mod shared;
pub mod types;

pub use changeset::ObjectChangeSet;
pub use container::{BagPolicy, Container, ContainerPolicy, ListPolicy, SetPolicy};
pub use error::{ChangeError, ChangeResult};
pub use listener::{ChangeListener, ChangeSetListener};
pub use multiset::{compare, MultisetDelta};
pub use ordered::{diff, IndexDelta, OrderedDelta};
pub use record::{CollectionChangeRecord, CollectionDelta, FinalizedChange};
pub use shared::SharedContainer;
pub use types::ObjectId;
