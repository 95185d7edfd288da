//! # relmap Replay
//!
//! The replay side of relmap's collection change-reconciliation engine.
//!
//! A finalized [`relmap_change::CollectionChangeRecord`] is consumed by a
//! [`ChangeReplayer`], which walks the diff and emits an ordered sequence
//! of abstract [`RowEvent`]s against the attribute's relation table. Events
//! either execute immediately through an [`EventExecutor`] or are queued
//! per mapping in a [`CommitQueue`] for a consolidated commit-time flush.
//!
//! SQL text never appears at this layer; executors translate events into
//! whatever their data source speaks.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod event;
pub mod executor;
pub mod mapping;
pub mod queue;
pub mod replay;

pub use error::{ReplayError, ReplayResult};
pub use event::RowEvent;
pub use executor::{EventExecutor, InMemoryExecutor};
pub use mapping::{CollectionMapping, MappingId};
pub use queue::CommitQueue;
pub use replay::{ChangeReplayer, WriteTarget};
