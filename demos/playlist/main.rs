//! Playlist Demo - Ordered Collection Reconciliation
//!
//! This demo walks the full relmap pipeline:
//! - An ordered collection mapping with an order column
//! - A deferred change record from an attribute setter
//! - Finalization through the ordered differencer
//! - Replay through the commit queue into an in-memory relation table
//!
//! Run with: cargo run -p playlist

use relmap_change::{Container, ListPolicy, ObjectChangeSet, ObjectId};
use relmap_replay::{
    ChangeReplayer, CollectionMapping, CommitQueue, EventExecutor, InMemoryExecutor, RowEvent,
    WriteTarget,
};
use relmap_value::{ColumnType, Row, Value};

fn track(name: &str) -> Value {
    Value::Text(name.to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // The schema: playlist_track(playlist_id, track, pos).
    let mapping = CollectionMapping::new(
        "tracks",
        "playlist_track",
        vec!["playlist_id".into()],
        "track",
        ColumnType::Text,
    )?
    .with_order_column("pos")?;

    let playlist = Row::new().with("playlist_id", Value::Integer(1));
    let mut table = InMemoryExecutor::for_mapping(&mapping);

    // Persisted state: the playlist as last written.
    let persisted = vec![track("intro"), track("verse"), track("chorus"), track("outro")];
    for (pos, value) in persisted.iter().enumerate() {
        table.execute(&RowEvent::insert(
            playlist
                .clone()
                .with("track", value.clone())
                .with("pos", Value::Integer(pos as i64)),
        ))?;
    }
    println!("persisted: {:?}", table.values_for(&playlist));

    // The application reorders the playlist and swaps a track.
    let edited = vec![track("intro"), track("chorus"), track("verse"), track("bridge")];

    let mut change_set = ObjectChangeSet::new(ObjectId::new(), false);
    change_set.set_deferred(
        "tracks",
        Some(Container::List(persisted)),
        Container::List(edited),
    );

    // Commit: finalize the deferred record, then replay through the
    // deferred queue the way a unit of work would.
    let record = change_set.record_mut("tracks");
    record.finalize(&ListPolicy, false)?;

    let mut queue = CommitQueue::new();
    let emitted =
        ChangeReplayer::new(&mapping).replay(record, &playlist, WriteTarget::Deferred(&mut queue))?;
    println!("emitted {emitted} events:");
    for event in queue.events_for(mapping.id()) {
        println!("  {}", event.kind());
    }

    let affected = queue.flush(&mut table)?;
    println!("flushed, {affected} rows affected");
    println!("reconciled: {:?}", table.values_for(&playlist));

    Ok(())
}
