//! End-to-end reconciliation tests.
//!
//! These drive the full pipeline: tracked mutations or deferred
//! snapshots, finalization, replay, and execution against the in-memory
//! relation table.

use relmap_change::{
    BagPolicy, ChangeListener, ChangeSetListener, Container, ListPolicy, ObjectChangeSet, ObjectId,
};
use relmap_replay::{
    ChangeReplayer, CollectionMapping, CommitQueue, EventExecutor, InMemoryExecutor, ReplayError,
    ReplayResult, RowEvent, WriteTarget,
};
use relmap_value::{ColumnType, Row, Value};
use std::collections::BTreeMap;

fn text(s: &str) -> Value {
    Value::Text(s.into())
}

fn tags_mapping() -> CollectionMapping {
    CollectionMapping::new(
        "tags",
        "entry_tag",
        vec!["entry_id".into()],
        "tag",
        ColumnType::Text,
    )
    .unwrap()
}

fn tracks_mapping() -> CollectionMapping {
    CollectionMapping::new(
        "tracks",
        "playlist_track",
        vec!["playlist_id".into()],
        "track",
        ColumnType::Text,
    )
    .unwrap()
    .with_order_column("pos")
    .unwrap()
}

fn entry_key(id: i64) -> Row {
    Row::new().with("entry_id", Value::Integer(id))
}

fn playlist_key(id: i64) -> Row {
    Row::new().with("playlist_id", Value::Integer(id))
}

/// Seeds the relation table with an ordered sequence.
fn seed_tracks(executor: &mut InMemoryExecutor, key: &Row, tracks: &[&str]) {
    for (index, name) in tracks.iter().enumerate() {
        executor
            .execute(&RowEvent::insert(
                key.clone()
                    .with("track", text(name))
                    .with("pos", Value::Integer(index as i64)),
            ))
            .unwrap();
    }
}

#[test]
fn tracked_mutations_reach_the_table() {
    let mapping = tags_mapping();
    let mut executor = InMemoryExecutor::for_mapping(&mapping);
    let mut change_set = ObjectChangeSet::new(ObjectId::new(), false);

    {
        let mut listener = ChangeSetListener::new(&mut change_set);
        listener.element_added("tags", &text("rust")).unwrap();
        listener.element_added("tags", &text("orm")).unwrap();
    }

    let record = change_set.record_mut("tags");
    assert!(record.finalize(&BagPolicy, false).unwrap());

    ChangeReplayer::new(&mapping)
        .replay(record, &entry_key(1), WriteTarget::Immediate(&mut executor))
        .unwrap();

    let mut values = executor.values_for(&entry_key(1));
    values.sort();
    assert_eq!(values, vec![text("orm"), text("rust")]);
}

#[test]
fn rotation_reconciles_with_three_updates() {
    let mapping = tracks_mapping();
    let mut executor = InMemoryExecutor::for_mapping(&mapping);
    let key = playlist_key(1);
    seed_tracks(&mut executor, &key, &["a", "b", "c"]);

    let mut change_set = ObjectChangeSet::new(ObjectId::new(), false);
    change_set.set_deferred(
        "tracks",
        Some(Container::List(vec![text("a"), text("b"), text("c")])),
        Container::List(vec![text("c"), text("a"), text("b")]),
    );

    let record = change_set.record_mut("tracks");
    record.finalize(&ListPolicy, false).unwrap();
    let change = record.consume().unwrap();

    let replayer = ChangeReplayer::new(&mapping);
    let events = replayer.events_for(&change, &key).unwrap();

    // A rotation is pure moves: no inserts, no deletes, table row count
    // unchanged.
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.kind() == "update_at_index"));

    for event in &events {
        executor.execute(event).unwrap();
    }
    assert_eq!(executor.len(), 3);
    assert_eq!(
        executor.values_for(&key),
        vec![text("c"), text("a"), text("b")]
    );
}

#[test]
fn interleaved_edit_reconciles() {
    let mapping = tracks_mapping();
    let mut executor = InMemoryExecutor::for_mapping(&mapping);
    let key = playlist_key(1);
    seed_tracks(&mut executor, &key, &["a", "b", "c", "d"]);

    // Drop "b", move "d" forward, append "e".
    let before = Container::List(vec![text("a"), text("b"), text("c"), text("d")]);
    let after = Container::List(vec![text("a"), text("d"), text("c"), text("e")]);

    let mut change_set = ObjectChangeSet::new(ObjectId::new(), false);
    change_set.set_deferred("tracks", Some(before), after);
    let record = change_set.record_mut("tracks");
    record.finalize(&ListPolicy, false).unwrap();

    ChangeReplayer::new(&mapping)
        .replay(record, &key, WriteTarget::Immediate(&mut executor))
        .unwrap();

    assert_eq!(
        executor.values_for(&key),
        vec![text("a"), text("d"), text("c"), text("e")]
    );
}

#[test]
fn duplicate_heavy_lists_reconcile() {
    let mapping = tracks_mapping();
    let mut executor = InMemoryExecutor::for_mapping(&mapping);
    let key = playlist_key(1);
    seed_tracks(&mut executor, &key, &["a", "x", "a"]);

    let before = Container::List(vec![text("a"), text("x"), text("a")]);
    let after = Container::List(vec![text("a"), text("a"), text("x")]);

    let mut change_set = ObjectChangeSet::new(ObjectId::new(), false);
    change_set.set_deferred("tracks", Some(before), after);
    let record = change_set.record_mut("tracks");
    record.finalize(&ListPolicy, false).unwrap();

    ChangeReplayer::new(&mapping)
        .replay(record, &key, WriteTarget::Immediate(&mut executor))
        .unwrap();

    assert_eq!(
        executor.values_for(&key),
        vec![text("a"), text("a"), text("x")]
    );
}

#[test]
fn broken_order_recovery_rebuilds_the_table() {
    let mapping = tracks_mapping();
    let mut executor = InMemoryExecutor::for_mapping(&mapping);
    let key = playlist_key(1);

    // Simulate externally corrupted positions: duplicates at pos 0.
    executor
        .execute(&RowEvent::insert(
            key.clone()
                .with("track", text("a"))
                .with("pos", Value::Integer(0)),
        ))
        .unwrap();
    executor
        .execute(&RowEvent::insert(
            key.clone()
                .with("track", text("b"))
                .with("pos", Value::Integer(0)),
        ))
        .unwrap();

    let mut change_set = ObjectChangeSet::new(ObjectId::new(), false);
    change_set.set_deferred(
        "tracks",
        Some(Container::List(vec![text("a"), text("b")])),
        Container::List(vec![text("b"), text("a")]),
    );
    let record = change_set.record_mut("tracks");
    record.finalize(&ListPolicy, false).unwrap();
    record
        .mark_order_broken(vec![text("b"), text("a")])
        .unwrap();

    let change = record.consume().unwrap();
    let events = ChangeReplayer::new(&mapping)
        .events_for(&change, &key)
        .unwrap();

    // Regardless of what the incremental diff would say: delete-all,
    // then sequential reinserts.
    assert_eq!(events[0], RowEvent::delete_all(key.clone()));
    assert_eq!(events.len(), 3);

    for event in &events {
        executor.execute(event).unwrap();
    }
    assert_eq!(executor.values_for(&key), vec![text("b"), text("a")]);
}

#[test]
fn new_object_flushes_even_an_empty_collection() {
    let mapping = tags_mapping();
    let mut change_set = ObjectChangeSet::new(ObjectId::new(), true);
    change_set.set_deferred("tags", None, Container::Bag(vec![]));

    let record = change_set.record_mut("tags");
    // The empty diff still finalizes because the owner is new.
    assert!(record.finalize(&BagPolicy, true).unwrap());

    let change = record.consume().unwrap();
    let events = ChangeReplayer::new(&mapping)
        .events_for(&change, &entry_key(1))
        .unwrap();
    assert!(events.is_empty());
}

#[test]
fn unchanged_collection_is_pruned_before_replay() {
    let snapshot = Container::Bag(vec![text("a")]);
    let mut change_set = ObjectChangeSet::new(ObjectId::new(), false);
    change_set.set_deferred("tags", Some(snapshot.clone()), snapshot);

    let record = change_set.record_mut("tags");
    assert!(!record.finalize(&BagPolicy, false).unwrap());
    change_set.prune_unchanged();

    assert!(change_set.is_empty());
}

#[test]
fn deferred_commit_flushes_mappings_in_order() {
    let tags = tags_mapping();
    let tracks = tracks_mapping();
    let mut queue = CommitQueue::new();

    // Tag change for one object.
    let mut tag_changes = ObjectChangeSet::new(ObjectId::new(), false);
    tag_changes.set_deferred("tags", None, Container::Bag(vec![text("rust")]));
    let record = tag_changes.record_mut("tags");
    record.finalize(&BagPolicy, false).unwrap();
    ChangeReplayer::new(&tags)
        .replay(record, &entry_key(1), WriteTarget::Deferred(&mut queue))
        .unwrap();

    // Track change for another.
    let mut track_changes = ObjectChangeSet::new(ObjectId::new(), false);
    track_changes.set_deferred(
        "tracks",
        None,
        Container::List(vec![text("a"), text("b")]),
    );
    let record = track_changes.record_mut("tracks");
    record.finalize(&ListPolicy, false).unwrap();
    ChangeReplayer::new(&tracks)
        .replay(record, &playlist_key(9), WriteTarget::Deferred(&mut queue))
        .unwrap();

    assert_eq!(queue.mapping_count(), 2);
    assert_eq!(queue.events_for(tags.id()).len(), 1);
    assert_eq!(queue.events_for(tracks.id()).len(), 2);

    // Flush the track events into their table; tag events would go to a
    // different executor in a real commit, so count them with a recorder.
    struct Recorder(Vec<RowEvent>);
    impl EventExecutor for Recorder {
        fn execute(&mut self, event: &RowEvent) -> ReplayResult<u64> {
            self.0.push(event.clone());
            Ok(1)
        }
    }

    let mut recorder = Recorder(Vec::new());
    let affected = queue.flush(&mut recorder).unwrap();

    assert_eq!(affected, 3);
    assert!(queue.is_empty());
    // Tag mapping enqueued first, so its event flushes first.
    assert_eq!(recorder.0[0].kind(), "insert");
    assert_eq!(
        recorder.0[0],
        RowEvent::insert(entry_key(1).with("tag", text("rust")))
    );
}

#[test]
fn executor_error_aborts_the_commit() {
    struct FailingExecutor;
    impl EventExecutor for FailingExecutor {
        fn execute(&mut self, _event: &RowEvent) -> ReplayResult<u64> {
            Err(ReplayError::execution("connection lost"))
        }
    }

    let mapping = tags_mapping();
    let mut change_set = ObjectChangeSet::new(ObjectId::new(), false);
    change_set.set_deferred("tags", None, Container::Bag(vec![text("a")]));
    let record = change_set.record_mut("tags");
    record.finalize(&BagPolicy, false).unwrap();

    let result = ChangeReplayer::new(&mapping).replay(
        record,
        &entry_key(1),
        WriteTarget::Immediate(&mut FailingExecutor),
    );

    assert!(matches!(result, Err(ReplayError::Execution { .. })));
}

#[test]
fn deferred_duplicate_removal_uses_database_counts() {
    let mapping = tags_mapping();
    let mut executor = InMemoryExecutor::for_mapping(&mapping);
    let key = entry_key(1);

    // Three persisted occurrences of the same tag.
    for _ in 0..3 {
        executor
            .execute(&RowEvent::insert(key.clone().with("tag", text("dup"))))
            .unwrap();
    }

    let mut change_set = ObjectChangeSet::new(ObjectId::new(), false);
    change_set.set_deferred(
        "tags",
        Some(Container::Bag(vec![text("dup"), text("dup"), text("dup")])),
        Container::Bag(vec![text("dup"), text("dup")]),
    );
    let record = change_set.record_mut("tags");
    record.finalize(&BagPolicy, false).unwrap();

    let mut counts = BTreeMap::new();
    counts.insert(text("dup"), 3);
    record.store_database_counts(counts).unwrap();

    ChangeReplayer::new(&mapping)
        .replay(record, &key, WriteTarget::Immediate(&mut executor))
        .unwrap();

    // Exactly two occurrences survive, despite delete-by-value wiping
    // all three rows.
    assert_eq!(executor.values_for(&key), vec![text("dup"), text("dup")]);
}
