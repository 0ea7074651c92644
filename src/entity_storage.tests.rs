use crate::entity::Entity;
use crate::entity_storage::EntityStorage;
use crate::safety::verify_entity_storage;
use proptest::prelude::*;
use std::collections::HashSet;

#[test]
fn test_entity_storage_create_fresh() {
    let mut storage = EntityStorage::new();

    let e0 = storage.create();
    let e1 = storage.create();

    assert_eq!((e0.index(), e0.version()), (0, 0));
    assert_eq!((e1.index(), e1.version()), (1, 0));
    assert!(storage.valid(e0));
    assert_eq!(storage.len(), 2);

    verify_entity_storage(&storage).unwrap();
}

#[test]
fn test_entity_storage_release_bumps_version() {
    let mut storage = EntityStorage::new();
    let e = storage.create();

    assert_eq!(storage.release(e, e.next().version()), 1);
    assert!(!storage.valid(e));
    assert_eq!(storage.current(e), 1);

    let recycled = storage.create();
    assert_eq!(recycled.index(), e.index());
    assert_eq!(recycled.version(), 1);
    assert!(!storage.valid(e));
    assert!(storage.valid(recycled));

    verify_entity_storage(&storage).unwrap();
}

#[test]
fn test_entity_storage_free_list_is_fifo() {
    let mut storage = EntityStorage::new();
    let e: Vec<Entity> = (0..4).map(|_| storage.create()).collect();

    storage.release(e[2], e[2].next().version());
    storage.release(e[0], e[0].next().version());
    storage.release(e[3], e[3].next().version());
    assert_eq!(storage.free_list(), vec![2, 0, 3]);

    assert_eq!(storage.create().index(), 2);
    assert_eq!(storage.create().index(), 0);
    assert_eq!(storage.create().index(), 3);
    assert_eq!(storage.create().index(), 4);

    verify_entity_storage(&storage).unwrap();
}

#[test]
fn test_entity_storage_release_skips_tombstone_version() {
    let mut storage = EntityStorage::new();
    let e = storage.create();

    // Asking for the tombstone version yields the one after it
    assert_eq!(storage.release(e, Entity::VERSION_MASK), 0);

    let e = storage.create();
    assert_eq!(storage.release(e, 17), 17);
    assert_eq!(storage.create().version(), 17);
}

#[test]
fn test_entity_storage_current_unused_index() {
    let storage = EntityStorage::new();
    assert_eq!(storage.current(Entity::new(10, 0)), Entity::VERSION_MASK);
}

#[test]
fn test_entity_storage_hint_beyond_end() {
    let mut storage = EntityStorage::new();
    let hint = Entity::new(3, 5);

    assert_eq!(storage.create_with_hint(hint), hint);
    assert!(storage.valid(hint));

    // The skipped indices are free and recycled in order
    assert_eq!(storage.free_list(), vec![0, 1, 2]);
    assert_eq!(storage.create(), Entity::new(0, 0));

    verify_entity_storage(&storage).unwrap();
}

#[test]
fn test_entity_storage_hint_on_free_slot() {
    let mut storage = EntityStorage::new();
    let e: Vec<Entity> = (0..3).map(|_| storage.create()).collect();

    storage.release(e[0], 1);
    storage.release(e[1], 1);
    storage.release(e[2], 1);

    // Taking the middle of the free list keeps the rest linked
    let hint = Entity::new(1, 9);
    assert_eq!(storage.create_with_hint(hint), hint);
    assert_eq!(storage.free_list(), vec![0, 2]);

    // Taking the tail moves the tail back
    let hint = Entity::new(2, 4);
    assert_eq!(storage.create_with_hint(hint), hint);
    assert_eq!(storage.free_list(), vec![0]);

    verify_entity_storage(&storage).unwrap();
}

#[test]
fn test_entity_storage_hint_in_use_falls_back() {
    let mut storage = EntityStorage::new();
    let e = storage.create();

    let created = storage.create_with_hint(Entity::new(e.index(), 3));
    assert_ne!(created.index(), e.index());
    assert!(storage.valid(e));

    // Null and tombstone hints are ignored
    assert!(!storage.create_with_hint(Entity::NULL).is_null());
    assert!(!storage.create_with_hint(Entity::new(7, Entity::VERSION_MASK)).is_tombstone());

    verify_entity_storage(&storage).unwrap();
}

#[test]
#[should_panic(expected = "not a valid entity")]
fn test_entity_storage_double_release_panics() {
    let mut storage = EntityStorage::new();
    let e = storage.create();
    storage.release(e, 1);
    storage.release(e, 2);
}

proptest! {
    #[test]
    fn prop_live_handles_match_slots(ops in prop::collection::vec(any::<(bool, u8)>(), 1..300)) {
        let mut storage = EntityStorage::new();
        let mut live: Vec<Entity> = Vec::new();

        for (create, pick) in ops {
            if create || live.is_empty() {
                live.push(storage.create());
            } else {
                let entity = live.swap_remove(pick as usize % live.len());
                storage.release(entity, entity.next().version());
                prop_assert!(!storage.valid(entity));
            }

            // Every live handle is valid and carries the stored version
            let mut indices = HashSet::new();
            for entity in &live {
                prop_assert!(storage.valid(*entity));
                prop_assert_eq!(storage.current(*entity), entity.version());
                prop_assert!(indices.insert(entity.index()));
            }
        }

        prop_assert_eq!(storage.len(), live.len());
        prop_assert!(verify_entity_storage(&storage).is_ok());
    }
}
