use crate::algorithm::SortAlgorithm;
use crate::entity::Entity;
use crate::pool::{Pool, downcast_ref};
use crate::safety::verify_sparse_set;
use crate::storage::Storage;

#[derive(Clone, Debug, PartialEq)]
struct Health {
    value: u32,
}

fn entities(n: u32) -> Vec<Entity> {
    (0..n).map(|i| Entity::new(i, 0)).collect()
}

#[test]
fn test_storage_emplace_get_remove() {
    let mut storage = Storage::<Health>::new();
    let e = entities(3);

    storage.emplace(e[0], Health { value: 10 });
    storage.emplace(e[1], Health { value: 20 });
    storage.emplace(e[2], Health { value: 30 });

    assert_eq!(storage.len(), 3);
    assert_eq!(storage.get(e[1]).value, 20);

    storage.get_mut(e[1]).value = 25;
    assert_eq!(storage.try_get(e[1]), Some(&Health { value: 25 }));

    // Removal swaps the last value into the hole
    assert_eq!(storage.remove(e[0]), Some(Health { value: 10 }));
    assert_eq!(storage.data(), &[e[2], e[1]]);
    assert_eq!(storage.values()[0].value, 30);

    // Removing again reports absence
    assert_eq!(storage.remove(e[0]), None);
    assert!(storage.try_get(e[0]).is_none());

    verify_sparse_set(storage.base()).unwrap();
}

#[test]
fn test_storage_stale_version_is_not_contained() {
    let mut storage = Storage::<Health>::new();
    storage.emplace(Entity::new(4, 1), Health { value: 1 });

    assert!(storage.contains(Entity::new(4, 1)));
    assert!(!storage.contains(Entity::new(4, 0)));
    assert!(storage.try_get_mut(Entity::new(4, 2)).is_none());
}

#[test]
#[should_panic]
fn test_storage_get_missing_panics() {
    let storage = Storage::<Health>::new();
    storage.get(Entity::new(0, 0));
}

#[test]
fn test_storage_sort_by_value_keeps_pairs() {
    let mut storage = Storage::<Health>::new();
    let e = entities(5);
    let values = [50, 10, 40, 20, 30];

    for (entity, value) in e.iter().zip(values) {
        storage.emplace(*entity, Health { value });
    }

    for algorithm in [SortAlgorithm::Stable, SortAlgorithm::Unstable, SortAlgorithm::Insertion] {
        storage.sort_by(|a, b| a.value.cmp(&b.value), algorithm);

        let sorted: Vec<u32> = storage.values().iter().map(|h| h.value).collect();
        assert_eq!(sorted, vec![10, 20, 30, 40, 50]);

        // Every entity still maps to its own value
        for (entity, value) in e.iter().zip(values) {
            assert_eq!(storage.get(*entity).value, value);
        }

        storage.sort_by(|a, b| b.value.cmp(&a.value), algorithm);
    }

    verify_sparse_set(storage.base()).unwrap();
}

#[test]
fn test_storage_sort_by_entity() {
    let mut storage = Storage::<Health>::new();
    let e = entities(4);

    for entity in e.iter().rev() {
        storage.emplace(*entity, Health { value: entity.index() });
    }

    storage.sort_by_entity(|a, b| a.index().cmp(&b.index()), SortAlgorithm::default());
    assert_eq!(storage.data(), e.as_slice());

    let values: Vec<u32> = storage.values().iter().map(|h| h.value).collect();
    assert_eq!(values, vec![0, 1, 2, 3]);
}

#[test]
fn test_storage_sort_as_puts_shared_first() {
    let mut storage = Storage::<Health>::new();
    let e = entities(5);

    for entity in &e {
        storage.emplace(*entity, Health { value: entity.index() });
    }

    let shared = storage.sort_as(&[e[3], e[0], Entity::new(42, 0)]);
    assert_eq!(shared, 2);
    assert_eq!(&storage.data()[..2], &[e[3], e[0]]);
    assert_eq!(storage.get(e[3]).value, 3);
    assert_eq!(storage.get(e[0]).value, 0);
}

#[test]
fn test_storage_as_pool() {
    let mut storage = Storage::<Health>::new();
    let e = entities(2);
    storage.emplace(e[0], Health { value: 7 });

    let pool: &mut dyn Pool = &mut storage;
    assert_eq!(pool.type_info().name, std::any::type_name::<Health>());
    assert!(pool.contains(e[0]));
    assert!(!pool.remove(e[1]));
    assert_eq!(downcast_ref::<Health>(pool).get(e[0]).value, 7);
    assert!(pool.remove(e[0]));
    assert!(pool.is_empty());
}

#[test]
#[should_panic(expected = "accessed as")]
fn test_storage_downcast_mismatch_panics() {
    let storage = Storage::<Health>::new();
    let pool: &dyn Pool = &storage;
    downcast_ref::<u64>(pool);
}

#[test]
fn test_storage_tag_type() {
    #[derive(Clone, Copy)]
    struct Tag;

    let mut storage = Storage::<Tag>::new();
    let e = entities(3);

    for entity in &e {
        storage.emplace(*entity, Tag);
    }

    storage.remove(e[1]);
    assert_eq!(storage.len(), 2);
    assert_eq!(storage.iter().count(), 2);
}
