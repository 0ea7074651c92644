use crate::algorithm::SortAlgorithm;
use crate::entity::Entity;
use crate::safety::verify_sparse_set;
use crate::sparse_set::SparseSet;
use proptest::prelude::*;

#[test]
fn test_sparse_set_push_and_find() {
    let mut set = SparseSet::new();
    let a = Entity::new(3, 0);
    let b = Entity::new(300, 2);

    assert_eq!(set.push(a), 0);
    assert_eq!(set.push(b), 1);

    assert!(set.contains(a));
    assert!(set.contains(b));
    assert_eq!(set.index(b), 1);

    // Other versions of a member are not members
    assert!(!set.contains(Entity::new(3, 1)));
    assert!(set.contains_index(Entity::new(3, 1)));

    // Pages are allocated lazily
    assert_eq!(set.page_count(), 2);
    verify_sparse_set(&set).unwrap();
}

#[test]
#[should_panic]
fn test_sparse_set_rejects_duplicate_index() {
    let mut set = SparseSet::new();
    set.push(Entity::new(1, 0));
    set.push(Entity::new(1, 1));
}

#[test]
fn test_sparse_set_swap_remove_moves_last() {
    let mut set = SparseSet::new();
    let entities: Vec<Entity> = (0..4).map(|i| Entity::new(i, 0)).collect();

    for &e in &entities {
        set.push(e);
    }

    assert_eq!(set.swap_remove(entities[1]), Some(1));
    assert_eq!(set.data(), &[entities[0], entities[3], entities[2]]);
    assert_eq!(set.index(entities[3]), 1);

    // Removing an absent entity is a no-op
    assert!(!set.remove(entities[1]));
    assert!(set.remove(entities[2]));
    assert_eq!(set.len(), 2);

    verify_sparse_set(&set).unwrap();
}

#[test]
fn test_sparse_set_compact_drops_empty_pages() {
    let mut set = SparseSet::new();
    let near = Entity::new(1, 0);
    let far = Entity::new(1000, 0);

    set.push(near);
    set.push(far);
    assert_eq!(set.page_count(), 2);

    set.remove(far);
    set.compact();
    assert_eq!(set.page_count(), 1);
    assert!(set.contains(near));

    verify_sparse_set(&set).unwrap();
}

#[test]
fn test_sparse_set_arrange_follows_cycles() {
    let mut set = SparseSet::new();
    let entities: Vec<Entity> = (0..5).map(|i| Entity::new(i, 0)).collect();

    for &e in &entities {
        set.push(e);
    }

    let mut shadow: Vec<u32> = (0..5).collect();
    set.arrange(&[2, 0, 1, 4, 3], |a, b| shadow.swap(a, b));

    assert_eq!(
        set.data(),
        &[entities[2], entities[0], entities[1], entities[4], entities[3]]
    );
    assert_eq!(shadow, vec![2, 0, 1, 4, 3]);

    verify_sparse_set(&set).unwrap();
}

#[test]
fn test_sparse_set_sort_as() {
    let mut set = SparseSet::new();
    let entities: Vec<Entity> = (0..5).map(|i| Entity::new(i, 0)).collect();

    for &e in &entities {
        set.push(e);
    }

    // Non-members in the other range are skipped
    let other = [entities[4], Entity::new(9, 0), entities[1], entities[3]];
    let shared = set.sort_as(&other, |_, _| {});

    assert_eq!(shared, 3);
    assert_eq!(&set.data()[..3], &[entities[4], entities[1], entities[3]]);

    verify_sparse_set(&set).unwrap();
}

#[test]
fn test_sparse_set_sort_n_reports_swaps() {
    let mut set = SparseSet::new();
    let mut shadow: Vec<u32> = Vec::new();

    for index in [4, 1, 3, 0, 2] {
        set.push(Entity::new(index, 0));
        shadow.push(index * 10);
    }

    // Only the first four members take part
    set.sort_n(4, |a, b| a.index().cmp(&b.index()), SortAlgorithm::Stable, |a, b| {
        shadow.swap(a, b)
    });

    let order: Vec<u32> = set.iter().map(|e| e.index()).collect();
    assert_eq!(order, vec![0, 1, 3, 4, 2]);
    assert_eq!(shadow, vec![0, 10, 30, 40, 20]);
    verify_sparse_set(&set).unwrap();
}

proptest! {
    #[test]
    fn prop_remove_reports_prior_membership(ops in prop::collection::vec((0u32..64, any::<bool>()), 1..200)) {
        let mut set = SparseSet::new();

        for (index, insert) in ops {
            let entity = Entity::new(index, 0);
            let before = set.contains(entity);

            if insert {
                if !before {
                    set.push(entity);
                }
                prop_assert!(set.contains(entity));
            } else {
                prop_assert_eq!(set.remove(entity), before);
                prop_assert!(!set.contains(entity));
            }
        }

        prop_assert!(verify_sparse_set(&set).is_ok());
    }
}
