use crate::algorithm::SortAlgorithm;
use crate::component::Component;
use crate::entity::Entity;
use crate::error::RegistryError;
use crate::registry::Registry;
use crate::safety::verify_groups;
use proptest::prelude::*;

#[derive(Component, Clone, Debug, PartialEq)]
struct A(u32);

#[derive(Component, Clone, Debug, PartialEq)]
struct B(u32);

#[derive(Component, Clone, Debug, PartialEq)]
struct C;

#[derive(Component, Clone, Debug, PartialEq)]
struct D(u32);

fn spawn(registry: &mut Registry, count: usize) -> Vec<Entity> {
    (0..count).map(|_| registry.create()).collect()
}

#[test]
fn test_owning_group_packs_members_at_front() {
    let mut registry = Registry::new();
    let entities = spawn(&mut registry, 6);

    for (i, &e) in entities.iter().enumerate() {
        registry.emplace(e, A(i as u32));
    }
    registry.emplace(entities[5], B(5));
    registry.emplace(entities[2], B(2));
    registry.emplace(entities[3], B(3));
    registry.emplace(entities[3], C);

    let group = registry.group::<(A, B), (), C>();
    assert!(group.is_owning());
    assert_eq!(group.len(), 2);
    assert!(group.contains(entities[2]));
    assert!(group.contains(entities[5]));
    assert!(!group.contains(entities[3]));

    let members = group.entities().to_vec();
    assert_eq!(&registry.storage::<A>().data()[..2], members.as_slice());
    assert_eq!(&registry.storage::<B>().data()[..2], members.as_slice());

    verify_groups(&registry).unwrap();
}

#[test]
fn test_owning_group_tracks_changes() {
    let mut registry = Registry::new();
    let group = registry.group::<(A, B), (), C>();
    let entities = spawn(&mut registry, 4);

    for &e in &entities {
        registry.emplace(e, A(0));
    }
    assert!(group.is_empty());

    registry.emplace(entities[1], B(1));
    registry.emplace(entities[3], B(3));
    assert_eq!(group.len(), 2);
    verify_groups(&registry).unwrap();

    // Gaining an excluded type leaves the group, losing it re-enters
    registry.emplace(entities[1], C);
    assert_eq!(group.len(), 1);
    assert!(!group.contains(entities[1]));
    verify_groups(&registry).unwrap();

    registry.remove::<C>(entities[1]);
    assert!(group.contains(entities[1]));
    verify_groups(&registry).unwrap();

    registry.remove::<A>(entities[3]);
    assert_eq!(group.len(), 1);
    verify_groups(&registry).unwrap();

    registry.destroy(entities[1]);
    assert!(group.is_empty());
    verify_groups(&registry).unwrap();
}

#[test]
fn test_group_each_yields_owned_then_observed() {
    let mut registry = Registry::new();
    let entities = spawn(&mut registry, 3);

    for (i, &e) in entities.iter().enumerate() {
        registry.emplace(e, A(i as u32));
        registry.emplace(e, D(10 * i as u32));
    }

    let group = registry.group::<A, D, ()>();
    let mut visited = 0;

    group.each(|_, (a, d)| {
        a.0 += d.0;
        visited += 1;
    });

    assert_eq!(visited, 3);
    assert_eq!(registry.get::<A>(entities[2]).0, 22);
    assert_eq!(registry.get::<D>(entities[2]).0, 20);
}

#[test]
fn test_non_owning_group() {
    let mut registry = Registry::new();
    let entities = spawn(&mut registry, 4);

    registry.emplace(entities[0], A(0));
    registry.emplace(entities[0], B(0));
    registry.emplace(entities[1], A(1));

    let group = registry.group::<(), (A, B), C>();
    assert!(!group.is_owning());
    assert_eq!(group.entities().to_vec(), vec![entities[0]]);

    registry.emplace(entities[1], B(1));
    registry.emplace(entities[2], B(2));
    assert_eq!(group.len(), 2);

    registry.emplace(entities[0], C);
    assert_eq!(group.entities().to_vec(), vec![entities[1]]);

    // Observed pools stay free for other owners and sorting
    assert!(!registry.owned::<(A, B)>());
    registry.sort::<A, _>(|l, r| r.0.cmp(&l.0), SortAlgorithm::Stable);

    let mut total = 0;
    group.each(|_, (a, b)| total += a.0 + b.0);
    assert_eq!(total, 2);

    verify_groups(&registry).unwrap();
}

#[test]
fn test_group_is_cached() {
    let mut registry = Registry::new();
    assert!(registry.group_if_exists::<(A, B), (), ()>().is_none());

    let first = registry.group::<(A, B), (), ()>();
    let second = registry.group::<(A, B), (), ()>();

    let e = registry.create();
    registry.emplace(e, A(0));
    registry.emplace(e, B(0));

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert!(registry.group_if_exists::<(A, B), (), ()>().is_some());
    assert_eq!(registry.owning_handlers().count(), 1);
}

#[test]
fn test_conflicting_groups_are_rejected() {
    let mut registry = Registry::new();
    registry.group::<(A, B), (), ()>();

    let err = registry.try_group::<(B, C), (), ()>().err();
    assert!(matches!(err, Some(RegistryError::ConflictingGroups { .. })));

    // Same owned types in another arrangement of roles
    let err = registry.try_group::<A, D, ()>().err();
    assert!(matches!(err, Some(RegistryError::ConflictingGroups { .. })));

    assert_eq!(registry.owning_handlers().count(), 1);
    verify_groups(&registry).unwrap();
}

#[test]
#[should_panic(expected = "conflicts with existing group")]
fn test_conflicting_group_panics() {
    let mut registry = Registry::new();
    registry.group::<(A, B), (), ()>();
    registry.group::<(B, C), (), ()>();
}

#[test]
fn test_nested_groups_are_linked() {
    let mut registry = Registry::new();
    let entities = spawn(&mut registry, 5);

    for (i, &e) in entities.iter().enumerate() {
        registry.emplace(e, A(i as u32));
        registry.emplace(e, B(i as u32));
        if i % 2 == 0 {
            registry.emplace(e, D(i as u32));
        }
    }
    registry.emplace(entities[4], C);

    let wide = registry.group::<(A, B), D, C>();
    let narrow = registry.group::<(A, B), (), C>();

    assert_eq!(wide.len(), 2);
    assert_eq!(narrow.len(), 4);
    assert!(wide.sortable());
    assert!(!narrow.sortable());
    assert!(registry.sortable(&wide));

    // The wider group's members lead the narrower group's
    let narrow_members = narrow.entities().to_vec();
    for &e in wide.entities().iter() {
        assert!(narrow_members[..wide.len()].contains(&e));
    }

    verify_groups(&registry).unwrap();

    registry.remove::<D>(entities[0]);
    registry.emplace(entities[1], D(1));
    registry.remove::<C>(entities[4]);
    assert_eq!(wide.len(), 3);
    assert_eq!(narrow.len(), 5);
    verify_groups(&registry).unwrap();
}

#[test]
fn test_disjoint_owning_groups_coexist() {
    let mut registry = Registry::new();
    let first = registry.group::<A, (), ()>();
    let second = registry.group::<(B, D), (), ()>();

    let e = registry.create();
    registry.emplace(e, A(1));
    registry.emplace(e, B(1));
    registry.emplace(e, D(1));

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert!(registry.owned::<A>());
    assert!(!registry.owned::<C>());
    verify_groups(&registry).unwrap();
}

#[test]
fn test_sort_owning_group() {
    let mut registry = Registry::new();
    let entities = spawn(&mut registry, 5);

    for (i, &e) in entities.iter().enumerate() {
        registry.emplace(e, A(i as u32));
        registry.emplace(e, B(100 - i as u32));
    }

    let group = registry.group::<(A, B), (), ()>();
    group.sort_by(|l, r| r.index().cmp(&l.index()), SortAlgorithm::Insertion);

    let members = group.entities().to_vec();
    let expected: Vec<Entity> = entities.iter().rev().copied().collect();
    assert_eq!(members, expected);

    group.each(|entity, (a, b)| {
        assert_eq!(a.0, entity.index());
        assert_eq!(b.0, 100 - entity.index());
    });

    verify_groups(&registry).unwrap();
}

#[test]
#[should_panic(expected = "cannot be sorted")]
fn test_sort_nested_group_panics() {
    let mut registry = Registry::new();
    registry.group::<(A, B), D, ()>();
    let narrow = registry.group::<(A, B), (), ()>();

    narrow.sort_by(|l, r| l.cmp(&r), SortAlgorithm::Unstable);
}

#[test]
fn test_owned_storage_cannot_be_sorted() {
    let mut registry = Registry::new();
    registry.group::<A, (), ()>();

    let err = registry.try_sort::<A, _>(|l, r| l.0.cmp(&r.0), SortAlgorithm::Stable);
    assert!(matches!(err, Err(RegistryError::OwnedStorage { .. })));

    let err = registry.try_sort_as::<A, B>();
    assert!(matches!(err, Err(RegistryError::OwnedStorage { .. })));

    // B is not owned by anyone
    assert!(registry.try_sort_as::<B, A>().is_ok());
}

#[test]
fn test_clear_leaves_groups_consistent() {
    let mut registry = Registry::new();
    let group = registry.group::<(A, B), (), C>();
    let entities = spawn(&mut registry, 4);

    for &e in &entities {
        registry.emplace(e, A(0));
        registry.emplace(e, B(0));
    }
    registry.emplace(entities[0], C);
    assert_eq!(group.len(), 3);

    registry.clear::<C>();
    assert_eq!(group.len(), 4);
    verify_groups(&registry).unwrap();

    registry.clear::<B>();
    assert!(group.is_empty());
    assert_eq!(registry.storage::<A>().len(), 4);
    verify_groups(&registry).unwrap();
}

#[test]
fn test_sort_non_owning_group() {
    let mut registry = Registry::new();
    let entities = spawn(&mut registry, 5);

    for (i, &e) in entities.iter().enumerate() {
        registry.emplace(e, A(i as u32));
        registry.emplace(e, B(i as u32));
    }

    let group = registry.group::<(), (A, B), ()>();
    assert!(group.sortable());
    group.sort_by(|l, r| r.index().cmp(&l.index()), SortAlgorithm::Stable);

    let expected: Vec<Entity> = entities.iter().rev().copied().collect();
    assert_eq!(group.entities().to_vec(), expected);

    // The observed pools keep their own order
    assert_eq!(registry.storage::<A>().data(), entities.as_slice());
    verify_groups(&registry).unwrap();

    // The last member fills the hole
    registry.remove::<B>(entities[2]);
    assert_eq!(
        group.entities().to_vec(),
        vec![entities[4], entities[3], entities[0], entities[1]]
    );
    verify_groups(&registry).unwrap();

    registry.emplace(entities[2], B(2));
    assert_eq!(group.entities().last(), Some(&entities[2]));

    let mut visited = Vec::new();
    group.each(|entity, (a, b)| {
        assert_eq!(a.0, entity.index());
        assert_eq!(b.0, entity.index());
        visited.push(entity);
    });
    assert_eq!(visited, group.entities().to_vec());
    verify_groups(&registry).unwrap();
}

fn spawn_with_a_and_d(registry: &mut Registry, count: usize) -> Vec<Entity> {
    let entities = spawn(registry, count);
    for &e in &entities {
        registry.emplace(e, A(e.index()));
        registry.emplace(e, D(e.index()));
    }
    entities
}

fn assert_tree_shape(registry: &Registry) {
    let left = registry.group_if_exists::<A, (), ()>().unwrap();
    let right = registry.group_if_exists::<D, (), ()>().unwrap();
    let top = registry.group_if_exists::<(A, D), (), ()>().unwrap();

    assert!(!left.sortable());
    assert!(!right.sortable());
    assert!(top.sortable());
    assert!(!registry.sortable(&left));
    assert!(!registry.sortable(&right));
    assert!(registry.sortable(&top));

    for (_, handler) in registry.owning_handlers() {
        if handler.descriptor().size() == 1 {
            assert!(handler.prev().is_none());
            assert!(handler.next().is_some());
            assert_eq!(handler.wider(), 1);
        } else {
            assert!(handler.prev().is_some());
            assert!(handler.next().is_none());
            assert_eq!(handler.wider(), 0);
        }
    }

    verify_groups(registry).unwrap();
}

fn assert_top_pairs_values(registry: &Registry) {
    let top = registry.group_if_exists::<(A, D), (), ()>().unwrap();
    top.each(|entity, (a, d)| {
        assert_eq!(a.0, entity.index());
        assert_eq!(d.0, entity.index());
    });
}

#[test]
fn test_group_tree_built_from_the_leaves() {
    let mut registry = Registry::new();
    let entities = spawn_with_a_and_d(&mut registry, 6);

    registry.group::<A, (), ()>();
    registry.group::<D, (), ()>();
    let top = registry.group::<(A, D), (), ()>();
    assert_eq!(top.len(), 6);
    assert_tree_shape(&registry);

    top.sort_by(|l, r| r.index().cmp(&l.index()), SortAlgorithm::Insertion);
    let expected: Vec<Entity> = entities.iter().rev().copied().collect();
    assert_eq!(top.entities().to_vec(), expected);
    assert_tree_shape(&registry);
    assert_top_pairs_values(&registry);

    registry.remove::<D>(entities[1]);
    registry.destroy(entities[4]);
    registry.emplace(entities[1], D(entities[1].index()));
    assert_eq!(top.len(), 5);
    assert_tree_shape(&registry);
    assert_top_pairs_values(&registry);
}

#[test]
fn test_group_tree_built_from_the_top() {
    let mut registry = Registry::new();
    let entities = spawn_with_a_and_d(&mut registry, 6);

    registry.group::<A, (), ()>();
    let top = registry.group::<(A, D), (), ()>();
    registry.group::<D, (), ()>();
    assert_tree_shape(&registry);

    top.sort_by(|l, r| r.index().cmp(&l.index()), SortAlgorithm::Stable);
    assert_tree_shape(&registry);
    assert_top_pairs_values(&registry);

    registry.remove::<A>(entities[0]);
    assert_eq!(top.len(), 5);
    assert_tree_shape(&registry);
    assert_top_pairs_values(&registry);
}

#[test]
#[should_panic(expected = "cannot be sorted")]
fn test_sort_group_under_a_tree_panics() {
    let mut registry = Registry::new();
    spawn_with_a_and_d(&mut registry, 6);

    registry.group::<A, (), ()>();
    let right = registry.group::<D, (), ()>();
    registry.group::<(A, D), (), ()>();

    right.sort_by(|l, r| r.index().cmp(&l.index()), SortAlgorithm::Insertion);
}

#[test]
fn test_reordered_owned_types_build_a_second_group() {
    let mut registry = Registry::new();
    let e = registry.create();
    registry.emplace(e, A(1));
    registry.emplace(e, B(1));

    let first = registry.group::<(A, B), (), ()>();
    let second = registry.try_group::<(B, A), (), ()>().unwrap();

    assert_eq!(registry.owning_handlers().count(), 2);
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);

    // Same size and types, so neither counts as wider than the other
    assert!(first.sortable());
    assert!(second.sortable());
    verify_groups(&registry).unwrap();
}

proptest! {
    #[test]
    fn prop_groups_match_brute_force(ops in prop::collection::vec((0u8..9, 0usize..12), 1..300)) {
        let mut registry = Registry::new();
        let narrow = registry.group::<(A, B), (), C>();
        let wide = registry.group::<(A, B), D, C>();
        let observer = registry.group::<(), (A, D), ()>();
        let single = registry.group::<D, (), ()>();
        let mut entities = spawn(&mut registry, 12);

        for (op, slot) in ops {
            let e = entities[slot];

            match op {
                0 => { registry.emplace_or_replace(e, A(slot as u32)); }
                1 => { registry.emplace_or_replace(e, B(slot as u32)); }
                2 => { registry.emplace_or_replace(e, C); }
                3 => { registry.emplace_or_replace(e, D(slot as u32)); }
                4 => { registry.remove::<A>(e); }
                5 => { registry.remove::<B>(e); }
                6 => { registry.remove::<C>(e); }
                7 => { registry.remove::<(B, D)>(e); }
                _ => {
                    registry.destroy(e);
                    entities[slot] = registry.create();
                }
            }

            prop_assert!(verify_groups(&registry).is_ok());
        }

        for &e in &entities {
            let base = registry.all_of::<(A, B)>(e) && !registry.all_of::<C>(e);
            prop_assert_eq!(narrow.contains(e), base);
            prop_assert_eq!(wide.contains(e), base && registry.all_of::<D>(e));
            prop_assert_eq!(observer.contains(e), registry.all_of::<(A, D)>(e));
            prop_assert_eq!(single.contains(e), registry.all_of::<D>(e));
        }

        let narrow_members = narrow.entities().to_vec();
        for &e in wide.entities().iter() {
            prop_assert!(narrow_members[..wide.len()].contains(&e));
        }
    }

    #[test]
    fn prop_group_tree_matches_brute_force(ops in prop::collection::vec((0u8..8, 0usize..10), 1..300)) {
        let mut registry = Registry::new();
        let left = registry.group::<A, (), ()>();
        let top = registry.group::<(A, D), (), C>();
        let right = registry.group::<D, (), ()>();
        let mut entities = spawn(&mut registry, 10);

        prop_assert!(!left.sortable());
        prop_assert!(!right.sortable());
        prop_assert!(top.sortable());

        for (op, slot) in ops {
            let e = entities[slot];

            match op {
                0 => { registry.emplace_or_replace(e, A(e.index())); }
                1 => { registry.emplace_or_replace(e, D(e.index())); }
                2 => { registry.emplace_or_replace(e, C); }
                3 => { registry.remove::<A>(e); }
                4 => { registry.remove::<D>(e); }
                5 => { registry.remove::<C>(e); }
                6 => top.sort_by(|l, r| r.index().cmp(&l.index()), SortAlgorithm::Insertion),
                _ => {
                    registry.destroy(e);
                    entities[slot] = registry.create();
                }
            }

            prop_assert!(verify_groups(&registry).is_ok());
        }

        for &e in &entities {
            prop_assert_eq!(left.contains(e), registry.all_of::<A>(e));
            prop_assert_eq!(right.contains(e), registry.all_of::<D>(e));
            prop_assert_eq!(top.contains(e), registry.all_of::<(A, D)>(e) && !registry.all_of::<C>(e));
        }

        let mut paired = true;
        top.each(|entity, (a, d)| paired &= a.0 == entity.index() && d.0 == entity.index());
        prop_assert!(paired);
    }
}
