use crate::component::Component;
use crate::entity::Entity;
use crate::registry::Registry;

#[derive(Component, Clone, Debug, PartialEq)]
struct Position {
    x: i32,
}

#[derive(Component, Clone, Debug, PartialEq)]
struct Velocity {
    dx: i32,
}

#[derive(Component, Clone, Debug, PartialEq)]
struct Frozen;

#[test]
fn test_view_single_type_storage_order() {
    let mut registry = Registry::new();
    let e1 = registry.create();
    let e2 = registry.create();
    let _e3 = registry.create();

    registry.emplace(e1, Position { x: 1 });
    registry.emplace(e2, Position { x: 2 });

    let view = registry.view::<Position>();
    assert_eq!(view.iter().collect::<Vec<_>>(), vec![e1, e2]);

    registry.remove::<Position>(e1);
    assert_eq!(view.iter().collect::<Vec<_>>(), vec![e2]);
}

#[test]
fn test_view_each_mutates_values() {
    let mut registry = Registry::new();
    let entities: Vec<Entity> = (0..4).map(|_| registry.create()).collect();

    for (i, &e) in entities.iter().enumerate() {
        registry.emplace(e, Position { x: i as i32 });
    }
    registry.emplace(entities[1], Velocity { dx: 10 });
    registry.emplace(entities[3], Velocity { dx: 20 });

    let view = registry.view::<(Position, Velocity)>();
    let mut seen = Vec::new();

    view.each(|entity, (position, velocity)| {
        position.x += velocity.dx;
        seen.push(entity);
    });

    seen.sort();
    assert_eq!(seen, vec![entities[1], entities[3]]);
    assert_eq!(registry.get::<Position>(entities[1]).x, 11);
    assert_eq!(registry.get::<Position>(entities[3]).x, 23);
    assert_eq!(registry.get::<Position>(entities[0]).x, 0);
}

#[test]
fn test_view_drives_from_smallest_pool() {
    let mut registry = Registry::new();
    let entities: Vec<Entity> = (0..5).map(|_| registry.create()).collect();

    for &e in &entities {
        registry.emplace(e, Position { x: 0 });
    }
    registry.emplace(entities[4], Velocity { dx: 1 });
    registry.emplace(entities[2], Velocity { dx: 1 });

    let view = registry.view::<(Position, Velocity)>();
    assert_eq!(view.size_hint(), 2);

    // Velocity is the smaller pool, so its packed order wins
    assert_eq!(view.iter().collect::<Vec<_>>(), vec![entities[4], entities[2]]);
}

#[test]
fn test_view_iteration_leaves_larger_pools_writable() {
    let mut registry = Registry::new();
    let entities: Vec<Entity> = (0..4).map(|_| registry.create()).collect();

    for &e in &entities {
        registry.emplace(e, Position { x: 0 });
    }
    registry.emplace(entities[1], Velocity { dx: 3 });
    registry.emplace(entities[3], Velocity { dx: 5 });

    let view = registry.view_excluding::<(Position, Velocity), Frozen>();
    for entity in view.iter() {
        registry.patch::<Position, _>(entity, |position| position.x += 1);
        registry.emplace_or_replace(entity, Frozen);
    }

    assert_eq!(registry.get::<Position>(entities[1]).x, 1);
    assert_eq!(registry.get::<Position>(entities[3]).x, 1);
    assert_eq!(registry.get::<Position>(entities[0]).x, 0);
    assert_eq!(view.iter().count(), 0);
}

#[test]
fn test_view_excluding() {
    let mut registry = Registry::new();
    let entities: Vec<Entity> = (0..3).map(|_| registry.create()).collect();

    for &e in &entities {
        registry.emplace(e, Position { x: 1 });
    }
    registry.emplace(entities[1], Frozen);

    let view = registry.view_excluding::<Position, Frozen>();
    assert!(view.contains(entities[0]));
    assert!(!view.contains(entities[1]));
    assert_eq!(view.iter().count(), 2);

    let mut count = 0;
    view.each(|_, position| {
        position.x = 5;
        count += 1;
    });

    assert_eq!(count, 2);
    assert_eq!(registry.get::<Position>(entities[1]).x, 1);
    assert_eq!(registry.get::<Position>(entities[2]).x, 5);
}

#[test]
fn test_view_exclude_pool_created_empty() {
    let mut registry = Registry::new();
    let e = registry.create();
    registry.emplace(e, Position { x: 1 });

    // Excluded types need no data to participate
    let view = registry.view_excluding::<Position, (Frozen, Velocity)>();
    assert_eq!(view.iter().collect::<Vec<_>>(), vec![e]);
    assert!(registry.storage_if_exists::<Frozen>().is_empty());
    assert!(!registry.storage_if_exists::<Frozen>().is_placeholder());
}

#[test]
fn test_view_sees_later_changes() {
    let mut registry = Registry::new();
    let view = registry.view::<Position>();
    assert_eq!(view.iter().count(), 0);

    let e = registry.create();
    registry.emplace(e, Position { x: 3 });
    assert_eq!(view.iter().collect::<Vec<_>>(), vec![e]);
}

#[test]
#[should_panic(expected = "same component type twice")]
fn test_view_rejects_duplicate_types() {
    let mut registry = Registry::new();
    registry.view_excluding::<Position, Position>();
}
