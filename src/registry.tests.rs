use super::*;
use crate::safety::{verify_entity_storage, verify_groups};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Component, Clone, Debug, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Component, Clone, Debug, PartialEq)]
struct Health(i32);

#[derive(Component, Clone, Debug, PartialEq)]
struct Marker;

#[derive(Debug, PartialEq)]
struct Config {
    name: &'static str,
}

fn position(x: f32) -> Position {
    Position { x, y: 0.0 }
}

#[test]
fn test_view_remove_destroy_scenario() {
    let mut registry = Registry::new();
    let e1 = registry.create();
    let e2 = registry.create();
    let _e3 = registry.create();

    registry.emplace(e1, Marker);
    registry.emplace(e2, Marker);

    let view = registry.view::<Marker>();
    assert_eq!(view.iter().collect::<Vec<_>>(), vec![e1, e2]);

    assert_eq!(registry.remove::<Marker>(e1), 1);
    assert_eq!(view.iter().collect::<Vec<_>>(), vec![e2]);

    let version = registry.destroy(e2);
    assert!(!registry.valid(e2));
    assert_eq!(registry.current(e2), version);
    assert_eq!(version, e2.version() + 1);
    assert!(view.iter().next().is_none());

    let reused = registry.create();
    assert_eq!(reused.index(), e2.index());
    assert_eq!(reused.version(), version);
    assert!(registry.valid(reused));

    verify_entity_storage(&registry.entities()).unwrap();
}

#[test]
fn test_context_scenario() {
    let mut registry = Registry::new();

    registry.ctx_mut().emplace(Config { name: "first" });
    assert_eq!(registry.ctx().get::<Config>().name, "first");

    registry.ctx_mut().get_mut::<Config>().name = "edited";
    assert_eq!(registry.ctx().get::<Config>().name, "edited");

    registry.ctx_mut().insert_or_assign(Config { name: "second" });
    assert_eq!(registry.ctx().get::<Config>(), &Config { name: "second" });

    assert!(registry.ctx_mut().erase::<Config>());
    assert!(!registry.ctx_mut().erase::<Config>());
    assert!(registry.ctx().find::<Config>().is_none());
}

#[test]
fn test_create_and_release() {
    let mut registry = Registry::new();
    let e = registry.create();
    assert!(registry.orphan(e));
    assert_eq!(registry.alive(), 1);

    registry.emplace(e, Health(3));
    assert!(!registry.orphan(e));

    registry.remove::<Health>(e);
    assert_eq!(registry.release(e), 1);
    assert!(!registry.valid(e));
    assert_eq!(registry.alive(), 0);
}

#[test]
#[should_panic(expected = "still has components")]
fn test_release_requires_orphan() {
    let mut registry = Registry::new();
    let e = registry.create();
    registry.emplace(e, Health(3));
    registry.release(e);
}

#[test]
fn test_destroy_with_version() {
    let mut registry = Registry::new();
    let e = registry.create();

    assert_eq!(registry.destroy_with_version(e, 7), 7);
    assert_eq!(registry.current(e), 7);

    let reused = registry.create();
    assert_eq!(reused, Entity::new(e.index(), 7));

    // The tombstone version is never handed out
    assert_eq!(registry.destroy_with_version(reused, Entity::TOMBSTONE.version()), 0);
}

#[test]
fn test_try_destroy_invalid_entity() {
    let mut registry = Registry::new();
    let e = registry.create();
    registry.destroy(e);

    assert_eq!(registry.try_destroy(e), Err(RegistryError::InvalidEntity(e)));
    assert_eq!(registry.try_destroy(Entity::NULL), Err(RegistryError::InvalidEntity(Entity::NULL)));
}

#[test]
fn test_destroy_removes_every_component() {
    let mut registry = Registry::new();
    let e = registry.create();
    let other = registry.create();

    registry.emplace(e, position(1.0));
    registry.emplace(e, Health(10));
    registry.emplace(e, Marker);
    registry.emplace(other, Health(2));

    registry.destroy(e);

    assert!(!registry.storage_if_exists::<Position>().contains(e));
    assert!(!registry.storage_if_exists::<Health>().contains(e));
    assert!(!registry.storage_if_exists::<Marker>().contains(e));
    assert_eq!(registry.get::<Health>(other).0, 2);
}

#[test]
fn test_create_with_hint() {
    let mut registry = Registry::new();

    let hinted = registry.create_with_hint(Entity::new(5, 2));
    assert_eq!(hinted, Entity::new(5, 2));

    // Indices skipped by the hint are free for later creations
    let mut created: Vec<u32> = (0..5).map(|_| registry.create().index()).collect();
    created.sort();
    assert_eq!(created, vec![0, 1, 2, 3, 4]);

    // Hint on a live index falls back to a fresh entity
    let fallback = registry.create_with_hint(Entity::new(5, 0));
    assert_ne!(fallback.index(), 5);
    assert!(registry.valid(fallback));

    verify_entity_storage(&registry.entities()).unwrap();
}

#[test]
fn test_create_into() {
    let mut registry = Registry::new();
    let mut batch = [Entity::NULL; 8];
    registry.create_into(&mut batch);

    assert!(batch.iter().all(|&e| registry.valid(e)));
    assert_eq!(registry.alive(), 8);

    let mut visited = 0;
    registry.each(|_| visited += 1);
    assert_eq!(visited, 8);
}

#[test]
fn test_component_access() {
    let mut registry = Registry::new();
    let e = registry.create();

    registry.emplace(e, position(1.0)).y = 4.0;
    assert_eq!(*registry.get::<Position>(e), Position { x: 1.0, y: 4.0 });

    registry.get_mut::<Position>(e).x = 2.0;
    assert_eq!(registry.try_get::<Position>(e).map(|p| p.x), Some(2.0));

    assert!(registry.try_get::<Health>(e).is_none());
    assert!(registry.try_get_mut::<Health>(e).is_none());

    registry.get_or_emplace(e, || Health(1)).0 += 1;
    registry.get_or_emplace(e, || Health(100)).0 += 1;
    assert_eq!(registry.get::<Health>(e).0, 3);

    assert!(registry.all_of::<(Position, Health)>(e));
    assert!(!registry.all_of::<(Position, Marker)>(e));
    assert!(registry.any_of::<(Marker, Health)>(e));
    assert!(!registry.any_of::<Marker>(e));
}

#[test]
#[should_panic(expected = "not a valid entity")]
fn test_emplace_on_invalid_entity_panics() {
    let mut registry = Registry::new();
    let e = registry.create();
    registry.destroy(e);
    registry.emplace(e, Marker);
}

#[test]
fn test_insert_and_erase() {
    let mut registry = Registry::new();
    let entities: Vec<Entity> = (0..4).map(|_| registry.create()).collect();

    registry.insert(&entities, Marker);
    registry.insert_from(&entities[..2], vec![Health(1), Health(2)]);

    assert_eq!(registry.storage::<Marker>().len(), 4);
    assert_eq!(registry.get::<Health>(entities[1]).0, 2);
    assert!(!registry.all_of::<Health>(entities[2]));

    assert_eq!(registry.remove_many::<(Marker, Health)>(&entities), 6);
    assert_eq!(registry.remove::<Marker>(entities[0]), 0);

    registry.insert(&entities, Health(0));
    registry.erase_many::<Health>(&entities);
    assert!(registry.storage::<Health>().is_empty());
}

#[test]
#[should_panic(expected = "does not have every component")]
fn test_erase_missing_component_panics() {
    let mut registry = Registry::new();
    let e = registry.create();
    registry.emplace(e, Marker);
    registry.erase::<(Marker, Health)>(e);
}

#[test]
fn test_signals_order_and_payload() {
    let mut registry = Registry::new();
    let log: Rc<RefCell<Vec<String>>> = Rc::default();

    let sink = log.clone();
    registry.on_construct::<Health>().connect(move |registry, entity| {
        let value = registry.get::<Health>(entity).0;
        sink.borrow_mut().push(format!("construct {}", value));
    });

    let sink = log.clone();
    registry.on_update::<Health>().connect(move |registry, entity| {
        let value = registry.get::<Health>(entity).0;
        sink.borrow_mut().push(format!("update {}", value));
    });

    let sink = log.clone();
    registry.on_destroy::<Health>().connect(move |registry, entity| {
        // Still readable while being destroyed
        let value = registry.get::<Health>(entity).0;
        sink.borrow_mut().push(format!("destroy {}", value));
    });

    let sink = log.clone();
    registry.on_entity_destroy().connect(move |registry, entity| {
        let orphan = registry.orphan(entity);
        sink.borrow_mut().push(format!("release orphan={}", orphan));
    });

    let e = registry.create();
    registry.emplace(e, Health(1));
    registry.patch::<Health, _>(e, |h| h.0 = 2);
    registry.replace(e, Health(3));
    registry.emplace_or_replace(e, Health(4));
    registry.destroy(e);

    assert_eq!(
        *log.borrow(),
        vec![
            "construct 1",
            "update 2",
            "update 3",
            "update 4",
            "destroy 4",
            "release orphan=true",
        ]
    );
}

#[test]
fn test_disconnect_listener() {
    let mut registry = Registry::new();
    let count = Rc::new(RefCell::new(0));

    let counter = count.clone();
    let connection = registry
        .on_entity_construct()
        .connect(move |_, _| *counter.borrow_mut() += 1);

    registry.create();
    assert!(registry.on_entity_construct().disconnect(connection));
    assert!(!registry.on_entity_construct().disconnect(connection));
    registry.create();

    assert_eq!(*count.borrow(), 1);
    assert_eq!(registry.on_entity_construct().len(), 0);

    registry.on_destroy::<Marker>().connect(|_, _| {});
    assert!(!registry.on_destroy::<Marker>().is_empty());
    registry.on_destroy::<Marker>().clear();
    assert!(registry.on_destroy::<Marker>().is_empty());
}

#[test]
fn test_clear_and_clear_all() {
    let mut registry = Registry::new();
    let entities: Vec<Entity> = (0..3).map(|_| registry.create()).collect();
    let destroyed = Rc::new(RefCell::new(0));

    let counter = destroyed.clone();
    registry
        .on_destroy::<Health>()
        .connect(move |_, _| *counter.borrow_mut() += 1);

    registry.insert(&entities, Health(1));
    registry.insert(&entities, Marker);

    registry.clear::<Marker>();
    assert!(registry.storage::<Marker>().is_empty());
    assert_eq!(registry.alive(), 3);

    registry.clear_all();
    assert_eq!(*destroyed.borrow(), 3);
    assert_eq!(registry.alive(), 0);
    assert!(registry.storage::<Health>().is_empty());
    assert!(entities.iter().all(|&e| !registry.valid(e)));

    verify_entity_storage(&registry.entities()).unwrap();
}

#[test]
fn test_compact_keeps_members() {
    let mut registry = Registry::new();
    let entities: Vec<Entity> = (0..64).map(|_| registry.create()).collect();
    registry.insert(&entities, Health(0));

    for &e in &entities[..60] {
        registry.remove::<Health>(e);
    }

    registry.compact::<Health>();
    registry.compact_all();

    assert_eq!(registry.storage::<Health>().len(), 4);
    assert!(entities[60..].iter().all(|&e| registry.all_of::<Health>(e)));
}

#[test]
fn test_storage_if_exists_placeholder() {
    let registry = Registry::new();

    let pool = registry.storage_if_exists::<Position>();
    assert!(pool.is_placeholder());
    assert!(pool.is_empty());
    assert!(!pool.contains(Entity::new(0, 0)));
    drop(pool);

    // Reading never creates a pool
    assert_eq!(registry.storages().count(), 1);
    assert!(registry.storage_by_id(Position::type_index()).is_none());
}

#[test]
fn test_named_pools_of_one_type() {
    let mut registry = Registry::new();
    let backup = crate::component::hashed_string("backup");
    let e1 = registry.create();
    let e2 = registry.create();

    registry.emplace(e1, Health(10));
    registry.storage_as_mut::<Health>(backup).emplace(e1, Health(99));
    registry.storage_as_mut::<Health>(backup).emplace(e2, Health(50));

    assert_eq!(registry.get::<Health>(e1).0, 10);
    assert!(!registry.all_of::<Health>(e2));
    assert_eq!(registry.storage_as::<Health>(backup).get(e1).0, 99);
    assert_eq!(registry.storage_as::<Health>(backup).len(), 2);
    assert_eq!(registry.storage::<Health>().len(), 1);

    let pool = registry.storage_by_id(backup).unwrap();
    assert_eq!(pool.type_info().name, std::any::type_name::<Health>());
    drop(pool);

    // Destroying an entity clears it from every pool
    registry.destroy(e1);
    assert!(!registry.storage_if_exists_as::<Health>(backup).contains(e1));
    assert!(registry.storage_if_exists_as::<Health>(backup).contains(e2));
    assert!(!registry.orphan(e2));
    verify_entity_storage(&registry.entities()).unwrap();
}

#[test]
fn test_storage_if_exists_as_unknown_id() {
    let registry = Registry::new();
    let id = crate::component::hashed_string("missing");

    let pool = registry.storage_if_exists_as::<Health>(id);
    assert!(pool.is_placeholder());
    assert!(pool.is_empty());
    drop(pool);

    assert!(registry.storage_by_id(id).is_none());
}

#[test]
#[should_panic(expected = "is shared by")]
fn test_named_pool_type_mismatch_panics() {
    let mut registry = Registry::new();
    let id = crate::component::hashed_string("slot");
    registry.storage_as::<Health>(id);
    registry.storage_as::<Marker>(id);
}

#[test]
#[should_panic(expected = "is used by a group")]
fn test_grouped_pool_cannot_be_written_directly() {
    let mut registry = Registry::new();
    registry.group::<Health, (), ()>();
    registry.storage_as_mut::<Health>(Health::type_index());
}

#[test]
fn test_storages_directory() {
    let mut registry = Registry::new();
    let e = registry.create();
    registry.emplace(e, Health(1));
    registry.emplace(e, Marker);

    let ids: Vec<Id> = registry.storages().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![entity_pool_id(), Health::type_index(), Marker::type_index()]);

    let pool = registry.storage_by_id(Health::type_index()).unwrap();
    assert_eq!(pool.len(), 1);
    assert_eq!(pool.type_info().name, std::any::type_name::<Health>());
}

#[test]
fn test_sort_by_value_and_entity() {
    let mut registry = Registry::new();
    let entities: Vec<Entity> = (0..5).map(|_| registry.create()).collect();

    for (i, &e) in entities.iter().enumerate() {
        registry.emplace(e, Health([3, 1, 4, 0, 2][i]));
    }

    registry.sort::<Health, _>(|l, r| l.0.cmp(&r.0), SortAlgorithm::Stable);
    let values: Vec<i32> = registry.storage::<Health>().values().iter().map(|h| h.0).collect();
    assert_eq!(values, vec![0, 1, 2, 3, 4]);

    registry.sort_by_entity::<Health, _>(|l, r| l.cmp(&r), SortAlgorithm::Insertion);
    assert_eq!(registry.storage::<Health>().data(), entities.as_slice());
    assert_eq!(registry.get::<Health>(entities[2]).0, 4);
}

#[test]
fn test_sort_as() {
    let mut registry = Registry::new();
    let entities: Vec<Entity> = (0..5).map(|_| registry.create()).collect();

    for &e in &entities {
        registry.emplace(e, Health(e.index() as i32));
    }
    for &e in [entities[4], entities[1], entities[3]].iter() {
        registry.emplace(e, Marker);
    }

    registry.sort_as::<Health, Marker>();

    let health = registry.storage::<Health>();
    assert_eq!(&health.data()[..3], &[entities[4], entities[1], entities[3]]);
    assert!(health.iter().all(|(e, h)| h.0 == e.index() as i32));
    drop(health);

    assert_eq!(
        registry.try_sort_as::<Health, Health>(),
        Err(RegistryError::SameStorage {
            component: std::any::type_name::<Health>()
        })
    );
}

#[test]
fn test_groups_follow_destroy() {
    let mut registry = Registry::new();
    let group = registry.group::<(Position, Health), (), Marker>();
    let entities: Vec<Entity> = (0..6).map(|_| registry.create()).collect();

    registry.insert(&entities, position(0.0));
    registry.insert(&entities[1..], Health(1));
    registry.emplace(entities[2], Marker);
    assert_eq!(group.len(), 4);

    registry.destroy_many(&entities[3..5]);
    assert_eq!(group.len(), 2);
    verify_groups(&registry).unwrap();

    registry.clear_all();
    assert!(group.is_empty());
    verify_groups(&registry).unwrap();
}

#[test]
fn test_owned_query() {
    let mut registry = Registry::new();
    assert!(!registry.owned::<Health>());

    registry.group::<Health, Position, ()>();
    assert!(registry.owned::<Health>());
    assert!(!registry.owned::<Position>());
    assert!(registry.owned::<(Position, Health)>());
}

#[test]
#[should_panic(expected = "already bound")]
fn test_pool_cannot_move_between_registries() {
    let mut first = Registry::new();
    let second = Registry::new();

    let pool = first.assure::<Health>();
    pool.borrow_mut().bind(second.id());
}
