// Registry checks that run under wasm-bindgen-test in a browser.

use crate::prelude::*;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[derive(Component, Clone, Debug, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Component, Clone, Debug, PartialEq)]
struct Velocity {
    x: f32,
    y: f32,
}

#[wasm_bindgen_test]
fn test_wasm_component_basic() {
    let mut registry = Registry::new();
    let entity = registry.create();

    registry.emplace(entity, Position { x: 4.0, y: 2.0 });

    assert_eq!(registry.get::<Position>(entity).x, 4.0);
    assert!(registry.all_of::<Position>(entity));
}

#[wasm_bindgen_test]
fn test_wasm_entity_create_destroy() {
    let mut registry = Registry::new();
    let e1 = registry.create();
    let _e2 = registry.create();

    assert_eq!(registry.alive(), 2);

    registry.destroy(e1);
    assert_eq!(registry.alive(), 1);
    assert!(!registry.valid(e1));

    let e3 = registry.create();
    assert_eq!(e3.index(), e1.index());
    assert_eq!(e3.version(), e1.version() + 1);
}

#[wasm_bindgen_test]
fn test_wasm_view_each() {
    let mut registry = Registry::new();
    let entity = registry.create();

    registry.emplace(entity, Position { x: 0.0, y: 0.0 });
    registry.emplace(entity, Velocity { x: 1.0, y: 2.0 });

    registry
        .view::<(Position, Velocity)>()
        .each(|_, (position, velocity)| {
            position.x += velocity.x;
            position.y += velocity.y;
        });

    assert_eq!(*registry.get::<Position>(entity), Position { x: 1.0, y: 2.0 });
}

#[wasm_bindgen_test]
fn test_wasm_owning_group() {
    let mut registry = Registry::new();
    let group = registry.group::<(Position, Velocity), (), ()>();

    let still = registry.create();
    let moving = registry.create();
    registry.emplace(still, Position { x: 0.0, y: 0.0 });
    registry.emplace(moving, Position { x: 0.0, y: 0.0 });
    registry.emplace(moving, Velocity { x: 1.0, y: 0.0 });

    assert_eq!(group.entities().to_vec(), vec![moving]);
    assert_eq!(registry.storage::<Position>().data()[0], moving);
}
