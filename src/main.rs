use ecs_registry::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

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

#[derive(Component, Clone, Debug)]
struct Sleeping;

struct FrameCount(u32);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut registry = Registry::new();
    registry.ctx_mut().emplace(FrameCount(0));

    registry.on_destroy::<Position>().connect(|registry, entity| {
        let position = registry.get::<Position>(entity);
        info!(?entity, x = position.x, y = position.y, "position removed");
    });

    for i in 0..8 {
        let entity = registry.create();
        registry.emplace(entity, Position { x: 0.0, y: i as f32 });

        if i % 2 == 0 {
            registry.emplace(entity, Velocity { x: 1.0, y: 0.5 });
        }
        if i % 3 == 0 {
            registry.emplace(entity, Sleeping);
        }
    }

    // Moving entities are packed at the front of both pools
    let moving = registry.group::<(Position, Velocity), (), Sleeping>();

    for _ in 0..3 {
        moving.each(|_, (position, velocity)| {
            position.x += velocity.x;
            position.y += velocity.y;
        });
        registry.ctx_mut().get_mut::<FrameCount>().0 += 1;
    }

    let frames = registry.ctx().get::<FrameCount>().0;
    info!(frames, moving = moving.len(), "simulation finished");

    let view = registry.view::<Position>();
    view.each(|entity, position| {
        info!(?entity, x = position.x, y = position.y, "final position");
    });

    let sleepers: Vec<Entity> = registry.view::<Sleeping>().iter().collect();
    registry.destroy_many(&sleepers);

    info!(alive = registry.alive(), "destroyed sleeping entities");
}
