// Allow this crate to reference itself as ::ecs_registry::
// This enables proc macros to use absolute paths that work both internally and externally
extern crate self as ecs_registry;

pub mod algorithm;
pub mod block;
pub mod component;
pub mod context;
pub mod entity;
pub mod entity_storage;
pub mod error;
pub mod group;
pub mod pool;
pub mod prelude;
pub mod registry;
pub mod safety;
pub mod signal;
pub mod sparse_set;
pub mod storage;
pub mod view;

#[cfg(target_arch = "wasm32")]
#[cfg(test)]
mod wasm_tests;

pub use crate::{
    algorithm::SortAlgorithm, component::Component, entity::Entity, error::RegistryError,
    group::Group, registry::Registry, storage::Storage, view::View,
};
