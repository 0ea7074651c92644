pub use crate::algorithm::SortAlgorithm;
pub use crate::component::{Component, ComponentSet, hashed_string};
pub use crate::context::Context;
pub use crate::entity::Entity;
pub use crate::error::RegistryError;
pub use crate::group::Group;
pub use crate::registry::Registry;
pub use crate::signal::Connection;
pub use crate::storage::Storage;
pub use crate::view::View;
