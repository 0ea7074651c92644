use crate::entity::Entity;

/// Contract failures that have a `try_*` entry point on the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("group {requested} conflicts with existing group {existing}: owned types overlap without nesting")]
    ConflictingGroups { requested: String, existing: String },

    #[error("storage of `{component}` is owned by a group and cannot be sorted")]
    OwnedStorage { component: &'static str },

    #[error("cannot sort the storage of `{component}` as itself")]
    SameStorage { component: &'static str },

    #[error("{0:?} is not a valid entity")]
    InvalidEntity(Entity),
}
