use crate::component::TypeInfo;
use crate::entity::Entity;
use crate::registry::RegistryId;
use crate::signal::Signals;
use crate::storage::Storage;
use std::any::{Any, TypeId};
use std::cell::{Ref, RefCell, RefMut};
use std::ops::Deref;
use std::rc::Rc;

/// Type-erased contract every pool exposes to the registry, groups and views.
pub trait Pool: Any {
    /// Descriptor of the element type, checked before every typed access.
    fn type_info(&self) -> TypeInfo;

    /// Attaches the pool to its registry. A pool belongs to one registry only.
    fn bind(&mut self, owner: RegistryId);

    fn owner(&self) -> Option<RegistryId>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, entity: Entity) -> bool;

    fn find(&self, entity: Entity) -> Option<usize>;

    /// Members in packed order.
    fn data(&self) -> &[Entity];

    fn swap_at(&mut self, a: usize, b: usize);

    fn swap_elements(&mut self, a: Entity, b: Entity);

    /// Removes `entity` if present. Listeners are not involved.
    fn remove(&mut self, entity: Entity) -> bool;

    fn clear(&mut self);

    fn compact(&mut self);

    /// Moves the members shared with `other` to the front in `other`'s order.
    fn sort_as(&mut self, other: &[Entity]) -> usize;

    /// Permutes the first `order.len()` members, see `SparseSet::arrange`.
    fn arrange(&mut self, order: &[usize]);

    fn signals(&self) -> &Signals;

    fn signals_mut(&mut self) -> &mut Signals;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Shared handle to a pool. The registry directory and every group covering
/// the pool hold one.
pub type PoolHandle = Rc<RefCell<dyn Pool>>;

#[cold]
fn type_mismatch<T>(info: TypeInfo) -> ! {
    panic!(
        "pool of `{}` accessed as `{}`",
        info.name,
        std::any::type_name::<T>()
    )
}

pub fn downcast_ref<T: 'static>(pool: &dyn Pool) -> &Storage<T> {
    let info = pool.type_info();

    if info.id == TypeId::of::<T>() {
        if let Some(storage) = pool.as_any().downcast_ref::<Storage<T>>() {
            return storage;
        }
    }

    type_mismatch::<T>(info)
}

pub fn downcast_mut<T: 'static>(pool: &mut dyn Pool) -> &mut Storage<T> {
    let info = pool.type_info();

    if info.id == TypeId::of::<T>() {
        if let Some(storage) = pool.as_any_mut().downcast_mut::<Storage<T>>() {
            return storage;
        }
    }

    type_mismatch::<T>(info)
}

pub fn borrow_storage<T: 'static>(handle: &PoolHandle) -> Ref<'_, Storage<T>> {
    Ref::map(handle.borrow(), |pool| downcast_ref::<T>(pool))
}

pub fn borrow_storage_mut<T: 'static>(handle: &PoolHandle) -> RefMut<'_, Storage<T>> {
    RefMut::map(handle.borrow_mut(), |pool| downcast_mut::<T>(pool))
}

/// Read-only access to a pool that may not exist yet.
///
/// Probing an unregistered type yields a fresh empty storage owned by this
/// value, so nothing is shared between callers.
pub enum PoolRef<'a, T: 'static> {
    Live(Ref<'a, Storage<T>>),
    Placeholder(Storage<T>),
}

impl<'a, T: 'static> PoolRef<'a, T> {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, PoolRef::Placeholder(_))
    }
}

impl<'a, T: 'static> Deref for PoolRef<'a, T> {
    type Target = Storage<T>;

    fn deref(&self) -> &Self::Target {
        match self {
            PoolRef::Live(storage) => &**storage,
            PoolRef::Placeholder(storage) => storage,
        }
    }
}
