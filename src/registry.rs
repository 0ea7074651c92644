use crate::algorithm::SortAlgorithm;
use crate::component::{Component, ComponentSet, Id, type_hash};
use crate::context::Context;
use crate::entity::Entity;
use crate::entity_storage::EntityStorage;
use crate::error::RegistryError;
use crate::group::{
    Group, GroupDescriptor, GroupHandler, GroupKey, NonOwningGroupHandler, OwningGroupHandler,
};
use crate::pool::{Pool, PoolHandle, PoolRef, borrow_storage, borrow_storage_mut};
use crate::signal::{SignalKind, Sink};
use crate::storage::Storage;
use crate::view::View;
use std::any::{TypeId, type_name};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::cmp::Ordering;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use tracing::debug;

/// Identity of a registry. Pools are bound to the registry that created them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegistryId(u64);

impl RegistryId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);

        RegistryId(NEXT_ID.fetch_add(1, AtomicOrdering::Relaxed))
    }
}

/// Key of the entity pool, always the first entry of the pool directory.
pub fn entity_pool_id() -> Id {
    type_hash::<Entity>()
}

#[cold]
fn invalid(entity: Entity) -> ! {
    panic!("{}", RegistryError::InvalidEntity(entity))
}

/// Owner of every entity, pool, group and context value.
///
/// All structural changes go through `&mut self`. Listeners receive `&Registry`
/// and can read anything, but cannot add or remove entities or components
/// while a notification is running.
pub struct Registry {
    id: RegistryId,
    vars: Context,
    /// Pools in registration order, the entity pool first.
    pools: Vec<(Id, PoolHandle)>,
    lookup: HashMap<Id, usize>,
    /// Sorted by descriptor size, smallest first.
    owning_groups: Vec<(GroupKey, Rc<RefCell<OwningGroupHandler>>)>,
    non_owning_groups: Vec<(GroupKey, Rc<RefCell<NonOwningGroupHandler>>)>,
    shortcut: Rc<RefCell<EntityStorage>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::from_entity_storage(EntityStorage::new())
    }

    /// Creates a registry whose entity pool has room for `capacity` entities.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_entity_storage(EntityStorage::with_capacity(capacity))
    }

    fn from_entity_storage(mut entities: EntityStorage) -> Self {
        let id = RegistryId::next();
        entities.bind(id);

        let shortcut = Rc::new(RefCell::new(entities));
        let pools: Vec<(Id, PoolHandle)> = vec![(entity_pool_id(), shortcut.clone())];
        let lookup = HashMap::from([(entity_pool_id(), 0)]);

        Registry {
            id,
            vars: Context::new(),
            pools,
            lookup,
            owning_groups: Vec::new(),
            non_owning_groups: Vec::new(),
            shortcut,
        }
    }

    pub fn id(&self) -> RegistryId {
        self.id
    }

    /// Returns the pool of `T`, creating and binding it on first use.
    pub(crate) fn assure<T: Component>(&mut self) -> PoolHandle {
        self.assure_as::<T>(T::type_index())
    }

    /// Returns the pool registered under `id`, creating a `T` pool there on
    /// first use. Panics if `id` already names a pool of another type.
    pub(crate) fn assure_as<T: Component>(&mut self, id: Id) -> PoolHandle {
        if let Some(pool) = self.pool(id) {
            let info = pool.borrow().type_info();
            if info.id != TypeId::of::<T>() {
                panic!(
                    "pool id {:#x} is shared by `{}` and `{}`",
                    id,
                    info.name,
                    type_name::<T>()
                );
            }

            return pool.clone();
        }

        let mut storage = Storage::<T>::new();
        storage.bind(self.id);

        debug!(component = type_name::<T>(), id, "creating pool");
        let pool: PoolHandle = Rc::new(RefCell::new(storage));
        self.lookup.insert(id, self.pools.len());
        self.pools.push((id, pool.clone()));
        pool
    }

    fn owning_group(&self, key: GroupKey) -> Option<&Rc<RefCell<OwningGroupHandler>>> {
        self.owning_groups
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, handler)| handler)
    }

    fn pool(&self, id: Id) -> Option<&PoolHandle> {
        self.lookup.get(&id).map(|&position| &self.pools[position].1)
    }

    fn existing<T: Component>(&self) -> &PoolHandle {
        match self.pool(T::type_index()) {
            Some(pool) => pool,
            None => panic!("no pool exists for `{}`", type_name::<T>()),
        }
    }

    fn notify(&self, pool: &PoolHandle, kind: SignalKind, entity: Entity) {
        let listeners = {
            let pool = pool.borrow();
            let signal = pool.signals().get(kind);
            if signal.is_empty() {
                return;
            }
            signal.snapshot()
        };

        for listener in listeners {
            listener(self, entity);
        }
    }

    fn entity_pool(&self) -> &PoolHandle {
        &self.pools[0].1
    }

    // Entities

    /// The entity pool.
    pub fn entities(&self) -> Ref<'_, EntityStorage> {
        self.shortcut.borrow()
    }

    /// Number of live entities.
    pub fn alive(&self) -> usize {
        self.shortcut.borrow().len()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.shortcut.borrow_mut().reserve(additional);
    }

    pub fn valid(&self, entity: Entity) -> bool {
        self.shortcut.borrow().valid(entity)
    }

    /// Version stored for `entity`'s index, or the tombstone version if the
    /// index was never used.
    pub fn current(&self, entity: Entity) -> u32 {
        self.shortcut.borrow().current(entity)
    }

    pub fn create(&mut self) -> Entity {
        let entity = self.shortcut.borrow_mut().create();
        self.notify(self.entity_pool(), SignalKind::Construct, entity);
        entity
    }

    /// Creates `hint` itself if its index is free, otherwise a fresh entity.
    pub fn create_with_hint(&mut self, hint: Entity) -> Entity {
        let entity = self.shortcut.borrow_mut().create_with_hint(hint);
        self.notify(self.entity_pool(), SignalKind::Construct, entity);
        entity
    }

    /// Fills `out` with new entities.
    pub fn create_into(&mut self, out: &mut [Entity]) {
        self.shortcut.borrow_mut().reserve(out.len());

        for slot in out.iter_mut() {
            *slot = self.create();
        }
    }

    /// Removes every component of `entity`, then retires it with the next
    /// version. Returns the version stored for the index.
    pub fn destroy(&mut self, entity: Entity) -> u32 {
        self.destroy_with_version(entity, entity.next().version())
    }

    /// Like [`destroy`](Self::destroy) with a caller-chosen version. The
    /// tombstone version is skipped.
    pub fn destroy_with_version(&mut self, entity: Entity, version: u32) -> u32 {
        match self.try_destroy_with_version(entity, version) {
            Ok(version) => version,
            Err(err) => panic!("{}", err),
        }
    }

    pub fn try_destroy(&mut self, entity: Entity) -> Result<u32, RegistryError> {
        self.try_destroy_with_version(entity, entity.next().version())
    }

    pub fn try_destroy_with_version(
        &mut self,
        entity: Entity,
        version: u32,
    ) -> Result<u32, RegistryError> {
        if !self.valid(entity) {
            return Err(RegistryError::InvalidEntity(entity));
        }

        let ids: Vec<Id> = self.pools.iter().skip(1).map(|(id, _)| *id).collect();
        for id in ids.into_iter().rev() {
            self.remove_id(id, entity);
        }

        Ok(self.release_unchecked(entity, version))
    }

    pub fn destroy_many(&mut self, entities: &[Entity]) {
        for &entity in entities {
            self.destroy(entity);
        }
    }

    /// Retires an entity that has no components left.
    pub fn release(&mut self, entity: Entity) -> u32 {
        self.release_with_version(entity, entity.next().version())
    }

    pub fn release_with_version(&mut self, entity: Entity, version: u32) -> u32 {
        if !self.valid(entity) {
            invalid(entity);
        }

        if !self.orphan(entity) {
            panic!("{:?} still has components and cannot be released", entity);
        }

        self.release_unchecked(entity, version)
    }

    fn release_unchecked(&self, entity: Entity, version: u32) -> u32 {
        self.notify(self.entity_pool(), SignalKind::Destroy, entity);
        self.shortcut.borrow_mut().release(entity, version)
    }

    /// True if no pool other than the entity pool contains `entity`.
    pub fn orphan(&self, entity: Entity) -> bool {
        self.pools
            .iter()
            .skip(1)
            .all(|(_, pool)| !pool.borrow().contains(entity))
    }

    /// Calls `func` for every live entity.
    pub fn each<F>(&self, mut func: F)
    where
        F: FnMut(Entity),
    {
        for &entity in self.shortcut.borrow().data() {
            func(entity);
        }
    }

    // Group bookkeeping

    fn groups_reference(&self, id: Id) -> bool {
        self.owning_groups.iter().any(|(_, h)| {
            let h = h.borrow();
            h.descriptor().requires(id) || h.descriptor().excludes(id)
        }) || self.non_owning_groups.iter().any(|(_, h)| {
            let h = h.borrow();
            h.descriptor().requires(id) || h.descriptor().excludes(id)
        })
    }

    /// Group updates after `entity` gained the component `id`.
    fn enter_groups(&self, id: Id, entity: Entity) {
        for (_, handler) in self.owning_groups.iter().rev() {
            let mut handler = handler.borrow_mut();
            if handler.descriptor().excludes(id) {
                handler.discard(entity);
            }
        }

        for (_, handler) in &self.non_owning_groups {
            let mut handler = handler.borrow_mut();
            if handler.descriptor().excludes(id) {
                handler.discard(entity);
            }
        }

        for (_, handler) in &self.owning_groups {
            let mut handler = handler.borrow_mut();
            if handler.descriptor().requires(id) {
                handler.push(entity);
            }
        }

        for (_, handler) in &self.non_owning_groups {
            let mut handler = handler.borrow_mut();
            if handler.descriptor().requires(id) {
                handler.push(entity);
            }
        }
    }

    /// Group updates before `entity` loses the component `id`.
    fn leave_groups(&self, id: Id, entity: Entity) {
        for (_, handler) in self.owning_groups.iter().rev() {
            let mut handler = handler.borrow_mut();
            if handler.descriptor().requires(id) {
                handler.discard(entity);
            }
        }

        for (_, handler) in &self.non_owning_groups {
            let mut handler = handler.borrow_mut();
            if handler.descriptor().requires(id) {
                handler.discard(entity);
            }
        }
    }

    /// Group updates after `entity` lost the component `id`.
    fn after_leave(&self, id: Id, entity: Entity) {
        for (_, handler) in &self.owning_groups {
            let mut handler = handler.borrow_mut();
            if handler.descriptor().excludes(id) {
                handler.push(entity);
            }
        }

        for (_, handler) in &self.non_owning_groups {
            let mut handler = handler.borrow_mut();
            if handler.descriptor().excludes(id) {
                handler.push(entity);
            }
        }
    }

    fn constructed(&self, id: Id, pool: &PoolHandle, entity: Entity) {
        self.enter_groups(id, entity);
        self.notify(pool, SignalKind::Construct, entity);
    }

    /// Removes component `id` from `entity`, with listeners and groups.
    fn remove_id(&self, id: Id, entity: Entity) -> bool {
        let Some(pool) = self.pool(id) else {
            return false;
        };

        if !pool.borrow().contains(entity) {
            return false;
        }

        self.notify(pool, SignalKind::Destroy, entity);
        self.leave_groups(id, entity);
        pool.borrow_mut().remove(entity);
        self.after_leave(id, entity);
        true
    }

    fn contains_id(&self, id: Id, entity: Entity) -> bool {
        self.pool(id)
            .is_some_and(|pool| pool.borrow().contains(entity))
    }

    fn clear_id(&self, id: Id) {
        let Some(pool) = self.pool(id) else {
            return;
        };

        if pool.borrow().signals().destroy.is_empty() && !self.groups_reference(id) {
            pool.borrow_mut().clear();
            return;
        }

        let members = pool.borrow().data().to_vec();
        for entity in members.into_iter().rev() {
            self.remove_id(id, entity);
        }
    }

    // Components

    /// Attaches `value` to `entity` and returns it. Panics if `entity` is
    /// invalid or already has a `T`.
    pub fn emplace<T: Component>(&mut self, entity: Entity, value: T) -> RefMut<'_, T> {
        if !self.valid(entity) {
            invalid(entity);
        }

        let pool = self.assure::<T>();
        borrow_storage_mut::<T>(&pool).emplace(entity, value);
        self.constructed(T::type_index(), &pool, entity);
        self.get_mut::<T>(entity)
    }

    /// Attaches a clone of `value` to every entity in `entities`.
    pub fn insert<T: Component + Clone>(&mut self, entities: &[Entity], value: T) {
        self.insert_from(entities, std::iter::repeat(value));
    }

    /// Attaches values from `values` to `entities`, pairwise.
    pub fn insert_from<T, I>(&mut self, entities: &[Entity], values: I)
    where
        T: Component,
        I: IntoIterator<Item = T>,
    {
        let pool = self.assure::<T>();
        let mut inserted = Vec::with_capacity(entities.len());

        {
            let mut storage = borrow_storage_mut::<T>(&pool);
            storage.reserve(entities.len());

            for (&entity, value) in entities.iter().zip(values) {
                if !self.valid(entity) {
                    invalid(entity);
                }

                storage.emplace(entity, value);
                inserted.push(entity);
            }
        }

        for entity in inserted {
            self.constructed(T::type_index(), &pool, entity);
        }
    }

    pub fn emplace_or_replace<T: Component>(&mut self, entity: Entity, value: T) -> RefMut<'_, T> {
        if self.all_of::<T>(entity) {
            self.replace(entity, value)
        } else {
            self.emplace(entity, value)
        }
    }

    /// Applies `func` to `entity`'s `T`, then notifies update listeners.
    pub fn patch<T, F>(&mut self, entity: Entity, func: F) -> RefMut<'_, T>
    where
        T: Component,
        F: FnOnce(&mut T),
    {
        let pool = self.existing::<T>().clone();
        func(borrow_storage_mut::<T>(&pool).get_mut(entity));
        self.notify(&pool, SignalKind::Update, entity);
        self.get_mut::<T>(entity)
    }

    pub fn replace<T: Component>(&mut self, entity: Entity, value: T) -> RefMut<'_, T> {
        self.patch(entity, move |current: &mut T| *current = value)
    }

    /// Removes the types of `S` that `entity` has. Returns how many were
    /// removed.
    pub fn remove<S: ComponentSet>(&mut self, entity: Entity) -> usize {
        let mut removed = 0;

        S::all(&mut |id| {
            removed += self.remove_id(id, entity) as usize;
            true
        });

        removed
    }

    pub fn remove_many<S: ComponentSet>(&mut self, entities: &[Entity]) -> usize {
        entities.iter().map(|&entity| self.remove::<S>(entity)).sum()
    }

    /// Removes every type of `S` from `entity`. Panics if one is missing.
    pub fn erase<S: ComponentSet>(&mut self, entity: Entity) {
        if !self.all_of::<S>(entity) {
            panic!("{:?} does not have every component being erased", entity);
        }

        self.remove::<S>(entity);
    }

    pub fn erase_many<S: ComponentSet>(&mut self, entities: &[Entity]) {
        for &entity in entities {
            self.erase::<S>(entity);
        }
    }

    pub fn all_of<S: ComponentSet>(&self, entity: Entity) -> bool {
        S::all(&mut |id| self.contains_id(id, entity))
    }

    pub fn any_of<S: ComponentSet>(&self, entity: Entity) -> bool {
        S::any(&mut |id| self.contains_id(id, entity))
    }

    /// Panics if `entity` has no `T`.
    pub fn get<T: Component>(&self, entity: Entity) -> Ref<'_, T> {
        Ref::map(borrow_storage::<T>(self.existing::<T>()), |storage| {
            storage.get(entity)
        })
    }

    pub fn get_mut<T: Component>(&self, entity: Entity) -> RefMut<'_, T> {
        RefMut::map(borrow_storage_mut::<T>(self.existing::<T>()), |storage| {
            storage.get_mut(entity)
        })
    }

    pub fn try_get<T: Component>(&self, entity: Entity) -> Option<Ref<'_, T>> {
        let pool = self.pool(T::type_index())?;

        Ref::filter_map(borrow_storage::<T>(pool), |storage| storage.try_get(entity)).ok()
    }

    pub fn try_get_mut<T: Component>(&self, entity: Entity) -> Option<RefMut<'_, T>> {
        let pool = self.pool(T::type_index())?;

        RefMut::filter_map(borrow_storage_mut::<T>(pool), |storage| {
            storage.try_get_mut(entity)
        })
        .ok()
    }

    pub fn get_or_emplace<T, F>(&mut self, entity: Entity, init: F) -> RefMut<'_, T>
    where
        T: Component,
        F: FnOnce() -> T,
    {
        if self.all_of::<T>(entity) {
            self.get_mut::<T>(entity)
        } else {
            self.emplace(entity, init())
        }
    }

    /// Removes every component of the types in `S` from every entity.
    pub fn clear<S: ComponentSet>(&mut self) {
        S::all(&mut |id| {
            self.clear_id(id);
            true
        });
    }

    /// Empties every pool, then retires every entity.
    pub fn clear_all(&mut self) {
        debug!(pools = self.pools.len(), entities = self.alive(), "clearing registry");

        let ids: Vec<Id> = self.pools.iter().skip(1).map(|(id, _)| *id).collect();
        for id in ids.into_iter().rev() {
            self.clear_id(id);
        }

        let alive = self.shortcut.borrow().data().to_vec();
        for entity in alive {
            self.release_unchecked(entity, entity.next().version());
        }
    }

    pub fn compact<S: ComponentSet>(&mut self) {
        S::all(&mut |id| {
            if let Some(pool) = self.pool(id) {
                pool.borrow_mut().compact();
            }
            true
        });
    }

    pub fn compact_all(&mut self) {
        for (_, pool) in &self.pools {
            pool.borrow_mut().compact();
        }
    }

    // Pools and signals

    pub fn storage<T: Component>(&mut self) -> Ref<'_, Storage<T>> {
        self.assure::<T>();
        borrow_storage::<T>(self.existing::<T>())
    }

    /// Read-only access that never creates a pool. An absent pool reads as
    /// an empty one.
    pub fn storage_if_exists<T: Component>(&self) -> PoolRef<'_, T> {
        self.storage_if_exists_as::<T>(T::type_index())
    }

    /// The pool of `T` registered under `id`, created on first use. One type
    /// may have several pools this way, e.g. under [`hashed_string`] names.
    /// Only the default pool of `T` takes part in component operations,
    /// views and groups. Destroying an entity still clears it from every pool.
    ///
    /// Panics if `id` names a pool of another type.
    ///
    /// [`hashed_string`]: crate::component::hashed_string
    pub fn storage_as<T: Component>(&mut self, id: Id) -> Ref<'_, Storage<T>> {
        self.assure_as::<T>(id);
        borrow_storage::<T>(&self.pools[self.lookup[&id]].1)
    }

    /// Mutable access to a named pool. Writes through it fire no listeners.
    /// Panics if a group uses the pool.
    pub fn storage_as_mut<T: Component>(&mut self, id: Id) -> RefMut<'_, Storage<T>> {
        if self.groups_reference(id) {
            panic!("pool {:#x} of `{}` is used by a group", id, type_name::<T>());
        }

        self.assure_as::<T>(id);
        borrow_storage_mut::<T>(&self.pools[self.lookup[&id]].1)
    }

    /// Like [`storage_if_exists`](Self::storage_if_exists) for the pool under
    /// `id`. Panics if `id` names a pool of another type.
    pub fn storage_if_exists_as<T: Component>(&self, id: Id) -> PoolRef<'_, T> {
        match self.pool(id) {
            Some(pool) => PoolRef::Live(borrow_storage::<T>(pool)),
            None => PoolRef::Placeholder(Storage::new()),
        }
    }

    pub fn storage_by_id(&self, id: Id) -> Option<Ref<'_, dyn Pool>> {
        self.pool(id).map(|pool| pool.borrow())
    }

    /// Every pool with its id, the entity pool first.
    pub fn storages(&self) -> impl Iterator<Item = (Id, Ref<'_, dyn Pool>)> + '_ {
        self.pools.iter().map(|(id, pool)| (*id, pool.borrow()))
    }

    fn sink<T: Component>(&mut self, kind: SignalKind) -> Sink<'_> {
        self.assure::<T>();
        let pool = self.existing::<T>();
        Sink::new(RefMut::map(pool.borrow_mut(), move |pool| {
            pool.signals_mut().get_mut(kind)
        }))
    }

    /// Listeners run after a `T` is attached.
    pub fn on_construct<T: Component>(&mut self) -> Sink<'_> {
        self.sink::<T>(SignalKind::Construct)
    }

    /// Listeners run after a `T` is patched or replaced.
    pub fn on_update<T: Component>(&mut self) -> Sink<'_> {
        self.sink::<T>(SignalKind::Update)
    }

    /// Listeners run before a `T` is removed and can still read it.
    pub fn on_destroy<T: Component>(&mut self) -> Sink<'_> {
        self.sink::<T>(SignalKind::Destroy)
    }

    pub fn on_entity_construct(&mut self) -> Sink<'_> {
        Sink::new(RefMut::map(self.entity_pool().borrow_mut(), |pool| {
            &mut pool.signals_mut().construct
        }))
    }

    /// Listeners run after an entity lost its components, before its
    /// version is bumped.
    pub fn on_entity_destroy(&mut self) -> Sink<'_> {
        Sink::new(RefMut::map(self.entity_pool().borrow_mut(), |pool| {
            &mut pool.signals_mut().destroy
        }))
    }

    // Views and groups

    pub fn view<G: ComponentSet>(&mut self) -> View<G> {
        self.view_excluding::<G, ()>()
    }

    pub fn view_excluding<G: ComponentSet, E: ComponentSet>(&mut self) -> View<G, E> {
        let mut get = Vec::with_capacity(G::COUNT);
        G::assure(self, &mut get);

        let mut exclude = Vec::with_capacity(E::COUNT);
        E::assure(self, &mut exclude);

        View::new(get, exclude)
    }

    /// Returns the group owning `O`, observing `G` and excluding `E`,
    /// building it on first request. Panics on ownership conflicts.
    pub fn group<O, G, E>(&mut self) -> Group<O, G, E>
    where
        O: ComponentSet,
        G: ComponentSet,
        E: ComponentSet,
    {
        match self.try_group::<O, G, E>() {
            Ok(group) => group,
            Err(err) => panic!("{}", err),
        }
    }

    pub fn try_group<O, G, E>(&mut self) -> Result<Group<O, G, E>, RegistryError>
    where
        O: ComponentSet,
        G: ComponentSet,
        E: ComponentSet,
    {
        const { assert!(O::COUNT + G::COUNT > 0, "a group needs at least one owned or observed type") };

        if let Some(group) = self.group_if_exists::<O, G, E>() {
            return Ok(group);
        }

        let key = TypeId::of::<(O, G, E)>();

        let mut owned = Vec::with_capacity(O::COUNT);
        O::assure(self, &mut owned);
        let mut get = Vec::with_capacity(G::COUNT);
        G::assure(self, &mut get);
        let mut exclude = Vec::with_capacity(E::COUNT);
        E::assure(self, &mut exclude);

        let names = owned
            .iter()
            .chain(&get)
            .chain(&exclude)
            .map(|pool| pool.borrow().type_info().name)
            .collect();
        let descriptor = GroupDescriptor::new(O::ids(), G::ids(), E::ids(), names);

        if O::COUNT == 0 {
            let handler = NonOwningGroupHandler::new(descriptor, get, exclude);
            debug!(group = %handler.descriptor().label(), len = handler.len(), "created non-owning group");

            let handler = Rc::new(RefCell::new(handler));
            self.non_owning_groups.push((key, handler.clone()));
            return Ok(Group::new(GroupHandler::NonOwning(handler)));
        }

        for (_, existing) in &self.owning_groups {
            let existing = existing.borrow();

            if !existing.descriptor().compatible(&descriptor) {
                return Err(RegistryError::ConflictingGroups {
                    requested: descriptor.label(),
                    existing: existing.descriptor().label(),
                });
            }
        }

        let size = descriptor.size();
        let handler = OwningGroupHandler::new(descriptor, owned, get, exclude);

        let position = self
            .owning_groups
            .iter()
            .position(|(_, other)| other.borrow().descriptor().size() > size)
            .unwrap_or(self.owning_groups.len());

        let handler = Rc::new(RefCell::new(handler));
        self.owning_groups.insert(position, (key, handler.clone()));
        self.relink_groups();

        {
            let handler = handler.borrow();
            debug!(
                group = %handler.descriptor().label(),
                len = handler.len(),
                linked_prev = handler.prev().is_some(),
                linked_next = handler.next().is_some(),
                wider = handler.wider(),
                "created owning group"
            );
        }

        Ok(Group::new(GroupHandler::Owning(handler)))
    }

    /// Recomputes the links of every owning group. Overlapping groups may
    /// nest as a tree, so a single insertion can change the nearest
    /// neighbours of several groups at once.
    fn relink_groups(&self) {
        for (_, handler) in &self.owning_groups {
            let (prev, next, wider) = {
                let this = handler.borrow();
                let size = this.descriptor().size();
                let mut prev: Option<(GroupKey, usize)> = None;
                let mut next: Option<(GroupKey, usize)> = None;
                let mut wider = 0;

                for (other_key, other) in &self.owning_groups {
                    let other = other.borrow();
                    if !other.descriptor().overlaps(this.descriptor()) {
                        continue;
                    }

                    let other_size = other.descriptor().size();
                    if other_size < size && prev.is_none_or(|(_, s)| s < other_size) {
                        prev = Some((*other_key, other_size));
                    }
                    if other_size > size {
                        wider += 1;
                        if next.is_none_or(|(_, s)| s > other_size) {
                            next = Some((*other_key, other_size));
                        }
                    }
                }

                (prev.map(|(k, _)| k), next.map(|(k, _)| k), wider)
            };

            handler.borrow_mut().set_links(prev, next, wider);
        }
    }

    /// Returns the group if it was built before. Never builds one.
    pub fn group_if_exists<O, G, E>(&self) -> Option<Group<O, G, E>>
    where
        O: ComponentSet,
        G: ComponentSet,
        E: ComponentSet,
    {
        let key = TypeId::of::<(O, G, E)>();

        if O::COUNT == 0 {
            let (_, handler) = self.non_owning_groups.iter().find(|(k, _)| *k == key)?;
            Some(Group::new(GroupHandler::NonOwning(handler.clone())))
        } else {
            let handler = self.owning_group(key)?;
            Some(Group::new(GroupHandler::Owning(handler.clone())))
        }
    }

    /// True if any type of `S` is owned by some group.
    pub fn owned<S: ComponentSet>(&self) -> bool {
        S::any(&mut |id| {
            self.owning_groups
                .iter()
                .any(|(_, handler)| handler.borrow().descriptor().owns(id))
        })
    }

    /// True if `group` may be sorted: no larger owning group overlaps its
    /// owned pools.
    pub fn sortable<O, G, E>(&self, group: &Group<O, G, E>) -> bool
    where
        O: ComponentSet,
        G: ComponentSet,
        E: ComponentSet,
    {
        if !group.is_owning() {
            return true;
        }

        let descriptor = group.descriptor();
        !self.owning_groups.iter().any(|(_, other)| {
            let other = other.borrow();
            other.descriptor().size() > descriptor.size() && other.descriptor().overlaps(&descriptor)
        })
    }

    pub(crate) fn owning_handlers(&self) -> impl Iterator<Item = (GroupKey, Ref<'_, OwningGroupHandler>)> + '_ {
        self.owning_groups.iter().map(|(key, h)| (*key, h.borrow()))
    }

    pub(crate) fn non_owning_handlers(&self) -> impl Iterator<Item = Ref<'_, NonOwningGroupHandler>> + '_ {
        self.non_owning_groups.iter().map(|(_, h)| h.borrow())
    }

    // Sorting

    /// Sorts the pool of `T` by value. Panics if a group owns `T`.
    pub fn sort<T, C>(&mut self, compare: C, algorithm: SortAlgorithm)
    where
        T: Component,
        C: FnMut(&T, &T) -> Ordering,
    {
        if let Err(err) = self.try_sort::<T, C>(compare, algorithm) {
            panic!("{}", err);
        }
    }

    pub fn try_sort<T, C>(&mut self, compare: C, algorithm: SortAlgorithm) -> Result<(), RegistryError>
    where
        T: Component,
        C: FnMut(&T, &T) -> Ordering,
    {
        if self.owned::<T>() {
            return Err(RegistryError::OwnedStorage {
                component: type_name::<T>(),
            });
        }

        let pool = self.assure::<T>();
        borrow_storage_mut::<T>(&pool).sort_by(compare, algorithm);
        Ok(())
    }

    /// Sorts the pool of `T` by entity. Panics if a group owns `T`.
    pub fn sort_by_entity<T, C>(&mut self, compare: C, algorithm: SortAlgorithm)
    where
        T: Component,
        C: FnMut(Entity, Entity) -> Ordering,
    {
        if let Err(err) = self.try_sort_by_entity::<T, C>(compare, algorithm) {
            panic!("{}", err);
        }
    }

    pub fn try_sort_by_entity<T, C>(
        &mut self,
        compare: C,
        algorithm: SortAlgorithm,
    ) -> Result<(), RegistryError>
    where
        T: Component,
        C: FnMut(Entity, Entity) -> Ordering,
    {
        if self.owned::<T>() {
            return Err(RegistryError::OwnedStorage {
                component: type_name::<T>(),
            });
        }

        let pool = self.assure::<T>();
        borrow_storage_mut::<T>(&pool).sort_by_entity(compare, algorithm);
        Ok(())
    }

    /// Moves the entities `To` shares with `From` to the front of `To`'s
    /// pool, in `From`'s order. Panics if a group owns `To`.
    pub fn sort_as<To: Component, From: Component>(&mut self) {
        if let Err(err) = self.try_sort_as::<To, From>() {
            panic!("{}", err);
        }
    }

    pub fn try_sort_as<To: Component, From: Component>(&mut self) -> Result<(), RegistryError> {
        if self.owned::<To>() {
            return Err(RegistryError::OwnedStorage {
                component: type_name::<To>(),
            });
        }

        if To::type_index() == From::type_index() {
            return Err(RegistryError::SameStorage {
                component: type_name::<To>(),
            });
        }

        let to = self.assure::<To>();
        let from = self.assure::<From>();
        to.borrow_mut().sort_as(from.borrow().data());
        Ok(())
    }

    // Context

    pub fn ctx(&self) -> &Context {
        &self.vars
    }

    pub fn ctx_mut(&mut self) -> &mut Context {
        &mut self.vars
    }
}

#[cfg(test)]
#[path = "registry.tests.rs"]
mod tests;
