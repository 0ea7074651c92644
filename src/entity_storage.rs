use crate::component::TypeInfo;
use crate::entity::Entity;
use crate::pool::Pool;
use crate::registry::RegistryId;
use crate::signal::Signals;
use crate::sparse_set::SparseSet;
use std::any::Any;
use tracing::{debug, trace};

/// Index value terminating the free list.
const END: u32 = Entity::INDEX_MASK;

/// The entity pool: authoritative record of which handles are alive.
///
/// `slots[i]` holds the live handle for index `i`. A free slot instead holds
/// the version its next occupant will get, and in its index field the next
/// free index. Free indices are recycled first in, first out.
pub struct EntityStorage {
    slots: Vec<Entity>,
    alive: SparseSet,
    free_head: u32,
    free_tail: u32,
    signals: Signals,
    owner: Option<RegistryId>,
}

impl Default for EntityStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStorage {
    pub fn new() -> Self {
        EntityStorage {
            slots: Vec::new(),
            alive: SparseSet::new(),
            free_head: END,
            free_tail: END,
            signals: Signals::default(),
            owner: None,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut storage = Self::new();
        storage.reserve(capacity);
        storage
    }

    pub fn reserve(&mut self, additional: usize) {
        self.slots.reserve(additional);
        self.alive.reserve(additional);
    }

    /// Returns a recycled handle if one is free, a fresh one otherwise.
    pub fn create(&mut self) -> Entity {
        let entity = if self.free_head != END {
            let index = self.free_head;
            let slot = self.slots[index as usize];

            self.free_head = slot.index();
            if self.free_head == END {
                self.free_tail = END;
            }

            trace!(index, version = slot.version(), "recycling entity slot");
            Entity::new(index, slot.version())
        } else {
            let index = self.slots.len() as u32;
            if index >= END {
                panic!("entity index space exhausted");
            }

            self.slots.push(Entity::NULL);
            Entity::new(index, 0)
        };

        self.slots[entity.index() as usize] = entity;
        self.alive.push(entity);
        entity
    }

    /// Creates exactly `hint` if its index is free, otherwise falls back to
    /// [`create`](Self::create).
    pub fn create_with_hint(&mut self, hint: Entity) -> Entity {
        if hint.is_null() || hint.is_tombstone() {
            return self.create();
        }

        let index = hint.index() as usize;

        if index >= self.slots.len() {
            while self.slots.len() < index {
                let skipped = self.slots.len() as u32;
                self.slots.push(Entity::new(END, 0));
                self.link_tail(skipped);
            }

            self.slots.push(hint);
        } else if self.alive.contains_index(hint) {
            debug!(?hint, "hinted index is in use, creating a fresh entity");
            return self.create();
        } else {
            self.unlink(hint.index());
            self.slots[index] = hint;
        }

        self.alive.push(hint);
        hint
    }

    /// Retires `entity`, stores `version` for the next occupant of its
    /// index and queues the index for reuse. The tombstone version is
    /// skipped. Returns the stored version.
    pub fn release(&mut self, entity: Entity, version: u32) -> u32 {
        if !self.alive.remove(entity) {
            panic!("{:?} is not a valid entity", entity);
        }

        let mut next = entity.with_version(version);
        if next.is_tombstone() {
            next = next.next();
        }

        let index = entity.index();
        self.slots[index as usize] = Entity::new(END, next.version());
        self.link_tail(index);
        next.version()
    }

    fn link_tail(&mut self, index: u32) {
        let slot = self.slots[index as usize];
        self.slots[index as usize] = Entity::new(END, slot.version());

        if self.free_tail == END {
            self.free_head = index;
        } else {
            let tail = self.slots[self.free_tail as usize];
            self.slots[self.free_tail as usize] = Entity::new(index, tail.version());
        }

        self.free_tail = index;
    }

    fn unlink(&mut self, index: u32) {
        let mut previous = END;
        let mut current = self.free_head;

        while current != index {
            if current == END {
                panic!("slot {} is neither alive nor free", index);
            }

            previous = current;
            current = self.slots[current as usize].index();
        }

        let next = self.slots[index as usize].index();

        if previous == END {
            self.free_head = next;
        } else {
            let slot = self.slots[previous as usize];
            self.slots[previous as usize] = Entity::new(next, slot.version());
        }

        if self.free_tail == index {
            self.free_tail = previous;
        }
    }

    #[inline]
    pub fn valid(&self, entity: Entity) -> bool {
        self.alive.contains(entity)
    }

    /// Version currently stored for `entity`'s index: the live version, or
    /// the one the next occupant will get. Tombstone for unused indices.
    #[inline]
    pub fn current(&self, entity: Entity) -> u32 {
        self.slots
            .get(entity.index() as usize)
            .map_or(Entity::VERSION_MASK, |slot| slot.version())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.alive.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }

    /// Number of indices waiting to be recycled.
    #[inline]
    pub fn free_len(&self) -> usize {
        self.slots.len() - self.alive.len()
    }

    /// Free indices in recycling order.
    pub fn free_list(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.free_len());
        let mut current = self.free_head;

        while current != END && out.len() <= self.slots.len() {
            out.push(current);
            current = self.slots[current as usize].index();
        }

        out
    }

    #[inline]
    pub fn data(&self) -> &[Entity] {
        self.alive.data()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.alive.iter()
    }

    pub(crate) fn alive_set(&self) -> &SparseSet {
        &self.alive
    }

    pub(crate) fn slots(&self) -> &[Entity] {
        &self.slots
    }

    pub(crate) fn free_bounds(&self) -> (u32, u32) {
        (self.free_head, self.free_tail)
    }
}

impl Pool for EntityStorage {
    fn type_info(&self) -> TypeInfo {
        TypeInfo::of::<Entity>()
    }

    fn bind(&mut self, owner: RegistryId) {
        match self.owner {
            Some(current) if current != owner => {
                panic!("entity pool is already bound to another registry")
            }
            _ => self.owner = Some(owner),
        }
    }

    fn owner(&self) -> Option<RegistryId> {
        self.owner
    }

    fn len(&self) -> usize {
        self.alive.len()
    }

    fn contains(&self, entity: Entity) -> bool {
        self.alive.contains(entity)
    }

    fn find(&self, entity: Entity) -> Option<usize> {
        self.alive.find(entity)
    }

    fn data(&self) -> &[Entity] {
        self.alive.data()
    }

    fn swap_at(&mut self, a: usize, b: usize) {
        self.alive.swap_at(a, b);
    }

    fn swap_elements(&mut self, a: Entity, b: Entity) {
        self.alive.swap_elements(a, b);
    }

    fn remove(&mut self, entity: Entity) -> bool {
        if !self.valid(entity) {
            return false;
        }

        self.release(entity, entity.next().version());
        true
    }

    fn clear(&mut self) {
        let alive = self.alive.data().to_vec();

        for entity in alive {
            self.release(entity, entity.next().version());
        }
    }

    fn compact(&mut self) {
        self.alive.compact();
    }

    fn sort_as(&mut self, other: &[Entity]) -> usize {
        self.alive.sort_as(other, |_, _| {})
    }

    fn arrange(&mut self, order: &[usize]) {
        self.alive.arrange(order, |_, _| {});
    }

    fn signals(&self) -> &Signals {
        &self.signals
    }

    fn signals_mut(&mut self) -> &mut Signals {
        &mut self.signals
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "entity_storage.tests.rs"]
mod tests;
