use crate::algorithm::{SortAlgorithm, sort_positions};
use crate::component::TypeInfo;
use crate::entity::Entity;
use crate::pool::Pool;
use crate::registry::RegistryId;
use crate::signal::Signals;
use crate::sparse_set::SparseSet;
use std::any::Any;
use std::cmp::Ordering;

/// Pool of one component type: a sparse set plus a payload array kept in
/// the same packed order.
pub struct Storage<T> {
    base: SparseSet,
    payload: Vec<T>,
    signals: Signals,
    owner: Option<RegistryId>,
}

impl<T> Default for Storage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Storage<T> {
    pub fn new() -> Self {
        Storage {
            base: SparseSet::new(),
            payload: Vec::new(),
            signals: Signals::default(),
            owner: None,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Storage {
            base: SparseSet::with_capacity(capacity),
            payload: Vec::with_capacity(capacity),
            signals: Signals::default(),
            owner: None,
        }
    }

    #[inline]
    pub fn base(&self) -> &SparseSet {
        &self.base
    }

    /// Attaches `value` to `entity`. Panics if the entity's index already
    /// has a value in this pool.
    pub fn emplace(&mut self, entity: Entity, value: T) -> &mut T {
        let position = self.base.push(entity);
        self.payload.push(value);
        &mut self.payload[position]
    }

    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let position = self.base.swap_remove(entity)?;
        Some(self.payload.swap_remove(position))
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.base.contains(entity)
    }

    #[inline]
    pub fn find(&self, entity: Entity) -> Option<usize> {
        self.base.find(entity)
    }

    #[inline]
    pub fn try_get(&self, entity: Entity) -> Option<&T> {
        self.base.find(entity).map(|position| &self.payload[position])
    }

    #[inline]
    pub fn try_get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.base
            .find(entity)
            .map(|position| &mut self.payload[position])
    }

    /// Panics if `entity` has no value in this pool.
    #[inline]
    pub fn get(&self, entity: Entity) -> &T {
        &self.payload[self.base.index(entity)]
    }

    #[inline]
    pub fn get_mut(&mut self, entity: Entity) -> &mut T {
        let position = self.base.index(entity);
        &mut self.payload[position]
    }

    #[inline]
    pub fn data(&self) -> &[Entity] {
        self.base.data()
    }

    #[inline]
    pub fn values(&self) -> &[T] {
        &self.payload
    }

    #[inline]
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.payload
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.base.iter().copied().zip(self.payload.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> + '_ {
        self.base.iter().copied().zip(self.payload.iter_mut())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.base.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.base.reserve(additional);
        self.payload.reserve(additional);
    }

    pub fn swap_at(&mut self, a: usize, b: usize) {
        self.base.swap_at(a, b);
        self.payload.swap(a, b);
    }

    pub fn swap_elements(&mut self, a: Entity, b: Entity) {
        let (first, second) = (self.base.index(a), self.base.index(b));
        self.swap_at(first, second);
    }

    /// Sorts the whole pool by comparing entities.
    pub fn sort_by_entity<C>(&mut self, compare: C, algorithm: SortAlgorithm)
    where
        C: FnMut(Entity, Entity) -> Ordering,
    {
        let len = self.len();
        self.sort_n_by_entity(len, compare, algorithm);
    }

    /// Sorts the first `n` members by comparing entities.
    pub fn sort_n_by_entity<C>(&mut self, n: usize, compare: C, algorithm: SortAlgorithm)
    where
        C: FnMut(Entity, Entity) -> Ordering,
    {
        let payload = &mut self.payload;
        self.base.sort_n(n, compare, algorithm, |a, b| payload.swap(a, b));
    }

    /// Sorts the whole pool by comparing values.
    pub fn sort_by<C>(&mut self, mut compare: C, algorithm: SortAlgorithm)
    where
        C: FnMut(&T, &T) -> Ordering,
    {
        let payload = &self.payload;
        let order = sort_positions(payload.len(), algorithm, |a, b| {
            compare(&payload[a], &payload[b])
        });
        self.arrange(&order);
    }

    pub fn arrange(&mut self, order: &[usize]) {
        let payload = &mut self.payload;
        self.base.arrange(order, |a, b| payload.swap(a, b));
    }

    pub fn sort_as(&mut self, other: &[Entity]) -> usize {
        let payload = &mut self.payload;
        self.base.sort_as(other, |a, b| payload.swap(a, b))
    }

    pub fn clear(&mut self) {
        self.base.clear();
        self.payload.clear();
    }

    pub fn compact(&mut self) {
        self.base.compact();
        self.payload.shrink_to_fit();
    }

    /// Packed entities alongside mutable values, for iteration that reads
    /// membership while writing values.
    #[inline]
    pub(crate) fn split(&mut self) -> (&SparseSet, &mut [T]) {
        (&self.base, &mut self.payload)
    }
}

impl<T: 'static> Pool for Storage<T> {
    fn type_info(&self) -> TypeInfo {
        TypeInfo::of::<T>()
    }

    fn bind(&mut self, owner: RegistryId) {
        match self.owner {
            Some(current) if current != owner => {
                panic!("pool of `{}` is already bound to another registry", std::any::type_name::<T>())
            }
            _ => self.owner = Some(owner),
        }
    }

    fn owner(&self) -> Option<RegistryId> {
        self.owner
    }

    fn len(&self) -> usize {
        self.base.len()
    }

    fn contains(&self, entity: Entity) -> bool {
        self.base.contains(entity)
    }

    fn find(&self, entity: Entity) -> Option<usize> {
        self.base.find(entity)
    }

    fn data(&self) -> &[Entity] {
        self.base.data()
    }

    fn swap_at(&mut self, a: usize, b: usize) {
        Storage::swap_at(self, a, b);
    }

    fn swap_elements(&mut self, a: Entity, b: Entity) {
        Storage::swap_elements(self, a, b);
    }

    fn remove(&mut self, entity: Entity) -> bool {
        Storage::remove(self, entity).is_some()
    }

    fn clear(&mut self) {
        Storage::clear(self);
    }

    fn compact(&mut self) {
        Storage::compact(self);
    }

    fn sort_as(&mut self, other: &[Entity]) -> usize {
        Storage::sort_as(self, other)
    }

    fn arrange(&mut self, order: &[usize]) {
        Storage::arrange(self, order);
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
#[path = "storage.tests.rs"]
mod tests;
