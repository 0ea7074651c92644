use crate::algorithm::{SortAlgorithm, sort_positions};
use crate::block::{Block, PAGE_SIZE};
use crate::entity::Entity;
use std::cmp::Ordering;

/// Packed set of entities with O(1) membership, insertion and swap-removal.
///
/// `dense` holds the members without gaps. The paged `sparse` array maps an
/// entity index to its position in `dense`. Membership compares the whole
/// handle, so a stale version of a member is not contained.
#[derive(Default)]
pub struct SparseSet {
    sparse: Vec<Option<Box<Block>>>,
    dense: Vec<Entity>,
}

#[inline(always)]
fn page_of(entity: Entity) -> (usize, usize) {
    let index = entity.index() as usize;
    (index / PAGE_SIZE, index % PAGE_SIZE)
}

impl SparseSet {
    pub fn new() -> Self {
        SparseSet {
            sparse: Vec::new(),
            dense: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        SparseSet {
            sparse: Vec::new(),
            dense: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    fn slot(&self, entity: Entity) -> Option<usize> {
        let (page, offset) = page_of(entity);

        self.sparse.get(page)?.as_ref()?.get(offset)
    }

    fn set_slot(&mut self, entity: Entity, position: usize) {
        let (page, offset) = page_of(entity);

        if page >= self.sparse.len() {
            self.sparse.resize_with(page + 1, || None);
        }

        self.sparse[page]
            .get_or_insert_with(|| Box::new(Block::new()))
            .set(offset, position);
    }

    fn unset_slot(&mut self, entity: Entity) {
        let (page, offset) = page_of(entity);

        if let Some(Some(block)) = self.sparse.get_mut(page) {
            block.unset(offset);
        }
    }

    /// Position of `entity` in the packed array, if it is a member.
    #[inline]
    pub fn find(&self, entity: Entity) -> Option<usize> {
        let position = self.slot(entity)?;

        (self.dense[position] == entity).then_some(position)
    }

    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.find(entity).is_some()
    }

    /// True if any version of `entity`'s index is a member.
    #[inline]
    pub fn contains_index(&self, entity: Entity) -> bool {
        self.slot(entity).is_some()
    }

    /// Position of a member. Panics if `entity` is not contained.
    #[inline]
    pub fn index(&self, entity: Entity) -> usize {
        match self.find(entity) {
            Some(position) => position,
            None => panic!("{:?} is not a member of this set", entity),
        }
    }

    /// Appends `entity` and returns its position.
    pub fn push(&mut self, entity: Entity) -> usize {
        if self.contains_index(entity) {
            panic!("index of {:?} is already in use in this set", entity);
        }

        let position = self.dense.len();
        self.set_slot(entity, position);
        self.dense.push(entity);
        position
    }

    /// Removes `entity` by moving the last member into its slot. Returns the
    /// position it occupied.
    pub fn swap_remove(&mut self, entity: Entity) -> Option<usize> {
        let position = self.find(entity)?;

        self.dense.swap_remove(position);
        self.unset_slot(entity);

        if position < self.dense.len() {
            let moved = self.dense[position];
            self.set_slot(moved, position);
        }

        Some(position)
    }

    pub fn remove(&mut self, entity: Entity) -> bool {
        self.swap_remove(entity).is_some()
    }

    /// Swaps the members at two positions.
    pub fn swap_at(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }

        self.dense.swap(a, b);
        let (first, second) = (self.dense[a], self.dense[b]);
        self.set_slot(first, a);
        self.set_slot(second, b);
    }

    /// Swaps two members. Panics if either is not contained.
    pub fn swap_elements(&mut self, a: Entity, b: Entity) {
        let (first, second) = (self.index(a), self.index(b));
        self.swap_at(first, second);
    }

    #[inline]
    pub fn data(&self) -> &[Entity] {
        &self.dense
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.dense.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.dense.reserve(additional);
    }

    pub fn clear(&mut self) {
        self.dense.clear();
        self.sparse.clear();
    }

    /// Frees sparse pages that no longer map any member and releases spare
    /// capacity.
    pub fn compact(&mut self) {
        for page in self.sparse.iter_mut() {
            if page.as_ref().is_some_and(|block| block.is_empty()) {
                *page = None;
            }
        }

        while matches!(self.sparse.last(), Some(None)) {
            self.sparse.pop();
        }

        self.sparse.shrink_to_fit();
        self.dense.shrink_to_fit();
    }

    pub(crate) fn pages(&self) -> &[Option<Box<Block>>] {
        &self.sparse
    }

    /// Number of allocated sparse pages.
    pub fn page_count(&self) -> usize {
        self.sparse.iter().filter(|page| page.is_some()).count()
    }

    /// Sorts the first `n` members by `compare`. `swap` is told about every
    /// swap, as in [`arrange`](Self::arrange).
    pub fn sort_n<C, S>(&mut self, n: usize, mut compare: C, algorithm: SortAlgorithm, swap: S)
    where
        C: FnMut(Entity, Entity) -> Ordering,
        S: FnMut(usize, usize),
    {
        let dense = &self.dense[..n];
        let order = sort_positions(n, algorithm, |a, b| compare(dense[a], dense[b]));
        self.arrange(&order, swap);
    }

    /// Applies a permutation to the first `order.len()` members, where
    /// `order[i]` is the current position of the member that belongs at `i`.
    /// `swap` is told about every swap so parallel arrays can follow.
    pub fn arrange<S>(&mut self, order: &[usize], mut swap: S)
    where
        S: FnMut(usize, usize),
    {
        let mut done = vec![false; order.len()];

        for start in 0..order.len() {
            if done[start] {
                continue;
            }

            let mut current = start;

            loop {
                done[current] = true;
                let next = order[current];

                if next == start {
                    break;
                }

                self.swap_at(current, next);
                swap(current, next);
                current = next;
            }
        }
    }

    /// Moves the members shared with `other` to the front, in `other`'s
    /// relative order. Returns how many members were shared.
    pub fn sort_as<S>(&mut self, other: &[Entity], mut swap: S) -> usize
    where
        S: FnMut(usize, usize),
    {
        let mut position = 0;

        for &entity in other {
            if position == self.dense.len() {
                break;
            }

            if let Some(at) = self.find(entity) {
                if at < position {
                    continue;
                }

                if at != position {
                    self.swap_at(position, at);
                    swap(position, at);
                }

                position += 1;
            }
        }

        position
    }
}

#[cfg(test)]
#[path = "sparse_set.tests.rs"]
mod tests;
