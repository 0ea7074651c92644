use crate::component::{Component, ComponentSet, Id};
use crate::entity::Entity;
use crate::pool::{Pool, PoolHandle, borrow_storage_mut};
use crate::sparse_set::SparseSet;
use std::cell::Ref;
use std::marker::PhantomData;

/// On-demand intersection of the pools of `G`, minus the members of any
/// pool in `E`. Views keep no state beyond the pool handles.
///
/// Building a view allocates two small vectors holding one shared handle per
/// pool. Iterating it allocates nothing.
pub struct View<G, E = ()> {
    get: Vec<PoolHandle>,
    exclude: Vec<PoolHandle>,
    _marker: PhantomData<fn() -> (G, E)>,
}

fn assert_distinct(mut ids: Vec<Id>) {
    ids.sort_unstable();

    if ids.windows(2).any(|pair| pair[0] == pair[1]) {
        panic!("a view cannot list the same component type twice");
    }
}

impl<G: ComponentSet, E: ComponentSet> View<G, E> {
    pub(crate) fn new(get: Vec<PoolHandle>, exclude: Vec<PoolHandle>) -> Self {
        const { assert!(G::COUNT > 0, "a view needs at least one component type") };

        let mut ids = G::ids();
        ids.extend(E::ids());
        assert_distinct(ids);

        View {
            get,
            exclude,
            _marker: PhantomData,
        }
    }

    /// Size of the smallest get pool, an upper bound on the number of
    /// entities the view yields.
    pub fn size_hint(&self) -> usize {
        self.get
            .iter()
            .map(|pool| pool.borrow().len())
            .min()
            .unwrap_or(0)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.get.iter().all(|pool| pool.borrow().contains(entity))
            && !self.exclude.iter().any(|pool| pool.borrow().contains(entity))
    }

    /// Matching entities in the packed order of the smallest get pool.
    ///
    /// The smallest pool stays borrowed while the iterator lives. The others
    /// are borrowed per candidate.
    pub fn iter(&self) -> ViewIter<'_> {
        let driver = self
            .get
            .iter()
            .min_by_key(|pool| pool.borrow().len())
            .map(|pool| pool.borrow());

        ViewIter {
            get: &self.get,
            exclude: &self.exclude,
            driver,
            position: 0,
        }
    }
}

pub struct ViewIter<'a> {
    get: &'a [PoolHandle],
    exclude: &'a [PoolHandle],
    driver: Option<Ref<'a, dyn Pool>>,
    position: usize,
}

impl<'a> Iterator for ViewIter<'a> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        let driver = self.driver.as_ref()?.data();

        while self.position < driver.len() {
            let entity = driver[self.position];
            self.position += 1;

            if self.get.iter().all(|pool| pool.borrow().contains(entity))
                && !self.exclude.iter().any(|pool| pool.borrow().contains(entity))
            {
                return Some(entity);
            }
        }

        None
    }
}

fn driver_of(bases: &[&SparseSet]) -> usize {
    bases
        .iter()
        .enumerate()
        .min_by_key(|(_, base)| base.len())
        .map_or(0, |(index, _)| index)
}

impl<T: Component, X: ComponentSet> View<T, X> {
    /// Calls `func` for every matching entity with its value.
    pub fn each<F>(&self, mut func: F)
    where
        F: FnMut(Entity, &mut T),
    {
        let mut storage = borrow_storage_mut::<T>(&self.get[0]);
        let (base, values) = storage.split();

        for (position, &entity) in base.data().iter().enumerate() {
            if !self.exclude.iter().any(|pool| pool.borrow().contains(entity)) {
                func(entity, &mut values[position]);
            }
        }
    }
}

macro_rules! impl_view_each {
    ($($t:ident),+) => {
        impl<$($t: Component,)+ X: ComponentSet> View<($($t,)+), X> {
            /// Calls `func` for every matching entity with its values.
            #[allow(non_snake_case, unused_mut)]
            pub fn each<F>(&self, mut func: F)
            where
                F: FnMut(Entity, ($(&mut $t,)+)),
            {
                let [$($t,)+] = self.get.as_slice() else {
                    panic!("view pools do not match its type list");
                };

                $(let mut $t = borrow_storage_mut::<$t>($t);)+
                $(let mut $t = $t.split();)+

                let bases: &[&SparseSet] = &[$($t.0),+];
                let driver = bases[driver_of(bases)];

                for &entity in driver.data() {
                    if bases.iter().all(|base| base.contains(entity))
                        && !self.exclude.iter().any(|pool| pool.borrow().contains(entity))
                    {
                        func(entity, ($(&mut $t.1[$t.0.index(entity)],)+));
                    }
                }
            }
        }
    };
}

impl_view_each!(T1);
impl_view_each!(T1, T2);
impl_view_each!(T1, T2, T3);
impl_view_each!(T1, T2, T3, T4);
impl_view_each!(T1, T2, T3, T4, T5);
impl_view_each!(T1, T2, T3, T4, T5, T6);
impl_view_each!(T1, T2, T3, T4, T5, T6, T7);
impl_view_each!(T1, T2, T3, T4, T5, T6, T7, T8);

#[cfg(test)]
#[path = "view.tests.rs"]
mod tests;
