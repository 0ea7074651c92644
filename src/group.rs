use crate::algorithm::{SortAlgorithm, sort_positions};
use crate::component::{Component, ComponentSet, Id};
use crate::entity::Entity;
use crate::pool::{PoolHandle, borrow_storage_mut};
use crate::sparse_set::SparseSet;
use std::any::TypeId;
use std::cell::{Ref, RefCell};
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::rc::Rc;
use tracing::trace;

/// Key of a group in the registry directories.
pub type GroupKey = TypeId;

/// The owned, observed and excluded type ids of a group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupDescriptor {
    owned: Vec<Id>,
    get: Vec<Id>,
    exclude: Vec<Id>,
    names: Vec<&'static str>,
}

impl GroupDescriptor {
    /// `names` lists the type names in owned, get, exclude order.
    pub fn new(owned: Vec<Id>, get: Vec<Id>, exclude: Vec<Id>, names: Vec<&'static str>) -> Self {
        let mut ids: Vec<Id> = owned.iter().chain(&get).chain(&exclude).copied().collect();
        ids.sort_unstable();

        if ids.windows(2).any(|pair| pair[0] == pair[1]) {
            panic!("a group cannot list the same component type twice");
        }

        GroupDescriptor {
            owned,
            get,
            exclude,
            names,
        }
    }

    /// Total number of types across owned, get and exclude.
    #[inline]
    pub fn size(&self) -> usize {
        self.owned.len() + self.get.len() + self.exclude.len()
    }

    pub fn owned(&self) -> &[Id] {
        &self.owned
    }

    pub fn get(&self) -> &[Id] {
        &self.get
    }

    pub fn exclude(&self) -> &[Id] {
        &self.exclude
    }

    #[inline]
    pub fn owns(&self, id: Id) -> bool {
        self.owned.contains(&id)
    }

    /// True if members must have `id`, owned or observed.
    #[inline]
    pub fn requires(&self, id: Id) -> bool {
        self.owned.contains(&id) || self.get.contains(&id)
    }

    #[inline]
    pub fn excludes(&self, id: Id) -> bool {
        self.exclude.contains(&id)
    }

    /// True if the two groups own at least one type in common.
    pub fn overlaps(&self, other: &GroupDescriptor) -> bool {
        other.owned.iter().any(|id| self.owns(*id))
    }

    /// How many of `other`'s types this group lists in the same role.
    pub fn check(&self, other: &GroupDescriptor) -> usize {
        other.owned.iter().filter(|id| self.owned.contains(id)).count()
            + other.get.iter().filter(|id| self.get.contains(id)).count()
            + other.exclude.iter().filter(|id| self.exclude.contains(id)).count()
    }

    /// True if the two groups may coexist: their owned sets are disjoint,
    /// or one group's types are a subset of the other's.
    pub fn compatible(&self, other: &GroupDescriptor) -> bool {
        if !self.overlaps(other) {
            return true;
        }

        let common = self.check(other);
        common == self.size() || common == other.size()
    }

    pub fn label(&self) -> String {
        let (owned, rest) = self.names.split_at(self.owned.len());
        let (get, exclude) = rest.split_at(self.get.len());

        format!(
            "owned<{}> get<{}> exclude<{}>",
            owned.join(", "),
            get.join(", "),
            exclude.join(", ")
        )
    }
}

pub(crate) fn qualifies(entity: Entity, required: &[PoolHandle], exclude: &[PoolHandle]) -> bool {
    required.iter().all(|pool| pool.borrow().contains(entity))
        && !exclude.iter().any(|pool| pool.borrow().contains(entity))
}

/// State of a group that owns its pools.
///
/// The first `len` members of every owned pool are the group's members,
/// in the same order in each pool.
pub struct OwningGroupHandler {
    descriptor: GroupDescriptor,
    owned: Vec<PoolHandle>,
    get: Vec<PoolHandle>,
    exclude: Vec<PoolHandle>,
    len: usize,
    prev: Option<GroupKey>,
    next: Option<GroupKey>,
    wider: usize,
}

impl OwningGroupHandler {
    /// Builds the handler and partitions the owned pools.
    pub(crate) fn new(
        descriptor: GroupDescriptor,
        owned: Vec<PoolHandle>,
        get: Vec<PoolHandle>,
        exclude: Vec<PoolHandle>,
    ) -> Self {
        let mut handler = OwningGroupHandler {
            descriptor,
            owned,
            get,
            exclude,
            len: 0,
            prev: None,
            next: None,
            wider: 0,
        };

        // Members found ahead of the scan are swapped behind it, so one
        // forward pass visits every entity once.
        let total = handler.owned[0].borrow().len();
        for position in 0..total {
            let entity = handler.owned[0].borrow().data()[position];
            handler.push(entity);
        }

        handler
    }

    fn swap_into(&self, position: usize, entity: Entity) {
        for pool in &self.owned {
            let mut pool = pool.borrow_mut();
            let at = match pool.find(entity) {
                Some(at) => at,
                None => panic!("{:?} is missing from an owned pool", entity),
            };
            pool.swap_at(position, at);
        }
    }

    /// Moves `entity` into the group if it now qualifies.
    pub(crate) fn push(&mut self, entity: Entity) -> bool {
        let position = match self.owned[0].borrow().find(entity) {
            Some(position) => position,
            None => return false,
        };

        if position < self.len
            || !qualifies(entity, &self.owned[1..], &[])
            || !qualifies(entity, &self.get, &self.exclude)
        {
            return false;
        }

        trace!(?entity, position = self.len, "entering owning group");
        self.swap_into(self.len, entity);
        self.len += 1;
        true
    }

    /// Moves `entity` out of the group if it is a member.
    pub(crate) fn discard(&mut self, entity: Entity) -> bool {
        match self.owned[0].borrow().find(entity) {
            Some(position) if position < self.len => {}
            _ => return false,
        }

        self.len -= 1;
        trace!(?entity, position = self.len, "leaving owning group");
        self.swap_into(self.len, entity);
        true
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn descriptor(&self) -> &GroupDescriptor {
        &self.descriptor
    }

    /// The largest overlapping owning group smaller than this one.
    pub fn prev(&self) -> Option<GroupKey> {
        self.prev
    }

    /// The smallest overlapping owning group larger than this one.
    pub fn next(&self) -> Option<GroupKey> {
        self.next
    }

    /// Number of larger owning groups that overlap this one. Nested groups
    /// can form a tree, so several of them may sit on top of one handler.
    pub fn wider(&self) -> usize {
        self.wider
    }

    pub(crate) fn set_links(&mut self, prev: Option<GroupKey>, next: Option<GroupKey>, wider: usize) {
        self.prev = prev;
        self.next = next;
        self.wider = wider;
    }

    pub(crate) fn owned_pools(&self) -> &[PoolHandle] {
        &self.owned
    }

    pub(crate) fn get_pools(&self) -> &[PoolHandle] {
        &self.get
    }

    pub(crate) fn exclude_pools(&self) -> &[PoolHandle] {
        &self.exclude
    }

    /// Sorts the members in the lead pool, then aligns the other owned
    /// pools with it.
    pub(crate) fn sort_by<C>(&mut self, mut compare: C, algorithm: SortAlgorithm)
    where
        C: FnMut(Entity, Entity) -> Ordering,
    {
        let order = {
            let lead = self.owned[0].borrow();
            let members = &lead.data()[..self.len];
            sort_positions(self.len, algorithm, |a, b| compare(members[a], members[b]))
        };

        self.owned[0].borrow_mut().arrange(&order);

        let members = self.owned[0].borrow().data()[..self.len].to_vec();
        for pool in &self.owned[1..] {
            pool.borrow_mut().sort_as(&members);
        }
    }
}

/// State of a group that only observes its pools and keeps its own packed
/// list of members.
pub struct NonOwningGroupHandler {
    descriptor: GroupDescriptor,
    get: Vec<PoolHandle>,
    exclude: Vec<PoolHandle>,
    set: SparseSet,
}

impl NonOwningGroupHandler {
    pub(crate) fn new(descriptor: GroupDescriptor, get: Vec<PoolHandle>, exclude: Vec<PoolHandle>) -> Self {
        let mut handler = NonOwningGroupHandler {
            descriptor,
            get,
            exclude,
            set: SparseSet::new(),
        };

        let candidates = match handler.get.iter().min_by_key(|pool| pool.borrow().len()) {
            Some(smallest) => smallest.borrow().data().to_vec(),
            None => Vec::new(),
        };

        for entity in candidates {
            handler.push(entity);
        }

        handler
    }

    pub(crate) fn push(&mut self, entity: Entity) -> bool {
        if self.set.contains(entity) || !qualifies(entity, &self.get, &self.exclude) {
            return false;
        }

        self.set.push(entity);
        true
    }

    pub(crate) fn discard(&mut self, entity: Entity) -> bool {
        self.set.remove(entity)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn descriptor(&self) -> &GroupDescriptor {
        &self.descriptor
    }

    pub fn data(&self) -> &[Entity] {
        self.set.data()
    }

    pub(crate) fn get_pools(&self) -> &[PoolHandle] {
        &self.get
    }

    pub(crate) fn exclude_pools(&self) -> &[PoolHandle] {
        &self.exclude
    }

    pub(crate) fn sort_by<C>(&mut self, compare: C, algorithm: SortAlgorithm)
    where
        C: FnMut(Entity, Entity) -> Ordering,
    {
        let len = self.set.len();
        self.set.sort_n(len, compare, algorithm, |_, _| {});
    }
}

#[derive(Clone)]
pub(crate) enum GroupHandler {
    Owning(Rc<RefCell<OwningGroupHandler>>),
    NonOwning(Rc<RefCell<NonOwningGroupHandler>>),
}

enum HandlerRef<'a> {
    Owning(Ref<'a, OwningGroupHandler>),
    NonOwning(Ref<'a, NonOwningGroupHandler>),
}

impl GroupHandler {
    fn borrow(&self) -> HandlerRef<'_> {
        match self {
            GroupHandler::Owning(handler) => HandlerRef::Owning(handler.borrow()),
            GroupHandler::NonOwning(handler) => HandlerRef::NonOwning(handler.borrow()),
        }
    }
}

/// A cached, incrementally maintained set of entities that have every type
/// in `O` and `G` and none in `E`.
///
/// With a non-empty `O` the group owns those pools and keeps its members
/// packed at their front.
pub struct Group<O, G, E = ()> {
    handler: GroupHandler,
    pools: Vec<PoolHandle>,
    _marker: PhantomData<fn() -> (O, G, E)>,
}

impl<O: ComponentSet, G: ComponentSet, E: ComponentSet> Group<O, G, E> {
    pub(crate) fn new(handler: GroupHandler) -> Self {
        let pools = match &handler {
            GroupHandler::Owning(h) => {
                let h = h.borrow();
                h.owned_pools().iter().chain(h.get_pools()).cloned().collect()
            }
            GroupHandler::NonOwning(h) => h.borrow().get_pools().to_vec(),
        };

        Group {
            handler,
            pools,
            _marker: PhantomData,
        }
    }

    pub fn is_owning(&self) -> bool {
        matches!(self.handler, GroupHandler::Owning(_))
    }

    pub fn len(&self) -> usize {
        match self.handler.borrow() {
            HandlerRef::Owning(h) => h.len(),
            HandlerRef::NonOwning(h) => h.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, entity: Entity) -> bool {
        match self.handler.borrow() {
            HandlerRef::Owning(h) => self.pools[0]
                .borrow()
                .find(entity)
                .is_some_and(|position| position < h.len()),
            HandlerRef::NonOwning(h) => h.set.contains(entity),
        }
    }

    /// Members in iteration order.
    pub fn entities(&self) -> Ref<'_, [Entity]> {
        match &self.handler {
            GroupHandler::Owning(h) => {
                let len = h.borrow().len();
                Ref::map(self.pools[0].borrow(), |lead| &lead.data()[..len])
            }
            GroupHandler::NonOwning(h) => Ref::map(h.borrow(), |h| h.data()),
        }
    }

    pub fn descriptor(&self) -> Ref<'_, GroupDescriptor> {
        match &self.handler {
            GroupHandler::Owning(h) => Ref::map(h.borrow(), |h| h.descriptor()),
            GroupHandler::NonOwning(h) => Ref::map(h.borrow(), |h| h.descriptor()),
        }
    }

    /// False if a larger owning group shares any of this group's owned pools.
    pub fn sortable(&self) -> bool {
        match self.handler.borrow() {
            HandlerRef::Owning(h) => h.wider() == 0,
            HandlerRef::NonOwning(_) => true,
        }
    }

    /// Reorders the members. Owning groups keep every owned pool aligned.
    /// Panics if the group is not [`sortable`](Self::sortable).
    pub fn sort_by<C>(&self, compare: C, algorithm: SortAlgorithm)
    where
        C: FnMut(Entity, Entity) -> Ordering,
    {
        if !self.sortable() {
            panic!("group {} is nested in a larger owning group and cannot be sorted", self.descriptor().label());
        }

        match &self.handler {
            GroupHandler::Owning(h) => h.borrow_mut().sort_by(compare, algorithm),
            GroupHandler::NonOwning(h) => h.borrow_mut().sort_by(compare, algorithm),
        }
    }
}

macro_rules! impl_group_each {
    ($owned:ty, $get:ty; [$($o:ident),*]; [$($g:ident),*]) => {
        impl<$($o: Component,)* $($g: Component,)* X: ComponentSet> Group<$owned, $get, X> {
            /// Calls `func` for every member with its owned values followed
            /// by its observed values.
            #[allow(non_snake_case, unused_mut, unused_variables)]
            pub fn each<F>(&self, mut func: F)
            where
                F: FnMut(Entity, ($(&mut $o,)* $(&mut $g,)*)),
            {
                let [$($o,)* $($g,)*] = self.pools.as_slice() else {
                    panic!("group pools do not match its type lists");
                };

                let handler = self.handler.borrow();
                $(let mut $o = borrow_storage_mut::<$o>($o);)*
                $(let mut $g = borrow_storage_mut::<$g>($g);)*
                $(let mut $o = $o.split();)*
                $(let mut $g = $g.split();)*

                let owned_bases: &[&SparseSet] = &[$($o.0),*];
                let members: &[Entity] = match &handler {
                    HandlerRef::Owning(h) => &owned_bases[0].data()[..h.len()],
                    HandlerRef::NonOwning(h) => h.data(),
                };

                for (position, &entity) in members.iter().enumerate() {
                    func(
                        entity,
                        (
                            $(&mut $o.1[position],)*
                            $(&mut $g.1[$g.0.index(entity)],)*
                        ),
                    );
                }
            }
        }
    };
}

impl_group_each!((), G1; []; [G1]);
impl_group_each!((), (G1, G2); []; [G1, G2]);
impl_group_each!((), (G1, G2, G3); []; [G1, G2, G3]);
impl_group_each!(O1, (); [O1]; []);
impl_group_each!(O1, G1; [O1]; [G1]);
impl_group_each!(O1, (G1, G2); [O1]; [G1, G2]);
impl_group_each!(O1, (G1, G2, G3); [O1]; [G1, G2, G3]);
impl_group_each!((O1, O2), (); [O1, O2]; []);
impl_group_each!((O1, O2), G1; [O1, O2]; [G1]);
impl_group_each!((O1, O2), (G1, G2); [O1, O2]; [G1, G2]);
impl_group_each!((O1, O2), (G1, G2, G3); [O1, O2]; [G1, G2, G3]);
impl_group_each!((O1, O2, O3), (); [O1, O2, O3]; []);
impl_group_each!((O1, O2, O3), G1; [O1, O2, O3]; [G1]);
impl_group_each!((O1, O2, O3), (G1, G2); [O1, O2, O3]; [G1, G2]);
impl_group_each!((O1, O2, O3), (G1, G2, G3); [O1, O2, O3]; [G1, G2, G3]);

#[cfg(test)]
#[path = "group.tests.rs"]
mod tests;
