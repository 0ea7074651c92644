use crate::component::{Id, type_hash};
use std::any::Any;
use std::collections::HashMap;

/// Per-registry store of singleton values, keyed by a type-derived or an
/// explicit identifier. At most one value lives under each identifier.
#[derive(Default)]
pub struct Context {
    data: HashMap<Id, Box<dyn Any>>,
}

#[cold]
fn missing<T>(id: Id) -> ! {
    panic!(
        "no context value of type `{}` under id {:#x}",
        std::any::type_name::<T>(),
        id
    )
}

impl Context {
    pub fn new() -> Self {
        Context {
            data: HashMap::new(),
        }
    }

    /// Stores `value` under `T`'s id unless a value is already there, and
    /// returns the stored value.
    pub fn emplace<T: 'static>(&mut self, value: T) -> &mut T {
        self.emplace_as(type_hash::<T>(), value)
    }

    /// Same as [`emplace`](Self::emplace) with an explicit id. Panics if the
    /// id holds a value of another type.
    pub fn emplace_as<T: 'static>(&mut self, id: Id, value: T) -> &mut T {
        let slot = self.data.entry(id).or_insert_with(|| Box::new(value));

        match slot.downcast_mut::<T>() {
            Some(value) => value,
            None => missing::<T>(id),
        }
    }

    /// Stores `value` under `T`'s id, dropping whatever was there.
    pub fn insert_or_assign<T: 'static>(&mut self, value: T) -> &mut T {
        self.insert_or_assign_as(type_hash::<T>(), value)
    }

    pub fn insert_or_assign_as<T: 'static>(&mut self, id: Id, value: T) -> &mut T {
        self.data.insert(id, Box::new(value));
        self.get_mut_as(id)
    }

    /// Removes the value under `T`'s id if it has type `T`.
    pub fn erase<T: 'static>(&mut self) -> bool {
        self.erase_as::<T>(type_hash::<T>())
    }

    pub fn erase_as<T: 'static>(&mut self, id: Id) -> bool {
        if self.contains_as::<T>(id) {
            self.data.remove(&id);
            return true;
        }

        false
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.contains_as::<T>(type_hash::<T>())
    }

    pub fn contains_as<T: 'static>(&self, id: Id) -> bool {
        self.data.get(&id).is_some_and(|value| value.is::<T>())
    }

    /// Panics if there is no value of type `T` under `T`'s id.
    pub fn get<T: 'static>(&self) -> &T {
        self.get_as(type_hash::<T>())
    }

    pub fn get_as<T: 'static>(&self, id: Id) -> &T {
        match self.find_as(id) {
            Some(value) => value,
            None => missing::<T>(id),
        }
    }

    pub fn get_mut<T: 'static>(&mut self) -> &mut T {
        self.get_mut_as(type_hash::<T>())
    }

    pub fn get_mut_as<T: 'static>(&mut self, id: Id) -> &mut T {
        match self.find_mut_as(id) {
            Some(value) => value,
            None => missing::<T>(id),
        }
    }

    pub fn find<T: 'static>(&self) -> Option<&T> {
        self.find_as(type_hash::<T>())
    }

    pub fn find_as<T: 'static>(&self, id: Id) -> Option<&T> {
        self.data.get(&id)?.downcast_ref()
    }

    pub fn find_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.find_mut_as(type_hash::<T>())
    }

    pub fn find_mut_as<T: 'static>(&mut self, id: Id) -> Option<&mut T> {
        self.data.get_mut(&id)?.downcast_mut()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
#[path = "context.tests.rs"]
mod tests;
