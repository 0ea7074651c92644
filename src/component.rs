use crate::pool::PoolHandle;
use crate::registry::Registry;
use std::any::TypeId;
use std::sync::atomic::{AtomicU32, Ordering};

/// Identifier used as the key of pools and context entries.
pub type Id = u32;

pub fn next_id() -> Id {
    static NEXT_ID: AtomicU32 = AtomicU32::new(0);

    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over a string, for explicit context or pool identifiers.
pub const fn hashed_string(value: &str) -> Id {
    let bytes = value.as_bytes();
    let mut hash = FNV_OFFSET;
    let mut i = 0;

    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }

    hash
}

/// Identifier derived from the type name. Stable within one build only.
pub fn type_hash<T: ?Sized + 'static>() -> Id {
    hashed_string(std::any::type_name::<T>())
}

/// Runtime type descriptor carried by every pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    pub id: TypeId,
    pub name: &'static str,
}

impl TypeInfo {
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeInfo {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }
}

/// Data that can be attached to an entity. Use `#[derive(Component)]`.
pub trait Component: 'static {
    /// Key of this type's pool in a registry.
    fn type_index() -> Id;
}

/// A list of component types: a single component, `()`, or a tuple of sets.
///
/// Registry operations taking a set fold over it left to right.
pub trait ComponentSet: 'static {
    const COUNT: usize;

    /// True if `f` holds for every id. Stops at the first `false`.
    fn all<F: FnMut(Id) -> bool>(f: &mut F) -> bool;

    /// True if `f` holds for some id. Stops at the first `true`.
    fn any<F: FnMut(Id) -> bool>(f: &mut F) -> bool;

    /// Creates the pools of every type in the set, in order.
    fn assure(registry: &mut Registry, out: &mut Vec<PoolHandle>);

    fn ids() -> Vec<Id> {
        let mut out = Vec::with_capacity(Self::COUNT);
        Self::all(&mut |id| {
            out.push(id);
            true
        });
        out
    }
}

impl<T: Component> ComponentSet for T {
    const COUNT: usize = 1;

    #[inline]
    fn all<F: FnMut(Id) -> bool>(f: &mut F) -> bool {
        f(T::type_index())
    }

    #[inline]
    fn any<F: FnMut(Id) -> bool>(f: &mut F) -> bool {
        f(T::type_index())
    }

    fn assure(registry: &mut Registry, out: &mut Vec<PoolHandle>) {
        out.push(registry.assure::<T>());
    }
}

impl ComponentSet for () {
    const COUNT: usize = 0;

    fn all<F: FnMut(Id) -> bool>(_f: &mut F) -> bool {
        true
    }

    fn any<F: FnMut(Id) -> bool>(_f: &mut F) -> bool {
        false
    }

    fn assure(_registry: &mut Registry, _out: &mut Vec<PoolHandle>) {}
}

macro_rules! impl_component_set {
    ($($t:ident),+) => {
        impl<$($t: ComponentSet),+> ComponentSet for ($($t,)+) {
            const COUNT: usize = 0 $(+ <$t as ComponentSet>::COUNT)+;

            #[inline]
            fn all<F: FnMut(Id) -> bool>(f: &mut F) -> bool {
                true $(&& <$t as ComponentSet>::all(f))+
            }

            #[inline]
            fn any<F: FnMut(Id) -> bool>(f: &mut F) -> bool {
                false $(|| <$t as ComponentSet>::any(f))+
            }

            fn assure(registry: &mut Registry, out: &mut Vec<PoolHandle>) {
                $(<$t as ComponentSet>::assure(registry, out);)+
            }
        }
    };
}

impl_component_set!(T1);
impl_component_set!(T1, T2);
impl_component_set!(T1, T2, T3);
impl_component_set!(T1, T2, T3, T4);
impl_component_set!(T1, T2, T3, T4, T5);
impl_component_set!(T1, T2, T3, T4, T5, T6);
impl_component_set!(T1, T2, T3, T4, T5, T6, T7);
impl_component_set!(T1, T2, T3, T4, T5, T6, T7, T8);

pub use ecs_registry_macros::Component;

#[cfg(test)]
#[path = "component.tests.rs"]
mod tests;
