//! Invariant verification utilities
//!
//! These functions walk the internal structures and report the first broken
//! invariant they find. They are meant for tests and debugging sessions.

use crate::entity::Entity;
use crate::entity_storage::EntityStorage;
use crate::group::{GroupKey, qualifies};
use crate::pool::PoolHandle;
use crate::registry::Registry;
use crate::sparse_set::SparseSet;
use std::collections::HashMap;

/// Verifies that the sparse and packed halves of a set agree.
///
/// This function checks:
/// - every packed member maps back to its own position
/// - the sparse pages map exactly as many indices as there are members
///
/// # Returns
///
/// Returns `Ok(())` if all invariants hold, or `Err(String)` with a description
/// of the first invariant violation found.
pub fn verify_sparse_set(set: &SparseSet) -> Result<(), String> {
    for (position, &entity) in set.data().iter().enumerate() {
        match set.find(entity) {
            Some(found) if found == position => {}
            other => {
                return Err(format!(
                    "{:?} at position {} maps to {:?}",
                    entity, position, other
                ));
            }
        }
    }

    let mapped: usize = set.pages().iter().flatten().map(|block| block.len()).sum();
    if mapped != set.len() {
        return Err(format!(
            "sparse pages map {} indices but the set has {} members",
            mapped,
            set.len()
        ));
    }

    Ok(())
}

/// Verifies the entity pool.
///
/// This function checks:
/// - the set of live handles is consistent
/// - each live handle is the one stored in its slot
/// - the free list visits every free slot exactly once and ends at the tail
/// - no slot stores the tombstone version
pub fn verify_entity_storage(storage: &EntityStorage) -> Result<(), String> {
    let alive = storage.alive_set();
    let slots = storage.slots();
    verify_sparse_set(alive)?;

    for &entity in alive.data() {
        let stored = slots.get(entity.index() as usize).copied();
        if stored != Some(entity) {
            return Err(format!("live {:?} but slot holds {:?}", entity, stored));
        }
    }

    if let Some(slot) = slots.iter().find(|slot| slot.is_tombstone()) {
        return Err(format!("slot {:?} stores the tombstone version", slot));
    }

    let (head, tail) = storage.free_bounds();
    let mut seen = vec![false; slots.len()];
    let mut current = head;
    let mut last = Entity::INDEX_MASK;
    let mut count = 0;

    while current != Entity::INDEX_MASK {
        let index = current as usize;

        if index >= slots.len() {
            return Err(format!("free list points past the end at {}", index));
        }
        if seen[index] {
            return Err(format!("free list revisits slot {}", index));
        }
        if alive.contains_index(Entity::new(current, 0)) {
            return Err(format!("free list contains live slot {}", index));
        }

        seen[index] = true;
        last = current;
        count += 1;
        current = slots[index].index();
    }

    if last != tail {
        return Err(format!("free list ends at {} but the tail is {}", last, tail));
    }

    if count + alive.len() != slots.len() {
        return Err(format!(
            "{} free and {} live slots do not add up to {}",
            count,
            alive.len(),
            slots.len()
        ));
    }

    Ok(())
}

/// Verifies every group of a registry.
///
/// This function checks:
/// - an owning group's members fill the front of its lead pool and nothing
///   behind them qualifies
/// - every owned pool lists the members in the same order
/// - prev/next links point at the nearest smaller/larger overlapping groups,
///   which may be shared when nested groups form a tree
/// - the count of wider overlapping groups is current
/// - a non-owning group holds exactly the qualifying entities
pub fn verify_groups(registry: &Registry) -> Result<(), String> {
    let owning: Vec<(GroupKey, _)> = registry.owning_handlers().collect();
    let sizes: HashMap<GroupKey, usize> = owning
        .iter()
        .map(|(key, handler)| (*key, handler.descriptor().size()))
        .collect();

    for (key, handler) in &owning {
        let label = handler.descriptor().label();
        let owned = handler.owned_pools();
        let required: Vec<PoolHandle> = owned.iter().chain(handler.get_pools()).cloned().collect();
        let lead = owned[0].borrow();
        let len = handler.len();

        if len > lead.len() {
            return Err(format!("{}: length {} exceeds lead pool size {}", label, len, lead.len()));
        }

        for (position, &entity) in lead.data().iter().enumerate() {
            let member = qualifies(entity, &required, handler.exclude_pools());

            if position < len && !member {
                return Err(format!("{}: {:?} in the prefix does not qualify", label, entity));
            }
            if position >= len && member {
                return Err(format!("{}: qualifying {:?} is outside the prefix", label, entity));
            }
        }

        for pool in &owned[1..] {
            let pool = pool.borrow();
            if pool.data()[..len] != lead.data()[..len] {
                return Err(format!("{}: owned pools disagree on member order", label));
            }
        }

        let size = sizes[key];
        let overlapping: Vec<usize> = owning
            .iter()
            .filter(|(k, other)| k != key && other.descriptor().overlaps(handler.descriptor()))
            .map(|(k, _)| sizes[k])
            .collect();

        let nearest_below = overlapping.iter().copied().filter(|&s| s < size).max();
        let nearest_above = overlapping.iter().copied().filter(|&s| s > size).min();
        let wider = overlapping.iter().filter(|&&s| s > size).count();

        if handler.prev().map(|prev| sizes.get(&prev).copied()) != nearest_below.map(Some) {
            return Err(format!("{}: broken prev link", label));
        }
        if handler.next().map(|next| sizes.get(&next).copied()) != nearest_above.map(Some) {
            return Err(format!("{}: broken next link", label));
        }
        if handler.wider() != wider {
            return Err(format!(
                "{}: counts {} wider groups but {} overlap it",
                label,
                handler.wider(),
                wider
            ));
        }
    }

    for handler in registry.non_owning_handlers() {
        let label = handler.descriptor().label();
        let members = handler.data();

        for &entity in members {
            if !qualifies(entity, handler.get_pools(), handler.exclude_pools()) {
                return Err(format!("{}: member {:?} does not qualify", label, entity));
            }
        }

        let expected = handler.get_pools()[0]
            .borrow()
            .data()
            .iter()
            .filter(|&&entity| qualifies(entity, handler.get_pools(), handler.exclude_pools()))
            .count();

        if expected != members.len() {
            return Err(format!(
                "{}: holds {} members but {} entities qualify",
                label,
                members.len(),
                expected
            ));
        }
    }

    Ok(())
}
