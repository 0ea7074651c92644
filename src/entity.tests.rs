use crate::entity::Entity;

#[test]
fn test_entity_packing() {
    let e = Entity::new(42, 7);
    assert_eq!(e.index(), 42);
    assert_eq!(e.version(), 7);

    // Out of range fields are masked
    let e = Entity::new(Entity::INDEX_MASK + 5, Entity::VERSION_MASK + 3);
    assert_eq!(e.index(), 4);
    assert_eq!(e.version(), 2);

    assert_eq!(Entity::from_bits(e.to_bits()), e);
}

#[test]
fn test_entity_next_skips_tombstone() {
    let e = Entity::new(3, 0);
    assert_eq!(e.next().version(), 1);
    assert_eq!(e.next().index(), 3);

    let last = Entity::new(3, Entity::VERSION_MASK - 1);
    let wrapped = last.next();
    assert_eq!(wrapped.version(), 0);
    assert!(!wrapped.is_tombstone());
}

#[test]
fn test_entity_null_and_tombstone() {
    assert!(Entity::NULL.is_null());
    assert!(Entity::TOMBSTONE.is_tombstone());
    assert!(Entity::default().is_null());

    // Null compares on the index, tombstone on the version
    assert!(Entity::new(Entity::INDEX_MASK, 5).is_null());
    assert!(!Entity::new(Entity::INDEX_MASK, 5).is_tombstone());
    assert!(Entity::new(12, Entity::VERSION_MASK).is_tombstone());
    assert!(!Entity::new(12, Entity::VERSION_MASK).is_null());
}

#[test]
fn test_entity_debug() {
    assert_eq!(format!("{:?}", Entity::new(1, 2)), "Entity(id = 1, version = 2)");
    assert_eq!(format!("{:?}", Entity::NULL), format!("Entity(null, version = {})", Entity::VERSION_MASK));
}
