use crate::component::{Component, ComponentSet, TypeInfo, hashed_string, type_hash};

#[derive(Component)]
struct Position {
    _x: f32,
}

#[derive(Component)]
struct Velocity {
    _x: f32,
}

#[derive(Component)]
struct Tagged;

#[derive(Component)]
struct Wrapper<T> {
    _inner: T,
}

#[test]
fn test_component_ids_are_stable_and_distinct() {
    assert_eq!(Position::type_index(), Position::type_index());
    assert_ne!(Position::type_index(), Velocity::type_index());
    assert_ne!(Velocity::type_index(), Tagged::type_index());
}

#[test]
fn test_generic_component_ids() {
    assert_eq!(Wrapper::<u8>::type_index(), type_hash::<Wrapper<u8>>());
    assert_ne!(Wrapper::<u8>::type_index(), Wrapper::<u16>::type_index());
}

#[test]
fn test_hashed_string_fnv1a() {
    assert_eq!(hashed_string(""), 0x811c_9dc5);
    assert_eq!(hashed_string("a"), 0xe40c_292c);
    assert_ne!(hashed_string("foo"), hashed_string("bar"));
}

#[test]
fn test_type_info() {
    let info = TypeInfo::of::<Position>();
    assert_eq!(info, TypeInfo::of::<Position>());
    assert_ne!(info, TypeInfo::of::<Velocity>());
    assert!(info.name.ends_with("Position"));
}

#[test]
fn test_component_set_counts_and_ids() {
    assert_eq!(<() as ComponentSet>::COUNT, 0);
    assert_eq!(<Position as ComponentSet>::COUNT, 1);
    assert_eq!(<(Position, Velocity) as ComponentSet>::COUNT, 2);
    assert_eq!(<(Position, (Velocity, Tagged)) as ComponentSet>::COUNT, 3);

    assert_eq!(
        <(Velocity, Position)>::ids(),
        vec![Velocity::type_index(), Position::type_index()]
    );
    assert!(<()>::ids().is_empty());
}

#[test]
fn test_component_set_folds_short_circuit() {
    let mut visited = Vec::new();
    let all = <(Position, Velocity, Tagged)>::all(&mut |id| {
        visited.push(id);
        id != Velocity::type_index()
    });

    assert!(!all);
    assert_eq!(visited, vec![Position::type_index(), Velocity::type_index()]);

    let mut visited = 0;
    let any = <(Position, Velocity, Tagged)>::any(&mut |id| {
        visited += 1;
        id == Position::type_index()
    });

    assert!(any);
    assert_eq!(visited, 1);

    assert!(<()>::all(&mut |_| false));
    assert!(!<()>::any(&mut |_| true));
}
