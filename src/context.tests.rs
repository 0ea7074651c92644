use crate::component::hashed_string;
use crate::context::Context;

#[derive(Debug, PartialEq)]
struct Config {
    width: u32,
    height: u32,
}

#[test]
fn test_context_emplace_then_get() {
    let mut ctx = Context::new();

    ctx.emplace(Config { width: 640, height: 480 });
    assert_eq!(ctx.get::<Config>(), &Config { width: 640, height: 480 });

    // A second emplace keeps the existing value
    let kept = ctx.emplace(Config { width: 1, height: 1 });
    assert_eq!(kept.width, 640);

    ctx.get_mut::<Config>().width = 800;
    assert_eq!(ctx.find::<Config>().map(|c| c.width), Some(800));
}

#[test]
fn test_context_insert_or_assign_replaces() {
    let mut ctx = Context::new();

    ctx.emplace(Config { width: 640, height: 480 });
    ctx.insert_or_assign(Config { width: 1920, height: 1080 });

    assert_eq!(ctx.get::<Config>().width, 1920);
    assert_eq!(ctx.len(), 1);
}

#[test]
fn test_context_erase_once() {
    let mut ctx = Context::new();

    ctx.emplace(Config { width: 1, height: 2 });
    assert!(ctx.erase::<Config>());
    assert!(!ctx.erase::<Config>());
    assert!(!ctx.contains::<Config>());
    assert!(ctx.is_empty());
}

#[test]
fn test_context_explicit_ids() {
    let mut ctx = Context::new();
    let primary = hashed_string("primary");
    let secondary = hashed_string("secondary");

    ctx.emplace_as(primary, 1u32);
    ctx.emplace_as(secondary, 2u32);

    assert_eq!(*ctx.get_as::<u32>(primary), 1);
    assert_eq!(*ctx.get_as::<u32>(secondary), 2);
    assert!(!ctx.contains::<u32>());

    // Type checks apply per id
    assert!(ctx.find_as::<i64>(primary).is_none());
    assert!(!ctx.contains_as::<i64>(primary));
    assert!(!ctx.erase_as::<i64>(primary));
    assert!(ctx.contains_as::<u32>(primary));

    *ctx.find_mut_as::<u32>(secondary).unwrap() += 40;
    assert_eq!(*ctx.get_as::<u32>(secondary), 42);

    ctx.insert_or_assign_as(primary, "replaced");
    assert_eq!(*ctx.get_as::<&str>(primary), "replaced");
}

#[test]
#[should_panic(expected = "no context value")]
fn test_context_get_missing_panics() {
    let ctx = Context::new();
    ctx.get::<Config>();
}

#[test]
#[should_panic(expected = "no context value")]
fn test_context_emplace_type_mismatch_panics() {
    let mut ctx = Context::new();
    let id = hashed_string("slot");

    ctx.emplace_as(id, 1u8);
    ctx.emplace_as(id, 1u16);
}
