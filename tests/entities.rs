use hive_ecs::{Bundle, EntityAllocator, SchemaBuilder, StoreError, World};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Counter(u64);

fn make_world() -> World {
    let mut builder = SchemaBuilder::new();
    builder.component::<Counter>().unwrap();
    World::new(builder.build().unwrap())
}

#[test]
fn identifiers_are_recycled_after_despawn() {
    let mut world = make_world();

    let bundle = Bundle::new().with(world.schema(), Counter(0));
    let first = world.insert(bundle).unwrap();
    assert!(world.despawn(first.entity));

    // The freshest despawned identifier is handed out again.
    let bundle = Bundle::new().with(world.schema(), Counter(1));
    let second = world.insert(bundle).unwrap();
    assert_eq!(second.entity, first.entity);

    // The stale key now reads the new registration's value: identifier
    // reuse is the caller's contract, not the store's.
    assert_eq!(world.get::<Counter>(&first), Some(&Counter(1)));
}

#[test]
fn live_ids_are_exactly_issued_minus_despawned() {
    let mut world = make_world();

    let mut keys = Vec::new();
    for i in 0..10 {
        let bundle = Bundle::new().with(world.schema(), Counter(i));
        keys.push(world.insert(bundle).unwrap());
    }
    assert_eq!(world.entity_count(), 10);

    for key in keys.iter().take(4) {
        assert!(world.despawn(key.entity));
    }
    assert_eq!(world.entity_count(), 6);
    for key in keys.iter().take(4) {
        assert!(!world.contains(key.entity));
    }
    for key in keys.iter().skip(4) {
        assert!(world.contains(key.entity));
    }
}

#[test]
fn allocator_issues_every_identifier_before_failing() {
    // Simulate the tail of the identifier space.
    let mut allocator = EntityAllocator::starting_at(u32::MAX - 2);

    let a = allocator.allocate().unwrap();
    let b = allocator.allocate().unwrap();
    assert_eq!((a.0, b.0), (u32::MAX - 2, u32::MAX - 1));

    // The reserved all-ones value is never issued.
    assert!(matches!(allocator.allocate(), Err(StoreError::Exhausted(_))));

    allocator.release(b);
    assert_eq!(allocator.allocate().unwrap(), b);
    assert!(matches!(allocator.allocate(), Err(StoreError::Exhausted(_))));
}

#[test]
fn spawned_entities_start_with_no_registrations() {
    let mut world = make_world();
    let id = world.spawn().unwrap();

    assert!(world.contains(id));
    assert!(world.locations(id).unwrap().is_empty());
    assert_eq!(world.entity_count(), 1);

    assert!(world.despawn(id));
    assert_eq!(world.entity_count(), 0);
}
