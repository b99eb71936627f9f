use hive_ecs::{Archetype, Bundle, EntityKey, Schema, SchemaBuilder, World};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Health {
    hp: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Position {
    x: i32,
    y: i32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Velocity {
    x: i32,
    y: i32,
}

struct Frozen;

fn make_world() -> World {
    let mut builder = SchemaBuilder::new();
    builder.component::<Health>().unwrap();
    builder.component::<Position>().unwrap();
    builder.component::<Velocity>().unwrap();
    builder.marker::<Frozen>().unwrap();
    World::new(builder.build().unwrap())
}

fn health(schema: &Schema, hp: u32) -> Bundle {
    Bundle::new().with(schema, Health { hp })
}

fn pos_vel(schema: &Schema, position: Position, velocity: Velocity) -> Bundle {
    Bundle::new().with(schema, position).with(schema, velocity)
}

#[test]
fn insert_read_remove_lands_in_empty_bucket() {
    let mut world = make_world();
    let health_tag = world.schema().require::<Health>();

    let bundle = health(world.schema(), 100);
    let key = world.insert(bundle).unwrap();
    assert_eq!(world.get::<Health>(&key), Some(&Health { hp: 100 }));

    world.remove(&key, Archetype::of(&[health_tag])).unwrap();
    assert_eq!(world.get::<Health>(&key), None);

    // The stripped entity lives on in the empty-archetype bucket.
    let empty = world
        .buckets()
        .find(|bucket| bucket.archetype() == Archetype::EMPTY)
        .expect("empty bucket materialized");
    assert_eq!(empty.len(), 1);
    assert_eq!(empty.entities(), &[key.entity]);

    // The previous bucket lingers, now empty.
    let old = world
        .buckets()
        .find(|bucket| bucket.archetype() == Archetype::of(&[health_tag]))
        .expect("health bucket lingers");
    assert_eq!(old.len(), 0);
}

#[test]
fn update_widening_shape_migrates_and_preserves_values() {
    let mut world = make_world();
    let position = Position { x: 1, y: 2 };
    let velocity = Velocity { x: 3, y: 4 };

    let bundle = pos_vel(world.schema(), position, velocity);
    let key = world.insert(bundle).unwrap();

    let source = world.archetype_of(&key).unwrap();
    let source_len_before = world
        .buckets()
        .find(|bucket| bucket.archetype() == source)
        .unwrap()
        .len();

    let widen = Bundle::new().with_marker::<Frozen>(world.schema());
    world.update(&key, widen).unwrap();

    let target = world.archetype_of(&key).unwrap();
    assert_ne!(target, source);
    assert!(target.contains(source));
    assert_eq!(world.get::<Position>(&key), Some(&position));
    assert_eq!(world.get::<Velocity>(&key), Some(&velocity));

    let source_len_after = world
        .buckets()
        .find(|bucket| bucket.archetype() == source)
        .unwrap()
        .len();
    assert_eq!(source_len_after, source_len_before - 1);
}

#[test]
fn update_same_shape_writes_in_place() {
    let mut world = make_world();
    let bundle = health(world.schema(), 10);
    let key = world.insert(bundle).unwrap();
    let archetype = world.archetype_of(&key).unwrap();

    let rewrite = health(world.schema(), 99);
    world.update(&key, rewrite).unwrap();

    assert_eq!(world.get::<Health>(&key), Some(&Health { hp: 99 }));
    assert_eq!(world.archetype_of(&key), Some(archetype));
    // In-place writes create no new bucket.
    assert_eq!(
        world
            .buckets()
            .filter(|bucket| bucket.archetype() == archetype)
            .count(),
        1
    );
}

#[test]
fn removal_swaps_last_row_and_patches_its_registration() {
    let mut world = make_world();
    let position_tag = world.schema().require::<Position>();
    let velocity_tag = world.schema().require::<Velocity>();

    let a = world
        .insert(pos_vel(world.schema(), Position { x: 1, y: 1 }, Velocity { x: 0, y: 0 }))
        .unwrap();
    let b = world
        .insert(pos_vel(world.schema(), Position { x: 2, y: 2 }, Velocity { x: 5, y: 5 }))
        .unwrap();

    // A sits at row 0, B at row 1 of the same bucket.
    let shared = world.archetype_of(&a).unwrap();
    assert_eq!(world.archetype_of(&b), Some(shared));

    world
        .remove(&a, Archetype::of(&[position_tag, velocity_tag]))
        .unwrap();

    // B was swapped into row 0 and still reads back correctly.
    let bucket = world
        .buckets()
        .find(|bucket| bucket.archetype() == shared)
        .unwrap();
    assert_eq!(bucket.entities(), &[b.entity]);
    assert_eq!(world.get::<Position>(&b), Some(&Position { x: 2, y: 2 }));
    assert_eq!(world.get::<Velocity>(&b), Some(&Velocity { x: 5, y: 5 }));

    // A moved to the empty-archetype bucket.
    assert_eq!(world.archetype_of(&a), Some(Archetype::EMPTY));
    assert_eq!(world.get::<Position>(&a), None);
}

#[test]
fn get_mut_writes_through() {
    let mut world = make_world();
    let bundle = health(world.schema(), 7);
    let key = world.insert(bundle).unwrap();

    world.get_mut::<Health>(&key).unwrap().hp = 8;
    assert_eq!(world.get::<Health>(&key), Some(&Health { hp: 8 }));
}

#[test]
fn insert_with_empty_bundle_places_in_empty_bucket() {
    let mut world = make_world();
    let key = world.insert(Bundle::new()).unwrap();

    assert_eq!(world.archetype_of(&key), Some(Archetype::EMPTY));
    let empty = world
        .buckets()
        .find(|bucket| bucket.archetype() == Archetype::EMPTY)
        .unwrap();
    assert_eq!(empty.entities(), &[key.entity]);
}

#[test]
fn marker_participates_in_shape_but_owns_no_column() {
    let mut world = make_world();
    let frozen_tag = world.schema().require::<Frozen>();

    let bundle = health(world.schema(), 3).with_marker::<Frozen>(world.schema());
    let key = world.insert(bundle).unwrap();

    let archetype = world.archetype_of(&key).unwrap();
    assert!(archetype.has(frozen_tag));

    let bucket = world.query(Archetype::of(&[frozen_tag])).next().unwrap();
    assert!(bucket.get::<Health>(world.schema().require::<Health>()).is_some());
    assert!(bucket.get::<()>(frozen_tag).is_none());
}

#[test]
fn despawned_key_reads_nothing() {
    let mut world = make_world();
    let bundle = health(world.schema(), 1);
    let key = world.insert(bundle).unwrap();

    assert!(world.despawn(key.entity));
    assert!(!world.contains(key.entity));
    assert_eq!(world.get::<Health>(&key), None);
    assert_eq!(world.archetype_of(&key), None);
    assert!(!world.despawn(key.entity));
}

#[test]
fn delete_key_drops_the_registration_but_not_the_entity() {
    let mut world = make_world();
    let bundle = health(world.schema(), 5);
    let key = world.insert(bundle).unwrap();

    assert!(world.delete_key(&key));
    assert!(world.contains(key.entity));
    assert!(world.locations(key.entity).unwrap().is_empty());
    assert_eq!(world.get::<Health>(&key), None);
    assert!(!world.delete_key(&EntityKey::of(hive_ecs::Entity(999))));
}
