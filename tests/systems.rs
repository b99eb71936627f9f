use hive_ecs::{
    Archetype, BucketRefMut, Bundle, FnSystem, Scheduler, Schema, SchemaBuilder, System,
    SystemContext, World,
};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Velocity {
    x: f32,
    y: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Lifetime(u32);

fn make_world() -> World {
    let mut builder = SchemaBuilder::new();
    builder.component::<Position>().unwrap();
    builder.component::<Velocity>().unwrap();
    builder.component::<Lifetime>().unwrap();
    World::new(builder.build().unwrap())
}

fn mover(schema: &Schema, x: f32, vx: f32) -> Bundle {
    Bundle::new()
        .with(schema, Position { x, y: 0.0 })
        .with(schema, Velocity { x: vx, y: 0.0 })
}

struct IntegrateSystem {
    inputs: Archetype,
}

impl System for IntegrateSystem {
    fn name(&self) -> &'static str {
        "integrate"
    }

    fn inputs(&self) -> Archetype {
        self.inputs
    }

    fn update(&mut self, bucket: &mut BucketRefMut<'_>, _context: &mut SystemContext<'_>) {
        let (velocities, positions) = bucket
            .get_pair_mut::<Velocity, Position>(1, 0)
            .expect("inputs guarantee both columns");
        for (position, velocity) in positions.iter_mut().zip(velocities) {
            position.x += velocity.x;
            position.y += velocity.y;
        }
    }
}

/// Despawns entities whose lifetime reaches zero, through the deferred
/// command buffer.
struct ExpireSystem {
    inputs: Archetype,
    expired_this_run: usize,
}

impl System for ExpireSystem {
    fn name(&self) -> &'static str {
        "expire"
    }

    fn inputs(&self) -> Archetype {
        self.inputs
    }

    fn begin(&mut self, _context: &mut SystemContext<'_>) {
        self.expired_this_run = 0;
    }

    fn update(&mut self, bucket: &mut BucketRefMut<'_>, context: &mut SystemContext<'_>) {
        let entities: Vec<_> = bucket.entities().to_vec();
        let lifetimes = bucket.get_mut::<Lifetime>(2).expect("inputs guarantee the column");
        for (index, lifetime) in lifetimes.iter_mut().enumerate() {
            if lifetime.0 == 0 {
                context.commands.despawn(entities[index]);
                self.expired_this_run += 1;
            } else {
                lifetime.0 -= 1;
            }
        }
    }
}

#[test]
fn systems_walk_matching_buckets_and_defer_mutations() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut world = make_world();
    let position_tag = world.schema().require::<Position>();
    let velocity_tag = world.schema().require::<Velocity>();
    let lifetime_tag = world.schema().require::<Lifetime>();

    let walker = world.insert(mover(world.schema(), 0.0, 1.0)).unwrap();
    let idle = world
        .insert(Bundle::new().with(world.schema(), Position { x: 5.0, y: 5.0 }))
        .unwrap();
    let doomed_bundle = mover(world.schema(), 9.0, 0.5).with(world.schema(), Lifetime(1));
    let doomed = world.insert(doomed_bundle).unwrap();

    let mut scheduler = Scheduler::new();
    scheduler.add_system(IntegrateSystem {
        inputs: Archetype::of(&[position_tag, velocity_tag]),
    });
    scheduler.add_system(ExpireSystem {
        inputs: Archetype::of(&[lifetime_tag]),
        expired_this_run: 0,
    });
    assert_eq!(scheduler.len(), 2);

    // Tick 1: everyone moves; the doomed entity's lifetime drops to zero.
    scheduler.run(&mut world).unwrap();
    assert_eq!(world.get::<Position>(&walker).unwrap().x, 1.0);
    assert_eq!(world.get::<Position>(&idle).unwrap().x, 5.0);
    assert!(world.contains(doomed.entity));
    assert_eq!(world.get::<Lifetime>(&doomed), Some(&Lifetime(0)));

    // Tick 2: the doomed entity expires at the synchronization point.
    scheduler.run(&mut world).unwrap();
    assert_eq!(world.get::<Position>(&walker).unwrap().x, 2.0);
    assert!(!world.contains(doomed.entity));
    assert_eq!(world.entity_count(), 2);
}

#[test]
fn fn_systems_spawn_through_the_command_buffer() {
    let mut world = make_world();
    let position_tag = world.schema().require::<Position>();

    world
        .insert(Bundle::new().with(world.schema(), Position { x: 0.0, y: 0.0 }))
        .unwrap();

    let mut scheduler = Scheduler::new();
    scheduler.add_system(FnSystem::new(
        "echo",
        Archetype::of(&[position_tag]),
        |bucket, context| {
            for position in bucket.get::<Position>(0).unwrap() {
                let mirrored = Bundle::new().with(
                    context.schema,
                    Velocity { x: position.x, y: position.y },
                );
                context.commands.insert(mirrored);
            }
        },
    ));

    scheduler.run(&mut world).unwrap();
    // One echo per entity observed during the walk; echoes carry only a
    // velocity, so later walks over positions never visit them.
    assert_eq!(world.entity_count(), 2);

    scheduler.run(&mut world).unwrap();
    assert_eq!(world.entity_count(), 3);
}
