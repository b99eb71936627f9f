#![allow(dead_code)]

use hive_ecs::{Bundle, Schema, SchemaBuilder, World};

pub const AGENTS_SMALL: usize = 1_000;
pub const AGENTS_MED: usize = 100_000;

#[derive(Clone, Copy)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy)]
pub struct Wealth {
    pub value: f32,
}

#[derive(Clone, Copy)]
pub struct Productivity {
    pub rate: f32,
}

pub fn make_world() -> World {
    let mut builder = SchemaBuilder::new();
    builder.component::<Position>().unwrap();
    builder.component::<Wealth>().unwrap();
    builder.component::<Productivity>().unwrap();
    World::new(builder.build().unwrap())
}

pub fn agent(schema: &Schema) -> Bundle {
    Bundle::new()
        .with(schema, Position { x: 0.0, y: 0.0 })
        .with(schema, Wealth { value: 100.0 })
        .with(schema, Productivity { rate: 1.0 })
}

pub fn populate(world: &mut World, agent_count: usize) {
    for _ in 0..agent_count {
        let bundle = agent(world.schema());
        world.insert(bundle).unwrap();
    }
}
