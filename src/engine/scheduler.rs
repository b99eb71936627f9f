//! System scheduling and execution.
//!
//! This module is responsible for:
//! * running registered systems against a world, one bucket walk each,
//! * enforcing structural synchronization points between systems.
//!
//! ## Scheduling model
//!
//! Systems run sequentially in registration order — the store is
//! single-threaded, so there are no stages to parallelize. What the runner
//! does enforce is *phase discipline*: a system never structurally mutates
//! the world while iterating it. Mutations are recorded into the command
//! buffer and applied after the system's bucket walk completes, so the
//! next system observes a consistent world.

use crate::engine::commands::CommandBuffer;
use crate::engine::error::StoreResult;
use crate::engine::systems::{System, SystemContext};
use crate::engine::world::World;

/// Sequential system runner.
#[derive(Default)]
pub struct Scheduler {
    systems: Vec<Box<dyn System>>,
    commands: CommandBuffer,
}

impl Scheduler {
    /// Creates an empty scheduler.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered systems.
    #[inline]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Returns `true` if no systems are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Removes all systems.
    #[inline]
    pub fn clear(&mut self) {
        self.systems.clear();
    }

    /// Registers a boxed system.
    #[inline]
    pub fn add_boxed(&mut self, system: Box<dyn System>) {
        self.systems.push(system);
    }

    /// Registers a concrete system.
    #[inline]
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        self.add_boxed(Box::new(system));
    }

    /// Runs every registered system once, in registration order.
    ///
    /// For each system: `begin`, then `update` per non-empty bucket whose
    /// archetype contains the system's inputs, then `end`, then the
    /// commands recorded during the run are applied to the world.
    ///
    /// ## Errors
    /// Out-of-memory from applying deferred commands; systems already run
    /// keep their effects.
    pub fn run(&mut self, world: &mut World) -> StoreResult<()> {
        let schema = world.schema_handle();
        for system in &mut self.systems {
            let mut context = SystemContext {
                schema: &*schema,
                commands: &mut self.commands,
            };

            system.begin(&mut context);
            let shape = system.inputs();
            for mut bucket in world.query_mut(shape) {
                system.update(&mut bucket, &mut context);
            }
            system.end(&mut context);

            self.commands.apply(world)?;
        }
        Ok(())
    }
}
