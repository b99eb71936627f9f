//! Deferred structural mutations.
//!
//! Systems must not structurally mutate the world while iterating its
//! buckets; they record [`Command`]s into a [`CommandBuffer`] instead, and
//! the runner applies the buffer at a synchronization point between
//! systems.

use crate::engine::archetype::Archetype;
use crate::engine::entity::EntityKey;
use crate::engine::error::StoreResult;
use crate::engine::schema::Bundle;
use crate::engine::types::{ComponentId, Entity, Role};
use crate::engine::world::World;

/// One recorded structural mutation.
#[allow(missing_docs)]
pub enum Command {
    Insert { component: Option<ComponentId>, role: Role, bundle: Bundle },
    Update { key: EntityKey, bundle: Bundle },
    Extend { key: EntityKey, bundle: Bundle },
    Remove { key: EntityKey, tags: Archetype },
    DeleteKey { key: EntityKey },
    Despawn { entity: Entity },
}

/// FIFO buffer of structural mutations.
#[derive(Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if no commands are recorded.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Records a command.
    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Records an insert under the default key.
    pub fn insert(&mut self, bundle: Bundle) {
        self.commands.push(Command::Insert { component: None, role: Role::NONE, bundle });
    }

    /// Records an update of `key`.
    pub fn update(&mut self, key: EntityKey, bundle: Bundle) {
        self.commands.push(Command::Update { key, bundle });
    }

    /// Records a tag removal from `key`.
    pub fn remove(&mut self, key: EntityKey, tags: Archetype) {
        self.commands.push(Command::Remove { key, tags });
    }

    /// Records the destruction of `entity`.
    pub fn despawn(&mut self, entity: Entity) {
        self.commands.push(Command::Despawn { entity });
    }

    /// Applies every recorded command to `world` in order, draining the
    /// buffer. Stops at the first out-of-memory failure; the remaining
    /// commands are discarded.
    pub fn apply(&mut self, world: &mut World) -> StoreResult<()> {
        for command in self.commands.drain(..) {
            match command {
                Command::Insert { component, role, bundle } => {
                    world.insert_keyed(component, role, bundle)?;
                }
                Command::Update { key, bundle } => world.update(&key, bundle)?,
                Command::Extend { key, bundle } => world.extend(&key, bundle)?,
                Command::Remove { key, tags } => world.remove(&key, tags)?,
                Command::DeleteKey { key } => {
                    world.delete_key(&key);
                }
                Command::Despawn { entity } => {
                    world.despawn(entity);
                }
            }
        }
        Ok(())
    }
}
