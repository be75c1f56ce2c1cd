//! Boundary contracts between the engine and the host world.
//!
//! The engine decides which block goes where and who has to move; the host
//! applies block writes, resolves worlds and moves occupants.

pub mod memory;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::block::BlockSpec;
use crate::core::types::{DVec3, IVec3};
use crate::math::Facing;

pub use memory::{MemoryOccupants, MemoryWorld, MemoryWorlds};

/// Failure reported by a block sink
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("block queue is closed")]
    Closed,

    #[error("block queue is full after {0} writes")]
    Full(u64),

    #[error("write rejected: {0}")]
    Rejected(String),
}

/// Callback run by the sink once every previously issued write has been applied
pub type CompletionCallback = Box<dyn FnOnce() + Send + 'static>;

/// The only block I/O surface the engine uses.
///
/// Writes may be batched or deferred. `enqueue_completion` callbacks must run
/// after all writes issued before them.
pub trait BlockSink: Send + Sync {
    /// Block currently stored at a position
    fn current_block(&self, pos: IVec3) -> BlockSpec;

    /// Queue a block write
    fn set_block(&self, pos: IVec3, block: BlockSpec) -> Result<(), SinkError>;

    /// Queue a callback behind every write issued so far
    fn enqueue_completion(&self, callback: CompletionCallback) -> Result<(), SinkError>;

    /// Highest non-empty block in a column, if the sink can answer
    fn highest_block_y(&self, _x: i32, _z: i32) -> Option<i32> {
        None
    }
}

/// Name of a coordinate space (world)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct WorldId(String);

impl WorldId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorldId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Resolves world names to live block sinks
pub trait WorldResolver: Send + Sync {
    fn resolve(&self, world: &WorldId) -> Option<Arc<dyn BlockSink>>;
}

/// A position in a world with an optional orientation
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    pub world: WorldId,
    pub position: DVec3,
    pub facing: Option<Facing>,
}

impl Location {
    pub fn new(world: WorldId, position: DVec3) -> Self {
        Self { world, position, facing: None }
    }

    pub fn with_facing(mut self, facing: Facing) -> Self {
        self.facing = Some(facing);
        self
    }

    /// Block coordinate containing this position
    pub fn block(&self) -> IVec3 {
        self.position.floor().as_ivec3()
    }
}

/// Identity of an entity that can be moved out of a mine
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OccupantId(pub String);

impl fmt::Display for OccupantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An entity and where it currently stands
#[derive(Clone, Debug, PartialEq)]
pub struct Occupant {
    pub id: OccupantId,
    pub location: Location,
}

/// Enumerates and moves entities
pub trait OccupantSource: Send + Sync {
    /// Entities currently present in a world
    fn occupants(&self, world: &WorldId) -> Vec<Occupant>;

    /// Move an entity
    fn teleport(&self, occupant: &OccupantId, destination: &Location);
}
