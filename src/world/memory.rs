//! In-memory world, resolver and occupant registry.
//!
//! Used by tests and the simulator binary in place of a live host.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{BlockSink, CompletionCallback, Location, Occupant, OccupantId, OccupantSource, SinkError, WorldId, WorldResolver};
use crate::block::BlockSpec;
use crate::core::types::IVec3;
use crate::math::BlockAabb;

/// Default number of queued writes applied per batch
pub const DEFAULT_BATCH_SIZE: usize = 4096;

#[derive(Default)]
struct WriteQueue {
    pending: Vec<(IVec3, BlockSpec)>,
    callbacks: Vec<CompletionCallback>,
    accepted: u64,
    closed: bool,
}

/// Sparse block store with a batched write queue.
///
/// Writes become visible when a batch fills or when a completion callback is
/// enqueued. With `hold_completions`, callbacks wait for an explicit [`flush`](Self::flush).
pub struct MemoryWorld {
    blocks: Mutex<HashMap<IVec3, BlockSpec>>,
    queue: Mutex<WriteQueue>,
    batch_size: usize,
    write_limit: Option<u64>,
    hold_completions: bool,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self {
            blocks: Mutex::new(HashMap::new()),
            queue: Mutex::new(WriteQueue::default()),
            batch_size: DEFAULT_BATCH_SIZE,
            write_limit: None,
            hold_completions: false,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Reject writes once `limit` writes have been accepted
    pub fn with_write_limit(mut self, limit: u64) -> Self {
        self.write_limit = Some(limit);
        self
    }

    /// Keep completion callbacks queued until [`flush`](Self::flush) is called
    pub fn with_held_completions(mut self) -> Self {
        self.hold_completions = true;
        self
    }

    /// Write a block immediately, bypassing the queue
    pub fn put(&self, pos: IVec3, block: BlockSpec) {
        let mut blocks = self.blocks.lock().unwrap();
        if block.is_empty() {
            blocks.remove(&pos);
        } else {
            blocks.insert(pos, block);
        }
    }

    /// Write a block into every cell of a box immediately
    pub fn put_box(&self, aabb: BlockAabb, block: BlockSpec) {
        for cell in aabb.cells() {
            self.put(cell, block);
        }
    }

    /// Applied block at a position
    pub fn block_at(&self, pos: IVec3) -> BlockSpec {
        self.blocks.lock().unwrap().get(&pos).copied().unwrap_or(BlockSpec::AIR)
    }

    /// Number of applied cells in a box holding the given block
    pub fn count_in(&self, aabb: BlockAabb, block: BlockSpec) -> usize {
        aabb.cells().filter(|c| self.block_at(*c) == block).count()
    }

    /// Writes accepted so far
    pub fn accepted_writes(&self) -> u64 {
        self.queue.lock().unwrap().accepted
    }

    /// Writes queued but not yet applied
    pub fn pending_writes(&self) -> usize {
        self.queue.lock().unwrap().pending.len()
    }

    /// Completion callbacks waiting for a flush
    pub fn queued_completions(&self) -> usize {
        self.queue.lock().unwrap().callbacks.len()
    }

    /// Stop accepting writes and callbacks
    pub fn close(&self) {
        self.queue.lock().unwrap().closed = true;
    }

    /// Apply every queued write, then run queued completion callbacks
    pub fn flush(&self) {
        let callbacks = {
            let mut queue = self.queue.lock().unwrap();
            self.apply(&mut queue.pending);
            std::mem::take(&mut queue.callbacks)
        };
        for callback in callbacks {
            callback();
        }
    }

    fn apply(&self, pending: &mut Vec<(IVec3, BlockSpec)>) {
        let mut blocks = self.blocks.lock().unwrap();
        for (pos, block) in pending.drain(..) {
            if block.is_empty() {
                blocks.remove(&pos);
            } else {
                blocks.insert(pos, block);
            }
        }
    }
}

impl Default for MemoryWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockSink for MemoryWorld {
    fn current_block(&self, pos: IVec3) -> BlockSpec {
        self.block_at(pos)
    }

    fn set_block(&self, pos: IVec3, block: BlockSpec) -> Result<(), SinkError> {
        let mut queue = self.queue.lock().unwrap();
        if queue.closed {
            return Err(SinkError::Closed);
        }
        if let Some(limit) = self.write_limit {
            if queue.accepted >= limit {
                return Err(SinkError::Full(queue.accepted));
            }
        }
        queue.accepted += 1;
        queue.pending.push((pos, block));
        if queue.pending.len() >= self.batch_size {
            self.apply(&mut queue.pending);
        }
        Ok(())
    }

    fn enqueue_completion(&self, callback: CompletionCallback) -> Result<(), SinkError> {
        {
            let mut queue = self.queue.lock().unwrap();
            if queue.closed {
                return Err(SinkError::Closed);
            }
            queue.callbacks.push(callback);
        }
        if !self.hold_completions {
            self.flush();
        }
        Ok(())
    }

    fn highest_block_y(&self, x: i32, z: i32) -> Option<i32> {
        self.blocks
            .lock()
            .unwrap()
            .keys()
            .filter(|p| p.x == x && p.z == z)
            .map(|p| p.y)
            .max()
    }
}

/// Resolver over a fixed set of in-memory worlds
#[derive(Default)]
pub struct MemoryWorlds {
    worlds: HashMap<WorldId, Arc<MemoryWorld>>,
}

impl MemoryWorlds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a world, returning a handle to it
    pub fn insert(&mut self, name: impl Into<String>, world: MemoryWorld) -> Arc<MemoryWorld> {
        let world = Arc::new(world);
        self.worlds.insert(WorldId::new(name), world.clone());
        world
    }

    pub fn get(&self, world: &WorldId) -> Option<Arc<MemoryWorld>> {
        self.worlds.get(world).cloned()
    }
}

impl WorldResolver for MemoryWorlds {
    fn resolve(&self, world: &WorldId) -> Option<Arc<dyn BlockSink>> {
        self.worlds.get(world).map(|w| w.clone() as Arc<dyn BlockSink>)
    }
}

/// Occupant registry that records teleports
#[derive(Default)]
pub struct MemoryOccupants {
    occupants: Mutex<HashMap<OccupantId, Location>>,
}

impl MemoryOccupants {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, id: impl Into<String>, location: Location) {
        self.occupants.lock().unwrap().insert(OccupantId(id.into()), location);
    }

    pub fn location_of(&self, id: &str) -> Option<Location> {
        self.occupants.lock().unwrap().get(&OccupantId(id.to_string())).cloned()
    }
}

impl OccupantSource for MemoryOccupants {
    fn occupants(&self, world: &WorldId) -> Vec<Occupant> {
        let mut found: Vec<Occupant> = self
            .occupants
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, loc)| &loc.world == world)
            .map(|(id, loc)| Occupant { id: id.clone(), location: loc.clone() })
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found
    }

    fn teleport(&self, occupant: &OccupantId, destination: &Location) {
        self.occupants.lock().unwrap().insert(occupant.clone(), destination.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DVec3;

    #[test]
    fn test_batched_writes_apply_on_completion() {
        let world = MemoryWorld::new().with_batch_size(10);
        world.set_block(IVec3::ZERO, BlockSpec::of(1)).unwrap();
        assert_eq!(world.block_at(IVec3::ZERO), BlockSpec::AIR);
        assert_eq!(world.pending_writes(), 1);

        let (tx, rx) = std::sync::mpsc::channel();
        world.enqueue_completion(Box::new(move || tx.send(()).unwrap())).unwrap();
        rx.recv().unwrap();
        assert_eq!(world.block_at(IVec3::ZERO), BlockSpec::of(1));
    }

    #[test]
    fn test_held_completions_wait_for_flush() {
        let world = MemoryWorld::new().with_held_completions();
        let (tx, rx) = std::sync::mpsc::channel();
        world.set_block(IVec3::ONE, BlockSpec::of(4)).unwrap();
        world.enqueue_completion(Box::new(move || tx.send(()).unwrap())).unwrap();
        assert!(rx.try_recv().is_err());

        world.flush();
        assert!(rx.try_recv().is_ok());
        assert_eq!(world.block_at(IVec3::ONE), BlockSpec::of(4));
    }

    #[test]
    fn test_write_limit_and_close() {
        let world = MemoryWorld::new().with_write_limit(2);
        assert!(world.set_block(IVec3::ZERO, BlockSpec::of(1)).is_ok());
        assert!(world.set_block(IVec3::ONE, BlockSpec::of(1)).is_ok());
        assert_eq!(world.set_block(IVec3::X, BlockSpec::of(1)), Err(SinkError::Full(2)));

        let closed = MemoryWorld::new();
        closed.close();
        assert_eq!(closed.set_block(IVec3::ZERO, BlockSpec::of(1)), Err(SinkError::Closed));
        assert!(closed.enqueue_completion(Box::new(|| {})).is_err());
    }

    #[test]
    fn test_highest_block() {
        let world = MemoryWorld::new();
        world.put(IVec3::new(3, 4, 5), BlockSpec::of(1));
        world.put(IVec3::new(3, 9, 5), BlockSpec::of(1));
        assert_eq!(world.highest_block_y(3, 5), Some(9));
        assert_eq!(world.highest_block_y(0, 0), None);
    }

    #[test]
    fn test_occupants_filter_by_world() {
        let occupants = MemoryOccupants::new();
        occupants.add("alice", Location::new("world".into(), DVec3::ZERO));
        occupants.add("bob", Location::new("nether".into(), DVec3::ZERO));

        let found = occupants.occupants(&"world".into());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, OccupantId("alice".into()));

        let dest = Location::new("world".into(), DVec3::splat(9.0));
        occupants.teleport(&OccupantId("bob".into()), &dest);
        assert_eq!(occupants.location_of("bob"), Some(dest));
    }
}
