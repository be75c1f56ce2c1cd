//! One reset cycle: evacuate, snapshot, fill, report.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use crate::core::error::Error;
use crate::core::types::Result;
use crate::mine::state::MineState;
use crate::reset::events::{EventSink, MineEvent};
use crate::reset::filler::{FillJob, FillReport, RegionFiller};
use crate::reset::relocate::OccupantRelocator;
use crate::world::{OccupantSource, WorldResolver};

/// Callback invoked once a reset cycle ends, successfully or not.
///
/// Runs on a runtime worker; hosts that need another thread should forward from here.
pub type ResetCallback = Box<dyn FnOnce(&Result<FillReport>) + Send + 'static>;

/// Outcome of a launched reset
pub struct ResetTicket {
    mine: String,
    rx: oneshot::Receiver<Result<FillReport>>,
}

impl ResetTicket {
    pub fn mine(&self) -> &str {
        &self.mine
    }

    /// Wait for the cycle to finish
    pub async fn wait(self) -> Result<FillReport> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(Error::FillAborted(self.mine)),
        }
    }
}

/// Orchestrates reset cycles and guarantees at most one in flight per mine
pub struct ResetController {
    worlds: Arc<dyn WorldResolver>,
    occupants: Arc<dyn OccupantSource>,
    events: Arc<dyn EventSink>,
    filler: RegionFiller,
    relocator: OccupantRelocator,
    in_flight: Arc<Mutex<HashSet<String>>>,
    fill_seed: Option<u64>,
}

impl ResetController {
    pub fn new(
        worlds: Arc<dyn WorldResolver>,
        occupants: Arc<dyn OccupantSource>,
        events: Arc<dyn EventSink>,
        filler: RegionFiller,
    ) -> Self {
        Self {
            worlds,
            occupants,
            events,
            filler,
            relocator: OccupantRelocator::new(),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            fill_seed: None,
        }
    }

    /// Use a fixed RNG seed for every fill
    pub fn with_fill_seed(mut self, seed: Option<u64>) -> Self {
        self.fill_seed = seed;
        self
    }

    pub fn events(&self) -> &Arc<dyn EventSink> {
        &self.events
    }

    /// Whether a fill for this mine is still running
    pub fn is_resetting(&self, mine: &str) -> bool {
        self.in_flight.lock().unwrap().contains(mine)
    }

    /// Start a reset of `mine`.
    ///
    /// Occupants are moved before this returns; the fill continues in the
    /// background and `on_complete` runs when it ends. The composition and
    /// policies are read once, here.
    pub fn reset(&self, mine: &MineState, on_complete: Option<ResetCallback>) -> Result<ResetTicket> {
        let name = mine.name().to_string();
        let sink = self
            .worlds
            .resolve(mine.world())
            .ok_or_else(|| Error::UnknownWorld(mine.world().to_string()))?;

        if !self.in_flight.lock().unwrap().insert(name.clone()) {
            log::warn!("Ignoring reset of mine '{}': previous fill still running", name);
            return Err(Error::ResetInFlight(name));
        }

        self.evacuate(mine);

        let mut options = mine.fill_options();
        options.seed = self.fill_seed;
        let job = FillJob {
            mine: name.clone(),
            bounds: mine.bounds(),
            partition: mine.composition().partition(),
            options,
        };
        let handle = self.filler.fill(job, sink);

        let (tx, rx) = oneshot::channel();
        let in_flight = self.in_flight.clone();
        let events = self.events.clone();
        let watched = name.clone();

        self.filler.runtime().spawn(async move {
            let result = handle.wait().await;
            in_flight.lock().unwrap().remove(&watched);

            match &result {
                Ok(report) => events.emit(MineEvent::ResetCompleted { mine: watched.clone(), report: *report }),
                Err(e) => events.emit(MineEvent::ResetFailed { mine: watched.clone(), reason: e.to_string() }),
            }
            if let Some(callback) = on_complete {
                callback(&result);
            }
            let _ = tx.send(result);
        });

        Ok(ResetTicket { mine: name, rx })
    }

    /// Move everyone standing inside the mine, before any block changes
    fn evacuate(&self, mine: &MineState) {
        let inside: Vec<_> = self
            .occupants
            .occupants(mine.world())
            .into_iter()
            .filter(|o| mine.contains(&o.location))
            .collect();
        if inside.is_empty() {
            return;
        }

        let mut rng = rand::rng();
        for relocation in self.relocator.relocate(mine, &inside, &mut rng) {
            self.occupants.teleport(&relocation.occupant, &relocation.destination);
            if relocation.fallback {
                self.events.emit(MineEvent::Evacuated {
                    mine: mine.name().to_string(),
                    occupant: relocation.occupant,
                });
            }
        }
        log::debug!("Evacuated {} occupant(s) from mine '{}'", inside.len(), mine.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockSpec;
    use crate::core::types::{DVec3, IVec3};
    use crate::reset::events::RecordingEventSink;
    use crate::world::{Location, MemoryOccupants, MemoryWorld, MemoryWorlds};

    const STONE: BlockSpec = BlockSpec::of(1);

    struct Fixture {
        world: Arc<MemoryWorld>,
        occupants: Arc<MemoryOccupants>,
        events: Arc<RecordingEventSink>,
        controller: ResetController,
    }

    fn fixture(world: MemoryWorld) -> Fixture {
        let mut worlds = MemoryWorlds::new();
        let world = worlds.insert("world", world);
        let occupants = Arc::new(MemoryOccupants::new());
        let events = Arc::new(RecordingEventSink::new());
        let controller = ResetController::new(
            Arc::new(worlds),
            occupants.clone(),
            events.clone(),
            RegionFiller::with_current_runtime(),
        )
        .with_fill_seed(Some(4));
        Fixture { world, occupants, events, controller }
    }

    fn quarry() -> MineState {
        let mut mine = MineState::new("quarry", "world".into(), IVec3::ZERO, IVec3::new(4, 4, 4));
        mine.composition_mut().set(STONE, 1.0).unwrap();
        mine
    }

    #[tokio::test]
    async fn test_reset_fills_and_reports() {
        let f = fixture(MemoryWorld::new());
        let mine = quarry();

        let (tx, rx) = oneshot::channel();
        let callback: ResetCallback = Box::new(move |result: &Result<FillReport>| {
            let _ = tx.send(result.as_ref().map(|r| r.cells_written).ok());
        });
        let report = f.controller.reset(&mine, Some(callback)).unwrap().wait().await.unwrap();

        assert_eq!(report.cells_written, 125);
        assert_eq!(rx.await.unwrap(), Some(125));
        assert_eq!(f.world.count_in(mine.bounds(), STONE), 125);
        assert!(!f.controller.is_resetting("quarry"));
        assert!(matches!(f.events.events().last(), Some(MineEvent::ResetCompleted { .. })));
    }

    #[tokio::test]
    async fn test_occupants_moved_before_fill() {
        let f = fixture(MemoryWorld::new());
        let mine = quarry();
        f.occupants.add("inside", Location::new("world".into(), DVec3::new(2.0, 2.0, 2.0)));
        f.occupants.add("outside", Location::new("world".into(), DVec3::new(20.0, 2.0, 2.0)));
        f.occupants.add("elsewhere", Location::new("nether".into(), DVec3::new(2.0, 2.0, 2.0)));

        let ticket = f.controller.reset(&mine, None).unwrap();
        // Relocation is synchronous
        let moved = f.occupants.location_of("inside").unwrap();
        assert!(!mine.contains(&moved));
        assert_eq!(moved.position.y, 6.0);
        assert_eq!(f.occupants.location_of("outside").unwrap().position, DVec3::new(20.0, 2.0, 2.0));
        assert_eq!(f.occupants.location_of("elsewhere").unwrap().world.as_str(), "nether");

        ticket.wait().await.unwrap();
        let evacuated: Vec<_> = f
            .events
            .events()
            .into_iter()
            .filter(|e| matches!(e, MineEvent::Evacuated { .. }))
            .collect();
        assert_eq!(evacuated.len(), 1);
    }

    #[tokio::test]
    async fn test_configured_point_sends_no_notice() {
        let f = fixture(MemoryWorld::new());
        let mut mine = quarry();
        mine.set_teleport_point(Some(IVec3::new(0, 50, 0))).unwrap();
        f.occupants.add("inside", Location::new("world".into(), DVec3::new(1.0, 1.0, 1.0)));

        f.controller.reset(&mine, None).unwrap().wait().await.unwrap();
        assert_eq!(f.occupants.location_of("inside").unwrap().position, DVec3::new(0.0, 50.0, 0.0));
        assert!(!f.events.events().iter().any(|e| matches!(e, MineEvent::Evacuated { .. })));
    }

    #[tokio::test]
    async fn test_single_flight() {
        let f = fixture(MemoryWorld::new().with_held_completions());
        let mine = quarry();

        let first = f.controller.reset(&mine, None).unwrap();
        assert!(f.controller.is_resetting("quarry"));
        assert!(matches!(f.controller.reset(&mine, None), Err(Error::ResetInFlight(_))));

        while f.world.queued_completions() == 0 {
            tokio::task::yield_now().await;
        }
        f.world.flush();
        first.wait().await.unwrap();
        assert!(!f.controller.is_resetting("quarry"));
        assert!(f.controller.reset(&mine, None).is_ok());
    }

    #[tokio::test]
    async fn test_snapshot_taken_at_reset_start() {
        let f = fixture(MemoryWorld::new().with_held_completions());
        let mut mine = quarry();

        let ticket = f.controller.reset(&mine, None).unwrap();
        mine.composition_mut().remove(&STONE);
        mine.composition_mut().set(BlockSpec::of(16), 1.0).unwrap();

        while f.world.queued_completions() == 0 {
            tokio::task::yield_now().await;
        }
        f.world.flush();
        ticket.wait().await.unwrap();
        assert_eq!(f.world.count_in(mine.bounds(), STONE), 125);
    }

    #[tokio::test]
    async fn test_sink_failure_clears_flag_and_reports() {
        let f = fixture(MemoryWorld::new().with_write_limit(5));
        let mine = quarry();

        let (tx, rx) = oneshot::channel();
        let callback: ResetCallback = Box::new(move |result: &Result<FillReport>| {
            let _ = tx.send(result.is_err());
        });
        let err = f.controller.reset(&mine, Some(callback)).unwrap().wait().await.unwrap_err();

        assert!(matches!(err, Error::Sink { .. }));
        assert!(rx.await.unwrap());
        assert!(!f.controller.is_resetting("quarry"));
        assert!(matches!(f.events.events().last(), Some(MineEvent::ResetFailed { .. })));
    }

    #[tokio::test]
    async fn test_unknown_world() {
        let f = fixture(MemoryWorld::new());
        let mine = MineState::new("lost", "missing".into(), IVec3::ZERO, IVec3::ONE);
        assert!(matches!(f.controller.reset(&mine, None), Err(Error::UnknownWorld(_))));
        assert!(!f.controller.is_resetting("lost"));
    }
}
