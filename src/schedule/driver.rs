//! Fixed-interval driver for the mine scheduler.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::mine::registry::MineRegistry;
use crate::mine::store::MineStore;
use crate::schedule::scheduler::MineScheduler;

/// Driver handle - keep this alive to keep ticking
pub struct CronDriver {
    handle: JoinHandle<()>,
}

impl CronDriver {
    /// Start ticking every `period` on the current runtime.
    ///
    /// Ticks are serialized: each one holds the registry lock while it runs.
    /// When a store is given it is saved after every tick.
    /// Panics if called outside a tokio runtime context.
    pub fn start(
        registry: Arc<Mutex<MineRegistry>>,
        scheduler: Arc<MineScheduler>,
        store: Option<MineStore>,
        period: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                let mut registry = registry.lock().await;
                let outcomes = scheduler.tick_all(&mut registry);
                log::debug!("Tick processed {} mine(s), {} event(s)", registry.len(), outcomes.len());

                if let Some(store) = &store {
                    if let Err(e) = store.save(&registry).await {
                        log::error!("Failed to save mines to {}: {}", store.path().display(), e);
                    }
                }
            }
        });

        Self { handle }
    }

    /// Stop ticking
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for CronDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockSpec;
    use crate::core::types::IVec3;
    use crate::mine::state::MineState;
    use crate::reset::controller::ResetController;
    use crate::reset::events::{MineEvent, RecordingEventSink};
    use crate::reset::filler::RegionFiller;
    use crate::world::{MemoryOccupants, MemoryWorld, MemoryWorlds};
    use tempfile::TempDir;

    #[tokio::test(start_paused = true)]
    async fn test_driver_ticks_and_saves() {
        let mut worlds = MemoryWorlds::new();
        worlds.insert("world", MemoryWorld::new());
        let worlds = Arc::new(worlds);
        let events = Arc::new(RecordingEventSink::new());
        let controller = ResetController::new(
            worlds.clone(),
            Arc::new(MemoryOccupants::new()),
            events.clone(),
            RegionFiller::with_current_runtime(),
        );
        let scheduler = Arc::new(MineScheduler::new(Arc::new(controller)));

        let mut mine = MineState::new("quarry", "world".into(), IVec3::ZERO, IVec3::ONE);
        mine.composition_mut().set(BlockSpec::of(1), 1.0).unwrap();
        mine.set_reset_delay(2);
        let mut registry = MineRegistry::new();
        registry.define(mine).unwrap();
        let registry = Arc::new(Mutex::new(registry));

        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let store = MineStore::new(temp_dir.path().join("mines.json"));

        let driver = CronDriver::start(registry.clone(), scheduler, Some(store.clone()), Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(90)).await;
        assert_eq!(registry.lock().await.get("quarry").unwrap().time_until_reset(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(registry.lock().await.get("quarry").unwrap().time_until_reset(), 2);
        assert!(events.events().contains(&MineEvent::AutoReset { mine: "quarry".into() }));

        driver.stop();
        let mut reloaded = MineRegistry::new();
        store.load(&mut reloaded, worlds.as_ref()).await.unwrap();
        assert_eq!(reloaded.get("quarry").unwrap().time_until_reset(), 2);
    }
}
