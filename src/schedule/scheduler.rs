//! Applies countdown outcomes: broadcasts and automatic resets.

use std::sync::Arc;

use crate::core::types::Result;
use crate::mine::registry::MineRegistry;
use crate::mine::state::MineState;
use crate::reset::controller::{ResetCallback, ResetController, ResetTicket};
use crate::reset::events::MineEvent;
use crate::schedule::countdown::TickOutcome;

/// Drives every mine's countdown and triggers resets through the controller
pub struct MineScheduler {
    controller: Arc<ResetController>,
}

impl MineScheduler {
    pub fn new(controller: Arc<ResetController>) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> &ResetController {
        &self.controller
    }

    /// Advance one mine by one interval.
    ///
    /// A failed reset is reported as an event; the countdown is already rearmed.
    pub fn tick_mine(&self, mine: &mut MineState) -> TickOutcome {
        let outcome = mine.tick();
        let events = self.controller.events();

        match &outcome {
            TickOutcome::Idle => {}
            TickOutcome::Warning(thresholds) => {
                if !mine.is_silent() {
                    for minutes in thresholds {
                        events.emit(MineEvent::Warning { mine: mine.name().to_string(), minutes: *minutes });
                    }
                }
            }
            TickOutcome::Reset => {
                if !mine.is_silent() {
                    events.emit(MineEvent::AutoReset { mine: mine.name().to_string() });
                }
                if let Err(e) = self.controller.reset(mine, None) {
                    log::error!("Automatic reset of mine '{}' failed to start: {}", mine.name(), e);
                    events.emit(MineEvent::ResetFailed { mine: mine.name().to_string(), reason: e.to_string() });
                }
            }
        }

        outcome
    }

    /// Advance every mine in name order, returning the non-idle outcomes
    pub fn tick_all(&self, registry: &mut MineRegistry) -> Vec<(String, TickOutcome)> {
        registry
            .iter_mut()
            .filter_map(|mine| match self.tick_mine(mine) {
                TickOutcome::Idle => None,
                outcome => Some((mine.name().to_string(), outcome)),
            })
            .collect()
    }

    /// Reset a mine immediately, outside the countdown
    pub fn reset_now(&self, registry: &MineRegistry, name: &str, on_complete: Option<ResetCallback>) -> Result<ResetTicket> {
        let mine = registry.get(name)?;
        self.controller.reset(mine, on_complete)
    }
}
