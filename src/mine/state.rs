//! Per-mine state: bounds, composition, policies and countdown.

use crate::block::BlockSpec;
use crate::core::error::Error;
use crate::core::types::{DVec3, IVec3, Result};
use crate::math::BlockAabb;
use crate::mine::composition::Composition;
use crate::reset::filler::FillOptions;
use crate::schedule::countdown::{Countdown, CountdownPhase, TickOutcome};
use crate::world::{BlockSink, Location, WorldId};

/// A named mine and everything needed to regenerate it
#[derive(Clone, Debug, PartialEq)]
pub struct MineState {
    name: String,
    world: WorldId,
    bounds: BlockAabb,
    composition: Composition,
    fill_mode: bool,
    ignore_ladders: bool,
    surface: Option<BlockSpec>,
    silent: bool,
    countdown: Countdown,
    teleport_point: Option<IVec3>,
}

impl MineState {
    /// Create a mine with an empty composition and automatic resets disabled
    pub fn new(name: impl Into<String>, world: WorldId, corner_a: IVec3, corner_b: IVec3) -> Self {
        Self {
            name: name.into(),
            world,
            bounds: BlockAabb::from_corners(corner_a, corner_b),
            composition: Composition::new(),
            fill_mode: false,
            ignore_ladders: false,
            surface: None,
            silent: false,
            countdown: Countdown::default(),
            teleport_point: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn world(&self) -> &WorldId {
        &self.world
    }

    pub fn bounds(&self) -> BlockAabb {
        self.bounds
    }

    /// Replace the bounds and world
    pub fn redefine(&mut self, corner_a: IVec3, corner_b: IVec3, world: WorldId) {
        self.bounds = BlockAabb::from_corners(corner_a, corner_b);
        self.world = world;
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    pub fn composition_mut(&mut self) -> &mut Composition {
        &mut self.composition
    }

    pub fn set_composition(&mut self, composition: Composition) {
        self.composition = composition;
    }

    /// Sum of the raw composition weights
    pub fn composition_total(&self) -> f64 {
        self.composition.total()
    }

    pub fn fill_mode(&self) -> bool {
        self.fill_mode
    }

    pub fn set_fill_mode(&mut self, fill_mode: bool) {
        self.fill_mode = fill_mode;
    }

    pub fn ignore_ladders(&self) -> bool {
        self.ignore_ladders
    }

    pub fn set_ignore_ladders(&mut self, ignore_ladders: bool) {
        self.ignore_ladders = ignore_ladders;
    }

    pub fn surface(&self) -> Option<BlockSpec> {
        self.surface
    }

    pub fn set_surface(&mut self, surface: Option<BlockSpec>) {
        self.surface = surface;
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn set_silent(&mut self, silent: bool) {
        self.silent = silent;
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn set_countdown(&mut self, countdown: Countdown) {
        self.countdown = countdown;
    }

    pub fn reset_delay(&self) -> u32 {
        self.countdown.reset_delay()
    }

    /// Set the automatic reset interval in minutes (0 disables) and rearm the clock
    pub fn set_reset_delay(&mut self, minutes: u32) {
        self.countdown.set_reset_delay(minutes);
    }

    pub fn reset_warnings(&self) -> &[u32] {
        self.countdown.warnings()
    }

    pub fn set_reset_warnings(&mut self, warnings: Vec<u32>) {
        self.countdown.set_warnings(warnings);
    }

    /// Minutes until the next automatic reset; the real time left is between n-1 and n
    pub fn time_until_reset(&self) -> u32 {
        self.countdown.clock()
    }

    pub fn phase(&self) -> CountdownPhase {
        self.countdown.phase()
    }

    /// Advance the countdown by one interval
    pub fn tick(&mut self) -> TickOutcome {
        self.countdown.tick()
    }

    pub fn teleport_point(&self) -> Option<IVec3> {
        self.teleport_point
    }

    /// Set where occupants are sent during a reset.
    ///
    /// A stored negative Y means "no point", so points below y = 0 are rejected.
    pub fn set_teleport_point(&mut self, point: Option<IVec3>) -> Result<()> {
        if let Some(p) = point {
            if p.y < 0 {
                return Err(Error::InvalidTeleportPoint(p.to_string()));
            }
        }
        self.teleport_point = point;
        Ok(())
    }

    /// Whether a location lies inside the mine (inclusive, same world)
    pub fn contains(&self, location: &Location) -> bool {
        location.world == self.world && self.bounds.contains_block(location.block())
    }

    /// Fill policy snapshot for a reset
    pub fn fill_options(&self) -> FillOptions {
        FillOptions {
            fill_mode_only: self.fill_mode,
            ignore_block: self.ignore_ladders.then_some(BlockSpec::LADDER),
            surface: self.surface,
            seed: None,
        }
    }

    /// Where to place someone entering the mine.
    ///
    /// Horizontal center on the top layer, or standing on the highest block of
    /// that column when the top layer is occupied.
    pub fn entry_location(&self, blocks: &dyn BlockSink) -> Location {
        let center = self.bounds.center();
        let top = self.bounds.max.y;
        let column = IVec3::new(center.x.floor() as i32, top, center.z.floor() as i32);

        let blocked = !blocks.current_block(column).is_empty()
            || !blocks.current_block(column + IVec3::Y).is_empty();
        let y = if blocked {
            blocks
                .highest_block_y(column.x, column.z)
                .map(|h| h + 1)
                .unwrap_or(top + 1)
        } else {
            top
        };

        Location::new(self.world.clone(), DVec3::new(center.x, y as f64, center.z))
    }
}
