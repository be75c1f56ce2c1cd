//! Moving occupants out of a mine before it is refilled.

use rand::Rng;

use crate::core::types::DVec3;
use crate::math::{BlockAabb, Facing};
use crate::mine::state::MineState;
use crate::world::{Location, Occupant, OccupantId, WorldId};

/// Distance beyond the mine boundary, horizontally and above the top layer
const EDGE_OFFSET: f64 = 2.0;

/// Cardinal side of a mine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    PosX,
    PosZ,
    NegX,
    NegZ,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::PosX, Direction::PosZ, Direction::NegX, Direction::NegZ];

    /// Pick a side uniformly at random
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// Where an occupant goes and why
#[derive(Clone, Debug, PartialEq)]
pub struct Relocation {
    pub occupant: OccupantId,
    pub destination: Location,
    /// True when no teleport point is configured and an edge point was computed
    pub fallback: bool,
}

/// Computes safe destinations for occupants of a resetting mine
#[derive(Clone, Copy, Debug, Default)]
pub struct OccupantRelocator;

impl OccupantRelocator {
    pub fn new() -> Self {
        Self
    }

    /// Destination for every occupant, each with an independently chosen side
    pub fn relocate<R: Rng + ?Sized>(&self, mine: &MineState, occupants: &[Occupant], rng: &mut R) -> Vec<Relocation> {
        occupants
            .iter()
            .map(|occupant| self.destination_for(mine, occupant, rng))
            .collect()
    }

    /// Destination for a single occupant
    pub fn destination_for<R: Rng + ?Sized>(&self, mine: &MineState, occupant: &Occupant, rng: &mut R) -> Relocation {
        if let Some(point) = mine.teleport_point() {
            return Relocation {
                occupant: occupant.id.clone(),
                destination: Location::new(mine.world().clone(), point.as_dvec3()),
                fallback: false,
            };
        }

        let destination = edge_destination(
            mine.bounds(),
            mine.world(),
            occupant.location.position,
            Direction::random(rng),
        );
        Relocation {
            occupant: occupant.id.clone(),
            destination,
            fallback: true,
        }
    }
}

/// Point just outside one side of the box, above its top, facing its center.
///
/// The coordinate along the other horizontal axis is kept from `from`.
pub fn edge_destination(bounds: BlockAabb, world: &WorldId, from: DVec3, side: Direction) -> Location {
    let height = bounds.max.y as f64 + EDGE_OFFSET;
    let mut position = DVec3::new(from.x, height, from.z);

    match side {
        Direction::PosX => position.x = bounds.max.x as f64 + EDGE_OFFSET,
        Direction::PosZ => position.z = bounds.max.z as f64 + EDGE_OFFSET,
        Direction::NegX => position.x = bounds.min.x as f64 - EDGE_OFFSET,
        Direction::NegZ => position.z = bounds.min.z as f64 - EDGE_OFFSET,
    }

    let center = bounds.center();
    let target = DVec3::new(center.x, height, center.z);

    Location::new(world.clone(), position).with_facing(Facing::looking_at(position, target))
}
